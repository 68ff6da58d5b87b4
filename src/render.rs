//! Dashboard rendering with ratatui.
//!
//! Three stacked areas: the header line (title plus either the active
//! entry prompt or the key legend), the system summary line, and the
//! table of the active view. The help screen replaces all three.

use crate::aggregate::{ProcessRow, Totals};
use crate::rates::BYTES_PER_MIB;
use crate::session::{InputMode, Session, ViewMode};
use crate::sort::{DiskColumn, NetColumn, ProcessColumn, SortColumn, SortState};
use crate::theme::Theme;
use crate::types::{percent_of, DiskSample, MemoryPages, NetIface, SystemSummary, ThreadSample};
use crate::view;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;

/// Program title shown at the left of the header.
pub const TITLE: &str = concat!("kvmtop ", env!("CARGO_PKG_VERSION"));

/// Everything one frame needs, borrowed from the app.
#[derive(Debug, Clone, Copy)]
pub struct Dashboard<'a> {
    /// Session state.
    pub session: &'a Session,
    /// Colors.
    pub theme: Theme,
    /// System gauges.
    pub system: &'a SystemSummary,
    /// Global CPU percentage.
    pub cpu_percent: f64,
    /// Process rows.
    pub processes: &'a [ProcessRow],
    /// Raw thread view, for tree rows.
    pub threads: &'a [ThreadSample],
    /// Footer sums.
    pub totals: &'a Totals,
    /// Interfaces.
    pub interfaces: &'a [NetIface],
    /// Block devices.
    pub disks: &'a [DiskSample],
    /// Interface prefixes hidden from the network view.
    pub skip_interfaces: &'a [String],
    /// Scheduler ticks per second.
    pub ticks_per_second: u64,
    /// Memory page size in bytes.
    pub page_size: u64,
}

/// Draws one frame.
pub fn draw(frame: &mut Frame, dash: &Dashboard<'_>) {
    let area = frame.area();

    if dash.session.showing_help() {
        draw_help(frame, dash.theme, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    draw_header(frame, dash, chunks[0]);
    frame.render_widget(Paragraph::new(summary_line(dash.system, dash.cpu_percent)), chunks[1]);

    match dash.session.view {
        ViewMode::Process => draw_processes(frame, dash, chunks[2]),
        ViewMode::Network => draw_network(frame, dash, chunks[2]),
        ViewMode::Storage => draw_storage(frame, dash, chunks[2]),
    }
}

// ============================================================================
// Header and summary
// ============================================================================

/// Right side of the header: the entry prompt, or the key legend.
#[must_use]
pub fn header_right(session: &Session) -> String {
    match &session.input {
        InputMode::FilterEntry => format!("FILTER: {}_", session.filter),
        InputMode::LimitEntry(buffer) => format!("LIMIT: {buffer}_"),
        InputMode::RefreshEntry(buffer) => format!("REFRESH(s): {buffer}_"),
        InputMode::Normal | InputMode::Help => {
            let filter = if session.filter.is_empty() {
                String::new()
            } else {
                format!("Filter: {} | ", session.filter)
            };
            format!(
                "{filter}[r] Refresh={:.1}s | [c] CPU | [s] Storage | [n] Net | [t] Tree | \
                 [l] Limit({}) | [f] Freeze: {} | [h] Help | [/] Filter | [q] Quit",
                session.interval.as_secs_f64(),
                session.limit,
                if session.frozen { "ON" } else { "OFF" },
            )
        }
    }
}

fn draw_header(frame: &mut Frame, dash: &Dashboard<'_>, area: Rect) {
    let right_style =
        if dash.session.input.is_modal() { dash.theme.prompt_style() } else { dash.theme.dim_style() };
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(TITLE.len() as u16 + 1), Constraint::Min(0)])
        .split(area);
    frame.render_widget(
        Paragraph::new(Span::styled(TITLE, Style::default().add_modifier(Modifier::BOLD))),
        halves[0],
    );
    frame.render_widget(
        Paragraph::new(Span::styled(header_right(dash.session), right_style))
            .alignment(Alignment::Right),
        halves[1],
    );
}

/// The `CPU | RAM | SWAP` summary line.
#[must_use]
pub fn summary_line(system: &SystemSummary, cpu_percent: f64) -> String {
    let (ram_used, ram_total) = (system.ram_used_mib(), system.ram_total_mib());
    let (swap_used, swap_total) = (system.swap_used_mib(), system.swap_total_mib());
    format!(
        "CPU: {:5.2}% ({} Threads) | RAM: {} / {} MiB ({:.1}%) | SWAP: {} / {} MiB ({:.1}%)",
        cpu_percent,
        system.online_cpus,
        format_thousands(ram_used),
        format_thousands(ram_total),
        percent_of(ram_used, ram_total),
        format_thousands(swap_used),
        format_thousands(swap_total),
        percent_of(swap_used, swap_total),
    )
}

// ============================================================================
// Formatting helpers
// ============================================================================

/// Formats an integer with comma thousands separators.
#[must_use]
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats a duration in seconds as `DdHHh`, or `HH:MM:SS` under a day.
#[must_use]
pub fn format_uptime(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    if days > 0 {
        format!("{days}d{hours:02}h")
    } else {
        format!("{hours:02}:{:02}:{:02}", (secs % 3600) / 60, secs % 60)
    }
}

/// Seconds a process has been running.
#[must_use]
pub fn process_uptime_secs(system_uptime: f64, start_time_ticks: u64, ticks_per_second: u64) -> u64 {
    let started = start_time_ticks / ticks_per_second.max(1);
    (system_uptime.max(0.0) as u64).saturating_sub(started)
}

/// Converts pages to MiB.
#[must_use]
pub fn pages_to_mib(pages: u64, page_size: u64) -> f64 {
    pages as f64 * page_size as f64 / BYTES_PER_MIB
}

/// Column header `[n] Label`, with `*` and the direction arrow when active.
#[must_use]
pub fn sort_header<C: SortColumn>(column: C, state: &SortState<C>) -> String {
    if column == state.column {
        format!("[{}] {}*{}", column.digit(), column.label(), state.direction.arrow())
    } else {
        format!("[{}] {}", column.digit(), column.label())
    }
}

fn right(text: String) -> Cell<'static> {
    Cell::from(Line::from(text).alignment(Alignment::Right))
}

fn right_styled(text: String, style: Style) -> Cell<'static> {
    Cell::from(Line::from(Span::styled(text, style)).alignment(Alignment::Right))
}

fn header_row(labels: Vec<String>, theme: Theme) -> Row<'static> {
    Row::new(labels.into_iter().map(Cell::from)).style(theme.header_style())
}

// ============================================================================
// Process view
// ============================================================================

const PROCESS_WIDTHS: [Constraint; 14] = [
    Constraint::Length(12), // PID
    Constraint::Length(10), // User
    Constraint::Length(10), // Uptime
    Constraint::Length(9),  // Res
    Constraint::Length(9),  // Shr
    Constraint::Length(10), // Virt
    Constraint::Length(14), // R_Log/s
    Constraint::Length(14), // W_Log/s
    Constraint::Length(14), // Wait
    Constraint::Length(14), // R_MiB/s
    Constraint::Length(14), // W_MiB/s
    Constraint::Length(11), // CPU%
    Constraint::Length(6),  // S
    Constraint::Fill(1),    // COMMAND
];

fn process_header(sort: &SortState<ProcessColumn>, theme: Theme) -> Row<'static> {
    let h = |c| sort_header(c, sort);
    header_row(
        vec![
            h(ProcessColumn::Pid),
            "User".into(),
            "Uptime".into(),
            "Res(MiB)".into(),
            "Shr(MiB)".into(),
            "Virt(MiB)".into(),
            h(ProcessColumn::ReadOps),
            h(ProcessColumn::WriteOps),
            h(ProcessColumn::IoWait),
            h(ProcessColumn::ReadMib),
            h(ProcessColumn::WriteMib),
            h(ProcessColumn::Cpu),
            h(ProcessColumn::State),
            "COMMAND".into(),
        ],
        theme,
    )
}

fn memory_cells(memory: MemoryPages, page_size: u64) -> [Cell<'static>; 3] {
    [
        right(format!("{:.0}", pages_to_mib(memory.res, page_size))),
        right(format!("{:.0}", pages_to_mib(memory.shr, page_size))),
        right(format!("{:.0}", pages_to_mib(memory.virt, page_size))),
    ]
}

fn process_row(row: &ProcessRow, dash: &Dashboard<'_>) -> Row<'static> {
    let theme = dash.theme;
    let uptime =
        process_uptime_secs(dash.system.uptime_secs, row.start_time_ticks, dash.ticks_per_second);
    let [res, shr, virt] = memory_cells(row.memory, dash.page_size);
    Row::new(vec![
        right(row.pid.to_string()),
        Cell::from(row.user.clone()),
        right(format_uptime(uptime)),
        res,
        shr,
        virt,
        right(format!("{:.0}", row.rates.read_ops)),
        right(format!("{:.0}", row.rates.write_ops)),
        right_styled(format!("{:.2}", row.rates.io_wait_ms), theme.wait_style(row.rates.io_wait_ms)),
        right(format!("{:.2}", row.rates.read_mib)),
        right(format!("{:.2}", row.rates.write_mib)),
        right_styled(format!("{:.2}", row.rates.cpu_pct), theme.cpu_style(row.rates.cpu_pct)),
        right_styled(row.state.as_char().to_string(), theme.state_style(row.state)),
        Cell::from(row.command.clone()),
    ])
}

fn thread_row(thread: &ThreadSample, theme: Theme) -> Row<'static> {
    let rates = &thread.rates;
    Row::new(vec![
        Cell::from(format!("  └─ {}", thread.tid)),
        Cell::from(""),
        Cell::from(""),
        Cell::from(""),
        Cell::from(""),
        Cell::from(""),
        right(format!("{:.0}", rates.read_ops)),
        right(format!("{:.0}", rates.write_ops)),
        right_styled(format!("{:.2}", rates.io_wait_ms), theme.wait_style(rates.io_wait_ms)),
        right(format!("{:.2}", rates.read_mib)),
        right(format!("{:.2}", rates.write_mib)),
        right_styled(format!("{:.2}", rates.cpu_pct), theme.cpu_style(rates.cpu_pct)),
        right_styled(thread.state.as_char().to_string(), theme.state_style(thread.state)),
        Cell::from(thread.command.clone()),
    ])
    .style(theme.dim_style())
}

fn totals_row(totals: &Totals, page_size: u64, theme: Theme) -> Row<'static> {
    let rates = &totals.rates;
    let [res, shr, virt] = memory_cells(totals.memory, page_size);
    Row::new(vec![
        right("TOTAL".to_string()),
        Cell::from(""),
        Cell::from(""),
        res,
        shr,
        virt,
        right(format!("{:.0}", rates.read_ops)),
        right(format!("{:.0}", rates.write_ops)),
        right(format!("{:.2}", rates.io_wait_ms)),
        right(format!("{:.2}", rates.read_mib)),
        right(format!("{:.2}", rates.write_mib)),
        right(format!("{:.2}", rates.cpu_pct)),
        Cell::from(""),
        Cell::from(""),
    ])
    .style(theme.header_style())
}

fn table_block() -> Block<'static> {
    Block::default().borders(Borders::TOP | Borders::BOTTOM)
}

fn draw_processes(frame: &mut Frame, dash: &Dashboard<'_>, area: Rect) {
    let session = dash.session;
    let visible = view::visible_processes(dash.processes, session);

    let mut rows = Vec::with_capacity(visible.len());
    for row in visible {
        rows.push(process_row(row, dash));
        if session.tree {
            rows.extend(
                view::threads_of(dash.threads, row.pid)
                    .into_iter()
                    .map(|thread| thread_row(thread, dash.theme)),
            );
        }
    }

    let table = Table::new(rows, PROCESS_WIDTHS)
        .header(process_header(&session.process_sort, dash.theme))
        .footer(totals_row(dash.totals, dash.page_size, dash.theme))
        .block(table_block());
    frame.render_widget(table, area);
}

// ============================================================================
// Network view
// ============================================================================

fn draw_network(frame: &mut Frame, dash: &Dashboard<'_>, area: Rect) {
    let sort = &dash.session.network_sort;
    let header = header_row(
        vec![
            "IFACE".into(),
            "STATE".into(),
            sort_header(NetColumn::Rx, sort),
            sort_header(NetColumn::Tx, sort),
            "RX_Pkts".into(),
            "TX_Pkts".into(),
            "RX_Err".into(),
            "TX_Err".into(),
            "VMID".into(),
            "VM_NAME".into(),
        ],
        dash.theme,
    );

    let rows = view::visible_interfaces(dash.interfaces, dash.session, dash.skip_interfaces)
        .into_iter()
        .map(|iface| {
            let r = &iface.rates;
            let (vmid, vm_name) = match &iface.vm {
                Some(vm) => (vm.id.map_or_else(|| "-".to_string(), |id| id.to_string()), vm.name.clone()),
                None => ("-".to_string(), String::new()),
            };
            Row::new(vec![
                Cell::from(iface.name.clone()),
                Cell::from(iface.operstate.clone()),
                right(format!("{:.2}", r.rx_mbps)),
                right(format!("{:.2}", r.tx_mbps)),
                right(format!("{:.0}", r.rx_pps)),
                right(format!("{:.0}", r.tx_pps)),
                right(format!("{:.0}", r.rx_errs_ps)),
                right(format!("{:.0}", r.tx_errs_ps)),
                Cell::from(vmid),
                Cell::from(vm_name),
            ])
        });

    let widths = [
        Constraint::Length(16),
        Constraint::Length(10),
        Constraint::Length(16),
        Constraint::Length(16),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(6),
        Constraint::Fill(1),
    ];
    frame.render_widget(Table::new(rows, widths).header(header).block(table_block()), area);
}

// ============================================================================
// Storage view
// ============================================================================

fn draw_storage(frame: &mut Frame, dash: &Dashboard<'_>, area: Rect) {
    let sort = &dash.session.disk_sort;
    let mut labels = vec!["DEVICE".to_string()];
    labels.extend(DiskColumn::ALL.iter().map(|&c| sort_header(c, sort)));
    labels.extend(["Util%".to_string(), "InFlight".to_string(), "QDepth".to_string()]);
    let header = header_row(labels, dash.theme);

    let rows = view::visible_disks(dash.disks, dash.session).into_iter().map(|disk| {
        let r = &disk.rates;
        Row::new(vec![
            Cell::from(disk.name.clone()),
            right(format!("{:.2}", r.read_iops)),
            right(format!("{:.2}", r.write_iops)),
            right(format!("{:.2}", r.read_mib)),
            right(format!("{:.2}", r.write_mib)),
            right(format!("{:.4}", r.read_latency_ms)),
            right(format!("{:.4}", r.write_latency_ms)),
            right_styled(format!("{:.1}", r.util_pct), dash.theme.cpu_style(r.util_pct)),
            right(disk.in_flight.to_string()),
            right(disk.queue_depth.to_string()),
        ])
    });

    let widths = [
        Constraint::Length(16),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(15),
        Constraint::Length(15),
        Constraint::Length(7),
        Constraint::Length(9),
        Constraint::Length(7),
    ];
    frame.render_widget(Table::new(rows, widths).header(header).block(table_block()), area);
}

// ============================================================================
// Help
// ============================================================================

const HELP_SECTIONS: &[(&str, &[&str])] = &[
    (
        "VIEW CONTROLS",
        &[
            "c       Process/CPU view",
            "s       Storage view",
            "n       Network view",
            "t       Toggle thread tree (process view)",
            "h       Show this help",
        ],
    ),
    (
        "INTERACTIVE CONTROLS",
        &[
            "f       Freeze/resume sampling",
            "l       Set display limit",
            "r       Set refresh interval (seconds, min 0.1)",
            "/       Filter by PID, command, user, interface or VM",
            "q       Quit",
        ],
    ),
    (
        "SORTING (Process View)",
        &[
            "1 Sort by PID        2 Sort by CPU%        3 Sort by logical reads",
            "4 Sort by logical writes  5 Sort by I/O wait  6 Sort by read MiB/s",
            "7 Sort by write MiB/s     8 Sort by state",
        ],
    ),
    ("SORTING (Network View)", &["1 Sort by RX Mbps    2 Sort by TX Mbps"]),
    (
        "SORTING (Storage View)",
        &[
            "1 Read IOPS   2 Write IOPS   3 Read MiB/s",
            "4 Write MiB/s 5 Read latency 6 Write latency",
        ],
    ),
];

fn draw_help(frame: &mut Frame, theme: Theme, area: Rect) {
    let mut lines = vec![Line::from("")];
    for (title, entries) in HELP_SECTIONS {
        lines.push(Line::from(Span::styled(format!("  {title}:"), theme.header_style())));
        lines.extend(entries.iter().map(|e| Line::from(format!("    {e}"))));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled("  Press any key to return...", theme.dim_style())));

    let help = Paragraph::new(lines)
        .block(Block::default().title(format!(" {TITLE} - Help ")).borders(Borders::ALL));
    frame.render_widget(help, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::SortDirection;
    use crate::types::{ThreadRates, VmInfo};
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;
    use ratatui::Terminal;
    use std::time::Duration;

    fn buffer_text(buffer: &Buffer) -> String {
        let width = usize::from(buffer.area.width);
        buffer
            .content
            .chunks(width)
            .map(|line| line.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render(dash: &Dashboard<'_>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(220, 30)).unwrap();
        terminal.draw(|frame| draw(frame, dash)).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    struct Fixture {
        session: Session,
        system: SystemSummary,
        processes: Vec<ProcessRow>,
        threads: Vec<ThreadSample>,
        totals: Totals,
        interfaces: Vec<NetIface>,
        disks: Vec<DiskSample>,
        skip: Vec<String>,
    }

    impl Fixture {
        fn new() -> Self {
            let threads = vec![
                ThreadSample {
                    tid: 4242,
                    tgid: 4242,
                    command: "qemu-system-x86_64 -id 101".into(),
                    user: "root".into(),
                    rates: ThreadRates { cpu_pct: 12.5, ..Default::default() },
                    ..Default::default()
                },
                ThreadSample {
                    tid: 4250,
                    tgid: 4242,
                    command: "qemu-system-x86_64 -id 101".into(),
                    rates: ThreadRates { cpu_pct: 7.5, ..Default::default() },
                    ..Default::default()
                },
            ];
            let processes = crate::aggregate::aggregate_by_process(&threads);
            let totals = crate::aggregate::totals(&threads, &processes);
            let mut tap = NetIface { name: "tap101i0".into(), operstate: "up".into(), ..Default::default() };
            tap.vm = Some(VmInfo { id: Some(101), name: "web".into() });
            Self {
                session: Session::default(),
                system: SystemSummary {
                    mem_total_kib: 16 * 1024 * 1024,
                    mem_free_kib: 8 * 1024 * 1024,
                    online_cpus: 8,
                    uptime_secs: 1000.0,
                    ..Default::default()
                },
                processes,
                threads,
                totals,
                interfaces: vec![tap, NetIface { name: "lo".into(), ..Default::default() }],
                disks: vec![DiskSample { name: "nvme0n1".into(), queue_depth: 64, ..Default::default() }],
                skip: vec!["lo".into()],
            }
        }

        fn dashboard(&self) -> Dashboard<'_> {
            Dashboard {
                session: &self.session,
                theme: Theme::new(false),
                system: &self.system,
                cpu_percent: 42.0,
                processes: &self.processes,
                threads: &self.threads,
                totals: &self.totals,
                interfaces: &self.interfaces,
                disks: &self.disks,
                skip_interfaces: &self.skip,
                ticks_per_second: 100,
                page_size: 4096,
            }
        }
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(0), "00:00:00");
        assert_eq!(format_uptime(3661), "01:01:01");
        assert_eq!(format_uptime(86_400 + 5 * 3600), "1d05h");
    }

    #[test]
    fn test_process_uptime() {
        assert_eq!(process_uptime_secs(1000.0, 50_000, 100), 500);
        assert_eq!(process_uptime_secs(10.0, 50_000, 100), 0);
        assert_eq!(process_uptime_secs(10.0, 500, 0), 0);
    }

    #[test]
    fn test_pages_to_mib() {
        assert!((pages_to_mib(256, 4096) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sort_header_marks_active_column() {
        let state = SortState { column: ProcessColumn::Cpu, direction: SortDirection::Descending };
        assert_eq!(sort_header(ProcessColumn::Cpu, &state), "[2] CPU%*↓");
        assert_eq!(sort_header(ProcessColumn::Pid, &state), "[1] PID");
    }

    #[test]
    fn test_header_prompts() {
        let mut session = Session { filter: "ab".into(), input: InputMode::FilterEntry, ..Session::default() };
        assert_eq!(header_right(&session), "FILTER: ab_");

        session.input = InputMode::LimitEntry("12".into());
        assert_eq!(header_right(&session), "LIMIT: 12_");

        session.input = InputMode::RefreshEntry("0.5".into());
        assert_eq!(header_right(&session), "REFRESH(s): 0.5_");

        session.input = InputMode::Normal;
        session.frozen = true;
        session.interval = Duration::from_millis(2500);
        let legend = header_right(&session);
        assert!(legend.starts_with("Filter: ab | "));
        assert!(legend.contains("Refresh=2.5s"));
        assert!(legend.contains("Freeze: ON"));
        assert!(legend.contains("Limit(50)"));
    }

    #[test]
    fn test_summary_line() {
        let system = SystemSummary {
            mem_total_kib: 2048 * 1024,
            mem_free_kib: 1024 * 1024,
            swap_total_kib: 0,
            online_cpus: 4,
            ..Default::default()
        };
        assert_eq!(
            summary_line(&system, 12.5),
            "CPU: 12.50% (4 Threads) | RAM: 1,024 / 2,048 MiB (50.0%) | SWAP: 0 / 0 MiB (0.0%)"
        );
    }

    #[test]
    fn test_render_process_view() {
        let fixture = Fixture::new();
        let text = render(&fixture.dashboard());

        assert!(text.contains(TITLE));
        assert!(text.contains("CPU: 42.00% (8 Threads)"));
        assert!(text.contains("[2] CPU%*↓"));
        assert!(text.contains("4242"));
        assert!(text.contains("20.00"));
        assert!(text.contains("TOTAL"));
        assert!(!text.contains("└─ 4250"));
    }

    #[test]
    fn test_render_tree_rows() {
        let mut fixture = Fixture::new();
        fixture.session.tree = true;

        let text = render(&fixture.dashboard());

        assert!(text.contains("└─ 4250"));
        assert!(!text.contains("└─ 4242"));
    }

    #[test]
    fn test_render_network_view() {
        let mut fixture = Fixture::new();
        fixture.session.view = ViewMode::Network;

        let text = render(&fixture.dashboard());

        assert!(text.contains("tap101i0"));
        assert!(text.contains("101"));
        assert!(text.contains("[2] TX_Mbps*↓"));
        assert!(!text.contains(" lo "));
    }

    #[test]
    fn test_render_storage_view() {
        let mut fixture = Fixture::new();
        fixture.session.view = ViewMode::Storage;

        let text = render(&fixture.dashboard());

        assert!(text.contains("nvme0n1"));
        assert!(text.contains("[1] R_IOPS*↓"));
        assert!(text.contains("64"));
    }

    #[test]
    fn test_render_help() {
        let mut fixture = Fixture::new();
        fixture.session.input = InputMode::Help;

        let text = render(&fixture.dashboard());

        assert!(text.contains("VIEW CONTROLS"));
        assert!(text.contains("Press any key to return"));
        assert!(!text.contains("TOTAL"));
    }

    #[test]
    fn test_render_filter_prompt() {
        let mut fixture = Fixture::new();
        fixture.session.input = InputMode::FilterEntry;
        fixture.session.filter = "nomatch".into();

        let text = render(&fixture.dashboard());

        assert!(text.contains("FILTER: nomatch_"));
        assert!(!text.contains("qemu-system"));
    }
}
