//! Per-thread counter collector.
//!
//! Walks `/proc/<pid>/task/<tid>/{stat,io}` for every live process and
//! produces one [`ThreadSample`] per thread. Threads that exit between
//! enumeration and the detail read are skipped; a missing or unreadable
//! `io` file (typical for other users' processes without privileges)
//! leaves the I/O counters at zero.

use crate::collectors::procfs::ProcFs;
use crate::collectors::users::UserCache;
use crate::error::{KvmtopError, Result};
use crate::types::{Collector, MemoryPages, ProcessState, ThreadCounters, ThreadSample};

/// Longest command label kept, in bytes.
pub const COMMAND_MAX: usize = 511;

/// Fields of interest from a `stat` line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatFields {
    /// Run state.
    pub state: ProcessState,
    /// Minor faults.
    pub minflt: u64,
    /// Major faults.
    pub majflt: u64,
    /// utime + stime.
    pub cpu_ticks: u64,
    /// Start time since boot, ticks.
    pub start_time_ticks: u64,
    /// Aggregated block I/O delay, ticks.
    pub blkio_ticks: u64,
}

/// Parses a `/proc/<pid>/stat` line.
///
/// The command field may contain spaces and parentheses, so fields are
/// counted from the last `)`. Unparseable numeric fields read as zero.
#[must_use]
pub fn parse_stat(content: &str) -> Option<StatFields> {
    let rparen = content.rfind(')')?;
    let rest = content.get(rparen + 1..)?;
    let fields: Vec<&str> = rest.split_whitespace().collect();
    let state = fields.first().and_then(|s| s.chars().next())?;
    let num = |idx: usize| fields.get(idx).and_then(|s| s.parse::<u64>().ok()).unwrap_or(0);

    Some(StatFields {
        state: ProcessState::from_char(state),
        minflt: num(7),
        majflt: num(9),
        cpu_ticks: num(11).saturating_add(num(12)),
        start_time_ticks: num(19),
        blkio_ticks: num(39),
    })
}

/// Extracts the `(comm)` field of a `stat` line.
#[must_use]
pub fn stat_name(content: &str) -> Option<&str> {
    let start = content.find('(')?;
    let end = content.rfind(')')?;
    (end > start).then(|| &content[start + 1..end])
}

/// Parses `/proc/<pid>/io` into `(syscr, syscw, read_bytes, write_bytes)`.
#[must_use]
pub fn parse_io(content: &str) -> (u64, u64, u64, u64) {
    let mut out = (0, 0, 0, 0);
    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let Ok(value) = value.trim().parse::<u64>() else {
            continue;
        };
        match key {
            "syscr" => out.0 = value,
            "syscw" => out.1 = value,
            "read_bytes" => out.2 = value,
            "write_bytes" => out.3 = value,
            _ => {}
        }
    }
    out
}

/// Parses `/proc/<pid>/statm` (virt, res, shr pages).
#[must_use]
pub fn parse_statm(content: &str) -> MemoryPages {
    let mut it = content.split_whitespace().map(|s| s.parse::<u64>().ok());
    match (it.next().flatten(), it.next().flatten()) {
        (Some(virt), Some(res)) => {
            MemoryPages { virt, res, shr: it.next().flatten().unwrap_or(0) }
        }
        _ => MemoryPages::default(),
    }
}

/// Turns raw `cmdline`/`comm` bytes into a single printable line.
///
/// NUL, CR, LF and TAB become spaces, runs of spaces collapse, double
/// quotes become single quotes and other non-printable bytes become `?`.
#[must_use]
pub fn sanitize_command(raw: &[u8]) -> String {
    let mut out = String::with_capacity(raw.len().min(COMMAND_MAX));
    let mut prev_space = true;
    for &byte in raw {
        if out.len() >= COMMAND_MAX {
            break;
        }
        let c = match byte {
            b'\0' | b'\n' | b'\r' | b'\t' | b' ' => {
                if !prev_space {
                    out.push(' ');
                    prev_space = true;
                }
                continue;
            }
            b'"' => '\'',
            0x21..=0x7e => char::from(byte),
            _ => '?',
        };
        prev_space = false;
        out.push(c);
    }
    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out
}

/// Collector for per-thread counters.
#[derive(Debug)]
pub struct ThreadCollector {
    fs: ProcFs,
    pid_filter: Vec<u32>,
    users: UserCache,
}

impl ThreadCollector {
    /// Creates a collector over every process.
    #[must_use]
    pub fn new(fs: ProcFs) -> Self {
        Self { fs, pid_filter: Vec::new(), users: UserCache::default() }
    }

    /// Restricts sampling to the given process ids; empty means all.
    #[must_use]
    pub fn with_pid_filter(mut self, pids: Vec<u32>) -> Self {
        self.pid_filter = pids;
        self
    }

    /// Replaces the user-name cache.
    #[must_use]
    pub fn with_users(mut self, users: UserCache) -> Self {
        self.users = users;
        self
    }

    fn wants(&self, pid: u32) -> bool {
        self.pid_filter.is_empty() || self.pid_filter.contains(&pid)
    }

    /// Best-effort command label: `cmdline`, then `comm`, then the stat
    /// name, then `[pid]`.
    fn command_of(&self, pid: u32) -> String {
        for file in ["cmdline", "comm"] {
            if let Some(raw) = self.fs.read_proc_bytes(format!("{pid}/{file}")) {
                let cmd = sanitize_command(&raw);
                if !cmd.is_empty() {
                    return cmd;
                }
            }
        }
        if let Some(stat) = self.fs.read_proc(format!("{pid}/stat")) {
            if let Some(name) = stat_name(&stat) {
                let mut name = name.to_string();
                if name.len() > COMMAND_MAX {
                    let mut cut = COMMAND_MAX;
                    while !name.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    name.truncate(cut);
                }
                return name;
            }
        }
        format!("[{pid}]")
    }

    /// Reads one thread; `None` if it vanished.
    fn read_thread(
        &self,
        dir: &str,
        tid: u32,
        tgid: u32,
        user: &str,
        command: &str,
    ) -> Option<ThreadSample> {
        let stat = parse_stat(&self.fs.read_proc(format!("{dir}/stat"))?)?;
        let (syscr, syscw, read_bytes, write_bytes) =
            self.fs.read_proc(format!("{dir}/io")).map(|io| parse_io(&io)).unwrap_or_default();
        let memory = self
            .fs
            .read_proc(format!("{tid}/statm"))
            .or_else(|| self.fs.read_proc(format!("{tgid}/statm")))
            .map(|statm| parse_statm(&statm))
            .unwrap_or_default();

        Some(ThreadSample {
            tid,
            tgid,
            counters: ThreadCounters {
                cpu_ticks: stat.cpu_ticks,
                syscr,
                syscw,
                read_bytes,
                write_bytes,
                blkio_ticks: stat.blkio_ticks,
                minflt: stat.minflt,
                majflt: stat.majflt,
            },
            start_time_ticks: stat.start_time_ticks,
            state: stat.state,
            user: user.to_string(),
            memory,
            command: command.to_string(),
            rates: Default::default(),
        })
    }

    fn push(out: &mut Vec<ThreadSample>, sample: ThreadSample) -> Result<()> {
        out.try_reserve(1).map_err(|_| KvmtopError::OutOfMemory {
            collector: "process",
            requested: out.len() + 1,
        })?;
        out.push(sample);
        Ok(())
    }
}

impl Collector for ThreadCollector {
    type Output = Vec<ThreadSample>;

    fn id(&self) -> &'static str {
        "process"
    }

    fn collect(&mut self) -> Result<Vec<ThreadSample>> {
        let pids = self.fs.numeric_entries("").map_err(|e| KvmtopError::CollectionFailed {
            collector: "process",
            message: format!("failed to read {}: {e}", self.fs.proc_root().display()),
        })?;

        let mut out = Vec::new();
        let mut skipped = 0usize;
        let pids: Vec<u32> = pids.into_iter().filter(|&pid| self.wants(pid)).collect();
        for pid in pids {
            let command = self.command_of(pid);
            let user = self.users.resolve(self.fs.owner_uid(pid.to_string()));

            match self.fs.numeric_entries(format!("{pid}/task")) {
                Ok(tids) => {
                    for tid in tids {
                        let dir = format!("{pid}/task/{tid}");
                        match self.read_thread(&dir, tid, pid, &user, &command) {
                            Some(sample) => Self::push(&mut out, sample)?,
                            None => skipped += 1,
                        }
                    }
                }
                Err(_) => match self.read_thread(&pid.to_string(), pid, pid, &user, &command) {
                    Some(sample) => Self::push(&mut out, sample)?,
                    None => skipped += 1,
                },
            }
        }

        if skipped > 0 {
            crate::trace!("collector.process", "skipped {} vanished threads", skipped);
        }
        Ok(out)
    }

    fn is_available(&self) -> bool {
        self.fs.is_mounted()
    }

    fn display_name(&self) -> &'static str {
        "Threads"
    }
}
