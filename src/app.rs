//! The main loop.
//!
//! Two nested loops. The outer one runs once per sampling interval:
//! promote, capture, derive rates, aggregate (all skipped while frozen).
//! The inner one redraws when something changed and then waits for a
//! keystroke, never past the end of the current interval.

use crate::aggregate::{aggregate_by_process, totals, ProcessRow, Totals};
use crate::collectors::procfs::{clock_ticks_per_second, page_size};
use crate::config::Config;
use crate::error::Result;
use crate::input::{Action, InputController};
use crate::rates::{compute_rates, elapsed_between, global_cpu_from, DeriveRates, RateContext};
use crate::render::{self, Dashboard};
use crate::session::Session;
use crate::snapshot::{Slots, Snapshot, SnapshotStore};
use crate::terminal::{EventSource, InputEvent};
use crate::theme::Theme;
use crate::types::{CounterSources, DiskSample, Entity, NetIface, SystemSummary, ThreadSample};
use ratatui::backend::Backend;
use ratatui::Terminal;
use std::time::{Duration, Instant};

/// Derives rates for one class against its previous snapshot.
fn derive_class<T>(slots: &mut Slots<Snapshot<T>>, interval: Duration, ticks_per_second: u64)
where
    T: Entity + DeriveRates,
{
    let (previous, current) = slots.pair_mut();
    let Some(current) = current else {
        return;
    };
    let elapsed = previous.map_or(0.0, |prev| elapsed_between(prev, &*current));
    let ctx = RateContext::new(elapsed, interval, ticks_per_second);
    compute_rates(previous, current, &ctx);
}

/// Current entities of one class, empty before the first capture.
fn current_of<T: Entity>(slots: &Slots<Snapshot<T>>) -> &[T] {
    slots.current().map(Snapshot::entities).unwrap_or_default()
}

/// Dashboard application state.
#[derive(Debug)]
pub struct App {
    config: Config,
    session: Session,
    input: InputController,
    theme: Theme,
    store: SnapshotStore,
    sources: CounterSources,
    ticks_per_second: u64,
    page_size: u64,
    processes: Vec<ProcessRow>,
    totals: Totals,
    cpu_percent: f64,
    samples: u64,
}

impl App {
    /// Creates the app over `sources`, with the session taken from
    /// `config`.
    #[must_use]
    pub fn new(config: Config, sources: CounterSources) -> Self {
        Self {
            session: Session::new(&config),
            input: InputController::new(),
            theme: Theme::new(config.color),
            store: SnapshotStore::new(),
            sources,
            ticks_per_second: clock_ticks_per_second(),
            page_size: page_size(),
            processes: Vec::new(),
            totals: Totals::default(),
            cpu_percent: 0.0,
            samples: 0,
            config,
        }
    }

    /// Overrides the scheduler clock rate and page size.
    #[must_use]
    pub fn with_clock(mut self, ticks_per_second: u64, page_size: u64) -> Self {
        self.ticks_per_second = ticks_per_second.max(1);
        self.page_size = page_size;
        self
    }

    /// Captures the first snapshot that the first cycle diffs against.
    ///
    /// # Errors
    ///
    /// Returns `OutOfMemory` if an entity collection cannot grow.
    pub fn capture_baseline(&mut self) -> Result<()> {
        self.store.capture_all(&mut self.sources)?;
        crate::info!(
            "app",
            "baseline: {} threads, {} interfaces, {} disks",
            current_of(&self.store.threads).len(),
            current_of(&self.store.interfaces).len(),
            current_of(&self.store.disks).len()
        );
        Ok(())
    }

    /// Runs the sampling half of one outer cycle unless frozen.
    ///
    /// Returns true if a sample was taken.
    ///
    /// # Errors
    ///
    /// Returns `OutOfMemory` if an entity collection cannot grow.
    pub fn begin_cycle(&mut self) -> Result<bool> {
        if self.session.frozen {
            crate::trace!("app", "frozen, sample skipped");
            return Ok(false);
        }
        self.sample()?;
        Ok(true)
    }

    /// Promotes, captures, derives rates and aggregates.
    ///
    /// # Errors
    ///
    /// Returns `OutOfMemory` if an entity collection cannot grow.
    pub fn sample(&mut self) -> Result<()> {
        crate::time_scope!("app", "sample");

        self.store.promote();
        self.store.capture_all(&mut self.sources)?;

        let (interval, ticks) = (self.session.interval, self.ticks_per_second);
        derive_class(&mut self.store.threads, interval, ticks);
        derive_class(&mut self.store.interfaces, interval, ticks);
        derive_class(&mut self.store.disks, interval, ticks);
        self.cpu_percent = global_cpu_from(self.store.cpu.previous(), self.store.cpu.current());

        let threads = current_of(&self.store.threads);
        self.processes = aggregate_by_process(threads);
        self.totals = totals(threads, &self.processes);
        self.samples += 1;

        crate::debug!(
            "app",
            "cycle {}: {} threads in {} processes, cpu {:.2}%",
            self.samples,
            threads.len(),
            self.processes.len(),
            self.cpu_percent
        );
        Ok(())
    }

    /// Dispatches one input event to the controller.
    pub fn handle_event(&mut self, event: InputEvent) -> Action {
        match event {
            InputEvent::Key(key) => self.input.handle_key(&mut self.session, key),
            InputEvent::Resize => Action::Redraw,
            InputEvent::Timeout => Action::None,
        }
    }

    /// Draws one frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to draw.
    pub fn draw<B: Backend>(&self, terminal: &mut Terminal<B>) -> Result<()> {
        let dash = self.dashboard();
        terminal.draw(|frame| render::draw(frame, &dash))?;
        Ok(())
    }

    /// Runs until the session quits.
    ///
    /// # Errors
    ///
    /// Returns an error if drawing or reading input fails, or if a
    /// collection runs out of memory.
    pub fn run<B, E>(&mut self, terminal: &mut Terminal<B>, events: &mut E) -> Result<()>
    where
        B: Backend,
        E: EventSource,
    {
        while !self.session.should_quit {
            let cycle_start = Instant::now();
            self.begin_cycle()?;

            let mut dirty = true;
            loop {
                if dirty {
                    self.draw(terminal)?;
                    dirty = false;
                }
                if self.session.should_quit {
                    break;
                }

                // Help waits for any key with no deadline
                let timeout = if self.session.showing_help() {
                    None
                } else {
                    let remaining = self.session.interval.saturating_sub(cycle_start.elapsed());
                    if remaining.is_zero() {
                        break;
                    }
                    Some(remaining)
                };

                match events.next_event(timeout)? {
                    InputEvent::Timeout => break,
                    event => match self.handle_event(event) {
                        Action::Quit => break,
                        Action::Redraw => dirty = true,
                        Action::None => {}
                    },
                }
            }
        }
        crate::info!("app", "quit after {} samples", self.samples);
        Ok(())
    }

    /// The view model one frame is drawn from.
    #[must_use]
    pub fn dashboard(&self) -> Dashboard<'_> {
        Dashboard {
            session: &self.session,
            theme: self.theme,
            system: &self.store.system,
            cpu_percent: self.cpu_percent,
            processes: &self.processes,
            threads: self.threads(),
            totals: &self.totals,
            interfaces: self.interfaces(),
            disks: self.disks(),
            skip_interfaces: &self.config.skip_interfaces,
            ticks_per_second: self.ticks_per_second,
            page_size: self.page_size,
        }
    }

    /// Session state.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable session state.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Process rows of the last sample.
    #[must_use]
    pub fn processes(&self) -> &[ProcessRow] {
        &self.processes
    }

    /// Raw thread view of the last sample.
    #[must_use]
    pub fn threads(&self) -> &[ThreadSample] {
        current_of(&self.store.threads)
    }

    /// Interfaces of the last sample.
    #[must_use]
    pub fn interfaces(&self) -> &[NetIface] {
        current_of(&self.store.interfaces)
    }

    /// Block devices of the last sample.
    #[must_use]
    pub fn disks(&self) -> &[DiskSample] {
        current_of(&self.store.disks)
    }

    /// Footer totals.
    #[must_use]
    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    /// System gauges.
    #[must_use]
    pub fn system(&self) -> &SystemSummary {
        &self.store.system
    }

    /// Global CPU percentage.
    #[must_use]
    pub fn cpu_percent(&self) -> f64 {
        self.cpu_percent
    }

    /// Number of samples taken, excluding the baseline.
    #[must_use]
    pub fn samples(&self) -> u64 {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Collector, GlobalCpu, ThreadCounters};
    use approx::assert_relative_eq;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    /// Replays a list of outputs, repeating the last one.
    struct Script<T> {
        outputs: Vec<T>,
        next: usize,
    }

    impl<T: Clone + Send> Collector for Script<T> {
        type Output = T;

        fn id(&self) -> &'static str {
            "script"
        }

        fn collect(&mut self) -> Result<T> {
            let idx = self.next.min(self.outputs.len() - 1);
            self.next += 1;
            Ok(self.outputs[idx].clone())
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn script<T: Clone + Send + 'static>(outputs: Vec<T>) -> Box<dyn Collector<Output = T>> {
        Box::new(Script { outputs, next: 0 })
    }

    fn thread(tid: u32, tgid: u32, cpu_ticks: u64) -> ThreadSample {
        ThreadSample {
            tid,
            tgid,
            counters: ThreadCounters { cpu_ticks, ..Default::default() },
            command: format!("cmd{tgid}"),
            ..Default::default()
        }
    }

    fn app(threads: Vec<Vec<ThreadSample>>) -> App {
        let sources = CounterSources {
            threads: script(threads),
            interfaces: script(vec![Vec::new()]),
            disks: script(vec![Vec::new()]),
            cpu: script(vec![
                GlobalCpu { user: 100, idle: 900, ..Default::default() },
                GlobalCpu { user: 150, idle: 950, ..Default::default() },
            ]),
            system: script(vec![SystemSummary { online_cpus: 4, ..Default::default() }]),
        };
        App::new(Config::default(), sources).with_clock(100, 4096)
    }

    #[test]
    fn test_first_sample_diffs_against_baseline() {
        let mut app = app(vec![
            vec![thread(10, 10, 100), thread(11, 10, 0)],
            vec![thread(10, 10, 150), thread(11, 10, 25), thread(12, 10, 40)],
        ]);

        app.capture_baseline().unwrap();
        app.sample().unwrap();

        assert_eq!(app.samples(), 1);
        assert_eq!(app.processes().len(), 1);
        assert_eq!(app.processes()[0].threads, 3);
        // thread 12 is new and contributes zero; dt falls back to a real
        // elapsed time, so only check the ratio
        let t10 = app.threads().iter().find(|t| t.tid == 10).map(|t| t.rates.cpu_pct).unwrap();
        let t11 = app.threads().iter().find(|t| t.tid == 11).map(|t| t.rates.cpu_pct).unwrap();
        let t12 = app.threads().iter().find(|t| t.tid == 12).map(|t| t.rates.cpu_pct).unwrap();
        assert_relative_eq!(t10, t11 * 2.0, max_relative = 1e-9);
        assert_eq!(t12, 0.0);
        assert_relative_eq!(app.processes()[0].rates.cpu_pct, t10 + t11, max_relative = 1e-9);
        assert_relative_eq!(app.cpu_percent(), 50.0);
        assert_eq!(app.system().online_cpus, 4);
    }

    #[test]
    fn test_frozen_cycle_does_not_sample() {
        let mut app = app(vec![vec![thread(1, 1, 0)]]);
        app.capture_baseline().unwrap();

        assert!(app.begin_cycle().unwrap());
        app.session_mut().frozen = true;
        assert!(!app.begin_cycle().unwrap());
        assert_eq!(app.samples(), 1);
    }

    #[test]
    fn test_handle_event_routes_to_session() {
        let mut app = app(vec![Vec::new()]);
        let key = KeyEvent::new(KeyCode::Char('n'), KeyModifiers::empty());

        assert_eq!(app.handle_event(InputEvent::Key(key)), Action::Redraw);
        assert_eq!(app.session().view, crate::session::ViewMode::Network);
        assert_eq!(app.handle_event(InputEvent::Resize), Action::Redraw);
        assert_eq!(app.handle_event(InputEvent::Timeout), Action::None);
    }

    #[test]
    fn test_accessors_before_capture() {
        let app = app(vec![Vec::new()]);
        assert!(app.threads().is_empty());
        assert!(app.interfaces().is_empty());
        assert!(app.disks().is_empty());
        assert!(app.processes().is_empty());
        assert_eq!(app.cpu_percent(), 0.0);
    }
}
