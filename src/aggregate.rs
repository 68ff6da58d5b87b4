//! Thread → process aggregation.

use crate::types::{MemoryPages, ProcessState, ThreadRates, ThreadSample};

/// One process-level row: every thread of one process, rates summed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessRow {
    /// Process id (the thread group id, never a worker tid).
    pub pid: u32,
    /// Owning user.
    pub user: String,
    /// Run state of the main thread, or of the last thread visited when
    /// the main thread was not captured.
    pub state: ProcessState,
    /// Command label.
    pub command: String,
    /// Process start time, ticks since boot.
    pub start_time_ticks: u64,
    /// Process memory gauges.
    pub memory: MemoryPages,
    /// Summed rates of every thread.
    pub rates: ThreadRates,
    /// Number of threads merged into this row.
    pub threads: usize,
}

impl ProcessRow {
    fn start(thread: &ThreadSample) -> Self {
        Self {
            pid: thread.tgid,
            user: thread.user.clone(),
            state: thread.state,
            command: thread.command.clone(),
            start_time_ticks: thread.start_time_ticks,
            memory: thread.memory,
            rates: thread.rates,
            threads: 1,
        }
    }

    fn merge(&mut self, thread: &ThreadSample, main_seen: &mut bool) {
        self.rates += thread.rates;
        self.threads += 1;
        if thread.is_main_thread() {
            *main_seen = true;
            self.state = thread.state;
            self.start_time_ticks = thread.start_time_ticks;
            self.memory = thread.memory;
        } else if !*main_seen {
            self.state = thread.state;
        }
        self.command.clone_from(&thread.command);
    }
}

/// Collapses threads into one row per process.
///
/// Threads are stably ordered by process id and consecutive runs merged.
/// Rows come out ordered by pid.
#[must_use]
pub fn aggregate_by_process(threads: &[ThreadSample]) -> Vec<ProcessRow> {
    let mut ordered: Vec<&ThreadSample> = threads.iter().collect();
    ordered.sort_by_key(|t| t.tgid);

    let mut rows: Vec<ProcessRow> = Vec::new();
    let mut main_seen = false;
    for thread in ordered {
        match rows.last_mut() {
            Some(row) if row.pid == thread.tgid => row.merge(thread, &mut main_seen),
            _ => {
                main_seen = thread.is_main_thread();
                rows.push(ProcessRow::start(thread));
            }
        }
    }
    rows
}

/// Sums for the totals footer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    /// Sum of every thread's rates.
    pub rates: ThreadRates,
    /// Sum of process memory gauges, one per process.
    pub memory: MemoryPages,
}

/// Totals over the raw thread view and the process rows.
///
/// Memory is summed per process because every thread of a process reports
/// the same address space.
#[must_use]
pub fn totals(threads: &[ThreadSample], processes: &[ProcessRow]) -> Totals {
    let mut out = Totals::default();
    for thread in threads {
        out.rates += thread.rates;
    }
    for row in processes {
        out.memory += row.memory;
    }
    out
}
