//! Core types for kvmtop.
//!
//! - [`Entity`]: anything that lives in a keyed snapshot
//! - [`Collector`]: a counter source for one resource class
//! - Sample records for threads, network interfaces, block devices and the
//!   global CPU, each carrying raw cumulative counters plus the rates
//!   derived from them

use crate::error::Result;
use std::fmt::Debug;
use std::ops::AddAssign;

// ============================================================================
// Traits
// ============================================================================

/// One monitored unit inside a snapshot.
///
/// The key must be unique within a snapshot and must stay the same across
/// snapshots for the same real-world entity.
pub trait Entity {
    /// Identity key type.
    type Key: Ord + Debug;

    /// Returns the identity key.
    fn key(&self) -> &Self::Key;
}

/// A counter source for one resource class.
///
/// Collectors gather raw cumulative counters only; they never compute
/// rates. Entities that vanish mid-read are skipped, not reported.
///
/// # Example
///
/// ```rust,ignore
/// use kvmtop::{Collector, GlobalCpu, Result};
///
/// struct FixedCpu(GlobalCpu);
///
/// impl Collector for FixedCpu {
///     type Output = GlobalCpu;
///
///     fn id(&self) -> &'static str {
///         "fixed"
///     }
///
///     fn collect(&mut self) -> Result<GlobalCpu> {
///         Ok(self.0.clone())
///     }
///
///     fn is_available(&self) -> bool {
///         true
///     }
/// }
/// ```
pub trait Collector: Send {
    /// What one collection produces.
    type Output;

    /// Returns the unique identifier for this collector.
    fn id(&self) -> &'static str;

    /// Reads the current counters.
    ///
    /// # Errors
    ///
    /// Returns an error if the source as a whole cannot be read, or if the
    /// entity collection cannot grow.
    fn collect(&mut self) -> Result<Self::Output>;

    /// Returns true if this collector is available on the current system.
    fn is_available(&self) -> bool;

    /// Returns a human-readable name for this collector.
    fn display_name(&self) -> &'static str {
        self.id()
    }
}

/// A boxed collector for dynamic dispatch.
pub type BoxedCollector<T> = Box<dyn Collector<Output = T>>;

/// The full set of counter sources sampled each cycle.
pub struct CounterSources {
    /// Per-thread counters.
    pub threads: BoxedCollector<Vec<ThreadSample>>,
    /// Per-interface counters.
    pub interfaces: BoxedCollector<Vec<NetIface>>,
    /// Per-block-device counters.
    pub disks: BoxedCollector<Vec<DiskSample>>,
    /// Global CPU tick breakdown.
    pub cpu: BoxedCollector<GlobalCpu>,
    /// Memory, swap and uptime gauges.
    pub system: BoxedCollector<SystemSummary>,
}

impl Debug for CounterSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CounterSources")
            .field("threads", &self.threads.id())
            .field("interfaces", &self.interfaces.id())
            .field("disks", &self.disks.id())
            .field("cpu", &self.cpu.id())
            .field("system", &self.system.id())
            .finish()
    }
}

// ============================================================================
// Threads and processes
// ============================================================================

/// Scheduler run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ProcessState {
    /// Running or runnable (on run queue).
    Running,
    /// Interruptible sleep (waiting for an event).
    Sleeping,
    /// Uninterruptible sleep (usually IO).
    DiskWait,
    /// Defunct/zombie process.
    Zombie,
    /// Stopped (on signal or by debugger).
    Stopped,
    /// Tracing stop (by debugger).
    Traced,
    /// Idle kernel thread.
    Idle,
    /// Dead (should never be seen).
    Dead,
    /// Unknown state.
    #[default]
    Unknown,
}

impl ProcessState {
    /// Parses a state character from `/proc/[pid]/stat`.
    #[must_use]
    pub fn from_char(c: char) -> Self {
        match c {
            'R' => Self::Running,
            'S' => Self::Sleeping,
            'D' => Self::DiskWait,
            'Z' => Self::Zombie,
            'T' => Self::Stopped,
            't' => Self::Traced,
            'I' => Self::Idle,
            'X' | 'x' => Self::Dead,
            _ => Self::Unknown,
        }
    }

    /// Returns a display character.
    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Self::Running => 'R',
            Self::Sleeping => 'S',
            Self::DiskWait => 'D',
            Self::Zombie => 'Z',
            Self::Stopped => 'T',
            Self::Traced => 't',
            Self::Idle => 'I',
            Self::Dead => 'X',
            Self::Unknown => '?',
        }
    }
}

/// Monotonic per-thread counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThreadCounters {
    /// utime + stime, in scheduler ticks.
    pub cpu_ticks: u64,
    /// Read system calls.
    pub syscr: u64,
    /// Write system calls.
    pub syscw: u64,
    /// Bytes fetched from storage.
    pub read_bytes: u64,
    /// Bytes sent to storage.
    pub write_bytes: u64,
    /// Aggregated block I/O delay, in ticks.
    pub blkio_ticks: u64,
    /// Minor page faults.
    pub minflt: u64,
    /// Major page faults.
    pub majflt: u64,
}

/// Memory gauges in pages, as reported by `statm`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryPages {
    /// Virtual size.
    pub virt: u64,
    /// Resident set size.
    pub res: u64,
    /// Resident shared pages.
    pub shr: u64,
}

impl AddAssign for MemoryPages {
    fn add_assign(&mut self, rhs: Self) {
        self.virt += rhs.virt;
        self.res += rhs.res;
        self.shr += rhs.shr;
    }
}

/// Rates derived for one thread (or summed for one process).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThreadRates {
    /// CPU usage, percent of one CPU.
    pub cpu_pct: f64,
    /// Logical read operations per second.
    pub read_ops: f64,
    /// Logical write operations per second.
    pub write_ops: f64,
    /// Block I/O wait accumulated during the interval, in milliseconds.
    pub io_wait_ms: f64,
    /// Storage read throughput, MiB/s.
    pub read_mib: f64,
    /// Storage write throughput, MiB/s.
    pub write_mib: f64,
    /// Minor faults per second.
    pub minflt_ps: f64,
    /// Major faults per second.
    pub majflt_ps: f64,
}

impl AddAssign for ThreadRates {
    fn add_assign(&mut self, rhs: Self) {
        self.cpu_pct += rhs.cpu_pct;
        self.read_ops += rhs.read_ops;
        self.write_ops += rhs.write_ops;
        self.io_wait_ms += rhs.io_wait_ms;
        self.read_mib += rhs.read_mib;
        self.write_mib += rhs.write_mib;
        self.minflt_ps += rhs.minflt_ps;
        self.majflt_ps += rhs.majflt_ps;
    }
}

/// One thread at one instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadSample {
    /// Thread id (the snapshot key).
    pub tid: u32,
    /// Owning process id.
    pub tgid: u32,
    /// Cumulative counters.
    pub counters: ThreadCounters,
    /// Start time, in ticks since boot.
    pub start_time_ticks: u64,
    /// Run state.
    pub state: ProcessState,
    /// Owning user name.
    pub user: String,
    /// Memory gauges.
    pub memory: MemoryPages,
    /// Sanitised command label of the owning process.
    pub command: String,
    /// Derived rates, zero until computed.
    pub rates: ThreadRates,
}

impl ThreadSample {
    /// Returns true if this is the main thread of its process.
    #[must_use]
    pub fn is_main_thread(&self) -> bool {
        self.tid == self.tgid
    }
}

impl Entity for ThreadSample {
    type Key = u32;

    fn key(&self) -> &u32 {
        &self.tid
    }
}

// ============================================================================
// Network interfaces
// ============================================================================

/// Monotonic per-interface counters from `/proc/net/dev`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetCounters {
    /// Bytes received.
    pub rx_bytes: u64,
    /// Bytes transmitted.
    pub tx_bytes: u64,
    /// Packets received.
    pub rx_packets: u64,
    /// Packets transmitted.
    pub tx_packets: u64,
    /// Receive errors.
    pub rx_errors: u64,
    /// Transmit errors.
    pub tx_errors: u64,
}

/// Rates derived for one interface.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NetRates {
    /// Receive throughput, megabits per second (decimal).
    pub rx_mbps: f64,
    /// Transmit throughput, megabits per second (decimal).
    pub tx_mbps: f64,
    /// Received packets per second.
    pub rx_pps: f64,
    /// Transmitted packets per second.
    pub tx_pps: f64,
    /// Receive errors per second.
    pub rx_errs_ps: f64,
    /// Transmit errors per second.
    pub tx_errs_ps: f64,
}

/// Virtual machine owning an interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VmInfo {
    /// Numeric VM id from `-id`, if present.
    pub id: Option<u32>,
    /// VM name from `-name`.
    pub name: String,
}

/// One network interface at one instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetIface {
    /// Interface name (the snapshot key).
    pub name: String,
    /// Operational state (`up`, `down`, `unknown`, `?`).
    pub operstate: String,
    /// Cumulative counters.
    pub counters: NetCounters,
    /// Owning VM, when one was found.
    pub vm: Option<VmInfo>,
    /// Derived rates.
    pub rates: NetRates,
}

impl Entity for NetIface {
    type Key = String;

    fn key(&self) -> &String {
        &self.name
    }
}

// ============================================================================
// Block devices
// ============================================================================

/// Monotonic per-device counters from `/proc/diskstats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskCounters {
    /// Reads completed.
    pub reads: u64,
    /// Writes completed.
    pub writes: u64,
    /// Sectors read.
    pub sectors_read: u64,
    /// Sectors written.
    pub sectors_written: u64,
    /// Time spent reading (ms).
    pub read_time_ms: u64,
    /// Time spent writing (ms).
    pub write_time_ms: u64,
    /// Time spent doing I/O (ms).
    pub io_ticks: u64,
    /// Weighted time in queue (ms).
    pub time_in_queue: u64,
}

/// Rates derived for one block device.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DiskRates {
    /// Read operations per second.
    pub read_iops: f64,
    /// Write operations per second.
    pub write_iops: f64,
    /// Read throughput, MiB/s.
    pub read_mib: f64,
    /// Write throughput, MiB/s.
    pub write_mib: f64,
    /// Average read latency per operation, ms.
    pub read_latency_ms: f64,
    /// Average write latency per operation, ms.
    pub write_latency_ms: f64,
    /// Busy time percentage, capped at 100.
    pub util_pct: f64,
}

/// One block device at one instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiskSample {
    /// Device name (the snapshot key).
    pub name: String,
    /// Cumulative counters.
    pub counters: DiskCounters,
    /// I/Os currently in flight.
    pub in_flight: u64,
    /// Request queue depth from sysfs, 0 if unknown.
    pub queue_depth: u32,
    /// Derived rates.
    pub rates: DiskRates,
}

impl Entity for DiskSample {
    type Key = String;

    fn key(&self) -> &String {
        &self.name
    }
}

// ============================================================================
// Global CPU and system gauges
// ============================================================================

/// Global CPU tick breakdown from the `cpu` line of `/proc/stat`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalCpu {
    /// User ticks.
    pub user: u64,
    /// Niced user ticks.
    pub nice: u64,
    /// System ticks.
    pub system: u64,
    /// Idle ticks.
    pub idle: u64,
    /// I/O wait ticks.
    pub iowait: u64,
    /// Hard interrupt ticks.
    pub irq: u64,
    /// Soft interrupt ticks.
    pub softirq: u64,
    /// Stolen ticks.
    pub steal: u64,
}

impl GlobalCpu {
    /// Total CPU time.
    #[must_use]
    pub fn total(&self) -> u64 {
        [self.nice, self.system, self.idle, self.iowait, self.irq, self.softirq, self.steal]
            .into_iter()
            .fold(self.user, u64::saturating_add)
    }
}

/// Point-in-time system gauges for the summary line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemSummary {
    /// `MemTotal`, KiB.
    pub mem_total_kib: u64,
    /// `MemFree`, KiB.
    pub mem_free_kib: u64,
    /// `Buffers`, KiB.
    pub buffers_kib: u64,
    /// `SwapTotal`, KiB.
    pub swap_total_kib: u64,
    /// `SwapFree`, KiB.
    pub swap_free_kib: u64,
    /// Seconds since boot.
    pub uptime_secs: f64,
    /// Online CPUs.
    pub online_cpus: usize,
}

impl SystemSummary {
    /// Total RAM, MiB.
    #[must_use]
    pub fn ram_total_mib(&self) -> u64 {
        self.mem_total_kib / 1024
    }

    /// Used RAM (total - free - buffers), MiB.
    #[must_use]
    pub fn ram_used_mib(&self) -> u64 {
        self.ram_total_mib()
            .saturating_sub(self.mem_free_kib / 1024)
            .saturating_sub(self.buffers_kib / 1024)
    }

    /// Total swap, MiB.
    #[must_use]
    pub fn swap_total_mib(&self) -> u64 {
        self.swap_total_kib / 1024
    }

    /// Used swap, MiB.
    #[must_use]
    pub fn swap_used_mib(&self) -> u64 {
        self.swap_total_mib().saturating_sub(self.swap_free_kib / 1024)
    }
}

/// Percentage of `part` in `whole`, 0 when `whole` is 0.
#[must_use]
pub fn percent_of(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
