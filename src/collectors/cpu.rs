//! Global CPU tick collector.
//!
//! Reads the aggregate `cpu` line of `/proc/stat`.

use crate::collectors::procfs::ProcFs;
use crate::error::{KvmtopError, Result};
use crate::types::{Collector, GlobalCpu};

/// Parses a `cpu  user nice system idle iowait irq softirq steal ...` line.
///
/// Missing trailing fields read as zero (older kernels have no `steal`).
#[must_use]
pub fn parse_cpu_line(line: &str) -> Option<GlobalCpu> {
    let mut parts = line.split_whitespace();
    if parts.next()? != "cpu" {
        return None;
    }
    let values: Vec<u64> = parts.map_while(|s| s.parse().ok()).collect();
    if values.len() < 4 {
        return None;
    }
    let field = |idx: usize| values.get(idx).copied().unwrap_or(0);

    Some(GlobalCpu {
        user: field(0),
        nice: field(1),
        system: field(2),
        idle: field(3),
        iowait: field(4),
        irq: field(5),
        softirq: field(6),
        steal: field(7),
    })
}

/// Counts `cpuN` lines, i.e. online CPUs.
#[must_use]
pub fn count_cpus(stat: &str) -> usize {
    stat.lines()
        .filter(|line| {
            line.strip_prefix("cpu").is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
        })
        .count()
}

/// Collector for the global CPU breakdown.
#[derive(Debug)]
pub struct CpuCollector {
    fs: ProcFs,
}

impl CpuCollector {
    /// Creates a new CPU collector.
    #[must_use]
    pub fn new(fs: ProcFs) -> Self {
        Self { fs }
    }
}

impl Collector for CpuCollector {
    type Output = GlobalCpu;

    fn id(&self) -> &'static str {
        "cpu"
    }

    fn collect(&mut self) -> Result<GlobalCpu> {
        let content = self.fs.read_proc("stat").ok_or_else(|| KvmtopError::CollectionFailed {
            collector: "cpu",
            message: format!("failed to read {}", self.fs.proc_path("stat").display()),
        })?;

        Ok(content.lines().next().and_then(parse_cpu_line).unwrap_or_default())
    }

    fn is_available(&self) -> bool {
        self.fs.is_mounted()
    }

    fn display_name(&self) -> &'static str {
        "CPU"
    }
}
