//! Memory, swap, uptime and CPU-count gauges for the summary line.

use crate::collectors::cpu::count_cpus;
use crate::collectors::procfs::ProcFs;
use crate::error::Result;
use crate::types::{Collector, SystemSummary};

/// Reads a `Key:   value kB` entry from `/proc/meminfo`.
fn meminfo_value(content: &str, key: &str) -> u64 {
    content
        .lines()
        .find_map(|line| {
            let (name, rest) = line.split_once(':')?;
            (name == key).then(|| rest.split_whitespace().next()?.parse().ok()).flatten()
        })
        .unwrap_or(0)
}

/// Parses `/proc/meminfo` into a summary with memory fields filled.
#[must_use]
pub fn parse_meminfo(content: &str) -> SystemSummary {
    SystemSummary {
        mem_total_kib: meminfo_value(content, "MemTotal"),
        mem_free_kib: meminfo_value(content, "MemFree"),
        buffers_kib: meminfo_value(content, "Buffers"),
        swap_total_kib: meminfo_value(content, "SwapTotal"),
        swap_free_kib: meminfo_value(content, "SwapFree"),
        ..SystemSummary::default()
    }
}

/// Parses the first field of `/proc/uptime`.
#[must_use]
pub fn parse_uptime(content: &str) -> f64 {
    content.split_whitespace().next().and_then(|s| s.parse().ok()).unwrap_or(0.0)
}

/// Collector for system-wide gauges.
///
/// Every source is optional: a missing file leaves its fields at zero.
#[derive(Debug)]
pub struct SystemCollector {
    fs: ProcFs,
}

impl SystemCollector {
    /// Creates a new system collector.
    #[must_use]
    pub fn new(fs: ProcFs) -> Self {
        Self { fs }
    }
}

impl Collector for SystemCollector {
    type Output = SystemSummary;

    fn id(&self) -> &'static str {
        "system"
    }

    fn collect(&mut self) -> Result<SystemSummary> {
        let mut summary =
            self.fs.read_proc("meminfo").map(|m| parse_meminfo(&m)).unwrap_or_default();
        summary.uptime_secs = self.fs.read_proc("uptime").map_or(0.0, |u| parse_uptime(&u));
        summary.online_cpus = self.fs.read_proc("stat").map_or(0, |s| count_cpus(&s)).max(1);
        Ok(summary)
    }

    fn is_available(&self) -> bool {
        self.fs.proc_path("meminfo").exists()
    }

    fn display_name(&self) -> &'static str {
        "System"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMINFO: &str = "\
MemTotal:       16384000 kB
MemFree:         4096000 kB
MemAvailable:    8192000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapTotal:       2048000 kB
SwapFree:        1024000 kB
";

    #[test]
    fn test_parse_meminfo() {
        let summary = parse_meminfo(MEMINFO);

        assert_eq!(summary.mem_total_kib, 16_384_000);
        assert_eq!(summary.mem_free_kib, 4_096_000);
        assert_eq!(summary.buffers_kib, 512_000);
        assert_eq!(summary.swap_total_kib, 2_048_000);
        assert_eq!(summary.swap_free_kib, 1_024_000);
    }

    #[test]
    fn test_parse_uptime() {
        assert_eq!(parse_uptime("12345.67 54321.00\n"), 12345.67);
        assert_eq!(parse_uptime(""), 0.0);
    }

    #[test]
    fn test_collect_tolerates_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut collector = SystemCollector::new(ProcFs::new(dir.path(), dir.path()));

        let summary = collector.collect().unwrap();
        assert_eq!(summary.mem_total_kib, 0);
        assert_eq!(summary.online_cpus, 1);
        assert!(!collector.is_available());
    }

    #[test]
    fn test_collect_from_fake_proc() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("meminfo"), MEMINFO).unwrap();
        std::fs::write(dir.path().join("uptime"), "90061.5 1.0\n").unwrap();
        std::fs::write(dir.path().join("stat"), "cpu 1 1 1 1\ncpu0 1 1 1 1\ncpu1 1 1 1 1\n")
            .unwrap();
        let mut collector = SystemCollector::new(ProcFs::new(dir.path(), dir.path()));

        let summary = collector.collect().unwrap();
        assert_eq!(summary.online_cpus, 2);
        assert_eq!(summary.uptime_secs, 90061.5);
        assert_eq!(summary.ram_total_mib(), 16000);
    }
}
