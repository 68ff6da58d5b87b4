//! Block device counter collector.
//!
//! Parses `/proc/diskstats` and reads the request queue depth from
//! `/sys/block/<dev>/queue/nr_requests`.

use crate::collectors::procfs::ProcFs;
use crate::error::{KvmtopError, Result};
use crate::types::{Collector, DiskCounters, DiskSample};

/// One parsed `/proc/diskstats` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskLine {
    /// Device name.
    pub name: String,
    /// Cumulative counters.
    pub counters: DiskCounters,
    /// I/Os in flight.
    pub in_flight: u64,
}

/// Parses `/proc/diskstats`.
///
/// Needs at least the eight read/write fields after the name; the
/// in-flight, busy and queue fields default to zero when absent.
#[must_use]
pub fn parse_diskstats(content: &str) -> Vec<DiskLine> {
    let mut out = Vec::new();
    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 11 {
            continue;
        }
        let num = |idx: usize| fields.get(idx).and_then(|s| s.parse::<u64>().ok());
        let (Some(reads), Some(sectors_read), Some(read_time_ms)) = (num(3), num(5), num(6)) else {
            continue;
        };
        let (Some(writes), Some(sectors_written), Some(write_time_ms)) = (num(7), num(9), num(10))
        else {
            continue;
        };

        out.push(DiskLine {
            name: fields[2].to_string(),
            counters: DiskCounters {
                reads,
                writes,
                sectors_read,
                sectors_written,
                read_time_ms,
                write_time_ms,
                io_ticks: num(12).unwrap_or(0),
                time_in_queue: num(13).unwrap_or(0),
            },
            in_flight: num(11).unwrap_or(0),
        });
    }
    out
}

/// Collector for per-device counters.
#[derive(Debug)]
pub struct DiskCollector {
    fs: ProcFs,
    skip_prefixes: Vec<String>,
}

impl DiskCollector {
    /// Creates a disk collector that never captures devices starting with
    /// one of `skip_prefixes`.
    #[must_use]
    pub fn new(fs: ProcFs, skip_prefixes: Vec<String>) -> Self {
        Self { fs, skip_prefixes }
    }

    fn skipped(&self, name: &str) -> bool {
        self.skip_prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }

    fn queue_depth(&self, name: &str) -> u32 {
        self.fs
            .read_sys(format!("block/{name}/queue/nr_requests"))
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }
}

impl Collector for DiskCollector {
    type Output = Vec<DiskSample>;

    fn id(&self) -> &'static str {
        "disk"
    }

    fn collect(&mut self) -> Result<Vec<DiskSample>> {
        let content =
            self.fs.read_proc("diskstats").ok_or_else(|| KvmtopError::CollectionFailed {
                collector: "disk",
                message: format!("failed to read {}", self.fs.proc_path("diskstats").display()),
            })?;

        let mut out = Vec::new();
        for line in parse_diskstats(&content) {
            if self.skipped(&line.name) {
                continue;
            }
            out.try_reserve(1).map_err(|_| KvmtopError::OutOfMemory {
                collector: "disk",
                requested: out.len() + 1,
            })?;
            let queue_depth = self.queue_depth(&line.name);
            out.push(DiskSample {
                name: line.name,
                counters: line.counters,
                in_flight: line.in_flight,
                queue_depth,
                rates: Default::default(),
            });
        }
        Ok(out)
    }

    fn is_available(&self) -> bool {
        self.fs.proc_path("diskstats").exists()
    }

    fn display_name(&self) -> &'static str {
        "Storage"
    }
}
