//! Network interface counter collector.
//!
//! Parses `/proc/net/dev` and reads each interface's operational state
//! from `/sys/class/net/<iface>/operstate`. All interfaces are captured;
//! hiding loopback and firewall bridges is a display concern.

use crate::collectors::kvm;
use crate::collectors::procfs::ProcFs;
use crate::error::{KvmtopError, Result};
use crate::types::{Collector, NetCounters, NetIface};

/// Parses `/proc/net/dev` into `(name, counters)` pairs.
///
/// Lines with fewer than ten counter fields keep the interface with zero
/// counters.
#[must_use]
pub fn parse_net_dev(content: &str) -> Vec<(String, NetCounters)> {
    let mut out = Vec::new();

    // First two lines are headers
    for line in content.lines().skip(2) {
        let Some((name, stats)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }

        let values: Vec<u64> = stats.split_whitespace().map_while(|s| s.parse().ok()).collect();
        let counters = if values.len() >= 10 {
            NetCounters {
                rx_bytes: values[0],
                rx_packets: values[1],
                rx_errors: values[2],
                tx_bytes: values[8],
                tx_packets: values[9],
                tx_errors: values.get(10).copied().unwrap_or(0),
            }
        } else {
            NetCounters::default()
        };
        out.push((name.to_string(), counters));
    }

    out
}

/// Collector for per-interface counters.
#[derive(Debug)]
pub struct NetworkCollector {
    fs: ProcFs,
    annotate_vms: bool,
}

impl NetworkCollector {
    /// Creates a new network collector.
    #[must_use]
    pub fn new(fs: ProcFs) -> Self {
        Self { fs, annotate_vms: true }
    }

    /// Enables or disables VM ownership tagging.
    #[must_use]
    pub fn with_vm_annotation(mut self, enabled: bool) -> Self {
        self.annotate_vms = enabled;
        self
    }

    fn operstate(&self, name: &str) -> String {
        self.fs
            .read_sys(format!("class/net/{name}/operstate"))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "?".to_string())
    }
}

impl Collector for NetworkCollector {
    type Output = Vec<NetIface>;

    fn id(&self) -> &'static str {
        "network"
    }

    fn collect(&mut self) -> Result<Vec<NetIface>> {
        let content =
            self.fs.read_proc("net/dev").ok_or_else(|| KvmtopError::CollectionFailed {
                collector: "network",
                message: format!("failed to read {}", self.fs.proc_path("net/dev").display()),
            })?;

        let parsed = parse_net_dev(&content);
        let mut out = Vec::new();
        out.try_reserve(parsed.len())
            .map_err(|_| KvmtopError::OutOfMemory { collector: "network", requested: parsed.len() })?;
        for (name, counters) in parsed {
            let operstate = self.operstate(&name);
            out.push(NetIface { name, operstate, counters, vm: None, rates: Default::default() });
        }

        if self.annotate_vms {
            kvm::annotate(&self.fs, &mut out);
        }
        Ok(out)
    }

    fn is_available(&self) -> bool {
        self.fs.proc_path("net/dev").exists()
    }

    fn display_name(&self) -> &'static str {
        "Network"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NET_DEV: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 1000      10    0    0    0     0          0         0     1000      10    0    0    0     0       0          0
  eth0: 123456789 1000  2    0    0     0          0         0 987654321   2000    3    0    0     0       0          0
tap100i0: 5 1 0 0
";

    #[test]
    fn test_parse_net_dev() {
        let parsed = parse_net_dev(NET_DEV);

        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].0, "lo");
        let eth0 = &parsed[1].1;
        assert_eq!(eth0.rx_bytes, 123_456_789);
        assert_eq!(eth0.rx_packets, 1000);
        assert_eq!(eth0.rx_errors, 2);
        assert_eq!(eth0.tx_bytes, 987_654_321);
        assert_eq!(eth0.tx_packets, 2000);
        assert_eq!(eth0.tx_errors, 3);
    }

    #[test]
    fn test_short_line_keeps_interface_with_zero_counters() {
        let parsed = parse_net_dev(NET_DEV);
        assert_eq!(parsed[2].0, "tap100i0");
        assert_eq!(parsed[2].1, NetCounters::default());
    }

    #[test]
    fn test_collect_reads_operstate() {
        let dir = tempfile::tempdir().unwrap();
        let proc = dir.path().join("proc");
        let sys = dir.path().join("sys");
        std::fs::create_dir_all(proc.join("net")).unwrap();
        std::fs::write(proc.join("net/dev"), NET_DEV).unwrap();
        std::fs::create_dir_all(sys.join("class/net/eth0")).unwrap();
        std::fs::write(sys.join("class/net/eth0/operstate"), "up\n").unwrap();

        let mut collector = NetworkCollector::new(ProcFs::new(&proc, &sys));
        assert!(collector.is_available());

        let ifaces = collector.collect().unwrap();
        assert_eq!(ifaces.len(), 3);
        assert_eq!(ifaces[1].operstate, "up");
        assert_eq!(ifaces[0].operstate, "?");
    }

    #[test]
    fn test_collect_without_net_dev_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut collector = NetworkCollector::new(ProcFs::new(dir.path(), dir.path()));

        assert!(!collector.is_available());
        assert!(collector.collect().is_err());
    }
}
