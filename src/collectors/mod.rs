//! Counter sources over procfs and sysfs.
//!
//! - **Threads**: per-thread CPU, I/O, fault and memory counters
//! - **Network**: per-interface byte, packet and error counters
//! - **Disk**: per-device operation, sector and time counters
//! - **CPU / System**: global tick breakdown and memory gauges
//! - **KVM**: best-effort VM ownership of tap interfaces

pub mod cpu;
pub mod disk;
pub mod kvm;
pub mod network;
pub mod process;
pub mod procfs;
pub mod system;
pub mod users;

pub use cpu::CpuCollector;
pub use disk::DiskCollector;
pub use network::NetworkCollector;
pub use process::ThreadCollector;
pub use procfs::ProcFs;
pub use system::SystemCollector;
pub use users::UserCache;

use crate::config::Config;
use crate::types::CounterSources;

/// Builds the procfs-backed sources for a configuration.
///
/// `pid_filter` restricts thread sampling to the given process ids.
#[must_use]
pub fn procfs_sources(config: &Config, pid_filter: Vec<u32>) -> CounterSources {
    let fs = ProcFs::from_config(config);
    CounterSources {
        threads: Box::new(ThreadCollector::new(fs.clone()).with_pid_filter(pid_filter)),
        interfaces: Box::new(
            NetworkCollector::new(fs.clone()).with_vm_annotation(config.annotate_vms),
        ),
        disks: Box::new(DiskCollector::new(fs.clone(), config.skip_disks.clone())),
        cpu: Box::new(CpuCollector::new(fs.clone())),
        system: Box::new(SystemCollector::new(fs)),
    }
}
