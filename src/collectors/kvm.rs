//! Best-effort VM ownership of network interfaces.
//!
//! Scans process command lines that mention `kvm` or `qemu` for `-id`,
//! `-name` and every `ifname=` argument, then tags the matching
//! interfaces. Nothing here affects counters or rates.

use crate::collectors::process::sanitize_command;
use crate::collectors::procfs::ProcFs;
use crate::types::{NetIface, VmInfo};

/// What a hypervisor command line says about its VM.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VmCommand {
    /// Numeric id from `-id <n>`.
    pub id: Option<u32>,
    /// Name from `-name <name>[,opts]`.
    pub name: String,
    /// Interfaces from every `ifname=<iface>`.
    pub interfaces: Vec<String>,
}

/// Value after `flag` up to the next space or comma.
fn option_value<'a>(cmdline: &'a str, flag: &str) -> Option<&'a str> {
    let start = cmdline.find(flag)? + flag.len();
    let rest = &cmdline[start..];
    let end = rest.find(|c: char| c == ' ' || c == ',').unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Parses a space-separated hypervisor command line.
///
/// Returns `None` for command lines that are not `kvm`/`qemu`.
#[must_use]
pub fn parse_vm_cmdline(cmdline: &str) -> Option<VmCommand> {
    if !cmdline.contains("kvm") && !cmdline.contains("qemu") {
        return None;
    }

    let id = option_value(cmdline, " -id ").and_then(|s| s.parse::<u32>().ok());
    let name = option_value(cmdline, " -name ").unwrap_or_default().to_string();
    let interfaces = cmdline
        .match_indices("ifname=")
        .filter_map(|(pos, key)| {
            let rest = &cmdline[pos + key.len()..];
            let end = rest.find(|c: char| c == ' ' || c == ',').unwrap_or(rest.len());
            let iface = &rest[..end];
            (!iface.is_empty()).then(|| iface.to_string())
        })
        .collect();

    Some(VmCommand { id, name, interfaces })
}

/// Tags interfaces owned by a running VM.
pub fn annotate(fs: &ProcFs, interfaces: &mut [NetIface]) {
    let Ok(pids) = fs.numeric_entries("") else {
        return;
    };

    for pid in pids {
        let Some(raw) = fs.read_proc_bytes(format!("{pid}/cmdline")) else {
            continue;
        };
        let Some(vm) = parse_vm_cmdline(&sanitize_command(&raw)) else {
            continue;
        };
        for iface in interfaces.iter_mut().filter(|i| vm.interfaces.contains(&i.name)) {
            iface.vm = Some(VmInfo { id: vm.id, name: vm.name.clone() });
        }
    }
}
