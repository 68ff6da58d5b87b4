//! Visible rows: filter, then sort, then truncate to the display limit.

use crate::aggregate::ProcessRow;
use crate::session::Session;
use crate::types::{DiskSample, NetIface, ThreadSample};

/// Case-insensitive substring test.
///
/// `needle_lower` must already be lower-cased with [`str::to_lowercase`];
/// the haystack is folded the same way. ASCII haystacks are compared
/// byte-wise without allocating.
#[must_use]
pub fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    if needle_lower.is_empty() {
        return true;
    }
    if !haystack.is_ascii() {
        return haystack.to_lowercase().contains(needle_lower);
    }
    let (hay, needle) = (haystack.as_bytes(), needle_lower.as_bytes());
    if hay.len() < needle.len() {
        return false;
    }
    hay.windows(needle.len())
        .any(|window| window.iter().zip(needle).all(|(h, n)| h.to_ascii_lowercase() == *n))
}

fn matches_process(row: &ProcessRow, needle: &str) -> bool {
    contains_ignore_case(&row.command, needle)
        || contains_ignore_case(&row.user, needle)
        || contains_ignore_case(&row.pid.to_string(), needle)
}

fn matches_interface(iface: &NetIface, needle: &str) -> bool {
    if contains_ignore_case(&iface.name, needle) || contains_ignore_case(&iface.operstate, needle)
    {
        return true;
    }
    iface.vm.as_ref().is_some_and(|vm| {
        contains_ignore_case(&vm.name, needle)
            || vm.id.is_some_and(|id| contains_ignore_case(&id.to_string(), needle))
    })
}

/// Process rows to display for the current session.
#[must_use]
pub fn visible_processes<'a>(rows: &'a [ProcessRow], session: &Session) -> Vec<&'a ProcessRow> {
    let needle = session.filter.to_lowercase();
    let mut out: Vec<&ProcessRow> = rows.iter().filter(|r| matches_process(r, &needle)).collect();
    session.process_sort.sort(&mut out);
    out.truncate(session.limit);
    out
}

/// Interfaces to display; names starting with any of `skip` are hidden.
#[must_use]
pub fn visible_interfaces<'a>(
    interfaces: &'a [NetIface],
    session: &Session,
    skip: &[String],
) -> Vec<&'a NetIface> {
    let needle = session.filter.to_lowercase();
    let mut out: Vec<&NetIface> = interfaces
        .iter()
        .filter(|i| !skip.iter().any(|prefix| i.name.starts_with(prefix.as_str())))
        .filter(|i| matches_interface(i, &needle))
        .collect();
    session.network_sort.sort(&mut out);
    out.truncate(session.limit);
    out
}

/// Block devices to display.
#[must_use]
pub fn visible_disks<'a>(disks: &'a [DiskSample], session: &Session) -> Vec<&'a DiskSample> {
    let needle = session.filter.to_lowercase();
    let mut out: Vec<&DiskSample> =
        disks.iter().filter(|d| contains_ignore_case(&d.name, &needle)).collect();
    session.disk_sort.sort(&mut out);
    out.truncate(session.limit);
    out
}

/// Worker threads of `pid`, by thread id; the main thread is the process
/// row itself and is left out.
#[must_use]
pub fn threads_of(threads: &[ThreadSample], pid: u32) -> Vec<&ThreadSample> {
    let mut out: Vec<&ThreadSample> =
        threads.iter().filter(|t| t.tgid == pid && !t.is_main_thread()).collect();
    out.sort_by_key(|t| t.tid);
    out
}
