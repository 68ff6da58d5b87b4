//! Access to procfs and sysfs under configurable mount points.
//!
//! Every collector reads through a [`ProcFs`] so tests can point it at a
//! fake tree built with `tempfile`.

use crate::config::Config;
use std::io;
use std::path::{Path, PathBuf};

/// Scheduler ticks per second when `sysconf` is unavailable.
pub const DEFAULT_CLOCK_TICKS: u64 = 100;

/// Page size in bytes when `sysconf` is unavailable.
pub const DEFAULT_PAGE_SIZE: u64 = 4096;

/// Roots of the proc and sys filesystems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcFs {
    proc_root: PathBuf,
    sys_root: PathBuf,
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new("/proc", "/sys")
    }
}

impl ProcFs {
    /// Creates a reader rooted at the given mount points.
    pub fn new(proc_root: impl Into<PathBuf>, sys_root: impl Into<PathBuf>) -> Self {
        Self { proc_root: proc_root.into(), sys_root: sys_root.into() }
    }

    /// Creates a reader from the configured roots.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.proc_root, &config.sys_root)
    }

    /// Returns the procfs root.
    #[must_use]
    pub fn proc_root(&self) -> &Path {
        &self.proc_root
    }

    /// Joins a path relative to the procfs root.
    pub fn proc_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.proc_root.join(relative)
    }

    /// Joins a path relative to the sysfs root.
    pub fn sys_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.sys_root.join(relative)
    }

    /// Reads a procfs file as text; `None` if it is missing or unreadable.
    pub fn read_proc(&self, relative: impl AsRef<Path>) -> Option<String> {
        std::fs::read_to_string(self.proc_path(relative)).ok()
    }

    /// Reads a procfs file as raw bytes.
    pub fn read_proc_bytes(&self, relative: impl AsRef<Path>) -> Option<Vec<u8>> {
        std::fs::read(self.proc_path(relative)).ok()
    }

    /// Reads a sysfs file as trimmed text.
    pub fn read_sys(&self, relative: impl AsRef<Path>) -> Option<String> {
        std::fs::read_to_string(self.sys_path(relative)).ok().map(|s| s.trim().to_string())
    }

    /// Lists the numeric entries of a procfs directory (pids or tids).
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the directory itself cannot be opened.
    pub fn numeric_entries(&self, relative: impl AsRef<Path>) -> io::Result<Vec<u32>> {
        let dir = std::fs::read_dir(self.proc_path(relative))?;
        Ok(dir
            .flatten()
            .filter_map(|entry| entry.file_name().to_str().and_then(|s| s.parse::<u32>().ok()))
            .collect())
    }

    /// Owner uid of a procfs entry.
    #[cfg(unix)]
    pub fn owner_uid(&self, relative: impl AsRef<Path>) -> Option<u32> {
        use std::os::unix::fs::MetadataExt;
        std::fs::metadata(self.proc_path(relative)).ok().map(|m| m.uid())
    }

    /// Owner uid of a procfs entry.
    #[cfg(not(unix))]
    pub fn owner_uid(&self, _relative: impl AsRef<Path>) -> Option<u32> {
        None
    }

    /// Returns true if the procfs root looks mounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.proc_root.join("stat").exists()
    }
}

/// Scheduler ticks per second (`_SC_CLK_TCK`).
#[cfg(target_os = "linux")]
#[allow(unsafe_code)]
#[must_use]
pub fn clock_ticks_per_second() -> u64 {
    // SAFETY: sysconf has no preconditions and only reads a constant.
    let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    u64::try_from(ticks).ok().filter(|&t| t > 0).unwrap_or(DEFAULT_CLOCK_TICKS)
}

/// Scheduler ticks per second (`_SC_CLK_TCK`).
#[cfg(not(target_os = "linux"))]
#[must_use]
pub fn clock_ticks_per_second() -> u64 {
    DEFAULT_CLOCK_TICKS
}

/// Memory page size in bytes.
#[cfg(target_os = "linux")]
#[allow(unsafe_code)]
#[must_use]
pub fn page_size() -> u64 {
    // SAFETY: sysconf has no preconditions and only reads a constant.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    u64::try_from(size).ok().filter(|&s| s > 0).unwrap_or(DEFAULT_PAGE_SIZE)
}

/// Memory page size in bytes.
#[cfg(not(target_os = "linux"))]
#[must_use]
pub fn page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

/// Effective uid of this process.
#[cfg(target_os = "linux")]
#[allow(unsafe_code)]
#[must_use]
pub fn effective_uid() -> Option<u32> {
    // SAFETY: geteuid cannot fail and touches no memory we own.
    Some(unsafe { libc::geteuid() })
}

/// Effective uid of this process.
#[cfg(not(target_os = "linux"))]
#[must_use]
pub fn effective_uid() -> Option<u32> {
    None
}
