//! Configuration for kvmtop.
//!
//! Supports YAML configuration with precedence: CLI > file > defaults.

use crate::error::{KvmtopError, Result};
use crate::session::ViewMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Refresh interval in seconds.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: f64,

    /// Maximum number of rows shown per view.
    #[serde(default = "default_display_limit")]
    pub display_limit: usize,

    /// Threshold coloring.
    #[serde(default = "default_color")]
    pub color: bool,

    /// Start with the thread tree expanded.
    #[serde(default)]
    pub tree: bool,

    /// View shown at startup.
    #[serde(default)]
    pub view: ViewMode,

    /// Interface name prefixes hidden from the network view.
    #[serde(default = "default_skip_interfaces")]
    pub skip_interfaces: Vec<String>,

    /// Tag tap interfaces with the VM that owns them.
    #[serde(default = "default_annotate_vms")]
    pub annotate_vms: bool,

    /// Block device name prefixes that are never captured.
    #[serde(default = "default_skip_disks")]
    pub skip_disks: Vec<String>,

    /// Mount point of procfs.
    #[serde(default = "default_proc_root")]
    pub proc_root: PathBuf,

    /// Mount point of sysfs.
    #[serde(default = "default_sys_root")]
    pub sys_root: PathBuf,
}

fn default_interval_secs() -> f64 {
    5.0
}
fn default_display_limit() -> usize {
    50
}
fn default_color() -> bool {
    true
}
fn default_skip_interfaces() -> Vec<String> {
    vec!["lo".to_string(), "fw".to_string()]
}
fn default_annotate_vms() -> bool {
    true
}
fn default_skip_disks() -> Vec<String> {
    vec!["loop".to_string(), "ram".to_string()]
}
fn default_proc_root() -> PathBuf {
    PathBuf::from("/proc")
}
fn default_sys_root() -> PathBuf {
    PathBuf::from("/sys")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            display_limit: default_display_limit(),
            color: default_color(),
            tree: false,
            view: ViewMode::default(),
            skip_interfaces: default_skip_interfaces(),
            annotate_vms: default_annotate_vms(),
            skip_disks: default_skip_disks(),
            proc_root: default_proc_root(),
            sys_root: default_sys_root(),
        }
    }
}

/// Converts an interval in seconds to a non-zero [`Duration`].
///
/// Returns `None` for values that are not positive, not finite, too large
/// for a `Duration` or below one nanosecond.
#[must_use]
pub fn interval_from_secs(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs).ok().filter(|d| !d.is_zero())
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location: `<config dir>/kvmtop/config.yaml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("kvmtop").join("config.yaml"))
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .map_err(|_| KvmtopError::ConfigNotFound(path.display().to_string()))?;

        Self::parse(&content)
    }

    /// Parses and validates configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error with line number if parsing fails, or
    /// `ConfigInvalid` if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| {
            let line = e.location().map_or(0, |l| l.line());
            KvmtopError::ConfigParse { line, message: e.to_string() }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` for an interval that is not a usable
    /// positive duration or a zero limit.
    pub fn validate(&self) -> Result<()> {
        if interval_from_secs(self.interval_secs).is_none() {
            return Err(KvmtopError::ConfigInvalid {
                key: "interval_secs".to_string(),
                message: format!("must be a positive duration, got {}", self.interval_secs),
            });
        }
        if self.display_limit == 0 {
            return Err(KvmtopError::ConfigInvalid {
                key: "display_limit".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Loads the file at `explicit`, or the default location if it exists.
    ///
    /// A missing default file yields defaults; a missing explicit file is
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen file is unreadable or invalid.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load(path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Returns the refresh interval as a Duration.
    ///
    /// Only an unvalidated config can hold an unusable value; it falls
    /// back to the default.
    #[must_use]
    pub fn interval(&self) -> Duration {
        interval_from_secs(self.interval_secs)
            .unwrap_or_else(|| Duration::from_secs_f64(default_interval_secs()))
    }
}
