//! Interactive session state.
//!
//! One [`Session`] exists per run. The input controller is its only
//! writer; the view, renderer and main loop read it by reference.

use crate::config::{interval_from_secs, Config};
use crate::sort::{DiskColumn, NetColumn, ProcessColumn, SortState};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest filter text, in characters.
pub const FILTER_CAPACITY: usize = 63;

/// Longest numeric entry (limit, refresh), in characters.
pub const NUMERIC_CAPACITY: usize = 15;

/// Shortest refresh interval accepted from the keyboard.
pub const MIN_REFRESH: Duration = Duration::from_millis(100);

/// Active resource view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Processes (optionally with threads).
    #[default]
    Process,
    /// Network interfaces.
    Network,
    /// Block devices.
    Storage,
}

impl ViewMode {
    /// Title shown in the header.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Process => "Processes",
            Self::Network => "Network",
            Self::Storage => "Storage",
        }
    }
}

/// Modal input state.
///
/// The entry variants own the buffer being typed. Filter text is edited in
/// place on the session so the table narrows while typing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Single-key commands.
    #[default]
    Normal,
    /// Typing a filter.
    FilterEntry,
    /// Typing a row limit.
    LimitEntry(String),
    /// Typing a refresh interval in seconds.
    RefreshEntry(String),
    /// Help screen shown; any key returns to normal.
    Help,
}

impl InputMode {
    /// Returns true outside of normal mode.
    #[must_use]
    pub fn is_modal(&self) -> bool {
        !matches!(self, Self::Normal)
    }
}

/// Session state shared by input, view, renderer and main loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Active view.
    pub view: ViewMode,
    /// Thread rows under each process.
    pub tree: bool,
    /// Sampling paused.
    pub frozen: bool,
    /// Maximum visible rows.
    pub limit: usize,
    /// Sampling interval.
    pub interval: Duration,
    /// Case-insensitive substring filter.
    pub filter: String,
    /// Modal input state.
    pub input: InputMode,
    /// Process view sort.
    pub process_sort: SortState<ProcessColumn>,
    /// Network view sort.
    pub network_sort: SortState<NetColumn>,
    /// Storage view sort.
    pub disk_sort: SortState<DiskColumn>,
    /// Set when the loop must exit.
    pub should_quit: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Session {
    /// Creates a session from configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            view: config.view,
            tree: config.tree,
            frozen: false,
            limit: config.display_limit.max(1),
            interval: config.interval(),
            filter: String::new(),
            input: InputMode::Normal,
            process_sort: SortState::default(),
            network_sort: SortState::default(),
            disk_sort: SortState::default(),
            should_quit: false,
        }
    }

    /// Signals that the loop should exit.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Toggles sampling pause.
    pub fn toggle_freeze(&mut self) {
        self.frozen = !self.frozen;
    }

    /// Toggles thread rows and shows the process view.
    pub fn toggle_tree(&mut self) {
        self.tree = !self.tree;
        self.view = ViewMode::Process;
    }

    /// Returns true while the help screen is up.
    #[must_use]
    pub fn showing_help(&self) -> bool {
        self.input == InputMode::Help
    }

    /// Sets the row limit; zero is ignored.
    pub fn set_limit(&mut self, limit: usize) -> bool {
        if limit == 0 {
            return false;
        }
        self.limit = limit;
        true
    }

    /// Sets the interval in seconds; values under the minimum are ignored.
    pub fn set_interval_secs(&mut self, secs: f64) -> bool {
        match interval_from_secs(secs) {
            Some(interval) if interval >= MIN_REFRESH => {
                self.interval = interval;
                true
            }
            _ => false,
        }
    }
}
