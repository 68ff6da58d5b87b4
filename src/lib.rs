//! # kvmtop
//!
//! Live terminal dashboard for virtualization hosts.
//!
//! Every interval kvmtop samples cumulative counters from procfs, diffs
//! them against the previous sample and shows per-second rates in one of
//! three views:
//!
//! - **Process**: per-thread CPU, I/O, fault and memory rates aggregated
//!   by process, with an optional per-thread tree
//! - **Network**: per-interface throughput, packet and error rates,
//!   annotated with the VM that owns each tap device
//! - **Storage**: per-block-device IOPS, throughput, latency and
//!   utilisation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kvmtop::collectors::procfs_sources;
//! use kvmtop::{App, Config};
//!
//! let config = Config::default();
//! let sources = procfs_sources(&config, Vec::new());
//! let mut app = App::new(config, sources);
//!
//! app.capture_baseline()?;
//! std::thread::sleep(std::time::Duration::from_secs(1));
//! app.sample()?;
//!
//! for row in app.processes() {
//!     println!("{} {} {:.2}%", row.tgid, row.command, row.rates.cpu_pct);
//! }
//! ```
//!
//! ## Layout
//!
//! - [`collectors`]: procfs and sysfs readers producing raw counters
//! - [`snapshot`] and [`rates`]: the two-slot store and delta math
//! - [`aggregate`], [`sort`] and [`view`]: per-process rows, ordering and
//!   filtering
//! - [`session`] and [`input`]: interactive state and the key map
//! - [`render`], [`theme`] and [`terminal`]: drawing and terminal ownership
//! - [`app`]: the sampling and input loop

#![warn(missing_docs)]
// Allow unwrap() in tests only - banned in production code
#![cfg_attr(test, allow(clippy::unwrap_used))]
// Counter math converts between integer counters and f64 rates
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Ambient Modules
// ============================================================================

/// Error types for sampling, configuration and terminal operations.
pub mod error;

/// Leveled debug logging to stderr or a file.
pub mod debug;

/// YAML configuration with defaults.
pub mod config;

// ============================================================================
// Sampling Modules
// ============================================================================

/// Entity traits and sample records.
pub mod types;

/// procfs and sysfs counter sources.
pub mod collectors;

/// Two-slot snapshot store.
pub mod snapshot;

/// Counter deltas and per-second rates.
pub mod rates;

/// Per-process aggregation of thread rows.
pub mod aggregate;

// ============================================================================
// Presentation Modules
// ============================================================================

/// Sort columns and direction toggling.
pub mod sort;

/// Interactive session state.
pub mod session;

/// Key handling.
pub mod input;

/// Filtering, sorting and limiting of visible rows.
pub mod view;

/// Threshold colors.
pub mod theme;

/// Frame layout and tables.
pub mod render;

/// Terminal guard and event source.
pub mod terminal;

/// Main loop.
pub mod app;

// ============================================================================
// Re-exports
// ============================================================================

pub use app::App;
pub use config::Config;
pub use error::{KvmtopError, Result};
pub use session::{Session, ViewMode};
pub use types::*;
