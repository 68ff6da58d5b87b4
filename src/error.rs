//! Error types for kvmtop.
//!
//! Transient per-entity failures (a thread exiting between enumeration and
//! detail read, a permission-denied `io` file) never reach this type: the
//! collectors skip or zero them. What remains here is the set of failures a
//! caller can act on.

use std::io;
use thiserror::Error;

/// Error type for sampling, configuration and terminal operations.
#[derive(Debug, Error)]
pub enum KvmtopError {
    /// A counter source is not available on this system.
    #[error("collector '{0}' is not available on this system")]
    CollectorUnavailable(&'static str),

    /// A counter source could not be read at all.
    #[error("failed to collect metrics from '{collector}': {message}")]
    CollectionFailed {
        /// The collector that failed.
        collector: &'static str,
        /// Error message describing the failure.
        message: String,
    },

    /// Growing an entity collection failed.
    #[error("out of memory while growing '{collector}' snapshot to {requested} entries")]
    OutOfMemory {
        /// The collector whose snapshot could not grow.
        collector: &'static str,
        /// Number of entries requested.
        requested: usize,
    },

    /// Configuration parsing error with line number.
    #[error("configuration error at line {line}: {message}")]
    ConfigParse {
        /// Line number where the error occurred (1-indexed).
        line: usize,
        /// Error message describing the issue.
        message: String,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {0}")]
    ConfigNotFound(String),

    /// Invalid configuration value.
    #[error("invalid configuration value for '{key}': {message}")]
    ConfigInvalid {
        /// The configuration key with invalid value.
        key: String,
        /// Error message describing why the value is invalid.
        message: String,
    },

    /// Terminal initialization, input or rendering error.
    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
}

impl KvmtopError {
    /// Process exit code for this error.
    ///
    /// Allocation failure gets its own code; configuration problems share
    /// the code used for a rejected `--interval`.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::OutOfMemory { .. } => 3,
            Self::ConfigParse { .. } | Self::ConfigNotFound(_) | Self::ConfigInvalid { .. } => 2,
            _ => 1,
        }
    }
}

/// Result type alias for kvmtop operations.
pub type Result<T> = std::result::Result<T, KvmtopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parse_error_includes_line_number() {
        let err = KvmtopError::ConfigParse { line: 42, message: "invalid value".to_string() };
        let display = err.to_string();

        assert!(display.contains("42"), "Error should include line number: {}", display);
        assert!(display.contains("invalid value"), "Error should include message: {}", display);
    }

    #[test]
    fn test_collection_failed_includes_details() {
        let err = KvmtopError::CollectionFailed {
            collector: "disk",
            message: "/proc/diskstats not readable".to_string(),
        };
        let display = err.to_string();

        assert!(display.contains("disk"));
        assert!(display.contains("/proc/diskstats"));
    }

    #[test]
    fn test_out_of_memory_has_distinct_exit_code() {
        let oom = KvmtopError::OutOfMemory { collector: "process", requested: 1 << 40 };
        let others = [
            KvmtopError::CollectorUnavailable("process"),
            KvmtopError::ConfigNotFound("/nope".to_string()),
            KvmtopError::Terminal(io::Error::new(io::ErrorKind::Other, "tty")),
        ];

        for other in &others {
            assert_ne!(oom.exit_code(), other.exit_code(), "{other:?}");
            assert_ne!(other.exit_code(), 0);
        }
        assert_eq!(oom.exit_code(), 3);
    }

    #[test]
    fn test_config_errors_exit_with_two() {
        let err = KvmtopError::ConfigInvalid {
            key: "interval_secs".to_string(),
            message: "must be positive".to_string(),
        };
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("interval_secs"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: KvmtopError = io_err.into();

        assert!(matches!(err, KvmtopError::Terminal(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KvmtopError>();
    }
}
