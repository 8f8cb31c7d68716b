//! Global error handling for hashwatch
//!
//! Directory- and baseline-level variants abort the current operation.
//! Per-file variants (`FileRead`, `Stat`, `Walk`, `NonUtf8Path`) are collected by the
//! scanner as issues and never abort a scan.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Global error type for hashwatch operations
#[derive(Error, Debug)]
pub enum HashWatchError {
    /// Monitored root does not exist or is not a directory
    #[error("Directory does not exist: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// No baseline has been recorded for the monitored root
    #[error("No baseline found at {}", .0.display())]
    BaselineNotFound(PathBuf),

    /// Reading file content for hashing failed
    #[error("Error hashing file {}: {}", path.display(), source)]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading file metadata failed
    #[error("Error reading metadata of {}: {}", path.display(), source)]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Directory walk error (unreadable directory, broken entry)
    #[error("Walk error: {0}")]
    Walk(String),

    /// Path under the root that is not valid UTF-8 and cannot be keyed
    #[error("Skipping path that is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    /// Baseline document is readable JSON but inconsistent
    #[error("Invalid baseline: {0}")]
    InvalidBaseline(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON processing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Specialized Result type for hashwatch operations
pub type Result<T> = std::result::Result<T, HashWatchError>;

/// Creates a HashWatchError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::HashWatchError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}
