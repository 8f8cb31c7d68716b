/*!
 * HashWatch - detect changes to a directory tree against a recorded baseline
 *
 * A baseline snapshot stores the content hash, size, timestamps and platform
 * file identifier of every file under a root. Comparing it with a fresh
 * snapshot classifies each difference as a new, modified, moved, copied or
 * deleted file.
 */

pub mod baseline;
pub mod classifier;
pub mod config;
pub mod error;
pub mod monitor;
pub mod platform;
pub mod report;
pub mod scanner;
pub mod types;
pub mod utils;


// Re-export main components for easier access
pub use baseline::{BaselineStore, BASELINE_FILE_NAME};
pub use classifier::classify;
pub use config::Config;
pub use error::{HashWatchError, Result};
pub use monitor::{Monitor, StopHandle, Tick};
pub use report::{BaselineReport, ReportFormat, Reporter};
pub use scanner::{ScanOutcome, Scanner, ScannerStatistics};
pub use types::{ChangeKind, Classification, ContentHash, Copied, FileId, FileRecord, Moved, Snapshot};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
