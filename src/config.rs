/*!
 * Configuration handling for HashWatch
 */

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::baseline::BASELINE_FILE_NAME;
use crate::ensure;
use crate::error::{HashWatchError, Result};
use crate::report::ReportFormat;

/// Default pause between two monitor iterations
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Command-line arguments for HashWatch
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "hashwatch",
    version = env!("CARGO_PKG_VERSION"),
    about = "Detect new, modified, moved, copied and deleted files",
    long_about = "Records a baseline of file hashes, sizes, timestamps and file identifiers for a directory tree, then reports every file that was added, modified, moved, copied or deleted since."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Command,

    /// Number of threads to use for hashing
    #[clap(long, global = true, default_value = "4")]
    pub threads: usize,

    /// Log level for diagnostics written to stderr
    #[clap(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Hide the progress bar
    #[clap(long, global = true)]
    pub no_progress: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Record a new baseline for a directory
    Create {
        /// Directory to record
        directory: PathBuf,
    },
    /// Compare a directory against its baseline once
    Check {
        /// Directory to check
        directory: PathBuf,

        /// Print the result as JSON
        #[clap(long)]
        json: bool,
    },
    /// Compare a directory against its baseline repeatedly
    Monitor {
        /// Directory to monitor
        directory: PathBuf,

        /// Seconds between two checks
        #[clap(default_value_t = DEFAULT_INTERVAL_SECS)]
        interval_seconds: u64,
    },
}

impl Command {
    pub fn directory(&self) -> &PathBuf {
        match self {
            Self::Create { directory }
            | Self::Check { directory, .. }
            | Self::Monitor { directory, .. } => directory,
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Monitored root directory
    pub target_dir: PathBuf,

    /// Baseline document location
    pub baseline_file: PathBuf,

    /// Number of threads to use for hashing
    pub num_threads: usize,

    /// Pause between monitor iterations
    pub interval: Duration,

    /// Whether to draw a progress bar while scanning
    pub show_progress: bool,

    /// Output format of change reports
    pub report_format: ReportFormat,
}

impl Config {
    /// Configuration for a root directory with defaults for everything else
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        let target_dir = absolute(target_dir.into());
        Self {
            baseline_file: target_dir.join(BASELINE_FILE_NAME),
            target_dir,
            num_threads: 4,
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            show_progress: false,
            report_format: ReportFormat::Console,
        }
    }

    /// Create configuration from command-line arguments
    pub fn from_cli(cli: &Cli) -> Self {
        let mut config = Self::new(cli.command.directory().clone());
        config.num_threads = cli.threads;
        config.show_progress = !cli.no_progress;

        match &cli.command {
            Command::Check { json: true, .. } => config.report_format = ReportFormat::Json,
            Command::Monitor {
                interval_seconds, ..
            } => {
                config.interval = Duration::from_secs(*interval_seconds);
                config.show_progress = false;
            }
            _ => {}
        }

        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.target_dir.is_dir() {
            return Err(HashWatchError::DirectoryNotFound(self.target_dir.clone()));
        }
        ensure!(
            self.num_threads > 0,
            InvalidArgument,
            "thread count must be at least 1"
        );
        ensure!(
            !self.interval.is_zero(),
            InvalidArgument,
            "monitor interval must be at least 1 second"
        );
        Ok(())
    }
}

fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(&path))
        .unwrap_or(path)
}
