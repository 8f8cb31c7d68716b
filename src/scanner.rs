/*!
 * Directory scanning and file hashing
 */

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::ProgressBar;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{HashWatchError, Result};
use crate::platform;
use crate::types::{ContentHash, FileRecord, Snapshot};
use crate::utils::is_baseline_file;

/// Size of the read buffer used while hashing
const HASH_CHUNK_SIZE: usize = 4096;

/// Scanner statistics
#[derive(Debug, Clone, Default)]
pub struct ScannerStatistics {
    /// Number of files recorded
    pub files_processed: usize,
    /// Number of files whose content could not be hashed
    pub files_unreadable: usize,
    /// Total bytes of successfully hashed files
    pub bytes_hashed: u64,
    /// Wall time of the scan
    pub duration: Duration,
}

/// Result of scanning one directory tree
#[derive(Debug)]
pub struct ScanOutcome {
    pub snapshot: Snapshot,
    /// Per-file problems that degraded a record or skipped an entry
    pub issues: Vec<HashWatchError>,
    pub statistics: ScannerStatistics,
}

/// Builds snapshots of a directory tree
pub struct Scanner {
    /// Scanner configuration
    config: Config,
    /// Progress bar
    pub progress: Arc<ProgressBar>,
}

impl Scanner {
    /// Create a new scanner
    pub fn new(config: Config, progress: Arc<ProgressBar>) -> Self {
        Self { config, progress }
    }

    /// Scanner without visible progress output
    pub fn hidden(config: Config) -> Self {
        Self::new(config, Arc::new(ProgressBar::hidden()))
    }

    /// Scan the target directory and return its snapshot
    pub fn scan(&self) -> Result<ScanOutcome> {
        let root = &self.config.target_dir;
        if !root.is_dir() {
            return Err(HashWatchError::DirectoryNotFound(root.clone()));
        }

        let start = Instant::now();
        let mut issues = Vec::new();
        let mut files: Vec<(PathBuf, String)> = Vec::new();

        for entry in WalkDir::new(root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    issues.push(HashWatchError::Walk(e.to_string()));
                    continue;
                }
            };

            if !entry.file_type().is_file() || is_baseline_file(entry.path()) {
                continue;
            }

            let rel_path = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let rel_path = match rel_path.to_str() {
                Some(rel_path) => rel_path.to_string(),
                None => {
                    warn!("Skipping path that is not valid UTF-8: {}", entry.path().display());
                    issues.push(HashWatchError::NonUtf8Path(entry.into_path()));
                    continue;
                }
            };
            files.push((entry.into_path(), rel_path));
        }

        debug!(root = %root.display(), files = files.len(), "walk complete");

        // Hash files in parallel
        let results: Vec<(FileRecord, Vec<HashWatchError>)> = files
            .par_iter()
            .map(|(abs_path, rel_path)| self.process_file(abs_path, rel_path))
            .collect();

        let mut statistics = ScannerStatistics::default();
        let mut records = Vec::with_capacity(results.len());
        for (record, file_issues) in results {
            statistics.files_processed += 1;
            match record.hash {
                Some(_) => statistics.bytes_hashed += record.size,
                None => statistics.files_unreadable += 1,
            }
            issues.extend(file_issues);
            records.push(record);
        }
        statistics.duration = start.elapsed();

        Ok(ScanOutcome {
            snapshot: Snapshot::from_records(records),
            issues,
            statistics,
        })
    }

    /// Record a single file, degrading fields that cannot be read
    fn process_file(&self, abs_path: &Path, rel_path: &str) -> (FileRecord, Vec<HashWatchError>) {
        self.progress.inc(1);
        self.progress.set_message(format!("Hashing: {}", rel_path));

        let mut issues = Vec::new();

        let metadata = match fs::metadata(abs_path) {
            Ok(metadata) => Some(metadata),
            Err(source) => {
                warn!("Error reading metadata of {}: {}", abs_path.display(), source);
                issues.push(HashWatchError::Stat {
                    path: abs_path.to_path_buf(),
                    source,
                });
                None
            }
        };

        let hash = match hash_file(abs_path) {
            Ok(hash) => Some(hash),
            Err(source) => {
                warn!("Error hashing file {}: {}", abs_path.display(), source);
                issues.push(HashWatchError::FileRead {
                    path: abs_path.to_path_buf(),
                    source,
                });
                None
            }
        };

        let record = FileRecord {
            hash,
            size: metadata.as_ref().map_or(0, |m| m.len()),
            modified_time: metadata.as_ref().map_or(0.0, platform::modified_time),
            creation_time: metadata.as_ref().map_or(0.0, platform::creation_time),
            path: rel_path.to_string(),
            file_id: metadata
                .as_ref()
                .and_then(|m| platform::file_id(abs_path, m)),
        };

        (record, issues)
    }
}

/// SHA-256 of a file's content, read in fixed-size chunks
pub fn hash_file(path: &Path) -> io::Result<ContentHash> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; HASH_CHUNK_SIZE];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(ContentHash::from_bytes(hasher.finalize().into()))
}
