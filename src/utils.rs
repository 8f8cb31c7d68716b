/*!
 * Utility functions for HashWatch
 */

use std::path::Path;
use std::time::SystemTime;

use walkdir::WalkDir;

use crate::baseline::{BASELINE_FILE_NAME, BASELINE_TMP_FILE_NAME};

/// Count regular files under `dir` for progress tracking
pub fn count_files(dir: &Path) -> u64 {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && !is_baseline_file(entry.path()))
        .count() as u64
}

/// Whether a path names a baseline document or its in-progress copy
pub fn is_baseline_file(path: &Path) -> bool {
    path.file_name().map_or(false, |name| {
        name == BASELINE_FILE_NAME || name == BASELINE_TMP_FILE_NAME
    })
}

/// Seconds since the Unix epoch, negative for earlier instants
pub fn system_time_to_secs(time: SystemTime) -> f64 {
    match time.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(after) => after.as_secs_f64(),
        Err(before) => -before.duration().as_secs_f64(),
    }
}

/// Format a human-readable file size
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
