/*!
 * Platform-specific file metadata
 */

use std::fs::Metadata;
use std::path::Path;
use std::time::SystemTime;

use crate::types::FileId;
use crate::utils::system_time_to_secs;

/// Query the platform identifier of a file, if the platform exposes one
#[cfg(unix)]
pub fn file_id(_path: &Path, metadata: &Metadata) -> Option<FileId> {
    use std::os::unix::fs::MetadataExt;
    Some(FileId::new(metadata.dev(), metadata.ino()))
}

#[cfg(windows)]
pub fn file_id(path: &Path, _metadata: &Metadata) -> Option<FileId> {
    use winapi_util::{file::information, Handle};

    let info = Handle::from_path_any(path)
        .and_then(|ref handle| information(handle))
        .ok()?;
    Some(FileId::new(info.volume_serial_number(), info.file_index()))
}

#[cfg(not(any(unix, windows)))]
pub fn file_id(_path: &Path, _metadata: &Metadata) -> Option<FileId> {
    None
}

/// Status change time on Unix, creation time elsewhere
#[cfg(unix)]
pub fn creation_time(metadata: &Metadata) -> f64 {
    use std::os::unix::fs::MetadataExt;
    metadata.ctime() as f64 + metadata.ctime_nsec() as f64 / 1e9
}

#[cfg(not(unix))]
pub fn creation_time(metadata: &Metadata) -> f64 {
    metadata
        .created()
        .map(system_time_to_secs)
        .unwrap_or_default()
}

/// Last-write time in seconds since the epoch
pub fn modified_time(metadata: &Metadata) -> f64 {
    metadata
        .modified()
        .map(system_time_to_secs)
        .unwrap_or_else(|_| system_time_to_secs(SystemTime::UNIX_EPOCH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    #[cfg(unix)]
    fn test_file_id_survives_rename() {
        let dir = tempdir().unwrap();
        let before = dir.path().join("a.txt");
        let after = dir.path().join("b.txt");
        fs::write(&before, b"content").unwrap();

        let id_before = file_id(&before, &fs::metadata(&before).unwrap());
        fs::rename(&before, &after).unwrap();
        let id_after = file_id(&after, &fs::metadata(&after).unwrap());

        assert!(id_before.is_some());
        assert_eq!(id_before, id_after);
    }

    #[test]
    fn test_modified_time_is_recent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, b"content").unwrap();

        let mtime = modified_time(&fs::metadata(&path).unwrap());
        let now = system_time_to_secs(SystemTime::now());
        assert!((now - mtime).abs() < 60.0);
    }
}
