/*!
 * Baseline persistence
 *
 * The baseline is a single pretty-printed JSON object keyed by relative path,
 * stored inside the monitored root and excluded from every scan.
 */

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::bail;
use crate::error::{HashWatchError, Result};
use crate::types::Snapshot;

/// File name of the baseline document inside the monitored root
pub const BASELINE_FILE_NAME: &str = ".baseline.json";

/// Name of the document while it is being written, excluded from scans as well
pub const BASELINE_TMP_FILE_NAME: &str = ".baseline.json.tmp";

/// Loads and saves the baseline snapshot of one root directory
#[derive(Debug, Clone)]
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    /// Store at an explicit location
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<root>/.baseline.json`
    pub fn for_root(root: &Path) -> Self {
        Self::new(root.join(BASELINE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    /// Write the snapshot, replacing any previous baseline
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let tmp_path = self.tmp_path();
        let written = write_document(&tmp_path, snapshot)
            .and_then(|()| fs::rename(&tmp_path, &self.path).map_err(HashWatchError::from));
        if let Err(e) = written {
            // No partial document may outlive a failed save
            if let Err(cleanup) = fs::remove_file(&tmp_path) {
                debug!(path = %tmp_path.display(), "temporary baseline not removed: {}", cleanup);
            }
            return Err(e);
        }

        info!(
            path = %self.path.display(),
            files = snapshot.len(),
            "baseline written"
        );
        Ok(())
    }

    /// Read the baseline, `BaselineNotFound` if none was recorded yet
    pub fn load(&self) -> Result<Snapshot> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(HashWatchError::BaselineNotFound(self.path.clone()))
            }
            Err(e) => return Err(e.into()),
        };

        let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))?;

        for (key, record) in snapshot.iter() {
            if key != record.path {
                bail!(
                    InvalidBaseline,
                    "entry {:?} records path {:?}",
                    key,
                    record.path
                );
            }
        }

        debug!(path = %self.path.display(), files = snapshot.len(), "baseline loaded");
        Ok(snapshot)
    }
}

fn write_document(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, snapshot)?;
    writer.flush()?;
    Ok(())
}
