/*!
 * Core types and data structures for HashWatch
 */

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumIter};

use crate::error::HashWatchError;

/// SHA-256 digest of a file's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for ContentHash {
    type Err = HashWatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| HashWatchError::InvalidBaseline(format!("bad hash {:?}: {}", s, e)))?;
        Ok(Self(bytes))
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Platform identifier of a physical file object.
///
/// Device and inode on Unix, volume serial number and file index on Windows.
/// Only meaningful within one host, and may be recycled once the file is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId {
    pub device: u64,
    pub index: u64,
}

impl FileId {
    pub fn new(device: u64, index: u64) -> Self {
        Self { device, index }
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.device, self.index)
    }
}

impl FromStr for FileId {
    type Err = HashWatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = || -> Option<FileId> {
            let (device, index) = s.split_once(':')?;
            Some(FileId::new(device.parse().ok()?, index.parse().ok()?))
        };
        parse().ok_or_else(|| HashWatchError::InvalidBaseline(format!("bad file id {:?}", s)))
    }
}

impl Serialize for FileId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FileId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Metadata of one file at scan time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Content hash, `None` when the file could not be read
    pub hash: Option<ContentHash>,
    /// Size in bytes
    pub size: u64,
    /// Last modification time, seconds since the Unix epoch
    pub modified_time: f64,
    /// Creation time (status change time on Unix), seconds since the Unix epoch
    pub creation_time: f64,
    /// Path relative to the monitored root
    pub path: String,
    /// Platform file identifier
    #[serde(rename = "inode")]
    pub file_id: Option<FileId>,
}

impl FileRecord {
    /// Content could not be hashed, so the record can only be compared by path
    pub fn is_degraded(&self) -> bool {
        self.hash.is_none()
    }
}

/// Metadata capture of a directory tree, keyed and ordered by relative path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    records: BTreeMap<String, FileRecord>,
}

impl Snapshot {
    /// Build a snapshot from records; a later record replaces an earlier one
    /// with the same path
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = FileRecord>,
    {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.path.clone(), record))
                .collect(),
        }
    }

    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.records.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.records.contains_key(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileRecord)> {
        self.records.iter().map(|(path, record)| (path.as_str(), record))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of all recorded file sizes
    pub fn total_size(&self) -> u64 {
        self.records.values().map(|r| r.size).sum()
    }
}

/// Category of a detected change, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ChangeKind {
    #[strum(serialize = "New files")]
    New,
    #[strum(serialize = "Modified files")]
    Modified,
    #[strum(serialize = "Moved files")]
    Moved,
    #[strum(serialize = "Copied files")]
    Copied,
    #[strum(serialize = "Deleted files")]
    Deleted,
}

impl ChangeKind {
    /// Marker printed in front of each reported entry
    pub fn marker(&self) -> char {
        match self {
            Self::New => '+',
            Self::Modified => '~',
            Self::Moved => '>',
            Self::Copied => 'c',
            Self::Deleted => '-',
        }
    }
}

/// A path that moved: same physical file, different path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Moved {
    pub from: String,
    pub to: String,
}

/// A path that appeared with the content of an existing baseline file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Copied {
    pub source: String,
    pub copy: String,
}

/// Differences between a baseline and a current snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Classification {
    pub new_files: Vec<String>,
    pub modified_files: Vec<String>,
    pub moved_files: Vec<Moved>,
    pub copied_files: Vec<Copied>,
    pub deleted_files: Vec<String>,
    /// Paths that could only be compared by path: unhashed current files
    /// and vanished baseline files with neither hash nor file id
    pub degraded: Vec<String>,
}

impl Classification {
    /// True when none of the five change categories has an entry
    pub fn is_empty(&self) -> bool {
        self.change_count() == 0
    }

    pub fn change_count(&self) -> usize {
        self.new_files.len()
            + self.modified_files.len()
            + self.moved_files.len()
            + self.copied_files.len()
            + self.deleted_files.len()
    }

    /// Report lines for one category, without marker
    pub fn entries(&self, kind: ChangeKind) -> Vec<String> {
        match kind {
            ChangeKind::New => self.new_files.clone(),
            ChangeKind::Modified => self.modified_files.clone(),
            ChangeKind::Moved => self
                .moved_files
                .iter()
                .map(|m| format!("{} -> {}", m.from, m.to))
                .collect(),
            ChangeKind::Copied => self
                .copied_files
                .iter()
                .map(|c| format!("{} -> {}", c.source, c.copy))
                .collect(),
            ChangeKind::Deleted => self.deleted_files.clone(),
        }
    }
}
