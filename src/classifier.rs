/*!
 * Change classification between a baseline and a current snapshot
 *
 * Two passes over the data. The first indexes the current snapshot by
 * content hash and file id while deciding modified files and copies. The
 * second walks the baseline paths that disappeared and resolves each one
 * as a move (its file id lives on elsewhere), as content that still exists
 * (nothing to report), or as a deletion. The first pass must complete before
 * the second so that a copy target can never also be reported as moved or new.
 */

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::types::{Classification, ContentHash, Copied, FileId, FileRecord, Moved, Snapshot};

/// Modification times closer than this are considered equal, absorbing
/// timestamp truncation across filesystems and serialisation
pub const MTIME_TOLERANCE_SECS: f64 = 1.0;

/// Lookup tables over the current snapshot
struct CurrentIndex<'a> {
    by_content: HashMap<ContentHash, Vec<&'a str>>,
    by_id: HashMap<FileId, Vec<&'a str>>,
}

impl<'a> CurrentIndex<'a> {
    fn build(current: &'a Snapshot) -> Self {
        let mut by_content: HashMap<ContentHash, Vec<&str>> = HashMap::new();
        let mut by_id: HashMap<FileId, Vec<&str>> = HashMap::new();

        for (path, record) in current.iter() {
            if let Some(hash) = record.hash {
                by_content.entry(hash).or_default().push(path);
            }
            if let Some(id) = record.file_id {
                by_id.entry(id).or_default().push(path);
            }
        }

        Self { by_content, by_id }
    }
}

/// Whether a file present at the same path in both snapshots has changed.
///
/// An equal hash with a differing size or mtime still counts as modified.
pub fn is_modified(baseline: &FileRecord, current: &FileRecord) -> bool {
    current.hash != baseline.hash
        || current.size != baseline.size
        || (current.modified_time - baseline.modified_time).abs() > MTIME_TOLERANCE_SECS
}

/// First baseline record with the same content as `record` that is a
/// different physical file. Absent ids never prove two records are the
/// same file.
fn find_copy_source<'b>(baseline: &'b Snapshot, record: &FileRecord) -> Option<&'b str> {
    let hash = record.hash?;

    baseline
        .iter()
        .find(|(_, candidate)| {
            candidate.hash == Some(hash)
                && match (candidate.file_id, record.file_id) {
                    (Some(a), Some(b)) => a != b,
                    _ => true,
                }
        })
        .map(|(path, _)| path)
}

/// Classify every difference between `baseline` and `current`
pub fn classify(baseline: &Snapshot, current: &Snapshot) -> Classification {
    let index = CurrentIndex::build(current);

    let mut modified_files = Vec::new();
    let mut copied_files = Vec::new();
    let mut copy_targets: BTreeSet<&str> = BTreeSet::new();
    // Paths only in current, not yet explained by a copy or a move
    let mut unmatched: BTreeSet<&str> = BTreeSet::new();
    // Paths only in current whose content could not be hashed. They are
    // new by path and never claimed as a move or copy target.
    let mut unhashed: BTreeSet<&str> = BTreeSet::new();

    for (path, record) in current.iter() {
        match baseline.get(path) {
            Some(previous) => {
                if is_modified(previous, record) {
                    modified_files.push(path.to_string());
                }
            }
            None => match find_copy_source(baseline, record) {
                Some(source) => {
                    copied_files.push(Copied {
                        source: source.to_string(),
                        copy: path.to_string(),
                    });
                    copy_targets.insert(path);
                }
                None if record.hash.is_none() => {
                    unhashed.insert(path);
                }
                None => {
                    unmatched.insert(path);
                }
            },
        }
    }

    let mut moved_files = Vec::new();
    let mut deleted_files = Vec::new();

    for (path, record) in baseline.iter().filter(|(p, _)| !current.contains(p)) {
        let targets = record.file_id.and_then(|id| index.by_id.get(&id));

        if let Some(targets) = targets {
            let claimable = targets
                .iter()
                .filter(|t| !copy_targets.contains(*t) && !unhashed.contains(*t));
            for &target in claimable {
                moved_files.push(Moved {
                    from: path.to_string(),
                    to: target.to_string(),
                });
                unmatched.remove(target);
            }
        } else if record
            .hash
            .is_some_and(|hash| index.by_content.contains_key(&hash))
        {
            // Content survives under another path; pass one already
            // recorded any copy of it.
        } else {
            deleted_files.push(path.to_string());
        }
    }

    let degraded = baseline
        .iter()
        .filter(|(p, r)| r.hash.is_none() && r.file_id.is_none() && !current.contains(p))
        .chain(current.iter().filter(|(_, r)| r.is_degraded()))
        .map(|(p, _)| p.to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let classification = Classification {
        new_files: unmatched
            .union(&unhashed)
            .map(|p| p.to_string())
            .collect(),
        modified_files,
        moved_files,
        copied_files,
        deleted_files,
        degraded,
    };

    debug!(
        baseline = baseline.len(),
        current = current.len(),
        changes = classification.change_count(),
        "classified snapshots"
    );

    classification
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn hash(n: u8) -> Option<ContentHash> {
        Some(ContentHash::from_bytes([n; 32]))
    }

    fn id(n: u64) -> Option<FileId> {
        Some(FileId::new(64769, n))
    }

    fn record(path: &str, hash: Option<ContentHash>, file_id: Option<FileId>) -> FileRecord {
        FileRecord {
            hash,
            size: 10,
            modified_time: 1000.0,
            creation_time: 1000.0,
            path: path.to_string(),
            file_id,
        }
    }

    fn set(items: &[String]) -> HashSet<String> {
        items.iter().cloned().collect()
    }

    fn strings(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_identical_snapshots_have_no_changes() {
        let snapshot = Snapshot::from_records(vec![
            record("a.txt", hash(1), id(1)),
            record("dir/b.txt", hash(2), id(2)),
            record("dup.txt", hash(2), id(3)),
            record("unreadable", None, None),
        ]);

        let result = classify(&snapshot, &snapshot.clone());
        assert!(result.is_empty());
        assert_eq!(result.change_count(), 0);
    }

    #[test]
    fn test_move_detected_by_file_id() {
        let baseline = Snapshot::from_records(vec![record("A", hash(1), id(7))]);
        let current = Snapshot::from_records(vec![record("B", hash(1), id(7))]);

        let result = classify(&baseline, &current);
        assert_eq!(
            result.moved_files,
            vec![Moved {
                from: "A".into(),
                to: "B".into()
            }]
        );
        assert!(result.new_files.is_empty());
        assert!(result.deleted_files.is_empty());
        assert!(result.copied_files.is_empty());
    }

    #[test]
    fn test_move_with_changed_content() {
        let baseline = Snapshot::from_records(vec![record("A", hash(1), id(7))]);
        let current = Snapshot::from_records(vec![record("B", hash(2), id(7))]);

        let result = classify(&baseline, &current);
        assert_eq!(result.moved_files.len(), 1);
        assert!(result.new_files.is_empty());
    }

    #[test]
    fn test_copy_detected_by_content() {
        let baseline = Snapshot::from_records(vec![record("A", hash(1), id(1))]);
        let current = Snapshot::from_records(vec![
            record("A", hash(1), id(1)),
            record("B", hash(1), id(2)),
        ]);

        let result = classify(&baseline, &current);
        assert_eq!(
            result.copied_files,
            vec![Copied {
                source: "A".into(),
                copy: "B".into()
            }]
        );
        assert!(result.new_files.is_empty());
        assert!(result.modified_files.is_empty());
    }

    #[test]
    fn test_copy_source_is_first_baseline_match() {
        let baseline = Snapshot::from_records(vec![
            record("z.txt", hash(1), id(3)),
            record("m.txt", hash(1), id(2)),
        ]);
        let current = Snapshot::from_records(vec![
            record("z.txt", hash(1), id(3)),
            record("m.txt", hash(1), id(2)),
            record("new.txt", hash(1), id(9)),
        ]);

        let result = classify(&baseline, &current);
        assert_eq!(result.copied_files.len(), 1);
        assert_eq!(result.copied_files[0].source, "m.txt");
    }

    #[test]
    fn test_copy_when_file_ids_unavailable() {
        let baseline = Snapshot::from_records(vec![record("A", hash(1), None)]);
        let current = Snapshot::from_records(vec![
            record("A", hash(1), None),
            record("B", hash(1), None),
        ]);

        let result = classify(&baseline, &current);
        assert_eq!(result.copied_files.len(), 1);
        assert!(result.new_files.is_empty());
    }

    #[test]
    fn test_copy_of_moved_away_file_is_not_deleted() {
        // A disappeared, its content lives on in a copy with a new id
        let baseline = Snapshot::from_records(vec![record("A", hash(1), id(1))]);
        let current = Snapshot::from_records(vec![record("B", hash(1), id(2))]);

        let result = classify(&baseline, &current);
        assert_eq!(result.copied_files.len(), 1);
        assert!(result.deleted_files.is_empty());
        assert!(result.moved_files.is_empty());
    }

    #[test]
    fn test_modification() {
        let baseline = Snapshot::from_records(vec![FileRecord {
            size: 10,
            modified_time: 1000.0,
            ..record("A", hash(1), id(1))
        }]);
        let current = Snapshot::from_records(vec![FileRecord {
            size: 20,
            modified_time: 1005.0,
            ..record("A", hash(2), id(1))
        }]);

        let result = classify(&baseline, &current);
        assert_eq!(result.modified_files, vec!["A".to_string()]);
        assert_eq!(result.change_count(), 1);
    }

    #[test]
    fn test_mtime_tolerance_boundary() {
        let baseline = Snapshot::from_records(vec![record("A", hash(1), id(1))]);

        let within = Snapshot::from_records(vec![FileRecord {
            modified_time: 1001.0,
            ..record("A", hash(1), id(1))
        }]);
        assert!(classify(&baseline, &within).is_empty());

        let beyond = Snapshot::from_records(vec![FileRecord {
            modified_time: 1001.01,
            ..record("A", hash(1), id(1))
        }]);
        assert_eq!(
            classify(&baseline, &beyond).modified_files,
            vec!["A".to_string()]
        );

        let earlier = Snapshot::from_records(vec![FileRecord {
            modified_time: 998.99,
            ..record("A", hash(1), id(1))
        }]);
        assert_eq!(classify(&baseline, &earlier).modified_files.len(), 1);
    }

    #[test]
    fn test_same_hash_different_size_is_modified() {
        let baseline = Snapshot::from_records(vec![record("A", hash(1), id(1))]);
        let current = Snapshot::from_records(vec![FileRecord {
            size: 11,
            ..record("A", hash(1), id(1))
        }]);

        assert_eq!(classify(&baseline, &current).modified_files.len(), 1);
    }

    #[test]
    fn test_true_deletion() {
        let baseline = Snapshot::from_records(vec![
            record("A", hash(1), id(1)),
            record("keep", hash(2), id(2)),
        ]);
        let current = Snapshot::from_records(vec![record("keep", hash(2), id(2))]);

        let result = classify(&baseline, &current);
        assert_eq!(result.deleted_files, vec!["A".to_string()]);
        assert_eq!(result.change_count(), 1);
    }

    #[test]
    fn test_degraded_record_is_new() {
        let baseline = Snapshot::from_records(vec![record("A", hash(1), id(1))]);
        let current = Snapshot::from_records(vec![
            record("A", hash(1), id(1)),
            record("locked.bin", None, None),
        ]);

        let result = classify(&baseline, &current);
        assert_eq!(result.new_files, vec!["locked.bin".to_string()]);
        assert!(result.moved_files.is_empty());
        assert!(result.copied_files.is_empty());
        assert_eq!(result.degraded, vec!["locked.bin".to_string()]);
    }

    #[test]
    fn test_unhashed_file_is_new_even_with_matching_id() {
        let baseline = Snapshot::from_records(vec![record("A", hash(1), id(7))]);
        let current = Snapshot::from_records(vec![record("B", None, id(7))]);

        let result = classify(&baseline, &current);
        assert_eq!(result.new_files, vec!["B".to_string()]);
        assert!(result.moved_files.is_empty());
        assert!(result.copied_files.is_empty());
        // A's id still exists in the tree, so it is not reported as deleted
        assert!(result.deleted_files.is_empty());
        assert_eq!(result.degraded, vec!["B".to_string()]);
    }

    #[test]
    fn test_unhashed_hard_link_keeps_hashed_move() {
        let baseline = Snapshot::from_records(vec![record("A", hash(1), id(4))]);
        let current = Snapshot::from_records(vec![
            record("B", hash(1), id(4)),
            record("C", None, id(4)),
        ]);

        let result = classify(&baseline, &current);
        assert_eq!(
            result.moved_files,
            vec![Moved {
                from: "A".into(),
                to: "B".into()
            }]
        );
        assert_eq!(result.new_files, vec!["C".to_string()]);
    }

    #[test]
    fn test_degraded_baseline_record_is_deleted() {
        let baseline = Snapshot::from_records(vec![record("gone", None, None)]);
        let current = Snapshot::from_records(vec![record("other", None, None)]);

        let result = classify(&baseline, &current);
        assert_eq!(result.deleted_files, vec!["gone".to_string()]);
        assert_eq!(result.new_files, vec!["other".to_string()]);
        assert_eq!(set(&result.degraded), strings(&["gone", "other"]));
    }

    #[test]
    fn test_hard_link_yields_multiple_moves() {
        let baseline = Snapshot::from_records(vec![record("A", hash(1), id(4))]);
        let current = Snapshot::from_records(vec![
            record("B", hash(1), id(4)),
            record("C", hash(1), id(4)),
        ]);

        let result = classify(&baseline, &current);
        let targets: HashSet<String> = result.moved_files.iter().map(|m| m.to.clone()).collect();
        assert_eq!(targets, strings(&["B", "C"]));
        assert!(result.new_files.is_empty());
    }

    #[test]
    fn test_copy_target_is_never_also_moved() {
        // B shares A's id but content also matches another baseline file
        // with a different id, so pass one resolves it as a copy first.
        let baseline = Snapshot::from_records(vec![
            record("A", hash(1), id(1)),
            record("C", hash(1), id(2)),
        ]);
        let current = Snapshot::from_records(vec![
            record("B", hash(1), id(1)),
            record("C", hash(1), id(2)),
        ]);

        let result = classify(&baseline, &current);
        assert_eq!(result.copied_files.len(), 1);
        assert!(result.moved_files.is_empty());
        assert!(result.new_files.is_empty());
        assert!(result.deleted_files.is_empty());
    }

    #[test]
    fn test_no_path_classified_twice() {
        let baseline = Snapshot::from_records(vec![
            record("moved_src", hash(1), id(1)),
            record("orig", hash(2), id(2)),
            record("edited", hash(3), id(3)),
            record("removed", hash(4), id(4)),
        ]);
        let current = Snapshot::from_records(vec![
            record("moved_dst", hash(1), id(1)),
            record("orig", hash(2), id(2)),
            record("orig_copy", hash(2), id(20)),
            record("edited", hash(30), id(3)),
            record("fresh", hash(5), id(5)),
        ]);

        let result = classify(&baseline, &current);

        let mut seen: Vec<String> = Vec::new();
        seen.extend(result.new_files.iter().cloned());
        seen.extend(result.modified_files.iter().cloned());
        seen.extend(result.moved_files.iter().map(|m| m.to.clone()));
        seen.extend(result.copied_files.iter().map(|c| c.copy.clone()));
        seen.extend(result.deleted_files.iter().cloned());

        let unique: HashSet<String> = seen.iter().cloned().collect();
        assert_eq!(unique.len(), seen.len(), "path classified twice: {:?}", seen);
        assert_eq!(
            unique,
            strings(&["fresh", "edited", "moved_dst", "orig_copy", "removed"])
        );
    }
}
