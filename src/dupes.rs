/// Size-based duplicate grouping and the keep-one resolution protocol.
///
/// Grouping is a pre-content heuristic: files are bucketed by exact byte
/// size, and any bucket with more than one member becomes a group. Same
/// size does not prove same content; that imprecision is accepted by
/// design and content hashing is deliberately not attempted.
use std::collections::{BTreeMap, HashSet};

use crate::walker::FileRecord;

/// A set of files sharing an exact byte size, pending user resolution.
/// The id is derived from the size, so it is stable within a scan.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub id: String,
    pub size: u64,
    /// Member record paths (identity keys); always two or more.
    pub paths: Vec<String>,
}

pub fn group_id(size: u64) -> String {
    format!("group-{size}")
}

/// Buckets records by size and returns every bucket with two or more
/// members as a group, marking the member records. Buckets of one are
/// discarded and their records keep `is_duplicate = false`.
pub fn group_by_size(records: &mut [FileRecord]) -> Vec<DuplicateGroup> {
    let mut buckets: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
    for (index, record) in records.iter().enumerate() {
        buckets.entry(record.size).or_default().push(index);
    }

    let mut groups = Vec::new();
    for (size, indices) in buckets {
        if indices.len() < 2 {
            continue;
        }
        let id = group_id(size);
        for &index in &indices {
            records[index].is_duplicate = true;
            records[index].duplicate_group_id = Some(id.clone());
        }
        groups.push(DuplicateGroup {
            id,
            size,
            paths: indices.iter().map(|&i| records[i].path.clone()).collect(),
        });
    }
    groups
}

/// Tracks which group members are marked for deletion.
///
/// The protocol is keep-one: marking a file as the keeper marks every
/// other member of its group for deletion and un-marks the keeper itself,
/// so re-marking a different keeper is idempotent.
#[derive(Debug, Default)]
pub struct DeletionMarks {
    marked: HashSet<String>,
}

impl DeletionMarks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chooses `keep_path` as the group's survivor.
    pub fn mark_keep(&mut self, group: &DuplicateGroup, keep_path: &str) {
        for path in &group.paths {
            if path == keep_path {
                self.marked.remove(path);
            } else {
                self.marked.insert(path.clone());
            }
        }
    }

    pub fn is_marked(&self, path: &str) -> bool {
        self.marked.contains(path)
    }

    /// Marked paths in a stable order.
    pub fn marked_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.marked.iter().cloned().collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.marked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marked.is_empty()
    }

    pub fn clear(&mut self) {
        self.marked.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;

    fn record(path: &str, size: u64) -> FileRecord {
        FileRecord {
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            path: path.to_string(),
            size,
            last_modified: None,
            extension: FileRecord::extension_of(path),
            category: Category::Unknown,
            manual: false,
            is_duplicate: false,
            duplicate_group_id: None,
        }
    }

    #[test]
    fn same_size_files_form_a_group() {
        let mut records = vec![
            record("a.pdf", 100),
            record("b.pdf", 100),
            record("c.txt", 50),
        ];
        let groups = group_by_size(&mut records);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, "group-100");
        assert_eq!(groups[0].paths, vec!["a.pdf", "b.pdf"]);
        assert!(records[0].is_duplicate);
        assert_eq!(records[0].duplicate_group_id.as_deref(), Some("group-100"));
        assert!(!records[2].is_duplicate);
        assert_eq!(records[2].duplicate_group_id, None);
    }

    #[test]
    fn distinct_sizes_produce_no_groups() {
        let mut records = vec![record("a", 1), record("b", 2), record("c", 3)];
        assert!(group_by_size(&mut records).is_empty());
        assert!(records.iter().all(|r| !r.is_duplicate));
    }

    #[test]
    fn every_group_has_at_least_two_members_of_equal_size() {
        let mut records = vec![
            record("a", 10),
            record("b", 10),
            record("c", 10),
            record("d", 20),
            record("e", 20),
            record("f", 30),
        ];
        let groups = group_by_size(&mut records);
        assert_eq!(groups.len(), 2);
        for group in &groups {
            assert!(group.paths.len() >= 2);
            for path in &group.paths {
                let member = records.iter().find(|r| &r.path == path).unwrap();
                assert_eq!(member.size, group.size);
            }
        }
    }

    #[test]
    fn keep_one_marks_all_other_members() {
        let mut records = vec![record("a", 10), record("b", 10), record("c", 10)];
        let groups = group_by_size(&mut records);
        let mut marks = DeletionMarks::new();

        marks.mark_keep(&groups[0], "a");
        assert!(!marks.is_marked("a"));
        assert!(marks.is_marked("b"));
        assert!(marks.is_marked("c"));
    }

    #[test]
    fn re_marking_a_different_keeper_is_idempotent() {
        let mut records = vec![record("a", 10), record("b", 10), record("c", 10)];
        let groups = group_by_size(&mut records);
        let mut marks = DeletionMarks::new();

        marks.mark_keep(&groups[0], "a");
        marks.mark_keep(&groups[0], "b");

        // Exactly one survivor, and it is the latest keeper.
        assert!(marks.is_marked("a"));
        assert!(!marks.is_marked("b"));
        assert!(marks.is_marked("c"));
        assert_eq!(marks.len(), 2);
    }
}
