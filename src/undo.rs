/// Undo log for the most recent organize pass.
///
/// Every successful move appends one record; the log is persisted next to
/// the scan root so the pass can be reverted from a later invocation. Only
/// the latest pass is reversible: a new organize replaces the file, and a
/// completed undo clears it.
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

use crate::category::Category;
use crate::fs_ops::FsOps;

pub const HISTORY_FILE_NAME: &str = ".sortify_history.json";

/// One reversible move: enough to put the file back where it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoRecord {
    pub file_name: String,
    pub original_relative_path: String,
    pub category: Category,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoLog {
    /// ISO 8601 timestamp of the organize pass this log belongs to.
    pub timestamp: String,
    pub records: Vec<UndoRecord>,
}

impl Default for UndoLog {
    fn default() -> Self {
        Self {
            timestamp: String::new(),
            records: Vec::new(),
        }
    }
}

/// Errors reading or writing the persisted history.
#[derive(Debug)]
pub enum UndoError {
    WriteFailed { source: io::Error },
    ReadFailed { source: io::Error },
    InvalidFormat { reason: String },
}

impl std::fmt::Display for UndoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UndoError::WriteFailed { source } => {
                write!(f, "Failed to write history file: {source}")
            }
            UndoError::ReadFailed { source } => {
                write!(f, "Failed to read history file: {source}")
            }
            UndoError::InvalidFormat { reason } => {
                write!(f, "Invalid history file format: {reason}")
            }
        }
    }
}

impl std::error::Error for UndoError {}

impl UndoLog {
    pub fn new() -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: UndoRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn history_path(root: &Path) -> PathBuf {
        root.join(HISTORY_FILE_NAME)
    }

    /// Persists this log, replacing any previous pass's history.
    pub fn save<F: FsOps>(&self, fs: &F, root: &Path) -> Result<(), UndoError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| UndoError::InvalidFormat {
            reason: e.to_string(),
        })?;
        fs.write_file(&Self::history_path(root), json.as_bytes())
            .map_err(|source| UndoError::WriteFailed { source })
    }

    /// Loads the persisted history, `None` when there is nothing to undo.
    pub fn load<F: FsOps>(fs: &F, root: &Path) -> Result<Option<Self>, UndoError> {
        let path = Self::history_path(root);
        if !fs.exists(&path) {
            return Ok(None);
        }
        let bytes = fs
            .read_file(&path)
            .map_err(|source| UndoError::ReadFailed { source })?;
        let log = serde_json::from_slice(&bytes).map_err(|e| UndoError::InvalidFormat {
            reason: e.to_string(),
        })?;
        Ok(Some(log))
    }

    pub fn delete<F: FsOps>(fs: &F, root: &Path) -> Result<(), UndoError> {
        let path = Self::history_path(root);
        if fs.exists(&path) {
            fs.remove_file(&path)
                .map_err(|source| UndoError::WriteFailed { source })?;
        }
        Ok(())
    }
}

/// Result of replaying an undo log.
#[derive(Debug, Default)]
pub struct UndoReport {
    pub restored: usize,
    /// (file name, reason) for files that could not be restored.
    pub failed: Vec<(String, String)>,
    /// (file name, reason) for files no longer where the log said.
    pub skipped: Vec<(String, String)>,
}

impl UndoReport {
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

/// Replays the log in original recorded order, restoring each file to its
/// pre-organize location with the same copy-then-delete pattern as the
/// move executor: the content is fully written at the original path before
/// the category copy is deleted. Per-file failures are isolated.
pub fn undo<F: FsOps>(
    fs: &F,
    root: &Path,
    log: &UndoLog,
    mut on_progress: impl FnMut(u8, &str),
) -> UndoReport {
    let total = log.records.len();
    let mut report = UndoReport::default();

    for (done, record) in log.records.iter().enumerate() {
        match restore_one(fs, root, record) {
            Ok(()) => report.restored += 1,
            Err((not_found, reason)) => {
                if not_found {
                    report.skipped.push((record.file_name.clone(), reason));
                } else {
                    report.failed.push((record.file_name.clone(), reason));
                }
            }
        }
        let progress = (((done + 1) as f64 / total as f64) * 100.0).round() as u8;
        on_progress(progress, &record.file_name);
    }
    report
}

fn restore_one<F: FsOps>(fs: &F, root: &Path, record: &UndoRecord) -> Result<(), (bool, String)> {
    let source = root
        .join(record.category.dir_name())
        .join(&record.file_name);
    if !fs.exists(&source) {
        return Err((true, "file not found in category folder".to_string()));
    }

    let original = join_relative(root, &record.original_relative_path);
    if let Some(parent) = original.parent() {
        fs.ensure_dir(parent)
            .map_err(|e| (false, format!("could not recreate original folder: {e}")))?;
    }

    let content = fs
        .read_file(&source)
        .map_err(|e| (false, format!("could not read file back: {e}")))?;
    fs.write_file(&original, &content)
        .map_err(|e| (false, format!("could not restore file: {e}")))?;
    fs.remove_file(&source)
        .map_err(|e| (false, format!("could not remove category copy: {e}")))?;
    Ok(())
}

/// Joins a slash-separated relative path onto a base, segment by segment.
pub fn join_relative(base: &Path, relative: &str) -> PathBuf {
    let mut path = base.to_path_buf();
    for segment in relative.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_ops::testing::{MemFs, Op};

    fn record(name: &str, original: &str, category: Category) -> UndoRecord {
        UndoRecord {
            file_name: name.to_string(),
            original_relative_path: original.to_string(),
            category,
        }
    }

    #[test]
    fn undo_restores_original_layout_and_content() {
        let fs = MemFs::new();
        fs.seed_file("root/Documents/report.pdf", b"content");
        let mut log = UndoLog::new();
        log.push(record("report.pdf", "sub/report.pdf", Category::Documents));

        let report = undo(&fs, Path::new("root"), &log, |_, _| {});

        assert_eq!(report.restored, 1);
        assert!(report.is_complete_success());
        assert_eq!(
            fs.content("root/sub/report.pdf").as_deref(),
            Some(&b"content"[..])
        );
        assert!(fs.content("root/Documents/report.pdf").is_none());
    }

    #[test]
    fn undo_writes_before_deleting() {
        let fs = MemFs::new();
        fs.seed_file("root/Audio/song.mp3", b"xx");
        let mut log = UndoLog::new();
        log.push(record("song.mp3", "song.mp3", Category::Audio));

        undo(&fs, Path::new("root"), &log, |_, _| {});

        let ops = fs.ops();
        let write_at = ops
            .iter()
            .position(|op| *op == Op::Write("root/song.mp3".to_string()))
            .expect("restore write missing");
        let remove_at = ops
            .iter()
            .position(|op| *op == Op::Remove("root/Audio/song.mp3".to_string()))
            .expect("category delete missing");
        assert!(write_at < remove_at);
    }

    #[test]
    fn missing_category_copy_is_skipped() {
        let fs = MemFs::new();
        fs.seed_dir("root");
        let mut log = UndoLog::new();
        log.push(record("gone.txt", "gone.txt", Category::Documents));

        let report = undo(&fs, Path::new("root"), &log, |_, _| {});
        assert_eq!(report.restored, 0);
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn per_file_failure_does_not_stop_the_replay() {
        let fs = MemFs::new();
        fs.seed_file("root/Documents/a.txt", b"a");
        fs.seed_file("root/Documents/b.txt", b"b");
        fs.fail_write("root/a.txt");

        let mut log = UndoLog::new();
        log.push(record("a.txt", "a.txt", Category::Documents));
        log.push(record("b.txt", "b.txt", Category::Documents));

        let report = undo(&fs, Path::new("root"), &log, |_, _| {});
        assert_eq!(report.restored, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(fs.content("root/b.txt").as_deref(), Some(&b"b"[..]));
        // The unrestorable copy stays in place rather than being lost.
        assert!(fs.content("root/Documents/a.txt").is_some());
    }

    #[test]
    fn progress_reaches_one_hundred() {
        let fs = MemFs::new();
        fs.seed_file("root/Documents/a.txt", b"a");
        fs.seed_file("root/Documents/b.txt", b"b");
        let mut log = UndoLog::new();
        log.push(record("a.txt", "a.txt", Category::Documents));
        log.push(record("b.txt", "b.txt", Category::Documents));

        let mut seen = Vec::new();
        undo(&fs, Path::new("root"), &log, |p, _| seen.push(p));
        assert_eq!(seen, vec![50, 100]);
    }

    #[test]
    fn log_round_trips_through_the_history_file() {
        let fs = MemFs::new();
        fs.seed_dir("root");
        let mut log = UndoLog::new();
        log.push(record("a.txt", "x/a.txt", Category::Documents));
        log.save(&fs, Path::new("root")).expect("save failed");

        let loaded = UndoLog::load(&fs, Path::new("root"))
            .expect("load failed")
            .expect("no log found");
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].original_relative_path, "x/a.txt");

        UndoLog::delete(&fs, Path::new("root")).expect("delete failed");
        assert!(
            UndoLog::load(&fs, Path::new("root"))
                .expect("load failed")
                .is_none()
        );
    }

    #[test]
    fn corrupt_history_is_an_invalid_format_error() {
        let fs = MemFs::new();
        fs.seed_file(&format!("root/{HISTORY_FILE_NAME}"), b"not json");
        let err = UndoLog::load(&fs, Path::new("root")).unwrap_err();
        assert!(matches!(err, UndoError::InvalidFormat { .. }));
    }
}
