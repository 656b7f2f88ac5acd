/// Transactional move executor.
///
/// Files are processed strictly sequentially in input order: progress is
/// monotonic and the undo log reflects exactly the files moved so far. The
/// data-safety invariant is copy-then-delete — a source entry is only
/// deleted after its content has been fully written and closed at the
/// destination, never the other way around.
use std::path::{Path, PathBuf};

use crate::fs_ops::FsOps;
use crate::undo::{UndoLog, UndoRecord, join_relative};
use crate::walker::FileRecord;

/// What to do with the selected files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveMode {
    /// Move into category subfolders under the scan root; reversible.
    Organize,
    /// Move into category subfolders under an external destination.
    Export,
    /// Copy into an external destination preserving the relative layout;
    /// sources are never deleted.
    Backup,
}

/// Destination plan for one executor run.
#[derive(Debug, Clone)]
pub struct MovePlan {
    pub mode: MoveMode,
    /// The scan root; sources are resolved against it.
    pub root: PathBuf,
    /// External destination for `Export` and `Backup`.
    pub destination: Option<PathBuf>,
}

impl MovePlan {
    pub fn organize(root: &Path) -> Self {
        Self {
            mode: MoveMode::Organize,
            root: root.to_path_buf(),
            destination: None,
        }
    }

    pub fn export(root: &Path, destination: &Path) -> Self {
        Self {
            mode: MoveMode::Export,
            root: root.to_path_buf(),
            destination: Some(destination.to_path_buf()),
        }
    }

    pub fn backup(root: &Path, destination: &Path) -> Self {
        Self {
            mode: MoveMode::Backup,
            root: root.to_path_buf(),
            destination: Some(destination.to_path_buf()),
        }
    }
}

/// What happened across one executor run. Failures are per-file; a run
/// always completes over the whole input.
#[derive(Debug)]
pub struct MoveOutcome {
    pub moved: usize,
    /// (path, reason) for files skipped by policy.
    pub skipped: Vec<(String, String)>,
    /// (path, reason) for files that hit an error.
    pub failed: Vec<(String, String)>,
    /// Undo records for this run; empty outside `Organize` mode.
    pub undo: UndoLog,
}

enum Disposition {
    Moved,
    Skipped(String),
}

/// Moves (or copies) each record according to the plan.
///
/// `on_progress` is invoked after every file, success or not, with the
/// rounded overall percentage and the file name just processed.
pub fn execute<F: FsOps>(
    fs: &F,
    records: &[FileRecord],
    plan: &MovePlan,
    mut on_progress: impl FnMut(u8, &str),
) -> MoveOutcome {
    let total = records.len();
    let mut outcome = MoveOutcome {
        moved: 0,
        skipped: Vec::new(),
        failed: Vec::new(),
        undo: UndoLog::new(),
    };

    for (done, record) in records.iter().enumerate() {
        match move_one(fs, record, plan) {
            Ok(Disposition::Moved) => {
                outcome.moved += 1;
                if plan.mode == MoveMode::Organize {
                    outcome.undo.push(UndoRecord {
                        file_name: record.name.clone(),
                        original_relative_path: record.path.clone(),
                        category: record.category,
                    });
                }
            }
            Ok(Disposition::Skipped(reason)) => {
                outcome.skipped.push((record.path.clone(), reason));
            }
            Err(reason) => {
                outcome.failed.push((record.path.clone(), reason));
            }
        }
        let progress = (((done + 1) as f64 / total as f64) * 100.0).round() as u8;
        on_progress(progress, &record.name);
    }
    outcome
}

fn move_one<F: FsOps>(
    fs: &F,
    record: &FileRecord,
    plan: &MovePlan,
) -> Result<Disposition, String> {
    // Unknown and Junk are never organized, even when selected.
    if plan.mode == MoveMode::Organize && !record.category.is_movable() {
        return Ok(Disposition::Skipped(format!(
            "{} files are not moved",
            record.category.dir_name()
        )));
    }

    let source = join_relative(&plan.root, &record.path);
    let (dest_dir, dest_path) = destination_for(record, plan)?;

    if source == dest_path {
        return Ok(Disposition::Skipped("already in place".to_string()));
    }

    fs.ensure_dir(&dest_dir)
        .map_err(|e| format!("could not create {}: {e}", dest_dir.display()))?;

    if fs.exists(&dest_path) {
        return Err(format!(
            "destination already exists: {}",
            dest_path.display()
        ));
    }

    let content = fs
        .read_file(&source)
        .map_err(|e| format!("could not read source: {e}"))?;
    fs.write_file(&dest_path, &content)
        .map_err(|e| format!("could not write destination: {e}"))?;

    // The write is confirmed closed; only now may the source go away.
    if plan.mode != MoveMode::Backup {
        fs.remove_file(&source)
            .map_err(|e| format!("copied, but could not delete source: {e}"))?;
    }
    Ok(Disposition::Moved)
}

fn destination_for(record: &FileRecord, plan: &MovePlan) -> Result<(PathBuf, PathBuf), String> {
    match plan.mode {
        MoveMode::Organize => {
            let dir = plan.root.join(record.category.dir_name());
            let path = dir.join(&record.name);
            Ok((dir, path))
        }
        MoveMode::Export => {
            let base = plan
                .destination
                .as_ref()
                .ok_or_else(|| "no export destination".to_string())?;
            let dir = base.join(record.category.dir_name());
            let path = dir.join(&record.name);
            Ok((dir, path))
        }
        MoveMode::Backup => {
            let base = plan
                .destination
                .as_ref()
                .ok_or_else(|| "no backup destination".to_string())?;
            let path = join_relative(base, &record.path);
            let dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| base.clone());
            Ok((dir, path))
        }
    }
}
