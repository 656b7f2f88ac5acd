/// Session orchestration.
///
/// `Engine` owns one scan session — the file records, duplicate groups,
/// deletion marks, selection set, and undo log — and sequences every
/// operation through the step machine. Folder choices model the picker:
/// a cancelled pick is a distinguished non-error outcome that leaves the
/// machine in its pre-operation state, while denied access is reported
/// with actionable guidance.
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::category::Category;
use crate::classifier::Classifier;
use crate::dupes::{self, DeletionMarks, DuplicateGroup};
use crate::fs_ops::FsOps;
use crate::mover::{self, MoveMode, MoveOutcome, MovePlan};
use crate::resolver;
use crate::rules::CustomRule;
use crate::state::{ProcessingState, StateError, Step, StepMachine};
use crate::undo::{self, UndoLog, UndoReport, join_relative};
use crate::walker::{self, FileRecord, ScanError};

/// Outcome of a folder picker interaction.
#[derive(Debug, Clone)]
pub enum FolderChoice {
    Selected(PathBuf),
    Cancelled,
}

/// Folder access problems at an entry point.
#[derive(Debug)]
pub enum AccessError {
    /// The user backed out. Not an error; no banner is shown.
    Cancelled,
    /// Access was denied by the platform or permissions.
    Blocked(String),
}

impl std::fmt::Display for AccessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessError::Cancelled => write!(f, "folder selection cancelled"),
            AccessError::Blocked(guidance) => write!(f, "Folder access blocked: {guidance}"),
        }
    }
}

impl std::error::Error for AccessError {}

#[derive(Debug)]
pub enum EngineError {
    Access(AccessError),
    Scan(ScanError),
    State(StateError),
    /// No active session root for the requested operation.
    NoSession,
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Access(e) => write!(f, "{e}"),
            EngineError::Scan(e) => write!(f, "{e}"),
            EngineError::State(e) => write!(f, "Operation not available right now: {e}"),
            EngineError::NoSession => write!(f, "No folder has been scanned yet"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Report of a duplicate purge.
#[derive(Debug, Default)]
pub struct PurgeReport {
    pub deleted: usize,
    pub failed: Vec<(String, String)>,
}

pub struct Engine<F: FsOps> {
    fs: F,
    step: StepMachine,
    processing: ProcessingState,
    root: Option<PathBuf>,
    records: Vec<FileRecord>,
    groups: Vec<DuplicateGroup>,
    marks: DeletionMarks,
    selection: HashSet<String>,
    undo_log: UndoLog,
}

impl<F: FsOps> Engine<F> {
    pub fn new(fs: F) -> Self {
        Self {
            fs,
            step: StepMachine::new(),
            processing: ProcessingState::default(),
            root: None,
            records: Vec::new(),
            groups: Vec::new(),
            marks: DeletionMarks::new(),
            selection: HashSet::new(),
            undo_log: UndoLog::default(),
        }
    }

    pub fn step(&self) -> Step {
        self.step.current()
    }

    pub fn processing(&self) -> &ProcessingState {
        &self.processing
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn groups(&self) -> &[DuplicateGroup] {
        &self.groups
    }

    pub fn selection(&self) -> &HashSet<String> {
        &self.selection
    }

    pub fn deletion_marks(&self) -> &DeletionMarks {
        &self.marks
    }

    /// Drops the whole session and returns to `Idle`.
    pub fn reset(&mut self) {
        self.step.reset();
        self.processing.reset();
        self.root = None;
        self.records.clear();
        self.groups.clear();
        self.marks.clear();
        self.selection.clear();
        self.undo_log = UndoLog::default();
    }

    /// Scans the chosen folder and seeds the session.
    ///
    /// A cancelled pick silently leaves the machine where it was. A denied
    /// root becomes `AccessError::Blocked`; any other read failure aborts
    /// the scan and returns to `Idle` with a generic error message.
    pub fn begin_scan(
        &mut self,
        choice: FolderChoice,
        excluded: &HashSet<String>,
    ) -> Result<(), EngineError> {
        let root = match choice {
            FolderChoice::Cancelled => return Ok(()),
            FolderChoice::Selected(path) => path,
        };

        self.step
            .transition(Step::Scanning)
            .map_err(EngineError::State)?;
        self.processing.begin("Scanning folder");
        self.processing.is_scanning = true;

        match walker::scan(&self.fs, &root, excluded) {
            Ok(mut records) => {
                self.groups = dupes::group_by_size(&mut records);
                self.records = records;
                self.root = Some(root);
                self.marks.clear();
                self.selection.clear();
                self.processing.is_scanning = false;
                let next = if self.groups.is_empty() {
                    Step::Review
                } else {
                    Step::Duplicates
                };
                self.step.transition(next).map_err(EngineError::State)
            }
            Err(scan_error) => {
                self.processing.is_scanning = false;
                self.step
                    .transition(Step::Idle)
                    .map_err(EngineError::State)?;
                if scan_error.is_root_access_denied(&root) {
                    let guidance =
                        "access to this folder was denied; pick a less sensitive subfolder"
                            .to_string();
                    self.processing.error = Some(guidance.clone());
                    Err(EngineError::Access(AccessError::Blocked(guidance)))
                } else {
                    self.processing.error = Some("Failed to scan the selected folder".to_string());
                    Err(EngineError::Scan(scan_error))
                }
            }
        }
    }

    /// Runs category resolution over the session and seeds the selection
    /// set with every classified (non-Unknown) file.
    pub fn classify(&mut self, rules: &[CustomRule], classifier: &dyn Classifier) {
        self.processing.activity = "Categorizing files".to_string();
        resolver::resolve(&mut self.records, rules, classifier);
        self.seed_selection();
    }

    /// Re-classifies the current selection. With `force`, manual
    /// categories are overwritten too.
    pub fn reclassify_selection(&mut self, classifier: &dyn Classifier, force: bool) {
        let paths = self.selection.clone();
        resolver::resolve_subset(&mut self.records, &paths, classifier, force);
        self.seed_selection();
    }

    fn seed_selection(&mut self) {
        self.selection = self
            .records
            .iter()
            .filter(|r| r.category != Category::Unknown)
            .map(|r| r.path.clone())
            .collect();
    }

    /// Assigns a category by hand; protected from later bulk passes.
    pub fn set_manual_category(&mut self, path: &str, category: Category) -> bool {
        match self.records.iter_mut().find(|r| r.path == path) {
            Some(record) => {
                record.category = category;
                record.manual = true;
                if category == Category::Unknown {
                    self.selection.remove(path);
                } else {
                    self.selection.insert(path.to_string());
                }
                true
            }
            None => false,
        }
    }

    pub fn toggle_selected(&mut self, path: &str) -> bool {
        if self.selection.remove(path) {
            return true;
        }
        if self.records.iter().any(|r| r.path == path) {
            self.selection.insert(path.to_string());
            return true;
        }
        false
    }

    /// Chooses the surviving file of a duplicate group; all other members
    /// are marked for deletion.
    pub fn mark_keep(&mut self, group_id: &str, keep_path: &str) -> bool {
        match self.groups.iter().find(|g| g.id == group_id) {
            Some(group) => {
                self.marks.mark_keep(group, keep_path);
                true
            }
            None => false,
        }
    }

    /// Deletes every file marked for deletion and advances to review.
    /// Per-file delete failures are isolated; the step advances anyway.
    pub fn purge_marked(&mut self) -> Result<PurgeReport, EngineError> {
        self.step
            .transition(Step::Review)
            .map_err(EngineError::State)?;
        let root = self.root.clone().ok_or(EngineError::NoSession)?;

        let mut report = PurgeReport::default();
        let mut deleted: HashSet<String> = HashSet::new();
        for path in self.marks.marked_paths() {
            match self.fs.remove_file(&join_relative(&root, &path)) {
                Ok(()) => {
                    deleted.insert(path.clone());
                    report.deleted += 1;
                }
                Err(e) => report.failed.push((path.clone(), e.to_string())),
            }
        }
        self.marks.clear();
        self.records.retain(|r| !deleted.contains(&r.path));

        // Fully resolved groups disappear; remaining same-size files
        // regroup for information.
        for record in &mut self.records {
            record.is_duplicate = false;
            record.duplicate_group_id = None;
        }
        self.groups = dupes::group_by_size(&mut self.records);
        self.selection.retain(|path| !deleted.contains(path));
        Ok(report)
    }

    /// Optional confirmation step before a bulk move. Caller policy:
    /// flows that want a confirmation enter `Verifying` and then either
    /// proceed to the move or back out to review.
    pub fn request_verification(&mut self) -> Result<(), EngineError> {
        self.step
            .transition(Step::Verifying)
            .map_err(EngineError::State)
    }

    pub fn cancel_verification(&mut self) -> Result<(), EngineError> {
        self.step
            .transition(Step::Review)
            .map_err(EngineError::State)
    }

    fn selected_records(&self) -> Vec<FileRecord> {
        self.records
            .iter()
            .filter(|r| self.selection.contains(&r.path))
            .cloned()
            .collect()
    }

    /// Moves the selected files into category subfolders under the scan
    /// root and persists the undo log. Runs from review or verification.
    pub fn organize(
        &mut self,
        mut on_progress: impl FnMut(u8, &str),
    ) -> Result<MoveOutcome, EngineError> {
        let root = self.root.clone().ok_or(EngineError::NoSession)?;
        self.step
            .transition(Step::Exporting)
            .map_err(EngineError::State)?;
        self.processing.begin("Organizing files");
        self.processing.is_organizing = true;

        let selected = self.selected_records();
        let plan = MovePlan::organize(&root);
        let processing = &mut self.processing;
        let outcome = mover::execute(&self.fs, &selected, &plan, |progress, name| {
            processing.file_progress(progress, name);
            on_progress(progress, name);
        });

        self.undo_log = outcome.undo.clone();
        if !self.undo_log.is_empty()
            && let Err(e) = self.undo_log.save(&self.fs, &root)
        {
            self.processing.error = Some(format!("Undo may not be available: {e}"));
        }

        self.finish_move(&outcome, true);
        self.step
            .transition(Step::Completed)
            .map_err(EngineError::State)?;
        Ok(outcome)
    }

    /// Moves the selected files into category subfolders under an
    /// external destination. Not reversible. A cancelled destination pick
    /// returns `None` and leaves the machine in its pre-operation state;
    /// an unusable destination aborts before any file is touched and
    /// returns to review.
    pub fn export(
        &mut self,
        destination: FolderChoice,
        on_progress: impl FnMut(u8, &str),
    ) -> Result<Option<MoveOutcome>, EngineError> {
        let root = self.root.clone().ok_or(EngineError::NoSession)?;
        let dest = match destination {
            FolderChoice::Cancelled => return Ok(None),
            FolderChoice::Selected(path) => path,
        };
        let plan = MovePlan::export(&root, &dest);
        self.run_external_move(&dest, plan, "Exporting files", on_progress)
            .map(Some)
    }

    /// Copies the selected files to an external destination, preserving
    /// the relative layout. Sources are never deleted.
    pub fn backup(
        &mut self,
        destination: FolderChoice,
        on_progress: impl FnMut(u8, &str),
    ) -> Result<Option<MoveOutcome>, EngineError> {
        let root = self.root.clone().ok_or(EngineError::NoSession)?;
        let dest = match destination {
            FolderChoice::Cancelled => return Ok(None),
            FolderChoice::Selected(path) => path,
        };
        let plan = MovePlan::backup(&root, &dest);
        self.run_external_move(&dest, plan, "Backing up files", on_progress)
            .map(Some)
    }

    fn sources_removed(mode: MoveMode) -> bool {
        mode != MoveMode::Backup
    }

    fn run_external_move(
        &mut self,
        dest: &Path,
        plan: MovePlan,
        activity: &str,
        mut on_progress: impl FnMut(u8, &str),
    ) -> Result<MoveOutcome, EngineError> {
        self.step
            .transition(Step::Exporting)
            .map_err(EngineError::State)?;

        // Validate the destination before touching any file; a blocked
        // destination aborts the whole operation back to review.
        if let Err(e) = self.fs.ensure_dir(dest) {
            self.step
                .transition(Step::Review)
                .map_err(EngineError::State)?;
            let guidance = format!(
                "cannot use {} as destination: {e}; pick a writable folder",
                dest.display()
            );
            self.processing.error = Some(guidance.clone());
            return Err(EngineError::Access(AccessError::Blocked(guidance)));
        }

        self.processing.begin(activity);
        self.processing.is_organizing = true;

        let selected = self.selected_records();
        let sources_removed = Self::sources_removed(plan.mode);
        let processing = &mut self.processing;
        let outcome = mover::execute(&self.fs, &selected, &plan, |progress, name| {
            processing.file_progress(progress, name);
            on_progress(progress, name);
        });

        self.finish_move(&outcome, sources_removed);
        self.step
            .transition(Step::Completed)
            .map_err(EngineError::State)?;
        Ok(outcome)
    }

    /// Drops records for files that are no longer at their scanned path.
    /// Backup runs leave the tree untouched, so nothing is dropped.
    fn finish_move(&mut self, outcome: &MoveOutcome, sources_removed: bool) {
        if sources_removed {
            let untouched: HashSet<&String> = outcome
                .skipped
                .iter()
                .map(|(p, _)| p)
                .chain(outcome.failed.iter().map(|(p, _)| p))
                .collect();
            let selection = self.selection.clone();
            self.records
                .retain(|r| !selection.contains(&r.path) || untouched.contains(&r.path));
            let remaining: HashSet<&str> =
                self.records.iter().map(|r| r.path.as_str()).collect();
            self.selection.retain(|p| remaining.contains(p.as_str()));
        }
        self.processing.is_organizing = false;
    }

    /// Reverses the most recent organize pass and ends the session.
    ///
    /// Single-shot: the log (in memory and on disk) is cleared after the
    /// replay regardless of partial failures, and a second undo without
    /// an intervening organize is a no-op.
    pub fn undo(
        &mut self,
        mut on_progress: impl FnMut(u8, &str),
    ) -> Result<UndoReport, EngineError> {
        let root = self.root.clone().ok_or(EngineError::NoSession)?;

        let log = if self.undo_log.is_empty() {
            UndoLog::load(&self.fs, &root)
                .ok()
                .flatten()
                .unwrap_or_default()
        } else {
            std::mem::take(&mut self.undo_log)
        };
        if log.is_empty() {
            return Ok(UndoReport::default());
        }

        self.processing.begin("Restoring files");
        let processing = &mut self.processing;
        let report = undo::undo(&self.fs, &root, &log, |progress, name| {
            processing.file_progress(progress, name);
            on_progress(progress, name);
        });

        self.undo_log = UndoLog::default();
        let _ = UndoLog::delete(&self.fs, &root);

        // Undo ends the session: the record list no longer matches the
        // tree, so the caller rescans from Idle.
        if self.step.current() == Step::Completed {
            self.step
                .transition(Step::Idle)
                .map_err(EngineError::State)?;
        } else {
            self.step.reset();
        }
        self.root = None;
        self.records.clear();
        self.groups.clear();
        self.marks.clear();
        self.selection.clear();
        Ok(report)
    }

    /// Attaches a root without scanning, so the persisted history of an
    /// earlier process can be replayed through `undo`.
    pub fn attach_root(&mut self, root: &Path) {
        self.root = Some(root.to_path_buf());
    }
}
