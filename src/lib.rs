//! sortify - reversible, category-based file reorganization
//!
//! This library scans a directory tree into flat file records, flags
//! same-size duplicate candidates, resolves a category per file (custom
//! rules, then an AI classifier, then a local extension table), and moves
//! selected files into category subfolders with a persisted undo log.
//! A linear step machine sequences the whole flow.

pub mod category;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod dupes;
pub mod engine;
pub mod fs_ops;
pub mod mover;
pub mod output;
pub mod resolver;
pub mod rules;
pub mod state;
pub mod undo;
pub mod walker;

pub use category::Category;
pub use classifier::{Classifier, ClassifyError, HttpClassifier, NullClassifier};
pub use config::{ConfigError, RulesFile, Settings};
pub use dupes::{DeletionMarks, DuplicateGroup, group_by_size};
pub use engine::{AccessError, Engine, EngineError, FolderChoice, PurgeReport};
pub use fs_ops::{FsOps, LocalFs};
pub use mover::{MoveMode, MoveOutcome, MovePlan};
pub use rules::{CustomRule, RuleKind};
pub use state::{ProcessingState, StateError, Step, StepMachine};
pub use undo::{UndoLog, UndoRecord, UndoReport};
pub use walker::{FileRecord, ScanError};

pub use cli::{Cli, run};
