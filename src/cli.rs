//! Command-line interface.
//!
//! Presentation glue over the engine: parses commands, loads settings and
//! the rules document, picks a classifier, and renders progress and
//! reports. All move/undo semantics live in the engine and its modules.

use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::classifier::{Classifier, HttpClassifier, NullClassifier};
use crate::config::{RulesFile, Settings};
use crate::engine::{Engine, FolderChoice};
use crate::fs_ops::LocalFs;
use crate::output::OutputFormatter;
use crate::state::Step;
use crate::undo::UndoLog;

#[derive(Debug, Parser)]
#[command(
    name = "sortify",
    version,
    about = "Organize a folder into category subfolders, with duplicate detection and undo"
)]
pub struct Cli {
    /// Path to a settings file (defaults to the usual lookup cascade)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, clap::Args)]
pub struct ScanArgs {
    /// Folder to work on
    pub dir: PathBuf,

    /// Rules document (JSON: version, customRules, excludedFolders)
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Extra folder names to exclude (repeatable)
    #[arg(long = "exclude", value_name = "NAME")]
    pub exclude: Vec<String>,

    /// Skip the AI classifier and rely on rules plus the extension table
    #[arg(long)]
    pub no_ai: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan and report categories and duplicate candidates; changes nothing
    Scan(ScanArgs),

    /// Move classified files into category subfolders (revert with `undo`)
    Organize {
        #[command(flatten)]
        scan: ScanArgs,

        /// Show what would happen without moving anything
        #[arg(long)]
        dry_run: bool,

        /// For each duplicate group, keep the first file and delete the rest
        #[arg(long)]
        dedupe: bool,
    },

    /// Move classified files into category subfolders under another folder
    Export {
        #[command(flatten)]
        scan: ScanArgs,

        /// Destination folder
        #[arg(long)]
        dest: PathBuf,
    },

    /// Copy everything to another folder, preserving layout; deletes nothing
    Backup {
        #[command(flatten)]
        scan: ScanArgs,

        /// Destination folder
        #[arg(long)]
        dest: PathBuf,
    },

    /// Revert the most recent organize pass in a folder
    Undo {
        /// Folder that was organized
        dir: PathBuf,
    },

    /// Write a starter rules document to edit and reuse
    InitRules {
        /// Where to write the JSON document
        path: PathBuf,
    },
}

pub fn run(cli: Cli) -> Result<(), String> {
    let settings =
        Settings::load(cli.config.as_deref()).map_err(|e| format!("Error loading settings: {e}"))?;

    match cli.command {
        Command::Scan(scan) => run_scan(&settings, &scan),
        Command::Organize {
            scan,
            dry_run,
            dedupe,
        } => run_organize(&settings, &scan, dry_run, dedupe),
        Command::Export { scan, dest } => run_export(&settings, &scan, &dest, false),
        Command::Backup { scan, dest } => run_export(&settings, &scan, &dest, true),
        Command::Undo { dir } => run_undo(&dir),
        Command::InitRules { path } => run_init_rules(&path),
    }
}

fn load_rules(args: &ScanArgs) -> Result<RulesFile, String> {
    match &args.rules {
        Some(path) => RulesFile::load(path).map_err(|e| format!("Error loading rules: {e}")),
        None => Ok(RulesFile::default()),
    }
}

fn build_classifier(settings: &Settings, no_ai: bool) -> Result<Box<dyn Classifier>, String> {
    if no_ai {
        return Ok(Box::new(NullClassifier));
    }
    match settings.api_key() {
        Some(key) => {
            let classifier = HttpClassifier::new(&key, &settings.classifier.model)
                .map_err(|e| format!("Could not set up the classifier: {e}"))?;
            Ok(Box::new(classifier))
        }
        None => {
            OutputFormatter::warning(&format!(
                "{} is not set; categorizing by rules and extension only",
                settings.classifier.api_key_env
            ));
            Ok(Box::new(NullClassifier))
        }
    }
}

/// Scans and classifies, leaving the engine ready for a move operation.
fn scan_and_classify(
    settings: &Settings,
    args: &ScanArgs,
    dedupe: bool,
) -> Result<Engine<LocalFs>, String> {
    let rules = load_rules(args)?;
    let exclusions: HashSet<String> = rules.exclusion_set(settings, &args.exclude);
    let classifier = build_classifier(settings, args.no_ai)?;

    let mut engine = Engine::new(LocalFs);
    OutputFormatter::info(&format!("Scanning {}", args.dir.display()));
    engine
        .begin_scan(FolderChoice::Selected(args.dir.clone()), &exclusions)
        .map_err(|e| e.to_string())?;
    OutputFormatter::success(&format!("{} files found", engine.records().len()));

    if engine.step() == Step::Duplicates {
        OutputFormatter::duplicate_groups(engine.groups());
        if dedupe {
            let group_ids: Vec<String> = engine.groups().iter().map(|g| g.id.clone()).collect();
            for id in group_ids {
                let keep = engine
                    .groups()
                    .iter()
                    .find(|g| g.id == id)
                    .and_then(|g| g.paths.first().cloned());
                if let Some(keep_path) = keep {
                    engine.mark_keep(&id, &keep_path);
                }
            }
        }
        let report = engine.purge_marked().map_err(|e| e.to_string())?;
        OutputFormatter::purge_report(&report);
    }

    engine.classify(&rules.custom_rules, classifier.as_ref());
    OutputFormatter::category_summary(engine.records());
    Ok(engine)
}

fn run_scan(settings: &Settings, args: &ScanArgs) -> Result<(), String> {
    let engine = scan_and_classify(settings, args, false)?;
    OutputFormatter::info(&format!(
        "\n{} of {} files would be organized",
        engine.selection().len(),
        engine.records().len()
    ));
    Ok(())
}

fn run_organize(
    settings: &Settings,
    args: &ScanArgs,
    dry_run: bool,
    dedupe: bool,
) -> Result<(), String> {
    let mut engine = scan_and_classify(settings, args, dedupe)?;

    if dry_run {
        OutputFormatter::dry_run_plan(engine.records(), engine.selection().len());
        return Ok(());
    }

    let bar = OutputFormatter::progress_bar("Organizing");
    let outcome = engine
        .organize(|progress, name| {
            bar.set_position(u64::from(progress));
            bar.set_message(name.to_string());
        })
        .map_err(|e| e.to_string())?;
    bar.finish_and_clear();

    OutputFormatter::move_outcome(&outcome);
    if !outcome.undo.is_empty() {
        OutputFormatter::info(&format!(
            "Revert with: sortify undo {}",
            args.dir.display()
        ));
    }
    Ok(())
}

fn run_export(
    settings: &Settings,
    args: &ScanArgs,
    dest: &Path,
    backup: bool,
) -> Result<(), String> {
    let mut engine = scan_and_classify(settings, args, false)?;

    let activity = if backup { "Backing up" } else { "Exporting" };
    let bar = OutputFormatter::progress_bar(activity);
    let on_progress = |progress: u8, name: &str| {
        bar.set_position(u64::from(progress));
        bar.set_message(name.to_string());
    };
    let choice = FolderChoice::Selected(dest.to_path_buf());
    let outcome = if backup {
        engine.backup(choice, on_progress)
    } else {
        engine.export(choice, on_progress)
    }
    .map_err(|e| e.to_string())?;
    bar.finish_and_clear();

    match outcome {
        Some(outcome) => OutputFormatter::move_outcome(&outcome),
        None => OutputFormatter::info("Nothing to do"),
    }
    Ok(())
}

fn run_undo(dir: &Path) -> Result<(), String> {
    let fs = LocalFs;
    let log = UndoLog::load(&fs, dir).map_err(|e| format!("Error: {e}"))?;
    let Some(log) = log else {
        return Err("No previous organization found to undo".to_string());
    };

    OutputFormatter::info(&format!(
        "Undoing the pass from {} ({} files)",
        log.timestamp,
        log.len()
    ));

    let bar = OutputFormatter::progress_bar("Restoring");
    let report = crate::undo::undo(&fs, dir, &log, |progress, name| {
        bar.set_position(u64::from(progress));
        bar.set_message(name.to_string());
    });
    bar.finish_and_clear();

    // Single-shot: the history is cleared even after a partial restore.
    UndoLog::delete(&fs, dir).map_err(|e| format!("Error: {e}"))?;
    OutputFormatter::undo_report(&report);
    Ok(())
}

fn run_init_rules(path: &Path) -> Result<(), String> {
    use crate::category::Category;
    use crate::rules::CustomRule;

    let mut rules = RulesFile::default();
    rules
        .custom_rules
        .push(CustomRule::keyword("example-keyword", "invoice", Category::Documents));
    rules
        .custom_rules
        .push(CustomRule::extension("example-extension", "log", Category::Junk));
    rules.excluded_folders.push("node_modules".to_string());
    rules
        .save(path)
        .map_err(|e| format!("Could not write rules document: {e}"))?;
    OutputFormatter::success(&format!("Starter rules written to {}", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn organize_flags_parse() {
        let cli = Cli::parse_from([
            "sortify",
            "organize",
            "/tmp/folder",
            "--dry-run",
            "--no-ai",
            "--exclude",
            "tmp",
            "--exclude",
            "cache",
        ]);
        match cli.command {
            Command::Organize {
                scan,
                dry_run,
                dedupe,
            } => {
                assert_eq!(scan.dir, PathBuf::from("/tmp/folder"));
                assert!(dry_run);
                assert!(!dedupe);
                assert!(scan.no_ai);
                assert_eq!(scan.exclude, vec!["tmp", "cache"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn export_requires_dest() {
        assert!(Cli::try_parse_from(["sortify", "export", "/tmp/folder"]).is_err());
        assert!(
            Cli::try_parse_from(["sortify", "export", "/tmp/folder", "--dest", "/tmp/out"])
                .is_ok()
        );
    }
}
