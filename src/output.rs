//! CLI output formatting.
//!
//! Centralizes colored status lines, the duplicate-group listing, the
//! category summary table, and the per-file progress bar used during
//! moves and undo.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;

use crate::dupes::DuplicateGroup;
use crate::engine::PurgeReport;
use crate::mover::MoveOutcome;
use crate::undo::UndoReport;
use crate::walker::FileRecord;

pub struct OutputFormatter;

impl OutputFormatter {
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Percentage-driven bar for move and undo loops; the engine reports
    /// progress per file, so the bar length is fixed at 100.
    pub fn progress_bar(activity: &str) -> ProgressBar {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:.cyan} [{bar:40.cyan/blue}] {pos}% {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        bar.set_prefix(activity.to_string());
        bar
    }

    /// Lists duplicate groups with their members.
    pub fn duplicate_groups(groups: &[DuplicateGroup]) {
        if groups.is_empty() {
            return;
        }
        Self::header(&format!(
            "{} duplicate group{} (same byte size, contents not compared)",
            groups.len(),
            if groups.len() == 1 { "" } else { "s" }
        ));
        for group in groups {
            println!(
                "  {} ({} bytes, {} files)",
                group.id.yellow(),
                group.size,
                group.paths.len()
            );
            for path in &group.paths {
                println!("    - {path}");
            }
        }
    }

    /// Category summary over the current record list.
    pub fn category_summary(records: &[FileRecord]) {
        Self::header("CATEGORIES");

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for record in records {
            *counts.entry(record.category.dir_name()).or_insert(0) += 1;
        }
        let mut rows: Vec<_> = counts.into_iter().collect();
        rows.sort_by_key(|&(name, _)| name);

        let width = rows
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max(8);

        for (name, count) in &rows {
            println!(
                "  {:<width$} {} {}",
                name,
                count.to_string().green(),
                if *count == 1 { "file" } else { "files" },
            );
        }
        println!(
            "  {:<width$} {} files",
            "total".bold(),
            records.len().to_string().green().bold(),
        );
    }

    pub fn move_outcome(outcome: &MoveOutcome) {
        Self::success(&format!(
            "{} file{} moved",
            outcome.moved,
            if outcome.moved == 1 { "" } else { "s" }
        ));
        if !outcome.skipped.is_empty() {
            Self::info(&format!("{} skipped:", outcome.skipped.len()));
            for (path, reason) in &outcome.skipped {
                println!("    - {path}: {reason}");
            }
        }
        if !outcome.failed.is_empty() {
            Self::warning(&format!("{} failed:", outcome.failed.len()));
            for (path, reason) in &outcome.failed {
                eprintln!("    - {path}: {reason}");
            }
        }
    }

    pub fn purge_report(report: &PurgeReport) {
        if report.deleted > 0 {
            Self::success(&format!(
                "{} duplicate{} deleted",
                report.deleted,
                if report.deleted == 1 { "" } else { "s" }
            ));
        }
        for (path, reason) in &report.failed {
            Self::warning(&format!("could not delete {path}: {reason}"));
        }
    }

    pub fn undo_report(report: &UndoReport) {
        Self::success(&format!(
            "{} file{} restored",
            report.restored,
            if report.restored == 1 { "" } else { "s" }
        ));
        if !report.skipped.is_empty() {
            Self::info(&format!("{} skipped:", report.skipped.len()));
            for (name, reason) in &report.skipped {
                println!("    - {name}: {reason}");
            }
        }
        if !report.failed.is_empty() {
            Self::warning(&format!("{} failed:", report.failed.len()));
            for (name, reason) in &report.failed {
                eprintln!("    - {name}: {reason}");
            }
        }
    }

    /// What organize would do, without doing it.
    pub fn dry_run_plan(records: &[FileRecord], selection_len: usize) {
        Self::header("DRY RUN");
        for record in records {
            if record.category.is_movable() {
                println!(
                    "  {} → {}/",
                    record.path,
                    record.category.dir_name().cyan()
                );
            } else {
                println!(
                    "  {} {} ({})",
                    record.path,
                    "stays".yellow(),
                    record.category.dir_name()
                );
            }
        }
        println!(
            "\n{}",
            format!("[DRY RUN] {selection_len} files selected; nothing was moved.").yellow()
        );
    }
}
