/// Category resolution: local rules first, then the remote classifier,
/// then the extension table.
///
/// The resolver guarantees fallback completeness: whatever the classifier
/// does (succeed, partially answer, or fail outright), every record ends
/// the pass with a deterministic category, possibly `Unknown`.
use std::collections::{HashMap, HashSet};

use crate::category::Category;
use crate::classifier::Classifier;
use crate::rules::{CustomRule, apply_rules};
use crate::walker::FileRecord;

/// Resolves categories for all records.
///
/// Pass 1 evaluates the user rules locally. Pass 2 sends the names of
/// records still `Unknown` to the classifier in one batch and applies its
/// suggestions to records that are still `Unknown`; names the classifier
/// did not answer for fall back to the extension table. Records with a
/// manually assigned category are left untouched.
pub fn resolve(records: &mut [FileRecord], rules: &[CustomRule], classifier: &dyn Classifier) {
    for record in records.iter_mut() {
        if record.manual {
            continue;
        }
        if let Some(category) = apply_rules(&record.name, &record.extension, rules) {
            record.category = category;
        }
    }

    let unknown_names: Vec<String> = records
        .iter()
        .filter(|r| !r.manual && r.category == Category::Unknown)
        .map(|r| r.name.clone())
        .collect();
    if unknown_names.is_empty() {
        return;
    }

    let mapping = remote_or_empty(&unknown_names, classifier);
    for record in records.iter_mut() {
        if record.manual || record.category != Category::Unknown {
            continue;
        }
        record.category = suggested_or_fallback(&mapping, record);
    }
}

/// Re-classifies an explicit subset of records, identified by path.
///
/// Results overwrite whatever category the records had before. Manually
/// categorized records are skipped unless `force` is set; a forced
/// overwrite also clears the manual flag.
pub fn resolve_subset(
    records: &mut [FileRecord],
    paths: &HashSet<String>,
    classifier: &dyn Classifier,
    force: bool,
) {
    let names: Vec<String> = records
        .iter()
        .filter(|r| paths.contains(&r.path) && (force || !r.manual))
        .map(|r| r.name.clone())
        .collect();
    if names.is_empty() {
        return;
    }

    let mapping = remote_or_empty(&names, classifier);
    for record in records.iter_mut() {
        if !paths.contains(&record.path) || (!force && record.manual) {
            continue;
        }
        record.category = suggested_or_fallback(&mapping, record);
        record.manual = false;
    }
}

/// A classifier failure degrades to an empty mapping; the per-record
/// fallback then covers every name. Never surfaced as an error.
fn remote_or_empty(names: &[String], classifier: &dyn Classifier) -> HashMap<String, Category> {
    classifier.classify(names).unwrap_or_default()
}

fn suggested_or_fallback(mapping: &HashMap<String, Category>, record: &FileRecord) -> Category {
    mapping
        .get(&record.name)
        .copied()
        .unwrap_or_else(|| Category::from_extension(&record.extension))
}
