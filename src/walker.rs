/// Recursive directory walker.
///
/// Produces one flat `FileRecord` per file under the scan root, skipping
/// any directory whose name (not path) appears in the exclusion set. A
/// single unreadable directory aborts the whole scan; no partial result is
/// surfaced.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use crate::category::Category;
use crate::fs_ops::{EntryKind, FsOps};
use crate::undo::HISTORY_FILE_NAME;

/// One discovered file. Created once per scan; the `path` (slash-separated,
/// relative to the scan root) is its identity key for that scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    pub path: String,
    pub size: u64,
    /// Milliseconds since the Unix epoch, if the filesystem reports it.
    pub last_modified: Option<i64>,
    /// Lower-cased suffix after the last `.`, empty when there is none.
    pub extension: String,
    pub category: Category,
    /// Set when the category was assigned by hand; the bulk classifier
    /// pass leaves such records alone unless forced.
    #[serde(default)]
    pub manual: bool,
    #[serde(default)]
    pub is_duplicate: bool,
    #[serde(default)]
    pub duplicate_group_id: Option<String>,
}

impl FileRecord {
    /// Extracts the normalized extension from a file name.
    pub fn extension_of(name: &str) -> String {
        match name.rsplit_once('.') {
            Some((_, ext)) => ext.to_lowercase(),
            None => String::new(),
        }
    }
}

/// A directory read failed; the scan is aborted.
#[derive(Debug)]
pub struct ScanError {
    pub path: PathBuf,
    pub source: io::Error,
}

impl ScanError {
    /// Whether the failure was a permission problem on the scan root
    /// itself, as opposed to some directory deeper in the tree.
    pub fn is_root_access_denied(&self, root: &Path) -> bool {
        self.path == root && self.source.kind() == io::ErrorKind::PermissionDenied
    }
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Failed to read directory {}: {}",
            self.path.display(),
            self.source
        )
    }
}

impl std::error::Error for ScanError {}

/// Recursively enumerates all files under `root`.
///
/// Directories whose name exactly matches an entry in `excluded` are not
/// descended into. The undo history file is not reported as a scannable
/// file.
pub fn scan<F: FsOps>(
    fs: &F,
    root: &Path,
    excluded: &HashSet<String>,
) -> Result<Vec<FileRecord>, ScanError> {
    let mut records = Vec::new();
    walk(fs, root, "", excluded, &mut records)?;
    Ok(records)
}

fn walk<F: FsOps>(
    fs: &F,
    dir: &Path,
    rel: &str,
    excluded: &HashSet<String>,
    out: &mut Vec<FileRecord>,
) -> Result<(), ScanError> {
    let entries = fs.list_dir(dir).map_err(|source| ScanError {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let child_rel = if rel.is_empty() {
            entry.name.clone()
        } else {
            format!("{rel}/{}", entry.name)
        };
        match entry.kind {
            EntryKind::Directory => {
                if excluded.contains(&entry.name) {
                    continue;
                }
                walk(fs, &dir.join(&entry.name), &child_rel, excluded, out)?;
            }
            EntryKind::File => {
                if rel.is_empty() && entry.name == HISTORY_FILE_NAME {
                    continue;
                }
                out.push(FileRecord {
                    extension: FileRecord::extension_of(&entry.name),
                    name: entry.name,
                    path: child_rel,
                    size: entry.size,
                    last_modified: entry.modified_ms,
                    category: Category::Unknown,
                    manual: false,
                    is_duplicate: false,
                    duplicate_group_id: None,
                });
            }
        }
    }
    Ok(())
}
