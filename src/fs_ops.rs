/// Filesystem access boundary.
///
/// The walker, move executor, and undo reverser only touch the disk through
/// this trait. Writes are always whole-content writes; the write has been
/// flushed and closed by the time `write_file` returns, which is what makes
/// the copy-then-delete ordering guarantee meaningful.
use std::io;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Kind of a directory child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One immediate child of a directory.
#[derive(Debug, Clone)]
pub struct DirEntryInfo {
    pub name: String,
    pub kind: EntryKind,
    /// Byte length for files, 0 for directories.
    pub size: u64,
    /// Modification time in milliseconds since the Unix epoch, if available.
    pub modified_ms: Option<i64>,
}

pub trait FsOps {
    /// Enumerates the immediate children of `dir`.
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<DirEntryInfo>>;

    /// Gets or creates `dir`, including intermediate segments.
    fn ensure_dir(&self, dir: &Path) -> io::Result<()>;

    /// Reads the full content of a file.
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Creates or truncates `path` and writes `content` in full.
    fn write_file(&self, path: &Path, content: &[u8]) -> io::Result<()>;

    /// Deletes a file entry.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Whether an entry exists at `path`.
    fn exists(&self, path: &Path) -> bool;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FsOps for LocalFs {
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<DirEntryInfo>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            let kind = if metadata.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            let modified_ms = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as i64);
            entries.push(DirEntryInfo {
                name: entry.file_name().to_string_lossy().to_string(),
                kind,
                size: if metadata.is_dir() { 0 } else { metadata.len() },
                modified_ms,
            });
        }
        // read_dir order is platform-dependent; sort for stable output.
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn ensure_dir(&self, dir: &Path) -> io::Result<()> {
        std::fs::create_dir_all(dir)
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}
