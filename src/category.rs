/// File categories and the local extension fallback table.
///
/// Categories form a closed set: every file ends up with exactly one of
/// these labels, starting at `Unknown` and settling via custom rules, the
/// remote classifier, or the extension table below.
use serde::{Deserialize, Serialize};

/// A category label assigned to a scanned file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Documents,
    Images,
    Videos,
    Archives,
    Installers,
    Code,
    Audio,
    Junk,
    Unknown,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 9] = [
        Category::Documents,
        Category::Images,
        Category::Videos,
        Category::Archives,
        Category::Installers,
        Category::Code,
        Category::Audio,
        Category::Junk,
        Category::Unknown,
    ];

    /// The human-readable label, which doubles as the destination
    /// subfolder name during organize and export.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Documents => "Documents",
            Category::Images => "Images",
            Category::Videos => "Videos",
            Category::Archives => "Archives",
            Category::Installers => "Installers",
            Category::Code => "Code",
            Category::Audio => "Audio",
            Category::Junk => "Junk",
            Category::Unknown => "Unknown",
        }
    }

    /// Parses a label case-insensitively, e.g. from a classifier response.
    pub fn from_label(label: &str) -> Option<Category> {
        match label.trim().to_lowercase().as_str() {
            "documents" => Some(Category::Documents),
            "images" => Some(Category::Images),
            "videos" => Some(Category::Videos),
            "archives" => Some(Category::Archives),
            "installers" => Some(Category::Installers),
            "code" => Some(Category::Code),
            "audio" => Some(Category::Audio),
            "junk" => Some(Category::Junk),
            "unknown" => Some(Category::Unknown),
            _ => None,
        }
    }

    /// Last-resort classification by file extension.
    ///
    /// The table is fixed; extensions it does not know stay `Unknown`.
    /// `Junk` is never produced here, only by rules or the classifier.
    pub fn from_extension(ext: &str) -> Category {
        match ext.to_lowercase().as_str() {
            "pdf" | "doc" | "docx" | "txt" | "md" | "rtf" | "odt" | "epub" | "xls" | "xlsx"
            | "csv" | "ods" | "ppt" | "pptx" => Category::Documents,
            "jpg" | "jpeg" | "png" | "gif" | "webp" | "svg" | "bmp" | "tiff" | "ico" | "heic" => {
                Category::Images
            }
            "mp4" | "mkv" | "avi" | "mov" | "wmv" | "flv" | "webm" | "m4v" | "mpg" | "mpeg" => {
                Category::Videos
            }
            "zip" | "rar" | "7z" | "tar" | "gz" | "bz2" | "xz" | "iso" => Category::Archives,
            "exe" | "msi" | "dmg" | "pkg" | "deb" | "rpm" | "apk" | "appimage" => {
                Category::Installers
            }
            "rs" | "py" | "js" | "ts" | "java" | "c" | "cpp" | "h" | "go" | "rb" | "php" | "sh"
            | "html" | "css" | "json" | "xml" | "yaml" | "yml" | "toml" | "sql" => Category::Code,
            "mp3" | "wav" | "flac" | "ogg" | "aac" | "m4a" | "wma" | "opus" => Category::Audio,
            _ => Category::Unknown,
        }
    }

    /// Whether organize may move a file with this category.
    /// `Unknown` and `Junk` are never moved, even when selected.
    pub fn is_movable(&self) -> bool {
        !matches!(self, Category::Unknown | Category::Junk)
    }
}
