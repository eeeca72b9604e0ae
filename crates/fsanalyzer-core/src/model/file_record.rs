/// Immutable snapshot of one filesystem entry as seen at scan time.
///
/// Records are produced by the metadata extractor from a single
/// non-following attribute read. Directory records carry a size of 0;
/// recursive totals live in a separate [`DirectoryStats`](super::DirectoryStats)
/// value and are joined to the record by the caller through
/// [`DirectorySummary`](super::DirectorySummary).
use chrono::NaiveDateTime;
use compact_str::CompactString;
use serde::Serialize;

use super::size::format_size;

/// Owner string used when the owning user cannot be resolved.
pub const OWNER_UNKNOWN: &str = "unknown";

/// The entry's own type. Symlinks are never dereferenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    /// Sockets, FIFOs, device nodes.
    Other,
}

impl EntryKind {
    pub fn from_file_type(ft: std::fs::FileType) -> Self {
        if ft.is_symlink() {
            Self::Symlink
        } else if ft.is_dir() {
            Self::Directory
        } else if ft.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }

    /// Short label for listings.
    pub fn label(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "dir",
            Self::Symlink => "link",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Final path component only.
    pub name: CompactString,
    /// Path exactly as it was handed to the extractor.
    pub path: String,
    pub absolute_path: String,
    /// Raw byte length from the attribute read; 0 for directories.
    pub size_bytes: u64,
    pub is_directory: bool,
    pub kind: EntryKind,
    /// Local-timezone wall-clock time, `None` when the platform has no value.
    pub created_at: Option<NaiveDateTime>,
    pub modified_at: Option<NaiveDateTime>,
    /// Owning user name, or [`OWNER_UNKNOWN`].
    pub owner: CompactString,
    /// Lowercase, without the dot. Always `None` for directories.
    pub extension: Option<CompactString>,
}

impl FileRecord {
    pub fn formatted_size(&self) -> String {
        format_size(self.size_bytes)
    }

    pub fn owner_is_known(&self) -> bool {
        self.owner != OWNER_UNKNOWN
    }
}

/// Extension of `name`: the text after the last `.` when that dot is
/// neither the first nor the last character. Lowercased.
///
/// `archive.tar.gz` → `gz`, `.gitignore` → none, `notes.` → none.
pub fn extension_of(name: &str, is_directory: bool) -> Option<CompactString> {
    if is_directory {
        return None;
    }
    let dot = name.rfind('.')?;
    if dot == 0 || dot + 1 >= name.len() {
        return None;
    }
    Some(CompactString::new(name[dot + 1..].to_lowercase()))
}
