/// Aggregate results and the views that join them to records.
use serde::Serialize;
use std::fmt;

use super::file_record::FileRecord;
use super::size::format_size;

/// Recursive totals for one directory subtree.
///
/// `directory_count` never includes the walked root itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct DirectoryStats {
    pub total_size_bytes: u64,
    pub file_count: u64,
    pub directory_count: u64,
}

impl DirectoryStats {
    pub fn new(total_size_bytes: u64, file_count: u64, directory_count: u64) -> Self {
        Self {
            total_size_bytes,
            file_count,
            directory_count,
        }
    }

    /// Files plus directories below the root.
    pub fn entry_count(&self) -> u64 {
        self.file_count + self.directory_count
    }

    pub fn formatted_size(&self) -> String {
        format_size(self.total_size_bytes)
    }
}

impl fmt::Display for DirectoryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DirectoryStats{{files={}, dirs={}, size={}}}",
            self.file_count, self.directory_count, self.total_size_bytes
        )
    }
}

/// A directory record joined with the stats of its subtree.
///
/// The record stays untouched; callers that want "size of this folder"
/// read it from here instead of patching the record in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectorySummary {
    pub record: FileRecord,
    pub stats: DirectoryStats,
}

impl DirectorySummary {
    /// Join a record with its stats. Returns `None` for non-directories.
    pub fn join(record: FileRecord, stats: DirectoryStats) -> Option<Self> {
        record.is_directory.then_some(Self { record, stats })
    }

    pub fn total_size_bytes(&self) -> u64 {
        self.stats.total_size_bytes
    }

    pub fn child_file_count(&self) -> u64 {
        self.stats.file_count
    }

    pub fn child_directory_count(&self) -> u64 {
        self.stats.directory_count
    }
}

/// Counts over one flat listing (immediate children only).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ListingSummary {
    pub directories: u64,
    pub files: u64,
    /// Sum of the non-directory sizes in the listing.
    pub total_size_bytes: u64,
}

impl ListingSummary {
    pub fn from_records(records: &[FileRecord]) -> Self {
        records.iter().fold(Self::default(), |mut acc, r| {
            if r.is_directory {
                acc.directories += 1;
            } else {
                acc.files += 1;
                acc.total_size_bytes += r.size_bytes;
            }
            acc
        })
    }
}

impl fmt::Display for ListingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} folders, {} files, total size: {}",
            self.directories,
            self.files,
            format_size(self.total_size_bytes)
        )
    }
}
