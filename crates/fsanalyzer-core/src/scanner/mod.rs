/// Scanner module: synchronous filesystem operations.
///
/// - [`metadata`] turns one entry into a [`FileRecord`].
/// - [`listing`] enumerates the immediate children of a directory.
/// - [`aggregate`] walks a whole subtree into [`DirectoryStats`].
///
/// Everything here blocks the calling thread. UI and CLI callers go through
/// [`ScanGateway`](crate::gateway::ScanGateway), which runs the same
/// operations on a worker pool.
pub mod aggregate;
pub mod cancel;
pub mod listing;
pub mod metadata;

pub use aggregate::{aggregate, aggregate_with_cancel, AggregateOutcome};
pub use cancel::CancelToken;
pub use listing::{list_directory, list_directory_with_cancel};
pub use metadata::extract;

use crate::error::{AccessError, DirectoryAccessError};
use crate::model::{DirectoryStats, FileRecord};
use std::fs::{self, ReadDir};
use std::io;
use std::path::Path;
use tracing::error;

/// Validate `dir` as a listable directory and open it.
///
/// Symlinks are followed for the root only, so pointing the scanner at a
/// linked folder works the way a user expects.
pub(crate) fn open_root(dir: &Path) -> Result<ReadDir, DirectoryAccessError> {
    let meta = fs::metadata(dir).map_err(|source| {
        let err = if source.kind() == io::ErrorKind::NotFound {
            DirectoryAccessError::NotFound(dir.to_path_buf())
        } else {
            DirectoryAccessError::Io {
                path: dir.to_path_buf(),
                source,
            }
        };
        error!("{err}");
        err
    })?;

    if !meta.is_dir() {
        let err = DirectoryAccessError::NotADirectory(dir.to_path_buf());
        error!("{err}");
        return Err(err);
    }

    fs::read_dir(dir).map_err(|source| {
        let err = DirectoryAccessError::Io {
            path: dir.to_path_buf(),
            source,
        };
        error!("{err}");
        err
    })
}

/// Stateless front door for the synchronous operations.
///
/// Holds no state, so one value can be shared freely between threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scanner;

impl Scanner {
    pub fn new() -> Self {
        Self
    }

    pub fn list_directory(&self, dir: &Path) -> Result<Vec<FileRecord>, DirectoryAccessError> {
        listing::list_directory(dir)
    }

    pub fn get_directory_stats(&self, dir: &Path) -> Result<DirectoryStats, DirectoryAccessError> {
        aggregate::aggregate(dir)
    }

    pub fn scan_file(&self, path: &Path) -> Result<FileRecord, AccessError> {
        metadata::extract(path)
    }
}
