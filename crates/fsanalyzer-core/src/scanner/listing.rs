/// Directory lister: one level, non-recursive.
///
/// Children whose attributes cannot be read are logged and left out of the
/// result; only a failure to open the directory itself is returned to the
/// caller. Entries come back in filesystem enumeration order.
use super::cancel::{CancelToken, CANCEL_CHECK_INTERVAL};
use super::{metadata, open_root};
use crate::error::{DirectoryAccessError, WalkError};
use crate::model::FileRecord;
use std::path::Path;
use tracing::{info, warn};

pub fn list_directory(dir: &Path) -> Result<Vec<FileRecord>, DirectoryAccessError> {
    match list_directory_with_cancel(dir, &CancelToken::new()) {
        Ok(records) => Ok(records),
        Err(WalkError::Directory(err)) => Err(err),
        // Nobody else holds the token.
        Err(WalkError::Cancelled) => unreachable!("listing cancelled without a cancel request"),
    }
}

/// List `dir`, stopping early with [`WalkError::Cancelled`] once `cancel`
/// is tripped. No partial listing is returned.
pub fn list_directory_with_cancel(
    dir: &Path,
    cancel: &CancelToken,
) -> Result<Vec<FileRecord>, WalkError> {
    info!("Listing directory {}", dir.display());
    let read_dir = open_root(dir)?;

    let mut records = Vec::new();
    let mut seen: u64 = 0;
    let mut skipped: u64 = 0;

    for entry_result in read_dir {
        if seen % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
            info!("Listing of {} cancelled after {} entries", dir.display(), seen);
            return Err(WalkError::Cancelled);
        }
        seen += 1;

        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                skipped += 1;
                warn!("Unreadable entry in {}: {err}", dir.display());
                continue;
            }
        };
        match metadata::extract(&entry.path()) {
            Ok(record) => records.push(record),
            Err(err) => {
                skipped += 1;
                warn!("Skipping {err}");
            }
        }
    }

    info!(
        "Listed {}: {} entries, {} skipped",
        dir.display(),
        records.len(),
        skipped
    );
    Ok(records)
}
