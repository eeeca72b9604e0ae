/// Metadata extractor: one attribute read per entry, turned into a
/// [`FileRecord`].
///
/// Attributes are always read with `symlink_metadata`, so a link is
/// reported as a link and never followed. Owner lookup is best-effort and
/// never fails the extraction.
use crate::error::AccessError;
use crate::model::{extension_of, EntryKind, FileRecord, OWNER_UNKNOWN};
use crate::platform;
use chrono::{DateTime, Local, NaiveDateTime};
use compact_str::CompactString;
use std::fs::{self, Metadata};
use std::path::Path;
use std::time::SystemTime;
use tracing::{trace, warn};

/// Read the entry's own attributes without following symlinks.
pub fn read_attributes(path: &Path) -> Result<Metadata, AccessError> {
    fs::symlink_metadata(path).map_err(|source| AccessError::new(path, source))
}

/// Build a record for `path` from a fresh attribute read.
pub fn extract(path: &Path) -> Result<FileRecord, AccessError> {
    let meta = read_attributes(path)?;
    Ok(record_from_metadata(path, &meta))
}

/// Build a record from attributes the caller already holds.
pub fn record_from_metadata(path: &Path, meta: &Metadata) -> FileRecord {
    let kind = EntryKind::from_file_type(meta.file_type());
    let is_directory = kind == EntryKind::Directory;
    let name = entry_name(path);

    let owner = match platform::owner_name(meta) {
        Some(owner) => owner,
        None => {
            warn!("Could not resolve owner of {}", path.display());
            CompactString::new(OWNER_UNKNOWN)
        }
    };

    let extension = extension_of(&name, is_directory);
    let record = FileRecord {
        path: path.to_string_lossy().into_owned(),
        absolute_path: absolute_path(path),
        size_bytes: if is_directory { 0 } else { meta.len() },
        is_directory,
        kind,
        created_at: meta.created().ok().map(to_local),
        modified_at: meta.modified().ok().map(to_local),
        owner,
        extension,
        name,
    };
    trace!(
        "Extracted {} (kind: {}, size: {})",
        record.path,
        kind.label(),
        record.size_bytes
    );
    record
}

/// Final path component; falls back to the whole path for roots like `/`.
fn entry_name(path: &Path) -> CompactString {
    match path.file_name() {
        Some(name) => CompactString::new(name.to_string_lossy()),
        None => CompactString::new(path.to_string_lossy()),
    }
}

fn absolute_path(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

fn to_local(time: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(time).naive_local()
}
