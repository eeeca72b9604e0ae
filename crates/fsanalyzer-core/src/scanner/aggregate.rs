/// Recursive aggregator: walks a subtree and sums sizes and counts.
///
/// The walk runs serially on the calling thread (the gateway already gives
/// every task its own worker) using `jwalk` with symlinks left unfollowed,
/// so cycles are impossible and no entry is counted twice.
///
/// # Counting rules
///
/// - The root is never counted.
/// - A directory counts only if its children could be read; an unreadable
///   directory is treated as an inaccessible entry instead.
/// - Everything that is not a directory (regular files, symlinks, special
///   files) counts as a file, sized by its own attributes.
/// - Any per-entry failure bumps the inaccessible counter, is logged, and
///   the walk moves on.
///
/// Which entries get skipped when the tree changes mid-walk is inherently
/// racy; for an unchanged tree the three totals are reproducible exactly.
use super::cancel::{CancelToken, CANCEL_CHECK_INTERVAL};
use super::{metadata, open_root};
use crate::error::{DirectoryAccessError, WalkError};
use crate::model::DirectoryStats;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info, trace, warn};

/// Full result of one walk, including the bookkeeping that is not part of
/// the public [`DirectoryStats`] shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOutcome {
    pub stats: DirectoryStats,
    /// Entries skipped because they could not be read.
    pub inaccessible: u64,
    /// Entries the walk reached, the root included.
    pub visited: u64,
    pub duration: Duration,
}

/// Walk `root` and return its totals.
pub fn aggregate(root: &Path) -> Result<DirectoryStats, DirectoryAccessError> {
    match aggregate_with_cancel(root, &CancelToken::new()) {
        Ok(outcome) => Ok(outcome.stats),
        Err(WalkError::Directory(err)) => Err(err),
        // Nobody else holds the token.
        Err(WalkError::Cancelled) => unreachable!("walk cancelled without a cancel request"),
    }
}

/// Walk `root`, stopping early with [`WalkError::Cancelled`] once `cancel`
/// is tripped.
pub fn aggregate_with_cancel(
    root: &Path,
    cancel: &CancelToken,
) -> Result<AggregateOutcome, WalkError> {
    info!("Collecting statistics for {}", root.display());
    let start = Instant::now();

    // Fail fast on an unusable root before any counting starts.
    drop(open_root(root)?);

    let mut stats = DirectoryStats::default();
    let mut inaccessible: u64 = 0;
    let mut visited: u64 = 0;

    // Directories counted so far, so a late read error can un-count them.
    let mut counted_dirs: HashSet<PathBuf> = HashSet::new();
    // Directories already rejected via `read_children_error`.
    let mut denied_dirs: HashSet<PathBuf> = HashSet::new();

    let walker = jwalk::WalkDir::new(root)
        .skip_hidden(false)
        .follow_links(false)
        .sort(false)
        .parallelism(jwalk::Parallelism::Serial);

    for entry_result in walker {
        if visited % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
            info!(
                "Statistics for {} cancelled after {} entries",
                root.display(),
                visited
            );
            return Err(WalkError::Cancelled);
        }

        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                let err_path = err.path().map(Path::to_path_buf);
                if err_path.as_deref() == Some(root) {
                    // The root became unreadable between the check and the walk.
                    error!("Cannot read {}: {err}", root.display());
                    return Err(DirectoryAccessError::Io {
                        path: root.to_path_buf(),
                        source: io::Error::other(err.to_string()),
                    }
                    .into());
                }
                match err_path {
                    Some(path) if counted_dirs.remove(&path) => {
                        stats.directory_count -= 1;
                        inaccessible += 1;
                        warn!("Inaccessible directory {}: {err}", path.display());
                    }
                    Some(path) if denied_dirs.contains(&path) => {}
                    _ => {
                        visited += 1;
                        inaccessible += 1;
                        warn!("Inaccessible entry: {err}");
                    }
                }
                continue;
            }
        };

        visited += 1;
        if entry.depth == 0 {
            if let Some(err) = &entry.read_children_error {
                error!("Cannot read {}: {err}", root.display());
                return Err(DirectoryAccessError::Io {
                    path: root.to_path_buf(),
                    source: io::Error::other(err.to_string()),
                }
                .into());
            }
            continue;
        }

        let path = entry.path();
        if entry.file_type().is_dir() {
            if let Some(err) = &entry.read_children_error {
                inaccessible += 1;
                warn!("Inaccessible directory {}: {err}", path.display());
                denied_dirs.insert(path);
            } else {
                stats.directory_count += 1;
                trace!("Directory: {}", path.display());
                counted_dirs.insert(path);
            }
            continue;
        }

        match metadata::read_attributes(&path) {
            Ok(meta) => {
                stats.file_count += 1;
                stats.total_size_bytes += meta.len();
                trace!("File: {}, {} bytes", path.display(), meta.len());
            }
            Err(err) => {
                inaccessible += 1;
                warn!("Inaccessible entry: {err}");
            }
        }
    }

    let duration = start.elapsed();
    info!(
        "Statistics for {}: {} files, {} dirs, {} bytes, {} inaccessible ({:?})",
        root.display(),
        stats.file_count,
        stats.directory_count,
        stats.total_size_bytes,
        inaccessible,
        duration
    );

    Ok(AggregateOutcome {
        stats,
        inaccessible,
        visited,
        duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    fn write_bytes(path: &Path, n: usize) {
        fs::File::create(path).unwrap().write_all(&vec![0u8; n]).unwrap();
    }

    #[test]
    fn empty_directory_is_all_zero() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert_eq!(aggregate(tmp.path()).unwrap(), DirectoryStats::default());
    }

    #[test]
    fn nested_tree_is_summed() {
        let tmp = tempfile::TempDir::new().unwrap();
        let a = tmp.path().join("a");
        let b = a.join("b");
        fs::create_dir_all(&b).unwrap();
        write_bytes(&tmp.path().join("top.bin"), 10);
        write_bytes(&a.join("mid.bin"), 20);
        write_bytes(&b.join("low.bin"), 30);

        let stats = aggregate(tmp.path()).unwrap();
        assert_eq!(stats, DirectoryStats::new(60, 3, 2));
    }

    #[test]
    fn root_is_not_counted() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("only")).unwrap();
        let stats = aggregate(tmp.path()).unwrap();
        assert_eq!(stats.directory_count, 1);
        assert_eq!(stats.file_count, 0);
    }

    #[test]
    fn missing_root_fails() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = aggregate(&tmp.path().join("missing")).unwrap_err();
        assert!(matches!(err, DirectoryAccessError::NotFound(_)));
    }

    #[test]
    fn pre_cancelled_walk_stops() {
        let tmp = tempfile::TempDir::new().unwrap();
        write_bytes(&tmp.path().join("x.bin"), 1);
        let token = CancelToken::new();
        token.cancel();
        let err = aggregate_with_cancel(tmp.path(), &token).unwrap_err();
        assert!(matches!(err, WalkError::Cancelled));
    }

    #[test]
    fn visited_accounts_for_every_count() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("p/q")).unwrap();
        write_bytes(&tmp.path().join("p/one"), 5);
        write_bytes(&tmp.path().join("p/q/two"), 7);

        let outcome = aggregate_with_cancel(tmp.path(), &CancelToken::new()).unwrap();
        assert_eq!(
            outcome.stats.entry_count(),
            outcome.visited - outcome.inaccessible - 1
        );
        assert_eq!(outcome.inaccessible, 0);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_counted_but_not_followed() {
        let tmp = tempfile::TempDir::new().unwrap();
        let real = tmp.path().join("real");
        fs::create_dir(&real).unwrap();
        write_bytes(&real.join("data.bin"), 100);
        // A link back to the root would loop forever if followed.
        std::os::unix::fs::symlink(tmp.path(), real.join("loop")).unwrap();

        let stats = aggregate(tmp.path()).unwrap();
        assert_eq!(stats.directory_count, 1);
        assert_eq!(stats.file_count, 2);
        let link_len = fs::symlink_metadata(real.join("loop")).unwrap().len();
        assert_eq!(stats.total_size_bytes, 100 + link_len);
    }
}
