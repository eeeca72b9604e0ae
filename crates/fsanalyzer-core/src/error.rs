/// Error types shared by the scanner and the gateway.
///
/// Per-entry failures ([`AccessError`]) are recovered inside the lister and
/// the aggregator; only root-level ([`DirectoryAccessError`]) and
/// pool-lifecycle ([`GatewayClosedError`]) failures reach the caller.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Attributes of a single entry could not be read (vanished, permission
/// denied, broken link).
#[derive(Debug, Error)]
#[error("cannot read attributes of {}: {source}", path.display())]
pub struct AccessError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl AccessError {
    pub fn new(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// The root of a listing or a walk is unusable.
#[derive(Debug, Error)]
pub enum DirectoryAccessError {
    #[error("directory does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("cannot open directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DirectoryAccessError {
    /// The root path the failure refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound(p) | Self::NotADirectory(p) => p,
            Self::Io { path, .. } => path,
        }
    }
}

/// A task was submitted after `shutdown()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("scan gateway has been shut down")]
pub struct GatewayClosedError;

/// Why a listing or a walk stopped without a result.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error(transparent)]
    Directory(#[from] DirectoryAccessError),

    #[error("walk cancelled")]
    Cancelled,
}

/// Failure delivered through a [`TaskHandle`](crate::gateway::TaskHandle).
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Directory(#[from] DirectoryAccessError),

    /// Forcibly cancelled by shutdown, or discarded before it ran.
    #[error("task was cancelled")]
    Cancelled,

    #[error("task panicked: {0}")]
    Panicked(String),
}

impl From<WalkError> for TaskError {
    fn from(err: WalkError) -> Self {
        match err {
            WalkError::Directory(err) => Self::Directory(err),
            WalkError::Cancelled => Self::Cancelled,
        }
    }
}

impl TaskError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Invalid or unreadable gateway configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("worker count must be at least 1")]
    ZeroWorkers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_error_reports_its_path() {
        let err = DirectoryAccessError::NotADirectory(PathBuf::from("/tmp/file.txt"));
        assert_eq!(err.path(), std::path::Path::new("/tmp/file.txt"));
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn task_error_wraps_directory_error() {
        let err: TaskError = DirectoryAccessError::NotFound(PathBuf::from("/nope")).into();
        assert!(matches!(err, TaskError::Directory(_)));
        assert!(!err.is_cancelled());
        assert!(err.to_string().contains("/nope"));
    }
}
