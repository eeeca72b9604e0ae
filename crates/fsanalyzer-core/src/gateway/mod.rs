/// Async task gateway: non-blocking entry points for listings and stats.
///
/// A [`ScanGateway`] owns one [`WorkerPool`] built from an explicit
/// [`GatewayConfig`]. Each submission runs exactly one listing or one
/// aggregation on a worker and hands back a [`TaskHandle`]; failures arrive
/// through the handle, never as a panic or error on the submitting thread.
/// The only error a submission itself can return is [`GatewayClosedError`].
///
/// Concurrent requests share nothing: two aggregations of the same folder
/// walk it twice.
pub mod pool;
pub mod task;

pub use pool::{ShutdownOutcome, WorkerPool};
pub use task::{task_pair, Completer, TaskHandle};

use crate::config::GatewayConfig;
use crate::error::{ConfigError, GatewayClosedError, TaskError};
use crate::model::{DirectoryStats, FileRecord};
use crate::scanner::{self, AggregateOutcome, CancelToken};
use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, error};

/// The gateway could not be started.
#[derive(Debug, Error)]
pub enum GatewayStartError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] io::Error),
}

pub struct ScanGateway {
    pool: WorkerPool,
    config: GatewayConfig,
}

impl ScanGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayStartError> {
        config.validate()?;
        let pool = WorkerPool::new(config.workers)?;
        Ok(Self { pool, config })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// List the immediate children of `dir` on a worker.
    pub fn list_directory_async(
        &self,
        dir: impl Into<PathBuf>,
    ) -> Result<TaskHandle<Vec<FileRecord>>, GatewayClosedError> {
        let dir = dir.into();
        self.spawn("list", dir.clone(), move |cancel| {
            scanner::list_directory_with_cancel(&dir, cancel).map_err(TaskError::from)
        })
    }

    /// Aggregate the subtree under `dir` on a worker.
    pub fn get_directory_stats_async(
        &self,
        dir: impl Into<PathBuf>,
    ) -> Result<TaskHandle<DirectoryStats>, GatewayClosedError> {
        let dir = dir.into();
        self.spawn("stats", dir.clone(), move |cancel| {
            scanner::aggregate_with_cancel(&dir, cancel)
                .map(|outcome| outcome.stats)
                .map_err(TaskError::from)
        })
    }

    /// Like [`get_directory_stats_async`](Self::get_directory_stats_async)
    /// but keeps the walk's bookkeeping (inaccessible count, duration).
    pub fn aggregate_async(
        &self,
        dir: impl Into<PathBuf>,
    ) -> Result<TaskHandle<AggregateOutcome>, GatewayClosedError> {
        let dir = dir.into();
        self.spawn("aggregate", dir.clone(), move |cancel| {
            scanner::aggregate_with_cancel(&dir, cancel).map_err(TaskError::from)
        })
    }

    /// Stop accepting work, wait up to the configured grace period, then
    /// cancel what is left. Later calls return
    /// [`ShutdownOutcome::AlreadyClosed`].
    pub fn shutdown(&self) -> ShutdownOutcome {
        self.pool.shutdown(self.config.grace_period)
    }

    fn spawn<T, F>(
        &self,
        kind: &'static str,
        path: PathBuf,
        op: F,
    ) -> Result<TaskHandle<T>, GatewayClosedError>
    where
        T: Send + 'static,
        F: FnOnce(&CancelToken) -> Result<T, TaskError> + Send + 'static,
    {
        if self.pool.is_closed() {
            return Err(GatewayClosedError);
        }
        let (completer, handle) = task_pair();
        debug!("Queueing {kind} task for {}", path.display());

        self.pool.submit(Box::new(move |cancel: &CancelToken| {
            let result = match panic::catch_unwind(AssertUnwindSafe(|| op(cancel))) {
                Ok(result) => result,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    error!("{kind} task for {} panicked: {message}", path.display());
                    Err(TaskError::Panicked(message))
                }
            };
            debug!("Finished {kind} task for {}", path.display());
            completer.complete(result);
        }))?;

        Ok(handle)
    }
}

impl Drop for ScanGateway {
    /// Dropping without `shutdown()` abandons outstanding work: queued tasks
    /// resolve as cancelled and running walks stop at their next poll.
    fn drop(&mut self) {
        if !self.pool.is_closed() {
            self.pool.abort();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
