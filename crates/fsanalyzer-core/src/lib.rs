/// fsanalyzer core: metadata extraction, directory listings, recursive
/// directory statistics and the worker pool that runs them off the caller's
/// thread.
///
/// This crate contains all scanning logic with zero UI dependencies. The
/// CLI binary (and any future frontend) is a thin caller of
/// [`gateway::ScanGateway`] or the synchronous [`scanner::Scanner`].
///
/// # Modules
///
/// - [`model`] — `FileRecord`, `DirectoryStats` and size formatting.
/// - [`scanner`] — synchronous extractor, lister and aggregator.
/// - [`gateway`] — bounded worker pool, task handles, shutdown.
/// - [`platform`] — owner lookup and host information.
/// - [`config`] — gateway configuration.
/// - [`error`] — error kinds shared across the crate.
pub mod config;
pub mod error;
pub mod gateway;
pub mod model;
pub mod platform;
pub mod scanner;

pub use config::GatewayConfig;
pub use error::{AccessError, DirectoryAccessError, GatewayClosedError, TaskError};
pub use gateway::{ScanGateway, ShutdownOutcome, TaskHandle};
pub use model::{DirectoryStats, DirectorySummary, FileRecord};
pub use scanner::Scanner;
