/// Gateway configuration: worker count and shutdown grace period.
///
/// Passed explicitly to [`ScanGateway::new`](crate::gateway::ScanGateway::new);
/// there is no global pool.
use crate::error::ConfigError;
use crate::platform;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// How long `shutdown()` waits for in-flight tasks before cancelling them.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Number of worker threads. Defaults to one per logical processor.
    pub workers: usize,
    pub grace_period: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            workers: platform::available_parallelism().max(1),
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

/// On-disk shape; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    workers: Option<usize>,
    grace_period_secs: Option<u64>,
}

impl GatewayConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Parse `{"workers": N, "grace_period_secs": S}`; absent keys keep defaults.
    pub fn from_json_str(json: &str, origin: &Path) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        let mut config = Self::default();
        if let Some(workers) = file.workers {
            config.workers = workers;
        }
        if let Some(secs) = file.grace_period_secs {
            config.grace_period = Duration::from_secs(secs);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json, path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }
}
