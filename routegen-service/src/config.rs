//! Generator configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::GeneratorError;

/// Settings of the routing generator and the `routegen` binary.
///
/// Every field has a default, so an empty JSON object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Delay between attempts after a failed fetch or build.
    pub retry_interval_ms: u64,
    /// Re-fetch the topology this often even without a change notification.
    pub refresh_interval_ms: Option<u64>,
    /// Log every n-th consecutive failure at `warn`; the others go to `debug`.
    pub failure_log_interval: u32,
    /// JSON topology snapshot read by the file source.
    pub topology_path: Option<PathBuf>,
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub log_level: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            retry_interval_ms: 5_000,
            refresh_interval_ms: None,
            failure_log_interval: 10,
            topology_path: None,
            log_level: None,
        }
    }
}

impl GeneratorConfig {
    /// Read and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GeneratorError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| config_error("read", path, e))?;
        let config: Self =
            serde_json::from_str(&content).map_err(|e| config_error("parse", path, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the generator cannot run with.
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if self.retry_interval_ms == 0 {
            return Err(GeneratorError::Config("retry_interval_ms must be positive".to_string()));
        }
        if self.refresh_interval_ms == Some(0) {
            return Err(GeneratorError::Config("refresh_interval_ms must be positive".to_string()));
        }
        Ok(())
    }

    /// Delay between attempts after a failure.
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    /// Period of unsolicited refreshes, if any.
    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval_ms.map(Duration::from_millis)
    }
}

fn config_error(action: &str, path: &Path, err: impl std::fmt::Display) -> GeneratorError {
    GeneratorError::Config(format!("failed to {action} {}: {err}", path.display()))
}
