use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Logging and notification settings for a document store.
///
/// Loaded from TOML; missing fields take their defaults.
///
/// ```toml
/// log_reads = true
/// slow_operation_threshold_ms = 5000
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Log successful reads at `debug`.
    pub log_reads: bool,
    /// Log successful writes at `info`.
    pub log_writes: bool,
    /// Operations slower than this are logged at `warn`.
    pub slow_operation_threshold_ms: u64,
    /// Buffered change notifications per subscriber.
    pub change_channel_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            log_reads: false,
            log_writes: true,
            slow_operation_threshold_ms: 30_000,
            change_channel_capacity: 1024,
        }
    }
}

impl StoreConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> StoreResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| StoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Reject settings the store cannot run with.
    pub fn validate(&self) -> StoreResult<()> {
        if self.change_channel_capacity == 0 {
            return Err(StoreError::Config(
                "change_channel_capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// `slow_operation_threshold_ms` as a `Duration`.
    pub fn slow_operation_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_operation_threshold_ms)
    }
}
