use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{KpError, Result};

pub const DEFAULT_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_GPU_HISTORY: usize = 60;

/// Sampler configuration.
///
/// Every field has a default, so a JSON file only needs the keys it changes:
///
/// ```json
/// { "interval_ms": 500, "gpu_history_capacity": 120 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Delay between collection passes
    pub interval_ms: u64,
    /// Capacity of the GPU usage ring buffer
    pub gpu_history_capacity: usize,
    /// Fall back to `su` when a node cannot be read directly
    pub shell_fallback: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            gpu_history_capacity: DEFAULT_GPU_HISTORY,
            shell_fallback: true,
        }
    }
}

impl SamplerConfig {
    /// Load a JSON config file over the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| {
            KpError::config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config: SamplerConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(KpError::config("interval_ms must be at least 1"));
        }
        if self.gpu_history_capacity == 0 {
            return Err(KpError::config("gpu_history_capacity must be at least 1"));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}
