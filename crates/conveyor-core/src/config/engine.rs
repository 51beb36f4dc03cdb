//! Job engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Job engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Default worker-lock duration in milliseconds for a single
    /// execution attempt. A running job whose lock has expired becomes
    /// eligible for reclaim.
    #[serde(default = "default_worker_timeout_ms")]
    pub worker_timeout_ms: u64,
    /// Default maximum execution attempts per job.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,
    /// Default number of concurrently running jobs per batch chunk.
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
    /// Suggested interval in seconds between expired-lock reclaim
    /// sweeps. The host application owns the timer.
    #[serde(default = "default_reclaim_interval")]
    pub reclaim_interval_seconds: u64,
}

impl EngineConfig {
    /// The worker-lock duration as a [`Duration`].
    pub fn worker_timeout(&self) -> Duration {
        Duration::from_millis(self.worker_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_timeout_ms: default_worker_timeout_ms(),
            max_attempts: default_max_attempts(),
            batch_concurrency: default_batch_concurrency(),
            reclaim_interval_seconds: default_reclaim_interval(),
        }
    }
}

fn default_worker_timeout_ms() -> u64 {
    300_000
}

fn default_max_attempts() -> i32 {
    3
}

fn default_batch_concurrency() -> usize {
    3
}

fn default_reclaim_interval() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.worker_timeout_ms, 300_000);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.batch_concurrency, 3);
    }

    #[test]
    fn test_partial_deserialization_fills_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"max_attempts": 5}"#).unwrap();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.batch_concurrency, 3);
    }
}
