use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::infrastructure::logging::LogConfig;

/// Main configuration structure for the lifecycle scheduler
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Scheduler engine and sweep configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LogConfig,
}

/// Scheduler engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerConfig {
    /// Number of work bodies allowed to run at the same time
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,

    /// Seconds between two sweeps of the task registries
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Run a sweep immediately when the sweep task starts
    #[serde(default = "default_true")]
    pub sweep_on_startup: bool,
}

const fn default_worker_threads() -> usize {
    10
}

const fn default_sweep_interval_secs() -> u64 {
    15
}

const fn default_true() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
            sweep_interval_secs: default_sweep_interval_secs(),
            sweep_on_startup: default_true(),
        }
    }
}

impl SchedulerConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
