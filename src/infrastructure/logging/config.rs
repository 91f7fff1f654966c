use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `logging` section of `lifecycle-scheduler.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default level when `RUST_LOG` is unset. Per-handle sweep lines are
    /// emitted at `debug`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Console format; the rolling file is JSON regardless
    #[serde(default = "default_format")]
    pub format: LogFormat,

    /// Directory for `lifecycle-scheduler.log`; console only when unset
    pub log_dir: Option<PathBuf>,

    /// Log to stderr, keeping stdout for command output
    #[serde(default = "default_true", alias = "enable_stdout")]
    pub enable_console: bool,

    /// When the rolling file starts a new segment
    #[serde(default)]
    pub rotation: RotationPolicy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            log_dir: None,
            enable_console: true,
            rotation: RotationPolicy::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> LogFormat {
    LogFormat::Pretty
}

fn default_true() -> bool {
    true
}
