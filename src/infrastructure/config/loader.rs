use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project configuration file, relative to the working directory
pub const CONFIG_FILE: &str = "lifecycle-scheduler.yaml";

/// Optional local overrides, relative to the working directory
pub const LOCAL_CONFIG_FILE: &str = "lifecycle-scheduler.local.yaml";

/// Prefix of environment variable overrides
pub const ENV_PREFIX: &str = "LIFECYCLE_SCHEDULER_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid worker_threads: {0}. Must be at least 1")]
    InvalidWorkerThreads(usize),

    #[error("Invalid sweep_interval_secs: {0}. Must be at least 1")]
    InvalidSweepInterval(u64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. lifecycle-scheduler.yaml
    /// 3. lifecycle-scheduler.local.yaml (optional)
    /// 4. Environment variables (LIFECYCLE_SCHEDULER_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(CONFIG_FILE))
            .merge(Yaml::file(LOCAL_CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.scheduler.worker_threads == 0 {
            return Err(ConfigError::InvalidWorkerThreads(
                config.scheduler.worker_threads,
            ));
        }

        if config.scheduler.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidSweepInterval(
                config.scheduler.sweep_interval_secs,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        Ok(())
    }
}
