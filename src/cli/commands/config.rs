//! Config command: prints the effective, merged configuration.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

#[derive(Debug, Serialize)]
struct ConfigOutput<'a> {
    #[serde(flatten)]
    config: &'a Config,
    #[serde(skip)]
    yaml: String,
}

impl CommandOutput for ConfigOutput<'_> {
    fn to_human(&self) -> String {
        self.yaml.trim_end().to_string()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.config).unwrap_or_default()
    }
}

pub fn execute(config: &Config, json_mode: bool) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to render configuration")?;
    output(&ConfigOutput { config, yaml }, json_mode);
    Ok(())
}
