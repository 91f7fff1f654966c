//! Command-line interface for the lifecycle scheduler.

pub mod commands;
pub mod display;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::demo::DemoArgs;

#[derive(Parser, Debug)]
#[command(name = "lifecycle-scheduler")]
#[command(about = "Lifecycle task scheduler for exercises, participations and slides", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to lifecycle-scheduler.yaml plus overrides)
    #[arg(short, long, global = true, env = "LIFECYCLE_SCHEDULER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Schedule synthetic exercises, list them and sweep them after they fire
    Demo(DemoArgs),

    /// Print the effective configuration
    Config,
}

/// Print `err` in the requested mode and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let payload = serde_json::json!({
            "error": err.to_string(),
            "causes": err.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>(),
        });
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&payload).unwrap_or_default()
        );
    } else {
        eprintln!("{} {err:#}", console::style("error:").red().bold());
    }
    std::process::exit(1);
}
