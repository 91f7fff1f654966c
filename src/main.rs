//! Lifecycle scheduler CLI entry point.

use anyhow::Result;
use clap::Parser;

use lifecycle_scheduler::cli::{commands, handle_error, Cli, Commands};
use lifecycle_scheduler::domain::models::Config;
use lifecycle_scheduler::infrastructure::config::ConfigLoader;
use lifecycle_scheduler::infrastructure::logging::LoggerImpl;

fn load_config(cli: &Cli) -> Result<Config> {
    match cli.config {
        Some(ref path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    // Keeps the file writer alive until exit.
    let _logger = match LoggerImpl::init(&config.logging) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Demo(args) => commands::demo::execute(args, &config, cli.json).await,
        Commands::Config => commands::config::execute(&config, cli.json),
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
