use gatewayctl::cli::{Cli, Command};
use gatewayctl::commands;
use gatewayctl::error::CtlError;
use gatewayctl::logger::initialize as LoggerInitialize;

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::panic::Location;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

const APP_DIR_NAME: &str = "audiogate";

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            match serde_json::to_string(&e) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("{e}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<String, CtlError> {
    let log_dir = cli.log_dir.clone().unwrap_or_else(default_log_dir);

    create_dir_all(&log_dir).map_err(|e| CtlError::Ctl {
        message: format!("Failed to create log directory {}: {e}", log_dir.display()),
        location: ErrorLocation::from(Location::caller()),
    })?;

    // Initialize logger FIRST
    LoggerInitialize(&log_dir)?;
    info!("Log directory: {}", log_dir.display());

    let config = commands::load_config(cli.config_dir.as_deref())?;

    match cli.command {
        Command::Probe(args) => {
            let report = commands::probe(config, &args);
            commands::render_json(&report)
        }
        Command::Config => commands::render_config(&config),
    }
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
        .join("logs")
}
