#![forbid(unsafe_code)]

mod commands;
mod config;
mod constants;
mod daemon;
mod gui;
mod host;
mod sync;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level as TraceLevel;
use tracing_subscriber::FmtSubscriber;

use config::Settings;

/// Custom short labels for keyboard layouts
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (defaults to the XDG config dir)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Keep layout labels in sync with the settings file (default)
    Run,
    /// Open the preferences window
    Prefs,
    /// List configured keyboard layouts and their labels
    List,
    /// Set a custom label for a layout
    Set {
        #[arg(value_name = "ID")]
        id: String,
        #[arg(value_name = "LABEL")]
        label: String,
    },
    /// Remove the custom label of a layout
    Unset {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Print the labels published by the running daemon
    Status,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let settings_path = cli.config.unwrap_or_else(Settings::default_path);

    match cli.command.unwrap_or(CliCommand::Run) {
        CliCommand::Run => daemon::run(settings_path)?,
        CliCommand::Prefs => gui::run_prefs(settings_path)?,
        CliCommand::List => commands::list(&settings_path)?,
        CliCommand::Set { id, label } => commands::set(&settings_path, &id, &label)?,
        CliCommand::Unset { id } => commands::unset(&settings_path, &id)?,
        CliCommand::Status => {
            let settings = Settings::load_from(&settings_path)?;
            commands::status(settings.daemon.status_file.as_deref())?
        }
    }

    Ok(())
}
