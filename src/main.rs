#![forbid(unsafe_code)]

mod applier;
mod bridge;
mod color;
mod config;
mod constants;
mod daemon;
mod editor;
mod gui;
mod ipc;
mod types;
mod window;
mod x11_utils;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{Level as TraceLevel, info};
use tracing_subscriber::FmtSubscriber;

use config::{JsonFileStore, SettingsStore};
use constants::storage;
use window::x11::Target;

#[derive(Parser, Debug)]
#[command(
    name = "focus-veil",
    version,
    about = "Keep a window on top and restyle it as it gains and loses focus"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Attach to a window and follow its focus (default)
    Run(RunArgs),
    /// Open the settings window for a running daemon
    Settings,
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Target window id (decimal or 0x-hex)
    #[arg(long, value_parser = x11_utils::parse_window_id, conflicts_with = "class")]
    window: Option<u32>,

    /// Target the first window whose WM_CLASS matches
    #[arg(long)]
    class: Option<String>,

    /// Store settings under this directory instead of the user config dir
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

impl RunArgs {
    fn target(&self) -> Target {
        match (&self.window, &self.class) {
            (Some(id), _) => Target::Id(*id),
            (None, Some(class)) => Target::Class(class.clone()),
            (None, None) => Target::Active,
        }
    }

    fn store(&self) -> SettingsStore {
        let backend = match &self.data_dir {
            Some(dir) => JsonFileStore::in_dir(dir, storage::PLUGIN_ID),
            None => JsonFileStore::for_plugin(storage::PLUGIN_ID),
        };
        info!(path = %backend.path().display(), "Settings location");
        SettingsStore::new(backend)
    }
}

fn main() -> Result<()> {
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
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => daemon::run(args.target(), args.store()),
        Commands::Settings => gui::run_gui(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_targets_active_window() {
        let cli = Cli::try_parse_from(["focus-veil"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(RunArgs::default().target(), Target::Active);
    }

    #[test]
    fn test_run_args() {
        let cli = Cli::try_parse_from(["focus-veil", "run", "--window", "0x1e00004"]).unwrap();
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.target(), Target::Id(0x1e00004));

        let cli = Cli::try_parse_from(["focus-veil", "run", "--class", "Obsidian"]).unwrap();
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.target(), Target::Class("Obsidian".to_string()));
    }

    #[test]
    fn test_window_and_class_conflict() {
        assert!(Cli::try_parse_from(["focus-veil", "run", "--window", "7", "--class", "x"]).is_err());
        assert!(Cli::try_parse_from(["focus-veil", "run", "--window", "0"]).is_err());
    }
}
