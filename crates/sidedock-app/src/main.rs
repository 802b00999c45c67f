//! sidedock: docking simulation for window hosts without native docking.
//!
//! The binary drives the engine against an in-memory host, which makes it
//! useful for trying out configurations and watching the engine's logs.

mod cli;
mod simulation;

use std::path::PathBuf;

use sidedock_config::toml_loader;
use sidedock_config::{config_to_json, DockConfig, ReloadManager, SharedConfig};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::cli::Command;

/// Resolve the config file: the `--config` override or the platform default.
fn config_path(override_path: Option<&str>) -> Option<PathBuf> {
    match override_path {
        Some(path) => Some(PathBuf::from(path)),
        None => toml_loader::default_config_path().ok(),
    }
}

fn load_config(path: Option<&PathBuf>, explicit: bool) -> DockConfig {
    let loaded = match path {
        Some(path) if explicit => toml_loader::load_from_path(path),
        Some(path) => toml_loader::load_or_create(path),
        None => Ok(DockConfig::default()),
    };
    loaded.unwrap_or_else(|e| {
        eprintln!("sidedock: config load failed, using defaults: {e}");
        DockConfig::default()
    })
}

fn init_logging(cli_level: Option<&str>, config: &DockConfig) {
    let directive = cli_level
        .map(str::to_owned)
        .unwrap_or_else(|| format!("sidedock={}", config.logging.level.as_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                directive
                    .parse()
                    .unwrap_or_else(|_| LevelFilter::INFO.into()),
            ),
        )
        .init();
}

#[tokio::main]
async fn main() {
    let args = cli::parse();

    let path = config_path(args.config.as_deref());
    let config = load_config(path.as_ref(), args.config.is_some());
    init_logging(args.log_level.as_deref(), &config);

    tracing::info!("sidedock v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &path {
        tracing::debug!("using config file {}", path.display());
    }

    let result = match args.command.unwrap_or(Command::Run(Default::default())) {
        Command::Run(run) => {
            let shared = match path {
                Some(path) => ReloadManager::start(path).await,
                None => SharedConfig::new(config),
            };
            simulation::run(shared, &run).await
        }
        Command::Config => {
            println!("{}", config_to_json(&config));
            Ok(())
        }
        Command::Discover => simulation::discover(SharedConfig::new(config)).await,
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
    tracing::info!("Shutdown complete");
}
