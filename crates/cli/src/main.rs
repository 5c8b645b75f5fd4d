//! modkeeper CLI - mod folder organizer
//!
//! Watches the mod root for changes and performs enable/disable operations
//! on mod folders from the command line.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use modkeeper_core::config::Config;
use modkeeper_core::path::containing_directory;
use modkeeper_dirlock::DirectoryLockManager;
use modkeeper_mods::ModLibrary;
use modkeeper_watcher::{RegistryConfig, WatchRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "modkeeper")]
#[command(about = "Mod folder organizer with live change tracking")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the mod root and log every change until Ctrl+C
    Watch {
        /// Mod root to watch (defaults to mods.root_path)
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,
        /// Event key notifications are published under
        #[arg(long)]
        key: Option<String>,
        /// Watch only the root itself, not its subdirectories
        #[arg(long)]
        simple: bool,
    },
    /// List character folders under the mod root
    List {
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,
    },
    /// List the mods of a character folder
    Mods {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },
    /// Enable a disabled mod or disable an enabled one
    Toggle {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Watch { root, key, simple } => watch(&config, root, key, simple).await,
        Commands::List { root } => list(&config, root).await,
        Commands::Mods { dir } => mods(&config, &dir).await,
        Commands::Toggle { path } => toggle(&config, &path).await,
    }
}

/// Initialize logging system
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("modkeeper={level}")));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    Ok(())
}

/// Explicit root, else the configured one
fn resolve_root(config: &Config, root: Option<PathBuf>) -> Result<PathBuf> {
    match root {
        Some(root) => Ok(root),
        None => Ok(config.require_root_path()?),
    }
}

/// Library rooted at the configured root, or at `fallback` when none is set
fn library_for(config: &Config, fallback: &Path) -> ModLibrary {
    let root = config
        .mods
        .root_path
        .clone()
        .unwrap_or_else(|| fallback.to_path_buf());
    ModLibrary::new(root, Arc::new(DirectoryLockManager::new()), &config.mods)
}

async fn watch(
    config: &Config,
    root: Option<PathBuf>,
    key: Option<String>,
    simple: bool,
) -> Result<()> {
    let root = resolve_root(config, root)?;
    let key = key.unwrap_or_else(|| config.watcher.event_key.clone());

    let (registry, mut notifications) =
        WatchRegistry::with_channel(RegistryConfig::from(&config.watcher))
            .await
            .context("Failed to start watch registry")?;

    if simple || !config.watcher.one_level {
        registry.watch(&root, key.as_str()).await?;
    } else {
        registry.watch_one_level(&root, key.as_str()).await?;
    }

    info!(
        "Watching {} ({} paths) under key {key:?}, press Ctrl+C to stop",
        root.display(),
        registry.watched_paths().await.len()
    );

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                match signal {
                    Ok(()) => info!("Received Ctrl+C, shutting down"),
                    Err(e) => error!("Error setting up signal handler: {e}"),
                }
                break;
            }
            notification = notifications.recv() => match notification {
                Some(notification) => info!("{notification}"),
                None => break,
            },
        }
    }

    registry.close().await?;
    Ok(())
}

async fn list(config: &Config, root: Option<PathBuf>) -> Result<()> {
    let root = resolve_root(config, root)?;
    let library = ModLibrary::new(&root, Arc::new(DirectoryLockManager::new()), &config.mods);

    for folder in library.mod_folders().await? {
        println!("{}", folder.name);
    }
    Ok(())
}

async fn mods(config: &Config, dir: &Path) -> Result<()> {
    let library = library_for(config, &containing_directory(dir));

    for info in library.character_mods(dir).await? {
        let status = if info.enabled { "enabled " } else { "disabled" };
        let preview = info
            .preview
            .map(|p| p.path.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{status}  {}  {preview}", info.name);
    }
    Ok(())
}

async fn toggle(config: &Config, path: &Path) -> Result<()> {
    let library = library_for(config, &containing_directory(path));
    let new_path = library
        .switch_mod_status(path)
        .await
        .with_context(|| format!("Failed to toggle {}", path.display()))?;
    println!("{}", new_path.display());
    Ok(())
}
