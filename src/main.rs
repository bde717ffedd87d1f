use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use volumeread::api::ApiClient;
use volumeread::app::{App, AppEvent};
use volumeread::config::Config;
use volumeread::keybindings::KeybindingRegistry;
use volumeread::preferences::PreferenceManager;
use volumeread::storage::{Database, DatabaseError};
use volumeread::{transfer, ui};

/// Get the config directory path (~/.config/volumeread/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("volumeread"))
}

/// Create the config directory with user-only access.
fn ensure_config_dir(config_dir: &Path) -> Result<()> {
    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir).context("Failed to create config directory")?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }
    Ok(())
}

/// Log to a file: the terminal belongs to the TUI.
fn init_logging(config_dir: &Path) -> Result<()> {
    let log_path = config_dir.join("volumeread.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[derive(Parser, Debug)]
#[command(
    name = "volumeread",
    about = "Terminal client for the VolumeRead feed reader"
)]
struct Args {
    /// Server base URL (overrides server_url in config.toml)
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Config file (default ~/.config/volumeread/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Upload an OPML file to the server, refresh, and exit
    #[arg(long, value_name = "FILE", conflicts_with = "export")]
    import: Option<PathBuf>,

    /// Download the server's feeds as OPML to FILE and exit
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Delete local preferences (layout styles, smart cap, keybindings)
    #[arg(long)]
    reset_prefs: bool,
}

/// Open the preference store. Failures other than a second running
/// instance degrade to config-only preferences.
async fn open_store(db_path: &Path) -> Result<Option<Database>> {
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    match Database::open(db_path_str).await {
        Ok(db) => Ok(Some(db)),
        Err(DatabaseError::InstanceLocked) => {
            eprintln!("Error: {}", DatabaseError::InstanceLocked);
            std::process::exit(1);
        }
        Err(e) => {
            tracing::warn!(error = %e, "Preference store unavailable, settings will not persist");
            eprintln!("Warning: {}. Settings will not be saved this session.", e);
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_config_dir()?;
    ensure_config_dir(&config_dir)?;
    init_logging(&config_dir)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    if let Some(server) = args.server {
        config.server_url = server;
    }

    let api = ApiClient::new(
        &config.server_url,
        Duration::from_secs(config.request_timeout_secs),
    )
    .with_context(|| format!("Invalid server URL: {}", config.server_url))?;

    // One-shot OPML transfers skip the TUI.
    if let Some(path) = &args.import {
        let message = transfer::import_file(&api, path).await?;
        println!("{}", message);
        match api.refresh_all_feeds().await {
            Ok(summary) => println!(
                "Refreshed feeds{}",
                summary
                    .added_count
                    .map(|n| format!(": {} new articles", n))
                    .unwrap_or_default()
            ),
            Err(e) => eprintln!("Warning: refresh after import failed: {}", e),
        }
        return Ok(());
    }
    if let Some(path) = &args.export {
        let bytes = transfer::export_file(&api, path).await?;
        println!("Exported {} bytes to {}", bytes, path.display());
        return Ok(());
    }

    let db_path = config_dir.join("prefs.db");
    if args.reset_prefs && db_path.exists() {
        std::fs::remove_file(&db_path).context("Failed to delete preference store")?;
        println!("Preferences reset.");
    }

    let db = open_store(&db_path).await?;
    let prefs = match &db {
        Some(db) => match PreferenceManager::load(&config, db).await {
            Ok(prefs) => prefs,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored preferences");
                PreferenceManager::from_config(&config)
            }
        },
        None => PreferenceManager::from_config(&config),
    };

    let mut keybindings = KeybindingRegistry::new();
    for warning in keybindings.apply_overrides(&prefs.keybinding_overrides()) {
        tracing::warn!(warning = %warning, "Keybinding override skipped");
        eprintln!("Warning: {}", warning);
    }

    tracing::info!(server = %api.base_url(), "Starting volumeread");
    let mut app = App::new(api, db, prefs, keybindings, config.player_argv());

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);
    ui::run(&mut app, event_tx, event_rx).await?;

    Ok(())
}
