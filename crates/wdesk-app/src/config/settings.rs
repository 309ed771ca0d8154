//! Settings loading and persistence

use std::path::{Path, PathBuf};

use wdesk_core::prelude::*;

use super::types::Settings;

/// Directory holding Wallet Desk files inside a profile directory
pub const WDESK_DIR: &str = ".wdesk";

/// Settings file name inside [`WDESK_DIR`]
pub const CONFIG_FILENAME: &str = "config.toml";

/// Path of the settings file for a profile directory
pub fn config_path(profile_dir: &Path) -> PathBuf {
    profile_dir.join(WDESK_DIR).join(CONFIG_FILENAME)
}

/// Load settings from `.wdesk/config.toml`
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings(profile_dir: &Path) -> Settings {
    let config_path = config_path(profile_dir);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Write settings to `.wdesk/config.toml`, creating the directory if needed
pub fn save_settings(profile_dir: &Path, settings: &Settings) -> Result<()> {
    let wdesk_dir = profile_dir.join(WDESK_DIR);
    std::fs::create_dir_all(&wdesk_dir)
        .map_err(|e| Error::config(format!("Failed to create .wdesk dir: {}", e)))?;

    let content = toml::to_string_pretty(settings)
        .map_err(|e| Error::config(format!("Failed to serialize settings: {}", e)))?;

    std::fs::write(config_path(profile_dir), content)
        .map_err(|e| Error::config(format!("Failed to write settings: {}", e)))?;

    debug!("Saved settings to {:?}", config_path(profile_dir));
    Ok(())
}

/// Create a commented default config file in `.wdesk/` if none exists
pub fn init_config_dir(profile_dir: &Path) -> Result<()> {
    let wdesk_dir = profile_dir.join(WDESK_DIR);

    if !wdesk_dir.exists() {
        std::fs::create_dir_all(&wdesk_dir)
            .map_err(|e| Error::config(format!("Failed to create .wdesk dir: {}", e)))?;
    }

    let config_path = config_path(profile_dir);
    if !config_path.exists() {
        let default_content = r#"# Wallet Desk Configuration

[network]
network_type = "test_net"     # main_net, test_net, private_net, private_test_net

[broadcast]
confirmation_timeout_ms = 30000   # aggregate-bonded confirmation window (min 1000)

[subscriptions]
# Channels opened for the current signer
channels = [
    "confirmed",
    "unconfirmed_added",
    "unconfirmed_removed",
    "aggregate_bonded_added",
    "aggregate_bonded_removed",
    "cosignature_added",
    "status",
]
notification_buffer = 256

[events]
capacity = 256

[domains]
command_buffer = 64
"#;
        std::fs::write(&config_path, default_content)
            .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;
        info!("Created default config at {:?}", config_path);
    }

    Ok(())
}
