//! Configuration file parsing for Wallet Desk
//!
//! Supports:
//! - `.wdesk/config.toml` - Session settings for a profile directory

pub mod settings;
pub mod types;

pub use settings::{
    config_path, init_config_dir, load_settings, save_settings, CONFIG_FILENAME, WDESK_DIR,
};
pub use types::*;
