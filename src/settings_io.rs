use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::warn;

use crate::settings::{Settings, API_KEYS_ENV};

pub const APP_DIR: &str = "ai_roleplay_engine";

pub fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path.push("settings.json");
    path
}

/// Loads the user's settings and applies the environment key override.
pub fn load_settings() -> Settings {
    let mut settings = load_from(&settings_path());
    settings.apply_key_override(std::env::var(API_KEYS_ENV).ok().as_deref());
    settings
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_to(&settings_path(), settings)
}

/// A missing or unreadable file gives the defaults.
pub fn load_from(path: &Path) -> Settings {
    let Ok(text) = fs::read_to_string(path) else {
        return Settings::default();
    };
    serde_json::from_str(&text).unwrap_or_else(|err| {
        warn!("Ignoring unreadable settings at {}: {err}", path.display());
        Settings::default()
    })
}

pub fn save_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating settings directory {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(settings).context("serialising settings")?;
    fs::write(path, json).with_context(|| format!("writing settings to {}", path.display()))
}
