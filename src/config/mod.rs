//! Configuration module for answer-desk
//!
//! Handles loading and validating settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

/// Load settings from the first settings file found, or use defaults.
///
/// `ANSWER_DESK_SETTINGS_PATH` is checked first, then the default locations.
/// Environment overrides are applied last.
pub fn load() -> Result<Settings> {
    let mut settings = match find_settings_file() {
        Some(path) => {
            info!("Loading settings from: {}", path.display());
            Settings::from_file(&path)?
        }
        None => {
            info!("No settings file found, using defaults");
            Settings::default()
        }
    };

    settings.merge_env();
    settings.validate()?;
    Ok(settings)
}

fn find_settings_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("ANSWER_DESK_SETTINGS_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let mut paths = vec![
        PathBuf::from("settings.yml"),
        PathBuf::from("config/settings.yml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("answer-desk/settings.yml"));
    }

    paths.into_iter().find(|p| p.exists())
}
