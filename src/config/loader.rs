//! Configuration loading from file system
//!
//! Handles loading and parsing config.json.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use super::defaults::DEFAULT_CONFIG_PATH;
use super::types::Config;

/// Load configuration from ~/.slashkey/config.json
///
/// Returns Config::default() if the file is missing or unreadable.
pub fn load_config() -> Config {
    let config_path = PathBuf::from(shellexpand::tilde(DEFAULT_CONFIG_PATH).as_ref());
    load_config_from(&config_path)
}

/// Load configuration from a specific file
///
/// Missing fields take their defaults; a missing or malformed file yields
/// Config::default() with a warning.
#[instrument(name = "load_config")]
pub fn load_config_from(config_path: &Path) -> Config {
    if !config_path.exists() {
        info!(path = %config_path.display(), "Config file not found, using defaults");
        return Config::default();
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            warn!(
                error = %e,
                path = %config_path.display(),
                "Failed to read config file, using defaults"
            );
            return Config::default();
        }
    };

    match serde_json::from_str::<Config>(content.trim()) {
        Ok(config) => {
            info!(path = %config_path.display(), "Successfully loaded config");
            config
        }
        Err(e) => {
            // Provide helpful error message for common config mistakes
            let error_hint = if e.to_string().contains("commitModifier")
                || e.to_string().contains("unknown variant")
            {
                "\n\nHint: 'commitModifier' must be one of \"ctrl\", \"meta\", \"alt\", \"shift\"."
            } else if e.to_string().contains("invalid type") {
                "\n\nHint: 'debounceMs' and 'focusGraceMs' are integers (milliseconds), \
                'editableSelectors' is an array of strings."
            } else {
                ""
            };

            warn!(
                error = %e,
                path = %config_path.display(),
                hint = %error_hint,
                "Failed to parse config JSON, using defaults"
            );
            Config::default()
        }
    }
}
