//! Configuration module - engine settings
//!
//! This module provides functionality for:
//! - Loading configuration from ~/.slashkey/config.json
//! - Default values for all settings
//! - Type definitions for config structures
//!
//! # Module Structure
//!
//! - `defaults` - All default constant values
//! - `types` - Configuration struct definitions (Config, PanelConfig, etc.)
//! - `loader` - File system loading and parsing

mod defaults;
mod loader;
mod types;

pub use defaults::{DEFAULT_CONFIG_PATH, DEFAULT_STORE_PATH};

pub use types::{CommitModifier, Config, PanelConfig};

pub use loader::{load_config, load_config_from};

#[cfg(test)]
pub use defaults::{DEFAULT_DEBOUNCE_MS, DEFAULT_EDITABLE_SELECTORS, DEFAULT_FOCUS_GRACE_MS};

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
