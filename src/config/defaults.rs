//! Default configuration values
//!
//! All constants used throughout the config module are defined here.

/// Delay before a burst of input events rebuilds the suggestions (ms)
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// How long the panel survives focus leaving the field, so a click on a
/// suggestion still lands (ms)
pub const DEFAULT_FOCUS_GRACE_MS: u64 = 150;

/// Elements that receive trigger detection
pub const DEFAULT_EDITABLE_SELECTORS: &[&str] = &[
    "textarea",
    r#"input[type="text"]"#,
    r#"input[type="search"]"#,
    r#"div[contenteditable="true"]"#,
];

/// Suggestion panel geometry (pixels)
pub const DEFAULT_PANEL_MIN_WIDTH: f64 = 200.0;
pub const DEFAULT_PANEL_MAX_HEIGHT: f64 = 200.0;
pub const DEFAULT_PANEL_ITEM_HEIGHT: f64 = 36.0;
pub const DEFAULT_PANEL_EDGE_MARGIN: f64 = 5.0;

/// Mapping store location
pub const DEFAULT_STORE_PATH: &str = "~/.slashkey/mappings.json";

/// Config file location
pub const DEFAULT_CONFIG_PATH: &str = "~/.slashkey/config.json";
