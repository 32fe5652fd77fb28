//! Configuration type definitions
//!
//! This module contains all the struct and enum definitions for configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults::*;
use crate::error::{ExpandError, ResultExt};
use crate::selector::SelectorList;

// ============================================
// PANEL CONFIG
// ============================================

/// Geometry of the suggestion panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelConfig {
    /// Panel never gets narrower than this (default: 200)
    #[serde(default = "default_panel_min_width")]
    pub min_width: f64,
    /// Panel scrolls beyond this height (default: 200)
    #[serde(default = "default_panel_max_height")]
    pub max_height: f64,
    /// Height of one suggestion row (default: 36)
    #[serde(default = "default_panel_item_height")]
    pub item_height: f64,
    /// Minimum gap to the viewport's left and right edges (default: 5)
    #[serde(default = "default_panel_edge_margin")]
    pub edge_margin: f64,
}

fn default_panel_min_width() -> f64 {
    DEFAULT_PANEL_MIN_WIDTH
}
fn default_panel_max_height() -> f64 {
    DEFAULT_PANEL_MAX_HEIGHT
}
fn default_panel_item_height() -> f64 {
    DEFAULT_PANEL_ITEM_HEIGHT
}
fn default_panel_edge_margin() -> f64 {
    DEFAULT_PANEL_EDGE_MARGIN
}

impl Default for PanelConfig {
    fn default() -> Self {
        PanelConfig {
            min_width: DEFAULT_PANEL_MIN_WIDTH,
            max_height: DEFAULT_PANEL_MAX_HEIGHT,
            item_height: DEFAULT_PANEL_ITEM_HEIGHT,
            edge_margin: DEFAULT_PANEL_EDGE_MARGIN,
        }
    }
}

// ============================================
// COMMIT CHORD
// ============================================

/// Modifier that, held with Enter, commits a completed trigger directly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitModifier {
    #[default]
    Ctrl,
    Meta,
    Alt,
    Shift,
}

// ============================================
// MAIN CONFIG
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Input debounce before suggestions rebuild, in ms (default: 100)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Grace window after focus leaves a field, in ms (default: 150)
    #[serde(default = "default_focus_grace_ms")]
    pub focus_grace_ms: u64,
    /// Selectors for elements that get trigger detection
    #[serde(default = "default_editable_selectors")]
    pub editable_selectors: Vec<String>,
    /// Modifier for the direct-commit chord (default: ctrl)
    #[serde(default)]
    pub commit_modifier: CommitModifier,
    #[serde(default)]
    pub panel: PanelConfig,
    /// Path of the JSON mapping store (default: ~/.slashkey/mappings.json)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<String>,
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}
fn default_focus_grace_ms() -> u64 {
    DEFAULT_FOCUS_GRACE_MS
}
fn default_editable_selectors() -> Vec<String> {
    DEFAULT_EDITABLE_SELECTORS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            focus_grace_ms: DEFAULT_FOCUS_GRACE_MS,
            editable_selectors: default_editable_selectors(),
            commit_modifier: CommitModifier::default(),
            panel: PanelConfig::default(),
            store_path: None,
        }
    }
}

impl Config {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn focus_grace(&self) -> Duration {
        Duration::from_millis(self.focus_grace_ms)
    }

    /// Parsed editable selectors
    pub fn try_selectors(&self) -> Result<SelectorList, ExpandError> {
        let list = SelectorList::parse_all(self.editable_selectors.as_slice())
            .map_err(|e| ExpandError::Config(format!("editableSelectors: {e}")))?;
        if list.is_empty() {
            return Err(ExpandError::Config(
                "editableSelectors: no selectors configured".to_string(),
            ));
        }
        Ok(list)
    }

    /// Parsed editable selectors; an invalid or empty list falls back to the
    /// defaults
    pub fn selectors(&self) -> SelectorList {
        self.try_selectors()
            .warn_on_err()
            .unwrap_or_else(default_selector_list)
    }

    /// Store path with `~` expanded
    pub fn store_path(&self) -> PathBuf {
        let raw = self.store_path.as_deref().unwrap_or(DEFAULT_STORE_PATH);
        PathBuf::from(shellexpand::tilde(raw).as_ref())
    }
}

fn default_selector_list() -> SelectorList {
    SelectorList::parse_all(DEFAULT_EDITABLE_SELECTORS).unwrap_or_default()
}
