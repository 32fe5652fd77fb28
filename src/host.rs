//! The seam between the expansion engine and the page it runs in.
//!
//! A host owns the live elements. The engine only ever addresses them by
//! [`ElementId`] and re-checks [`FieldHost::is_attached`] before touching
//! one, since elements can vanish between events.

use crate::field::{FieldKind, FieldRef};
use crate::panel::PanelView;

/// Identity of a page element, stable for the element's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

/// Bounding box in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Visible window size and document scroll position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }
}

/// Page-side capabilities the engine needs
pub trait FieldHost {
    fn is_attached(&self, id: ElementId) -> bool;

    /// Lowercase tag name
    fn tag_name(&self, id: ElementId) -> Option<&str>;

    fn attribute(&self, id: ElementId, name: &str) -> Option<&str>;

    /// The element that currently has input focus
    fn active_element(&self) -> Option<ElementId>;

    /// Text model of an editable element, `None` if it is not editable
    fn field_kind(&self, id: ElementId) -> Option<FieldKind>;

    fn field(&mut self, id: ElementId) -> Option<FieldRef<'_>>;

    fn bounding_rect(&self, id: ElementId) -> Option<Rect>;

    fn viewport(&self) -> Viewport;

    /// Show (`Some`) or hide (`None`) the single suggestion overlay
    fn render_panel(&mut self, view: Option<&PanelView>);
}
