//! Suggestion panel - the floating list of candidate keywords.
//!
//! The engine owns the panel state; the host only draws the [`PanelView`]
//! it is handed. Placement follows the focused field: below it by default,
//! flipped above when it would run off the bottom of the viewport, and kept
//! inside the horizontal bounds.

use crate::config::PanelConfig;
use crate::host::{Rect, Viewport};
use crate::suggest::SuggestionList;

/// Document-space position and size of the panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelPlacement {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelItem {
    pub keyword: String,
    /// Display label, the keyword with its slash
    pub label: String,
    pub selected: bool,
}

/// Everything the host needs to draw the panel
#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub items: Vec<PanelItem>,
    pub placement: PanelPlacement,
}

impl PanelView {
    pub fn from_list(list: &SuggestionList, placement: PanelPlacement) -> Self {
        let selected = list.selected_index();
        let items = list
            .items()
            .iter()
            .enumerate()
            .map(|(index, keyword)| PanelItem {
                keyword: keyword.clone(),
                label: format!("/{keyword}"),
                selected: selected == Some(index),
            })
            .collect();
        Self { items, placement }
    }

    pub fn selected_keyword(&self) -> Option<&str> {
        self.items
            .iter()
            .find(|item| item.selected)
            .map(|item| item.keyword.as_str())
    }
}

/// Position the panel for a field's bounding box
pub fn place(field: Rect, item_count: usize, viewport: Viewport, config: &PanelConfig) -> PanelPlacement {
    let width = field.width.max(config.min_width);
    let height = (item_count as f64 * config.item_height).min(config.max_height);

    let mut top = field.bottom() + viewport.scroll_y;
    let mut left = field.left + viewport.scroll_x;

    if top + height > viewport.height + viewport.scroll_y {
        top = field.top + viewport.scroll_y - height;
    }
    if left + width > viewport.width + viewport.scroll_x {
        left = viewport.width + viewport.scroll_x - width - config.edge_margin;
    }
    if left < config.edge_margin {
        left = config.edge_margin;
    }

    PanelPlacement {
        top,
        left,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport {
            width: 1000.0,
            height: 600.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    #[test]
    fn test_places_below_field() {
        let config = PanelConfig::default();
        let placement = place(Rect::new(100.0, 50.0, 300.0, 30.0), 3, viewport(), &config);
        assert_eq!(placement.top, 80.0);
        assert_eq!(placement.left, 100.0);
        assert_eq!(placement.width, 300.0);
        assert_eq!(placement.height, 3.0 * config.item_height);
    }

    #[test]
    fn test_flips_above_near_bottom() {
        let config = PanelConfig::default();
        let placement = place(Rect::new(100.0, 550.0, 300.0, 30.0), 10, viewport(), &config);
        assert_eq!(placement.height, config.max_height);
        assert_eq!(placement.top, 550.0 - config.max_height);
    }

    #[test]
    fn test_clamps_to_right_and_left_edges() {
        let config = PanelConfig::default();
        let placement = place(Rect::new(900.0, 50.0, 50.0, 20.0), 1, viewport(), &config);
        assert_eq!(placement.width, config.min_width);
        assert_eq!(placement.left, 1000.0 - config.min_width - config.edge_margin);

        let placement = place(Rect::new(-40.0, 50.0, 300.0, 20.0), 1, viewport(), &config);
        assert_eq!(placement.left, config.edge_margin);
    }

    #[test]
    fn test_scroll_offsets_apply() {
        let config = PanelConfig::default();
        let scrolled = Viewport {
            scroll_y: 400.0,
            ..viewport()
        };
        let placement = place(Rect::new(10.0, 50.0, 300.0, 30.0), 1, scrolled, &config);
        assert_eq!(placement.top, 480.0);
    }

    #[test]
    fn test_view_labels_and_selection() {
        let mut list = SuggestionList::new();
        list.rebuild(vec!["foo".into(), "foobar".into()]);
        let placement = place(Rect::default(), 2, viewport(), &PanelConfig::default());
        let view = PanelView::from_list(&list, placement);
        assert_eq!(view.items[0].label, "/foo");
        assert!(view.items[0].selected);
        assert!(!view.items[1].selected);
        assert_eq!(view.selected_keyword(), Some("foo"));
    }
}
