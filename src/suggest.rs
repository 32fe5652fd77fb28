//! Suggestion engine - ranks keywords for a partial trigger and tracks the
//! keyboard selection.

use std::cmp::Ordering;

/// Direction of a keyboard selection move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Keywords containing `partial` (case-insensitive), prefix matches first,
/// then lexicographic within each group.
pub fn filter_keywords<'a, I>(keywords: I, partial: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = partial.to_lowercase();

    let mut matches: Vec<(bool, &str)> = keywords
        .into_iter()
        .filter_map(|keyword| {
            let folded = keyword.to_lowercase();
            folded
                .contains(&needle)
                .then(|| (folded.starts_with(&needle), keyword))
        })
        .collect();

    matches.sort_by(|(a_prefix, a), (b_prefix, b)| match (a_prefix, b_prefix) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.cmp(b),
    });

    matches
        .into_iter()
        .map(|(_, keyword)| keyword.to_string())
        .collect()
}

/// Ordered candidates plus the selected index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionList {
    items: Vec<String>,
    selected: Option<usize>,
}

impl SuggestionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the candidates; selection goes to the first item, or none
    pub fn rebuild(&mut self, items: Vec<String>) {
        self.selected = if items.is_empty() { None } else { Some(0) };
        self.items = items;
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.selected = None;
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// Move the selection one step; stays put at either end
    pub fn move_selection(&mut self, direction: Direction) {
        let Some(current) = self.selected else {
            return;
        };
        self.selected = Some(match direction {
            Direction::Up => current.saturating_sub(1),
            Direction::Down => (current + 1).min(self.items.len() - 1),
        });
    }

    /// Select an item directly (pointer hover); out-of-range is ignored
    pub fn select(&mut self, index: usize) {
        if index < self.items.len() {
            self.selected = Some(index);
        }
    }

    pub fn current_selection(&self) -> Option<&str> {
        self.selected
            .and_then(|index| self.items.get(index))
            .map(String::as_str)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(String::as_str)
    }
}
