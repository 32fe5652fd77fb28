//! Expand Manager - ties the expansion pipeline to focus and input events.
//!
//! The host forwards page events here (focus, input, keys, pointer) with a
//! timestamp and calls [`ExpandManager::poll`] to fire due timers. The
//! manager:
//! 1. Binds at most one editable field at a time
//! 2. Debounces input, then re-detects the trigger and rebuilds suggestions
//!    from the cached mapping snapshot
//! 3. Owns the suggestion panel and routes navigation keys to it
//! 4. Commits the chosen keyword through [`crate::commit`]
//!
//! # Focus lifecycle
//!
//! Losing focus does not drop the panel straight away: a grace window lets
//! a click on a suggestion (which blurs the field first) still commit into
//! the field it came from. Deferred work carries the binding generation it
//! was scheduled under and is dropped once that binding is gone.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, instrument, warn};

use crate::commit::{self, CommitOutcome};
use crate::config::{CommitModifier, Config};
use crate::debounce::Debouncer;
use crate::error::{ErrorSeverity, ExpandError};
use crate::field::FieldHandle;
use crate::host::{ElementId, FieldHost};
use crate::panel::{self, PanelView};
use crate::selector::SelectorList;
use crate::store::MappingStoreClient;
use crate::suggest::{filter_keywords, Direction, SuggestionList};
use crate::trigger::{detect_complete, detect_partial, TriggerMatch};

/// Keys the manager reacts to; everything else is `Other`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Modifiers {
    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::default()
        }
    }

    fn holds(&self, modifier: CommitModifier) -> bool {
        match modifier {
            CommitModifier::Ctrl => self.ctrl,
            CommitModifier::Meta => self.meta,
            CommitModifier::Alt => self.alt,
            CommitModifier::Shift => self.shift,
        }
    }
}

impl From<CommitModifier> for Modifiers {
    /// Modifiers with only `modifier` held
    fn from(modifier: CommitModifier) -> Self {
        let mut modifiers = Self::default();
        match modifier {
            CommitModifier::Ctrl => modifiers.ctrl = true,
            CommitModifier::Meta => modifiers.meta = true,
            CommitModifier::Alt => modifiers.alt = true,
            CommitModifier::Shift => modifiers.shift = true,
        }
        modifiers
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

/// What the host should do with a key event after the manager saw it
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Prevent the default action and stop propagation
    Consumed,
    PassThrough,
}

/// Where a document-level pointer down landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Panel,
    Element(ElementId),
    Elsewhere,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Unbound,
    Bound(FieldHandle),
}

/// Pending hide after the bound field lost focus
#[derive(Debug, Clone, Copy)]
struct GraceWindow {
    handle: FieldHandle,
    due: Instant,
}

/// Counters for diagnostics and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManagerStats {
    pub observer_attachments: usize,
    pub refreshes: usize,
    pub commits: usize,
}

/// Drives slash-keyword expansion for one page
pub struct ExpandManager {
    config: Config,
    selectors: SelectorList,
    store: Arc<MappingStoreClient>,
    binding: Binding,
    /// Elements with observers attached, by identity
    observed: HashSet<ElementId>,
    next_generation: u64,
    refresh: Debouncer<u64>,
    grace: Option<GraceWindow>,
    trigger: Option<TriggerMatch>,
    suggestions: SuggestionList,
    /// Element the visible panel is anchored to
    panel_anchor: Option<ElementId>,
    stats: ManagerStats,
}

impl ExpandManager {
    pub fn new(config: Config, store: Arc<MappingStoreClient>) -> Self {
        let selectors = config.selectors();
        let refresh = Debouncer::new(config.debounce());
        Self {
            config,
            selectors,
            store,
            binding: Binding::Unbound,
            observed: HashSet::new(),
            next_generation: 0,
            refresh,
            grace: None,
            trigger: None,
            suggestions: SuggestionList::new(),
            panel_anchor: None,
            stats: ManagerStats::default(),
        }
    }

    pub fn binding(&self) -> Binding {
        self.binding
    }

    pub fn bound_handle(&self) -> Option<FieldHandle> {
        match self.binding {
            Binding::Bound(handle) => Some(handle),
            Binding::Unbound => None,
        }
    }

    pub fn trigger(&self) -> Option<&TriggerMatch> {
        self.trigger.as_ref()
    }

    pub fn suggestions(&self) -> &SuggestionList {
        &self.suggestions
    }

    pub fn is_panel_visible(&self) -> bool {
        self.panel_anchor.is_some()
    }

    pub fn stats(&self) -> ManagerStats {
        self.stats
    }

    /// Bind the element that already has focus when the manager starts
    pub fn adopt_active_element(&mut self, host: &mut dyn FieldHost) {
        match host.active_element() {
            Some(id) => {
                debug!(id = ?id, "Adopting already focused element");
                self.focus_in(host, id);
            }
            None => debug!("No focused element to adopt"),
        }
    }

    #[instrument(skip(self, host))]
    pub fn focus_in(&mut self, host: &mut dyn FieldHost, id: ElementId) {
        if !self.selectors.matches(host, id) {
            debug!("Focused element is not an editable target");
            return;
        }
        let Some(kind) = host.field_kind(id) else {
            debug!("Focused element has no text model");
            return;
        };

        match self.binding {
            Binding::Bound(handle) if handle.id == id => {
                debug!("Element already bound");
                return;
            }
            Binding::Bound(previous) => {
                debug!(previous = ?previous.id, "Focus moved without focus-out, releasing previous field");
                self.unbind(previous);
                self.dismiss(host);
            }
            Binding::Unbound => {}
        }

        if let Some(grace) = self.grace.take() {
            if grace.handle.id == id {
                debug!("Refocused within grace window, keeping suggestions");
            } else {
                self.dismiss(host);
            }
        }

        self.next_generation += 1;
        let handle = FieldHandle {
            id,
            kind,
            generation: self.next_generation,
        };
        if self.observed.insert(id) {
            self.stats.observer_attachments += 1;
        }
        self.binding = Binding::Bound(handle);
        info!(kind = ?kind, generation = handle.generation, "Bound editable field");
    }

    #[instrument(skip(self, now))]
    pub fn focus_out(&mut self, id: ElementId, now: Instant) {
        let Binding::Bound(handle) = self.binding else {
            return;
        };
        if handle.id != id {
            debug!("Focus-out for an element that is not bound");
            return;
        }

        self.unbind(handle);
        if self.trigger.is_some() || self.is_panel_visible() {
            self.grace = Some(GraceWindow {
                handle,
                due: now + self.config.focus_grace(),
            });
            debug!(grace_ms = self.config.focus_grace_ms, "Field blurred, panel kept for grace window");
        }
    }

    /// Input or caret change on `id`; rebuilds suggestions after the debounce
    pub fn input(&mut self, id: ElementId, now: Instant) {
        match self.binding {
            Binding::Bound(handle) if handle.id == id => {
                self.refresh.schedule(now, handle.generation);
            }
            _ => debug!(id = ?id, "Input on unbound element ignored"),
        }
    }

    pub fn handle_key(
        &mut self,
        host: &mut dyn FieldHost,
        id: ElementId,
        event: KeyEvent,
    ) -> KeyDisposition {
        match self.binding {
            Binding::Bound(handle) if handle.id == id => {}
            _ => return KeyDisposition::PassThrough,
        }

        if self.is_panel_visible() {
            match event.key {
                Key::ArrowDown | Key::ArrowUp => {
                    let direction = if event.key == Key::ArrowDown {
                        Direction::Down
                    } else {
                        Direction::Up
                    };
                    self.suggestions.move_selection(direction);
                    self.render_panel(host);
                    return KeyDisposition::Consumed;
                }
                Key::Enter => {
                    match self.suggestions.current_selection().map(str::to_string) {
                        Some(keyword) => {
                            self.commit_keyword(host, &keyword);
                        }
                        None => debug!("Enter with no selection"),
                    }
                    return KeyDisposition::Consumed;
                }
                Key::Escape => {
                    debug!("Suggestions dismissed");
                    self.refresh.cancel();
                    self.dismiss(host);
                    return KeyDisposition::Consumed;
                }
                Key::Other => {}
            }
        }

        if event.key == Key::Enter && event.modifiers.holds(self.config.commit_modifier) {
            return self.commit_completed_trigger(host);
        }

        KeyDisposition::PassThrough
    }

    /// Pointer moved over suggestion `index`
    pub fn suggestion_hover(&mut self, host: &mut dyn FieldHost, index: usize) {
        if !self.is_panel_visible() || self.suggestions.selected_index() == Some(index) {
            return;
        }
        self.suggestions.select(index);
        self.render_panel(host);
    }

    /// Suggestion `index` clicked; returns whether the phrase was inserted
    pub fn suggestion_click(&mut self, host: &mut dyn FieldHost, index: usize) -> bool {
        if !self.is_panel_visible() {
            debug!(index, "Click on hidden panel ignored");
            return false;
        }
        let Some(keyword) = self.suggestions.get(index).map(str::to_string) else {
            debug!(index, "Click outside suggestion range ignored");
            return false;
        };
        self.suggestions.select(index);
        self.commit_keyword(host, &keyword)
    }

    /// Document-level pointer down
    pub fn pointer_down(&mut self, host: &mut dyn FieldHost, target: PointerTarget) {
        let Some(anchor) = self.panel_anchor else {
            return;
        };
        let inside = match target {
            PointerTarget::Panel => true,
            PointerTarget::Element(id) => id == anchor,
            PointerTarget::Elsewhere => false,
        };
        if !inside {
            debug!(target = ?target, "Pointer down outside field and panel");
            self.grace = None;
            self.dismiss(host);
        }
    }

    /// Fire due timers
    pub fn poll(&mut self, host: &mut dyn FieldHost, now: Instant) {
        if let Some(generation) = self.refresh.fire_due(now) {
            self.run_refresh(host, generation);
        }

        if let Some(grace) = self.grace {
            if now >= grace.due {
                self.grace = None;
                debug!(id = ?grace.handle.id, "Grace window lapsed, hiding suggestions");
                self.dismiss(host);
            }
        }
    }

    /// Earliest instant at which [`ExpandManager::poll`] has work
    pub fn next_deadline(&self) -> Option<Instant> {
        let grace = self.grace.map(|grace| grace.due);
        match (self.refresh.deadline(), grace) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn run_refresh(&mut self, host: &mut dyn FieldHost, generation: u64) {
        let Binding::Bound(handle) = self.binding else {
            debug!(generation, "Refresh fired with no bound field");
            return;
        };
        if handle.generation != generation {
            debug!(generation, current = handle.generation, "Dropping stale refresh");
            return;
        }
        if !host.is_attached(handle.id) {
            warn!(id = ?handle.id, "Bound field was removed from the page");
            self.unbind(handle);
            self.dismiss(host);
            return;
        }
        let Some(field) = host.field(handle.id) else {
            warn!(id = ?handle.id, "Bound element is no longer editable");
            return;
        };
        let text = field.text();
        let caret = field.caret_offset();

        self.stats.refreshes += 1;
        match detect_partial(&text, caret) {
            Some(trigger) => {
                let snapshot = self.store.snapshot();
                let items = filter_keywords(snapshot.keywords(), &trigger.keyword_part);
                debug!(
                    token = %trigger.raw_token,
                    candidates = items.len(),
                    "Trigger detected"
                );
                self.trigger = Some(trigger);
                self.suggestions.rebuild(items);
                if self.suggestions.is_empty() {
                    self.hide_panel(host);
                } else {
                    self.panel_anchor = Some(handle.id);
                    self.render_panel(host);
                }
            }
            None => {
                self.trigger = None;
                self.suggestions.clear();
                self.hide_panel(host);
            }
        }
    }

    /// Chord commit with no panel: the token at the caret must be a stored
    /// keyword
    fn commit_completed_trigger(&mut self, host: &mut dyn FieldHost) -> KeyDisposition {
        let Some(handle) = self.bound_handle() else {
            return KeyDisposition::PassThrough;
        };
        let Some(field) = host.field(handle.id) else {
            return KeyDisposition::PassThrough;
        };
        let text = field.text();
        let caret = field.caret_offset();

        let snapshot = self.store.snapshot();
        match detect_complete(&text, caret, &snapshot) {
            Some(trigger) => {
                let keyword = trigger.keyword_part.clone();
                self.trigger = Some(trigger);
                self.commit_keyword(host, &keyword);
                KeyDisposition::Consumed
            }
            None => {
                if let Some(partial) = detect_partial(&text, caret) {
                    info!(token = %partial.raw_token, "No phrase stored for keyword");
                }
                KeyDisposition::PassThrough
            }
        }
    }

    /// Commit into the bound field, or the field still in its grace window.
    /// Trigger, panel and any pending refresh are cleared whatever the
    /// outcome.
    fn commit_keyword(&mut self, host: &mut dyn FieldHost, keyword: &str) -> bool {
        self.refresh.cancel();
        let target = self.bound_handle().or(self.grace.map(|grace| grace.handle));
        self.grace = None;

        let (Some(handle), Some(trigger)) = (target, self.trigger.clone()) else {
            warn!(keyword, "No bound field or active trigger to commit into");
            self.dismiss(host);
            return false;
        };

        let snapshot = self.store.snapshot();
        let result = commit::commit(host, &handle, &trigger, keyword, &snapshot);
        self.dismiss(host);
        self.report(result)
    }

    fn report(&mut self, result: Result<CommitOutcome, ExpandError>) -> bool {
        match result {
            Ok(outcome) => {
                self.stats.commits += 1;
                debug!(keyword = %outcome.keyword, caret = outcome.caret, "Commit finished");
                true
            }
            Err(e) => {
                match e.severity() {
                    ErrorSeverity::Info => debug!(error = %e, "Commit skipped"),
                    ErrorSeverity::Warning => warn!(error = %e, "Commit failed"),
                    ErrorSeverity::Error => error!(error = %e, "Commit failed"),
                }
                false
            }
        }
    }

    fn unbind(&mut self, handle: FieldHandle) {
        self.observed.remove(&handle.id);
        self.binding = Binding::Unbound;
        self.refresh.cancel();
        debug!(id = ?handle.id, generation = handle.generation, "Unbound field");
    }

    /// Clear the trigger and hide the panel
    fn dismiss(&mut self, host: &mut dyn FieldHost) {
        self.trigger = None;
        self.suggestions.clear();
        self.hide_panel(host);
    }

    fn hide_panel(&mut self, host: &mut dyn FieldHost) {
        if self.panel_anchor.take().is_some() {
            host.render_panel(None);
        }
    }

    fn render_panel(&mut self, host: &mut dyn FieldHost) {
        let Some(anchor) = self.panel_anchor else {
            return;
        };
        let Some(rect) = host.bounding_rect(anchor) else {
            debug!(id = ?anchor, "Panel anchor has no bounding box");
            self.hide_panel(host);
            return;
        };
        let placement = panel::place(
            rect,
            self.suggestions.len(),
            host.viewport(),
            &self.config.panel,
        );
        let view = PanelView::from_list(&self.suggestions, placement);
        host.render_panel(Some(&view));
    }
}

#[cfg(test)]
#[path = "expand_manager_tests.rs"]
mod tests;
