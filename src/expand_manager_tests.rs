use super::*;
use std::time::Duration;

use crate::field::{FieldKind, PlainEditable};
use crate::page::{Page, RichTextBlock, TextNode};
use crate::store::{MappingStore, MemoryStore};

const MAPPINGS: &[(&str, &str)] = &[
    ("foo", "Foo Bar"),
    ("foobar", "Foo Bar Baz"),
    ("bar", "Just Bar"),
    ("sig", "Sig"),
];

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn client() -> Arc<MappingStoreClient> {
    let store = MemoryStore::with_mappings(MAPPINGS.iter().copied());
    let client = MappingStoreClient::new();
    assert!(client.reload(&store));
    Arc::new(client)
}

fn manager() -> ExpandManager {
    ExpandManager::new(Config::default(), client())
}

/// Page with one focused, bound textarea
fn bound_textarea(manager: &mut ExpandManager, value: &str) -> (Page, ElementId) {
    let mut page = Page::new();
    let id = page.add_textarea(value);
    page.focus(id);
    manager.focus_in(&mut page, id);
    (page, id)
}

/// Type, then let the debounce run out
fn type_and_settle(
    manager: &mut ExpandManager,
    page: &mut Page,
    id: ElementId,
    text: &str,
    now: Instant,
) -> Instant {
    page.type_text(id, text);
    manager.input(id, now);
    let settled = now + ms(100);
    manager.poll(page, settled);
    settled
}

fn key(manager: &mut ExpandManager, page: &mut Page, id: ElementId, key: Key) -> KeyDisposition {
    manager.handle_key(page, id, KeyEvent::plain(key))
}

#[test]
fn test_debounce_coalesces_inputs_into_one_refresh() {
    let mut manager = manager();
    let (mut page, id) = bound_textarea(&mut manager, "");
    let t0 = Instant::now();

    page.type_text(id, "/");
    manager.input(id, t0);
    page.type_text(id, "f");
    manager.input(id, t0 + ms(30));
    page.type_text(id, "o");
    manager.input(id, t0 + ms(60));

    manager.poll(&mut page, t0 + ms(100));
    assert_eq!(manager.stats().refreshes, 0);
    assert!(!manager.is_panel_visible());

    manager.poll(&mut page, t0 + ms(160));
    assert_eq!(manager.stats().refreshes, 1);
    assert_eq!(manager.trigger().unwrap().raw_token, "/fo");
    assert_eq!(manager.suggestions().items(), ["foo", "foobar"]);

    let panel = page.panel().unwrap();
    assert_eq!(panel.items.len(), 2);
    assert_eq!(panel.selected_keyword(), Some("foo"));
    assert_eq!(page.panel_renders(), 1);
}

#[test]
fn test_next_deadline_tracks_pending_refresh() {
    let mut manager = manager();
    let (mut page, id) = bound_textarea(&mut manager, "");
    assert_eq!(manager.next_deadline(), None);

    let t0 = Instant::now();
    page.type_text(id, "/");
    manager.input(id, t0);
    assert_eq!(manager.next_deadline(), Some(t0 + ms(100)));

    manager.poll(&mut page, t0 + ms(100));
    assert_eq!(manager.next_deadline(), None);
}

#[test]
fn test_double_focus_binds_once() {
    let mut manager = manager();
    let (mut page, id) = bound_textarea(&mut manager, "");
    let first = manager.bound_handle().unwrap();

    manager.focus_in(&mut page, id);

    assert_eq!(manager.bound_handle(), Some(first));
    assert_eq!(manager.stats().observer_attachments, 1);
    assert_eq!(first.kind, FieldKind::Plain);
}

#[test]
fn test_non_editable_elements_are_not_bound() {
    let mut manager = manager();
    let mut page = Page::new();
    let password = page.add_input("password", "");
    page.focus(password);

    manager.focus_in(&mut page, password);

    assert_eq!(manager.binding(), Binding::Unbound);
    manager.input(password, Instant::now());
    assert_eq!(manager.next_deadline(), None);
}

#[test]
fn test_adopts_already_focused_element() {
    let mut manager = manager();
    let mut page = Page::new();
    let id = page.add_input("search", "");
    page.focus(id);

    manager.adopt_active_element(&mut page);

    assert_eq!(manager.bound_handle().map(|h| h.id), Some(id));
}

#[test]
fn test_suggestions_cover_all_keywords_for_bare_slash() {
    let mut manager = manager();
    let (mut page, id) = bound_textarea(&mut manager, "");

    type_and_settle(&mut manager, &mut page, id, "hi /", Instant::now());

    assert_eq!(manager.trigger().unwrap().keyword_part, "");
    assert_eq!(manager.suggestions().len(), MAPPINGS.len());
    assert!(manager.is_panel_visible());
}

#[test]
fn test_no_candidates_hides_panel_but_keeps_trigger() {
    let mut manager = manager();
    let (mut page, id) = bound_textarea(&mut manager, "");
    let t = type_and_settle(&mut manager, &mut page, id, "/fo", Instant::now());
    assert!(manager.is_panel_visible());

    type_and_settle(&mut manager, &mut page, id, "zz", t);

    assert!(!manager.is_panel_visible());
    assert!(page.panel().is_none());
    assert_eq!(manager.trigger().unwrap().raw_token, "/fozz");
}

#[test]
fn test_space_after_token_clears_trigger() {
    let mut manager = manager();
    let (mut page, id) = bound_textarea(&mut manager, "");
    let t = type_and_settle(&mut manager, &mut page, id, "/foo", Instant::now());

    type_and_settle(&mut manager, &mut page, id, " ", t);

    assert!(manager.trigger().is_none());
    assert!(manager.suggestions().is_empty());
    assert!(page.panel().is_none());
}

#[test]
fn test_arrows_move_selection_and_enter_commits() {
    let mut manager = manager();
    let (mut page, id) = bound_textarea(&mut manager, "");
    type_and_settle(&mut manager, &mut page, id, "x /foo", Instant::now());

    assert_eq!(key(&mut manager, &mut page, id, Key::ArrowDown), KeyDisposition::Consumed);
    assert_eq!(manager.suggestions().selected_index(), Some(1));
    assert_eq!(page.panel().unwrap().selected_keyword(), Some("foobar"));

    // Clamped at the last item
    assert_eq!(key(&mut manager, &mut page, id, Key::ArrowDown), KeyDisposition::Consumed);
    assert_eq!(manager.suggestions().selected_index(), Some(1));

    assert_eq!(key(&mut manager, &mut page, id, Key::ArrowUp), KeyDisposition::Consumed);
    assert_eq!(key(&mut manager, &mut page, id, Key::ArrowDown), KeyDisposition::Consumed);

    assert_eq!(key(&mut manager, &mut page, id, Key::Enter), KeyDisposition::Consumed);
    assert_eq!(page.text_of(id).unwrap(), "x Foo Bar Baz");
    assert_eq!(page.plain(id).unwrap().selection(), Some((13, 13)));
    assert!(manager.trigger().is_none());
    assert!(page.panel().is_none());
    assert_eq!(manager.stats().commits, 1);
}

#[test]
fn test_enter_commit_drops_refresh_scheduled_before_it() {
    let store = MemoryStore::with_mappings([("dir", "usr/bin"), ("bin", "Binary")]);
    let client = MappingStoreClient::new();
    assert!(client.reload(&store));
    let mut manager = ExpandManager::new(Config::default(), Arc::new(client));
    let (mut page, id) = bound_textarea(&mut manager, "");
    let t = type_and_settle(&mut manager, &mut page, id, "cd /di", Instant::now());

    // A keystroke lands, then Enter before its refresh fires
    page.type_text(id, "r");
    manager.input(id, t + ms(10));
    assert_eq!(key(&mut manager, &mut page, id, Key::Enter), KeyDisposition::Consumed);
    assert_eq!(page.text_of(id).unwrap(), "cd usr/bin");
    assert_eq!(manager.next_deadline(), None);

    // The phrase ends in a slash token, which must not reopen the panel
    manager.poll(&mut page, t + ms(200));
    assert!(manager.trigger().is_none());
    assert!(page.panel().is_none());
}

#[test]
fn test_keys_pass_through_without_panel() {
    let mut manager = manager();
    let (mut page, id) = bound_textarea(&mut manager, "plain text");

    for k in [Key::ArrowDown, Key::ArrowUp, Key::Enter, Key::Escape, Key::Other] {
        assert_eq!(key(&mut manager, &mut page, id, k), KeyDisposition::PassThrough);
    }
    assert_eq!(page.text_of(id).unwrap(), "plain text");
}

#[test]
fn test_escape_hides_panel_and_clears_trigger() {
    let mut manager = manager();
    let (mut page, id) = bound_textarea(&mut manager, "");
    type_and_settle(&mut manager, &mut page, id, "/ba", Instant::now());
    assert!(manager.is_panel_visible());

    assert_eq!(key(&mut manager, &mut page, id, Key::Escape), KeyDisposition::Consumed);

    assert!(!manager.is_panel_visible());
    assert!(manager.trigger().is_none());
    assert_eq!(page.text_of(id).unwrap(), "/ba");
}

#[test]
fn test_chord_commits_complete_trigger_without_panel() {
    let mut manager = manager();
    let (mut page, id) = bound_textarea(&mut manager, "see /foo");

    let disposition =
        manager.handle_key(&mut page, id, KeyEvent::with_modifiers(Key::Enter, Modifiers::ctrl()));

    assert_eq!(disposition, KeyDisposition::Consumed);
    assert_eq!(page.text_of(id).unwrap(), "see Foo Bar");
    assert_eq!(manager.stats().commits, 1);
}

#[test]
fn test_chord_with_panel_open_commits_selection() {
    let mut manager = manager();
    let (mut page, id) = bound_textarea(&mut manager, "");
    type_and_settle(&mut manager, &mut page, id, "/foo", Instant::now());
    let _ = key(&mut manager, &mut page, id, Key::ArrowDown);

    let disposition =
        manager.handle_key(&mut page, id, KeyEvent::with_modifiers(Key::Enter, Modifiers::ctrl()));

    assert_eq!(disposition, KeyDisposition::Consumed);
    assert_eq!(page.text_of(id).unwrap(), "Foo Bar Baz");
}

#[test]
fn test_chord_with_unknown_keyword_passes_through() {
    let mut manager = manager();
    let (mut page, id) = bound_textarea(&mut manager, "see /zzz");

    let disposition =
        manager.handle_key(&mut page, id, KeyEvent::with_modifiers(Key::Enter, Modifiers::ctrl()));

    assert_eq!(disposition, KeyDisposition::PassThrough);
    assert_eq!(page.text_of(id).unwrap(), "see /zzz");
    assert!(page.plain(id).unwrap().events().is_empty());
}

#[test]
fn test_chord_respects_configured_modifier() {
    let config = Config {
        commit_modifier: CommitModifier::Alt,
        ..Config::default()
    };
    let mut manager = ExpandManager::new(config, client());
    let (mut page, id) = bound_textarea(&mut manager, "/sig");

    let ctrl = manager.handle_key(&mut page, id, KeyEvent::with_modifiers(Key::Enter, Modifiers::ctrl()));
    assert_eq!(ctrl, KeyDisposition::PassThrough);

    let alt = Modifiers {
        alt: true,
        ..Modifiers::default()
    };
    let disposition = manager.handle_key(&mut page, id, KeyEvent::with_modifiers(Key::Enter, alt));
    assert_eq!(disposition, KeyDisposition::Consumed);
    assert_eq!(page.text_of(id).unwrap(), "Sig");
}

#[test]
fn test_click_during_grace_window_commits() {
    let mut manager = manager();
    let (mut page, id) = bound_textarea(&mut manager, "");
    let t = type_and_settle(&mut manager, &mut page, id, "hello /ba", Instant::now());

    // Pointer down on the panel blurs the field first
    manager.pointer_down(&mut page, PointerTarget::Panel);
    page.blur();
    manager.focus_out(id, t + ms(5));
    assert_eq!(manager.binding(), Binding::Unbound);
    assert!(manager.is_panel_visible());

    assert!(manager.suggestion_click(&mut page, 0));

    assert_eq!(page.text_of(id).unwrap(), "hello Just Bar");
    assert!(page.panel().is_none());
    assert_eq!(manager.next_deadline(), None);
}

#[test]
fn test_grace_window_lapse_hides_panel() {
    let mut manager = manager();
    let (mut page, id) = bound_textarea(&mut manager, "");
    let t = type_and_settle(&mut manager, &mut page, id, "/foo", Instant::now());

    manager.focus_out(id, t);
    assert_eq!(manager.next_deadline(), Some(t + ms(150)));

    manager.poll(&mut page, t + ms(149));
    assert!(manager.is_panel_visible());

    manager.poll(&mut page, t + ms(150));
    assert!(!manager.is_panel_visible());
    assert!(manager.trigger().is_none());
    assert!(!manager.suggestion_click(&mut page, 0));
    assert_eq!(page.text_of(id).unwrap(), "/foo");
}

#[test]
fn test_refocus_during_grace_keeps_panel() {
    let mut manager = manager();
    let (mut page, id) = bound_textarea(&mut manager, "");
    let t = type_and_settle(&mut manager, &mut page, id, "/foo", Instant::now());
    let before = manager.bound_handle().unwrap();

    manager.focus_out(id, t);
    manager.focus_in(&mut page, id);
    manager.poll(&mut page, t + ms(500));

    let after = manager.bound_handle().unwrap();
    assert_eq!(after.id, id);
    assert_ne!(after.generation, before.generation);
    assert!(manager.is_panel_visible());
    assert_eq!(key(&mut manager, &mut page, id, Key::Enter), KeyDisposition::Consumed);
    assert_eq!(page.text_of(id).unwrap(), "Foo Bar");
}

#[test]
fn test_focus_on_other_field_drops_panel_immediately() {
    let mut manager = manager();
    let (mut page, first) = bound_textarea(&mut manager, "");
    let t = type_and_settle(&mut manager, &mut page, first, "/foo", Instant::now());
    let second = page.add_input("text", "");

    manager.focus_out(first, t);
    page.focus(second);
    manager.focus_in(&mut page, second);

    assert!(!manager.is_panel_visible());
    assert!(manager.trigger().is_none());
    assert_eq!(manager.bound_handle().map(|h| h.id), Some(second));
    assert_eq!(manager.next_deadline(), None);
}

#[test]
fn test_focus_switch_without_focus_out_releases_previous() {
    let mut manager = manager();
    let (mut page, first) = bound_textarea(&mut manager, "");
    type_and_settle(&mut manager, &mut page, first, "/foo", Instant::now());
    let second = page.add_textarea("");

    manager.focus_in(&mut page, second);

    assert!(!manager.is_panel_visible());
    assert_eq!(manager.bound_handle().map(|h| h.id), Some(second));
    assert_eq!(manager.stats().observer_attachments, 2);
    // Keys for the old field are no longer ours
    assert_eq!(key(&mut manager, &mut page, first, Key::Enter), KeyDisposition::PassThrough);
}

#[test]
fn test_pending_refresh_is_dropped_on_focus_out() {
    let mut manager = manager();
    let (mut page, id) = bound_textarea(&mut manager, "");
    let t0 = Instant::now();
    page.type_text(id, "/foo");
    manager.input(id, t0);

    manager.focus_out(id, t0 + ms(10));
    manager.focus_in(&mut page, id);
    manager.poll(&mut page, t0 + ms(200));

    assert_eq!(manager.stats().refreshes, 0);
    assert!(!manager.is_panel_visible());
}

#[test]
fn test_removed_field_is_released_on_refresh() {
    let mut manager = manager();
    let (mut page, id) = bound_textarea(&mut manager, "");
    let t0 = Instant::now();
    page.type_text(id, "/foo");
    manager.input(id, t0);

    page.remove(id);
    manager.poll(&mut page, t0 + ms(100));

    assert_eq!(manager.binding(), Binding::Unbound);
    assert!(page.panel().is_none());
}

#[test]
fn test_click_after_field_removed_is_a_no_op() {
    let mut manager = manager();
    let (mut page, id) = bound_textarea(&mut manager, "");
    let t = type_and_settle(&mut manager, &mut page, id, "/foo", Instant::now());

    manager.focus_out(id, t);
    page.remove(id);

    assert!(!manager.suggestion_click(&mut page, 0));
    assert!(page.panel().is_none());
    assert!(manager.trigger().is_none());
    assert_eq!(manager.stats().commits, 0);
}

#[test]
fn test_stale_panel_selection_is_not_applied() {
    let mut manager = manager();
    let (mut page, id) = bound_textarea(&mut manager, "");
    type_and_settle(&mut manager, &mut page, id, "/foo", Instant::now());

    // Text changes under the panel before the debounce catches up
    page.plain_mut(id).unwrap().set_value("rewritten".to_string());

    assert_eq!(key(&mut manager, &mut page, id, Key::Enter), KeyDisposition::Consumed);
    assert_eq!(page.text_of(id).unwrap(), "rewritten");
    assert!(!manager.is_panel_visible());
    assert_eq!(manager.stats().commits, 0);
}

#[test]
fn test_pointer_down_outside_hides_panel() {
    let mut manager = manager();
    let (mut page, id) = bound_textarea(&mut manager, "");
    type_and_settle(&mut manager, &mut page, id, "/foo", Instant::now());

    manager.pointer_down(&mut page, PointerTarget::Element(id));
    assert!(manager.is_panel_visible());

    manager.pointer_down(&mut page, PointerTarget::Elsewhere);
    assert!(!manager.is_panel_visible());
    assert!(manager.trigger().is_none());
}

#[test]
fn test_hover_moves_selection() {
    let mut manager = manager();
    let (mut page, id) = bound_textarea(&mut manager, "");
    type_and_settle(&mut manager, &mut page, id, "/foo", Instant::now());
    let renders = page.panel_renders();

    manager.suggestion_hover(&mut page, 1);
    assert_eq!(page.panel().unwrap().selected_keyword(), Some("foobar"));
    assert_eq!(page.panel_renders(), renders + 1);

    // Hovering the selected row again does not redraw
    manager.suggestion_hover(&mut page, 1);
    assert_eq!(page.panel_renders(), renders + 1);
}

#[test]
fn test_panel_is_placed_under_the_field() {
    let mut manager = manager();
    let (mut page, id) = bound_textarea(&mut manager, "");
    type_and_settle(&mut manager, &mut page, id, "/foo", Instant::now());

    let rect = page.bounding_rect(id).unwrap();
    let placement = page.panel().unwrap().placement;
    assert_eq!(placement.top, rect.bottom());
    assert_eq!(placement.left, rect.left);
}

#[test]
fn test_rich_text_commit_through_panel() {
    let mut manager = manager();
    let mut page = Page::new();
    let id = page.add_contenteditable(RichTextBlock::new(vec![
        TextNode::marked("Hi", "i"),
        TextNode::plain(" "),
    ]));
    page.focus(id);
    manager.focus_in(&mut page, id);
    assert_eq!(manager.bound_handle().unwrap().kind, FieldKind::RichText);

    type_and_settle(&mut manager, &mut page, id, "/si", Instant::now());
    assert_eq!(manager.suggestions().items(), ["sig"]);

    assert_eq!(key(&mut manager, &mut page, id, Key::Enter), KeyDisposition::Consumed);
    assert_eq!(page.text_of(id).unwrap(), "Hi Sig");
    assert_eq!(page.rich(id).unwrap().nodes()[0], TextNode::marked("Hi", "i"));
}

#[test]
fn test_store_changes_show_up_in_next_refresh() {
    let store: Arc<dyn MappingStore> = Arc::new(MemoryStore::with_mappings(MAPPINGS.iter().copied()));
    let (client, _subscription) = MappingStoreClient::connect(Arc::clone(&store));
    let mut manager = ExpandManager::new(Config::default(), client);
    let (mut page, id) = bound_textarea(&mut manager, "");

    let t = type_and_settle(&mut manager, &mut page, id, "/ne", Instant::now());
    assert!(!manager.is_panel_visible());

    store.set("news", "Latest news").unwrap();
    type_and_settle(&mut manager, &mut page, id, "w", t);

    assert_eq!(manager.suggestions().items(), ["news"]);
    assert_eq!(key(&mut manager, &mut page, id, Key::Enter), KeyDisposition::Consumed);
    assert_eq!(page.text_of(id).unwrap(), "Latest news");
}

#[test]
fn test_modifiers_from_commit_modifier() {
    assert_eq!(Modifiers::from(CommitModifier::Ctrl), Modifiers::ctrl());
    let meta = Modifiers::from(CommitModifier::Meta);
    assert!(meta.meta && !meta.ctrl && !meta.alt && !meta.shift);
}
