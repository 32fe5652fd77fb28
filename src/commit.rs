//! Substitution executor - swaps a trigger token for its stored phrase.
//!
//! The trigger was captured when suggestions were last refreshed, so the
//! field may have moved on since. Before editing, the token is checked
//! against the live text: a longer token typed at the same slash wins, the
//! captured token is used if it is still in place, and anything else is a
//! stale trigger that must not be applied.

use tracing::{info, instrument};

use crate::error::{ExpandError, Result};
use crate::field::{utf16, FieldHandle, ReplacePath};
use crate::host::FieldHost;
use crate::store::MappingTable;
use crate::trigger::{detect_partial, TriggerMatch};

/// Result of a successful substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub keyword: String,
    /// The trigger that was actually replaced
    pub trigger: TriggerMatch,
    pub path: ReplacePath,
    /// Caret offset after the phrase
    pub caret: usize,
}

/// Replace `trigger` in the field behind `handle` with the phrase for
/// `keyword`. The mapping table is only read.
#[instrument(skip(host, mappings), fields(id = ?handle.id, token = %trigger.raw_token))]
pub fn commit(
    host: &mut dyn FieldHost,
    handle: &FieldHandle,
    trigger: &TriggerMatch,
    keyword: &str,
    mappings: &MappingTable,
) -> Result<CommitOutcome> {
    let phrase = mappings
        .get(keyword)
        .ok_or_else(|| ExpandError::UnknownKeyword(keyword.to_string()))?;

    if !host.is_attached(handle.id) {
        return Err(ExpandError::DetachedField(handle.id));
    }
    let mut field = host
        .field(handle.id)
        .ok_or(ExpandError::DetachedField(handle.id))?;
    if field.kind() != handle.kind {
        // Same id, different element model: not the field we bound
        return Err(ExpandError::DetachedField(handle.id));
    }

    let live = revalidate(&field.text(), field.caret_offset(), trigger)?;
    let path = field.replace_span(live.start_offset, live.len(), phrase)?;
    let caret = live.start_offset + utf16::len(phrase);

    info!(
        keyword,
        path = ?path,
        start = live.start_offset,
        caret,
        "Expanded keyword"
    );

    Ok(CommitOutcome {
        keyword: keyword.to_string(),
        trigger: live,
        path,
        caret,
    })
}

/// Match `captured` against the live field text
fn revalidate(text: &str, caret: usize, captured: &TriggerMatch) -> Result<TriggerMatch> {
    if let Some(fresh) = detect_partial(text, caret) {
        if fresh.start_offset == captured.start_offset {
            return Ok(fresh);
        }
    }

    let in_place = utf16::slice(text, captured.start_offset, captured.end_offset());
    if in_place == captured.raw_token {
        return Ok(captured.clone());
    }

    Err(ExpandError::StaleTrigger {
        raw_token: captured.raw_token.clone(),
        start_offset: captured.start_offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldKind, PlainEditable};
    use crate::host::ElementId;
    use crate::page::{Page, RichTextBlock, TextNode};

    fn mappings() -> MappingTable {
        [("abc", "ABC"), ("foo", "Foo Bar"), ("sig", "Best,\nSam")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn handle(id: ElementId, kind: FieldKind) -> FieldHandle {
        FieldHandle {
            id,
            kind,
            generation: 1,
        }
    }

    fn trigger(raw: &str, start: usize) -> TriggerMatch {
        TriggerMatch {
            raw_token: raw.to_string(),
            keyword_part: raw.trim_start_matches('/').to_string(),
            start_offset: start,
        }
    }

    #[test]
    fn test_replaces_mid_text_and_places_caret() {
        let mut page = Page::new();
        let id = page.add_textarea("text /abc end");
        page.plain_mut(id).unwrap().set_selection_range(9, 9);
        let table = mappings();

        let outcome = commit(
            &mut page,
            &handle(id, FieldKind::Plain),
            &trigger("/abc", 5),
            "abc",
            &table,
        )
        .unwrap();

        assert_eq!(page.text_of(id).unwrap(), "text ABC end");
        assert_eq!(outcome.caret, 8);
        assert_eq!(outcome.path, ReplacePath::PlainSplice);
        assert_eq!(page.plain(id).unwrap().selection(), Some((8, 8)));
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("abc"), Some("ABC"));
    }

    #[test]
    fn test_prefers_longer_token_typed_since_capture() {
        let mut page = Page::new();
        let id = page.add_textarea("hi /fo");
        page.type_text(id, "o");

        let outcome = commit(
            &mut page,
            &handle(id, FieldKind::Plain),
            &trigger("/fo", 3),
            "foo",
            &mappings(),
        )
        .unwrap();

        assert_eq!(page.text_of(id).unwrap(), "hi Foo Bar");
        assert_eq!(outcome.trigger.raw_token, "/foo");
    }

    #[test]
    fn test_uses_captured_token_when_caret_moved_away() {
        let mut page = Page::new();
        let id = page.add_textarea("x /abc y");
        page.plain_mut(id).unwrap().set_selection_range(0, 0);

        commit(
            &mut page,
            &handle(id, FieldKind::Plain),
            &trigger("/abc", 2),
            "abc",
            &mappings(),
        )
        .unwrap();

        assert_eq!(page.text_of(id).unwrap(), "x ABC y");
    }

    #[test]
    fn test_stale_trigger_is_rejected() {
        let mut page = Page::new();
        let id = page.add_textarea("nothing here");

        let err = commit(
            &mut page,
            &handle(id, FieldKind::Plain),
            &trigger("/abc", 3),
            "abc",
            &mappings(),
        )
        .unwrap_err();

        assert!(matches!(err, ExpandError::StaleTrigger { start_offset: 3, .. }));
        assert_eq!(page.text_of(id).unwrap(), "nothing here");
    }

    #[test]
    fn test_detached_field_is_rejected() {
        let mut page = Page::new();
        let id = page.add_textarea("/abc");
        page.remove(id);

        let err = commit(
            &mut page,
            &handle(id, FieldKind::Plain),
            &trigger("/abc", 0),
            "abc",
            &mappings(),
        )
        .unwrap_err();

        assert!(matches!(err, ExpandError::DetachedField(found) if found == id));
    }

    #[test]
    fn test_unknown_keyword_leaves_field_untouched() {
        let mut page = Page::new();
        let id = page.add_textarea("/nope");

        let err = commit(
            &mut page,
            &handle(id, FieldKind::Plain),
            &trigger("/nope", 0),
            "nope",
            &mappings(),
        )
        .unwrap_err();

        assert!(matches!(err, ExpandError::UnknownKeyword(ref k) if k == "nope"));
        assert_eq!(page.text_of(id).unwrap(), "/nope");
        assert!(page.plain(id).unwrap().events().is_empty());
    }

    #[test]
    fn test_rich_text_commit_keeps_formatting() {
        let mut page = Page::new();
        let id = page.add_contenteditable(RichTextBlock::new(vec![
            TextNode::marked("Dear", "b"),
            TextNode::plain(" team /sig"),
        ]));

        let outcome = commit(
            &mut page,
            &handle(id, FieldKind::RichText),
            &trigger("/sig", 10),
            "sig",
            &mappings(),
        )
        .unwrap();

        assert_eq!(outcome.path, ReplacePath::DirectTextNode);
        let block = page.rich(id).unwrap();
        assert_eq!(block.nodes()[0], TextNode::marked("Dear", "b"));
        assert_eq!(page.text_of(id).unwrap(), "Dear team Best,\nSam");
        assert_eq!(outcome.caret, 10 + utf16::len("Best,\nSam"));
    }

    #[test]
    fn test_kind_mismatch_counts_as_detached() {
        let mut page = Page::new();
        let id = page.add_textarea("/abc");

        let err = commit(
            &mut page,
            &handle(id, FieldKind::RichText),
            &trigger("/abc", 0),
            "abc",
            &mappings(),
        )
        .unwrap_err();

        assert!(matches!(err, ExpandError::DetachedField(_)));
    }
}
