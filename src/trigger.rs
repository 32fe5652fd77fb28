//! Trigger detection - finds the `/keyword` token ending at the caret.
//!
//! A trigger is a `/` followed by a run of characters that are not
//! whitespace, `/` or `\`, and it must reach the caret unbroken. Only the
//! text before the caret is inspected.
//!
//! Two forms exist:
//! - [`detect_partial`] drives live suggestions; the keyword part may be
//!   empty (the user has only typed `/`).
//! - [`detect_complete`] drives the direct-commit chord; the keyword part
//!   must be a stored keyword.

use std::sync::LazyLock;

use regex::Regex;

use crate::field::utf16;
use crate::store::MappingTable;

static PARTIAL_TRIGGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/([^\s/\\]*)$").expect("trigger pattern is valid"));

/// The active trigger relative to the bound field's text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerMatch {
    /// Token as typed, slash included (e.g. `/foo`)
    pub raw_token: String,
    /// Token without the slash (e.g. `foo`)
    pub keyword_part: String,
    /// UTF-16 offset of the slash
    pub start_offset: usize,
}

impl TriggerMatch {
    /// Length of the raw token in UTF-16 units
    pub fn len(&self) -> usize {
        utf16::len(&self.raw_token)
    }

    pub fn is_empty(&self) -> bool {
        self.raw_token.is_empty()
    }

    /// Caret offset the trigger ends at
    pub fn end_offset(&self) -> usize {
        self.start_offset + self.len()
    }
}

/// Trigger ending at `caret`, keyword part possibly empty.
///
/// A caret past the end of `text` is treated as being at the end.
pub fn detect_partial(text: &str, caret: usize) -> Option<TriggerMatch> {
    let before = utf16::prefix(text, caret);
    let captures = PARTIAL_TRIGGER.captures(before)?;
    let whole = captures.get(0)?;
    let keyword = captures.get(1)?;

    Some(TriggerMatch {
        raw_token: whole.as_str().to_string(),
        keyword_part: keyword.as_str().to_string(),
        start_offset: utf16::offset_of(before, whole.start()),
    })
}

/// Trigger ending at `caret` whose keyword part is a stored keyword
pub fn detect_complete(text: &str, caret: usize, mappings: &MappingTable) -> Option<TriggerMatch> {
    detect_partial(text, caret)
        .filter(|trigger| !trigger.keyword_part.is_empty())
        .filter(|trigger| mappings.contains(&trigger.keyword_part))
}
