//! Field adapter - uniform text access over the two kinds of editable fields.
//!
//! Plain fields (inputs, textareas) expose a string value and a selection
//! start. Rich-text fields (contenteditable regions) expose a sequence of
//! formatted text nodes and a DOM-style caret. [`FieldRef`] is a tagged
//! variant over both so call sites never type-check the element.
//!
//! All offsets are UTF-16 code units, consistent with the host platform's
//! native string indexing.
//!
//! # Module Structure
//!
//! - `utf16` - offset conversion helpers
//! - `plain` - value splice for plain fields
//! - `rich` - the replacement ladder for rich-text fields

mod plain;
mod rich;
pub mod utf16;

use tracing::debug;

use crate::error::FieldError;
use crate::host::ElementId;

/// Which text model a field uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Plain,
    RichText,
}

/// A bound field: element identity, kind tag and the binding generation.
///
/// The generation changes on every bind, so work queued against an older
/// binding of the same element can be told apart and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldHandle {
    pub id: ElementId,
    pub kind: FieldKind,
    pub generation: u64,
}

/// Notifications synthesized on a field after its text changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEvent {
    Input,
    Change,
}

/// How a replacement was carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacePath {
    /// Substring splice on a plain field's value
    PlainSplice,
    /// Localized edit of the text node holding the caret
    DirectTextNode,
    /// Delete-character and insert-text editing commands
    EditCommands,
    /// Whole-element text overwrite; internal formatting is lost
    FlattenedRewrite,
}

/// A plain editable control: a value string plus a selection
pub trait PlainEditable {
    fn value(&self) -> &str;

    /// Selection start, `None` when the control exposes no selection
    fn selection_start(&self) -> Option<usize>;

    fn set_value(&mut self, value: String);

    fn set_selection_range(&mut self, start: usize, end: usize);

    fn focus(&mut self);

    fn dispatch(&mut self, event: FieldEvent);
}

/// The text node that currently holds the caret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaretRun {
    pub text: String,
    /// Caret offset within `text`
    pub offset: usize,
}

/// A rich-text editable region
pub trait RichEditable {
    /// Flattened text of every text node, markup excluded
    fn text_content(&self) -> String;

    /// Caret measured against [`RichEditable::text_content`]
    fn caret_offset(&self) -> Option<usize>;

    fn caret_run(&self) -> Option<CaretRun>;

    /// Replace `[start, end)` of the caret's text node and collapse the
    /// caret to `start + len(text)` in that node
    fn splice_caret_run(&mut self, start: usize, end: usize, text: &str)
        -> Result<(), FieldError>;

    fn supports_edit_commands(&self) -> bool;

    /// Delete one character before the caret
    fn delete_backward(&mut self) -> Result<(), FieldError>;

    /// Insert text at the caret
    fn insert_text(&mut self, text: &str) -> Result<(), FieldError>;

    /// Overwrite the whole region with unformatted text
    fn set_text_content(&mut self, text: String, caret: usize);

    fn dispatch(&mut self, event: FieldEvent);
}

/// Borrowed access to one editable field, tagged by kind
pub enum FieldRef<'a> {
    Plain(&'a mut dyn PlainEditable),
    RichText(&'a mut dyn RichEditable),
}

impl FieldRef<'_> {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldRef::Plain(_) => FieldKind::Plain,
            FieldRef::RichText(_) => FieldKind::RichText,
        }
    }

    pub fn text(&self) -> String {
        match self {
            FieldRef::Plain(field) => field.value().to_string(),
            FieldRef::RichText(field) => field.text_content(),
        }
    }

    /// Caret offset; fields without a selection read as 0
    pub fn caret_offset(&self) -> usize {
        match self {
            FieldRef::Plain(field) => field.selection_start().unwrap_or(0),
            FieldRef::RichText(field) => field.caret_offset().unwrap_or(0),
        }
    }

    /// Replace `len` units at `start` with `new_text`, leave the caret at
    /// `start + len(new_text)` and notify the field with input and change
    /// events.
    pub fn replace_span(
        &mut self,
        start: usize,
        len: usize,
        new_text: &str,
    ) -> Result<ReplacePath, FieldError> {
        let path = match self {
            FieldRef::Plain(field) => plain::replace(&mut **field, start, len, new_text),
            FieldRef::RichText(field) => rich::replace(&mut **field, start, len, new_text)?,
        };

        debug!(
            kind = ?self.kind(),
            path = ?path,
            start,
            len,
            inserted = utf16::len(new_text),
            "Replaced field span"
        );

        self.dispatch(FieldEvent::Input);
        self.dispatch(FieldEvent::Change);
        Ok(path)
    }

    fn dispatch(&mut self, event: FieldEvent) {
        match self {
            FieldRef::Plain(field) => field.dispatch(event),
            FieldRef::RichText(field) => field.dispatch(event),
        }
    }
}
