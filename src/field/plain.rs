use super::{utf16, PlainEditable, ReplacePath};

/// Splice the value directly, then refocus and collapse the selection
pub(super) fn replace(
    field: &mut dyn PlainEditable,
    start: usize,
    len: usize,
    new_text: &str,
) -> ReplacePath {
    let old = field.value();
    let value = utf16::splice(old, start, len, new_text);
    // The splice clamps a start inside a surrogate pair back to the pair
    let start = utf16::offset_of(old, utf16::byte_index(old, start));
    field.set_value(value);

    let caret = start + utf16::len(new_text);
    field.focus();
    field.set_selection_range(caret, caret);
    ReplacePath::PlainSplice
}
