//! UTF-16 code-unit offset helpers.
//!
//! Field offsets follow the host platform's native string indexing (UTF-16
//! code units), while Rust strings index by bytes. These helpers convert
//! between the two, clamping offsets that land past the end or inside a
//! surrogate pair to the preceding char boundary.

/// Length of `s` in UTF-16 code units
pub fn len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

/// Byte index in `s` corresponding to a UTF-16 offset
pub fn byte_index(s: &str, offset: usize) -> usize {
    let mut units = 0;
    for (idx, ch) in s.char_indices() {
        if units + ch.len_utf16() > offset {
            return idx;
        }
        units += ch.len_utf16();
    }
    s.len()
}

/// UTF-16 offset corresponding to a byte index in `s`
pub fn offset_of(s: &str, byte_idx: usize) -> usize {
    len(&s[..byte_idx.min(s.len())])
}

/// Slice of `s` between two UTF-16 offsets
pub fn slice(s: &str, start: usize, end: usize) -> &str {
    let start = byte_index(s, start);
    let end = byte_index(s, end).max(start);
    &s[start..end]
}

/// Text before a UTF-16 offset
pub fn prefix(s: &str, offset: usize) -> &str {
    &s[..byte_index(s, offset)]
}

/// Replace `[start, start + count)` (UTF-16 units) with `replacement`
pub fn splice(s: &str, start: usize, count: usize, replacement: &str) -> String {
    let start_byte = byte_index(s, start);
    let end_byte = byte_index(s, start.saturating_add(count)).max(start_byte);
    let mut out = String::with_capacity(s.len() + replacement.len());
    out.push_str(&s[..start_byte]);
    out.push_str(replacement);
    out.push_str(&s[end_byte..]);
    out
}
