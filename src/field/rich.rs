use tracing::{debug, warn};

use super::{utf16, CaretRun, ReplacePath, RichEditable};
use crate::error::FieldError;

/// Replace a token in a rich-text region.
///
/// Tries a localized edit of the caret's text node first, then editing
/// commands, then a wholesale rewrite of the flattened text.
pub(super) fn replace(
    field: &mut dyn RichEditable,
    start: usize,
    len: usize,
    new_text: &str,
) -> Result<ReplacePath, FieldError> {
    let flattened = field.text_content();
    let token = utf16::slice(&flattened, start, start + len).to_string();
    if token.is_empty() {
        return Err(FieldError::TokenNotFound(token));
    }

    // Node edits and editing commands both act at the caret, so they only
    // apply when the caret sits right after the token
    if field.caret_offset() != Some(start + len) {
        debug!(
            caret = ?field.caret_offset(),
            token_end = start + len,
            "Caret not at token end, rewriting flattened text"
        );
        rewrite_flattened(field, &flattened, start, &token, new_text);
        return Ok(ReplacePath::FlattenedRewrite);
    }

    match field.caret_run() {
        Some(run) => {
            if let Some(search_start) = token_before_caret(&run, &token) {
                match field.splice_caret_run(search_start, run.offset, new_text) {
                    Ok(()) => return Ok(ReplacePath::DirectTextNode),
                    Err(error) => {
                        warn!(error = %error, "Text node edit failed, trying editing commands");
                    }
                }
            }
        }
        None => debug!("Caret is not inside a text node"),
    }

    if field.supports_edit_commands() {
        match apply_edit_commands(field, &token, new_text) {
            Ok(()) => return Ok(ReplacePath::EditCommands),
            Err(error) => {
                warn!(error = %error, "Editing commands failed, rewriting flattened text");
            }
        }
    } else {
        debug!("Editing commands unavailable, rewriting flattened text");
    }

    rewrite_flattened(field, &flattened, start, &token, new_text);
    Ok(ReplacePath::FlattenedRewrite)
}

/// Start of the token inside the caret's node, if the node holds it verbatim
/// immediately before the caret
fn token_before_caret(run: &CaretRun, token: &str) -> Option<usize> {
    let token_len = utf16::len(token);
    if run.offset < token_len {
        return None;
    }

    let search_start = run.offset - token_len;
    if utf16::slice(&run.text, search_start, run.offset) == token {
        Some(search_start)
    } else {
        debug!(
            token = %token,
            run_len = utf16::len(&run.text),
            "Token not contained in caret text node"
        );
        None
    }
}

fn apply_edit_commands(
    field: &mut dyn RichEditable,
    token: &str,
    new_text: &str,
) -> Result<(), FieldError> {
    for _ in token.chars() {
        field.delete_backward()?;
    }
    field.insert_text(new_text)
}

/// Last resort: swap the trailing token in the flattened text and overwrite
/// the region.
///
/// Works from the text captured before any editing command ran, so a
/// half-applied command sequence is discarded.
fn rewrite_flattened(
    field: &mut dyn RichEditable,
    flattened: &str,
    start: usize,
    token: &str,
    new_text: &str,
) {
    let at = utf16::byte_index(flattened, start);

    let mut rewritten = String::with_capacity(flattened.len() + new_text.len());
    rewritten.push_str(&flattened[..at]);
    rewritten.push_str(new_text);
    rewritten.push_str(&flattened[at + token.len()..]);

    let caret = utf16::offset_of(flattened, at) + utf16::len(new_text);
    field.set_text_content(rewritten, caret);
}
