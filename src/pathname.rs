//! Pathname expander (spec §4.10): dispatches glob-meta-containing words to
//! the host's [`ExpanderContext::glob`] and applies default/failglob/nullglob
//! policy to the no-match case.

use crate::config::ExpanderConfig;
use crate::context::ExpanderContext;
use crate::error::{Error, ErrorKind};
use crate::worddesc::{WordDesc, WordFlags};

/// Whether `word` contains an unquoted glob metacharacter (`*`, `?`, `[`).
/// Quote-escaped metas have already been rewritten to carry a preceding
/// `ESC` sentinel by the time this runs, so a bare, unescaped occurrence is
/// unambiguous.
#[must_use]
pub fn has_glob_meta(word: &str) -> bool {
    let bytes = word.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == crate::quoting::ESC {
            i += 2;
            continue;
        }
        if matches!(bytes[i], b'*' | b'?' | b'[') {
            return true;
        }
        i += 1;
    }
    false
}

/// Expands one word against the filesystem, per spec §4.10. Returns the
/// list of words that should replace it in the final output (one element
/// if no expansion was performed or applicable).
///
/// # Errors
/// Returns a fatal [`ErrorKind::NoGlobMatch`] under `failglob` when the
/// pattern had no matches.
pub fn expand_word(
    word: &WordDesc,
    ctx: &dyn ExpanderContext,
    cfg: &ExpanderConfig,
) -> Result<Vec<WordDesc>, Error> {
    if word.flags.contains(WordFlags::NO_GLOB) {
        return Ok(vec![word.clone()]);
    }

    let text = word.to_string_lossy();
    if !has_glob_meta(&text) {
        return Ok(vec![word.clone()]);
    }

    tracing::debug!(target: crate::trace_categories::GLOB, "expanding pattern: '{text}'");
    match ctx.glob(&text) {
        Some(matches) if !matches.is_empty() => {
            tracing::debug!(target: crate::trace_categories::GLOB, "  => {} match(es)", matches.len());
            Ok(matches
                .into_iter()
                .map(|m| WordDesc::with_flags(m, word.flags))
                .collect())
        }
        _ if cfg.fail_glob => Err(ErrorKind::NoGlobMatch(text.into_owned()).into()),
        _ if cfg.null_glob => Ok(Vec::new()),
        _ => Ok(vec![dequote_glob_escapes(word)]),
    }
}

/// On the no-match default path, the word is kept as-is but with its
/// glob-escape `ESC` sentinels removed (the literal text the user wrote,
/// not the pattern).
fn dequote_glob_escapes(word: &WordDesc) -> WordDesc {
    let mut out = Vec::with_capacity(word.bytes.len());
    let mut i = 0;
    while i < word.bytes.len() {
        if word.bytes[i] == crate::quoting::ESC && i + 1 < word.bytes.len() {
            out.push(word.bytes[i + 1]);
            i += 2;
        } else {
            out.push(word.bytes[i]);
            i += 1;
        }
    }
    WordDesc::with_flags(out, word.flags)
}
