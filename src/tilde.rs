//! Tilde expansion (spec §1 step 2, §4.6, §9 "Brace and tilde engines").
//!
//! The actual home-directory resolution is delegated to the host via
//! [`ExpanderContext::tilde_expand`]; this module only recognizes tilde
//! prefixes (`~`, `~user`, `~+`, `~-`, `~N`) and decides where, within a
//! word, tilde expansion is permitted to occur (start of word, and after
//! `=`/`:` in assignment-like words per spec §4.6's `assignoff`/
//! `internal_tilde` state).

use crate::context::ExpanderContext;

/// Scans `word` starting at `start` for a tilde prefix (`word[start]` must
/// be `~`). Returns `(prefix, end_index)` where `prefix` is the text
/// between the `~` and the first `/`, `:`, or end of word, suitable for
/// passing to `tilde_expand`.
#[must_use]
pub fn scan_prefix(word: &str, start: usize) -> (String, usize) {
    debug_assert_eq!(word.as_bytes().get(start), Some(&b'~'));
    let rest = &word[start + 1..];
    let end_offset = rest
        .find(|c| c == '/' || c == ':')
        .unwrap_or(rest.len());
    (rest[..end_offset].to_string(), start + 1 + end_offset)
}

/// Attempts to expand a tilde prefix beginning at `start` in `word`
/// (`word[start] == '~'`). Returns `Some((replacement, end_index))` if the
/// host resolved it, or `None` if it should be left as literal text (e.g.
/// `~nosuchuser`).
#[must_use]
pub fn try_expand(word: &str, start: usize, ctx: &dyn ExpanderContext) -> Option<(String, usize)> {
    let (prefix, end) = scan_prefix(word, start);
    ctx.tilde_expand(&prefix).map(|home| (home, end))
}

/// Whether tilde expansion may start at byte offset `i` of `word`, given
/// the offset of the word's first unquoted `=` (`assign_offset`, from
/// spec's `assignoff`) and whether the previous significant character was
/// `:` inside an assignment-like word (`after_colon`).
#[must_use]
pub fn is_tilde_expansion_point(i: usize, assign_offset: Option<usize>, after_colon: bool) -> bool {
    i == 0 || assign_offset == Some(i.wrapping_sub(1)) || after_colon
}
