//! Delimited substring extraction honoring shell quoting (spec §4.2).
//!
//! Every extractor consumes an index into a byte buffer and advances it to
//! the character *after* the recognized construct. Backslash, single quote,
//! double quote, backtick, and nested `$( )`/`${ }` constructs are skipped
//! as transparent blocks while scanning for a top-level delimiter.

use crate::error::{Error, ErrorKind};

/// Controls what extractors do when an opener has no matching closer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnUnterminated {
    /// Return a fatal [`ErrorKind::BadSubstitution`].
    Fatal,
    /// Return the unclosed tail instead of failing (used by completion/
    /// readline callers per spec §4.2's "no-longjmp-on-fatal" flag).
    ReturnTail,
}

fn char_width(first_byte: u8, multibyte: bool) -> usize {
    if !multibyte {
        return 1;
    }
    if first_byte & 0b1000_0000 == 0 {
        1
    } else if first_byte & 0b1110_0000 == 0b1100_0000 {
        2
    } else if first_byte & 0b1111_0000 == 0b1110_0000 {
        3
    } else if first_byte & 0b1111_1000 == 0b1111_0000 {
        4
    } else {
        1
    }
}

/// Skips a single-quoted literal starting at `s[i] == '\''`. Content is
/// opaque; no backslash processing occurs inside single quotes.
pub(crate) fn skip_single_quoted(s: &[u8], i: usize) -> Option<usize> {
    debug_assert_eq!(s.get(i).copied(), Some(b'\''));
    let mut j = i + 1;
    while j < s.len() {
        if s[j] == b'\'' {
            return Some(j + 1);
        }
        j += 1;
    }
    None
}

/// Skips a double-quoted literal starting at `s[i] == '"'`. Backslash is
/// only special before `$`, `` ` ``, `"`, `\`, newline, but for boundary
/// detection we treat a backslash as shielding whatever follows it, which
/// is a superset that still finds the correct matching quote.
pub(crate) fn skip_double_quoted(s: &[u8], i: usize, multibyte: bool) -> Option<usize> {
    debug_assert_eq!(s.get(i).copied(), Some(b'"'));
    let mut j = i + 1;
    while j < s.len() {
        match s[j] {
            b'\\' => {
                j = (j + 2).min(s.len());
            }
            b'"' => return Some(j + 1),
            b'`' => j = skip_backtick(s, j, multibyte)?,
            b'$' if matches!(s.get(j + 1), Some(b'(')) => {
                j = scan_balanced(s, j + 2, b'(', b')', multibyte)?;
            }
            b'$' if matches!(s.get(j + 1), Some(b'{')) => {
                j = scan_balanced(s, j + 2, b'{', b'}', multibyte)?;
            }
            _ => j += char_width(s[j], multibyte),
        }
    }
    None
}

/// Skips a backtick-delimited command substitution starting at `s[i] == '`'`.
/// Only `\$`, `` \` ``, `\\` are special inside.
fn skip_backtick(s: &[u8], i: usize, multibyte: bool) -> Option<usize> {
    debug_assert_eq!(s.get(i).copied(), Some(b'`'));
    let mut j = i + 1;
    while j < s.len() {
        match s[j] {
            b'\\' if matches!(s.get(j + 1), Some(b'$' | b'`' | b'\\')) => j += 2,
            b'`' => return Some(j + 1),
            _ => j += char_width(s[j], multibyte),
        }
    }
    None
}

/// Advances past exactly one "construct" at `s[i]`: a quoted literal, a
/// nested `$(`/`${`/`$[` form, or a single plain (possibly multibyte)
/// character. Used by [`scan_balanced`] and [`extract_to_delim`] so that
/// delimiters or bracket characters inside quotes/nested substitutions are
/// never mistaken for top-level structure.
fn advance_one(s: &[u8], i: usize, multibyte: bool) -> Option<usize> {
    match s.get(i).copied()? {
        b'\\' => Some((i + 2).min(s.len())),
        b'\'' => skip_single_quoted(s, i),
        b'"' => skip_double_quoted(s, i, multibyte),
        b'`' => skip_backtick(s, i, multibyte),
        b'$' if matches!(s.get(i + 1), Some(b'(')) => {
            scan_balanced(s, i + 2, b'(', b')', multibyte)
        }
        b'$' if matches!(s.get(i + 1), Some(b'{')) => {
            scan_balanced(s, i + 2, b'{', b'}', multibyte)
        }
        b'$' if matches!(s.get(i + 1), Some(b'[')) => {
            scan_balanced(s, i + 2, b'[', b']', multibyte)
        }
        c => Some(i + char_width(c, multibyte)),
    }
}

/// Scans from `i` (just past an already-consumed opener) until a matching
/// `close`, honoring nested `open`/`close` pairs and transparently skipping
/// quoted/substitution constructs in between. Returns the index just past
/// the matching `close`.
fn scan_balanced(s: &[u8], mut i: usize, open: u8, close: u8, multibyte: bool) -> Option<usize> {
    let mut depth = 1usize;
    while i < s.len() {
        match s[i] {
            b if b == close => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            b if b == open => {
                depth += 1;
                i += 1;
            }
            _ => i = advance_one(s, i, multibyte)?,
        }
    }
    None
}

fn unterminated(
    closer: char,
    context: &[u8],
    on_unterminated: OnUnterminated,
    tail_from: usize,
) -> Result<(Vec<u8>, usize), Error> {
    match on_unterminated {
        OnUnterminated::Fatal => Err(ErrorKind::BadSubstitution(
            closer,
            String::from_utf8_lossy(context).into_owned(),
        )
        .into()),
        OnUnterminated::ReturnTail => Ok((context[tail_from..].to_vec(), context.len())),
    }
}

/// Finds the first unquoted occurrence of any byte in `delims`, starting at
/// `from`. Returns `(content_before_delim, index_of_delim)`; the delimiter
/// itself is *not* consumed (callers that need it consumed can add one).
pub fn extract_to_delim(
    s: &[u8],
    from: usize,
    delims: &[u8],
    multibyte: bool,
) -> Option<(Vec<u8>, usize)> {
    let mut i = from;
    while i < s.len() {
        if delims.contains(&s[i]) {
            return Some((s[from..i].to_vec(), i));
        }
        i = advance_one(s, i, multibyte)?;
    }
    Some((s[from..].to_vec(), i))
}

/// Extracts a single-quoted literal; `from` must point at the opening `'`.
/// Returns `(content, index_after_closing_quote)`.
pub fn extract_single_quoted(
    s: &[u8],
    from: usize,
    on_unterminated: OnUnterminated,
) -> Result<(Vec<u8>, usize), Error> {
    match skip_single_quoted(s, from) {
        Some(end) => Ok((s[from + 1..end - 1].to_vec(), end)),
        None => unterminated(b'\'' as char, s, on_unterminated, from),
    }
}

/// Extracts a double-quoted literal; `from` must point at the opening `"`.
/// Returns `(content, index_after_closing_quote)`.
pub fn extract_double_quoted(
    s: &[u8],
    from: usize,
    multibyte: bool,
    on_unterminated: OnUnterminated,
) -> Result<(Vec<u8>, usize), Error> {
    match skip_double_quoted(s, from, multibyte) {
        Some(end) => Ok((s[from + 1..end - 1].to_vec(), end)),
        None => unterminated('"', s, on_unterminated, from),
    }
}

/// Extracts the inner text of a `$( ... )` or `` `...` `` command
/// substitution. `from` must point just past the opener (`$(` or `` ` ``).
/// `backtick` selects which closing delimiter is expected.
pub fn extract_command_subst(
    s: &[u8],
    from: usize,
    backtick: bool,
    multibyte: bool,
    on_unterminated: OnUnterminated,
) -> Result<(Vec<u8>, usize), Error> {
    if backtick {
        match skip_backtick_from(s, from, multibyte) {
            Some(end) => Ok((s[from..end - 1].to_vec(), end)),
            None => unterminated('`', s, on_unterminated, from),
        }
    } else {
        match scan_balanced(s, from, b'(', b')', multibyte) {
            Some(end) => Ok((s[from..end - 1].to_vec(), end)),
            None => unterminated(')', s, on_unterminated, from),
        }
    }
}

fn skip_backtick_from(s: &[u8], from: usize, multibyte: bool) -> Option<usize> {
    let mut j = from;
    while j < s.len() {
        match s[j] {
            b'\\' if matches!(s.get(j + 1), Some(b'$' | b'`' | b'\\')) => j += 2,
            b'`' => return Some(j + 1),
            _ => j += char_width(s[j], multibyte),
        }
    }
    None
}

/// Extracts the inner text of a `${ ... }` form. `from` must point just
/// past the `${` opener.
pub fn extract_dollar_brace_string(
    s: &[u8],
    from: usize,
    multibyte: bool,
    on_unterminated: OnUnterminated,
) -> Result<(Vec<u8>, usize), Error> {
    match scan_balanced(s, from, b'{', b'}', multibyte) {
        Some(end) => Ok((s[from..end - 1].to_vec(), end)),
        None => unterminated('}', s, on_unterminated, from),
    }
}

/// Extracts the inner text of a `<( ... )` or `>( ... )` process
/// substitution. `from` must point just past the opener's `(`.
pub fn extract_process_subst(
    s: &[u8],
    from: usize,
    multibyte: bool,
    on_unterminated: OnUnterminated,
) -> Result<(Vec<u8>, usize), Error> {
    match scan_balanced(s, from, b'(', b')', multibyte) {
        Some(end) => Ok((s[from..end - 1].to_vec(), end)),
        None => unterminated(')', s, on_unterminated, from),
    }
}

/// Extracts a bracket-balanced `[ ... ]` array subscript. `from` must point
/// just past the opening `[`.
pub fn extract_array_subscript(
    s: &[u8],
    from: usize,
    multibyte: bool,
    on_unterminated: OnUnterminated,
) -> Result<(Vec<u8>, usize), Error> {
    match scan_balanced(s, from, b'[', b']', multibyte) {
        Some(end) => Ok((s[from..end - 1].to_vec(), end)),
        None => unterminated(']', s, on_unterminated, from),
    }
}
