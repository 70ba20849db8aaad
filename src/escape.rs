//! String escaping utilities (ambient stack; grounded on the teacher's
//! `escape.rs`). Backs the parameter-expander transform operators
//! `${x@Q}`/`${x@E}` (spec §4.3) and `expand_dollar_quote_translate`
//! (spec §6).

use itertools::Itertools;

use crate::error::{Error, ErrorKind};

/// Expands ANSI-C / `$'...'`-style backslash escapes in `s`.
///
/// # Errors
/// Returns an error if a numeric escape's digits don't form a valid number.
#[expect(clippy::too_many_lines)]
pub fn expand_ansi_c_escapes(s: &str) -> Result<String, Error> {
    let mut result = String::new();
    let mut it = s.chars();
    while let Some(c) = it.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }

        match it.next() {
            Some('a') => result.push('\x07'),
            Some('b') => result.push('\x08'),
            Some('e' | 'E') => result.push('\x1b'),
            Some('f') => result.push('\x0c'),
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('v') => result.push('\x0b'),
            Some('\\') => result.push('\\'),
            Some('\'') => result.push('\''),
            Some('"') => result.push('"'),
            Some('?') => result.push('?'),
            Some(d @ '0'..='7') => {
                let mut taken = 1;
                let mut octal = String::new();
                octal.push(d);
                octal.extend(it.take_while_ref(|c| {
                    if taken < 3 && matches!(*c, '0'..='7') {
                        taken += 1;
                        true
                    } else {
                        false
                    }
                }));
                let value = u8::from_str_radix(&octal, 8)
                    .map_err(|_| ErrorKind::Unsupported("invalid octal escape"))?;
                result.push(value as char);
            }
            Some('x') => {
                let mut taken = 0;
                let hex: String = it
                    .take_while_ref(|c| {
                        if taken < 2 && c.is_ascii_hexdigit() {
                            taken += 1;
                            true
                        } else {
                            false
                        }
                    })
                    .collect();
                if hex.is_empty() {
                    result.push('\\');
                    result.push('x');
                } else {
                    let value = u8::from_str_radix(&hex, 16)
                        .map_err(|_| ErrorKind::Unsupported("invalid hex escape"))?;
                    result.push(value as char);
                }
            }
            Some('u') => push_unicode_escape(&mut it, &mut result, 4)?,
            Some('U') => push_unicode_escape(&mut it, &mut result, 8)?,
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    Ok(result)
}

fn push_unicode_escape(
    it: &mut std::str::Chars<'_>,
    result: &mut String,
    max_digits: usize,
) -> Result<(), Error> {
    let mut taken = 0;
    let hex: String = it
        .take_while_ref(|c| {
            if taken < max_digits && c.is_ascii_hexdigit() {
                taken += 1;
                true
            } else {
                false
            }
        })
        .collect();
    if hex.is_empty() {
        result.push('\\');
        result.push(if max_digits == 4 { 'u' } else { 'U' });
    } else {
        let value = u32::from_str_radix(&hex, 16)
            .map_err(|_| ErrorKind::Unsupported("invalid unicode escape"))?;
        if let Some(c) = char::from_u32(value) {
            result.push(c);
        }
    }
    Ok(())
}

/// Produces a single-quoted (or, if necessary, `$'...'`-ANSI-C-quoted)
/// rendering of `s` that is safe to re-parse as shell input. Backs
/// `${x@Q}`.
#[must_use]
pub fn quote_for_reuse(s: &str) -> String {
    if s.contains(|c: char| c.is_control() && c != '\t') {
        ansi_c_quote(s)
    } else if s.is_empty() {
        "''".to_string()
    } else if s.contains(['\'', ' ', '\t', '$', '`', '"', '\\', '!', '*', '?', '(', ')', '{', '}', '|', '&', ';', '<', '>']) {
        single_quote(s)
    } else {
        s.to_string()
    }
}

fn single_quote(s: &str) -> String {
    let mut result = String::new();
    let mut first = true;
    for part in s.split('\'') {
        if !first {
            result.push_str("\\'");
        } else {
            first = false;
        }
        if !part.is_empty() {
            result.push('\'');
            result.push_str(part);
            result.push('\'');
        }
    }
    result
}

fn ansi_c_quote(s: &str) -> String {
    let mut result = String::from("$'");
    for c in s.chars() {
        match c {
            '\x07' => result.push_str("\\a"),
            '\x08' => result.push_str("\\b"),
            '\x1b' => result.push_str("\\E"),
            '\x0c' => result.push_str("\\f"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\x0b' => result.push_str("\\v"),
            '\\' => result.push_str("\\\\"),
            '\'' => result.push_str("\\'"),
            c if c.is_control() => result.push_str(&std::format!("\\{:03o}", c as u8)),
            _ => result.push(c),
        }
    }
    result.push('\'');
    result
}

/// `expand_dollar_quote_translate` (spec §6): translate a string so that,
/// if re-fed through `$'...'`, it reproduces the original `s`. Used by
/// prompt/history machinery to round-trip literal control characters.
#[must_use]
pub fn expand_dollar_quote_translate(s: &str) -> String {
    let inner = &ansi_c_quote(s);
    inner
        .strip_prefix("$'")
        .and_then(|v| v.strip_suffix('\''))
        .unwrap_or(inner)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ansi_c_common_escapes() {
        assert_eq!(expand_ansi_c_escapes(r"a\nb").unwrap(), "a\nb");
        assert_eq!(expand_ansi_c_escapes(r"\t").unwrap(), "\t");
        assert_eq!(expand_ansi_c_escapes(r"\\").unwrap(), "\\");
        assert_eq!(expand_ansi_c_escapes(r"\101").unwrap(), "A");
        assert_eq!(expand_ansi_c_escapes(r"\x41").unwrap(), "A");
        assert_eq!(expand_ansi_c_escapes(r"A").unwrap(), "A");
    }

    #[test]
    fn quote_for_reuse_plain() {
        assert_eq!(quote_for_reuse("abc"), "abc");
        assert_eq!(quote_for_reuse(""), "''");
        assert_eq!(quote_for_reuse("a b"), "'a b'");
        assert_eq!(quote_for_reuse("it's"), "'it'\\''s'");
    }
}
