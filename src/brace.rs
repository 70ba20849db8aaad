//! Brace expansion (spec §4.8), grounded on the teacher's
//! `braceexpansion.rs` iterator-combinator shape, retargeted from
//! `brush_parser::word::BraceExpressionOrText` onto a small local AST
//! produced by scanning raw word bytes directly (the parser that feeds
//! this engine is out of scope, so brace syntax recognition lives here).
//! Quoted spans are skipped wholesale via [`crate::extract`]'s quote
//! scanners, since braces don't cross quote boundaries: `"{a,b}"` is a
//! literal string, not a two-way expansion.

use itertools::Itertools;

use crate::extract::{skip_double_quoted, skip_single_quoted};

/// One piece of a brace expression: either literal text or a `{...}` group.
#[derive(Debug, Clone)]
enum Piece {
    Text(String),
    Expr(Vec<Member>),
}

/// One comma-separated alternative (or range) inside a `{...}` group.
#[derive(Debug, Clone)]
enum Member {
    NumberSequence { start: i64, end: i64, increment: i64 },
    CharSequence { start: char, end: char, increment: i64 },
    Child(Vec<Piece>),
}

/// Expands brace expressions in `word`, returning the sequence of resulting
/// strings (outermost left-to-right, ranges left-to-right with optional
/// step, per spec §9). If `word` contains no recognizable brace expression,
/// returns a single-element vector containing `word` unchanged. Single- and
/// double-quoted spans are passed through verbatim, quote characters
/// included, since they run before quote removal and braces never cross a
/// quote boundary.
#[must_use]
pub fn expand(word: &str, multibyte: bool) -> Vec<String> {
    let Some(pieces) = parse(word, multibyte) else {
        return vec![word.to_string()];
    };
    let expansions = generate_and_combine(pieces);
    let out: Vec<String> = expansions.into_iter().collect();
    if out.len() <= 1 {
        vec![word.to_string()]
    } else {
        out
    }
}

fn generate_and_combine(pieces: Vec<Piece>) -> impl IntoIterator<Item = String> {
    let expansions: Vec<Vec<String>> = pieces
        .into_iter()
        .map(|piece| expand_piece(piece).collect())
        .collect();

    expansions
        .into_iter()
        .multi_cartesian_product()
        .map(|v| v.join(""))
}

fn expand_piece(piece: Piece) -> Box<dyn Iterator<Item = String>> {
    match piece {
        Piece::Expr(members) => Box::new(members.into_iter().flat_map(expand_member)),
        Piece::Text(text) => Box::new(std::iter::once(text)),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn expand_member(m: Member) -> Box<dyn Iterator<Item = String>> {
    match m {
        Member::NumberSequence {
            start,
            end,
            increment,
        } => {
            let increment = increment.unsigned_abs().max(1) as usize;
            if start <= end {
                Box::new((start..=end).step_by(increment).map(|n| n.to_string()))
            } else {
                Box::new(
                    (end..=start)
                        .step_by(increment)
                        .map(|n| n.to_string())
                        .collect::<Vec<_>>()
                        .into_iter()
                        .rev(),
                )
            }
        }
        Member::CharSequence {
            start,
            end,
            increment,
        } => {
            let increment = increment.unsigned_abs().max(1) as usize;
            let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
            let range: Vec<char> = (lo as u32..=hi as u32)
                .step_by(increment)
                .filter_map(char::from_u32)
                .collect();
            if start <= end {
                Box::new(range.into_iter().map(String::from))
            } else {
                Box::new(range.into_iter().rev().map(String::from))
            }
        }
        Member::Child(pieces) => Box::new(generate_and_combine(pieces).into_iter()),
    }
}

/// Parses `s` into a sequence of [`Piece`]s if it contains at least one
/// well-formed `{...}` expression (comma list or numeric/alpha range with
/// at least one comma or `..`); returns `None` if there is nothing to
/// expand, so the caller can pass the word through untouched.
fn parse(s: &str, multibyte: bool) -> Option<Vec<Piece>> {
    let bytes = s.as_bytes();
    let pieces = parse_pieces(bytes, 0, bytes.len(), multibyte)?;
    let has_expr = pieces.iter().any(|p| matches!(p, Piece::Expr(_)));
    has_expr.then_some(pieces)
}

fn parse_pieces(bytes: &[u8], mut i: usize, end: usize, multibyte: bool) -> Option<Vec<Piece>> {
    let mut pieces = Vec::new();
    let mut text = String::new();
    while i < end {
        match bytes[i] {
            b'\'' => {
                let after = skip_single_quoted(bytes, i).unwrap_or(end);
                text.push_str(&String::from_utf8_lossy(&bytes[i..after]));
                i = after;
            }
            b'"' => {
                let after = skip_double_quoted(bytes, i, multibyte).unwrap_or(end);
                text.push_str(&String::from_utf8_lossy(&bytes[i..after]));
                i = after;
            }
            b'{' => {
                if let Some((members, new_i)) = try_parse_brace(bytes, i, end, multibyte) {
                    if !text.is_empty() {
                        pieces.push(Piece::Text(std::mem::take(&mut text)));
                    }
                    pieces.push(Piece::Expr(members));
                    i = new_i;
                    continue;
                }
                text.push('{');
                i += 1;
            }
            b => {
                text.push(b as char);
                i += 1;
            }
        }
    }
    if !text.is_empty() {
        pieces.push(Piece::Text(text));
    }
    Some(pieces)
}

/// Tries to parse a `{...}` group starting at `bytes[start] == '{'`. Returns
/// the parsed members and the index just past the closing `}`, or `None` if
/// this isn't actually a comma-list/range (e.g. `{foo}` with no comma).
fn try_parse_brace(bytes: &[u8], start: usize, end: usize, multibyte: bool) -> Option<(Vec<Member>, usize)> {
    let close = find_matching_brace(bytes, start, end, multibyte)?;
    let inner = &bytes[start + 1..close];
    let inner_str = std::str::from_utf8(inner).ok()?;

    if let Some(range) = try_parse_range(inner_str) {
        return Some((vec![range], close + 1));
    }

    let alternatives = split_top_level_commas(inner, multibyte)?;
    if alternatives.len() < 2 {
        return None;
    }

    let mut members = Vec::new();
    for alt in alternatives {
        let child = parse_pieces(alt, 0, alt.len(), multibyte)?;
        members.push(Member::Child(child));
    }
    Some((members, close + 1))
}

/// Finds the `}` matching `bytes[start] == '{'`, skipping nested brace
/// depth and quoted spans (an unquoted `}` inside a quote doesn't count).
fn find_matching_brace(bytes: &[u8], start: usize, end: usize, multibyte: bool) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = start;
    while i < end {
        match bytes[i] {
            b'\'' => i = skip_single_quoted(bytes, i)?,
            b'"' => i = skip_double_quoted(bytes, i, multibyte)?,
            b'{' => {
                depth += 1;
                i += 1;
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    None
}

/// Splits `inner` on unquoted, unnested top-level commas.
fn split_top_level_commas(inner: &[u8], multibyte: bool) -> Option<Vec<&[u8]>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut last = 0usize;
    let mut i = 0usize;
    while i < inner.len() {
        match inner[i] {
            b'\'' => i = skip_single_quoted(inner, i).unwrap_or(inner.len()),
            b'"' => i = skip_double_quoted(inner, i, multibyte).unwrap_or(inner.len()),
            b'{' => {
                depth += 1;
                i += 1;
            }
            b'}' => {
                depth = depth.saturating_sub(1);
                i += 1;
            }
            b',' if depth == 0 => {
                parts.push(&inner[last..i]);
                i += 1;
                last = i;
            }
            _ => i += 1,
        }
    }
    parts.push(&inner[last..]);
    Some(parts)
}

fn try_parse_range(inner: &str) -> Option<Member> {
    let mut parts = inner.split("..");
    let start_s = parts.next()?;
    let end_s = parts.next()?;
    let incr_s = parts.next();
    if parts.next().is_some() {
        return None;
    }

    let increment: i64 = match incr_s {
        Some(s) => s.parse().ok()?,
        None => 1,
    };

    if let (Ok(start), Ok(end)) = (start_s.parse::<i64>(), end_s.parse::<i64>()) {
        return Some(Member::NumberSequence {
            start,
            end,
            increment,
        });
    }

    let mut start_chars = start_s.chars();
    let mut end_chars = end_s.chars();
    if let (Some(start), None, Some(end), None) = (
        start_chars.next(),
        start_chars.next(),
        end_chars.next(),
        end_chars.next(),
    ) {
        return Some(Member::CharSequence {
            start,
            end,
            increment,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_braces_passes_through() {
        assert_eq!(expand("abc", false), vec!["abc"]);
        assert_eq!(expand("a{b}c", false), vec!["a{b}c"]);
    }

    #[test]
    fn comma_list() {
        assert_eq!(expand("a{b,c}d", false), vec!["abd", "acd"]);
    }

    #[test]
    fn numeric_range() {
        assert_eq!(expand("{1..3}", false), vec!["1", "2", "3"]);
        assert_eq!(expand("{3..1}", false), vec!["3", "2", "1"]);
    }

    #[test]
    fn numeric_range_with_step() {
        assert_eq!(expand("{0..10..5}", false), vec!["0", "5", "10"]);
    }

    #[test]
    fn char_range() {
        assert_eq!(expand("{a..c}", false), vec!["a", "b", "c"]);
    }

    #[test]
    fn nested_braces() {
        assert_eq!(
            expand("a{b,c{d,e}}f", false),
            vec!["abf", "acdf", "acef"]
        );
    }

    #[test]
    fn multiple_groups_cartesian_product() {
        assert_eq!(
            expand("{a,b}{1,2}", false),
            vec!["a1", "a2", "b1", "b2"]
        );
    }

    #[test]
    fn braces_do_not_cross_a_quote_boundary() {
        assert_eq!(expand(r#""{a,b}""#, false), vec![r#""{a,b}""#]);
        assert_eq!(expand("'{a,b}'", false), vec!["'{a,b}'"]);
    }

    #[test]
    fn quoted_comma_inside_braces_is_not_a_separator() {
        assert_eq!(expand(r#"{"a,b",c}"#, false), vec![r#""a,b""#, "c"]);
    }
}
