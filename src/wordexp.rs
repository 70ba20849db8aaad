//! Word-internal expander (spec §4.6): the heart of the engine. A
//! single-pass scan over one input word that dispatches tilde, parameter,
//! command, arithmetic, and process substitution, and assembles the
//! intermediate `ESC`/`NS`-carrying byte buffer the splitter and pathname
//! expander consume afterward.

use crate::arithmetic;
use crate::cmdsubst;
use crate::config::ExpanderConfig;
use crate::context::ExpanderContext;
use crate::error::Error;
use crate::extract::{self, OnUnterminated};
use crate::parameter;
use crate::procsubst::{self, ProcSubstTable};
use crate::quoting;
use crate::splitter;
use crate::tilde;
use crate::worddesc::{QuoteFlags, WordDesc, WordFlags};

/// The result of expanding one input word's internals.
#[derive(Debug, Clone, Default)]
pub struct WordExpansion {
    /// Words produced by a quoted `"$@"`-style splice that are already
    /// final: quote-removed, exempt from further splitting and globbing.
    pub prefix_fields: Vec<WordDesc>,
    /// The remaining "tail" buffer (still carrying `ESC`/`NS` control
    /// bytes) that the caller must still run through IFS splitting and
    /// pathname expansion.
    pub tail: Vec<u8>,
    /// Whether any quoting construct (`'...'`, `"..."`, or a quoted
    /// parameter expansion) was observed anywhere in the word, used to
    /// decide whether an entirely-empty tail should still surface as one
    /// preserved empty argument.
    pub had_quoting: bool,
}

/// Expands the internals of one word: tilde, parameter (`$name`/`${...}`),
/// command substitution (`` $(...) ``/`` `...` ``), arithmetic
/// (`$((...))`), and process substitution (`<(...)`/`>(...)`).
///
/// `flags` carries the parser's classification of the word (assignment,
/// no-split/no-glob suppressions, etc); `base_qf` seeds the quote-flags
/// context (set [`QuoteFlags::DOUBLE_QUOTES`] when this word is itself
/// already inside an outer double-quoted context, e.g. a `${ }` nested
/// inside `"..."`).
///
/// # Errors
/// Propagates any fatal error from a nested expansion.
pub fn expand(
    word: &str,
    flags: WordFlags,
    base_qf: QuoteFlags,
    ctx: &mut dyn ExpanderContext,
    cfg: &ExpanderConfig,
    proc_table: &mut ProcSubstTable,
) -> Result<WordExpansion, Error> {
    let bytes = word.as_bytes();
    let assign_offset = if flags.contains(WordFlags::ASSIGNMENT) {
        find_unquoted_eq(bytes)
    } else {
        None
    };

    let mut out = WordExpansion::default();
    let mut in_double_quotes = base_qf.contains(QuoteFlags::DOUBLE_QUOTES);
    let mut after_colon = false;
    let mut i = 0usize;

    while i < bytes.len() {
        let qf = if in_double_quotes {
            base_qf.with(QuoteFlags::DOUBLE_QUOTES)
        } else {
            base_qf
        };
        let was_colon = bytes[i] == b':' && assign_offset.is_some();

        match bytes[i] {
            b'\\' => {
                if in_double_quotes {
                    // Only a handful of characters are special inside
                    // double quotes; anything else keeps its backslash.
                    match bytes.get(i + 1) {
                        Some(&c @ (b'$' | b'`' | b'"' | b'\\')) => {
                            out.tail.extend(quoting::shield_literal(&[c], cfg.multibyte_enabled));
                            i += 2;
                        }
                        Some(b'\n') => i += 2,
                        _ => {
                            out.tail.push(b'\\');
                            i += 1;
                        }
                    }
                } else if bytes.get(i + 1) == Some(&b'\n') {
                    i += 2;
                } else if let Some(&c) = bytes.get(i + 1) {
                    out.tail.extend(quoting::shield_literal(&[c], cfg.multibyte_enabled));
                    i += 2;
                } else {
                    i += 1;
                }
            }

            b'\'' if !in_double_quotes => {
                out.had_quoting = true;
                let (content, end) =
                    extract::extract_single_quoted(bytes, i, OnUnterminated::Fatal)?;
                out.tail
                    .extend(quoting::quote_string(&content, cfg.multibyte_enabled));
                i = end;
            }

            b'"' => {
                out.had_quoting = true;
                if in_double_quotes {
                    in_double_quotes = false;
                    i += 1;
                } else {
                    in_double_quotes = true;
                    i += 1;
                }
            }

            b'~' if tilde::is_tilde_expansion_point(i, assign_offset, after_colon) && !in_double_quotes => {
                if let Some((replacement, end)) = tilde::try_expand(word, i, ctx) {
                    out.tail.extend(replacement.as_bytes());
                    i = end;
                } else {
                    out.tail.push(b'~');
                    i += 1;
                }
            }

            b':' if assign_offset.is_some() => {
                out.tail.push(b':');
                i += 1;
            }

            b'`' => {
                out.had_quoting = out.had_quoting || in_double_quotes;
                let (content, end) = extract::extract_command_subst(
                    bytes,
                    i + 1,
                    true,
                    cfg.multibyte_enabled,
                    OnUnterminated::Fatal,
                )?;
                let command_text = String::from_utf8_lossy(&content).into_owned();
                let output = cmdsubst::substitute(&command_text, ctx)?;
                emit_scalar(&mut out.tail, &output, qf, cfg);
                i = end;
            }

            b'$' => {
                let arith = if bytes.get(i + 1) == Some(&b'(') && bytes.get(i + 2) == Some(&b'(') {
                    find_arith_end(bytes, i + 3)
                } else {
                    None
                };

                if let Some((expr, end)) = arith {
                    let value = arithmetic::evaluate(&expr, ctx)?;
                    emit_scalar(&mut out.tail, &value.to_string(), qf, cfg);
                    i = end;
                } else if bytes.get(i + 1) == Some(&b'(') {
                    let (content, end) = extract::extract_command_subst(
                        bytes,
                        i + 2,
                        false,
                        cfg.multibyte_enabled,
                        OnUnterminated::Fatal,
                    )?;
                    let command_text = String::from_utf8_lossy(&content).into_owned();
                    let output = cmdsubst::substitute(&command_text, ctx)?;
                    emit_scalar(&mut out.tail, &output, qf, cfg);
                    i = end;
                } else if bytes.get(i + 1) == Some(&b'{') {
                    let (content, end) = extract::extract_dollar_brace_string(
                        bytes,
                        i + 2,
                        cfg.multibyte_enabled,
                        OnUnterminated::Fatal,
                    )?;
                    let inner = String::from_utf8_lossy(&content).into_owned();
                    let expansion = parameter::expand(&inner, ctx, qf, cfg, proc_table)?;
                    emit_param(&mut out, &expansion, qf, cfg, ctx);
                    i = end;
                } else if let Some((replacement, end)) = try_scan_bare_parameter(word, bytes, i) {
                    let expansion = parameter::expand(&replacement, ctx, qf, cfg, proc_table)?;
                    emit_param(&mut out, &expansion, qf, cfg, ctx);
                    i = end;
                } else {
                    out.tail.push(b'$');
                    i += 1;
                }
            }

            b'<' | b'>' if bytes.get(i + 1) == Some(&b'(') && !in_double_quotes => {
                let is_output = bytes[i] == b'>';
                let (content, end) = extract::extract_process_subst(
                    bytes,
                    i + 2,
                    cfg.multibyte_enabled,
                    OnUnterminated::Fatal,
                )?;
                let command_text = String::from_utf8_lossy(&content).into_owned();
                let path = procsubst::create(&command_text, is_output, proc_table, ctx)?;
                out.tail.extend(path.to_string_lossy().as_bytes());
                i = end;
            }

            c if in_double_quotes => {
                let start = i;
                i += 1;
                while i < bytes.len() && !matches!(bytes[i], b'"' | b'\\' | b'$' | b'`') {
                    i += 1;
                }
                let _ = c;
                out.tail
                    .extend(quoting::shield_literal(&bytes[start..i], cfg.multibyte_enabled));
            }

            _ => {
                out.tail.push(bytes[i]);
                i += 1;
            }
        }

        after_colon = was_colon;
    }

    if out.tail.is_empty() && out.had_quoting {
        out.tail = vec![crate::quoting::NS];
    }

    Ok(out)
}

/// Appends a plain (non-array) expansion result to `buf`, shielding it from
/// further splitting/globbing when `qf` says we're inside double quotes.
fn emit_scalar(buf: &mut Vec<u8>, value: &str, qf: QuoteFlags, cfg: &ExpanderConfig) {
    if qf.contains(QuoteFlags::DOUBLE_QUOTES) {
        buf.extend(quoting::shield_literal(value.as_bytes(), cfg.multibyte_enabled));
    } else {
        buf.extend(value.as_bytes());
    }
}

/// Merges a [`parameter::ParamExpansion`] into the expansion-in-progress,
/// handling the quoted-`"$@"`-splice case and the `"$*"`-join case (spec
/// §3's "array-like" result; `"$@"` splices into separate words, `"$*"`
/// joins into one word on IFS's first character).
fn emit_param(
    out: &mut WordExpansion,
    expansion: &parameter::ParamExpansion,
    qf: QuoteFlags,
    cfg: &ExpanderConfig,
    ctx: &mut dyn ExpanderContext,
) {
    if expansion.quoted_null && expansion.fields.is_empty() {
        return;
    }

    if expansion.pre_split && expansion.at_semantics && qf.contains(QuoteFlags::DOUBLE_QUOTES) {
        out.had_quoting = true;
        if expansion.fields.is_empty() {
            return;
        }
        let n = expansion.fields.len();
        for (idx, field) in expansion.fields.iter().enumerate() {
            let shielded = quoting::quote_string(field.as_bytes(), cfg.multibyte_enabled);
            if idx == 0 {
                out.tail.extend(shielded);
                if n > 1 {
                    let completed = std::mem::take(&mut out.tail);
                    out.prefix_fields.push(WordDesc::with_flags(
                        crate::quoting::quote_removal(&completed),
                        WordFlags::NO_GLOB | WordFlags::NO_SPLIT,
                    ));
                }
            } else if idx + 1 < n {
                out.prefix_fields.push(WordDesc::with_flags(
                    crate::quoting::quote_removal(&shielded),
                    WordFlags::NO_GLOB | WordFlags::NO_SPLIT,
                ));
            } else {
                out.tail = shielded;
            }
        }
        return;
    }

    if expansion.pre_split && !expansion.at_semantics {
        let ifs = splitter::IfsInfo::new(ctx.variable_lookup("IFS").map(|v| v.to_scalar_string()).as_deref());
        let joined = splitter::join_with_ifs_first_char(&expansion.fields, &ifs);
        emit_scalar(&mut out.tail, &joined, qf, cfg);
        return;
    }

    // Unquoted `"$@"`-style result, or a plain scalar: join with a plain
    // space so the downstream IFS splitter re-splits it into separate
    // fields; a lone field passes through unaffected.
    let joined = expansion.fields.join(" ");
    emit_scalar(&mut out.tail, &joined, qf, cfg);
}

/// Finds the first unquoted `=` in `bytes` (the boundary of a `NAME=value`
/// assignment word), used to gate tilde expansion immediately after it.
fn find_unquoted_eq(bytes: &[u8]) -> Option<usize> {
    bytes.iter().position(|&b| b == b'=')
}

/// Finds the end of a `$((...))` arithmetic expansion starting just past
/// the opening `$((`. Returns `(expr_text, index_after_closing_))`.
fn find_arith_end(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    let mut depth = 1i32;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => {
                depth += 1;
                i += 1;
            }
            b')' => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    if bytes.get(i) == Some(&b')') {
                        let expr = String::from_utf8_lossy(&bytes[start..i - 1]).into_owned();
                        return Some((expr, i + 1));
                    }
                    return None;
                }
            }
            _ => i += 1,
        }
    }
    None
}

/// Scans a bare (unbraced) `$name`/`$1`/`$@`/`$*`/`$?`/`$$`/`$!`/`$-`/`$0`
/// form starting at `word[i] == '$'`. Returns the text to hand to
/// [`parameter::expand`] and the index just past the reference.
fn try_scan_bare_parameter(word: &str, bytes: &[u8], i: usize) -> Option<(String, usize)> {
    let rest = &bytes[i + 1..];
    let first = *rest.first()?;

    if matches!(first, b'@' | b'*' | b'#' | b'?' | b'-' | b'$' | b'!' | b'0') {
        return Some((word[i + 1..=i + 1].to_string(), i + 2));
    }
    if first.is_ascii_digit() {
        return Some((word[i + 1..=i + 1].to_string(), i + 2));
    }
    if first == b'_' || first.is_ascii_alphabetic() {
        let len = rest
            .iter()
            .position(|&b| !(b == b'_' || b.is_ascii_alphanumeric()))
            .unwrap_or(rest.len());
        return Some((word[i + 1..i + 1 + len].to_string(), i + 1 + len));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestContext;

    fn expand_str(word: &str, ctx: &mut TestContext) -> String {
        let cfg = ExpanderConfig::default();
        let mut table = ProcSubstTable::new();
        let result = expand(word, WordFlags::NONE, QuoteFlags::NONE, ctx, &cfg, &mut table).unwrap();
        String::from_utf8(crate::quoting::quote_removal(&result.tail)).unwrap()
    }

    #[test]
    fn plain_text_passes_through() {
        let mut ctx = TestContext::new();
        assert_eq!(expand_str("hello", &mut ctx), "hello");
    }

    #[test]
    fn bare_parameter_expands() {
        let mut ctx = TestContext::new();
        ctx.set("x", "world");
        assert_eq!(expand_str("hello $x", &mut ctx), "hello world");
    }

    #[test]
    fn braced_parameter_expands() {
        let mut ctx = TestContext::new();
        ctx.set("x", "world");
        assert_eq!(expand_str("${x}!", &mut ctx), "world!");
    }

    #[test]
    fn single_quotes_are_literal() {
        let mut ctx = TestContext::new();
        ctx.set("x", "world");
        assert_eq!(expand_str("'$x'", &mut ctx), "$x");
    }

    #[test]
    fn double_quotes_still_expand_but_shield_spaces() {
        let mut ctx = TestContext::new();
        ctx.set("x", "a b");
        let cfg = ExpanderConfig::default();
        let mut table = ProcSubstTable::new();
        let result = expand("\"$x\"", WordFlags::NONE, QuoteFlags::NONE, &mut ctx, &cfg, &mut table).unwrap();
        // The space inside should be ESC-shielded, not a literal splittable space.
        assert!(result.tail.contains(&crate::quoting::ESC));
    }

    #[test]
    fn empty_double_quotes_preserve_one_arg() {
        let mut ctx = TestContext::new();
        let cfg = ExpanderConfig::default();
        let mut table = ProcSubstTable::new();
        let result = expand("\"\"", WordFlags::NONE, QuoteFlags::NONE, &mut ctx, &cfg, &mut table).unwrap();
        assert_eq!(result.tail, vec![crate::quoting::NS]);
    }

    #[test]
    fn unquoted_empty_vanishes() {
        let mut ctx = TestContext::new();
        let cfg = ExpanderConfig::default();
        let mut table = ProcSubstTable::new();
        let result = expand("$unset", WordFlags::NONE, QuoteFlags::NONE, &mut ctx, &cfg, &mut table).unwrap();
        assert!(result.tail.is_empty());
        assert!(!result.had_quoting);
    }

    #[test]
    fn arithmetic_expansion() {
        let mut ctx = TestContext::new();
        assert_eq!(expand_str("$((2+3*4))", &mut ctx), "14");
    }

    #[test]
    fn quoted_at_splices_into_separate_fields() {
        let mut ctx = TestContext::new();
        ctx.set_positional(vec!["a".to_string(), "b c".to_string(), "d".to_string()]);
        let cfg = ExpanderConfig::default();
        let mut table = ProcSubstTable::new();
        let result = expand("\"$@\"", WordFlags::NONE, QuoteFlags::NONE, &mut ctx, &cfg, &mut table).unwrap();
        assert_eq!(result.prefix_fields.len(), 2);
        assert_eq!(result.prefix_fields[0].to_string_lossy(), "a");
        assert_eq!(result.prefix_fields[1].to_string_lossy(), "b c");
        assert_eq!(String::from_utf8(crate::quoting::quote_removal(&result.tail)).unwrap(), "d");
    }

    #[test]
    fn quoted_star_joins_on_ifs_first_char() {
        let mut ctx = TestContext::new();
        ctx.set_positional(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        let cfg = ExpanderConfig::default();
        let mut table = ProcSubstTable::new();
        let result = expand("\"$*\"", WordFlags::NONE, QuoteFlags::NONE, &mut ctx, &cfg, &mut table).unwrap();
        assert!(result.prefix_fields.is_empty());
        assert_eq!(String::from_utf8(crate::quoting::quote_removal(&result.tail)).unwrap(), "a b c");

        ctx.set("IFS", ":");
        let result = expand("\"$*\"", WordFlags::NONE, QuoteFlags::NONE, &mut ctx, &cfg, &mut table).unwrap();
        assert_eq!(String::from_utf8(crate::quoting::quote_removal(&result.tail)).unwrap(), "a:b:c");
    }

    #[test]
    fn tilde_at_start_expands() {
        let mut ctx = TestContext::new();
        ctx.homes.insert(String::new(), "/home/me".to_string());
        assert_eq!(expand_str("~/bin", &mut ctx), "/home/me/bin");
    }

    #[test]
    fn tilde_mid_word_is_literal() {
        let mut ctx = TestContext::new();
        ctx.homes.insert(String::new(), "/home/me".to_string());
        assert_eq!(expand_str("a~b", &mut ctx), "a~b");
    }
}
