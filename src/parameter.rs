//! Parameter expansion: `${name...}` and all its operators (spec §4.3).
//! The single largest component of the engine.

use crate::arithmetic;
use crate::config::ExpanderConfig;
use crate::context::{ExpanderContext, PatternRemoveMode, PatternSubstituteMode, Value};
use crate::error::{Error, ErrorKind};
use crate::escape;
use crate::procsubst::ProcSubstTable;
use crate::quoting;
use crate::worddesc::{QuoteFlags, WordFlags};
use crate::wordexp;

/// The result of evaluating a `${...}` (or bare `$name`) form: zero or more
/// fields, plus whether those fields are already split (as `"$@"` and array
/// expansions are) and should bypass IFS re-splitting.
#[derive(Debug, Clone, Default)]
pub struct ParamExpansion {
    /// The resulting field(s). An unquoted scalar expansion is one field
    /// subject to normal IFS splitting downstream; `"$@"`/array expansions
    /// are pre-split and must not be rejoined.
    pub fields: Vec<String>,
    /// Whether `fields` are already final word boundaries (array/`"$@"`
    /// expansions) as opposed to one blob subject to splitting.
    pub pre_split: bool,
    /// Whether `fields` should be spliced in as separate words (`"$@"`,
    /// `${arr[@]}`) rather than joined into one word on IFS's first
    /// character (`"$*"`, `${arr[*]}`). Meaningless when `fields` holds a
    /// single scalar.
    pub at_semantics: bool,
    /// Whether the expansion observed a quoted-null condition (an entirely
    /// vanished `"$@"`/`"${@}"`  with no positional parameters, inside an
    /// otherwise-quoted word).
    pub quoted_null: bool,
}

impl ParamExpansion {
    fn scalar(s: impl Into<String>) -> Self {
        Self {
            fields: vec![s.into()],
            pre_split: false,
            at_semantics: false,
            quoted_null: false,
        }
    }

    fn empty_quoted_null() -> Self {
        Self {
            fields: vec![],
            pre_split: true,
            at_semantics: true,
            quoted_null: true,
        }
    }
}

#[derive(Debug, Clone)]
enum ParamName {
    Positional(usize),
    AllPositionalAt,
    AllPositionalStar,
    ParamCount,
    LastExitStatus,
    CurrentOptions,
    ShellPid,
    LastBackgroundPid,
    ShellName,
    Named(String),
    ArrayRef { name: String, subscript: String },
    ArrayAllAt(String),
    ArrayAllStar(String),
    Indirect(String),
}

/// Splits the inner text of `${...}` into a name and the remaining
/// operator text, per spec §4.3's scanning rules.
fn parse_name(inner: &str) -> (ParamName, &str) {
    if let Some(rest) = inner.strip_prefix('!') {
        // Indirect reference, unless the whole thing is the special `$!`
        // parameter (bare `!` with no following identifier).
        let ident_len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if ident_len > 0 && !rest[..1].chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return (ParamName::Indirect(rest[..ident_len].to_string()), &rest[ident_len..]);
        }
        return (ParamName::LastBackgroundPid, rest);
    }

    match inner.chars().next() {
        Some('@') => (ParamName::AllPositionalAt, &inner[1..]),
        Some('*') => (ParamName::AllPositionalStar, &inner[1..]),
        Some('#') => (ParamName::ParamCount, &inner[1..]),
        Some('?') => (ParamName::LastExitStatus, &inner[1..]),
        Some('-') => (ParamName::CurrentOptions, &inner[1..]),
        Some('$') => (ParamName::ShellPid, &inner[1..]),
        Some('0') => (ParamName::ShellName, &inner[1..]),
        Some(c) if c.is_ascii_digit() => {
            let len = inner
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(inner.len());
            let n: usize = inner[..len].parse().unwrap_or(0);
            (ParamName::Positional(n), &inner[len..])
        }
        _ => {
            let len = inner
                .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                .unwrap_or(inner.len());
            let name = inner[..len].to_string();
            let rest = &inner[len..];
            if let Some(after_bracket) = rest.strip_prefix('[') {
                if let Some(close) = after_bracket.find(']') {
                    let subscript = &after_bracket[..close];
                    let tail = &after_bracket[close + 1..];
                    return match subscript {
                        "@" => (ParamName::ArrayAllAt(name), tail),
                        "*" => (ParamName::ArrayAllStar(name), tail),
                        _ => (
                            ParamName::ArrayRef {
                                name,
                                subscript: subscript.to_string(),
                            },
                            tail,
                        ),
                    };
                }
            }
            (ParamName::Named(name), rest)
        }
    }
}

fn lookup_value(name: &ParamName, ctx: &mut dyn ExpanderContext) -> Option<Value> {
    match name {
        ParamName::Positional(n) => ctx.positional_params().get(n.wrapping_sub(1)).cloned().map(Value::Scalar),
        ParamName::AllPositionalAt | ParamName::AllPositionalStar => {
            Some(Value::Indexed(ctx.positional_params()))
        }
        ParamName::ParamCount => Some(Value::Scalar(ctx.positional_params().len().to_string())),
        ParamName::LastExitStatus => Some(Value::Scalar(ctx.last_exit_status().to_string())),
        ParamName::CurrentOptions => Some(Value::Scalar(String::new())),
        ParamName::ShellPid => Some(Value::Scalar(std::process::id().to_string())),
        ParamName::LastBackgroundPid => Some(Value::Scalar(String::new())),
        ParamName::ShellName => Some(Value::Scalar(ctx.shell_name())),
        ParamName::Named(n) => ctx.variable_lookup(n),
        ParamName::ArrayRef { name, subscript } => {
            let idx = arithmetic::evaluate(subscript, ctx).ok()?;
            match ctx.variable_lookup(name)? {
                Value::Indexed(v) => {
                    let idx = usize::try_from(idx).ok()?;
                    v.get(idx).cloned().map(Value::Scalar)
                }
                Value::Assoc(m) => m.get(subscript.trim()).cloned().map(Value::Scalar),
                Value::Scalar(s) if idx == 0 => Some(Value::Scalar(s)),
                Value::Scalar(_) => None,
            }
        }
        ParamName::ArrayAllAt(name) | ParamName::ArrayAllStar(name) => ctx.variable_lookup(name),
        ParamName::Indirect(n) => {
            let target = ctx.variable_lookup(n)?.to_scalar_string();
            ctx.variable_lookup(&target)
        }
    }
}

fn is_array_like(name: &ParamName) -> bool {
    matches!(
        name,
        ParamName::AllPositionalAt
            | ParamName::AllPositionalStar
            | ParamName::ArrayAllAt(_)
            | ParamName::ArrayAllStar(_)
    )
}

fn uses_at_semantics(name: &ParamName) -> bool {
    matches!(name, ParamName::AllPositionalAt | ParamName::ArrayAllAt(_))
}

fn assignable_name(name: &ParamName) -> Result<&str, Error> {
    match name {
        ParamName::Named(n) => Ok(n.as_str()),
        _ => Err(ErrorKind::CannotAssignToSpecialParameter(describe(name)).into()),
    }
}

fn describe(name: &ParamName) -> String {
    match name {
        ParamName::Named(n) | ParamName::Indirect(n) | ParamName::ArrayAllAt(n) | ParamName::ArrayAllStar(n) => n.clone(),
        ParamName::ArrayRef { name, .. } => name.clone(),
        ParamName::Positional(n) => n.to_string(),
        _ => "$".to_string(),
    }
}

/// Expands a full `${...}` body (everything between the braces, already
/// extracted by [`crate::extract::extract_dollar_brace_string`]).
pub fn expand(
    inner: &str,
    ctx: &mut dyn ExpanderContext,
    qf: QuoteFlags,
    cfg: &ExpanderConfig,
    proc_table: &mut ProcSubstTable,
) -> Result<ParamExpansion, Error> {
    if inner.len() > 1 {
        if let Some(name_part) = inner.strip_prefix('#') {
            let starts_like_name = name_part
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '@' | '*' | '!' | '-' | '?' | '$'));
            if starts_like_name {
                return Ok(ParamExpansion::scalar(expand_length(name_part, ctx)?.to_string()));
            }
        }
    }

    let (name, rest) = parse_name(inner);
    let value = lookup_value(&name, ctx);
    let array_like = is_array_like(&name);
    let at_semantics = uses_at_semantics(&name);

    if rest.is_empty() {
        return scalarize(&name, value, array_like, at_semantics, qf, cfg);
    }

    let op_char = rest.chars().next().unwrap_or_default();
    let (colon, op_body) = if op_char == ':' {
        (true, &rest[1..])
    } else {
        (false, rest)
    };
    let op_char2 = op_body.chars().next().unwrap_or_default();

    match op_char2 {
        '-' | '=' | '?' | '+' => {
            expand_default_op(&name, value, colon, op_char2, &op_body[1..], ctx, qf, cfg, proc_table)
        }
        '#' if !colon => {
            if op_body.starts_with("##") {
                pattern_op(&name, value, &op_body[2..], PatternRemoveMode::LongestPrefix, ctx, cfg)
            } else {
                pattern_op(&name, value, &op_body[1..], PatternRemoveMode::ShortestPrefix, ctx, cfg)
            }
        }
        '%' if !colon => {
            if op_body.starts_with("%%") {
                pattern_op(&name, value, &op_body[2..], PatternRemoveMode::LongestSuffix, ctx, cfg)
            } else {
                pattern_op(&name, value, &op_body[1..], PatternRemoveMode::ShortestSuffix, ctx, cfg)
            }
        }
        '/' if !colon => substitute_op(&name, value, &op_body[1..], ctx, cfg),
        '^' | ',' | '~' if !colon => case_mod_op(value, op_body, ctx),
        '@' if !colon => transform_op(&name, value, &op_body[1..], ctx, cfg),
        _ if colon => substring_op(&name, value, op_body, ctx, array_like, at_semantics, cfg),
        _ => scalarize(&name, value, array_like, at_semantics, qf, cfg),
    }
}

/// `$name` with no operator, or the special `#name` length form.
fn scalarize(
    name: &ParamName,
    value: Option<Value>,
    array_like: bool,
    at_semantics: bool,
    qf: QuoteFlags,
    cfg: &ExpanderConfig,
) -> Result<ParamExpansion, Error> {
    match value {
        None => {
            if cfg.unbound_variable_is_error && !matches!(name, ParamName::AllPositionalAt | ParamName::AllPositionalStar) {
                return Err(ErrorKind::UnboundVariable(describe(name)).into());
            }
            Ok(ParamExpansion::scalar(String::new()))
        }
        Some(v) => {
            if array_like {
                let fields = v.to_fields();
                if fields.is_empty() && at_semantics && qf.contains(QuoteFlags::DOUBLE_QUOTES) {
                    return Ok(ParamExpansion::empty_quoted_null());
                }
                Ok(ParamExpansion {
                    fields,
                    pre_split: at_semantics || qf.contains(QuoteFlags::DOUBLE_QUOTES),
                    at_semantics,
                    quoted_null: false,
                })
            } else {
                Ok(ParamExpansion::scalar(v.to_scalar_string()))
            }
        }
    }
}

fn expand_default_op(
    name: &ParamName,
    value: Option<Value>,
    colon: bool,
    op: char,
    word: &str,
    ctx: &mut dyn ExpanderContext,
    qf: QuoteFlags,
    cfg: &ExpanderConfig,
    proc_table: &mut ProcSubstTable,
) -> Result<ParamExpansion, Error> {
    let is_unset_or_null = match &value {
        None => true,
        Some(v) => colon && v.is_empty_value(),
    };

    match op {
        '-' => {
            if is_unset_or_null {
                Ok(ParamExpansion::scalar(expand_operator_word(word, ctx, qf, cfg, proc_table)?))
            } else {
                scalarize(name, value, is_array_like(name), uses_at_semantics(name), qf, cfg)
            }
        }
        '=' => {
            if is_unset_or_null {
                let assign_name = assignable_name(name)?;
                let expanded = expand_operator_word(word, ctx, qf, cfg, proc_table)?;
                ctx.variable_bind(assign_name, Value::Scalar(expanded.clone()), Default::default())?;
                Ok(ParamExpansion::scalar(expanded))
            } else {
                scalarize(name, value, is_array_like(name), uses_at_semantics(name), qf, cfg)
            }
        }
        '?' => {
            if is_unset_or_null {
                let msg = if word.is_empty() {
                    "parameter null or not set".to_string()
                } else {
                    expand_operator_word(word, ctx, qf, cfg, proc_table)?
                };
                Err(ErrorKind::ParameterNullOrNotSet(describe(name), msg).into())
            } else {
                scalarize(name, value, is_array_like(name), uses_at_semantics(name), qf, cfg)
            }
        }
        '+' => {
            if is_unset_or_null {
                Ok(ParamExpansion::scalar(String::new()))
            } else {
                Ok(ParamExpansion::scalar(expand_operator_word(word, ctx, qf, cfg, proc_table)?))
            }
        }
        _ => scalarize(name, value, is_array_like(name), uses_at_semantics(name), qf, cfg),
    }
}

/// Recursively expands an operator's right-hand-side word (tilde, nested
/// parameter, command and arithmetic substitution), with splitting and
/// pathname expansion suppressed; `"$@"`-style splices are rejoined with a
/// plain space since the operator word is always consumed as one scalar.
fn expand_operator_word(
    word: &str,
    ctx: &mut dyn ExpanderContext,
    qf: QuoteFlags,
    cfg: &ExpanderConfig,
    proc_table: &mut ProcSubstTable,
) -> Result<String, Error> {
    let expansion = wordexp::expand(word, WordFlags::NONE, qf.with(QuoteFlags::DOLBRACE), ctx, cfg, proc_table)?;
    let mut out = String::new();
    for field in &expansion.prefix_fields {
        out.push_str(&field.to_string_lossy());
        out.push(' ');
    }
    out.push_str(&String::from_utf8_lossy(&quoting::quote_removal(&expansion.tail)));
    Ok(out)
}

fn pattern_op(
    name: &ParamName,
    value: Option<Value>,
    pattern: &str,
    mode: PatternRemoveMode,
    ctx: &mut dyn ExpanderContext,
    _cfg: &ExpanderConfig,
) -> Result<ParamExpansion, Error> {
    let Some(v) = value else {
        return Ok(ParamExpansion::scalar(String::new()));
    };
    if is_array_like(name) {
        let mut out = Vec::new();
        for field in v.to_fields() {
            out.push(ctx.pattern_remove(&field, pattern, mode)?);
        }
        return Ok(ParamExpansion {
            fields: out,
            pre_split: true,
            at_semantics: uses_at_semantics(name),
            quoted_null: false,
        });
    }
    let s = v.to_scalar_string();
    Ok(ParamExpansion::scalar(ctx.pattern_remove(&s, pattern, mode)?))
}

fn substitute_op(
    name: &ParamName,
    value: Option<Value>,
    spec: &str,
    ctx: &mut dyn ExpanderContext,
    _cfg: &ExpanderConfig,
) -> Result<ParamExpansion, Error> {
    let (mode, spec) = if let Some(rest) = spec.strip_prefix('/') {
        (PatternSubstituteMode::All, rest)
    } else if let Some(rest) = spec.strip_prefix('#') {
        (PatternSubstituteMode::AnchoredPrefix, rest)
    } else if let Some(rest) = spec.strip_prefix('%') {
        (PatternSubstituteMode::AnchoredSuffix, rest)
    } else {
        (PatternSubstituteMode::First, spec)
    };

    let (pattern, replacement) = split_unescaped(spec, '/');

    let Some(v) = value else {
        return Ok(ParamExpansion::scalar(String::new()));
    };
    let s = v.to_scalar_string();
    Ok(ParamExpansion::scalar(ctx.pattern_substitute(
        &s,
        &pattern,
        &replacement,
        mode,
    )?))
}

/// Splits `spec` at the first unescaped `sep`, unescaping `&` and `\\` in
/// the remainder (the replacement half), per spec §4.3.
fn split_unescaped(spec: &str, sep: char) -> (String, String) {
    let chars: Vec<char> = spec.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' {
            i += 2;
            continue;
        }
        if chars[i] == sep {
            let pattern: String = chars[..i].iter().collect();
            let replacement: String = unescape_replacement(&chars[i + 1..]);
            return (pattern, replacement);
        }
        i += 1;
    }
    (spec.to_string(), String::new())
}

fn unescape_replacement(chars: &[char]) -> String {
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' && i + 1 < chars.len() && matches!(chars[i + 1], '&' | '\\') {
            out.push(chars[i + 1]);
            i += 2;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

fn substring_op(
    name: &ParamName,
    value: Option<Value>,
    spec: &str,
    ctx: &mut dyn ExpanderContext,
    array_like: bool,
    at_semantics: bool,
    _cfg: &ExpanderConfig,
) -> Result<ParamExpansion, Error> {
    let Some(v) = value else {
        return Ok(ParamExpansion::scalar(String::new()));
    };

    if array_like {
        let fields = v.to_fields();
        let len = fields.len() as i64;
        let (off, count) = parse_offset_len(spec, len, ctx)?;
        let start = off.clamp(0, len) as usize;
        let end = (off + count).clamp(0, len) as usize;
        let end = end.max(start);
        return Ok(ParamExpansion {
            fields: fields[start..end].to_vec(),
            pre_split: true,
            at_semantics,
            quoted_null: false,
        });
    }

    let s = v.to_scalar_string();
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as i64;
    let (off, count) = parse_offset_len(spec, len, ctx)?;

    let start = if off < 0 { (len + off).max(0) } else { off.min(len) };
    let end = if count < 0 {
        let raw_end = len + count;
        if raw_end < start {
            return Err(ErrorKind::SubstringExpressionNegative(describe(name)).into());
        }
        raw_end
    } else {
        (start + count).min(len)
    };
    let end = end.max(start).min(len);
    let start = start.min(len) as usize;
    let end = end as usize;

    Ok(ParamExpansion::scalar(chars[start..end].iter().collect::<String>()))
}

fn parse_offset_len(spec: &str, len: i64, ctx: &mut dyn ExpanderContext) -> Result<(i64, i64), Error> {
    let (off_s, len_s) = split_unescaped(spec, ':');
    let off = arithmetic::evaluate(off_s.trim(), ctx)?;
    let count = if len_s.is_empty() && !spec.contains(':') {
        len - off
    } else {
        arithmetic::evaluate(len_s.trim(), ctx)?
    };
    Ok((off, count))
}

fn case_mod_op(value: Option<Value>, op: &str, ctx: &mut dyn ExpanderContext) -> Result<ParamExpansion, Error> {
    let Some(v) = value else {
        return Ok(ParamExpansion::scalar(String::new()));
    };
    let s = v.to_scalar_string();

    let (mode, pattern) = if let Some(rest) = op.strip_prefix("^^") {
        (CaseMode::UpperAll, rest)
    } else if let Some(rest) = op.strip_prefix('^') {
        (CaseMode::UpperFirst, rest)
    } else if let Some(rest) = op.strip_prefix(",,") {
        (CaseMode::LowerAll, rest)
    } else if let Some(rest) = op.strip_prefix(',') {
        (CaseMode::LowerFirst, rest)
    } else if let Some(rest) = op.strip_prefix("~~") {
        (CaseMode::ToggleAll, rest)
    } else if let Some(rest) = op.strip_prefix('~') {
        (CaseMode::ToggleFirst, rest)
    } else {
        (CaseMode::UpperFirst, op)
    };

    let matches_pattern = |c: char| -> Result<bool, Error> {
        if pattern.is_empty() {
            Ok(true)
        } else {
            ctx.pattern_match(pattern, &c.to_string())
        }
    };

    let mut out = String::new();
    let mut first = true;
    for c in s.chars() {
        let apply = match mode {
            CaseMode::UpperAll | CaseMode::LowerAll | CaseMode::ToggleAll => true,
            CaseMode::UpperFirst | CaseMode::LowerFirst | CaseMode::ToggleFirst => first,
        } && matches_pattern(c)?;
        first = false;

        if apply {
            match mode {
                CaseMode::UpperAll | CaseMode::UpperFirst => out.extend(c.to_uppercase()),
                CaseMode::LowerAll | CaseMode::LowerFirst => out.extend(c.to_lowercase()),
                CaseMode::ToggleAll | CaseMode::ToggleFirst => {
                    if c.is_uppercase() {
                        out.extend(c.to_lowercase());
                    } else {
                        out.extend(c.to_uppercase());
                    }
                }
            }
        } else {
            out.push(c);
        }
    }

    Ok(ParamExpansion::scalar(out))
}

#[derive(Clone, Copy)]
enum CaseMode {
    UpperFirst,
    UpperAll,
    LowerFirst,
    LowerAll,
    ToggleFirst,
    ToggleAll,
}

fn transform_op(
    name: &ParamName,
    value: Option<Value>,
    op: &str,
    ctx: &mut dyn ExpanderContext,
    cfg: &ExpanderConfig,
) -> Result<ParamExpansion, Error> {
    if op == "a" {
        let flags = String::new();
        return Ok(ParamExpansion::scalar(flags));
    }

    if matches!(op, "K" | "k") {
        if let Some(Value::Assoc(m)) = &value {
            let fields: Vec<String> = m
                .iter()
                .flat_map(|(k, v)| [k.clone(), v.clone()])
                .collect();
            return Ok(ParamExpansion {
                fields,
                pre_split: true,
                at_semantics: uses_at_semantics(name),
                quoted_null: false,
            });
        }
        if let Some(Value::Indexed(v)) = &value {
            let fields: Vec<String> = v
                .iter()
                .enumerate()
                .flat_map(|(i, val)| [i.to_string(), val.clone()])
                .collect();
            return Ok(ParamExpansion {
                fields,
                pre_split: true,
                at_semantics: uses_at_semantics(name),
                quoted_null: false,
            });
        }
    }

    let Some(v) = value else {
        return Ok(ParamExpansion::scalar(String::new()));
    };
    let s = v.to_scalar_string();

    let result = match op {
        "U" => s.to_uppercase(),
        "u" => {
            let mut chars = s.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        }
        "L" => s.to_lowercase(),
        "Q" => escape::quote_for_reuse(&s),
        "E" => escape::expand_ansi_c_escapes(&s)?,
        "P" => s,
        "A" => format!("{}={}", describe(name), escape::quote_for_reuse(&s)),
        _ => {
            let _ = cfg;
            s
        }
    };
    Ok(ParamExpansion::scalar(result))
}

/// Length-in-characters form, `${#name}` (spec §4.3's distinguished
/// prefix-`#` row). Called directly by the word-internal expander since it
/// must distinguish `${#x}` from `${x#pat}` before routing into [`expand`].
pub fn expand_length(
    name_text: &str,
    ctx: &mut dyn ExpanderContext,
) -> Result<usize, Error> {
    let (name, _rest) = parse_name(name_text);
    match lookup_value(&name, ctx) {
        None => Ok(0),
        Some(v) => {
            if is_array_like(&name) {
                Ok(v.to_fields().len())
            } else {
                Ok(v.to_scalar_string().chars().count())
            }
        }
    }
}
