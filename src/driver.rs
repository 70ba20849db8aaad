//! Top-level driver (spec §4.11): runs brace → assignment separation →
//! tilde/parameter/command/arithmetic/process-substitution/split → pathname,
//! in order, and exposes the public surface (spec §6).

use crate::assignment;
use crate::brace;
use crate::config::ExpanderConfig;
use crate::context::ExpanderContext;
use crate::error::{Error, UnwindDisposition};
use crate::pathname;
use crate::procsubst::ProcSubstTable;
use crate::quoting;
use crate::splitter::{self, IfsInfo};
use crate::worddesc::{QuoteFlags, WordDesc, WordFlags, WordList};
use crate::wordexp;

/// Which phases [`expand_word_list`] should run. Every flag defaults to on;
/// callers that already know a word is exempt (e.g. a `case` pattern, which
/// skips splitting and pathname expansion) turn the relevant phase off
/// instead of threading per-word suppression flags through every call site.
#[derive(Debug, Clone, Copy)]
pub struct PhaseSet {
    /// Run brace expansion.
    pub brace: bool,
    /// Run tilde expansion (part of the `wordexp` pass).
    pub tilde: bool,
    /// Run parameter/command/arithmetic/process substitution (the rest of
    /// the `wordexp` pass). Disabling this still runs splitting afterward
    /// on whatever text is present.
    pub parameter: bool,
    /// Run IFS field splitting.
    pub split: bool,
    /// Run pathname expansion (globbing).
    pub pathname: bool,
    /// Separate leading `NAME=value` words before the rest of the pipeline.
    pub assignment_separation: bool,
}

impl PhaseSet {
    /// Every phase enabled: the ordinary command-line word-expansion path.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            brace: true,
            tilde: true,
            parameter: true,
            split: true,
            pathname: true,
            assignment_separation: true,
        }
    }

    /// No splitting or globbing, everything else on: the shape used by
    /// double-quoted contexts and assignment right-hand sides.
    #[must_use]
    pub const fn no_split_no_glob() -> Self {
        Self {
            split: false,
            pathname: false,
            ..Self::all()
        }
    }
}

/// Resources a single top-level call owns for its duration: the process-
/// substitution table and (eventually) any temporary environment bindings.
/// On a fatal error the caller's `unwind` helper tears these down per spec
/// §4.11's four-step list.
#[derive(Default)]
pub struct Session {
    /// Live process-substitution slots opened during this call.
    pub proc_table: ProcSubstTable,
}

/// The expander's main entry point (spec §6): runs the full per-word
/// pipeline over every word of `words`, honoring `phases`.
///
/// # Errors
/// On a fatal error, tears down pending process substitutions opened during
/// this call and returns the error; the caller is expected to invoke its own
/// top-level unwind with the error's [`UnwindDisposition`].
pub fn expand_word_list(
    words: WordList,
    phases: PhaseSet,
    ctx: &mut dyn ExpanderContext,
    cfg: &ExpanderConfig,
    session: &mut Session,
) -> Result<WordList, Error> {
    let snapshot = session.proc_table.snapshot();

    match expand_word_list_inner(words, phases, ctx, cfg, session) {
        Ok(result) => Ok(result),
        Err(err) => {
            session.proc_table.close_new(&snapshot);
            Err(err)
        }
    }
}

fn expand_word_list_inner(
    words: WordList,
    phases: PhaseSet,
    ctx: &mut dyn ExpanderContext,
    cfg: &ExpanderConfig,
    session: &mut Session,
) -> Result<WordList, Error> {
    let separated = if phases.assignment_separation {
        assignment::separate(words, false)
    } else {
        assignment::Separated {
            assignments: WordList::new(),
            remainder: words,
        }
    };

    let mut assignments = WordList::new();
    for word in separated.assignments {
        assignments.push(expand_assignment_word(&word, ctx, cfg, session)?);
    }

    let mut out = WordList::new();
    for word in separated.remainder {
        let expanded = expand_one_word(&word, word.flags, phases, ctx, cfg, session)?;
        out.extend(expanded);
    }

    assignments.extend(out);
    Ok(assignments)
}

/// Runs brace expansion on one word (producing 1+ raw strings), then the
/// rest of the pipeline on each, per spec §4.11's ordering.
fn expand_one_word(
    word: &WordDesc,
    flags: WordFlags,
    phases: PhaseSet,
    ctx: &mut dyn ExpanderContext,
    cfg: &ExpanderConfig,
    session: &mut Session,
) -> Result<WordList, Error> {
    let text = word.to_string_lossy().into_owned();
    tracing::debug!(target: crate::trace_categories::DRIVER, "expanding word: '{text}'");

    let alternatives = if phases.brace && cfg.brace_expansion && !flags.contains(WordFlags::NO_BRACE) {
        let pieces = brace::expand(&text, cfg.multibyte_enabled);
        if pieces.len() > 1 {
            tracing::debug!(target: crate::trace_categories::BRACE, "'{text}' brace-expanded to {pieces:?}");
        }
        pieces
    } else {
        vec![text]
    };

    let mut out = WordList::new();
    for alt in alternatives {
        out.extend(expand_single_text(&alt, flags, phases, ctx, cfg, session)?);
    }
    Ok(out)
}

fn expand_single_text(
    text: &str,
    flags: WordFlags,
    phases: PhaseSet,
    ctx: &mut dyn ExpanderContext,
    cfg: &ExpanderConfig,
    session: &mut Session,
) -> Result<WordList, Error> {
    let base_qf = QuoteFlags::NONE;
    let expansion = if phases.parameter || phases.tilde {
        wordexp::expand(text, flags, base_qf, ctx, cfg, &mut session.proc_table)?
    } else {
        wordexp::WordExpansion {
            prefix_fields: Vec::new(),
            tail: crate::quoting::quote_string(text.as_bytes(), cfg.multibyte_enabled),
            had_quoting: true,
        }
    };

    let ifs = IfsInfo::new(ctx.variable_lookup("IFS").map(|v| v.to_scalar_string()).as_deref());
    let suppress_split = !phases.split
        || flags.contains(WordFlags::NO_SPLIT)
        || flags.contains(WordFlags::NO_SPLIT2)
        || flags.contains(WordFlags::ASSIGN_RHS);

    let mut fields: Vec<WordDesc> = expansion.prefix_fields;

    if suppress_split {
        fields.push(WordDesc::with_flags(quoting::quote_removal(&expansion.tail), flags));
    } else {
        let had_quoted_null = expansion.had_quoting && expansion.tail == [quoting::NS];
        for split_field in splitter::split(&expansion.tail, &ifs, had_quoted_null) {
            fields.push(WordDesc::with_flags(
                quoting::quote_removal(&split_field.bytes),
                flags | split_field.flags,
            ));
        }
    }

    let mut out = WordList::new();
    for field in fields {
        if phases.pathname && !flags.contains(WordFlags::NO_GLOB) {
            for expanded in pathname::expand_word(&field, ctx, cfg)? {
                out.push(expanded);
            }
        } else {
            out.push(field);
        }
    }
    Ok(out)
}

/// Expands the right-hand side of a `NAME=value` word: no splitting, no
/// globbing, but every other phase runs (spec §4.9's note that assignment
/// values are protected exactly like a quoted context).
fn expand_assignment_word(
    word: &WordDesc,
    ctx: &mut dyn ExpanderContext,
    cfg: &ExpanderConfig,
    session: &mut Session,
) -> Result<WordDesc, Error> {
    let phases = PhaseSet::no_split_no_glob();
    let flags = word.flags.with(WordFlags::ASSIGN_RHS);
    let result = expand_one_word(word, flags, phases, ctx, cfg, session)?;
    Ok(result
        .into_vec()
        .pop()
        .unwrap_or_else(|| WordDesc::new(Vec::new())))
}

/// `expand_string` (spec §6): expands one raw string as though it were a
/// single already-tokenized word, returning however many fields it split
/// into.
///
/// # Errors
/// Propagates any fatal expansion error.
pub fn expand_string(
    s: &str,
    quoted_context: bool,
    ctx: &mut dyn ExpanderContext,
    cfg: &ExpanderConfig,
) -> Result<WordList, Error> {
    let mut session = Session::default();
    let phases = if quoted_context {
        PhaseSet::no_split_no_glob()
    } else {
        PhaseSet::all()
    };
    let words = {
        let mut wl = WordList::new();
        wl.push(WordDesc::new(s));
        wl
    };
    expand_word_list(words, phases, ctx, cfg, &mut session)
}

/// `expand_to_single_string` (spec §6): like [`expand_string`] in a quoted
/// context, joining multiple result fields with a plain space (used for
/// contexts that want one scalar back, e.g. a here-document delimiter).
///
/// # Errors
/// Propagates any fatal expansion error.
pub fn expand_to_single_string(
    s: &str,
    ctx: &mut dyn ExpanderContext,
    cfg: &ExpanderConfig,
) -> Result<String, Error> {
    let words = expand_string(s, true, ctx, cfg)?;
    Ok(words
        .iter()
        .map(|w| w.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" "))
}

/// `expand_assignment_rhs` (spec §6): expands the right-hand side of a
/// standalone `NAME=value` assignment (e.g. from `declare`/`export`),
/// reusing the same no-split/no-glob treatment as an inline assignment word.
///
/// # Errors
/// Propagates any fatal expansion error.
pub fn expand_assignment_rhs(
    s: &str,
    ctx: &mut dyn ExpanderContext,
    cfg: &ExpanderConfig,
) -> Result<WordList, Error> {
    let mut session = Session::default();
    let word = WordDesc::with_flags(s, WordFlags::ASSIGN_RHS);
    let expanded = expand_assignment_word(&word, ctx, cfg, &mut session)?;
    let mut wl = WordList::new();
    wl.push(expanded);
    Ok(wl)
}

/// `expand_for_pattern` (spec §6): expands a `case`-arm pattern word, which
/// never splits or globs and carries pattern-quote semantics for the
/// downstream matcher.
///
/// # Errors
/// Propagates any fatal expansion error.
pub fn expand_for_pattern(
    s: &str,
    ctx: &mut dyn ExpanderContext,
    cfg: &ExpanderConfig,
) -> Result<String, Error> {
    let mut session = Session::default();
    let expansion = wordexp::expand(
        s,
        WordFlags::NONE,
        QuoteFlags::PATQUOTE,
        ctx,
        cfg,
        &mut session.proc_table,
    )?;
    Ok(String::from_utf8_lossy(&quoting::quote_removal(&expansion.tail)).into_owned())
}

/// `expand_prompt` (spec §6): expands a `PS1`-style prompt string. Splitting
/// and globbing never apply; a bare trailing quoted-null collapses to empty.
///
/// # Errors
/// Propagates any fatal expansion error.
pub fn expand_prompt(
    s: &str,
    ctx: &mut dyn ExpanderContext,
    cfg: &ExpanderConfig,
) -> Result<String, Error> {
    expand_to_single_string(s, ctx, cfg)
}

/// `expand_dollar_quote_translate` (spec §6): re-exported from [`crate::escape`]
/// for callers that only import `driver`.
#[must_use]
pub fn expand_dollar_quote_translate(s: &str) -> String {
    crate::escape::expand_dollar_quote_translate(s)
}

/// Performs spec §4.11's fatal-error unwind sequence: disposes `partial`,
/// tears down every process substitution opened during this call, and
/// returns the disposition the host's own top-level handler should act on.
///
/// Clearing "temporary environment" (step 3) is the host's responsibility,
/// since only it owns the variable store; this helper covers the two
/// resources the expander itself owns (the partial output list and the
/// process-substitution table).
pub fn unwind(err: &Error, partial: WordList, session: &mut Session) -> UnwindDisposition {
    drop(partial);
    session.proc_table.sweep();
    err.unwind_disposition()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestContext;

    #[test]
    fn plain_words_pass_through_unsplit() {
        let mut ctx = TestContext::new();
        let cfg = ExpanderConfig::default();
        let mut session = Session::default();
        let mut words = WordList::new();
        words.push(WordDesc::new("hello"));
        words.push(WordDesc::new("world"));
        let result = expand_word_list(words, PhaseSet::all(), &mut ctx, &cfg, &mut session).unwrap();
        let strings: Vec<_> = result.iter().map(|w| w.to_string_lossy().into_owned()).collect();
        assert_eq!(strings, vec!["hello", "world"]);
    }

    #[test]
    fn unquoted_parameter_splits_on_ifs() {
        let mut ctx = TestContext::new();
        ctx.set("x", "a b c");
        let cfg = ExpanderConfig::default();
        let mut session = Session::default();
        let mut words = WordList::new();
        words.push(WordDesc::new("$x"));
        let result = expand_word_list(words, PhaseSet::all(), &mut ctx, &cfg, &mut session).unwrap();
        let strings: Vec<_> = result.iter().map(|w| w.to_string_lossy().into_owned()).collect();
        assert_eq!(strings, vec!["a", "b", "c"]);
    }

    #[test]
    fn quoted_parameter_does_not_split() {
        let mut ctx = TestContext::new();
        ctx.set("x", "a b c");
        let cfg = ExpanderConfig::default();
        let mut session = Session::default();
        let mut words = WordList::new();
        words.push(WordDesc::new("\"$x\""));
        let result = expand_word_list(words, PhaseSet::all(), &mut ctx, &cfg, &mut session).unwrap();
        let strings: Vec<_> = result.iter().map(|w| w.to_string_lossy().into_owned()).collect();
        assert_eq!(strings, vec!["a b c"]);
    }

    #[test]
    fn leading_assignment_is_separated_and_expanded() {
        let mut ctx = TestContext::new();
        ctx.set("y", "value");
        let cfg = ExpanderConfig::default();
        let mut session = Session::default();
        let mut words = WordList::new();
        words.push(WordDesc::with_flags("X=$y", WordFlags::ASSIGNMENT));
        words.push(WordDesc::new("cmd"));
        let result = expand_word_list(words, PhaseSet::all(), &mut ctx, &cfg, &mut session).unwrap();
        let strings: Vec<_> = result.iter().map(|w| w.to_string_lossy().into_owned()).collect();
        assert_eq!(strings, vec!["X=value", "cmd"]);
    }

    #[test]
    fn brace_expansion_runs_before_splitting() {
        let mut ctx = TestContext::new();
        let cfg = ExpanderConfig::default();
        let mut session = Session::default();
        let mut words = WordList::new();
        words.push(WordDesc::new("a{1,2}b"));
        let result = expand_word_list(words, PhaseSet::all(), &mut ctx, &cfg, &mut session).unwrap();
        let strings: Vec<_> = result.iter().map(|w| w.to_string_lossy().into_owned()).collect();
        assert_eq!(strings, vec!["a1b", "a2b"]);
    }

    #[test]
    fn glob_expands_in_the_final_phase() {
        let mut ctx = TestContext::new();
        ctx.glob_results.insert("*.rs".to_string(), vec!["a.rs".to_string(), "b.rs".to_string()]);
        let cfg = ExpanderConfig::default();
        let mut session = Session::default();
        let mut words = WordList::new();
        words.push(WordDesc::new("*.rs"));
        let result = expand_word_list(words, PhaseSet::all(), &mut ctx, &cfg, &mut session).unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn expand_to_single_string_joins_fields() {
        let mut ctx = TestContext::new();
        ctx.set("x", "a b");
        let cfg = ExpanderConfig::default();
        let result = expand_to_single_string("$x c", &mut ctx, &cfg).unwrap();
        assert_eq!(result, "a b c");
    }

    #[test]
    fn expand_assignment_rhs_suppresses_split_and_glob() {
        let mut ctx = TestContext::new();
        ctx.set("x", "a b");
        let cfg = ExpanderConfig::default();
        let result = expand_assignment_rhs("$x/*", &mut ctx, &cfg).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.iter().next().unwrap().to_string_lossy(), "a b/*");
    }
}
