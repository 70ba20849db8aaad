//! Word expansion engine for a POSIX-compatible shell.
//!
//! Given a [`worddesc::WordList`] fresh from the tokenizer/parser, runs the
//! full POSIX word-expansion pipeline -- brace expansion, tilde expansion,
//! parameter/variable expansion, command substitution, arithmetic expansion,
//! process substitution, IFS field splitting, pathname expansion (globbing),
//! and quote removal -- and returns the final argument list. The shell
//! itself (tokenizer, variable store, job control, pattern matcher) is out
//! of scope; callers bridge it in via [`context::ExpanderContext`].
//!
//! [`driver::expand_word_list`] is the main entry point; see the `driver`
//! module for the narrower convenience entries (`expand_string`,
//! `expand_to_single_string`, `expand_assignment_rhs`, `expand_for_pattern`,
//! `expand_prompt`, `expand_dollar_quote_translate`).

mod arithmetic;
mod assignment;
mod brace;
mod cmdsubst;
mod config;
mod context;
mod driver;
mod error;
mod escape;
mod extract;
mod parameter;
mod pathname;
mod procsubst;
mod quoting;
mod splitter;
mod sys;
#[cfg(test)]
mod test_support;
mod tilde;
mod trace_categories;
mod worddesc;
mod wordexp;

pub use config::ExpanderConfig;
pub use context::{BindFlags, ExpanderContext, PatternRemoveMode, PatternSubstituteMode, Value};
pub use driver::{
    expand_assignment_rhs, expand_dollar_quote_translate, expand_for_pattern, expand_prompt, expand_string,
    expand_to_single_string, expand_word_list, PhaseSet, Session,
};
pub use error::{Error, ErrorKind, UnwindDisposition};
pub use procsubst::ProcSubstTable;
pub use worddesc::{QuoteFlags, WordDesc, WordFlags, WordList};
