//! A minimal in-memory [`ExpanderContext`] for unit and integration tests.
//! Not part of the public API surface; real hosts provide their own
//! implementation backed by the actual variable store, job control, and
//! glob engine.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::context::{BindFlags, ExpanderContext, PatternRemoveMode, PatternSubstituteMode, Value};
use crate::error::Error;

/// Simple glob-style pattern match supporting `*`, `?`, and `[...]` classes
/// (a small stand-in for the real, externally-owned pattern matcher).
fn glob_match(pattern: &str, text: &str) -> bool {
    fn inner(p: &[char], t: &[char]) -> bool {
        match (p.first(), t.first()) {
            (None, None) => true,
            (Some('*'), _) => inner(&p[1..], t) || (!t.is_empty() && inner(p, &t[1..])),
            (Some('?'), Some(_)) => inner(&p[1..], &t[1..]),
            (Some('['), _) => {
                if let Some(close) = p.iter().position(|&c| c == ']') {
                    if let Some(&tc) = t.first() {
                        let class = &p[1..close];
                        if class.contains(&tc) {
                            return inner(&p[close + 1..], &t[1..]);
                        }
                    }
                    false
                } else {
                    false
                }
            }
            (Some(pc), Some(tc)) if pc == tc => inner(&p[1..], &t[1..]),
            _ => false,
        }
    }
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    inner(&p, &t)
}

/// Finds the longest/shortest prefix or suffix of `text` whose content
/// matches `pattern` in full (used to emulate `#`/`##`/`%`/`%%`).
fn find_prefix_match(text: &str, pattern: &str, longest: bool) -> Option<usize> {
    let chars: Vec<char> = text.chars().collect();
    let indices: Vec<usize> = (0..=chars.len()).collect();
    let candidates = if longest {
        indices.into_iter().rev().collect::<Vec<_>>()
    } else {
        indices
    };
    for end in candidates {
        let candidate: String = chars[..end].iter().collect();
        if glob_match(pattern, &candidate) {
            return Some(candidate.len());
        }
    }
    None
}

fn find_suffix_match(text: &str, pattern: &str, longest: bool) -> Option<usize> {
    let chars: Vec<char> = text.chars().collect();
    let indices: Vec<usize> = (0..=chars.len()).collect();
    let candidates = if longest {
        indices
    } else {
        indices.into_iter().rev().collect::<Vec<_>>()
    };
    for start in candidates {
        let candidate: String = chars[start..].iter().collect();
        if glob_match(pattern, &candidate) {
            let prefix_len: String = chars[..start].iter().collect();
            return Some(prefix_len.len());
        }
    }
    None
}

/// Test double for [`ExpanderContext`].
pub struct TestContext {
    vars: HashMap<String, Value>,
    readonly: std::collections::HashSet<String>,
    positional: Vec<String>,
    shell_name: String,
    last_exit_status: i32,
    /// Canned outputs for `execute_command_string`, keyed by the exact
    /// command text, used by command-substitution tests.
    pub command_outputs: HashMap<String, String>,
    /// Canned file listings for `glob`, keyed by pattern.
    pub glob_results: HashMap<String, Vec<String>>,
    /// Canned home directories for `tilde_expand`, keyed by prefix
    /// (`""` for the current user).
    pub homes: HashMap<String, String>,
}

impl TestContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
            readonly: std::collections::HashSet::new(),
            positional: Vec::new(),
            shell_name: "test-shell".to_string(),
            last_exit_status: 0,
            command_outputs: HashMap::new(),
            glob_results: HashMap::new(),
            homes: HashMap::new(),
        }
    }

    /// Sets a scalar variable.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.vars.insert(name.to_string(), Value::Scalar(value.into()));
    }

    /// Sets an indexed-array variable.
    pub fn set_array(&mut self, name: &str, values: Vec<String>) {
        self.vars.insert(name.to_string(), Value::Indexed(values));
    }

    /// Sets an associative-array variable.
    pub fn set_assoc(&mut self, name: &str, values: IndexMap<String, String>) {
        self.vars.insert(name.to_string(), Value::Assoc(values));
    }

    /// Marks a variable readonly.
    pub fn mark_readonly(&mut self, name: &str) {
        self.readonly.insert(name.to_string());
    }

    /// Sets the positional parameters.
    pub fn set_positional(&mut self, params: Vec<String>) {
        self.positional = params;
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpanderContext for TestContext {
    fn variable_lookup(&self, name: &str) -> Option<Value> {
        self.vars.get(name).cloned()
    }

    fn variable_bind(&mut self, name: &str, value: Value, flags: BindFlags) -> Result<(), Error> {
        if self.readonly.contains(name) {
            return Err(crate::error::ErrorKind::ReadonlyVariable(name.to_string()).into());
        }
        if flags.append {
            let existing = self.vars.get(name).cloned();
            let merged = match (existing, value) {
                (Some(Value::Scalar(mut s)), Value::Scalar(new)) => {
                    s.push_str(&new);
                    Value::Scalar(s)
                }
                (Some(Value::Indexed(mut v)), Value::Indexed(new)) => {
                    v.extend(new);
                    Value::Indexed(v)
                }
                (None, new) => new,
                (_, new) => new,
            };
            self.vars.insert(name.to_string(), merged);
        } else {
            self.vars.insert(name.to_string(), value);
        }
        Ok(())
    }

    fn variable_unset(&mut self, name: &str) {
        self.vars.remove(name);
    }

    fn is_readonly(&self, name: &str) -> bool {
        self.readonly.contains(name)
    }

    fn positional_params(&self) -> Vec<String> {
        self.positional.clone()
    }

    fn shell_name(&self) -> String {
        self.shell_name.clone()
    }

    fn last_exit_status(&self) -> i32 {
        self.last_exit_status
    }

    fn execute_command_string(&mut self, _text: &str) -> Result<i32, Error> {
        self.last_exit_status = 0;
        Ok(0)
    }

    fn parse_as_bare_input_redirect(&self, text: &str) -> Option<std::path::PathBuf> {
        let trimmed = text.trim();
        trimmed
            .strip_prefix('<')
            .map(|rest| std::path::PathBuf::from(rest.trim()))
    }

    fn glob(&self, pattern: &str) -> Option<Vec<String>> {
        self.glob_results.get(pattern).cloned()
    }

    fn pattern_match(&self, pattern: &str, text: &str) -> Result<bool, Error> {
        Ok(glob_match(pattern, text))
    }

    fn pattern_remove(
        &self,
        text: &str,
        pattern: &str,
        mode: PatternRemoveMode,
    ) -> Result<String, Error> {
        Ok(match mode {
            PatternRemoveMode::ShortestPrefix => match find_prefix_match(text, pattern, false) {
                Some(n) if n > 0 => text[n..].to_string(),
                _ => text.to_string(),
            },
            PatternRemoveMode::LongestPrefix => match find_prefix_match(text, pattern, true) {
                Some(n) if n > 0 => text[n..].to_string(),
                _ => text.to_string(),
            },
            PatternRemoveMode::ShortestSuffix => match find_suffix_match(text, pattern, false) {
                Some(n) if n < text.len() => text[..n].to_string(),
                _ => text.to_string(),
            },
            PatternRemoveMode::LongestSuffix => match find_suffix_match(text, pattern, true) {
                Some(n) if n < text.len() => text[..n].to_string(),
                _ => text.to_string(),
            },
        })
    }

    fn pattern_substitute(
        &self,
        text: &str,
        pattern: &str,
        replacement: &str,
        mode: PatternSubstituteMode,
    ) -> Result<String, Error> {
        let chars: Vec<char> = text.chars().collect();
        let expand_amp = |matched: &str| replacement.replace('&', matched);

        match mode {
            PatternSubstituteMode::All => {
                let mut out = String::new();
                let mut i = 0;
                while i < chars.len() {
                    let mut matched_len = None;
                    for end in (i..=chars.len()).rev() {
                        let candidate: String = chars[i..end].iter().collect();
                        if !candidate.is_empty() && glob_match(pattern, &candidate) {
                            matched_len = Some(end - i);
                            break;
                        }
                    }
                    if let Some(len) = matched_len {
                        let matched: String = chars[i..i + len].iter().collect();
                        out.push_str(&expand_amp(&matched));
                        i += len;
                    } else {
                        out.push(chars[i]);
                        i += 1;
                    }
                }
                Ok(out)
            }
            PatternSubstituteMode::First => {
                for i in 0..chars.len() {
                    for end in (i..=chars.len()).rev() {
                        let candidate: String = chars[i..end].iter().collect();
                        if !candidate.is_empty() && glob_match(pattern, &candidate) {
                            let mut out: String = chars[..i].iter().collect();
                            out.push_str(&expand_amp(&candidate));
                            out.push_str(&chars[end..].iter().collect::<String>());
                            return Ok(out);
                        }
                    }
                }
                Ok(text.to_string())
            }
            PatternSubstituteMode::AnchoredPrefix => {
                if let Some(n) = find_prefix_match(text, pattern, true) {
                    if n > 0 {
                        let matched = &text[..n];
                        return Ok(format!("{}{}", expand_amp(matched), &text[n..]));
                    }
                }
                Ok(text.to_string())
            }
            PatternSubstituteMode::AnchoredSuffix => {
                if let Some(n) = find_suffix_match(text, pattern, true) {
                    if n < text.len() {
                        let matched = &text[n..];
                        return Ok(format!("{}{}", &text[..n], expand_amp(matched)));
                    }
                }
                Ok(text.to_string())
            }
        }
    }

    fn tilde_expand(&self, prefix: &str) -> Option<String> {
        self.homes.get(prefix).cloned()
    }
}
