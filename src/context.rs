//! The capability record bundling every host collaborator this engine
//! needs (spec §6, §9 "Dynamic dispatch"). The tokenizer/parser, variable
//! store, job-control/subprocess layer, and pattern matcher/glob engine are
//! all external per spec §1; this trait is the seam.

use crate::error::Error;

/// A shell variable's value as seen by the expander. Mirrors the three
/// shapes parameter expansion must distinguish (`$x`, `${x[@]}` on an
/// indexed array, `${x[@]}` on an associative array).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A plain scalar value.
    Scalar(String),
    /// An indexed array, in index order.
    Indexed(Vec<String>),
    /// An associative array, insertion-ordered.
    Assoc(indexmap::IndexMap<String, String>),
}

impl Value {
    /// Renders the value the way unquoted/"$*"-style scalar contexts want
    /// it: a single string, joining array elements with a space.
    #[must_use]
    pub fn to_scalar_string(&self) -> String {
        match self {
            Self::Scalar(s) => s.clone(),
            Self::Indexed(v) => v.join(" "),
            Self::Assoc(m) => m.values().cloned().collect::<Vec<_>>().join(" "),
        }
    }

    /// All elements of this value taken as a field list (a scalar is one
    /// field; an array contributes one field per element).
    #[must_use]
    pub fn to_fields(&self) -> Vec<String> {
        match self {
            Self::Scalar(s) => vec![s.clone()],
            Self::Indexed(v) => v.clone(),
            Self::Assoc(m) => m.values().cloned().collect(),
        }
    }

    /// Whether this value is considered "null" for `:` operators
    /// (unset-or-empty tests): an empty scalar, or an array with no
    /// elements.
    #[must_use]
    pub fn is_empty_value(&self) -> bool {
        match self {
            Self::Scalar(s) => s.is_empty(),
            Self::Indexed(v) => v.is_empty(),
            Self::Assoc(m) => m.is_empty(),
        }
    }
}

/// Flags accompanying a variable bind request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindFlags {
    /// Append to the existing value instead of replacing it (`+=`).
    pub append: bool,
}

/// Mode for `#`/`##`/`%`/`%%` pattern removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternRemoveMode {
    /// `#pat`: shortest matching prefix.
    ShortestPrefix,
    /// `##pat`: longest matching prefix.
    LongestPrefix,
    /// `%pat`: shortest matching suffix.
    ShortestSuffix,
    /// `%%pat`: longest matching suffix.
    LongestSuffix,
}

/// Mode for `/`/`//`/`/#`/`/%` pattern substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternSubstituteMode {
    /// `/pat/rep`: replace the first match.
    First,
    /// `//pat/rep`: replace every match.
    All,
    /// `/#pat/rep`: match must anchor at the start of the string.
    AnchoredPrefix,
    /// `/%pat/rep`: match must anchor at the end of the string.
    AnchoredSuffix,
}

/// Every host collaborator the expansion engine needs, bundled as one
/// capability record / trait object per spec §9. Implementors back this
/// with a real shell (variable store, job control, glob engine); tests back
/// it with `crate::test_support::TestContext`.
pub trait ExpanderContext {
    /// Looks up a variable by name.
    fn variable_lookup(&self, name: &str) -> Option<Value>;

    /// Binds a variable to a new value, honoring `flags`. Fails with
    /// [`crate::error::ErrorKind::ReadonlyVariable`] if the variable is
    /// readonly.
    fn variable_bind(&mut self, name: &str, value: Value, flags: BindFlags) -> Result<(), Error>;

    /// Unsets a variable.
    fn variable_unset(&mut self, name: &str);

    /// Returns whether a variable of this name is marked readonly.
    fn is_readonly(&self, name: &str) -> bool;

    /// The ordered positional parameters `$1, $2, ...` (not including `$0`).
    fn positional_params(&self) -> Vec<String>;

    /// `$0`.
    fn shell_name(&self) -> String;

    /// The exit status of the last executed command (`$?`).
    fn last_exit_status(&self) -> i32;

    /// Runs `text` as a shell command, returning its exit status. Used by
    /// command substitution and process substitution; stdout capture is
    /// performed by the caller via the `sys` pipe primitives, not by this
    /// callback.
    ///
    /// # Implementor safety
    /// Both callers invoke this from inside a freshly forked child, before
    /// any `exec`/`_exit`. As with a real shell's `pre_exec` hook, Rust
    /// can't guarantee safety of arbitrary code running in that context:
    /// implementations must avoid anything that could deadlock or corrupt
    /// state inherited from the parent (allocator/lock state shared with
    /// other threads, buffered I/O shared with the parent, etc.).
    fn execute_command_string(&mut self, text: &str) -> Result<i32, Error>;

    /// If `text` parses as a bare `< FILE` redirection with no command,
    /// returns the file path (spec §4.4 "cat-file" fast path).
    fn parse_as_bare_input_redirect(&self, text: &str) -> Option<std::path::PathBuf>;

    /// Enumerates filenames matching `pattern`, or `None` if there were no
    /// matches.
    fn glob(&self, pattern: &str) -> Option<Vec<String>>;

    /// Whether `text` matches `pattern` in its entirety.
    fn pattern_match(&self, pattern: &str, text: &str) -> Result<bool, Error>;

    /// Removes a prefix/suffix of `text` matched by `pattern`.
    fn pattern_remove(
        &self,
        text: &str,
        pattern: &str,
        mode: PatternRemoveMode,
    ) -> Result<String, Error>;

    /// Substitutes occurrences of `pattern` in `text` with `replacement`.
    fn pattern_substitute(
        &self,
        text: &str,
        pattern: &str,
        replacement: &str,
        mode: PatternSubstituteMode,
    ) -> Result<String, Error>;

    /// Resolves a tilde-prefix (`""`, `"user"`, `"+"`, `"-"`, `"3"`) to a
    /// directory, or `None` if it cannot be resolved.
    fn tilde_expand(&self, prefix: &str) -> Option<String>;
}
