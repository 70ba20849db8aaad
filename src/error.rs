//! Error facilities for the expansion engine.

/// Unified error type for this crate. Contains just a kind for now,
/// matching the shape external callers actually need to match on.
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Returns the kind of error.
    pub const fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns whether this error should cause the top-level driver to
    /// unwind (as opposed to being swallowed and yielding an empty result).
    pub const fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }

    /// What disposition the host's top-level unwind should use if this
    /// error propagates all the way out.
    pub const fn unwind_disposition(&self) -> UnwindDisposition {
        self.kind.unwind_disposition()
    }
}

impl<K: Into<ErrorKind>> From<K> for Error {
    fn from(kind: K) -> Self {
        Self { kind: kind.into() }
    }
}

/// What the host's top-level handler should do once it has finished
/// releasing resources for a fatal expansion error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnwindDisposition {
    /// Discard the current command and return to the prompt / next command.
    Discard,
    /// Force the shell to exit.
    ForceEof,
}

/// Monolithic error type for the expansion engine.
#[derive(thiserror::Error, Debug)]
pub enum ErrorKind {
    /// `${...}` or `$((...))` or `$[...]` had no matching closing delimiter.
    #[error("bad substitution: no closing `{0}` in {1}")]
    BadSubstitution(char, String),

    /// A parameter was referenced that is unset, under `set -u`.
    #[error("{0}: unbound variable")]
    UnboundVariable(String),

    /// `${name?word}` was triggered (name unset/null and the `?` operator fired).
    #[error("{0}: {1}")]
    ParameterNullOrNotSet(String, String),

    /// Assignment was attempted to something that cannot be assigned to
    /// (a special parameter, a positional parameter, etc).
    #[error("{0}: cannot assign in this way")]
    CannotAssignToSpecialParameter(String),

    /// Assignment was attempted to a readonly variable.
    #[error("{0}: readonly variable")]
    ReadonlyVariable(String),

    /// `${x:off:len}` had a negative substring length smaller than is legal.
    #[error("{0}: substring expression < 0")]
    SubstringExpressionNegative(String),

    /// `failglob` is set and a glob pattern had no matches.
    #[error("no match: {0}")]
    NoGlobMatch(String),

    /// An indirect (`${!name}`) or transform reference named something
    /// that is not a legal identifier.
    #[error("{0}: invalid variable name")]
    InvalidIndirection(String),

    /// `${name[subscript]}` had a malformed subscript.
    #[error("{0}: bad array subscript")]
    InvalidArraySubscript(String),

    /// Arithmetic evaluation failed.
    #[error("arithmetic evaluation error: {0}")]
    Arithmetic(#[from] crate::arithmetic::EvalError),

    /// Fork, pipe, or FIFO creation failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The expanded index for a substring/array/etc expression is out of range.
    #[error("{0}: out of range")]
    OutOfRange(String),

    /// `$((...))`-style invocations nested beyond the engine's supported depth.
    #[error("expression recursion level exceeded")]
    RecursionLimitExceeded,

    /// Generic byte-decoding failure when multibyte handling is enabled.
    #[error("failed to decode utf-8")]
    Utf8(#[from] std::str::Utf8Error),

    /// An operation not supported in this configuration/build was requested.
    #[error("not supported: {0}")]
    Unsupported(&'static str),
}

impl ErrorKind {
    /// Whether this kind of error is fatal (unwinds expansion) per spec
    /// §7, or recoverable (yields an empty/sentinel result and continues).
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Io(_))
    }

    /// The unwind disposition a fatal error of this kind should carry.
    pub const fn unwind_disposition(&self) -> UnwindDisposition {
        UnwindDisposition::Discard
    }
}

/// Convenience for returning a fatal "bad substitution" error.
pub fn bad_substitution<T>(closer: char, context: impl Into<String>) -> Result<T, Error> {
    Err(ErrorKind::BadSubstitution(closer, context.into()).into())
}
