//! Expander-wide configuration, recognized at construction time (spec §3
//! "Configuration").

/// Configuration recognized when constructing an expander. Cheap to clone;
/// expected to be set up once per shell instance and shared.
#[derive(Debug, Clone)]
pub struct ExpanderConfig {
    /// Whether to treat the input as a sequence of (possibly multi-byte)
    /// characters rather than raw bytes for character-oriented operations
    /// (`${#x}`, `${x:off:len}`, case modification).
    pub multibyte_enabled: bool,
    /// Whether the engine should behave per POSIX mode (affects fatal-vs-
    /// warning treatment of several error classes, see spec §7).
    pub posix_mode: bool,
    /// Whether extended pattern matching (`extglob`) is enabled; passed
    /// through to the host pattern matcher, not interpreted here.
    pub extended_glob: bool,
    /// `failglob`: a pathname expansion with no matches is a fatal error.
    pub fail_glob: bool,
    /// `nullglob`: a pathname expansion with no matches vanishes silently.
    pub null_glob: bool,
    /// Whether the brace-expansion phase runs at all.
    pub brace_expansion: bool,
    /// `set -u`: referencing an unset parameter is a fatal error.
    pub unbound_variable_is_error: bool,

    /// Compatibility toggle (spec §9 "Open questions"): whether `"$@"`
    /// occurring as the default/alternate word of `${x-...}`/`${x:-...}`
    /// vanishes like an unquoted empty `$@` would, when there are no
    /// positional parameters, instead of contributing a literal empty word.
    pub at_sign_in_unset_default_vanishes: bool,
    /// Compatibility toggle (spec §9): apply the stricter POSIX
    /// interpretation 888 rules for `$@`/`$*` inside parameter-operator
    /// right-hand sides under unset/null IFS.
    pub posix_interp_888: bool,
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        Self {
            multibyte_enabled: true,
            posix_mode: false,
            extended_glob: false,
            fail_glob: false,
            null_glob: false,
            brace_expansion: true,
            unbound_variable_is_error: false,
            at_sign_in_unset_default_vanishes: false,
            posix_interp_888: false,
        }
    }
}
