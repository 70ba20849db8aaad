//! Named `tracing` targets for the expansion phases, so callers can filter
//! logs by phase (e.g. `RUST_LOG=wexpand_core::brace=trace`).

/// Brace expansion phase.
pub const BRACE: &str = "wexpand_core::brace";
/// Tilde expansion phase.
pub const TILDE: &str = "wexpand_core::tilde";
/// Parameter expansion phase.
pub const PARAMETER: &str = "wexpand_core::parameter";
/// Command substitution phase.
pub const CMD_SUBST: &str = "wexpand_core::cmdsubst";
/// Arithmetic expansion phase.
pub const ARITHMETIC: &str = "wexpand_core::arithmetic";
/// Process substitution phase.
pub const PROC_SUBST: &str = "wexpand_core::procsubst";
/// IFS splitting phase.
pub const SPLIT: &str = "wexpand_core::splitter";
/// Pathname expansion phase.
pub const GLOB: &str = "wexpand_core::pathname";
/// Top-level driver / fatal-error unwind.
pub const DRIVER: &str = "wexpand_core::driver";
