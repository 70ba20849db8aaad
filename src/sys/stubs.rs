//! Stand-in primitives for non-Unix targets, where process substitution and
//! the fork-based command-substitution fast path are unsupported. Grounded
//! on the teacher's own `cfg(not(unix))` stub module split.

use std::os::fd::OwnedFd;

use crate::error::{Error, ErrorKind};

pub(crate) type ProcessId = i32;

pub(crate) enum ForkOutcome {
    Parent(ProcessId),
    Child,
}

pub(crate) fn create_pipe() -> Result<(OwnedFd, OwnedFd), Error> {
    Err(ErrorKind::Unsupported("pipes are not supported on this platform").into())
}

/// # Safety
/// Never actually forks; always returns an error.
pub(crate) unsafe fn fork_child() -> Result<ForkOutcome, Error> {
    Err(ErrorKind::Unsupported("fork is not supported on this platform").into())
}

pub(crate) fn wait_for(_pid: ProcessId) -> Result<i32, Error> {
    Err(ErrorKind::Unsupported("wait is not supported on this platform").into())
}

pub(crate) fn block_sigint() -> Result<(), Error> {
    Ok(())
}

pub(crate) fn restore_sigint(_old_mask: ()) -> Result<(), Error> {
    Ok(())
}

pub(crate) fn raise_sigint() -> Result<(), Error> {
    Ok(())
}
