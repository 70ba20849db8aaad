//! Platform primitives needed by command and process substitution: pipes,
//! fork, wait, and signal blocking. Split the way the teacher's own `sys`
//! module is split, by platform.

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub(crate) use unix as platform;

#[cfg(not(unix))]
mod stubs;
#[cfg(not(unix))]
pub(crate) use stubs as platform;

pub(crate) use platform::{
    block_sigint, create_pipe, fork_child, raise_sigint, restore_sigint, wait_for, ForkOutcome, ProcessId,
};
