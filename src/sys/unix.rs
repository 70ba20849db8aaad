//! Unix primitives, grounded on the teacher's `sys/unix/signal.rs` and
//! `sys/unix.rs`: thin wrappers around `nix` that translate errno failures
//! into this crate's [`crate::error::Error`].

use std::os::fd::{AsRawFd, OwnedFd};

use crate::error::{Error, ErrorKind};

/// A raw OS process id.
pub(crate) type ProcessId = i32;

/// What a [`fork_child`] call becomes in each of the two resulting
/// processes.
pub(crate) enum ForkOutcome {
    /// We are the parent; holds the child's pid.
    Parent(ProcessId),
    /// We are the child, about to exec or run `body`.
    Child,
}

/// Creates a pipe, returning `(read_end, write_end)`.
pub(crate) fn create_pipe() -> Result<(OwnedFd, OwnedFd), Error> {
    let (read, write) = nix::unistd::pipe().map_err(std::io::Error::from)?;
    Ok((read, write))
}

/// Forks the current process.
///
/// # Safety
/// Identical caveats to `nix::unistd::fork`: between the fork and any
/// subsequent `exec`/`exit`, the child may only call async-signal-safe
/// functions.
pub(crate) unsafe fn fork_child() -> Result<ForkOutcome, Error> {
    match unsafe { nix::unistd::fork() }.map_err(std::io::Error::from)? {
        nix::unistd::ForkResult::Parent { child } => Ok(ForkOutcome::Parent(child.as_raw())),
        nix::unistd::ForkResult::Child => Ok(ForkOutcome::Child),
    }
}

/// Waits for `pid` to exit, returning its exit status (or 128+signal if it
/// was killed by a signal, matching shell convention).
pub(crate) fn wait_for(pid: ProcessId) -> Result<i32, Error> {
    use nix::sys::wait::WaitStatus;
    loop {
        match nix::sys::wait::waitpid(nix::unistd::Pid::from_raw(pid), None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(code),
            Ok(WaitStatus::Signaled(_, signal, _)) => return Ok(128 + signal as i32),
            Ok(_) => continue,
            Err(nix::errno::Errno::EINTR) => continue,
            Err(e) => return Err(ErrorKind::Io(std::io::Error::from(e)).into()),
        }
    }
}

/// Blocks `SIGINT` in the calling process, returning the previous mask so
/// it can be restored via [`restore_sigint`]. Command substitution blocks
/// `SIGINT` around the wait per spec §4.4/§5, re-raising it afterward if it
/// fired.
pub(crate) fn block_sigint() -> Result<nix::sys::signal::SigSet, Error> {
    let mut new_mask = nix::sys::signal::SigSet::empty();
    new_mask.add(nix::sys::signal::Signal::SIGINT);
    let mut old_mask = nix::sys::signal::SigSet::empty();
    nix::sys::signal::sigprocmask(
        nix::sys::signal::SigmaskHow::SIG_BLOCK,
        Some(&new_mask),
        Some(&mut old_mask),
    )
    .map_err(std::io::Error::from)?;
    Ok(old_mask)
}

/// Restores a signal mask previously returned by [`block_sigint`].
pub(crate) fn restore_sigint(old_mask: nix::sys::signal::SigSet) -> Result<(), Error> {
    nix::sys::signal::sigprocmask(nix::sys::signal::SigmaskHow::SIG_SETMASK, Some(&old_mask), None)
        .map_err(std::io::Error::from)?;
    Ok(())
}

/// Re-raises `SIGINT` against the current process, used by command
/// substitution to propagate an interrupted child's Ctrl-C out of any
/// surrounding loop (spec §5).
pub(crate) fn raise_sigint() -> Result<(), Error> {
    nix::sys::signal::raise(nix::sys::signal::Signal::SIGINT).map_err(std::io::Error::from)?;
    Ok(())
}

/// Closes a raw file descriptor, used once the read/write half of a pipe
/// has been handed off across a fork.
pub(crate) fn close_fd(fd: &impl AsRawFd) {
    let _ = nix::unistd::close(fd.as_raw_fd());
}
