//! Command-substitution runner: `$(...)` and `` `...` `` (spec §4.4).
//!
//! The actual command is run via [`ExpanderContext::execute_command_string`];
//! this module owns the fork/pipe/wait plumbing needed to capture its
//! stdout, the "cat-file" fast path, trailing-newline stripping, and
//! NUL-byte policy (spec §5).
//!
//! Unlike a real subprocess spawn, the command here is opaque interpreter
//! text rather than a named external program, so there's no executable to
//! hand to `std::process::Command` the way the host shell does for real
//! child processes. The child branch below is kept to the bare minimum
//! (one `dup2`, then the callback, then `_exit`) and
//! [`ExpanderContext::execute_command_string`] documents the same
//! post-fork restriction real shells place on their `pre_exec` hooks.

use std::io::Read;
use std::os::fd::AsRawFd;

use crate::context::ExpanderContext;
use crate::error::Error;
use crate::sys;

/// Runs `command_text` as a command substitution and returns its captured,
/// trailing-newline-stripped, NUL-free standard output.
///
/// # Errors
/// Propagates I/O failures from pipe/fork/wait, and any error the host's
/// `execute_command_string` callback returns.
pub fn substitute(command_text: &str, ctx: &mut dyn ExpanderContext) -> Result<String, Error> {
    tracing::debug!(target: crate::trace_categories::CMD_SUBST, "substituting: '{command_text}'");

    if let Some(path) = ctx.parse_as_bare_input_redirect(command_text) {
        tracing::debug!(target: crate::trace_categories::CMD_SUBST, "cat-file fast path: {}", path.display());
        return read_file_fast_path(&path);
    }

    let raw = run_and_capture(command_text, ctx)?;
    Ok(finish_output(&raw))
}

/// `< FILE` with no command: read the file directly rather than forking a
/// shell to run `cat`, per spec §4.4's "cat-file" fast path.
fn read_file_fast_path(path: &std::path::Path) -> Result<String, Error> {
    let raw = std::fs::read(path)?;
    Ok(finish_output(&raw))
}

/// Strips exactly the trailing run of `\n` bytes, then drops any embedded
/// NUL bytes (spec §5: command substitution output containing NULs has them
/// silently dropped, since shell words cannot embed them).
fn finish_output(raw: &[u8]) -> String {
    let mut end = raw.len();
    while end > 0 && raw[end - 1] == b'\n' {
        end -= 1;
    }
    let trimmed = &raw[..end];
    let cleaned: Vec<u8> = trimmed.iter().copied().filter(|&b| b != 0).collect();
    String::from_utf8_lossy(&cleaned).into_owned()
}

#[cfg(unix)]
fn run_and_capture(command_text: &str, ctx: &mut dyn ExpanderContext) -> Result<Vec<u8>, Error> {
    let (read_end, write_end) = sys::create_pipe()?;

    // SAFETY: between fork and exit/exec the child only dup2s the write end
    // over its stdout, runs the command, then exits; no other shared state
    // is touched.
    let outcome = unsafe { sys::fork_child()? };

    match outcome {
        sys::ForkOutcome::Parent(child_pid) => {
            drop(write_end);
            let old_mask = sys::block_sigint()?;

            let mut buf = Vec::new();
            let mut file = std::fs::File::from(read_end);
            file.read_to_end(&mut buf)?;

            let status = sys::wait_for(child_pid);
            sys::restore_sigint(old_mask)?;
            let status = status?;

            if status == 128 + nix::libc::SIGINT {
                tracing::debug!(target: crate::trace_categories::CMD_SUBST, "child interrupted, re-raising SIGINT");
                sys::raise_sigint()?;
            }

            Ok(buf)
        }
        sys::ForkOutcome::Child => {
            drop(read_end);
            // SAFETY: dup2 onto stdout in the freshly forked child, before
            // any other work; this is the only fd manipulation performed.
            unsafe {
                nix::libc::dup2(write_end.as_raw_fd(), nix::libc::STDOUT_FILENO);
            }
            drop(write_end);
            let status = ctx.execute_command_string(command_text).unwrap_or(126);
            // `_exit`, not `std::process::exit`: the latter runs atexit-style
            // cleanup that isn't safe to run in a fork()ed child.
            nix::unistd::_exit(status);
        }
    }
}

#[cfg(not(unix))]
fn run_and_capture(command_text: &str, ctx: &mut dyn ExpanderContext) -> Result<Vec<u8>, Error> {
    let _ = sys::create_pipe()?;
    let _ = ctx.execute_command_string(command_text)?;
    Ok(Vec::new())
}
