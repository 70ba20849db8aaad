//! Process-substitution manager: `<(...)` / `>(...)` lifecycle (spec §4.5).
//!
//! Maintains a slot table exactly per spec: each slot is live (PID > 0),
//! reaped-awaiting-cleanup (PID = -1), or free (PID = 0/no entry). Backed by
//! a `/dev/fd/N` pipe, the way `brush-core/src/sys/unix/fd.rs`'s fd-table
//! handling assumes an fd-capable platform; there is no FIFO fallback.

use std::path::PathBuf;

use crate::error::Error;
use crate::sys;

/// Which channel backs a process-substitution slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// A pipe exposed to the child via `/dev/fd/N`.
    DevFd(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    /// PID > 0: substitution is live.
    Live(i32),
    /// PID == -1: child has been reaped, cleanup pending.
    Reaped,
}

struct Slot {
    backend: Backend,
    state: SlotState,
}

/// The process-substitution table. One instance is owned by the driver for
/// the lifetime of a top-level expansion call (spec §5's resource list).
#[derive(Default)]
pub struct ProcSubstTable {
    slots: Vec<Option<Slot>>,
}

impl ProcSubstTable {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Registers a live substitution, returning its slot index.
    pub fn add_entry(&mut self, backend: Backend, pid: i32) -> usize {
        let slot = Slot {
            backend,
            state: SlotState::Live(pid),
        };
        for (i, existing) in self.slots.iter_mut().enumerate() {
            if existing.is_none() {
                *existing = Some(slot);
                return i;
            }
        }
        self.slots.push(Some(slot));
        self.slots.len() - 1
    }

    /// Marks the slot owning `pid` as reaped (PID -> -1), if found.
    pub fn reap(&mut self, pid: i32) {
        for slot in self.slots.iter_mut().flatten() {
            if slot.state == SlotState::Live(pid) {
                slot.state = SlotState::Reaped;
            }
        }
    }

    /// Frees every reaped slot, per spec's lifecycle invariant.
    pub fn sweep(&mut self) {
        for slot in &mut self.slots {
            let should_free = matches!(slot, Some(s) if s.state == SlotState::Reaped);
            if should_free {
                if let Some(s) = slot.take() {
                    cleanup_backend(&s.backend);
                }
            }
        }
    }

    /// Closes every entry not present in `snapshot` (a list of slot
    /// indices taken before a recursive substitution ran), preventing
    /// nested substitutions from leaking descriptors into unrelated
    /// subshells.
    pub fn close_new(&mut self, snapshot: &[usize]) {
        let keep: std::collections::HashSet<usize> = snapshot.iter().copied().collect();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if !keep.contains(&i) {
                if let Some(s) = slot.take() {
                    cleanup_backend(&s.backend);
                }
            }
        }
    }

    /// A snapshot of currently-occupied slot indices, for [`close_new`].
    #[must_use]
    pub fn snapshot(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|_| i))
            .collect()
    }

    /// Number of still-occupied slots (live or reaped-but-not-yet-swept).
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Whether the table has no occupied slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `/dev/fd` slots have no filesystem entry of their own to unlink; the
/// pipe is reclaimed when both ends are closed.
fn cleanup_backend(_backend: &Backend) {}

/// Creates a new process substitution for `command_text`, returning the
/// path the expanded word should reference (`/dev/fd/N` or the FIFO path)
/// and registering it in `table`.
///
/// # Errors
/// Propagates pipe/fork failures.
pub fn create(
    command_text: &str,
    is_output: bool,
    table: &mut ProcSubstTable,
    ctx: &mut dyn crate::context::ExpanderContext,
) -> Result<PathBuf, Error> {
    tracing::debug!(target: crate::trace_categories::PROC_SUBST, "substituting {}: '{command_text}'", if is_output { "output" } else { "input" });

    let (read_end, write_end) = sys::create_pipe()?;

    // SAFETY: the child only dup2s its half of the pipe over the
    // appropriate standard stream, runs the command, then exits.
    let outcome = unsafe { sys::fork_child()? };

    match outcome {
        sys::ForkOutcome::Parent(child_pid) => {
            let (kept, path) = if is_output {
                drop(read_end);
                let path = dev_fd_path(&write_end);
                (write_end, path)
            } else {
                drop(write_end);
                let path = dev_fd_path(&read_end);
                (read_end, path)
            };
            std::mem::forget(kept);
            let slot = table.add_entry(Backend::DevFd(path.clone()), child_pid);
            tracing::debug!(target: crate::trace_categories::PROC_SUBST, "slot {slot} -> {} (pid {child_pid})", path.display());
            Ok(path)
        }
        sys::ForkOutcome::Child => {
            #[cfg(unix)]
            {
                use std::os::fd::AsRawFd;
                let (keep, target_fd) = if is_output {
                    drop(write_end);
                    (read_end, nix::libc::STDIN_FILENO)
                } else {
                    drop(read_end);
                    (write_end, nix::libc::STDOUT_FILENO)
                };
                // SAFETY: single dup2 call in the freshly forked child
                // before any other fd manipulation.
                unsafe {
                    nix::libc::dup2(keep.as_raw_fd(), target_fd);
                }
                drop(keep);
            }
            let status = ctx.execute_command_string(command_text).unwrap_or(126);
            // `_exit`, not `std::process::exit`: the latter runs atexit-style
            // cleanup that isn't safe to run in a fork()ed child.
            nix::unistd::_exit(status);
        }
    }
}

#[cfg(unix)]
fn dev_fd_path(fd: &impl std::os::fd::AsRawFd) -> PathBuf {
    PathBuf::from(format!("/dev/fd/{}", fd.as_raw_fd()))
}

#[cfg(not(unix))]
fn dev_fd_path(_fd: &impl std::any::Any) -> PathBuf {
    PathBuf::new()
}
