// Copyright 2026 Judge contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! A child process running as the leader of its own process group, with a
//! `Drop` implementation that guarantees the group is torn down.
//!
//! Grounded in the teacher's `process_execution::children::ManagedChild`:
//! `setsid()` in a `pre_exec` hook makes the child its own process-group
//! leader, `kill_on_drop(true)` encourages tokio to reap it, and signalling
//! targets the negative pid so the whole group dies together, including any
//! descendants the child itself forked.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nix::sys::signal;
use nix::unistd::{getpgid, Pid};
use tokio::process::{Child, Command};

/// Wraps a spawned [`Command`] so that its entire process group can be torn
/// down with a single call, and so that a `Drop` without an explicit kill
/// still tears the group down.
pub struct ManagedChild {
  child: Child,
  killed: Arc<AtomicBool>,
}

impl ManagedChild {
  /// Spawn `command` as the leader of a new process group.
  pub fn spawn(mut command: Command) -> std::io::Result<ManagedChild> {
    // Encourage tokio to reap the child via its own drop-time mechanism.
    command.kill_on_drop(true);

    // SAFETY: `setsid` is async-signal-safe and is the only thing done
    // between fork and exec here.
    unsafe {
      command.pre_exec(|| {
        nix::unistd::setsid()
          .map(|_pgid| ())
          .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
      });
    }

    let child = command.spawn()?;
    Ok(ManagedChild {
      child,
      killed: Arc::new(AtomicBool::new(false)),
    })
  }

  fn pgid(&self) -> Result<Pid, String> {
    let pid = self
      .child
      .id()
      .ok_or_else(|| "child process had no pid".to_string())?;
    getpgid(Some(Pid::from_raw(pid as i32)))
      .map_err(|e| format!("could not get process group id of child: {e}"))
  }

  /// Send `SIGKILL` to the child's entire process group. Idempotent:
  /// killing an already-dead group is not an error.
  pub fn kill_process_group(&self) {
    ProcessGroupKiller {
      pgid: self.pgid().ok(),
      killed: Arc::clone(&self.killed),
    }
    .kill();
  }

  /// A cheap, `Clone`-able handle that can kill this child's process group
  /// without holding any borrow of the `ManagedChild` itself. Resolve this
  /// once, before concurrently draining stdout/stderr and awaiting `wait()`:
  /// `wait()` needs the sole `&mut` on the child, so the drain futures must
  /// kill through a handle that does not alias it.
  pub fn killer(&self) -> ProcessGroupKiller {
    ProcessGroupKiller {
      pgid: self.pgid().ok(),
      killed: Arc::clone(&self.killed),
    }
  }
}

/// An owned, shareable handle that kills one child's process group. Carries
/// its own resolved `pgid` (captured at construction time, not re-read from
/// the child) and a flag shared with the owning `ManagedChild` so a kill
/// through either one is idempotent with respect to the other.
#[derive(Clone)]
pub struct ProcessGroupKiller {
  pgid: Option<Pid>,
  killed: Arc<AtomicBool>,
}

impl ProcessGroupKiller {
  /// Send `SIGKILL` to the process group. Idempotent: killing an already-dead
  /// group, or calling this more than once, is not an error.
  pub fn kill(&self) {
    if self.killed.swap(true, Ordering::SeqCst) {
      return;
    }
    match self.pgid {
      Some(pgid) => {
        // Negative pid targets the whole process group.
        if let Err(e) = signal::kill(Pid::from_raw(-pgid.as_raw()), signal::Signal::SIGKILL) {
          if e != nix::errno::Errno::ESRCH {
            log::warn!("Failed to kill process group {pgid}: {e}");
          }
        }
      }
      None => log::warn!("Could not resolve process group to kill"),
    }
  }
}

impl Deref for ManagedChild {
  type Target = Child;

  fn deref(&self) -> &Child {
    &self.child
  }
}

impl DerefMut for ManagedChild {
  fn deref_mut(&mut self) -> &mut Child {
    &mut self.child
  }
}

impl Drop for ManagedChild {
  fn drop(&mut self) {
    self.kill_process_group();
  }
}
