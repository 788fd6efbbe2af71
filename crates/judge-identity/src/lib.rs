// Copyright 2026 Judge contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! The Identity Pool: a non-blocking, non-reclaiming rotation of `(uid, gid)`
//! pairs used to run sandboxed children under distinct (but not necessarily
//! unique) system identities.
//!
//! The pool deliberately does not track liveness. Two concurrent jobs may be
//! handed identical `(uid, gid)` pairs once concurrency exceeds the size of
//! the configured range; correctness does not depend on uniqueness here,
//! only on workspaces being disjoint (by UUID) and process-group kills being
//! keyed by pid rather than uid. See spec.md §9.

use std::sync::atomic::{AtomicU32, Ordering};

/// A `(uid, gid)` pair handed out to a sandboxed child.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Identity {
  pub uid: u32,
  pub gid: u32,
}

/// Configuration for an `IdentityPool`'s contiguous ranges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdentityRange {
  pub uid_min: u32,
  pub uid_max: u32,
  pub gid_min: u32,
  pub gid_max: u32,
}

/// Rotates monotonically through a contiguous `[uid_min, uid_max]` x
/// `[gid_min, gid_max]` range. `allocate` never blocks and never fails.
pub struct IdentityPool {
  range: IdentityRange,
  uid_counter: AtomicU32,
  gid_counter: AtomicU32,
}

impl IdentityPool {
  pub fn new(range: IdentityRange) -> IdentityPool {
    assert!(
      range.uid_max >= range.uid_min,
      "uid_max must be >= uid_min"
    );
    assert!(
      range.gid_max >= range.gid_min,
      "gid_max must be >= gid_min"
    );
    IdentityPool {
      range,
      uid_counter: AtomicU32::new(0),
      gid_counter: AtomicU32::new(0),
    }
  }

  /// Hand out the next `(uid, gid)` pair, then advance both counters modulo
  /// the size of their respective ranges.
  pub fn allocate(&self) -> Identity {
    let uid_span = self.range.uid_max - self.range.uid_min + 1;
    let gid_span = self.range.gid_max - self.range.gid_min + 1;

    let uid_offset = self.uid_counter.fetch_update(
      Ordering::SeqCst,
      Ordering::SeqCst,
      |c| Some((c + 1) % uid_span),
    );
    let gid_offset = self.gid_counter.fetch_update(
      Ordering::SeqCst,
      Ordering::SeqCst,
      |c| Some((c + 1) % gid_span),
    );

    // fetch_update with an always-Some closure never returns Err.
    let uid_offset = uid_offset.unwrap();
    let gid_offset = gid_offset.unwrap();

    Identity {
      uid: self.range.uid_min + uid_offset,
      gid: self.range.gid_min + gid_offset,
    }
  }
}
