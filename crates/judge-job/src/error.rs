// Copyright 2026 Judge contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! The error taxonomy shared by `Job` and the Facade.
//!
//! Grounded in the teacher's per-subsystem `ProcessError`-style enums
//! (`process_execution::local`, `process_execution::children`): a small,
//! `thiserror`-derived sum type rather than a single opaque `anyhow::Error`,
//! so callers can match on the kind without string-sniffing.

use thiserror::Error;

/// Structural failure kinds. Child-process faults (non-empty stderr,
/// SIGKILL, non-zero exit) are never represented here; those are
/// adjudicated into verdicts, not errors.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ErrorKind {
  #[error("invalid job spec: {0}")]
  InvalidSpec(String),

  #[error("invalid job state: {0}")]
  InvalidState(String),

  #[error("failed to spawn sandboxed process: {0}")]
  Spawn(String),

  #[error("filesystem error: {0}")]
  Filesystem(String),
}

pub type JudgeError = ErrorKind;