// Copyright 2026 Judge contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! Wire and domain types for an inbound submission, and the validation that
//! must pass before a `Job` is constructed.
//!
//! Field names mirror the external contract (language/version/files/main/
//! alias/args/stdin/expected_output/timeouts); `content` is carried as a
//! UTF-8 string rather than raw bytes since every supported runtime reads
//! its sources as text (see DESIGN.md).

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use judge_runtime::Runtime;

/// One file to materialise in the job workspace.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileSpec {
  pub name: String,
  pub content: String,
}

/// Per-phase wall-clock budgets, in milliseconds.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Timeouts {
  pub compile_ms: u64,
  pub run_ms: u64,
}

/// The as-received submission: language/version identify the runtime to
/// resolve from the registry; everything else maps straight onto `JobSpec`.
#[derive(Clone, Debug, Deserialize)]
pub struct JobRequest {
  pub language: String,
  pub version: String,
  pub files: Vec<FileSpec>,
  pub main: String,
  pub alias: String,
  #[serde(default)]
  pub args: Vec<String>,
  #[serde(default)]
  pub stdin: Vec<String>,
  #[serde(default)]
  pub expected_output: Option<Vec<String>>,
  pub timeouts: Timeouts,
}

/// A validated, resolved submission ready to drive a `Job`.
#[derive(Clone, Debug)]
pub struct JobSpec {
  pub runtime: Runtime,
  pub files: Vec<FileSpec>,
  pub args: Vec<String>,
  pub stdin: Vec<String>,
  pub expected_output: Option<Vec<String>>,
  pub timeouts: Timeouts,
  pub main: String,
  pub alias: String,
}

impl JobSpec {
  /// Validate the invariants from spec.md §3: at least one file, `main`
  /// present among the files, every file name confined to the workspace,
  /// and `stdin`/`expected_output` length parity when the latter is given.
  pub fn validate(&self) -> Result<(), ErrorKind> {
    if self.files.is_empty() {
      return Err(ErrorKind::InvalidSpec("files must not be empty".into()));
    }
    if !self.files.iter().any(|f| f.name == self.main) {
      return Err(ErrorKind::InvalidSpec(format!(
        "main `{}` is not among the submitted files",
        self.main
      )));
    }
    for file in &self.files {
      if !is_safe_relative_path(&file.name) {
        return Err(ErrorKind::InvalidSpec(format!(
          "file name `{}` escapes the workspace",
          file.name
        )));
      }
    }
    if let Some(expected) = &self.expected_output {
      if expected.len() != self.stdin.len() {
        return Err(ErrorKind::InvalidSpec(format!(
          "expected_output has {} entries but stdin has {}",
          expected.len(),
          self.stdin.len()
        )));
      }
    }
    Ok(())
  }
}

fn is_safe_relative_path(name: &str) -> bool {
  if name.is_empty() {
    return false;
  }
  let path = std::path::Path::new(name);
  if path.is_absolute() {
    return false;
  }
  !path
    .components()
    .any(|c| matches!(c, std::path::Component::ParentDir))
}
