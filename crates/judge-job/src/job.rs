// Copyright 2026 Judge contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! The Job lifecycle: `Ready -> Primed -> Executed`, with `cleanup` legal
//! from any state. Owns the workspace on disk and drives the Sandbox
//! Invoker for the compile phase and every test-case run.
//!
//! Grounded in the teacher's `CapturedWorkdir`/`run_and_capture_workdir`
//! pairing in `process_execution::local`: a directory materialised before
//! the child runs, the child invoked against it, and the directory's
//! contents read back or torn down afterwards.

use std::os::unix::fs::{chown, PermissionsExt};
use std::path::PathBuf;

use judge_identity::Identity;
use judge_sandbox::{safe_call, RunResult, SandboxError, SandboxLimits};
use uuid::Uuid;

use crate::error::ErrorKind;
use crate::spec::JobSpec;

const WORKSPACE_MODE: u32 = 0o700;
const JAVA: &str = "java";
const JAVA_SUFFIX_LEN: usize = 5; // ".java"

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum JobState {
  Ready,
  Primed,
  Executed,
}

/// The outcome of `Job::execute`: either the compile phase short-circuited
/// the job, or every run was dispatched and completed.
#[derive(Debug)]
pub enum ExecuteOutcome {
  CompilationFailed(RunResult),
  Completed {
    compile: Option<RunResult>,
    run: Vec<RunResult>,
  },
}

/// One in-flight submission: a fresh UUID, an allocated identity, a
/// workspace path, and a state machine guarding `prime`/`execute`/`cleanup`.
pub struct Job {
  pub id: Uuid,
  identity: Identity,
  workspace: PathBuf,
  state: JobState,
  spec: JobSpec,
}

impl Job {
  pub fn new(spec: JobSpec, identity: Identity, data_dir: &std::path::Path) -> Job {
    let id = Uuid::new_v4();
    let workspace = data_dir.join("jobs").join(id.to_string());
    Job {
      id,
      identity,
      workspace,
      state: JobState::Ready,
      spec,
    }
  }

  pub fn workspace(&self) -> &std::path::Path {
    &self.workspace
  }

  pub fn stdin(&self) -> &[String] {
    &self.spec.stdin
  }

  pub fn expected_output(&self) -> Option<&[String]> {
    self.spec.expected_output.as_deref()
  }

  /// Materialise the workspace directory and every submitted file, owned
  /// by the job's allocated `(uid, gid)`. Illegal from any state but
  /// `Ready`.
  pub async fn prime(&mut self) -> Result<(), ErrorKind> {
    if self.state != JobState::Ready {
      return Err(ErrorKind::InvalidState(
        "prime is only legal from the Ready state".into(),
      ));
    }

    std::fs::create_dir_all(&self.workspace)
      .map_err(|e| ErrorKind::Filesystem(format!("creating workspace: {e}")))?;
    std::fs::set_permissions(
      &self.workspace,
      std::fs::Permissions::from_mode(WORKSPACE_MODE),
    )
    .map_err(|e| ErrorKind::Filesystem(format!("setting workspace mode: {e}")))?;
    chown(
      &self.workspace,
      Some(self.identity.uid),
      Some(self.identity.gid),
    )
    .map_err(|e| ErrorKind::Filesystem(format!("chowning workspace: {e}")))?;

    for file in &self.spec.files {
      let path = self.workspace.join(&file.name);
      if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
          .map_err(|e| ErrorKind::Filesystem(format!("creating parent dir: {e}")))?;
      }
      std::fs::write(&path, &file.content)
        .map_err(|e| ErrorKind::Filesystem(format!("writing {}: {e}", file.name)))?;
      chown(&path, Some(self.identity.uid), Some(self.identity.gid))
        .map_err(|e| ErrorKind::Filesystem(format!("chowning {}: {e}", file.name)))?;
    }

    self.state = JobState::Primed;
    Ok(())
  }

  /// Run the compile phase (if applicable) then every test case, serial
  /// for Java and in parallel otherwise. Illegal from any state but
  /// `Primed`.
  pub async fn execute(&mut self, limits: &SandboxLimits) -> Result<ExecuteOutcome, ErrorKind> {
    if self.state != JobState::Primed {
      return Err(ErrorKind::InvalidState(
        "execute is only legal from the Primed state".into(),
      ));
    }

    let runtime = &self.spec.runtime;

    let compile = if runtime.compiled {
      let argv: Vec<String> = self.spec.files.iter().map(|f| f.name.clone()).collect();
      let result = safe_call(
        &runtime.compile_path(),
        &argv,
        std::time::Duration::from_millis(self.spec.timeouts.compile_ms),
        &[],
        &runtime.env_vars,
        &self.workspace,
        self.identity.uid,
        self.identity.gid,
        &self.spec.alias,
        limits,
      )
      .await
      .map_err(spawn_error)?;

      if !result.stderr.is_empty() || result.was_killed("SIGKILL") {
        self.state = JobState::Executed;
        return Ok(ExecuteOutcome::CompilationFailed(result));
      }
      Some(result)
    } else {
      None
    };

    let entry = if runtime.language == JAVA && runtime.compiled {
      trim_java_suffix(&self.spec.main)
    } else {
      self.spec.main.clone()
    };

    let run = if runtime.language == JAVA {
      let mut results = Vec::with_capacity(self.spec.stdin.len());
      for stdin in &self.spec.stdin {
        results.push(self.run_one(&entry, stdin, limits).await?);
      }
      results
    } else {
      let futures = self
        .spec
        .stdin
        .iter()
        .map(|stdin| self.run_one(&entry, stdin, limits));
      futures::future::join_all(futures)
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?
    };

    self.state = JobState::Executed;
    Ok(ExecuteOutcome::Completed { compile, run })
  }

  async fn run_one(
    &self,
    entry: &str,
    stdin: &str,
    limits: &SandboxLimits,
  ) -> Result<RunResult, ErrorKind> {
    let runtime = &self.spec.runtime;
    let mut argv = vec![entry.to_string()];
    argv.extend(self.spec.args.iter().cloned());

    safe_call(
      &runtime.run_path(),
      &argv,
      std::time::Duration::from_millis(self.spec.timeouts.run_ms),
      stdin.as_bytes(),
      &runtime.env_vars,
      &self.workspace,
      self.identity.uid,
      self.identity.gid,
      &self.spec.alias,
      limits,
    )
    .await
    .map_err(spawn_error)
  }

  /// Remove the workspace recursively. Idempotent and legal from any
  /// state; a missing workspace is not an error.
  pub async fn cleanup(&mut self) -> Result<(), ErrorKind> {
    match std::fs::remove_dir_all(&self.workspace) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(ErrorKind::Filesystem(format!(
        "removing workspace {}: {e}",
        self.workspace.display()
      ))),
    }
  }
}

fn spawn_error(e: SandboxError) -> ErrorKind {
  ErrorKind::Spawn(e.to_string())
}

/// Strip a trailing `.java` (five characters). Per spec.md §9 this assumes
/// the entry file really does end in `.java`; `main` is already validated
/// to exist among the submitted files, but its extension is not enforced,
/// so a non-`.java` entry file is truncated incorrectly here, as documented.
fn trim_java_suffix(main: &str) -> String {
  if main.len() > JAVA_SUFFIX_LEN {
    main[..main.len() - JAVA_SUFFIX_LEN].to_string()
  } else {
    main.to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn trims_java_extension() {
    assert_eq!(trim_java_suffix("Main.java"), "Main");
  }

  #[test]
  fn leaves_short_names_unchanged_rather_than_panicking() {
    assert_eq!(trim_java_suffix("ab"), "ab");
  }
}