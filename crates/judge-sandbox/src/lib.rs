// Copyright 2026 Judge contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! The Sandbox Invoker: spawns one constrained subprocess, drains its
//! stdout/stderr under a byte cap, enforces a wall-clock timeout, and
//! guarantees the entire process group is torn down on every exit path.
//!
//! Grounded in the teacher's `process_execution::local` (`CapturedWorkdir`,
//! `collect_child_outputs`, the `timeout(...)` wrap around the exit-code
//! future) and `process_execution::children` (`ManagedChild`).

mod managed_child;

use std::collections::BTreeMap;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

pub use managed_child::{ManagedChild, ProcessGroupKiller};

const DRAIN_CHUNK_SIZE: usize = 8192;
const PISTON_ALIAS_ENV: &str = "PISTON_ALIAS";

#[derive(Debug, Error)]
pub enum SandboxError {
  #[error("failed to spawn sandboxed process: {0}")]
  Spawn(String),
}

/// Resource limits and switches applied to every sandboxed invocation.
#[derive(Clone, Debug)]
pub struct SandboxLimits {
  pub max_process_count: u32,
  pub max_open_files: u32,
  pub output_max_size: usize,
  pub disable_networking: bool,
}

/// The outcome of one `safe_call` invocation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunResult {
  pub stdout: Bytes,
  pub stderr: Bytes,
  pub exit_code: Option<i32>,
  pub signal: Option<String>,
  pub stdin: Bytes,
}

impl RunResult {
  pub fn was_killed(&self, name: &str) -> bool {
    self.signal.as_deref() == Some(name)
  }
}

/// Spawn `bash <exe_path> <argv...>` under `prlimit` (and optionally
/// `nosocket`), as the job's allocated `(uid, gid)`, feed it `stdin_bytes`,
/// and collect its output under the documented caps.
#[allow(clippy::too_many_arguments)]
pub async fn safe_call(
  exe_path: &Path,
  argv: &[String],
  timeout: Duration,
  stdin_bytes: &[u8],
  env: &BTreeMap<String, String>,
  cwd: &Path,
  uid: u32,
  gid: u32,
  alias: &str,
  limits: &SandboxLimits,
) -> Result<RunResult, SandboxError> {
  let mut command = Command::new("prlimit");
  command.arg(format!("--nproc={}", limits.max_process_count));
  command.arg(format!("--nofile={}", limits.max_open_files));
  if limits.disable_networking {
    command.arg("nosocket");
  }
  command.arg("bash");
  command.arg(exe_path);
  command.args(argv);

  command
    .current_dir(cwd)
    .uid(uid)
    .gid(gid)
    .env_clear()
    .envs(env)
    .env(PISTON_ALIAS_ENV, alias)
    .stdin(Stdio::piped())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped());

  let mut child = ManagedChild::spawn(command)
    .map_err(|e| SandboxError::Spawn(format!("{e}")))?;

  if let Some(mut stdin) = child.stdin.take() {
    // A child that never reads stdin (e.g. it exits immediately) yields
    // a broken pipe here; that is expected, not a spawn failure.
    let _ = stdin.write_all(stdin_bytes).await;
    drop(stdin);
  }

  let mut stdout_pipe = child.stdout.take().expect("stdout was piped");
  let mut stderr_pipe = child.stderr.take().expect("stderr was piped");
  let mut stdout_buf = BytesMut::with_capacity(8192);
  let mut stderr_buf = BytesMut::with_capacity(8192);

  // Resolve a kill handle up front: it holds its own `pgid` and a shared
  // `killed` flag, so the drains below can kill the process group without
  // borrowing `child`, leaving `child.wait()` free to take the sole `&mut`.
  let killer = child.killer();

  let wait_result = {
    let drain_and_wait = async {
      let (_, _, wait_result) = tokio::join!(
        drain_capped(&mut stdout_pipe, &mut stdout_buf, limits.output_max_size, killer.clone()),
        drain_capped(&mut stderr_pipe, &mut stderr_buf, limits.output_max_size, killer.clone()),
        child.wait(),
      );
      wait_result
    };

    match tokio::time::timeout(timeout, drain_and_wait).await {
      Ok(wait_result) => wait_result,
      Err(_elapsed) => {
        child.kill_process_group();
        child.wait().await
      }
    }
  };

  // Teardown is guaranteed on every exit path, including normal exit:
  // killing an already-dead group is a no-op.
  child.kill_process_group();

  let (exit_code, signal) = match wait_result {
    Ok(status) => match status.code() {
      Some(code) => (Some(code), None),
      None => (None, status.signal().map(signal_name)),
    },
    Err(e) => {
      log::warn!("Error waiting on sandboxed child: {e}");
      (None, None)
    }
  };

  Ok(RunResult {
    stdout: stdout_buf.freeze(),
    stderr: stderr_buf.freeze(),
    exit_code,
    signal,
    stdin: Bytes::copy_from_slice(stdin_bytes),
  })
}

/// Drain `reader` into `buf` until EOF, `cap` is reached, or the process is
/// killed out from under us. `buf` is owned by the caller so that bytes
/// accumulated before a timeout cancels this future are not lost.
async fn drain_capped(
  mut reader: impl AsyncRead + Unpin,
  buf: &mut BytesMut,
  cap: usize,
  killer: ProcessGroupKiller,
) {
  let mut chunk = [0u8; DRAIN_CHUNK_SIZE];
  loop {
    let n = match reader.read(&mut chunk).await {
      Ok(0) => return,
      Ok(n) => n,
      Err(_) => return,
    };

    let remaining = cap.saturating_sub(buf.len());
    if remaining == 0 {
      killer.kill();
      return;
    }
    let take = n.min(remaining);
    buf.extend_from_slice(&chunk[..take]);
    if take < n {
      killer.kill();
      return;
    }
  }
}

fn signal_name(raw: i32) -> String {
  nix::sys::signal::Signal::try_from(raw)
    .map(|s| s.as_str().to_string())
    .unwrap_or_else(|_| format!("SIG{raw}"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;

  fn default_limits() -> SandboxLimits {
    SandboxLimits {
      max_process_count: 32,
      max_open_files: 256,
      output_max_size: 1024,
      disable_networking: false,
    }
  }

  fn write_script(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
  }

  fn current_identity() -> (u32, u32) {
    (nix::unistd::getuid().as_raw(), nix::unistd::getgid().as_raw())
  }

  #[tokio::test]
  async fn echoes_stdin_to_stdout() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(tmp.path(), "cat.sh", "#!/usr/bin/env bash\ncat\n");
    let (uid, gid) = current_identity();

    let result = safe_call(
      &script,
      &[],
      Duration::from_secs(5),
      b"hello sandbox",
      &BTreeMap::new(),
      tmp.path(),
      uid,
      gid,
      "test-alias",
      &default_limits(),
    )
    .await
    .unwrap();

    assert_eq!(&result.stdout[..], b"hello sandbox");
    assert_eq!(result.exit_code, Some(0));
    assert_eq!(result.signal, None);
  }

  #[tokio::test]
  async fn kills_on_timeout() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(
      tmp.path(),
      "spin.sh",
      "#!/usr/bin/env bash\nsleep 5\n",
    );
    let (uid, gid) = current_identity();

    let result = safe_call(
      &script,
      &[],
      Duration::from_millis(100),
      b"",
      &BTreeMap::new(),
      tmp.path(),
      uid,
      gid,
      "test-alias",
      &default_limits(),
    )
    .await
    .unwrap();

    assert_eq!(result.signal.as_deref(), Some("SIGKILL"));
  }

  #[tokio::test]
  async fn truncates_output_at_cap_and_kills() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(
      tmp.path(),
      "flood.sh",
      "#!/usr/bin/env bash\nwhile true; do echo aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa; done\n",
    );
    let (uid, gid) = current_identity();
    let mut limits = default_limits();
    limits.output_max_size = 64;

    let result = safe_call(
      &script,
      &[],
      Duration::from_secs(5),
      b"",
      &BTreeMap::new(),
      tmp.path(),
      uid,
      gid,
      "test-alias",
      &limits,
    )
    .await
    .unwrap();

    assert!(result.stdout.len() <= limits.output_max_size);
    assert_eq!(result.signal.as_deref(), Some("SIGKILL"));
  }

  #[tokio::test]
  async fn passes_alias_through_environment() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(
      tmp.path(),
      "alias.sh",
      "#!/usr/bin/env bash\necho -n \"$PISTON_ALIAS\"\n",
    );
    let (uid, gid) = current_identity();

    let result = safe_call(
      &script,
      &[],
      Duration::from_secs(5),
      b"",
      &BTreeMap::new(),
      tmp.path(),
      uid,
      gid,
      "python3",
      &default_limits(),
    )
    .await
    .unwrap();

    assert_eq!(&result.stdout[..], b"python3");
  }
}