// Copyright 2026 Judge contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! The Verdict Adjudicator: a pure function folding N run results (plus an
//! optional compile result) into one verdict, by the documented priority.
//!
//! Grounded in the teacher's habit of keeping comparison/decision logic free
//! of process-spawning side effects (e.g. the output-snapshot construction
//! in `process_execution::local` is a plain data transform over an already
//! completed `FallibleProcessResultWithPlatform`); here the entire function
//! is `&[RunResult]` in, `Verdict` out, with no `self` and no I/O.

use judge_sandbox::RunResult;
use serde::{Deserialize, Serialize};

const SIGKILL: &str = "SIGKILL";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerdictStatus {
  Ac,
  Wa,
  Compilation,
  Runtime,
  Tle,
  Mle,
  Pending,
  Error,
}

/// The judge's structured answer. `Mle` and `Pending` are reserved slots:
/// nothing in this crate constructs them.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Verdict {
  pub status: VerdictStatus,
  pub stdout: Option<String>,
  pub stdin: Option<String>,
  pub expected_output: Option<String>,
}

impl Verdict {
  pub fn error(message: impl Into<String>) -> Verdict {
    Verdict {
      status: VerdictStatus::Error,
      stdout: Some(message.into()),
      stdin: None,
      expected_output: None,
    }
  }

  pub fn compilation(stderr: &[u8]) -> Verdict {
    let message = if stderr.is_empty() {
      "compilation failed".to_string()
    } else {
      String::from_utf8_lossy(stderr).into_owned()
    };
    Verdict {
      status: VerdictStatus::Compilation,
      stdout: Some(message),
      stdin: None,
      expected_output: None,
    }
  }
}

/// The full response envelope: the optional compile artefact, every run
/// artefact, and the folded verdict.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobResult {
  pub compile: Option<RunResult>,
  pub run: Vec<RunResult>,
  pub verdict: Verdict,
}

/// Fold `run` (already past any compile short-circuit) into a single
/// verdict. `compile` is accepted for signature parity with the documented
/// contract but does not affect the decision: a failed compile never
/// reaches this function, since `Job::execute` short-circuits before
/// dispatching any runs.
pub fn adjudicate(
  _compile: Option<&RunResult>,
  run: &[RunResult],
  stdin: &[String],
  expected_output: Option<&[String]>,
) -> Verdict {
  for (i, result) in run.iter().enumerate() {
    if !result.stderr.is_empty() {
      return Verdict {
        status: VerdictStatus::Runtime,
        stdout: Some(String::from_utf8_lossy(&result.stderr).into_owned()),
        stdin: stdin.get(i).cloned(),
        expected_output: expected_output.and_then(|e| e.get(i)).cloned(),
      };
    }
    if result.was_killed(SIGKILL) {
      return Verdict {
        status: VerdictStatus::Tle,
        stdout: Some(String::from_utf8_lossy(&result.stdout).into_owned()),
        stdin: stdin.get(i).cloned(),
        expected_output: expected_output.and_then(|e| e.get(i)).cloned(),
      };
    }
    if let Some(expected) = expected_output.and_then(|e| e.get(i)) {
      let actual_trimmed = String::from_utf8_lossy(&result.stdout).trim().to_string();
      let expected_trimmed = expected.trim().to_string();
      if actual_trimmed != expected_trimmed {
        return Verdict {
          status: VerdictStatus::Wa,
          stdout: Some(actual_trimmed),
          stdin: stdin.get(i).cloned(),
          expected_output: Some(expected_trimmed),
        };
      }
    }
  }

  let (stdout, first_stdin) = match run.first() {
    Some(first) => (
      Some(String::from_utf8_lossy(&first.stdout).into_owned()),
      stdin.first().cloned(),
    ),
    None => (None, None),
  };

  Verdict {
    status: VerdictStatus::Ac,
    stdout,
    stdin: first_stdin,
    expected_output: None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use bytes::Bytes;

  fn ok_result(stdout: &str) -> RunResult {
    RunResult {
      stdout: Bytes::copy_from_slice(stdout.as_bytes()),
      stderr: Bytes::new(),
      exit_code: Some(0),
      signal: None,
      stdin: Bytes::new(),
    }
  }

  fn stderr_result(stderr: &str) -> RunResult {
    RunResult {
      stdout: Bytes::new(),
      stderr: Bytes::copy_from_slice(stderr.as_bytes()),
      exit_code: Some(0),
      signal: None,
      stdin: Bytes::new(),
    }
  }

  fn killed_result() -> RunResult {
    RunResult {
      stdout: Bytes::from_static(b"partial"),
      stderr: Bytes::new(),
      exit_code: None,
      signal: Some("SIGKILL".to_string()),
      stdin: Bytes::new(),
    }
  }

  #[test]
  fn empty_run_list_is_ac_with_nulls() {
    let verdict = adjudicate(None, &[], &[], None);
    assert_eq!(verdict.status, VerdictStatus::Ac);
    assert_eq!(verdict.stdout, None);
    assert_eq!(verdict.stdin, None);
  }

  #[test]
  fn matching_output_is_ac() {
    let run = vec![ok_result("hi\n")];
    let expected = vec!["hi".to_string()];
    let stdin = vec!["hi".to_string()];
    let verdict = adjudicate(None, &run, &stdin, Some(&expected));
    assert_eq!(verdict.status, VerdictStatus::Ac);
  }

  #[test]
  fn mismatched_output_is_wa_with_trimmed_values() {
    let run = vec![ok_result("hi\n")];
    let expected = vec!["ho".to_string()];
    let stdin = vec!["hi".to_string()];
    let verdict = adjudicate(None, &run, &stdin, Some(&expected));
    assert_eq!(verdict.status, VerdictStatus::Wa);
    assert_eq!(verdict.stdout, Some("hi".to_string()));
    assert_eq!(verdict.expected_output, Some("ho".to_string()));
  }

  #[test]
  fn no_expected_output_never_produces_wa() {
    let run = vec![ok_result("anything")];
    let stdin = vec!["x".to_string()];
    let verdict = adjudicate(None, &run, &stdin, None);
    assert_eq!(verdict.status, VerdictStatus::Ac);
  }

  #[test]
  fn stderr_wins_over_timeout_and_wa() {
    let run = vec![stderr_result("boom")];
    let expected = vec!["anything".to_string()];
    let stdin = vec!["x".to_string()];
    let verdict = adjudicate(None, &run, &stdin, Some(&expected));
    assert_eq!(verdict.status, VerdictStatus::Runtime);
    assert_eq!(verdict.stdout, Some("boom".to_string()));
  }

  #[test]
  fn timeout_wins_over_wa() {
    let run = vec![killed_result()];
    let expected = vec!["anything".to_string()];
    let stdin = vec!["x".to_string()];
    let verdict = adjudicate(None, &run, &stdin, Some(&expected));
    assert_eq!(verdict.status, VerdictStatus::Tle);
  }

  #[test]
  fn first_failing_index_wins() {
    let run = vec![ok_result("hi"), stderr_result("boom")];
    let expected = vec!["hi".to_string(), "anything".to_string()];
    let stdin = vec!["a".to_string(), "b".to_string()];
    let verdict = adjudicate(None, &run, &stdin, Some(&expected));
    assert_eq!(verdict.status, VerdictStatus::Runtime);
    assert_eq!(verdict.stdin, Some("b".to_string()));
  }

  #[test]
  fn second_case_failure_is_reported_at_its_index() {
    let run = vec![ok_result("hi"), ok_result("wrong")];
    let expected = vec!["hi".to_string(), "right".to_string()];
    let stdin = vec!["a".to_string(), "b".to_string()];
    let verdict = adjudicate(None, &run, &stdin, Some(&expected));
    assert_eq!(verdict.status, VerdictStatus::Wa);
    assert_eq!(verdict.stdin, Some("b".to_string()));
  }
}