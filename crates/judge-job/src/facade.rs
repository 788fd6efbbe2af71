// Copyright 2026 Judge contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! The Job Facade: the one inbound operation external callers use,
//! `submit(request) -> JobResult`. Never propagates a structural error to
//! its caller; every `ErrorKind` is folded into an `ERROR` verdict.
//!
//! Grounded in the teacher's `process_executor` binary, which drives
//! `process_execution`'s `CommandRunner` end-to-end (resolve request,
//! run, report) without exposing its internal error plumbing to the
//! command line beyond a final printed result.

use judge_identity::IdentityPool;
use judge_runtime::RuntimeRegistry;
use judge_sandbox::SandboxLimits;

use crate::error::ErrorKind;
use crate::job::{ExecuteOutcome, Job};
use crate::spec::{JobRequest, JobSpec};
use crate::verdict::{adjudicate, JobResult, Verdict};

/// Resolve, validate, run, and adjudicate one submission. `cleanup` always
/// runs, even when an earlier phase failed.
pub async fn submit(
  registry: &RuntimeRegistry,
  identity_pool: &IdentityPool,
  data_dir: &std::path::Path,
  limits: &SandboxLimits,
  request: JobRequest,
) -> JobResult {
  let resolved = resolve(registry, request).and_then(|spec| {
    spec.validate()?;
    Ok(spec)
  });

  let spec = match resolved {
    Ok(spec) => spec,
    Err(e) => return error_result(e),
  };

  let identity = identity_pool.allocate();
  let mut job = Job::new(spec, identity, data_dir);

  let result = run_job(&mut job, limits).await;

  if let Err(e) = job.cleanup().await {
    log::warn!("cleanup failed for job {}: {e}", job.id);
  }

  result
}

async fn run_job(job: &mut Job, limits: &SandboxLimits) -> JobResult {
  if let Err(e) = job.prime().await {
    return error_result(e);
  }

  match job.execute(limits).await {
    Ok(ExecuteOutcome::CompilationFailed(compile)) => {
      let verdict = Verdict::compilation(&compile.stderr);
      JobResult {
        compile: Some(compile),
        run: Vec::new(),
        verdict,
      }
    }
    Ok(ExecuteOutcome::Completed { compile, run }) => {
      let verdict = adjudicate(compile.as_ref(), &run, job.stdin(), job.expected_output());
      JobResult {
        compile,
        run,
        verdict,
      }
    }
    Err(e) => error_result(e),
  }
}

fn resolve(registry: &RuntimeRegistry, request: JobRequest) -> Result<JobSpec, ErrorKind> {
  let runtime = registry
    .find(&request.language, &request.version)
    .cloned()
    .ok_or_else(|| {
      ErrorKind::InvalidSpec(format!(
        "no installed runtime for {} {}",
        request.language, request.version
      ))
    })?;

  Ok(JobSpec {
    runtime,
    files: request.files,
    args: request.args,
    stdin: request.stdin,
    expected_output: request.expected_output,
    timeouts: request.timeouts,
    main: request.main,
    alias: request.alias,
  })
}

fn error_result(e: ErrorKind) -> JobResult {
  JobResult {
    compile: None,
    run: Vec::new(),
    verdict: Verdict::error(e.to_string()),
  }
}