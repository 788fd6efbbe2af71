// Copyright 2026 Judge contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! The Job lifecycle engine: resolves a submission against the Runtime
//! Registry, allocates an identity, primes a workspace, drives the Sandbox
//! Invoker through compile-then-run, adjudicates the result, and always
//! cleans up.

mod error;
mod facade;
mod job;
mod spec;
mod verdict;

pub use error::ErrorKind;
pub use facade::submit;
pub use job::{ExecuteOutcome, Job};
pub use spec::{FileSpec, JobRequest, JobSpec, Timeouts};
pub use verdict::{adjudicate, JobResult, Verdict, VerdictStatus};
