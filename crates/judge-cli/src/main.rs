// Copyright 2026 Judge contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! A debugging entry point that drives the Job Facade directly, without the
//! (external, out of scope) HTTP layer. Modeled on the teacher's own
//! `process_executor` binary, which exists to exercise `process_execution`
//! from the command line rather than through the full build graph.

use std::path::PathBuf;
use std::process::exit;

use clap::Parser;
use log::LevelFilter;

use judge_config::Config;
use judge_identity::{IdentityPool, IdentityRange};
use judge_job::{submit, JobRequest};
use judge_runtime::RuntimeRegistry;
use judge_sandbox::SandboxLimits;

#[derive(Parser)]
#[command(name = "judge-cli")]
struct Opt {
  /// Path to a JSON-encoded JobRequest. Reads stdin when omitted.
  #[arg(long)]
  job: Option<PathBuf>,

  /// Path to a TOML config file. Falls back to `Config::default()`.
  #[arg(long)]
  config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
  let opt = Opt::parse();

  let config = match &opt.config {
    Some(path) => match Config::parse(path) {
      Ok(config) => config,
      Err(e) => {
        eprintln!("failed to load config: {e}");
        exit(1);
      }
    },
    None => Config::default(),
  };

  // `RUST_LOG`, if set, still wins: it's the more specific override.
  env_logger::Builder::new()
    .filter_level(level_filter(&config.log_level))
    .parse_default_env()
    .init();

  let request_json = match read_request_json(opt.job.as_deref()) {
    Ok(contents) => contents,
    Err(e) => {
      eprintln!("failed to read job request: {e}");
      exit(1);
    }
  };

  let request: JobRequest = match serde_json::from_str(&request_json) {
    Ok(request) => request,
    Err(e) => {
      eprintln!("failed to parse job request: {e}");
      exit(1);
    }
  };

  let registry = RuntimeRegistry::discover(&config.data_directory);
  let identity_pool = IdentityPool::new(IdentityRange {
    uid_min: config.runner_uid_min,
    uid_max: config.runner_uid_max,
    gid_min: config.runner_gid_min,
    gid_max: config.runner_gid_max,
  });
  let limits = SandboxLimits {
    max_process_count: config.max_process_count,
    max_open_files: config.max_open_files,
    output_max_size: config.output_max_size,
    disable_networking: config.disable_networking,
  };

  let result = submit(
    &registry,
    &identity_pool,
    &config.data_directory,
    &limits,
    request,
  )
  .await;

  let status = result.verdict.status;
  match serde_json::to_string_pretty(&result) {
    Ok(json) => println!("{json}"),
    Err(e) => {
      eprintln!("failed to serialize verdict: {e}");
      exit(1);
    }
  }

  // Non-zero exit lets shell pipelines and CI checks notice a non-accepted
  // verdict without parsing the JSON body.
  if status != judge_job::VerdictStatus::Ac {
    exit(1);
  }
}

fn level_filter(log_level: &str) -> LevelFilter {
  match log_level.to_ascii_lowercase().as_str() {
    "off" => LevelFilter::Off,
    "error" => LevelFilter::Error,
    "warn" => LevelFilter::Warn,
    "debug" => LevelFilter::Debug,
    "trace" => LevelFilter::Trace,
    _ => LevelFilter::Info,
  }
}

fn read_request_json(path: Option<&std::path::Path>) -> std::io::Result<String> {
  use std::io::Read;
  match path {
    Some(path) => std::fs::read_to_string(path),
    None => {
      let mut buf = String::new();
      std::io::stdin().read_to_string(&mut buf)?;
      Ok(buf)
    }
  }
}