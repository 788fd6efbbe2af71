// Copyright 2026 Judge contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! Judge service configuration: the enumerated settings from the core's
//! external-interfaces contract, loaded from a TOML file with sane defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// The enumerated configuration surface for the judge core.
///
/// Every field has a default so that `Config::default()` (or a TOML file
/// that only overrides a handful of fields) is enough to run locally.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
  pub data_directory: PathBuf,
  pub runner_uid_min: u32,
  pub runner_uid_max: u32,
  pub runner_gid_min: u32,
  pub runner_gid_max: u32,
  pub max_process_count: u32,
  pub max_open_files: u32,
  pub output_max_size: usize,
  pub disable_networking: bool,
  pub log_level: String,
  pub bind_address: String,
}

impl Default for Config {
  fn default() -> Config {
    Config {
      data_directory: PathBuf::from("/var/lib/judge"),
      runner_uid_min: 1000,
      runner_uid_max: 1500,
      runner_gid_min: 1000,
      runner_gid_max: 1500,
      max_process_count: 64,
      max_open_files: 2048,
      output_max_size: 10 * 1024 * 1024,
      disable_networking: true,
      log_level: "info".to_string(),
      bind_address: "0.0.0.0:2000".to_string(),
    }
  }
}

impl Config {
  /// Parse a TOML config file, falling back to `Config::default()` for any
  /// field the file doesn't mention.
  pub fn parse<P: AsRef<Path>>(file: P) -> Result<Config, String> {
    let contents = fs::read_to_string(&file).map_err(|e| {
      format!(
        "Failed to read config file {}: {e}",
        file.as_ref().display()
      )
    })?;
    Config::from_toml_str(&contents)
  }

  pub fn from_toml_str(contents: &str) -> Result<Config, String> {
    let config: Config =
      toml::from_str(contents).map_err(|e| format!("Failed to parse config: {e}"))?;
    config.validate()?;
    Ok(config)
  }

  fn validate(&self) -> Result<(), String> {
    if self.runner_uid_max < self.runner_uid_min {
      return Err(format!(
        "runner_uid_max ({}) must be >= runner_uid_min ({})",
        self.runner_uid_max, self.runner_uid_min
      ));
    }
    if self.runner_gid_max < self.runner_gid_min {
      return Err(format!(
        "runner_gid_max ({}) must be >= runner_gid_min ({})",
        self.runner_gid_max, self.runner_gid_min
      ));
    }
    if self.output_max_size == 0 {
      return Err("output_max_size must be greater than 0".to_string());
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_config_validates() {
    Config::default().validate().unwrap();
  }

  #[test]
  fn partial_toml_fills_in_defaults() {
    let config = Config::from_toml_str(
      r#"
      runner_uid_min = 2000
      runner_uid_max = 2100
      "#,
    )
    .unwrap();
    assert_eq!(config.runner_uid_min, 2000);
    assert_eq!(config.runner_uid_max, 2100);
    assert_eq!(config.output_max_size, Config::default().output_max_size);
  }

  #[test]
  fn rejects_inverted_uid_range() {
    let err = Config::from_toml_str("runner_uid_min = 100\nrunner_uid_max = 50\n")
      .unwrap_err();
    assert!(err.contains("runner_uid_max"));
  }

  #[test]
  fn parse_reads_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("judge.toml");
    fs::write(&path, "bind_address = \"127.0.0.1:9000\"\n").unwrap();
    let config = Config::parse(&path).unwrap();
    assert_eq!(config.bind_address, "127.0.0.1:9000");
  }
}