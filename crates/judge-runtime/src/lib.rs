// Copyright 2026 Judge contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! The Runtime Registry: discovers installed language packages by scanning
//! `<data_dir>/packages/<language>/<version>/` for a sentinel file, and
//! exposes lookup by `(language, version)` or by alias.
//!
//! Runtime package discovery proper (installing/listing packages) is an
//! external collaborator per spec.md §1; this module only implements the
//! read side the core consumes.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Name of the file whose presence marks a package directory as installed.
/// The original spec does not name this sentinel; `.installed` is this
/// implementation's choice (see DESIGN.md).
pub const INSTALLED_SENTINEL: &str = ".installed";

/// Optional per-package metadata: aliases and extra environment variables.
/// Absent file => empty alias set and empty env map.
const METADATA_FILE: &str = "metadata.json";

#[derive(Clone, Debug, Deserialize, Default)]
struct RuntimeMetadata {
  #[serde(default)]
  aliases: HashSet<String>,
  #[serde(default)]
  env_vars: BTreeMap<String, String>,
}

/// An installed language package, read-only from the core's perspective.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Runtime {
  pub language: String,
  pub version: String,
  pub aliases: HashSet<String>,
  pub compiled: bool,
  pub pkgdir: PathBuf,
  pub env_vars: BTreeMap<String, String>,
}

impl Runtime {
  pub fn compile_path(&self) -> PathBuf {
    self.pkgdir.join("compile")
  }

  pub fn run_path(&self) -> PathBuf {
    self.pkgdir.join("run")
  }
}

/// A snapshot of every installed runtime, built once by scanning disk.
#[derive(Clone, Debug, Default)]
pub struct RuntimeRegistry {
  runtimes: Vec<Runtime>,
}

impl RuntimeRegistry {
  /// Scan `<data_dir>/packages/<language>/<version>/` for installed
  /// packages. A package directory lacking a `run` executable is skipped
  /// with a warning rather than failing the whole scan, so that a single
  /// broken install doesn't take down every other runtime.
  pub fn discover(data_dir: &Path) -> RuntimeRegistry {
    let packages_dir = data_dir.join("packages");
    let mut runtimes = Vec::new();

    let Ok(language_dirs) = fs::read_dir(&packages_dir) else {
      log::warn!(
        "No packages directory at {}; registry will be empty",
        packages_dir.display()
      );
      return RuntimeRegistry { runtimes };
    };

    for language_entry in language_dirs.flatten() {
      let language_path = language_entry.path();
      if !language_path.is_dir() {
        continue;
      }
      let language = language_entry.file_name().to_string_lossy().into_owned();

      let Ok(version_dirs) = fs::read_dir(&language_path) else {
        continue;
      };
      for version_entry in version_dirs.flatten() {
        let pkgdir = version_entry.path();
        if !pkgdir.is_dir() {
          continue;
        }
        if !pkgdir.join(INSTALLED_SENTINEL).exists() {
          continue;
        }
        let version = version_entry.file_name().to_string_lossy().into_owned();
        if !pkgdir.join("run").exists() {
          log::warn!(
            "Skipping {}/{}: installed but missing `run`",
            language,
            version
          );
          continue;
        }
        let compiled = pkgdir.join("compile").exists();
        let metadata = read_metadata(&pkgdir);
        runtimes.push(Runtime {
          language: language.clone(),
          version,
          aliases: metadata.aliases,
          compiled,
          pkgdir,
          env_vars: metadata.env_vars,
        });
      }
    }

    RuntimeRegistry { runtimes }
  }

  pub fn all(&self) -> &[Runtime] {
    &self.runtimes
  }

  pub fn find(&self, language: &str, version: &str) -> Option<&Runtime> {
    self.runtimes
      .iter()
      .find(|r| r.language == language && r.version == version)
  }

  pub fn find_by_alias(&self, alias: &str) -> Option<&Runtime> {
    self.runtimes.iter().find(|r| r.aliases.contains(alias))
  }
}

fn read_metadata(pkgdir: &Path) -> RuntimeMetadata {
  let path = pkgdir.join(METADATA_FILE);
  let Ok(contents) = fs::read_to_string(&path) else {
    return RuntimeMetadata::default();
  };
  serde_json::from_str(&contents).unwrap_or_else(|e| {
    log::warn!("Ignoring malformed {}: {e}", path.display());
    RuntimeMetadata::default()
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;

  fn install_package(
    base: &Path,
    language: &str,
    version: &str,
    compiled: bool,
    metadata: Option<&str>,
  ) {
    let dir = base.join("packages").join(language).join(version);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("run"), "#!/bin/sh\n").unwrap();
    if compiled {
      fs::write(dir.join("compile"), "#!/bin/sh\n").unwrap();
    }
    fs::write(dir.join(INSTALLED_SENTINEL), "").unwrap();
    if let Some(metadata) = metadata {
      fs::write(dir.join(METADATA_FILE), metadata).unwrap();
    }
  }

  #[test]
  fn discovers_installed_packages() {
    let tmp = tempfile::tempdir().unwrap();
    install_package(tmp.path(), "python", "3.10.0", false, None);
    install_package(tmp.path(), "java", "15.0.2", true, None);

    let registry = RuntimeRegistry::discover(tmp.path());
    assert_eq!(registry.all().len(), 2);

    let python = registry.find("python", "3.10.0").unwrap();
    assert!(!python.compiled);

    let java = registry.find("java", "15.0.2").unwrap();
    assert!(java.compiled);
  }

  #[test]
  fn ignores_uninstalled_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("packages").join("ruby").join("3.0.0");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("run"), "#!/bin/sh\n").unwrap();
    // No sentinel file written.

    let registry = RuntimeRegistry::discover(tmp.path());
    assert!(registry.find("ruby", "3.0.0").is_none());
  }

  #[test]
  fn skips_package_missing_run() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("packages").join("go").join("1.20");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(INSTALLED_SENTINEL), "").unwrap();

    let registry = RuntimeRegistry::discover(tmp.path());
    assert!(registry.find("go", "1.20").is_none());
  }

  #[test]
  fn reads_aliases_and_env_vars_from_metadata() {
    let tmp = tempfile::tempdir().unwrap();
    install_package(
      tmp.path(),
      "python",
      "3.10.0",
      false,
      Some(r#"{"aliases": ["python3", "py"], "env_vars": {"PYTHONDONTWRITEBYTECODE": "1"}}"#),
    );

    let registry = RuntimeRegistry::discover(tmp.path());
    let runtime = registry.find_by_alias("py").unwrap();
    assert_eq!(runtime.language, "python");
    assert!(runtime.aliases.contains("python3"));
    assert_eq!(
      runtime.env_vars.get("PYTHONDONTWRITEBYTECODE"),
      Some(&"1".to_string())
    );
  }

  #[test]
  fn missing_packages_dir_yields_empty_registry() {
    let tmp = tempfile::tempdir().unwrap();
    let registry = RuntimeRegistry::discover(tmp.path());
    assert!(registry.all().is_empty());
  }
}