// Copyright 2018-2026 the Deno authors. MIT license.

#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]
#![deny(clippy::unused_async)]
#![deny(clippy::unnecessary_wraps)]

use std::path::Path;
use std::path::PathBuf;

use serde_json::Map;
use serde_json::Value;
use sys_traits::FsRead;
use sys_traits::FsWrite;
use thiserror::Error;

mod update;

pub use update::DependencyOutcome;
pub use update::DependencyReport;
pub use update::UpdateSummary;
pub use update::update_package_json;

/// The dependency groups of a package.json that get refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DependencyGroup {
  Dependencies,
  DevDependencies,
}

impl DependencyGroup {
  /// Groups in the order they are processed.
  pub const ALL: [DependencyGroup; 2] =
    [DependencyGroup::Dependencies, DependencyGroup::DevDependencies];

  pub fn key(&self) -> &'static str {
    match self {
      DependencyGroup::Dependencies => "dependencies",
      DependencyGroup::DevDependencies => "devDependencies",
    }
  }
}

impl std::fmt::Display for DependencyGroup {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.key())
  }
}

#[derive(Debug, Error)]
pub enum PackageJsonLoadError {
  #[error("Failed reading '{}'.", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("Malformed package.json '{}'.", .path.display())]
  Deserialize {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
  #[error("Expected '{}' to contain a JSON object.", .path.display())]
  NotAnObject { path: PathBuf },
}

#[derive(Debug, Error)]
pub enum PackageJsonSaveError {
  #[error("Failed serializing '{}'.", .path.display())]
  Serialize {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
  #[error("Failed writing '{}'.", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// A package.json held as its raw JSON object.
///
/// Only the version strings of the dependency groups are ever modified.
/// Everything else, including key order, is written back as it was read.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageJson {
  pub path: PathBuf,
  value: Map<String, Value>,
}

impl PackageJson {
  pub fn load_from_path(
    sys: &impl FsRead,
    path: &Path,
  ) -> Result<PackageJson, PackageJsonLoadError> {
    let text = sys.fs_read_to_string(path).map_err(|source| {
      PackageJsonLoadError::Io {
        path: path.to_path_buf(),
        source,
      }
    })?;
    Self::load_from_string(path.to_path_buf(), &text)
  }

  pub fn load_from_string(
    path: PathBuf,
    source: &str,
  ) -> Result<PackageJson, PackageJsonLoadError> {
    let value: Value = serde_json::from_str(source).map_err(|source| {
      PackageJsonLoadError::Deserialize {
        path: path.clone(),
        source,
      }
    })?;
    Self::load_from_value(path, value)
  }

  pub fn load_from_value(
    path: PathBuf,
    value: Value,
  ) -> Result<PackageJson, PackageJsonLoadError> {
    match value {
      Value::Object(value) => Ok(PackageJson { path, value }),
      _ => Err(PackageJsonLoadError::NotAnObject { path }),
    }
  }

  pub fn name(&self) -> Option<&str> {
    self.value.get("name").and_then(|n| n.as_str())
  }

  /// Gets the entries of a dependency group in declaration order.
  ///
  /// Values that aren't strings are returned as `None`.
  pub fn dependencies(
    &self,
    group: DependencyGroup,
  ) -> Vec<(String, Option<String>)> {
    let Some(Value::Object(deps)) = self.value.get(group.key()) else {
      return Vec::new();
    };
    deps
      .iter()
      .map(|(name, version)| {
        (name.clone(), version.as_str().map(|v| v.to_string()))
      })
      .collect()
  }

  /// Replaces the version of an existing dependency in place.
  ///
  /// Returns false when the group or the dependency doesn't exist.
  pub fn set_dependency_version(
    &mut self,
    group: DependencyGroup,
    name: &str,
    version: &str,
  ) -> bool {
    let Some(Value::Object(deps)) = self.value.get_mut(group.key()) else {
      return false;
    };
    match deps.get_mut(name) {
      Some(value) => {
        *value = Value::String(version.to_string());
        true
      }
      None => false,
    }
  }

  /// Pretty printed with a two space indent and a single trailing newline.
  pub fn to_canonical_string(&self) -> Result<String, serde_json::Error> {
    let mut text = serde_json::to_string_pretty(&self.value)?;
    text.push('\n');
    Ok(text)
  }

  pub fn save(&self, sys: &impl FsWrite) -> Result<(), PackageJsonSaveError> {
    let text = self.to_canonical_string().map_err(|source| {
      PackageJsonSaveError::Serialize {
        path: self.path.clone(),
        source,
      }
    })?;
    sys
      .fs_write(&self.path, text)
      .map_err(|source| PackageJsonSaveError::Io {
        path: self.path.clone(),
        source,
      })
  }
}

#[cfg(test)]
mod test {
  use std::path::PathBuf;

  use pretty_assertions::assert_eq;
  use serde_json::json;
  use sys_traits::FsCreateDirAll;
  use sys_traits::impls::InMemorySys;

  use super::*;

  const PACKAGE_JSON_TEXT: &str = r#"{
  "name": "vieb",
  "version": "12.0.0",
  "main": "app/index.js",
  "scripts": {
    "start": "electron app"
  },
  "dependencies": {
    "marked": "15.0.0",
    "@cliqz/adblocker-electron": "1.34.0"
  },
  "devDependencies": {
    "electron": "33.2.0",
    "electron-builder": "26.0.0-alpha.7",
    "eslint": "9.15.0"
  },
  "license": "GPL-3.0-or-later"
}
"#;

  fn load(text: &str) -> PackageJson {
    PackageJson::load_from_string(PathBuf::from("/package.json"), text)
      .unwrap()
  }

  #[test]
  fn round_trips_unmodified_text() {
    let package_json = load(PACKAGE_JSON_TEXT);
    assert_eq!(package_json.name(), Some("vieb"));
    assert_eq!(
      package_json.to_canonical_string().unwrap(),
      PACKAGE_JSON_TEXT
    );
    let reparsed = load(&package_json.to_canonical_string().unwrap());
    assert_eq!(reparsed, package_json);
  }

  #[test]
  fn lists_dependencies_in_declaration_order() {
    let package_json = load(PACKAGE_JSON_TEXT);
    assert_eq!(
      package_json.dependencies(DependencyGroup::Dependencies),
      vec![
        ("marked".to_string(), Some("15.0.0".to_string())),
        (
          "@cliqz/adblocker-electron".to_string(),
          Some("1.34.0".to_string())
        ),
      ]
    );
    assert_eq!(
      package_json
        .dependencies(DependencyGroup::DevDependencies)
        .into_iter()
        .map(|(name, _)| name)
        .collect::<Vec<_>>(),
      vec!["electron", "electron-builder", "eslint"]
    );
  }

  #[test]
  fn missing_or_invalid_groups_are_empty() {
    let package_json = load(r#"{ "devDependencies": ["not", "a", "map"] }"#);
    assert!(
      package_json
        .dependencies(DependencyGroup::Dependencies)
        .is_empty()
    );
    assert!(
      package_json
        .dependencies(DependencyGroup::DevDependencies)
        .is_empty()
    );
  }

  #[test]
  fn non_string_versions_are_none() {
    let package_json = load(r#"{ "dependencies": { "a": 1, "b": "2" } }"#);
    assert_eq!(
      package_json.dependencies(DependencyGroup::Dependencies),
      vec![
        ("a".to_string(), None),
        ("b".to_string(), Some("2".to_string())),
      ]
    );
  }

  #[test]
  fn set_dependency_version_keeps_order_and_other_fields() {
    let mut package_json = load(PACKAGE_JSON_TEXT);
    assert!(package_json.set_dependency_version(
      DependencyGroup::DevDependencies,
      "electron",
      "34.0.0"
    ));
    assert!(!package_json.set_dependency_version(
      DependencyGroup::Dependencies,
      "electron",
      "34.0.0"
    ));
    assert_eq!(
      package_json.to_canonical_string().unwrap(),
      PACKAGE_JSON_TEXT.replace("\"33.2.0\"", "\"34.0.0\"")
    );
  }

  #[test]
  fn rejects_non_object_json() {
    let err = PackageJson::load_from_string(PathBuf::from("/package.json"), "[]")
      .unwrap_err();
    assert!(matches!(err, PackageJsonLoadError::NotAnObject { .. }));
    let err = PackageJson::load_from_string(PathBuf::from("/package.json"), "{")
      .unwrap_err();
    assert!(matches!(err, PackageJsonLoadError::Deserialize { .. }));
    assert_eq!(err.to_string(), "Malformed package.json '/package.json'.");
  }

  #[test]
  fn loads_and_saves_through_sys() {
    let sys = InMemorySys::default();
    sys.fs_create_dir_all("/project").unwrap();
    let path = PathBuf::from("/project/package.json");
    assert!(matches!(
      PackageJson::load_from_path(&sys, &path),
      Err(PackageJsonLoadError::Io { .. })
    ));

    sys
      .fs_write(&path, json!({ "dependencies": { "a": "1.0.0" } }).to_string())
      .unwrap();
    let mut package_json = PackageJson::load_from_path(&sys, &path).unwrap();
    package_json.set_dependency_version(
      DependencyGroup::Dependencies,
      "a",
      "2.0.0",
    );
    package_json.save(&sys).unwrap();
    assert_eq!(
      sys.fs_read_to_string(&path).unwrap(),
      "{\n  \"dependencies\": {\n    \"a\": \"2.0.0\"\n  }\n}\n"
    );
  }

  #[test]
  fn invalid_utf8_fails_to_load() {
    let sys = InMemorySys::default();
    sys.fs_create_dir_all("/project").unwrap();
    let path = PathBuf::from("/project/package.json");
    let text = b"{ \"description\": \"a\xFFb\", \"dependencies\": {} }";
    sys.fs_write(&path, text).unwrap();

    let err = PackageJson::load_from_path(&sys, &path).unwrap_err();
    match err {
      PackageJsonLoadError::Io { source, .. } => {
        assert_eq!(source.kind(), std::io::ErrorKind::InvalidData);
      }
      err => panic!("unexpected error: {err:?}"),
    }
    assert_eq!(&*sys.fs_read(&path).unwrap(), text.as_slice());
  }
}
