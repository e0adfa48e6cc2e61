// Copyright 2018-2026 the Deno authors. MIT license.

#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]

use std::path::Path;
use std::path::PathBuf;

use serde_json::Map;
use serde_json::Value;
use sys_traits::FsRead;
use sys_traits::FsWrite;
use thiserror::Error;

const PACKAGES_KEY: &str = "packages";
const PEER_DEPENDENCIES_KEY: &str = "peerDependencies";

#[derive(Debug, Error)]
pub enum NpmLockfileLoadError {
  #[error("Failed reading lockfile at '{}'.", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("Unable to parse contents of lockfile '{}'.", .path.display())]
  Deserialize {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
  #[error("Expected lockfile '{}' to contain a JSON object.", .path.display())]
  NotAnObject { path: PathBuf },
}

#[derive(Debug, Error)]
pub enum NpmLockfileSaveError {
  #[error("Failed serializing lockfile '{}'.", .path.display())]
  Serialize {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
  #[error("Failed writing lockfile '{}'.", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SanitizeSummary {
  /// Keys of the package records whose peer dependencies were removed.
  pub stripped_packages: Vec<String>,
}

impl SanitizeSummary {
  pub fn has_changes(&self) -> bool {
    !self.stripped_packages.is_empty()
  }
}

/// An npm `package-lock.json` (lockfile version 2 or 3).
///
/// The lockfile is kept as raw JSON so that everything the sanitizer
/// doesn't touch is written back unchanged and in the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct NpmLockfile {
  pub path: PathBuf,
  content: Map<String, Value>,
}

impl NpmLockfile {
  pub fn load_from_path(
    sys: &impl FsRead,
    path: &Path,
  ) -> Result<NpmLockfile, NpmLockfileLoadError> {
    let text = sys.fs_read_to_string(path).map_err(|source| {
      NpmLockfileLoadError::Io {
        path: path.to_path_buf(),
        source,
      }
    })?;
    Self::load_from_string(path.to_path_buf(), &text)
  }

  pub fn load_from_string(
    path: PathBuf,
    text: &str,
  ) -> Result<NpmLockfile, NpmLockfileLoadError> {
    let value: Value = serde_json::from_str(text).map_err(|source| {
      NpmLockfileLoadError::Deserialize {
        path: path.clone(),
        source,
      }
    })?;
    match value {
      Value::Object(content) => Ok(NpmLockfile { path, content }),
      _ => Err(NpmLockfileLoadError::NotAnObject { path }),
    }
  }

  pub fn lockfile_version(&self) -> Option<u64> {
    self.content.get("lockfileVersion").and_then(|v| v.as_u64())
  }

  pub fn packages(&self) -> Option<&Map<String, Value>> {
    self.content.get(PACKAGES_KEY).and_then(|p| p.as_object())
  }

  pub fn package(&self, key: &str) -> Option<&Value> {
    self.packages().and_then(|p| p.get(key))
  }

  /// Removes the `peerDependencies` of every package record that declares
  /// a peer dependency on `host_runtime_package`.
  ///
  /// The whole mapping is dropped, not only the host runtime entry.
  /// Package records themselves are never removed and records without
  /// that reference are left untouched.
  pub fn sanitize(&mut self, host_runtime_package: &str) -> SanitizeSummary {
    let mut summary = SanitizeSummary::default();
    let Some(Value::Object(packages)) = self.content.get_mut(PACKAGES_KEY)
    else {
      log::debug!(
        "No \"{}\" in '{}', nothing to sanitize.",
        PACKAGES_KEY,
        self.path.display()
      );
      return summary;
    };
    for (key, record) in packages.iter_mut() {
      let Value::Object(record) = record else {
        continue;
      };
      let references_host = record
        .get(PEER_DEPENDENCIES_KEY)
        .and_then(|peers| peers.as_object())
        .is_some_and(|peers| peers.contains_key(host_runtime_package));
      if references_host {
        record.shift_remove(PEER_DEPENDENCIES_KEY);
        log::debug!("Removed peer dependencies of '{}'.", key);
        summary.stripped_packages.push(key.clone());
      }
    }
    summary
  }

  /// Pretty printed with a two space indent and a single trailing newline.
  pub fn to_canonical_string(&self) -> Result<String, serde_json::Error> {
    let mut text = serde_json::to_string_pretty(&self.content)?;
    text.push('\n');
    Ok(text)
  }

  pub fn save(&self, sys: &impl FsWrite) -> Result<(), NpmLockfileSaveError> {
    let text = self.to_canonical_string().map_err(|source| {
      NpmLockfileSaveError::Serialize {
        path: self.path.clone(),
        source,
      }
    })?;
    sys
      .fs_write(&self.path, text)
      .map_err(|source| NpmLockfileSaveError::Io {
        path: self.path.clone(),
        source,
      })
  }
}
