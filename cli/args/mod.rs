// Copyright 2018-2026 the Deno authors. MIT license.

use std::path::Path;
use std::path::PathBuf;

use refresh_npm::DistTagOverrides;
use serde::Deserialize;
use sys_traits::FsRead;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "npm-refresh.json";

const PACKAGE_JSON_NAME: &str = "package.json";
const LOCKFILE_NAME: &str = "package-lock.json";
const NODE_MODULES_NAME: &str = "node_modules";

#[derive(Debug, Error)]
pub enum ConfigLoadError {
  #[error("Error loading npm-refresh.json at {}.", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("Failed to parse npm-refresh.json at {}.", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

/// Settings read from `npm-refresh.json` next to the package.json.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct RefreshConfig {
  /// Dist-tag to follow per package instead of "latest".
  pub overrides: DistTagOverrides,
  /// Packages declaring a peer dependency on this one get their peer
  /// dependencies removed from the lockfile before the clean install.
  pub host_runtime_package: String,
  pub npm_command: String,
}

impl Default for RefreshConfig {
  fn default() -> Self {
    Self {
      overrides: DistTagOverrides::from([("electron-builder", "next")]),
      host_runtime_package: "electron".to_string(),
      npm_command: default_npm_command().to_string(),
    }
  }
}

fn default_npm_command() -> &'static str {
  // npm is a batch script on Windows
  if cfg!(windows) { "npm.cmd" } else { "npm" }
}

/// Reads the config file in `dir`, falling back to the defaults when
/// there isn't one.
pub fn load_config(
  sys: &impl FsRead,
  dir: &Path,
) -> Result<RefreshConfig, ConfigLoadError> {
  let path = dir.join(CONFIG_FILE_NAME);
  let text = match sys.fs_read_to_string(&path) {
    Ok(text) => text,
    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
      log::debug!("No {} found, using defaults.", CONFIG_FILE_NAME);
      return Ok(RefreshConfig::default());
    }
    Err(err) => return Err(ConfigLoadError::Io { path, source: err }),
  };
  let config =
    serde_json::from_str(&text).map_err(|source| ConfigLoadError::Parse {
      path: path.clone(),
      source,
    })?;
  log::debug!("{} found at: '{}'", CONFIG_FILE_NAME, path.display());
  Ok(config)
}

/// Locations of the files and directories the refresh works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
  pub root_dir: PathBuf,
}

impl ProjectPaths {
  pub fn new(root_dir: PathBuf) -> Self {
    Self { root_dir }
  }

  pub fn package_json(&self) -> PathBuf {
    self.root_dir.join(PACKAGE_JSON_NAME)
  }

  pub fn lockfile(&self) -> PathBuf {
    self.root_dir.join(LOCKFILE_NAME)
  }

  pub fn node_modules_dir(&self) -> PathBuf {
    self.root_dir.join(NODE_MODULES_NAME)
  }
}
