// Copyright 2018-2026 the Deno authors. MIT license.

use std::io::ErrorKind;
use std::path::Path;

use boxed_error::Boxed;
use deno_terminal::colors;
use refresh_lockfile::NpmLockfile;
use refresh_lockfile::NpmLockfileLoadError;
use refresh_lockfile::NpmLockfileSaveError;
use refresh_lockfile::SanitizeSummary;
use refresh_npm::DistTagsFetchError;
use refresh_package_json::DependencyReport;
use refresh_package_json::PackageJson;
use refresh_package_json::PackageJsonLoadError;
use refresh_package_json::PackageJsonSaveError;
use refresh_package_json::UpdateSummary;
use refresh_package_json::update_package_json;
use thiserror::Error;

use crate::args::ConfigLoadError;
use crate::args::ProjectPaths;
use crate::args::RefreshConfig;
use crate::npm::CommandStatus;
use crate::npm::NpmCommandRunner;
use crate::npm::NpmDistTagsFetcher;

#[sys_traits::auto_impl]
pub trait RefreshSys:
  sys_traits::FsRead
  + sys_traits::FsWrite
  + sys_traits::FsRemoveFile
  + sys_traits::FsRemoveDirAll
{
}

#[derive(Debug, Boxed)]
pub struct RefreshError(pub Box<RefreshErrorKind>);

#[derive(Debug, Error)]
pub enum RefreshErrorKind {
  #[error("Failed resolving the current directory.")]
  CurrentDir(#[source] std::io::Error),
  #[error(transparent)]
  Config(#[from] ConfigLoadError),
  #[error(transparent)]
  PackageJsonLoad(#[from] PackageJsonLoadError),
  #[error(transparent)]
  PackageJsonSave(#[from] PackageJsonSaveError),
  #[error(transparent)]
  DistTagsFetch(#[from] DistTagsFetchError),
  #[error(transparent)]
  LockfileLoad(#[from] NpmLockfileLoadError),
  #[error(transparent)]
  LockfileSave(#[from] NpmLockfileSaveError),
  #[error("Failed running `npm {command}`.")]
  Spawn {
    command: String,
    #[source]
    source: std::io::Error,
  },
  #[error("`npm {command}` failed with {status}.")]
  CommandFailed {
    command: String,
    status: CommandStatus,
  },
}

impl RefreshError {
  /// The exit code the process should end with for this error.
  pub fn exit_code(&self) -> i32 {
    match self.as_kind() {
      RefreshErrorKind::CommandFailed {
        status: CommandStatus { code: Some(code) },
        ..
      } if *code != 0 => *code,
      _ => 1,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepKind {
  /// Failure aborts the refresh.
  Mandatory,
  /// Failure is logged and the refresh continues.
  BestEffort,
}

struct NpmStep {
  title: &'static str,
  args: &'static [&'static str],
  kind: StepKind,
}

const INSTALL: NpmStep = NpmStep {
  title: "Installing modules",
  args: &["install", "--legacy-peer-deps"],
  kind: StepKind::Mandatory,
};

const AUDIT_FIX: NpmStep = NpmStep {
  title: "Fixing audit issues",
  args: &["audit", "fix"],
  kind: StepKind::BestEffort,
};

const DEDUP: NpmStep = NpmStep {
  title: "Deduplicating dependencies",
  args: &["dedup"],
  kind: StepKind::Mandatory,
};

const CLEAN_INSTALL: NpmStep = NpmStep {
  title: "Verifying clean install",
  args: &["ci"],
  kind: StepKind::Mandatory,
};

#[derive(Debug)]
pub struct RefreshReport {
  pub dependencies: Vec<DependencyReport>,
  pub sanitized: SanitizeSummary,
}

/// Refreshes the dependencies of the project and reinstalls them.
///
/// 1. Moves every dependency in package.json to its requested dist-tag.
/// 2. Removes `node_modules` and `package-lock.json`.
/// 3. Runs `npm install`, `npm audit fix` and `npm dedup`.
/// 4. Strips the peer dependencies on the host runtime from the new
///    lockfile and verifies it with `npm ci`.
///
/// Stops at the first mandatory step that fails. Files written before
/// that point are kept.
pub fn refresh(
  sys: &impl RefreshSys,
  runner: &impl NpmCommandRunner,
  paths: &ProjectPaths,
  config: &RefreshConfig,
) -> Result<RefreshReport, RefreshError> {
  log_title("Checking dependencies");
  let mut package_json =
    PackageJson::load_from_path(sys, &paths.package_json())?;
  let fetcher = NpmDistTagsFetcher::new(runner);
  let dependencies =
    update_package_json(&mut package_json, &config.overrides, &fetcher)?;
  package_json.save(sys)?;

  let node_modules_dir = paths.node_modules_dir();
  remove_best_effort(
    sys.fs_remove_dir_all(&node_modules_dir),
    &node_modules_dir,
  );
  let lockfile_path = paths.lockfile();
  remove_best_effort(sys.fs_remove_file(&lockfile_path), &lockfile_path);

  run_npm_step(runner, &INSTALL)?;
  run_npm_step(runner, &AUDIT_FIX)?;
  run_npm_step(runner, &DEDUP)?;

  log_title("Sanitizing lockfile");
  let mut lockfile = NpmLockfile::load_from_path(sys, &lockfile_path)?;
  let sanitized = lockfile.sanitize(&config.host_runtime_package);
  for package in &sanitized.stripped_packages {
    log::info!(
      "- removed peer dependencies of {} {}",
      package,
      colors::gray(format!("(requires {})", config.host_runtime_package))
    );
  }
  if !sanitized.has_changes() {
    log::info!(
      "- no package declares a peer dependency on {}",
      config.host_runtime_package
    );
  }
  lockfile.save(sys)?;

  run_npm_step(runner, &CLEAN_INSTALL)?;

  log_summary(&UpdateSummary::from_reports(&dependencies), &sanitized);
  Ok(RefreshReport {
    dependencies,
    sanitized,
  })
}

fn log_title(title: &str) {
  log::info!("");
  log::info!("  = {}", colors::bold(title));
  log::info!("");
}

/// Returns the error that was logged as a warning, if any.
fn remove_best_effort(
  result: std::io::Result<()>,
  path: &Path,
) -> Option<std::io::Error> {
  match result {
    Ok(()) => {
      log::debug!("Removed '{}'.", path.display());
      None
    }
    Err(err) if err.kind() == ErrorKind::NotFound => {
      log::debug!("'{}' does not exist, nothing to remove.", path.display());
      None
    }
    Err(err) => {
      log::warn!(
        "{} Failed removing '{}': {}",
        colors::yellow("Warning"),
        path.display(),
        err
      );
      Some(err)
    }
  }
}

fn run_npm_step(
  runner: &impl NpmCommandRunner,
  step: &NpmStep,
) -> Result<(), RefreshError> {
  log_title(step.title);
  let command = step.args.join(" ");
  let result = runner.run(step.args);
  match (step.kind, result) {
    (_, Ok(status)) if status.success() => Ok(()),
    (StepKind::BestEffort, Ok(status)) => {
      log::warn!(
        "{} `npm {}` failed with {}, continuing.",
        colors::yellow("Warning"),
        command,
        status
      );
      Ok(())
    }
    (StepKind::BestEffort, Err(err)) => {
      log::warn!(
        "{} Failed running `npm {}`: {}, continuing.",
        colors::yellow("Warning"),
        command,
        err
      );
      Ok(())
    }
    (StepKind::Mandatory, Ok(status)) => {
      Err(RefreshErrorKind::CommandFailed { command, status }.into_box())
    }
    (StepKind::Mandatory, Err(source)) => {
      Err(RefreshErrorKind::Spawn { command, source }.into_box())
    }
  }
}

fn log_summary(summary: &UpdateSummary, sanitized: &SanitizeSummary) {
  log::info!("");
  log::info!(
    "{} {} updated, {} up to date, {} failed{}",
    colors::green("Refreshed"),
    summary.updated,
    summary.up_to_date,
    summary.failed,
    if summary.skipped > 0 {
      format!(", {} skipped", summary.skipped)
    } else {
      String::new()
    }
  );
  if sanitized.has_changes() {
    log::info!(
      "{}",
      colors::gray(format!(
        "Removed peer dependencies from {} lockfile package(s).",
        sanitized.stripped_packages.len()
      ))
    );
  }
}
