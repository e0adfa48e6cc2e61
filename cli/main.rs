// Copyright 2018-2026 the Deno authors. MIT license.

mod args;
mod npm;
mod tools;
mod util;

use deno_terminal::colors;
use sys_traits::EnvCurrentDir;
use sys_traits::impls::RealSys;

use crate::args::ProjectPaths;
use crate::npm::RealNpmCommandRunner;
use crate::tools::refresh::RefreshError;
use crate::tools::refresh::RefreshErrorKind;

fn exit_for_error(error: RefreshError) -> ! {
  log::error!(
    "{}: {}",
    colors::red_bold("error"),
    error_reporter::Report::new(&error)
  );
  std::process::exit(error.exit_code());
}

fn run() -> Result<(), RefreshError> {
  let sys = RealSys;
  let root_dir = sys
    .env_current_dir()
    .map_err(|err| RefreshErrorKind::CurrentDir(err).into_box())?;
  let config = args::load_config(&sys, &root_dir)?;
  log::debug!("Using config: {:?}", config);
  let runner =
    RealNpmCommandRunner::new(config.npm_command.clone(), root_dir.clone());
  let paths = ProjectPaths::new(root_dir);
  let report = tools::refresh::refresh(&sys, &runner, &paths, &config)?;
  log::debug!(
    "Checked {} dependencies, sanitized {} lockfile packages.",
    report.dependencies.len(),
    report.sanitized.stripped_packages.len()
  );
  Ok(())
}

fn main() {
  util::logger::init(None);
  if let Err(error) = run() {
    exit_for_error(error);
  }
}
