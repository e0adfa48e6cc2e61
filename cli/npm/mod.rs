// Copyright 2018-2026 the Deno authors. MIT license.

use std::path::PathBuf;
use std::process::Command;
use std::process::ExitStatus;
use std::process::Stdio;

use refresh_npm::DistTagsFetchError;
use refresh_npm::DistTagsFetcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
  /// `None` when the process was terminated by a signal.
  pub code: Option<i32>,
}

impl CommandStatus {
  pub const SUCCESS: CommandStatus = CommandStatus { code: Some(0) };

  pub fn success(&self) -> bool {
    self.code == Some(0)
  }
}

impl From<ExitStatus> for CommandStatus {
  fn from(status: ExitStatus) -> Self {
    Self {
      code: status.code(),
    }
  }
}

impl std::fmt::Display for CommandStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self.code {
      Some(code) => write!(f, "exit code {code}"),
      None => f.write_str("a signal"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
  pub status: CommandStatus,
  pub stdout: String,
}

/// Runs the npm executable with a fixed argument list.
pub trait NpmCommandRunner {
  /// Runs npm with the output going straight to the terminal.
  fn run(&self, args: &[&str]) -> std::io::Result<CommandStatus>;

  /// Runs npm and captures what it writes to stdout.
  fn output(&self, args: &[&str]) -> std::io::Result<CommandOutput>;
}

pub struct RealNpmCommandRunner {
  npm_command: String,
  cwd: PathBuf,
}

impl RealNpmCommandRunner {
  pub fn new(npm_command: String, cwd: PathBuf) -> Self {
    Self { npm_command, cwd }
  }

  fn command(&self, args: &[&str]) -> Command {
    log::debug!("Running `{} {}`", self.npm_command, args.join(" "));
    let mut command = Command::new(&self.npm_command);
    command.args(args).current_dir(&self.cwd);
    command
  }
}

impl NpmCommandRunner for RealNpmCommandRunner {
  fn run(&self, args: &[&str]) -> std::io::Result<CommandStatus> {
    let status = self.command(args).status()?;
    Ok(status.into())
  }

  fn output(&self, args: &[&str]) -> std::io::Result<CommandOutput> {
    let output = self
      .command(args)
      .stdin(Stdio::null())
      .stderr(Stdio::inherit())
      .output()?;
    Ok(CommandOutput {
      status: output.status.into(),
      stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
    })
  }
}

/// Queries the registry through `npm dist-tags <package>`.
pub struct NpmDistTagsFetcher<'a, TRunner: NpmCommandRunner> {
  runner: &'a TRunner,
}

impl<'a, TRunner: NpmCommandRunner> NpmDistTagsFetcher<'a, TRunner> {
  pub fn new(runner: &'a TRunner) -> Self {
    Self { runner }
  }
}

impl<TRunner: NpmCommandRunner> DistTagsFetcher
  for NpmDistTagsFetcher<'_, TRunner>
{
  fn fetch_dist_tags(
    &self,
    package_name: &str,
  ) -> Result<String, DistTagsFetchError> {
    let output = self
      .runner
      .output(&["dist-tags", package_name])
      .map_err(|source| DistTagsFetchError::Io {
        package_name: package_name.to_string(),
        source,
      })?;
    if !output.status.success() {
      return Err(DistTagsFetchError::Failed {
        package_name: package_name.to_string(),
        code: output.status.code,
      });
    }
    Ok(output.stdout)
  }
}

#[cfg(test)]
pub mod test_util {
  use std::cell::RefCell;
  use std::collections::HashMap;
  use std::collections::HashSet;

  use super::*;

  /// Records every npm invocation and answers with canned results.
  #[derive(Default)]
  pub struct FakeNpmRunner {
    pub invocations: RefCell<Vec<String>>,
    statuses: HashMap<String, CommandStatus>,
    outputs: HashMap<String, String>,
    io_errors: HashSet<String>,
    on_run: RefCell<Option<Box<dyn FnMut(&str)>>>,
  }

  impl FakeNpmRunner {
    pub fn with_status(mut self, args: &str, status: CommandStatus) -> Self {
      self.statuses.insert(args.to_string(), status);
      self
    }

    pub fn with_output(mut self, args: &str, stdout: &str) -> Self {
      self.outputs.insert(args.to_string(), stdout.to_string());
      self
    }

    /// Makes the invocation fail as if npm could not be spawned.
    pub fn with_io_error(mut self, args: &str) -> Self {
      self.io_errors.insert(args.to_string());
      self
    }

    /// Called with the joined arguments of every `run` invocation.
    pub fn on_run(self, f: impl FnMut(&str) + 'static) -> Self {
      *self.on_run.borrow_mut() = Some(Box::new(f));
      self
    }

    fn record(&self, args: &[&str]) -> std::io::Result<String> {
      let args = args.join(" ");
      self.invocations.borrow_mut().push(args.clone());
      if self.io_errors.contains(&args) {
        return Err(std::io::Error::new(
          std::io::ErrorKind::NotFound,
          format!("npm not found while running `{args}`"),
        ));
      }
      Ok(args)
    }

    fn status(&self, args: &str) -> CommandStatus {
      self
        .statuses
        .get(args)
        .copied()
        .unwrap_or(CommandStatus::SUCCESS)
    }
  }

  impl NpmCommandRunner for FakeNpmRunner {
    fn run(&self, args: &[&str]) -> std::io::Result<CommandStatus> {
      let args = self.record(args)?;
      if let Some(on_run) = self.on_run.borrow_mut().as_mut() {
        on_run(&args);
      }
      Ok(self.status(&args))
    }

    fn output(&self, args: &[&str]) -> std::io::Result<CommandOutput> {
      let args = self.record(args)?;
      Ok(CommandOutput {
        status: self.status(&args),
        stdout: self.outputs.get(&args).cloned().unwrap_or_default(),
      })
    }
  }
}
