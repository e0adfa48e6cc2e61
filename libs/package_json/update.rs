// Copyright 2018-2026 the Deno authors. MIT license.

use std::fmt;

use refresh_npm::DistTagOverrides;
use refresh_npm::DistTagsFetchError;
use refresh_npm::DistTagsFetcher;
use refresh_npm::resolve_dist_tag;

use crate::DependencyGroup;
use crate::PackageJson;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyOutcome {
  UpToDate {
    version: String,
    latest: Option<String>,
  },
  Updated {
    from: String,
    to: String,
    latest: Option<String>,
  },
  TagNotFound {
    tag: String,
  },
  /// The version in the manifest isn't a string, so it was left alone.
  Skipped,
  /// The dependency disappeared from its group before it could be updated.
  Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyReport {
  pub group: DependencyGroup,
  pub name: String,
  pub outcome: DependencyOutcome,
}

impl fmt::Display for DependencyReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = &self.name;
    let latest = match &self.outcome {
      DependencyOutcome::UpToDate { latest, .. } => {
        write!(f, "{name} is already up to date")?;
        latest
      }
      DependencyOutcome::Updated { from, to, latest } => {
        write!(f, "updating {name} from {from} to {to}")?;
        latest
      }
      DependencyOutcome::TagNotFound { tag } => {
        return write!(f, "failed to find tag {tag} for {name}");
      }
      DependencyOutcome::Skipped => {
        return write!(f, "skipping {name}, its version is not a string");
      }
      DependencyOutcome::Missing => {
        let group = self.group;
        return write!(f, "skipping {name}, it is no longer in {group}");
      }
    };
    if let Some(latest) = latest {
      write!(f, " (latest is {latest})")?;
    }
    Ok(())
  }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpdateSummary {
  pub updated: usize,
  pub up_to_date: usize,
  pub failed: usize,
  pub skipped: usize,
}

impl UpdateSummary {
  pub fn from_reports(reports: &[DependencyReport]) -> Self {
    let mut summary = UpdateSummary::default();
    for report in reports {
      match report.outcome {
        DependencyOutcome::UpToDate { .. } => summary.up_to_date += 1,
        DependencyOutcome::Updated { .. } => summary.updated += 1,
        DependencyOutcome::TagNotFound { .. } => summary.failed += 1,
        DependencyOutcome::Skipped | DependencyOutcome::Missing => {
          summary.skipped += 1
        }
      }
    }
    summary
  }
}

/// Moves every dependency of the package.json to the version its
/// requested dist-tag points at.
///
/// The registry is queried once per dependency, `dependencies` first and
/// then `devDependencies`. A dependency whose tag can't be found keeps its
/// current version. Fetch failures abort the update, leaving the versions
/// already changed in memory only.
pub fn update_package_json(
  package_json: &mut PackageJson,
  overrides: &DistTagOverrides,
  fetcher: &impl DistTagsFetcher,
) -> Result<Vec<DependencyReport>, DistTagsFetchError> {
  let mut reports = Vec::new();
  for group in DependencyGroup::ALL {
    for (name, current_version) in package_json.dependencies(group) {
      let outcome = match current_version {
        Some(current_version) => update_dependency(
          package_json,
          group,
          &name,
          &current_version,
          overrides,
          fetcher,
        )?,
        None => DependencyOutcome::Skipped,
      };
      let report = DependencyReport {
        group,
        name,
        outcome,
      };
      match report.outcome {
        DependencyOutcome::TagNotFound { .. }
        | DependencyOutcome::Skipped
        | DependencyOutcome::Missing => log::warn!("- {}", report),
        _ => log::info!("- {}", report),
      }
      reports.push(report);
    }
  }
  Ok(reports)
}

fn update_dependency(
  package_json: &mut PackageJson,
  group: DependencyGroup,
  name: &str,
  current_version: &str,
  overrides: &DistTagOverrides,
  fetcher: &impl DistTagsFetcher,
) -> Result<DependencyOutcome, DistTagsFetchError> {
  let registry_text = fetcher.fetch_dist_tags(name)?;
  let resolution =
    match resolve_dist_tag(name, current_version, overrides, &registry_text) {
      Ok(resolution) => resolution,
      Err(err) => {
        log::debug!("{:#}", err);
        return Ok(DependencyOutcome::TagNotFound { tag: err.tag });
      }
    };
  let latest = resolution.diverging_latest().map(|l| l.to_string());
  if resolution.is_up_to_date() {
    return Ok(DependencyOutcome::UpToDate {
      version: resolution.version,
      latest,
    });
  }
  if !package_json.set_dependency_version(group, name, &resolution.version) {
    return Ok(DependencyOutcome::Missing);
  }
  Ok(DependencyOutcome::Updated {
    from: resolution.current_version,
    to: resolution.version,
    latest,
  })
}
