// Copyright 2018-2026 the Deno authors. MIT license.

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

/// The dist-tag used when a package has no override.
pub const LATEST_TAG: &str = "latest";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Could not find dist-tag '{tag}' for npm package '{package_name}'.")]
pub struct TagNotFoundError {
  pub package_name: String,
  pub tag: String,
}

/// The dist-tags of a package as printed by `npm dist-tags <name>`.
///
/// Each line of the listing is `<tag>: <version>`. Lines without a
/// separator, or with an empty tag or version, are skipped. When a tag is
/// listed more than once the first entry wins.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DistTags(IndexMap<String, String>);

impl DistTags {
  pub fn parse(text: &str) -> Self {
    let mut tags = IndexMap::new();
    for line in text.lines() {
      let Some((tag, version)) = line.split_once(':') else {
        continue;
      };
      let tag = tag.trim();
      let version = version.trim();
      if tag.is_empty() || version.is_empty() {
        continue;
      }
      tags
        .entry(tag.to_string())
        .or_insert_with(|| version.to_string());
    }
    Self(tags)
  }

  pub fn get(&self, tag: &str) -> Option<&str> {
    self.0.get(tag).map(|v| v.as_str())
  }

  pub fn latest(&self) -> Option<&str> {
    self.get(LATEST_TAG)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }
}

/// Maps a package name to the dist-tag that should be followed for it.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct DistTagOverrides(IndexMap<String, String>);

impl DistTagOverrides {
  /// Gets the dist-tag requested for the package, falling back to "latest".
  pub fn requested_tag(&self, package_name: &str) -> &str {
    self
      .0
      .get(package_name)
      .map(|t| t.as_str())
      .unwrap_or(LATEST_TAG)
  }
}

impl<const N: usize> From<[(&str, &str); N]> for DistTagOverrides {
  fn from(value: [(&str, &str); N]) -> Self {
    Self(
      value
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect(),
    )
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagResolution {
  /// The dist-tag that was followed.
  pub tag: String,
  /// Version the tag points at.
  pub version: String,
  /// Version of the "latest" tag, when the registry lists one.
  pub latest_version: Option<String>,
  pub current_version: String,
}

impl TagResolution {
  pub fn is_up_to_date(&self) -> bool {
    self.version == self.current_version
  }

  /// The "latest" version when it differs from the resolved one.
  pub fn diverging_latest(&self) -> Option<&str> {
    self
      .latest_version
      .as_deref()
      .filter(|latest| *latest != self.version)
  }
}

/// Resolves the version the override policy asks for from the raw output
/// of `npm dist-tags`.
pub fn resolve_dist_tag(
  package_name: &str,
  current_version: &str,
  overrides: &DistTagOverrides,
  registry_text: &str,
) -> Result<TagResolution, TagNotFoundError> {
  let dist_tags = DistTags::parse(registry_text);
  let tag = overrides.requested_tag(package_name);
  let Some(version) = dist_tags.get(tag) else {
    log::debug!(
      "No '{}' dist-tag for {} in {} listed tag(s).",
      tag,
      package_name,
      dist_tags.len()
    );
    return Err(TagNotFoundError {
      package_name: package_name.to_string(),
      tag: tag.to_string(),
    });
  };
  Ok(TagResolution {
    tag: tag.to_string(),
    version: version.to_string(),
    latest_version: dist_tags.latest().map(|v| v.to_string()),
    current_version: current_version.to_string(),
  })
}
