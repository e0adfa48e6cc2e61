// Copyright 2018-2026 the Deno authors. MIT license.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DistTagsFetchError {
  #[error("Failed running the dist-tags query for npm package '{package_name}'.")]
  Io {
    package_name: String,
    #[source]
    source: std::io::Error,
  },
  #[error(
    "The dist-tags query for npm package '{package_name}' exited with {}.",
    describe_exit(.code)
  )]
  Failed {
    package_name: String,
    code: Option<i32>,
  },
}

fn describe_exit(code: &Option<i32>) -> String {
  match code {
    Some(code) => format!("code {code}"),
    None => "a signal".to_string(),
  }
}

/// Fetches the raw dist-tag listing of a package from the registry.
///
/// Implementations are called once per dependency and must return the
/// listing text unmodified (one `<tag>: <version>` pair per line).
pub trait DistTagsFetcher {
  fn fetch_dist_tags(
    &self,
    package_name: &str,
  ) -> Result<String, DistTagsFetchError>;
}

impl<F> DistTagsFetcher for F
where
  F: Fn(&str) -> Result<String, DistTagsFetchError>,
{
  fn fetch_dist_tags(
    &self,
    package_name: &str,
  ) -> Result<String, DistTagsFetchError> {
    (self)(package_name)
  }
}
