// Copyright 2018-2026 the Deno authors. MIT license.

#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]
#![deny(clippy::unused_async)]
#![deny(clippy::unnecessary_wraps)]

pub mod dist_tags;
pub mod registry;

pub use dist_tags::DistTagOverrides;
pub use dist_tags::DistTags;
pub use dist_tags::LATEST_TAG;
pub use dist_tags::TagNotFoundError;
pub use dist_tags::TagResolution;
pub use dist_tags::resolve_dist_tag;
pub use registry::DistTagsFetchError;
pub use registry::DistTagsFetcher;
