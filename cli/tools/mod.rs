// Copyright 2018-2026 the Deno authors. MIT license.

pub mod refresh;
