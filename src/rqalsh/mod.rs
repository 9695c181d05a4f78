// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! RQALSH: reverse query-aware LSH for c-k-AFN search.
//!
//! Two index flavours share this module:
//!
//! - `Rqalsh`: `m` random projections, each persisted as a query-aware
//!   B+-tree, searched by a bidirectional outward sweep with dynamic
//!   separation counting
//! - `RqalshStar`: a two-level variant that first narrows the dataset to
//!   `L*M` boundary candidates via Drusilla selection, then runs an inner
//!   `Rqalsh` over just those
//!
//! ## Query Data Flow
//!
//! ```text
//! query ──projections──▶ m hash values
//!        ──B+-tree sweep (outward from each hash value)──▶ frequent ids
//!        ──paged dataset fetch──▶ Euclidean distances ──▶ MaxKList
//! ```

pub mod index;
pub mod params;
pub mod star;


#[cfg(test)]
#[path = "params_test.rs"]
mod params_test;


// Re-export public API
pub use index::{Rqalsh, SearchCost};
pub use params::RqalshParams;
pub use star::RqalshStar;

/// Base candidate budget per query; a search touches at most
/// `CANDIDATES + k - 1` full vectors.
pub const CANDIDATES: usize = 100;
