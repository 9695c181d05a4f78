// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! FarBase - external-memory c-approximate k-furthest-neighbor search.
//!
//! A disk-resident index engine for the c-k-AFN problem: given a query
//! vector and `k`, return `k` objects whose Euclidean distances approximate
//! the true top-k furthest distances within factor `c > 1`, reading far
//! fewer pages than a full scan.
//!
//! ## Algorithms
//!
//! - **RQALSH**: `m` random projections, each persisted as a query-aware
//!   B+-tree; search sweeps outward from the query's projected value on both
//!   sides of every tree, counting per-object collisions until frequent
//!   objects qualify as candidates
//! - **RQALSH***: Drusilla selection narrows the collection to `L*M`
//!   boundary candidates, then an inner RQALSH indexes just those
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ CLI (ground-truth / build / query / linear)                │
//! ├────────────────────────────────────────────────────────────┤
//! │ rqalsh::Rqalsh      rqalsh::RqalshStar      linear scan    │
//! │      │                   │    │                  │         │
//! │      ▼                   ▼    ▼                  │         │
//! │ btree::BTree (xm)   drusilla::select             │         │
//! │      │                        │                  │         │
//! ├──────┴────────────────────────┴──────────────────┴─────────┤
//! │ page::BlockFile            page::PagedDataset              │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything below the CLI is synchronous and single-threaded; all state is
//! written once at build time and read-only afterwards, so any number of
//! processes can query the same index directory.

pub mod btree;
pub mod drusilla;
pub mod error;
pub mod geometry;
pub mod linear;
pub mod page;
pub mod rqalsh;
pub mod topk;
pub mod truth;
pub mod vectors;





#[cfg(test)]
#[path = "truth_test.rs"]
mod truth_test;


// Re-export commonly used types
pub use error::{FarError, FarResult};
pub use page::{write_pages, PagedDataset};
pub use rqalsh::{Rqalsh, RqalshStar, SearchCost, CANDIDATES};
pub use topk::{MaxKList, Pair};
pub use truth::MAXK;
pub use vectors::{read_vectors, VectorSet};

/// FarBase version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
