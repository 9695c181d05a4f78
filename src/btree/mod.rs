// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Query-aware B+-tree over float keys.
//!
//! One tree per random projection, bulk-loaded once from the sorted hash
//! table and read-only afterwards. The leaf layout is query-aware: ids are
//! dense, keys are down-sampled to one representative per 4096-byte run of
//! ids, so the outward sweep can price a whole block of ids with a single
//! key comparison.
//!
//! ## Node Kinds
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ Index node                                           │
//! │  header: level(1) num_entries(4) left(4) right(4)    │
//! │  entries: (key f32, son i32) ascending               │
//! ├──────────────────────────────────────────────────────┤
//! │ Leaf node (level = 0)                                │
//! │  header: level(1) num_entries(4) left(4) right(4)    │
//! │  num_keys(4), key slots (⌈B/4096⌉ × f32, sparse)     │
//! │  ids (num_entries × i32, dense)                      │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Leaves are chained through sibling pointers in key order; the sweep never
//! descends twice.

pub mod node;
pub mod tree;

#[cfg(test)]
#[path = "node_test.rs"]
mod node_test;


// Re-export public API
pub use node::{IndexNode, LeafNode, Node, LEAF_SEGMENT_BYTES};
pub use tree::BTree;
