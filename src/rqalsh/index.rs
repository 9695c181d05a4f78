// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! The RQALSH index: build, load, and the c-k-AFN sweep.
//!
//! ## Build
//!
//! For each of the `m` projections the whole collection is hashed to
//! scalars, sorted, and bulk-loaded into one query-aware B+-tree
//! (`<dir>/<i>.rqalsh`). The derived parameters and the projection matrix go
//! to `<dir>/para` first, so a half-finished build is detected by the
//! refuse-to-overwrite check on the next attempt.
//!
//! ## Search
//!
//! Per projection the sweep keeps two cursors seeded at the extreme leaves
//! of the tree and walks them toward the query's hash value, one
//! down-sampled key segment at a time. An id whose frequency across
//! projections exceeds `l` becomes a candidate: its vector is fetched (one
//! page), its true distance inserted into the top-k buffer. The search
//! radius shrinks by factor `c` per round until the k-th buffered distance
//! certifies the approximation or the candidate budget is spent.
//!
//! Cursor state is owned: when both cursors of a single-leaf tree start on
//! the same leaf, each holds its own copy, so releasing one can never
//! invalidate the other, and every leaf buffer is dropped by the time the
//! query returns on any exit path.

use crate::btree::{BTree, LeafNode, Node};
use crate::error::{FarError, FarResult};
use crate::geometry::{l2_dist, FLOAT_ZERO};
use crate::page::PagedDataset;
use crate::rqalsh::params::RqalshParams;
use crate::rqalsh::CANDIDATES;
use crate::topk::{MaxKList, Pair};
use crate::vectors::VectorSet;
use log::{debug, info};
use rand::rngs::StdRng;
use std::fs;
use std::path::Path;

/// Per-query I/O tally. `pages` counts B+-tree node reads, `dists` counts
/// full-vector fetches (one page each); the reported I/O is their sum.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchCost {
    pub pages: u64,
    pub dists: u64,
}

impl SearchCost {
    pub fn total(&self) -> u64 {
        self.pages + self.dists
    }
}

/// One sweep cursor: an owned leaf plus a position inside it.
///
/// `key_pos` indexes the down-sampled key array, `id_pos` the dense id
/// array, `len` is the number of ids left in the current segment. A cursor
/// with no leaf is exhausted.
#[derive(Debug, Clone, Default)]
struct SweepPtr {
    leaf: Option<LeafNode>,
    key_pos: usize,
    id_pos: usize,
    len: usize,
}

impl SweepPtr {
    fn exhausted() -> Self {
        Self::default()
    }

    fn at_segment(leaf: LeafNode, key_pos: usize, id_pos: usize) -> Self {
        let len = leaf.segment_len(key_pos);
        Self {
            leaf: Some(leaf),
            key_pos,
            id_pos,
            len,
        }
    }

    /// Projected distance from the query's hash value to this cursor's
    /// segment key, `None` once exhausted.
    fn proj_dist(&self, q_val: f32) -> Option<f32> {
        self.leaf
            .as_ref()
            .map(|leaf| (leaf.get_key(self.key_pos) - q_val).abs())
    }

    fn clear(&mut self) {
        *self = Self::exhausted();
    }
}

/// Query-aware LSH index for c-k-AFN search.
#[derive(Debug)]
pub struct Rqalsh {
    params: RqalshParams,
    trees: Vec<BTree>,
}

impl Rqalsh {
    /// Build an index over `data` in `dir`.
    ///
    /// ## Input
    /// - `data`: the collection to index
    /// - `page_size`: page size `B` in bytes
    /// - `beta_raw`, `delta`, `ratio`: user knobs (see `RqalshParams`)
    /// - `dir`: index directory, created if missing
    /// - `rng`: source for the projection draws
    ///
    /// ## Error Conditions
    /// - parameter out of range
    /// - parameter blob already present in `dir`
    /// - page size below the B+-tree capacity floors
    pub fn build(
        data: &VectorSet,
        page_size: usize,
        beta_raw: usize,
        delta: f32,
        ratio: f32,
        dir: &Path,
        rng: &mut StdRng,
    ) -> FarResult<Self> {
        let n = data.len();
        let dim = data.dim();
        let params = RqalshParams::derive(n, dim, page_size, beta_raw, delta, ratio, rng)?;

        fs::create_dir_all(dir).map_err(|e| FarError::IoError {
            operation: format!("create '{}'", dir.display()),
            reason: e.to_string(),
        })?;
        params.write(dir)?;
        params.log_summary(dir);

        let mut trees = Vec::with_capacity(params.m);
        let mut table: Vec<Pair> = Vec::with_capacity(n);
        for i in 0..params.m {
            table.clear();
            for j in 0..n {
                table.push(Pair {
                    key: params.hash_value(i, data.get(j)),
                    id: j as u32,
                });
            }
            table.sort_by(Pair::cmp_key_asc);

            let path = dir.join(format!("{}.rqalsh", i));
            trees.push(BTree::build(&path, page_size, &table)?);
            debug!("bulk-loaded hash table {} of {}", i + 1, params.m);
        }
        info!("built RQALSH index with {} trees in '{}'", params.m, dir.display());

        Ok(Self { params, trees })
    }

    /// Load a previously built index from `dir`.
    pub fn load(dir: &Path) -> FarResult<Self> {
        let params = RqalshParams::read(dir)?;
        params.log_summary(dir);

        let mut trees = Vec::with_capacity(params.m);
        for i in 0..params.m {
            trees.push(BTree::open(dir.join(format!("{}.rqalsh", i)))?);
        }
        Ok(Self { params, trees })
    }

    pub fn params(&self) -> &RqalshParams {
        &self.params
    }

    /// c-k-AFN search.
    ///
    /// ## Input
    /// - `k`: result count
    /// - `query`: query vector, `dim` floats
    /// - `data`: paged dataset the candidate vectors are fetched from
    /// - `list`: result buffer; the caller resets it between queries
    ///
    /// ## Output
    /// - the query's I/O tally; `list` holds up to `k` `(distance, id)` pairs
    pub fn kfn(
        &self,
        k: usize,
        query: &[f32],
        data: &mut PagedDataset,
        list: &mut MaxKList,
    ) -> FarResult<SearchCost> {
        self.kfn_inner(k, query, None, data, list)
    }

    /// c-k-AFN search with id remapping: candidate ids index `id_map`, whose
    /// entries are the dataset-level ids. Used by the two-level index so its
    /// inner ids resolve back to original objects.
    pub fn kfn_mapped(
        &self,
        k: usize,
        query: &[f32],
        id_map: &[u32],
        data: &mut PagedDataset,
        list: &mut MaxKList,
    ) -> FarResult<SearchCost> {
        self.kfn_inner(k, query, Some(id_map), data, list)
    }

    fn kfn_inner(
        &self,
        k: usize,
        query: &[f32],
        id_map: Option<&[u32]>,
        data: &mut PagedDataset,
        list: &mut MaxKList,
    ) -> FarResult<SearchCost> {
        let m = self.params.m;
        let l = self.params.l as u32;
        let w = self.params.w;
        let ratio = self.params.ratio;
        let budget = (CANDIDATES + k - 1) as u64;

        let mut cost = SearchCost::default();
        let mut freq = vec![0u32; self.params.n];
        let mut checked = vec![false; self.params.n];
        let mut vec_buf = vec![0.0f32; data.dim()];

        // Hash the query and seed both cursors of every projection at the
        // extreme leaves.
        let mut q_vals = Vec::with_capacity(m);
        let mut left = Vec::with_capacity(m);
        let mut right = Vec::with_capacity(m);
        for i in 0..m {
            q_vals.push(self.params.hash_value(i, query));
            let (lp, rp) = self.init_cursors(&self.trees[i], &mut cost)?;
            left.push(lp);
            right.push(rp);
        }

        let mut radius = match initial_radius(&q_vals, &left, &right, w, ratio) {
            Some(r) => r,
            None => return Ok(cost),
        };
        let mut bucket = w * radius / 2.0;
        let mut kdist = f32::MIN;

        loop {
            let mut active = vec![true; m];
            let mut num_active = m;

            // One round: sweep every projection one segment at a time until
            // all of them fall inside the bucket (or the budget is spent).
            while num_active > 0 {
                for i in 0..m {
                    if !active[i] {
                        continue;
                    }

                    let ld = left[i].proj_dist(q_vals[i]).unwrap_or(-1.0);
                    let rd = right[i].proj_dist(q_vals[i]).unwrap_or(-1.0);

                    if ld > bucket && ld > rd {
                        if let Some(leaf) = left[i].leaf.as_ref() {
                            let start = left[i].id_pos;
                            for off in 0..left[i].len {
                                let id = leaf.entry_id(start + off) as usize;
                                freq[id] += 1;
                                if freq[id] > l && !checked[id] {
                                    checked[id] = true;
                                    let oid = id_map.map_or(id as u32, |map| map[id]);
                                    data.read_into(oid, &mut vec_buf)?;
                                    kdist = list.insert(l2_dist(&vec_buf, query), oid);
                                    cost.dists += 1;
                                    if cost.dists >= budget {
                                        break;
                                    }
                                }
                            }
                        }
                        self.advance_left(&self.trees[i], &mut left[i], &mut cost)?;
                    } else if rd > bucket && ld <= rd {
                        if let Some(leaf) = right[i].leaf.as_ref() {
                            let end = right[i].id_pos;
                            for off in 0..right[i].len {
                                let id = leaf.entry_id(end - off) as usize;
                                freq[id] += 1;
                                if freq[id] > l && !checked[id] {
                                    checked[id] = true;
                                    let oid = id_map.map_or(id as u32, |map| map[id]);
                                    data.read_into(oid, &mut vec_buf)?;
                                    kdist = list.insert(l2_dist(&vec_buf, query), oid);
                                    cost.dists += 1;
                                    if cost.dists >= budget {
                                        break;
                                    }
                                }
                            }
                        }
                        self.advance_right(&self.trees[i], &mut right[i], &mut cost)?;
                    } else {
                        active[i] = false;
                        num_active -= 1;
                    }

                    if num_active == 0 || cost.dists >= budget {
                        break;
                    }
                }
                if cost.dists >= budget {
                    break;
                }
            }

            // Quality stop: the k-th buffered distance certifies the
            // c-approximation once at least k candidates were priced.
            if kdist > radius / ratio && cost.dists >= k as u64 {
                break;
            }
            // Budget stop: best effort with what the buffer holds.
            if cost.dists >= budget {
                break;
            }
            // Both sweep fronts ran off every tree: nothing left to find.
            if left.iter().all(|p| p.leaf.is_none()) && right.iter().all(|p| p.leaf.is_none()) {
                break;
            }

            radius /= ratio;
            // A cursor sitting exactly on the query's hash value can never
            // exceed the bucket; the floor keeps such rounds from looping.
            if radius < f32::MIN_POSITIVE {
                break;
            }
            bucket = w * radius / 2.0;
            debug!("radius shrunk to {}, k-dist {}", radius, kdist);
        }

        Ok(cost)
    }

    /// Seed the left and right cursors of one tree, counting node reads.
    fn init_cursors(&self, tree: &BTree, cost: &mut SearchCost) -> FarResult<(SweepPtr, SweepPtr)> {
        cost.pages += 1;
        match tree.read_node(tree.root())? {
            Node::Leaf(leaf) => {
                // Single-leaf tree: both cursors share the leaf; each takes
                // its own copy.
                let num_keys = leaf.num_keys();
                let num_entries = leaf.num_entries();
                if num_keys > 1 {
                    let lp = SweepPtr::at_segment(leaf.clone(), 0, 0);
                    let rp = SweepPtr::at_segment(leaf, num_keys - 1, num_entries - 1);
                    Ok((lp, rp))
                } else {
                    let lp = SweepPtr::at_segment(leaf, 0, 0);
                    Ok((lp, SweepPtr::exhausted()))
                }
            }
            Node::Index(root) => {
                // Leftmost descent.
                let mut node = root;
                let left_leaf = loop {
                    cost.pages += 1;
                    match tree.read_node(node.son(0))? {
                        Node::Index(next) => node = next,
                        Node::Leaf(leaf) => break leaf,
                    }
                };
                let lp = SweepPtr::at_segment(left_leaf, 0, 0);

                // Rightmost descent, starting again from the root (each node
                // read is a page, same as the left side).
                cost.pages += 1;
                let mut node = match tree.read_node(tree.root())? {
                    Node::Index(ix) => ix,
                    Node::Leaf(_) => {
                        return Err(FarError::CorruptedIndex {
                            path: String::new(),
                            reason: "root block read as leaf after index descent".to_string(),
                        })
                    }
                };
                let right_leaf = loop {
                    cost.pages += 1;
                    match tree.read_node(node.son(node.num_entries() - 1))? {
                        Node::Index(next) => node = next,
                        Node::Leaf(leaf) => break leaf,
                    }
                };
                let key_pos = right_leaf.num_keys() - 1;
                let id_pos = right_leaf.num_entries() - 1;
                let rp = SweepPtr::at_segment(right_leaf, key_pos, id_pos);

                Ok((lp, rp))
            }
        }
    }

    /// Move the left cursor one segment toward higher keys, crossing to the
    /// right sibling when the leaf is spent.
    fn advance_left(&self, tree: &BTree, ptr: &mut SweepPtr, cost: &mut SearchCost) -> FarResult<()> {
        let Some(leaf) = ptr.leaf.as_ref() else {
            return Ok(());
        };

        if ptr.key_pos + 1 < leaf.num_keys() {
            ptr.key_pos += 1;
            ptr.id_pos = ptr.key_pos * LeafNode::increment();
            ptr.len = leaf.segment_len(ptr.key_pos);
        } else {
            match leaf.right_sibling() {
                Some(next) => {
                    let next_leaf = tree.read_leaf(next)?;
                    cost.pages += 1;
                    *ptr = SweepPtr::at_segment(next_leaf, 0, 0);
                }
                None => ptr.clear(),
            }
        }
        Ok(())
    }

    /// Move the right cursor one segment toward lower keys, crossing to the
    /// left sibling when the leaf is spent.
    fn advance_right(&self, tree: &BTree, ptr: &mut SweepPtr, cost: &mut SearchCost) -> FarResult<()> {
        let Some(leaf) = ptr.leaf.as_ref() else {
            return Ok(());
        };

        if ptr.key_pos > 0 {
            ptr.key_pos -= 1;
            ptr.id_pos = ptr.key_pos * LeafNode::increment() + LeafNode::increment() - 1;
            ptr.len = LeafNode::increment();
        } else {
            match leaf.left_sibling() {
                Some(prev) => {
                    let prev_leaf = tree.read_leaf(prev)?;
                    cost.pages += 1;
                    let key_pos = prev_leaf.num_keys() - 1;
                    let id_pos = prev_leaf.num_entries() - 1;
                    *ptr = SweepPtr::at_segment(prev_leaf, key_pos, id_pos);
                }
                None => ptr.clear(),
            }
        }
        Ok(())
    }
}

/// Starting radius: the smallest power of `c` whose bucket spans the median
/// projected distance between the query and the trees' extreme keys.
fn initial_radius(
    q_vals: &[f32],
    left: &[SweepPtr],
    right: &[SweepPtr],
    w: f32,
    ratio: f32,
) -> Option<f32> {
    let mut dists: Vec<f32> = Vec::with_capacity(2 * q_vals.len());
    for i in 0..q_vals.len() {
        if let Some(d) = left[i].proj_dist(q_vals[i]) {
            dists.push(d);
        }
        if let Some(d) = right[i].proj_dist(q_vals[i]) {
            dists.push(d);
        }
    }
    if dists.is_empty() {
        return None;
    }

    dists.sort_by(f32::total_cmp);
    let num = dists.len();
    let med = if num % 2 == 0 {
        (dists[num / 2 - 1] + dists[num / 2]) / 2.0
    } else {
        dists[num / 2]
    };

    // A zero median would send the kappa logarithm to -inf.
    let med = med.max(FLOAT_ZERO);
    let kappa = ((2.0 * med / w).ln() / ratio.ln()).ceil() as i32;
    Some(ratio.powi(kappa))
}

#[cfg(test)]
pub(crate) fn initial_radius_for_test(med: f32, w: f32, ratio: f32) -> f32 {
    let kappa = ((2.0 * med / w).ln() / ratio.ln()).ceil() as i32;
    ratio.powi(kappa)
}
