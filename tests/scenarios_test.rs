// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end scenarios over the library API, each with a fixed seed.

use farbase::geometry::l2_dist;
use farbase::page::{write_pages, PagedDataset};
use farbase::rqalsh::{Rqalsh, RqalshStar, CANDIDATES};
use farbase::topk::MaxKList;
use farbase::truth;
use farbase::vectors::VectorSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use tempfile::tempdir;

fn uniform_cube(n: usize, dim: usize, seed: u64) -> VectorSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut set = VectorSet::new(dim);
    for _ in 0..n {
        let v: Vec<f32> = (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect();
        set.push(&v);
    }
    set
}

/// Synthetic cube: ground truth at the origin is the largest norm, and the
/// RQALSH top-1 lands within factor c of it.
#[test]
fn synthetic_cube_end_to_end() {
    let dir = tempdir().unwrap();
    let data = uniform_cube(1000, 8, 0xC0FFEE);
    write_pages(&data, 4096, dir.path()).unwrap();

    let origin = [0.0f32; 8];
    let max_norm = (0..1000)
        .map(|i| l2_dist(data.get(i), &origin))
        .fold(f32::MIN, f32::max);

    // Exact truth: top-1 distance is the largest norm.
    let mut queries = VectorSet::new(8);
    queries.push(&origin);
    let truth_path = dir.path().join("truth.txt");
    truth::generate(&data, &queries, &truth_path).unwrap();
    let rows = truth::read(&truth_path, 1).unwrap();
    assert!((rows[0][0].key - max_norm).abs() < 1e-4);

    // RQALSH with c=2, beta=100, delta=0.49.
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let index = Rqalsh::build(&data, 4096, 100, 0.49, 2.0, dir.path(), &mut rng).unwrap();

    let mut ds = PagedDataset::open(dir.path(), 8, 4096).unwrap();
    let mut list = MaxKList::new(1);
    index.kfn(1, &origin, &mut ds, &mut list).unwrap();

    assert_eq!(list.len(), 1);
    assert!(
        list.ith_key(0) * 2.0 >= max_norm,
        "top-1 {} misses the c-bound against {}",
        list.ith_key(0),
        max_norm
    );
}

/// Collinear spikes: RQALSH* selects the four boundary spikes and returns
/// them all at distance exactly 10.
#[test]
fn collinear_spikes_star() {
    let dir = tempdir().unwrap();

    let mut data = VectorSet::new(2);
    for v in [
        [10.0f32, 0.0],
        [-10.0, 0.0],
        [0.0, 10.0],
        [0.0, -10.0],
        [1.0, 1.0],
        [-1.0, -1.0],
    ] {
        data.push(&v);
    }
    write_pages(&data, 4096, dir.path()).unwrap();

    let mut rng = StdRng::seed_from_u64(99);
    let star =
        RqalshStar::build(&data, 4096, 2, 2, 2, 0.49, 2.0, dir.path(), &mut rng).unwrap();

    let picked: HashSet<u32> = star.candidates().iter().copied().collect();
    assert!(picked.is_subset(&HashSet::from([0, 1, 2, 3])));
    assert_eq!(picked.len(), 4);

    let mut ds = PagedDataset::open(dir.path(), 2, 4096).unwrap();
    let mut list = MaxKList::new(4);
    star.kfn(4, &[0.0, 0.0], &mut ds, &mut list).unwrap();

    assert_eq!(list.len(), 4);
    let ids: HashSet<u32> = (0..4).map(|i| list.ith_id(i)).collect();
    assert_eq!(ids, HashSet::from([0, 1, 2, 3]));
    for i in 0..4 {
        assert_eq!(list.ith_key(i), 10.0);
    }
}

/// Budget cap: the sweep never prices more than CANDIDATES + k - 1 vectors,
/// even on a collection much larger than the budget.
#[test]
fn candidate_budget_cap() {
    let dir = tempdir().unwrap();
    let data = uniform_cube(5000, 6, 4242);
    write_pages(&data, 4096, dir.path()).unwrap();

    let mut rng = StdRng::seed_from_u64(4242);
    let index = Rqalsh::build(&data, 4096, 100, 0.49, 2.0, dir.path(), &mut rng).unwrap();

    let mut ds = PagedDataset::open(dir.path(), 6, 4096).unwrap();
    let k = 10;
    for seed in 0..5u64 {
        let mut qrng = StdRng::seed_from_u64(seed);
        let q: Vec<f32> = (0..6).map(|_| qrng.gen_range(-1.0f32..1.0)).collect();

        let mut list = MaxKList::new(k);
        let cost = index.kfn(k, &q, &mut ds, &mut list).unwrap();
        assert!(
            cost.dists <= (CANDIDATES + k - 1) as u64,
            "{} candidates priced",
            cost.dists
        );
        assert_eq!(list.len(), k);
    }
}

/// The index touches far fewer pages than fetching every object would.
#[test]
fn index_reads_fewer_pages_than_scan() {
    let dir = tempdir().unwrap();
    let data = uniform_cube(5000, 6, 777);
    write_pages(&data, 4096, dir.path()).unwrap();

    let mut rng = StdRng::seed_from_u64(777);
    let index = Rqalsh::build(&data, 4096, 100, 0.49, 2.0, dir.path(), &mut rng).unwrap();

    let mut ds = PagedDataset::open(dir.path(), 6, 4096).unwrap();
    let mut list = MaxKList::new(10);
    let cost = index.kfn(10, &[0.0; 6], &mut ds, &mut list).unwrap();

    // A full scan costs n page reads through the object API.
    assert!(cost.total() < 5000);
}
