// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! `build` / `build-star`: write the paged dataset and the index artifacts.
//!
//! The RNG behind the random projections is seeded from the wall clock at
//! each invocation, so rebuilding after removing an index directory draws
//! fresh projections.

use anyhow::Context;
use farbase::page::write_pages;
use farbase::rqalsh::{Rqalsh, RqalshStar};
use farbase::vectors::read_vectors;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// RNG seeded from the wall clock.
fn clock_rng() -> StdRng {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as u64);
    StdRng::seed_from_u64(nanos)
}

/// Read the text data set and lay it out as pages under `df`.
fn prepare_dataset(
    n: usize,
    d: usize,
    page: usize,
    ds: &Path,
    df: &Path,
) -> anyhow::Result<farbase::vectors::VectorSet> {
    let start = Instant::now();
    let data = read_vectors(ds, n, d).context("reading data set")?;
    info!("read {} objects in {:.3}s", n, start.elapsed().as_secs_f64());

    let start = Instant::now();
    let pages = write_pages(&data, page, df).context("writing paged dataset")?;
    info!(
        "wrote {} dataset pages in {:.3}s under '{}'",
        pages,
        start.elapsed().as_secs_f64(),
        df.display()
    );
    Ok(data)
}

/// Record the indexing time next to the index directory.
fn write_timing(path: &Path, seconds: f64) -> anyhow::Result<()> {
    let mut file = fs::File::create(path)
        .with_context(|| format!("create '{}'", path.display()))?;
    writeln!(file, "Indexing Time: {:.6} seconds", seconds)
        .with_context(|| format!("write '{}'", path.display()))?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn execute(
    n: usize,
    d: usize,
    page: usize,
    beta: usize,
    delta: f32,
    c: f32,
    ds: &Path,
    df: &Path,
    of: &Path,
) -> anyhow::Result<()> {
    let data = prepare_dataset(n, d, page, ds, df)?;
    fs::create_dir_all(of).with_context(|| format!("create '{}'", of.display()))?;

    let start = Instant::now();
    let mut rng = clock_rng();
    Rqalsh::build(&data, page, beta, delta, c, &of.join("rqalsh"), &mut rng)
        .context("building RQALSH index")?;
    let seconds = start.elapsed().as_secs_f64();
    info!("indexing time: {:.3}s", seconds);

    write_timing(&of.join("rqalsh.index"), seconds)
}

#[allow(clippy::too_many_arguments)]
pub fn execute_star(
    n: usize,
    d: usize,
    page: usize,
    l: usize,
    m: usize,
    beta: usize,
    delta: f32,
    c: f32,
    ds: &Path,
    df: &Path,
    of: &Path,
) -> anyhow::Result<()> {
    let data = prepare_dataset(n, d, page, ds, df)?;
    fs::create_dir_all(of).with_context(|| format!("create '{}'", of.display()))?;

    let start = Instant::now();
    let mut rng = clock_rng();
    let dir = of.join(format!("rqalsh_star_L={}_M={}", l, m));
    RqalshStar::build(&data, page, l, m, beta, delta, c, &dir, &mut rng)
        .context("building RQALSH* index")?;
    let seconds = start.elapsed().as_secs_f64();
    info!("indexing time: {:.3}s", seconds);

    write_timing(&of.join(format!("rqalsh_star_L={}_M={}.index", l, m)), seconds)
}
