// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! `ground-truth`: brute-force the exact top-10 furthest neighbors.

use anyhow::Context;
use farbase::truth;
use farbase::vectors::read_vectors;
use log::info;
use std::path::Path;
use std::time::Instant;

pub fn execute(
    n: usize,
    qn: usize,
    d: usize,
    ds: &Path,
    qs: &Path,
    ts: &Path,
) -> anyhow::Result<()> {
    let start = Instant::now();
    let data = read_vectors(ds, n, d).context("reading data set")?;
    let queries = read_vectors(qs, qn, d).context("reading query set")?;
    info!(
        "read {} data and {} query objects in {:.3}s",
        n,
        qn,
        start.elapsed().as_secs_f64()
    );

    let start = Instant::now();
    truth::generate(&data, &queries, ts).context("writing ground truth")?;
    info!(
        "ground truth for {} queries in {:.3}s -> '{}'",
        qn,
        start.elapsed().as_secs_f64(),
        ts.display()
    );
    Ok(())
}
