// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! `linear`: exact k-FN baseline over the paged dataset.

use crate::commands::evaluate;
use anyhow::Context;
use farbase::linear::linear_scan;
use farbase::page::PagedDataset;
use farbase::truth;
use farbase::vectors::read_vectors;
use log::info;
use std::path::Path;
use std::time::Instant;

#[allow(clippy::too_many_arguments)]
pub fn execute(
    n: usize,
    qn: usize,
    d: usize,
    page: usize,
    qs: &Path,
    ts: &Path,
    df: &Path,
    of: &Path,
) -> anyhow::Result<()> {
    let start = Instant::now();
    let queries = read_vectors(qs, qn, d).context("reading query set")?;
    let truth_rows = truth::read(ts, qn).context("reading truth set")?;
    info!(
        "read {} queries and truth in {:.3}s",
        qn,
        start.elapsed().as_secs_f64()
    );

    let data = PagedDataset::open(df, d, page).context("opening paged dataset")?;
    std::fs::create_dir_all(of).with_context(|| format!("create '{}'", of.display()))?;

    evaluate(
        "Linear Scan",
        &queries,
        &truth_rows,
        &of.join("linear.out"),
        |_k, q, list| Ok(linear_scan(n, q, &data, list)?),
    )
}
