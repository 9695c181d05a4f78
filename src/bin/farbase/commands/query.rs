// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! `query` / `query-star`: load an index and run the evaluation protocol.

use crate::commands::evaluate;
use anyhow::Context;
use farbase::page::PagedDataset;
use farbase::rqalsh::{Rqalsh, RqalshStar};
use farbase::truth;
use farbase::vectors::read_vectors;
use log::info;
use std::path::Path;
use std::time::Instant;

pub fn execute(
    qn: usize,
    d: usize,
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

    let index = Rqalsh::load(&of.join("rqalsh")).context("loading RQALSH index")?;
    let mut data =
        PagedDataset::open(df, d, index.params().page_size).context("opening paged dataset")?;
    std::fs::create_dir_all(of).with_context(|| format!("create '{}'", of.display()))?;

    evaluate(
        "RQALSH",
        &queries,
        &truth_rows,
        &of.join("rqalsh.out"),
        |k, q, list| Ok(index.kfn(k, q, &mut data, list)?.total()),
    )
}

#[allow(clippy::too_many_arguments)]
pub fn execute_star(
    qn: usize,
    d: usize,
    l: usize,
    m: usize,
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

    let dir = of.join(format!("rqalsh_star_L={}_M={}", l, m));
    let index = RqalshStar::load(&dir).context("loading RQALSH* index")?;
    let mut data =
        PagedDataset::open(df, d, index.page_size()).context("opening paged dataset")?;
    std::fs::create_dir_all(of).with_context(|| format!("create '{}'", of.display()))?;

    evaluate(
        "RQALSH*",
        &queries,
        &truth_rows,
        &of.join(format!("rqalsh_star_L={}_M={}.out", l, m)),
        |k, q, list| Ok(index.kfn(k, q, &mut data, list)?.total()),
    )
}
