// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! CLI subcommand implementations.
//!
//! Each query-style command runs the full evaluation protocol: for every
//! `k` in {1, 2, 5, 10} it re-runs all queries, averages overall ratio, I/O,
//! per-query time and recall, prints a console table, and appends one
//! tab-separated line per `k` to the command's output file.

pub mod build;
pub mod linear;
pub mod query;
pub mod truth;

use anyhow::Context;
use farbase::topk::{MaxKList, Pair};
use farbase::truth::recall;
use farbase::vectors::VectorSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

/// Result counts every evaluation sweeps.
const TOP_KS: [usize; 4] = [1, 2, 5, 10];

/// Run `search` for every k and every query, score against the truth rows,
/// and write the `k ratio io time_ms recall` table.
pub(crate) fn evaluate<F>(
    label: &str,
    queries: &VectorSet,
    truth_rows: &[Vec<Pair>],
    out_path: &Path,
    mut search: F,
) -> anyhow::Result<()>
where
    F: FnMut(usize, &[f32], &mut MaxKList) -> anyhow::Result<u64>,
{
    let file = File::create(out_path)
        .with_context(|| format!("create '{}'", out_path.display()))?;
    let mut out = BufWriter::new(file);

    let qn = queries.len();
    println!("c-k-AFN search by {}:", label);
    println!("  Top-k\t\tRatio\t\tI/O\t\tTime (ms)\tRecall");

    for k in TOP_KS {
        let start = Instant::now();
        let mut ratio_sum = 0.0f64;
        let mut recall_sum = 0.0f64;
        let mut io_sum = 0u64;

        for qi in 0..qn {
            let mut list = MaxKList::new(k);
            io_sum += search(k, queries.get(qi), &mut list)?;
            recall_sum += recall(k, &truth_rows[qi], &list) as f64;

            let mut ratio = 0.0f64;
            for j in 0..k {
                ratio += truth_rows[qi][j].key as f64 / list.ith_key(j) as f64;
            }
            ratio_sum += ratio / k as f64;
        }

        let ratio = ratio_sum / qn as f64;
        let recall_avg = recall_sum / qn as f64;
        let time_ms = start.elapsed().as_secs_f64() * 1000.0 / qn as f64;
        let io = (io_sum as f64 / qn as f64).ceil() as u64;

        println!(
            "  {:3}\t\t{:.4}\t\t{}\t\t{:.2}\t\t{:.2}%",
            k, ratio, io, time_ms, recall_avg
        );
        writeln!(
            out,
            "{}\t{:.6}\t{}\t{:.6}\t{:.6}",
            k, ratio, io, time_ms, recall_avg
        )
        .with_context(|| format!("write '{}'", out_path.display()))?;
    }
    println!();

    out.flush()
        .with_context(|| format!("flush '{}'", out_path.display()))?;
    Ok(())
}
