// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Ground-truth generation and recall scoring.
//!
//! The truth file is text: a `qn MAXK` header line, then one line per query
//! holding `MAXK` `(id, distance)` pairs in descending distance order with
//! six decimal digits. Queries against an index are scored against these
//! rows by overall ratio and recall.

use crate::error::{FarError, FarResult};
use crate::geometry::l2_dist;
use crate::topk::{MaxKList, Pair};
use crate::vectors::VectorSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Number of furthest neighbors kept per query in a truth file.
pub const MAXK: usize = 10;

/// Brute-force the exact top-`MAXK` furthest neighbors of every query and
/// write the truth file.
///
/// ## Input
/// - `data`, `queries`: in-memory collections of matching dimensionality
/// - `path`: truth file to create
pub fn generate(data: &VectorSet, queries: &VectorSet, path: &Path) -> FarResult<()> {
    let file = File::create(path).map_err(|e| FarError::IoError {
        operation: format!("create '{}'", path.display()),
        reason: e.to_string(),
    })?;
    let mut out = BufWriter::new(file);
    let write_err = |e: std::io::Error| FarError::IoError {
        operation: format!("write '{}'", path.display()),
        reason: e.to_string(),
    };

    writeln!(out, "{} {}", queries.len(), MAXK).map_err(write_err)?;

    let mut list = MaxKList::new(MAXK);
    for qi in 0..queries.len() {
        list.reset();
        let q = queries.get(qi);
        for j in 0..data.len() {
            list.insert(l2_dist(data.get(j), q), j as u32);
        }

        for i in 0..MAXK {
            let pair = list.ith(i).unwrap_or(Pair { key: 0.0, id: 0 });
            write!(out, "{} {:.6} ", pair.id, pair.key).map_err(write_err)?;
        }
        writeln!(out).map_err(write_err)?;
    }
    out.flush().map_err(write_err)?;
    Ok(())
}

/// Parse a truth file back into per-query rows.
///
/// ## Error Conditions
/// - header disagreeing with `qn` or `MAXK`
/// - malformed pair or short row
pub fn read(path: &Path, qn: usize) -> FarResult<Vec<Vec<Pair>>> {
    let file = File::open(path).map_err(|e| FarError::IoError {
        operation: format!("open '{}'", path.display()),
        reason: e.to_string(),
    })?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();

    let parse_err = |reason: String| FarError::ParseError {
        path: path.display().to_string(),
        reason,
    };

    let header = lines
        .next()
        .ok_or_else(|| parse_err("empty truth file".to_string()))?
        .map_err(|e| parse_err(e.to_string()))?;
    let mut fields = header.split_whitespace();
    let got_qn: usize = fields
        .next()
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| parse_err("bad header".to_string()))?;
    let got_k: usize = fields
        .next()
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| parse_err("bad header".to_string()))?;
    if got_qn != qn || got_k != MAXK {
        return Err(parse_err(format!(
            "header says {} queries of top-{}, expected {} of top-{}",
            got_qn, got_k, qn, MAXK
        )));
    }

    let mut rows = Vec::with_capacity(qn);
    for (qi, line) in lines.take(qn).enumerate() {
        let line = line.map_err(|e| parse_err(e.to_string()))?;
        let mut fields = line.split_whitespace();
        let mut row = Vec::with_capacity(MAXK);
        for i in 0..MAXK {
            let id: u32 = fields
                .next()
                .and_then(|f| f.parse().ok())
                .ok_or_else(|| parse_err(format!("query {}: bad id {}", qi, i)))?;
            let key: f32 = fields
                .next()
                .and_then(|f| f.parse().ok())
                .ok_or_else(|| parse_err(format!("query {}: bad distance {}", qi, i)))?;
            row.push(Pair { key, id });
        }
        rows.push(row);
    }
    if rows.len() != qn {
        return Err(FarError::CardinalityMismatch {
            path: path.display().to_string(),
            expected: qn,
            actual: rows.len(),
        });
    }
    Ok(rows)
}

/// Recall of a result list against one truth row, as a percentage.
///
/// Counts returned distances not smaller than the k-th true distance; exact
/// results score 100. Truth distances passed through the 6-decimal text
/// format can land a hair above the freshly computed f32 value for the same
/// object, so the threshold carries a matching tolerance.
pub fn recall(k: usize, truth_row: &[Pair], list: &MaxKList) -> f32 {
    let threshold = truth_row[k - 1].key;
    let slack = threshold.abs().max(1.0) * 1e-5;

    let mut i = k as isize - 1;
    while i >= 0 && list.ith_key(i as usize) < threshold - slack {
        i -= 1;
    }
    (i + 1) as f32 * 100.0 / k as f32
}
