// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Drusilla selection of boundary candidates.
//!
//! Greedy data-dependent subset selection: shift the collection to its
//! centroid, repeatedly project along the farthest remaining object, score
//! every object by how well the projection represents it
//! (`|offset| - |distortion|`), keep the top `M` per round, and retire
//! objects whose angle to the projection is small. After `L` rounds the
//! `L*M` picked ids sit near the outer shell of the dataset, which is where
//! furthest neighbors live.
//!
//! ## Round Structure
//!
//! ```text
//! for round in 0..L:
//!   p = y_max / ||y_max||               unit vector to farthest remainder
//!   score_j = |y_j . p| - ||y_j - (y_j . p) p||
//!   pick top M by score (ties by id), set their norm to -1
//!   absorb unpicked j with atan(distortion/|offset|) < 10 deg (norm = 0)
//!   recompute max over remaining norms
//! ```

use crate::error::{FarError, FarResult};
use crate::geometry::{inner_product, FLOAT_ZERO};
use crate::topk::Pair;
use crate::vectors::VectorSet;

/// Angular absorption threshold: objects within 10 degrees of the current
/// projection are considered represented by it.
pub const CLOSE_ANGLE: f32 = 10.0 * std::f32::consts::PI / 180.0;

/// Pick `l * m` distinct boundary candidates from `data`.
///
/// ## Input
/// - `data`: the collection
/// - `l`: number of projection rounds
/// - `m`: candidates kept per round
///
/// ## Output
/// - `l * m` pairwise-distinct object ids, round-major order
///
/// ## Error Conditions
/// - `l * m` exceeds the collection size (distinctness would be impossible)
pub fn select(data: &VectorSet, l: usize, m: usize) -> FarResult<Vec<u32>> {
    let n = data.len();
    let dim = data.dim();
    if l == 0 || m == 0 {
        return Err(FarError::InvalidParameter {
            name: "L/M".to_string(),
            reason: "projection and candidate counts must be positive".to_string(),
        });
    }
    if l * m > n {
        return Err(FarError::InvalidParameter {
            name: "L*M".to_string(),
            reason: format!("{} candidates requested from {} objects", l * m, n),
        });
    }

    // Shift to the centroid.
    let mut centroid = vec![0.0f32; dim];
    for i in 0..n {
        for (c, v) in centroid.iter_mut().zip(data.get(i)) {
            *c += v;
        }
    }
    for c in centroid.iter_mut() {
        *c /= n as f32;
    }

    let mut shift = vec![0.0f32; n * dim];
    for i in 0..n {
        for (j, v) in data.get(i).iter().enumerate() {
            shift[i * dim + j] = v - centroid[j];
        }
    }
    let row = |i: usize| &shift[i * dim..(i + 1) * dim];

    // Norms double as state: positive = live, 0 = absorbed, -1 = picked.
    let mut norm: Vec<f32> = (0..n)
        .map(|i| inner_product(row(i), row(i)).sqrt())
        .collect();
    let mut max_id = argmax(&norm);

    let mut cand: Vec<u32> = Vec::with_capacity(l * m);
    let mut proj = vec![0.0f32; dim];
    let mut score: Vec<Pair> = Vec::with_capacity(n);
    let mut close_angle = vec![false; n];

    for _round in 0..l {
        if norm[max_id] <= FLOAT_ZERO {
            // No usable projection direction remains; fill the leftover
            // slots with the lowest-id unpicked objects to keep the output
            // size and distinctness.
            let mut id = 0u32;
            while cand.len() < l * m {
                if norm[id as usize] >= 0.0 {
                    norm[id as usize] = -1.0;
                    cand.push(id);
                }
                id += 1;
            }
            break;
        }

        for (p, v) in proj.iter_mut().zip(row(max_id)) {
            *p = v / norm[max_id];
        }

        score.clear();
        for j in 0..n {
            close_angle[j] = false;
            let key = if norm[j] > 0.0 {
                let offset = inner_product(row(j), &proj);
                let mut distortion = 0.0f32;
                for (y, p) in row(j).iter().zip(&proj) {
                    let r = y - offset * p;
                    distortion += r * r;
                }
                let distortion = distortion.sqrt();

                if (distortion / offset.abs()).atan() < CLOSE_ANGLE {
                    close_angle[j] = true;
                }
                offset.abs() - distortion.abs()
            } else if norm[j].abs() < FLOAT_ZERO {
                // Absorbed objects rank above picked ones but below any
                // live score.
                f32::MIN / 2.0
            } else {
                f32::MIN
            };
            score.push(Pair { key, id: j as u32 });
        }

        score.sort_by(Pair::cmp_key_desc);
        for pair in score.iter().take(m) {
            cand.push(pair.id);
            norm[pair.id as usize] = -1.0;
        }

        // Retire close-angle objects, then find the next pivot.
        for j in 0..n {
            if norm[j] > 0.0 && close_angle[j] {
                norm[j] = 0.0;
            }
        }
        max_id = argmax(&norm);
    }

    debug_assert_eq!(cand.len(), l * m);
    Ok(cand)
}

fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
