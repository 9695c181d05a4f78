// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! In-memory vector collections and the text input format.
//!
//! Data and query sets arrive as text, one object per line:
//! `<ignored-int> v_1 v_2 ... v_d`. The leading integer is a per-line label
//! the pipeline carries but never uses; ids are assigned densely by line
//! order.

use crate::error::{FarError, FarResult};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A dense collection of `n` vectors of fixed dimensionality.
///
/// Stored flat (`n * dim` floats) so projections and distance loops run over
/// contiguous memory.
#[derive(Debug, Clone)]
pub struct VectorSet {
    dim: usize,
    data: Vec<f32>,
}

impl VectorSet {
    /// Create an empty set of the given dimensionality.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            data: Vec::new(),
        }
    }

    /// Build a set from a flat buffer of `n * dim` floats.
    pub fn from_flat(dim: usize, data: Vec<f32>) -> FarResult<Self> {
        if dim == 0 || data.len() % dim != 0 {
            return Err(FarError::InvalidParameter {
                name: "data".to_string(),
                reason: format!("{} floats do not tile dimension {}", data.len(), dim),
            });
        }
        Ok(Self { dim, data })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of vectors.
    pub fn len(&self) -> usize {
        self.data.len() / self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow vector `i`.
    pub fn get(&self, i: usize) -> &[f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    /// Append one vector.
    pub fn push(&mut self, v: &[f32]) {
        debug_assert_eq!(v.len(), self.dim);
        self.data.extend_from_slice(v);
    }

    /// Copy out the subset of vectors named by `ids`, in order.
    pub fn subset(&self, ids: &[u32]) -> VectorSet {
        let mut out = VectorSet::new(self.dim);
        for &id in ids {
            out.push(self.get(id as usize));
        }
        out
    }
}

/// Read `n` vectors of dimension `dim` from a text file.
///
/// ## Input
/// - `path`: text file, one object per line, leading label ignored
/// - `n`, `dim`: declared cardinality and dimensionality
///
/// ## Error Conditions
/// - unreadable file
/// - malformed line (missing or non-numeric coordinate)
/// - fewer than `n` usable lines
pub fn read_vectors(path: &Path, n: usize, dim: usize) -> FarResult<VectorSet> {
    let file = File::open(path).map_err(|e| FarError::IoError {
        operation: format!("open '{}'", path.display()),
        reason: e.to_string(),
    })?;
    let reader = BufReader::new(file);

    let mut set = VectorSet::new(dim);
    let mut row = vec![0.0f32; dim];

    for (line_no, line) in reader.lines().enumerate() {
        if set.len() == n {
            break;
        }
        let line = line.map_err(|e| FarError::IoError {
            operation: format!("read '{}'", path.display()),
            reason: e.to_string(),
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let mut fields = line.split_whitespace();
        // Leading label, present but unused.
        fields.next();

        for (j, slot) in row.iter_mut().enumerate() {
            let field = fields.next().ok_or_else(|| FarError::ParseError {
                path: path.display().to_string(),
                reason: format!("line {}: missing coordinate {}", line_no + 1, j + 1),
            })?;
            *slot = field.parse::<f32>().map_err(|e| FarError::ParseError {
                path: path.display().to_string(),
                reason: format!("line {}: '{}': {}", line_no + 1, field, e),
            })?;
        }
        set.push(&row);
    }

    if set.len() != n {
        return Err(FarError::CardinalityMismatch {
            path: path.display().to_string(),
            expected: n,
            actual: set.len(),
        });
    }
    Ok(set)
}
