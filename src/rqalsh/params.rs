// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! RQALSH parameter derivation and the persisted parameter blob.
//!
//! From the user-facing knobs `(n, d, B, beta, delta, c)` the index derives
//! its working parameters:
//!
//! ```text
//! w     = sqrt(8 ln c / (c^2 - 1))          bucket width (auto-tuned)
//! p1    = 1 - Phi(w / 2)                    collision prob at distance r
//! p2    = 1 - Phi(w c / 2)                  collision prob at distance c*r
//! eta   = sqrt(ln(2/beta) / ln(1/delta))
//! alpha = (eta p1 + p2) / (1 + eta)         separation frequency ratio
//! m     = ceil((sqrt(ln 2/beta) + sqrt(ln 1/delta))^2 / (2 (p1-p2)^2))
//! l     = ceil(alpha m)                     separation threshold
//! ```
//!
//! The blob is written once per index directory and never overwritten; a
//! CRC32 tail guards the load path.

use crate::error::{FarError, FarResult};
use crate::geometry::{gaussian, inner_product, normal_cdf};
use rand::rngs::StdRng;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

/// Name of the parameter blob inside an index directory.
pub const PARAMS_FILE: &str = "para";

/// Derived parameters plus the projection matrix of one RQALSH index.
#[derive(Debug, Clone)]
pub struct RqalshParams {
    pub n: usize,
    pub dim: usize,
    pub page_size: usize,
    pub m: usize,
    pub l: usize,
    pub ratio: f32,
    pub w: f32,
    pub p1: f32,
    pub p2: f32,
    pub alpha: f32,
    pub beta: f32,
    pub delta: f32,
    /// `m * dim` i.i.d. standard normal coefficients, row per projection.
    pub proj: Vec<f32>,
}

impl RqalshParams {
    /// Derive all working parameters and draw the projection matrix.
    ///
    /// ## Input
    /// - `n`, `dim`: collection shape
    /// - `page_size`: page size `B` in bytes
    /// - `beta_raw`: false-positive numerator; the rate is `beta_raw / n`
    /// - `delta`: error probability in (0, 1)
    /// - `ratio`: approximation ratio `c > 1`
    /// - `rng`: source for the Gaussian draws
    ///
    /// ## Error Conditions
    /// - any knob outside its range
    pub fn derive(
        n: usize,
        dim: usize,
        page_size: usize,
        beta_raw: usize,
        delta: f32,
        ratio: f32,
        rng: &mut StdRng,
    ) -> FarResult<Self> {
        validate(n, dim, page_size, beta_raw, delta, ratio)?;

        let beta = beta_raw as f32 / n as f32;
        let w = (8.0 * ratio.ln() / (ratio * ratio - 1.0)).sqrt();
        let p1 = 1.0 - normal_cdf(w / 2.0);
        let p2 = 1.0 - normal_cdf(w * ratio / 2.0);

        let para1 = (2.0 / beta).ln().sqrt();
        let para2 = (1.0 / delta).ln().sqrt();
        let eta = para1 / para2;
        let alpha = (eta * p1 + p2) / (1.0 + eta);

        let m = ((para1 + para2) * (para1 + para2) / (2.0 * (p1 - p2) * (p1 - p2))).ceil()
            as usize;
        let l = (alpha * m as f32).ceil() as usize;

        let proj = (0..m * dim).map(|_| gaussian(rng)).collect();

        Ok(Self {
            n,
            dim,
            page_size,
            m,
            l,
            ratio,
            w,
            p1,
            p2,
            alpha,
            beta,
            delta,
            proj,
        })
    }

    /// Hash a point under projection `table`.
    pub fn hash_value(&self, table: usize, point: &[f32]) -> f32 {
        let row = &self.proj[table * self.dim..(table + 1) * self.dim];
        inner_product(row, point)
    }

    /// Log the derived parameters the way the build and load paths report
    /// them.
    pub fn log_summary(&self, dir: &Path) {
        log::info!(
            "RQALSH parameters: n={} d={} B={} c={} w={:.4} p1={:.4} p2={:.4} \
             alpha={:.6} beta={:.6} delta={:.2} m={} l={} path='{}'",
            self.n,
            self.dim,
            self.page_size,
            self.ratio,
            self.w,
            self.p1,
            self.p2,
            self.alpha,
            self.beta,
            self.delta,
            self.m,
            self.l,
            dir.display()
        );
    }

    /// Write the blob to `dir/para`, refusing to overwrite.
    ///
    /// ## Error Conditions
    /// - blob already present (the index must be removed to rebuild)
    /// - file creation or write failure
    pub fn write(&self, dir: &Path) -> FarResult<()> {
        let path = dir.join(PARAMS_FILE);
        if path.exists() {
            return Err(FarError::IndexExists {
                path: path.display().to_string(),
            });
        }

        let mut blob = Vec::with_capacity(48 + self.proj.len() * 4 + 4);
        for v in [
            self.n as i32,
            self.dim as i32,
            self.page_size as i32,
            self.m as i32,
            self.l as i32,
        ] {
            blob.extend_from_slice(&v.to_le_bytes());
        }
        for v in [
            self.ratio, self.w, self.p1, self.p2, self.alpha, self.beta, self.delta,
        ] {
            blob.extend_from_slice(&v.to_le_bytes());
        }
        for v in &self.proj {
            blob.extend_from_slice(&v.to_le_bytes());
        }
        let crc = crc32fast::hash(&blob);
        blob.extend_from_slice(&crc.to_le_bytes());

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| FarError::IoError {
                operation: format!("create '{}'", path.display()),
                reason: e.to_string(),
            })?;
        file.write_all(&blob).map_err(|e| FarError::IoError {
            operation: format!("write '{}'", path.display()),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    /// Read the blob from `dir/para`, validating the CRC32 tail.
    pub fn read(dir: &Path) -> FarResult<Self> {
        let path = dir.join(PARAMS_FILE);
        let mut file = File::open(&path).map_err(|e| FarError::IoError {
            operation: format!("open '{}'", path.display()),
            reason: e.to_string(),
        })?;
        let mut blob = Vec::new();
        file.read_to_end(&mut blob).map_err(|e| FarError::IoError {
            operation: format!("read '{}'", path.display()),
            reason: e.to_string(),
        })?;

        let corrupted = |reason: String| FarError::CorruptedIndex {
            path: path.display().to_string(),
            reason,
        };

        if blob.len() < 52 {
            return Err(corrupted(format!("{} bytes is shorter than the header", blob.len())));
        }
        let (payload, tail) = blob.split_at(blob.len() - 4);
        let stored = u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]);
        let computed = crc32fast::hash(payload);
        if stored != computed {
            return Err(corrupted(format!(
                "CRC32 mismatch: stored 0x{:08X}, computed 0x{:08X}",
                stored, computed
            )));
        }

        let int_at = |at: usize| {
            i32::from_le_bytes([payload[at], payload[at + 1], payload[at + 2], payload[at + 3]])
        };
        let float_at = |at: usize| {
            f32::from_le_bytes([payload[at], payload[at + 1], payload[at + 2], payload[at + 3]])
        };

        let n = int_at(0) as usize;
        let dim = int_at(4) as usize;
        let page_size = int_at(8) as usize;
        let m = int_at(12) as usize;
        let l = int_at(16) as usize;

        let ratio = float_at(20);
        let w = float_at(24);
        let p1 = float_at(28);
        let p2 = float_at(32);
        let alpha = float_at(36);
        let beta = float_at(40);
        let delta = float_at(44);

        let expected = 48 + m * dim * 4;
        if payload.len() != expected {
            return Err(corrupted(format!(
                "projection matrix truncated: {} bytes, expected {}",
                payload.len(),
                expected
            )));
        }
        let mut proj = Vec::with_capacity(m * dim);
        for i in 0..m * dim {
            proj.push(float_at(48 + i * 4));
        }

        Ok(Self {
            n,
            dim,
            page_size,
            m,
            l,
            ratio,
            w,
            p1,
            p2,
            alpha,
            beta,
            delta,
            proj,
        })
    }
}

/// Validate the user-facing knobs shared by both index flavours.
pub fn validate(
    n: usize,
    dim: usize,
    page_size: usize,
    beta_raw: usize,
    delta: f32,
    ratio: f32,
) -> FarResult<()> {
    let fail = |name: &str, reason: String| {
        Err(FarError::InvalidParameter {
            name: name.to_string(),
            reason,
        })
    };

    if n == 0 {
        return fail("n", "cardinality must be positive".to_string());
    }
    if dim == 0 {
        return fail("d", "dimensionality must be positive".to_string());
    }
    if page_size == 0 {
        return fail("B", "page size must be positive".to_string());
    }
    if beta_raw == 0 {
        return fail("beta", "false-positive numerator must be positive".to_string());
    }
    if !(delta > 0.0 && delta < 1.0) {
        return fail("delta", format!("{} is outside (0, 1)", delta));
    }
    if ratio <= 1.0 {
        return fail("c", format!("approximation ratio {} must exceed 1", ratio));
    }
    Ok(())
}
