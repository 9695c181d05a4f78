// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! RQALSH*: two-level c-k-AFN index.
//!
//! Level one is a Drusilla selection of `L*M` boundary candidates; level two
//! is a plain RQALSH index built over just those vectors (skipped when the
//! candidate set is small enough to scan outright). At query time the inner
//! index works in candidate-local ids and resolves them through the stored
//! id list.
//!
//! ## Directory Layout
//!
//! ```text
//! <of>/rqalsh_star_L=<L>_M=<M>/
//!   rqalsh_star_para     parameter blob + candidate ids (+ CRC32)
//!   rqalsh/              inner RQALSH (only when L*M > CANDIDATES)
//! ```

use crate::drusilla;
use crate::error::{FarError, FarResult};
use crate::geometry::l2_dist;
use crate::page::PagedDataset;
use crate::rqalsh::index::{Rqalsh, SearchCost};
use crate::rqalsh::{params, CANDIDATES};
use crate::topk::MaxKList;
use crate::vectors::VectorSet;
use log::info;
use rand::rngs::StdRng;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Name of the parameter blob inside a star index directory.
pub const STAR_PARAMS_FILE: &str = "rqalsh_star_para";

/// Subdirectory holding the inner RQALSH index.
const INNER_DIR: &str = "rqalsh";

/// Two-level boundary-candidate index.
#[derive(Debug)]
pub struct RqalshStar {
    n: usize,
    dim: usize,
    page_size: usize,
    nproj: usize,
    per_proj: usize,
    beta_raw: usize,
    delta: f32,
    ratio: f32,
    cand: Vec<u32>,
    inner: Option<Rqalsh>,
}

impl RqalshStar {
    /// Build the index over `data` in `dir`.
    ///
    /// ## Input
    /// - `data`: the full collection
    /// - `page_size`: page size `B` in bytes
    /// - `nproj` (`L`), `per_proj` (`M`): Drusilla shape
    /// - `beta_raw`, `delta`, `ratio`: knobs handed to the inner RQALSH
    /// - `dir`: index directory, created if missing
    ///
    /// ## Error Conditions
    /// - knob out of range, or `L*M` larger than the collection
    /// - blob already present in `dir`
    pub fn build(
        data: &VectorSet,
        page_size: usize,
        nproj: usize,
        per_proj: usize,
        beta_raw: usize,
        delta: f32,
        ratio: f32,
        dir: &Path,
        rng: &mut StdRng,
    ) -> FarResult<Self> {
        let n = data.len();
        let dim = data.dim();
        params::validate(n, dim, page_size, beta_raw, delta, ratio)?;

        fs::create_dir_all(dir).map_err(|e| FarError::IoError {
            operation: format!("create '{}'", dir.display()),
            reason: e.to_string(),
        })?;

        let cand = drusilla::select(data, nproj, per_proj)?;
        info!(
            "Drusilla selected {} boundary candidates (L={} M={})",
            cand.len(),
            nproj,
            per_proj
        );

        let star = Self {
            n,
            dim,
            page_size,
            nproj,
            per_proj,
            beta_raw,
            delta,
            ratio,
            cand,
            inner: None,
        };
        star.write_params(dir)?;

        let inner = if star.cand.len() > CANDIDATES {
            let subset = data.subset(&star.cand);
            Some(Rqalsh::build(
                &subset,
                page_size,
                beta_raw,
                delta,
                ratio,
                &dir.join(INNER_DIR),
                rng,
            )?)
        } else {
            info!(
                "candidate set of {} fits the scan budget, no inner index",
                star.cand.len()
            );
            None
        };

        Ok(Self { inner, ..star })
    }

    /// Load a previously built index from `dir`.
    pub fn load(dir: &Path) -> FarResult<Self> {
        let mut star = Self::read_params(dir)?;
        if star.cand.len() > CANDIDATES {
            star.inner = Some(Rqalsh::load(&dir.join(INNER_DIR))?);
        }
        Ok(star)
    }

    /// Number of selected candidates (`L*M`).
    pub fn num_candidates(&self) -> usize {
        self.cand.len()
    }

    pub fn candidates(&self) -> &[u32] {
        &self.cand
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// c-k-AFN search.
    ///
    /// Delegates to the inner index when the candidate set exceeds the scan
    /// budget for this `k`; otherwise prices every candidate directly (one
    /// page read each).
    pub fn kfn(
        &self,
        k: usize,
        query: &[f32],
        data: &mut PagedDataset,
        list: &mut MaxKList,
    ) -> FarResult<SearchCost> {
        if self.cand.len() > CANDIDATES + k - 1 {
            if let Some(inner) = &self.inner {
                return inner.kfn_mapped(k, query, &self.cand, data, list);
            }
        }

        let mut buf = vec![0.0f32; self.dim];
        for &id in &self.cand {
            data.read_into(id, &mut buf)?;
            list.insert(l2_dist(&buf, query), id);
        }
        Ok(SearchCost {
            pages: self.cand.len() as u64,
            dists: 0,
        })
    }

    /// Blob layout: `n d B L M beta` (i32), `delta c` (f32), candidate ids
    /// (i32 each), CRC32 tail.
    fn write_params(&self, dir: &Path) -> FarResult<()> {
        let path = dir.join(STAR_PARAMS_FILE);
        if path.exists() {
            return Err(FarError::IndexExists {
                path: path.display().to_string(),
            });
        }

        let mut blob = Vec::with_capacity(32 + self.cand.len() * 4 + 4);
        for v in [
            self.n as i32,
            self.dim as i32,
            self.page_size as i32,
            self.nproj as i32,
            self.per_proj as i32,
            self.beta_raw as i32,
        ] {
            blob.extend_from_slice(&v.to_le_bytes());
        }
        blob.extend_from_slice(&self.delta.to_le_bytes());
        blob.extend_from_slice(&self.ratio.to_le_bytes());
        for &id in &self.cand {
            blob.extend_from_slice(&(id as i32).to_le_bytes());
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

    fn read_params(dir: &Path) -> FarResult<Self> {
        let path: PathBuf = dir.join(STAR_PARAMS_FILE);
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

        if blob.len() < 36 {
            return Err(corrupted(format!(
                "{} bytes is shorter than the header",
                blob.len()
            )));
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
        let nproj = int_at(12) as usize;
        let per_proj = int_at(16) as usize;
        let beta_raw = int_at(20) as usize;
        let delta = float_at(24);
        let ratio = float_at(28);

        let n_cand = nproj * per_proj;
        if payload.len() != 32 + n_cand * 4 {
            return Err(corrupted(format!(
                "candidate list truncated: {} bytes, expected {}",
                payload.len(),
                32 + n_cand * 4
            )));
        }
        let mut cand = Vec::with_capacity(n_cand);
        for i in 0..n_cand {
            cand.push(int_at(32 + i * 4) as u32);
        }

        Ok(Self {
            n,
            dim,
            page_size,
            nproj,
            per_proj,
            beta_raw,
            delta,
            ratio,
            cand,
            inner: None,
        })
    }
}
