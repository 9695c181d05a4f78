// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Paged linear-scan baseline.
//!
//! Walks every dataset page in order, prices every vector, and keeps the
//! top-k. Exact by construction; its I/O equals the page count, which is the
//! number every index run is judged against.

use crate::error::FarResult;
use crate::geometry::l2_dist;
use crate::page::PagedDataset;
use crate::topk::MaxKList;

/// Exact k-FN by scanning all `n` objects through the paged dataset.
///
/// ## Input
/// - `n`: collection size
/// - `query`: query vector
/// - `data`: open paged dataset
/// - `list`: result buffer; the caller resets it between queries
///
/// ## Output
/// - pages read (the scan's total I/O)
pub fn linear_scan(
    n: usize,
    query: &[f32],
    data: &PagedDataset,
    list: &mut MaxKList,
) -> FarResult<u64> {
    let dim = data.dim();
    let pack = data.pack();
    let total_pages = n.div_ceil(pack);

    let mut page = vec![0.0f32; data.page_floats()];
    let mut id = 0u32;
    for f in 0..total_pages {
        data.read_page(f, &mut page)?;

        let in_page = if f + 1 < total_pages {
            pack
        } else {
            n - pack * (total_pages - 1)
        };
        for j in 0..in_page {
            let vec = &page[j * dim..(j + 1) * dim];
            list.insert(l2_dist(vec, query), id);
            id += 1;
        }
    }

    Ok(total_pages as u64)
}
