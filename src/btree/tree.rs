// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Bulk-loaded B+-tree over a block file.
//!
//! `build` consumes a key-ascending hash table once and writes the tree
//! bottom-up; `open` restores a read-only handle. There is no insert or
//! delete path: after a build the file never changes.
//!
//! ## Bulk Load
//!
//! 1. Fill leaves greedily to capacity, chaining sibling pointers. Blocks of
//!    one level are appended contiguously, so sibling addresses are known
//!    before a node is written.
//! 2. Collect `(first_key, block)` per leaf and build index levels bottom-up
//!    until a level holds one node. That node's block is the root, recorded
//!    in the block-file user header.
//!
//! A tree that fits one leaf has its root pointing straight at the leaf.

use crate::btree::node::{IndexNode, LeafNode, Node};
use crate::error::{FarError, FarResult};
use crate::page::file::BlockFile;
use crate::topk::Pair;
use std::path::Path;

/// Disk-resident B+-tree handle.
#[derive(Debug)]
pub struct BTree {
    file: BlockFile,
    root: u32,
}

impl BTree {
    /// Bulk-load a tree from a key-ascending table.
    ///
    /// ## Input
    /// - `path`: tree file to create
    /// - `block_len`: page size `B` in bytes
    /// - `table`: `(key, id)` pairs sorted ascending by key (ties by id)
    ///
    /// ## Output
    /// - a read-usable handle on the freshly written tree
    ///
    /// ## Error Conditions
    /// - empty input
    /// - node capacity below the floors at this page size
    /// - any block write failure
    pub fn build<P: AsRef<Path>>(path: P, block_len: usize, table: &[Pair]) -> FarResult<Self> {
        if table.is_empty() {
            return Err(FarError::InvalidParameter {
                name: "table".to_string(),
                reason: "cannot bulk-load an empty hash table".to_string(),
            });
        }

        // Probe both node kinds up front so a too-small page fails before
        // anything is written.
        LeafNode::new(block_len)?;
        IndexNode::new(1, block_len)?;

        let mut file = BlockFile::create(path, block_len)?;
        let mut buf = vec![0u8; block_len];

        // Leaf level. Addresses run 1..=num_leaves in append order.
        let id_capacity = LeafNode::id_capacity_for(block_len);
        let num_leaves = table.len().div_ceil(id_capacity);

        let mut children: Vec<(f32, u32)> = Vec::with_capacity(num_leaves);
        for (j, chunk) in table.chunks(id_capacity).enumerate() {
            let addr = (j + 1) as u32;
            let mut leaf = LeafNode::new(block_len)?;
            if j > 0 {
                leaf.set_left_sibling(Some(addr - 1));
            }
            if j + 1 < num_leaves {
                leaf.set_right_sibling(Some(addr + 1));
            }
            for pair in chunk {
                leaf.push_entry(pair.id, pair.key);
            }

            leaf.write_to(&mut buf);
            let written = file.append_block(&buf)?;
            debug_assert_eq!(written, addr);

            children.push((chunk[0].key, addr));
        }

        // Index levels, bottom-up.
        let capacity = IndexNode::capacity_for(block_len);
        let mut level = 1u8;
        while children.len() > 1 {
            let num_nodes = children.len().div_ceil(capacity);
            let start = file.num_blocks() + 1;

            let mut next: Vec<(f32, u32)> = Vec::with_capacity(num_nodes);
            for (t, chunk) in children.chunks(capacity).enumerate() {
                let addr = start + t as u32;
                let mut node = IndexNode::new(level, block_len)?;
                if t > 0 {
                    node.set_left_sibling(Some(addr - 1));
                }
                if t + 1 < num_nodes {
                    node.set_right_sibling(Some(addr + 1));
                }
                for &(key, son) in chunk {
                    node.push_entry(key, son);
                }

                node.write_to(&mut buf);
                let written = file.append_block(&buf)?;
                debug_assert_eq!(written, addr);

                next.push((node.first_key(), addr));
            }

            children = next;
            level += 1;
        }

        let root = children[0].1;
        file.set_user_header(&root.to_le_bytes())?;

        Ok(Self { file, root })
    }

    /// Open an existing tree read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> FarResult<Self> {
        let file = BlockFile::open(path)?;
        let header = file.user_header(4)?;
        let root = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        Ok(Self { file, root })
    }

    /// Block address of the root node.
    pub fn root(&self) -> u32 {
        self.root
    }

    pub fn block_len(&self) -> usize {
        self.file.block_len()
    }

    /// Read and deserialise the node at `block`.
    pub fn read_node(&self, block: u32) -> FarResult<Node> {
        let mut buf = vec![0u8; self.file.block_len()];
        self.file.read_block(block, &mut buf)?;
        Node::from_bytes(&buf)
    }

    /// Read the node at `block`, which must be a leaf.
    pub fn read_leaf(&self, block: u32) -> FarResult<LeafNode> {
        match self.read_node(block)? {
            Node::Leaf(leaf) => Ok(leaf),
            Node::Index(_) => Err(FarError::CorruptedIndex {
                path: String::new(),
                reason: format!("block {} is an index node, expected a leaf", block),
            }),
        }
    }
}
