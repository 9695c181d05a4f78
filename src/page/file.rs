// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Random-access block file with a fixed block length.
//!
//! Block 0 is the header block; user blocks are appended behind it and
//! addressed from 1. The block length is fixed at create time and recorded in
//! the header, so a reader never has to guess the page geometry.
//!
//! ## Header Block Layout
//! ```text
//! Offset | Size | Field
//! -------|------|----------------------------------
//! 0      | 4    | magic (BLOCK_FILE_MAGIC)
//! 4      | 4    | block_len (u32 little-endian)
//! 8      | 4    | num_blocks (u32 little-endian)
//! 12     | ...  | user header (owned by the caller)
//! ```
//!
//! The B+-tree stores its root address in the user-header region.

use crate::error::{FarError, FarResult};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Magic bytes identifying a FarBase block file.
pub const BLOCK_FILE_MAGIC: u32 = 0xFA7B_10C4;

/// Bytes reserved in the header block ahead of the user header.
const HEADER_FIELDS: usize = 12;

/// Fixed-size paged file. Blocks are whole pages; the append position is the
/// only allocation state.
#[derive(Debug)]
pub struct BlockFile {
    file: File,
    path: PathBuf,
    block_len: usize,
    num_blocks: u32,
}

impl BlockFile {
    /// Create a new block file, truncating any existing one.
    ///
    /// ## Input
    /// - `path`: file to create
    /// - `block_len`: fixed page size in bytes (must exceed the header fields)
    ///
    /// ## Output
    /// - `Ok(BlockFile)` with a written, zero-padded header block
    pub fn create<P: AsRef<Path>>(path: P, block_len: usize) -> FarResult<Self> {
        let path = path.as_ref().to_path_buf();

        if block_len <= HEADER_FIELDS {
            return Err(FarError::InvalidParameter {
                name: "block_len".to_string(),
                reason: format!("{} bytes cannot hold the header fields", block_len),
            });
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| FarError::IoError {
                operation: format!("create block file '{}'", path.display()),
                reason: e.to_string(),
            })?;

        let mut bf = Self {
            file,
            path,
            block_len,
            num_blocks: 0,
        };

        let mut header = vec![0u8; block_len];
        header[0..4].copy_from_slice(&BLOCK_FILE_MAGIC.to_le_bytes());
        header[4..8].copy_from_slice(&(block_len as u32).to_le_bytes());
        header[8..12].copy_from_slice(&0u32.to_le_bytes());
        bf.write_at(0, &header)?;

        Ok(bf)
    }

    /// Open an existing block file read-only.
    ///
    /// ## Error Conditions
    /// - file missing or unreadable
    /// - magic mismatch (not a block file, or corrupted header)
    pub fn open<P: AsRef<Path>>(path: P) -> FarResult<Self> {
        let path = path.as_ref().to_path_buf();

        let file = File::open(&path).map_err(|e| FarError::IoError {
            operation: format!("open block file '{}'", path.display()),
            reason: e.to_string(),
        })?;

        let mut fields = [0u8; HEADER_FIELDS];
        read_exact_at(&file, 0, &mut fields, &path)?;

        let magic = u32::from_le_bytes([fields[0], fields[1], fields[2], fields[3]]);
        if magic != BLOCK_FILE_MAGIC {
            return Err(FarError::CorruptedIndex {
                path: path.display().to_string(),
                reason: format!(
                    "bad magic: expected 0x{:08X}, found 0x{:08X}",
                    BLOCK_FILE_MAGIC, magic
                ),
            });
        }

        let block_len = u32::from_le_bytes([fields[4], fields[5], fields[6], fields[7]]) as usize;
        let num_blocks = u32::from_le_bytes([fields[8], fields[9], fields[10], fields[11]]);

        Ok(Self {
            file,
            path,
            block_len,
            num_blocks,
        })
    }

    /// Fixed block length in bytes.
    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// Number of appended user blocks (header block excluded).
    pub fn num_blocks(&self) -> u32 {
        self.num_blocks
    }

    /// Append a block and return its 1-based address.
    pub fn append_block(&mut self, buf: &[u8]) -> FarResult<u32> {
        self.check_len(buf)?;

        let addr = self.num_blocks + 1;
        self.write_at(addr as u64 * self.block_len as u64, buf)?;

        self.num_blocks = addr;
        let count = self.num_blocks.to_le_bytes();
        self.write_at(8, &count)?;

        Ok(addr)
    }

    /// Read the block at `addr` into `buf`.
    pub fn read_block(&self, addr: u32, buf: &mut [u8]) -> FarResult<()> {
        if addr == 0 || addr > self.num_blocks {
            return Err(FarError::BlockOutOfRange {
                block: addr,
                total: self.num_blocks,
            });
        }
        if buf.len() != self.block_len {
            return Err(FarError::InvalidParameter {
                name: "buf".to_string(),
                reason: format!("buffer is {} bytes, block is {}", buf.len(), self.block_len),
            });
        }

        read_exact_at(
            &self.file,
            addr as u64 * self.block_len as u64,
            buf,
            &self.path,
        )
    }

    /// Overwrite the block at `addr`.
    pub fn write_block(&mut self, addr: u32, buf: &[u8]) -> FarResult<()> {
        if addr == 0 || addr > self.num_blocks {
            return Err(FarError::BlockOutOfRange {
                block: addr,
                total: self.num_blocks,
            });
        }
        self.check_len(buf)?;

        self.write_at(addr as u64 * self.block_len as u64, buf)
    }

    /// Write caller-owned bytes into the user-header region of block 0.
    pub fn set_user_header(&mut self, buf: &[u8]) -> FarResult<()> {
        if HEADER_FIELDS + buf.len() > self.block_len {
            return Err(FarError::InvalidParameter {
                name: "user_header".to_string(),
                reason: format!("{} bytes exceed the header block", buf.len()),
            });
        }
        self.write_at(HEADER_FIELDS as u64, buf)
    }

    /// Read `len` bytes from the user-header region of block 0.
    pub fn user_header(&self, len: usize) -> FarResult<Vec<u8>> {
        if HEADER_FIELDS + len > self.block_len {
            return Err(FarError::InvalidParameter {
                name: "user_header".to_string(),
                reason: format!("{} bytes exceed the header block", len),
            });
        }
        let mut buf = vec![0u8; len];
        read_exact_at(&self.file, HEADER_FIELDS as u64, &mut buf, &self.path)?;
        Ok(buf)
    }

    fn check_len(&self, buf: &[u8]) -> FarResult<()> {
        if buf.len() != self.block_len {
            return Err(FarError::InvalidParameter {
                name: "buf".to_string(),
                reason: format!("buffer is {} bytes, block is {}", buf.len(), self.block_len),
            });
        }
        Ok(())
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> FarResult<()> {
        self.file
            .seek(SeekFrom::Start(offset))
            .and_then(|_| self.file.write_all(buf))
            .map_err(|e| FarError::IoError {
                operation: format!("write block file '{}'", self.path.display()),
                reason: e.to_string(),
            })
    }
}

/// Positioned read through a shared file handle.
///
/// `Read`/`Seek` are implemented for `&File`, so readers never need a
/// mutable handle.
fn read_exact_at(file: &File, offset: u64, buf: &mut [u8], path: &Path) -> FarResult<()> {
    let mut handle = file;
    handle
        .seek(SeekFrom::Start(offset))
        .and_then(|_| handle.read_exact(buf))
        .map_err(|e| FarError::IoError {
            operation: format!("read block file '{}'", path.display()),
            reason: e.to_string(),
        })
}
