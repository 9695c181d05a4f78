// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Error types for FarBase operations.
//!
//! Provides structured error handling with detailed context for debugging.

use std::fmt;

/// Standard Result type for all FarBase operations.
pub type FarResult<T> = Result<T, FarError>;

/// Error types for FarBase operations.
#[derive(Debug, Clone)]
pub enum FarError {
    /// I/O error during file operations.
    IoError { operation: String, reason: String },

    /// Input file could not be parsed.
    ParseError { path: String, reason: String },

    /// Parameter outside its valid range.
    InvalidParameter { name: String, reason: String },

    /// Node capacity below the required floor for the chosen page size.
    CapacityTooSmall {
        kind: String,
        capacity: usize,
        minimum: usize,
    },

    /// Input file held fewer objects than declared.
    CardinalityMismatch {
        path: String,
        expected: usize,
        actual: usize,
    },

    /// Index artifacts already present at the build path.
    IndexExists { path: String },

    /// Persisted index state failed validation.
    CorruptedIndex { path: String, reason: String },

    /// Block address outside the allocated range of a block file.
    BlockOutOfRange { block: u32, total: u32 },
}

impl fmt::Display for FarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IoError { operation, reason } => {
                write!(f, "I/O error during '{}': {}", operation, reason)
            }
            Self::ParseError { path, reason } => {
                write!(f, "Could not parse '{}': {}", path, reason)
            }
            Self::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{}': {}", name, reason)
            }
            Self::CapacityTooSmall {
                kind,
                capacity,
                minimum,
            } => {
                write!(
                    f,
                    "{} capacity is {}, which is too small (minimum {})",
                    kind, capacity, minimum
                )
            }
            Self::CardinalityMismatch {
                path,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "'{}' holds {} objects, expected {}",
                    path, actual, expected
                )
            }
            Self::IndexExists { path } => {
                write!(
                    f,
                    "Index already exists at '{}' (remove the directory to rebuild)",
                    path
                )
            }
            Self::CorruptedIndex { path, reason } => {
                write!(f, "Corrupted index at '{}': {}", path, reason)
            }
            Self::BlockOutOfRange { block, total } => {
                write!(f, "Block {} out of range ({} allocated)", block, total)
            }
        }
    }
}

impl std::error::Error for FarError {}

// Convenience conversion from std::io::Error
impl From<std::io::Error> for FarError {
    fn from(err: std::io::Error) -> Self {
        FarError::IoError {
            operation: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}
