// Copyright 2026 Strata Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for Strata
//!
//! This module defines all error types used throughout the MVCC core.

use thiserror::Error;

use crate::core::types::PhysicalType;

/// Result type alias for Strata operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Strata storage operations
///
/// Conflicts and type errors abort the current statement; the transaction
/// itself stays alive and the caller decides whether to roll back or retry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // =========================================================================
    // Transaction conflicts
    // =========================================================================
    /// A concurrent uncommitted writer holds the head version of a catalog chain
    #[error("write-write conflict on catalog entry '{name}'")]
    WriteWriteConflict { name: String },

    /// Overlapping tuple ids with a concurrent or post-snapshot writer
    #[error("conflict on update")]
    UpdateConflict,

    /// Transaction has already been committed or rolled back
    #[error("transaction already closed")]
    TransactionClosed,

    // =========================================================================
    // Segment errors
    // =========================================================================
    /// Index scan attempted on a vector that still carries an update chain
    #[error("cannot create index with outstanding updates")]
    OutstandingUpdates,

    /// In-place update attempted on a persisted (read-only) block
    #[error("cannot update read-only block {0}, promote the segment first")]
    ReadOnlyBlock(u64),

    /// Update batch violates the segment's tuple-id contract
    #[error("invalid update batch: {0}")]
    InvalidUpdate(String),

    /// Physical type has no fixed-width block representation
    #[error("type {0} cannot be stored in a columnar segment block")]
    UnsupportedSegmentType(PhysicalType),

    // =========================================================================
    // Filter errors
    // =========================================================================
    /// Filter constant does not match the physical type of the scanned vector
    #[error("invalid type for filter comparison: vector is {vector}, constant is {constant}")]
    InvalidFilterType {
        vector: PhysicalType,
        constant: PhysicalType,
    },

    /// Operation outside the supported set
    #[error("not implemented: {0}")]
    NotImplemented(String),

    // =========================================================================
    // Buffer manager errors
    // =========================================================================
    /// Block id is not registered with the buffer manager
    #[error("block {0} not found")]
    BlockNotFound(u64),

    // =========================================================================
    // Other errors
    // =========================================================================
    /// Internal error for unexpected conditions
    #[error("{message}")]
    Internal { message: String },
}

impl Error {
    /// Create a new WriteWriteConflict error
    pub fn write_write_conflict(name: impl Into<String>) -> Self {
        Error::WriteWriteConflict { name: name.into() }
    }

    /// Create a new InvalidUpdate error
    pub fn invalid_update(message: impl Into<String>) -> Self {
        Error::InvalidUpdate(message.into())
    }

    /// Create a new NotImplemented error
    pub fn not_implemented(message: impl Into<String>) -> Self {
        Error::NotImplemented(message.into())
    }

    /// Create a new Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }
}
