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

//! Storage module for Strata
//!
//! This module contains the columnar storage layer:
//! - Buffer manager and block constants
//! - Fixed-size vectors, null masks and selection vectors
//! - Columnar segments with per-vector update chains
//! - The vectorized predicate filter kernel
//! - MVCC transaction machinery

pub mod buffer;
pub mod filter;
pub mod mvcc;
pub mod segment;
pub mod vector;

// Re-export buffer types
pub use buffer::{
    BlockHandle, BlockId, BufferManager, BLOCK_ALLOC_SIZE, BLOCK_SIZE, MAXIMUM_BLOCK,
};

// Re-export vector types
pub use vector::{NullMask, SelectionVector, Vector, VectorData, STANDARD_VECTOR_SIZE};

// Re-export segment types
pub use segment::{ColumnScanState, Segment, SegmentStatistics};

// Re-export filter types
pub use filter::{filter_selection, TableFilter};

// Re-export MVCC types
pub use mvcc::{
    is_committed, is_visible, Transaction, TransactionManager, UpdateInfo, UpdateNodeId,
    TRANSACTION_ID_START,
};
