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

//! # Strata - MVCC core for an analytical columnar database
//!
//! Strata implements the concurrency and versioning machinery that links a
//! database catalog to a columnar storage engine: snapshot-isolated
//! metadata, per-vector update chains, and vectorized predicate filtering
//! over versioned data.
//!
//! ## Key Pieces
//!
//! - **Versioned catalog** - [`CatalogSet`] is a transactional name→entry
//!   map; every name carries a version chain, and writers conflict rather
//!   than overwrite each other
//! - **Transactions** - [`TransactionManager`] issues tagged timestamps; a
//!   [`Transaction`] sees exactly the versions committed before it began,
//!   plus its own writes, and reverses everything it did on rollback
//! - **Segments** - [`Segment`] holds a block of column vectors; updates
//!   hang off per-vector chains until commit stamps them visible
//! - **Filter kernel** - [`filter_selection`] refines a selection vector
//!   against a pushed-down comparison without copying values
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use strata::{CatalogSet, TransactionManager};
//!
//! let manager = Arc::new(TransactionManager::new());
//! let catalog: Arc<CatalogSet<String>> = Arc::new(CatalogSet::new());
//!
//! let mut txn = manager.begin();
//! catalog.create_entry(&mut txn, "orders", "schema".to_string()).unwrap();
//! assert!(catalog.entry_exists(&txn, "orders"));
//! txn.commit().unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`catalog`] - Snapshot-isolated name→entry maps
//! - [`core`] - Fundamental types ([`PhysicalType`], [`Value`], [`Error`])
//! - [`storage`] - Buffer manager, vectors, segments, filters, MVCC

pub mod catalog;
pub mod core;
pub mod storage;

// Re-export main types for convenience
pub use self::core::{CompareOp, Error, PhysicalType, Result, Value};

// Re-export catalog types
pub use catalog::{CatalogSet, CatalogVersions, EntryHandle};

// Re-export storage types
pub use storage::{
    filter_selection, is_committed, is_visible, BlockHandle, BlockId, BufferManager,
    ColumnScanState, NullMask, SelectionVector, Segment, SegmentStatistics, TableFilter,
    Transaction, TransactionManager, UpdateInfo, UpdateNodeId, Vector, VectorData,
    BLOCK_ALLOC_SIZE, BLOCK_SIZE, MAXIMUM_BLOCK, STANDARD_VECTOR_SIZE, TRANSACTION_ID_START,
};
