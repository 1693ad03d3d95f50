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

//! MVCC (Multi-Version Concurrency Control) machinery
//!
//! This module provides the transactional core of Strata:
//!
//! - [`TransactionManager`] - Id and timestamp issue, commit serialization
//! - [`Transaction`] - Identity, snapshot, undo buffer, update allocation
//! - [`UpdateInfo`] - Per-transaction, per-vector delta records
//!
//! # Transaction Lifecycle
//!
//! ```text
//! begin -> Active -> commit()
//!                \-> rollback()
//! ```
//!
//! Visibility is snapshot-isolated: a transaction sees exactly the versions
//! committed before its start time, plus its own uncommitted writes.

pub mod transaction;
pub mod update_info;

// Re-export main types
pub use transaction::{
    is_committed, is_visible, Transaction, TransactionManager, TRANSACTION_ID_START,
};
pub use update_info::{UpdateInfo, UpdateNodeId};
