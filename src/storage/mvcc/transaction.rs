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

//! Transactions and the transaction manager
//!
//! # Tagged timestamps
//!
//! Version numbers pack two variants into one `u64` using the
//! [`TRANSACTION_ID_START`] threshold:
//!
//! - `ts < TRANSACTION_ID_START` — a commit timestamp drawn from the
//!   manager's logical clock
//! - `ts >= TRANSACTION_ID_START` — the id of a still-uncommitted
//!   transaction
//!
//! The encoding keeps the visibility predicate branchless: a version is
//! visible to a transaction iff it is the transaction's own write or its
//! timestamp is below the transaction's start time. Uncommitted versions of
//! other transactions sit above every possible start time, so they fail the
//! second comparison without an explicit committed check.
//!
//! # Lifecycle
//!
//! ```text
//! begin -> Active -> commit()   -> versions re-stamped with commit ts
//!                \-> rollback() -> undo buffer drained in reverse
//! ```
//!
//! Begin and commit share one logical clock and serialize on the manager's
//! mutex, so a transaction that begins after a commit completes observes
//! either all of that commit's versions or none mid-flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::catalog::{CatalogVersions, EntryHandle};
use crate::core::{Error, PhysicalType, Result};
use crate::storage::mvcc::update_info::{UpdateInfo, UpdateNodeId};
use crate::storage::segment::SegmentInner;
use crate::storage::vector::Vector;

/// Lower bound of uncommitted version numbers; exceeds any commit timestamp
/// the clock will ever issue
pub const TRANSACTION_ID_START: u64 = 1 << 62;

/// Returns true if a tagged version number is a commit timestamp
#[inline]
pub fn is_committed(version: u64) -> bool {
    version < TRANSACTION_ID_START
}

/// Snapshot visibility predicate
///
/// A version is visible if the transaction wrote it, or it committed before
/// the transaction began.
#[inline]
pub fn is_visible(version: u64, transaction_id: u64, start_time: u64) -> bool {
    version == transaction_id || version < start_time
}

/// One reversible effect recorded by a transaction
///
/// Catalog entries record the child of the version that was installed (undo
/// promotes the child back to head); segment updates record the chain node
/// that was spliced in (undo unlinks it). Both hold shared ownership of the
/// guarded state they must touch at commit or rollback.
pub(crate) enum UndoEntry {
    CatalogEntry {
        set: Arc<dyn CatalogVersions>,
        child: EntryHandle,
    },
    SegmentUpdate {
        segment: Arc<RwLock<SegmentInner>>,
        node: UpdateNodeId,
    },
}

/// An active transaction
///
/// Mutated only by its owning logical worker; `transaction_id` and
/// `start_time` are immutable after begin.
pub struct Transaction<'a> {
    manager: &'a TransactionManager,
    transaction_id: u64,
    start_time: u64,
    undo_buffer: Vec<UndoEntry>,
    active: bool,
}

impl Transaction<'_> {
    /// The transaction's id (always `>= TRANSACTION_ID_START`)
    pub fn transaction_id(&self) -> u64 {
        self.transaction_id
    }

    /// Logical clock tick at begin; versions committed below it are visible
    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    /// Returns true if a tagged version number is visible to this transaction
    #[inline]
    pub fn sees(&self, version: u64) -> bool {
        is_visible(version, self.transaction_id, self.start_time)
    }

    /// Record the replaced catalog chain position for rollback and commit
    /// stamping
    pub fn push_catalog_entry(&mut self, set: Arc<dyn CatalogVersions>, child: EntryHandle) {
        self.undo_buffer.push(UndoEntry::CatalogEntry { set, child });
    }

    /// Record a freshly spliced update-chain node
    pub(crate) fn push_segment_update(
        &mut self,
        segment: Arc<RwLock<SegmentInner>>,
        node: UpdateNodeId,
    ) {
        self.undo_buffer
            .push(UndoEntry::SegmentUpdate { segment, node });
    }

    /// Allocate an update record sized for `capacity` tuples of the given
    /// physical type, version-tagged with this transaction's id
    pub fn create_update_info(&self, physical_type: PhysicalType, capacity: usize) -> UpdateInfo {
        UpdateInfo::new(
            self.transaction_id,
            Vector::with_capacity(physical_type, capacity),
            capacity,
        )
    }

    /// Commit: stamp every buffered version with a fresh commit timestamp
    ///
    /// Returns the commit timestamp.
    pub fn commit(mut self) -> Result<u64> {
        if !self.active {
            return Err(Error::TransactionClosed);
        }
        self.active = false;
        let undo = std::mem::take(&mut self.undo_buffer);
        let commit_ts = self.manager.commit_transaction(self.transaction_id, &undo);
        Ok(commit_ts)
    }

    /// Roll back: drain the undo buffer in reverse, restoring every chain
    pub fn rollback(mut self) {
        self.rollback_in_place();
    }

    fn rollback_in_place(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        let undo = std::mem::take(&mut self.undo_buffer);
        self.manager.rollback_transaction(self.transaction_id, &undo);
    }
}

// A transaction dropped while still active has made uncommitted versions;
// they must not outlive it.
impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.active {
            self.rollback_in_place();
        }
    }
}

/// Issues transaction ids and timestamps, and serializes commit stamping
///
/// One logical clock feeds both start times and commit timestamps; the
/// manager mutex is held across the whole stamping loop so a concurrent
/// begin never observes a half-committed transaction.
pub struct TransactionManager {
    lock: Mutex<()>,
    logical_clock: AtomicU64,
    next_transaction_id: AtomicU64,
}

impl TransactionManager {
    /// Create a manager with a fresh clock
    pub fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            logical_clock: AtomicU64::new(0),
            next_transaction_id: AtomicU64::new(TRANSACTION_ID_START),
        }
    }

    /// Begin a new transaction
    pub fn begin(&self) -> Transaction<'_> {
        let _guard = self.lock.lock();
        let start_time = self.logical_clock.fetch_add(1, Ordering::SeqCst) + 1;
        debug_assert!(start_time < TRANSACTION_ID_START);
        let transaction_id = self.next_transaction_id.fetch_add(1, Ordering::SeqCst);
        log::trace!(
            "begin transaction {} at start time {}",
            transaction_id,
            start_time
        );
        Transaction {
            manager: self,
            transaction_id,
            start_time,
            undo_buffer: Vec::new(),
            active: true,
        }
    }

    /// The latest issued clock tick
    pub fn current_timestamp(&self) -> u64 {
        self.logical_clock.load(Ordering::SeqCst)
    }

    fn commit_transaction(&self, transaction_id: u64, undo: &[UndoEntry]) -> u64 {
        let _guard = self.lock.lock();
        let commit_ts = self.logical_clock.fetch_add(1, Ordering::SeqCst) + 1;
        debug_assert!(commit_ts < TRANSACTION_ID_START);
        for entry in undo {
            match entry {
                UndoEntry::CatalogEntry { set, child } => set.commit_entry(*child, commit_ts),
                UndoEntry::SegmentUpdate { segment, node } => {
                    segment.write().commit_update(*node, commit_ts)
                }
            }
        }
        log::debug!(
            "committed transaction {} at timestamp {} ({} versions)",
            transaction_id,
            commit_ts,
            undo.len()
        );
        commit_ts
    }

    fn rollback_transaction(&self, transaction_id: u64, undo: &[UndoEntry]) {
        let _guard = self.lock.lock();
        for entry in undo.iter().rev() {
            match entry {
                UndoEntry::CatalogEntry { set, child } => set.undo(*child),
                UndoEntry::SegmentUpdate { segment, node } => segment.write().undo_update(*node),
            }
        }
        log::debug!(
            "rolled back transaction {} ({} versions)",
            transaction_id,
            undo.len()
        );
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}
