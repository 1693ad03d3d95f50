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

//! Columnar segments with per-vector update chains
//!
//! A [`Segment`] is a contiguous columnar region over one block: up to
//! `max_vector_count` vectors of a single physical type, each laid out as a
//! null mask followed by packed values. Uncommitted (and recently
//! committed) changes hang off `versions[vector_index]` as newest-first
//! chains of update-info nodes; scans fold the chain into the base data
//! under the transaction's snapshot.
//!
//! # Locking
//!
//! One reader/writer lock per segment. `update`, `write_vector` and
//! `to_temporary` take it exclusively; `select` and `scan` take it shared
//! for the duration of one call. `index_scan` takes it shared at vector 0
//! and parks the guard in [`ColumnScanState::locks`] so no updater can
//! slip in while an index is being built over the segment.
//!
//! # Block states
//!
//! Persisted (`block_id < MAXIMUM_BLOCK`, immutable) promotes one-way to
//! mutable (`block_id >= MAXIMUM_BLOCK`) via [`Segment::to_temporary`].
//! Updates against a persisted block are rejected.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use smallvec::SmallVec;

use crate::core::{Error, PhysicalType, Result, Value};
use crate::storage::buffer::{
    BlockId, BufferManager, BLOCK_ALLOC_SIZE, BLOCK_SIZE, MAXIMUM_BLOCK,
};
use crate::storage::filter::{filter_selection, TableFilter};
use crate::storage::mvcc::transaction::Transaction;
use crate::storage::mvcc::update_info::{UpdateArena, UpdateNodeId};
use crate::storage::vector::{
    NullMask, SelectionVector, Vector, NULLMASK_BYTES, STANDARD_VECTOR_SIZE,
};

/// Min/max and null tracking for one segment's written data
#[derive(Debug, Clone, Default)]
pub struct SegmentStatistics {
    pub min: Option<Value>,
    pub max: Option<Value>,
    pub has_null: bool,
}

impl SegmentStatistics {
    /// Fold a batch of written values into the statistics
    pub fn update(&mut self, values: &Vector) {
        for i in 0..values.len() {
            if values.is_null(i) {
                self.has_null = true;
                continue;
            }
            let value = values.value(i);
            if self.min.as_ref().map_or(true, |m| value < *m) {
                self.min = Some(value.clone());
            }
            if self.max.as_ref().map_or(true, |m| value > *m) {
                self.max = Some(value);
            }
        }
    }
}

/// Scan cursor over a segment's vectors
///
/// `locks` parks shared guards taken by [`Segment::index_scan`] at vector 0;
/// the guard pushed last covers the segment currently being scanned.
pub struct ColumnScanState<'a> {
    /// Vector currently being scanned
    pub vector_index: usize,
    /// Shared locks held for the duration of a multi-vector scan
    pub locks: Vec<RwLockReadGuard<'a, SegmentInner>>,
}

impl ColumnScanState<'_> {
    pub fn new() -> Self {
        Self {
            vector_index: 0,
            locks: Vec::new(),
        }
    }
}

impl Default for ColumnScanState<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Segment state guarded by the reader/writer lock
///
/// Transactions keep shared ownership of this guarded state in their undo
/// buffers, so commit stamping and rollback reach the chain without going
/// back through the segment.
pub struct SegmentInner {
    block_id: BlockId,
    /// Lazily allocated update-chain heads, one slot per vector
    versions: Option<Box<[Option<UpdateNodeId>]>>,
    arena: UpdateArena,
}

impl SegmentInner {
    /// Stamp a chain node with its commit timestamp
    pub(crate) fn commit_update(&mut self, node: UpdateNodeId, commit_ts: u64) {
        self.arena.get_mut(node).version_number = commit_ts;
    }

    /// Unlink and free an aborted chain node
    pub(crate) fn undo_update(&mut self, node: UpdateNodeId) {
        let info = self.arena.remove(node);
        match info.prev {
            Some(prev) => self.arena.get_mut(prev).next = info.next,
            None => {
                if let Some(versions) = self.versions.as_mut() {
                    versions[info.vector_index] = info.next;
                }
            }
        }
        if let Some(next) = info.next {
            self.arena.get_mut(next).prev = info.prev;
        }
    }
}

/// A columnar block of values with per-vector update chains
pub struct Segment {
    manager: Arc<BufferManager>,
    physical_type: PhysicalType,
    max_vector_count: usize,
    /// Bytes per vector region: null mask plus packed values
    vector_bytes: usize,
    inner: Arc<RwLock<SegmentInner>>,
}

impl Segment {
    /// Construct a segment around an existing block (persisted or mutable)
    pub fn with_block(
        manager: Arc<BufferManager>,
        physical_type: PhysicalType,
        block_id: BlockId,
    ) -> Result<Self> {
        let type_size = physical_type
            .size()
            .ok_or(Error::UnsupportedSegmentType(physical_type))?;
        let vector_bytes = NULLMASK_BYTES + type_size * STANDARD_VECTOR_SIZE;
        Ok(Self {
            manager,
            physical_type,
            max_vector_count: BLOCK_SIZE / vector_bytes,
            vector_bytes,
            inner: Arc::new(RwLock::new(SegmentInner {
                block_id,
                versions: None,
                arena: UpdateArena::new(),
            })),
        })
    }

    /// Construct a segment over a freshly allocated mutable block
    pub fn new(manager: Arc<BufferManager>, physical_type: PhysicalType) -> Result<Self> {
        let block_id = manager.allocate(BLOCK_ALLOC_SIZE).block_id();
        Self::with_block(manager, physical_type, block_id)
    }

    /// The segment's physical type
    pub fn physical_type(&self) -> PhysicalType {
        self.physical_type
    }

    /// Maximum number of vectors this segment can hold
    pub fn max_vector_count(&self) -> usize {
        self.max_vector_count
    }

    /// Current block id
    pub fn block_id(&self) -> BlockId {
        self.inner.read().block_id
    }

    /// Returns true if the segment's block accepts in-place updates
    pub fn is_mutable(&self) -> bool {
        self.inner.read().block_id >= MAXIMUM_BLOCK
    }

    /// Returns true if the vector carries an update chain
    pub fn has_versions(&self, vector_index: usize) -> bool {
        let inner = self.inner.read();
        inner
            .versions
            .as_ref()
            .map_or(false, |v| v[vector_index].is_some())
    }

    /// Version numbers along the vector's chain, newest first
    pub fn version_numbers(&self, vector_index: usize) -> Vec<u64> {
        let inner = self.inner.read();
        let mut numbers = Vec::new();
        let mut current = inner.versions.as_ref().and_then(|v| v[vector_index]);
        while let Some(node_id) = current {
            let node = inner.arena.get(node_id);
            numbers.push(node.version_number);
            current = node.next;
        }
        numbers
    }

    /// Write a full base vector into a mutable block
    pub fn write_vector(
        &self,
        stats: &mut SegmentStatistics,
        vector_index: usize,
        values: &Vector,
    ) -> Result<()> {
        if values.physical_type() != self.physical_type {
            return Err(Error::invalid_update(format!(
                "segment stores {}, got {} values",
                self.physical_type,
                values.physical_type()
            )));
        }
        if values.len() != STANDARD_VECTOR_SIZE {
            return Err(Error::invalid_update(
                "base vectors are written full-size",
            ));
        }
        if vector_index >= self.max_vector_count {
            return Err(Error::invalid_update("vector index beyond segment capacity"));
        }
        let inner = self.inner.write();
        if inner.block_id < MAXIMUM_BLOCK {
            return Err(Error::ReadOnlyBlock(inner.block_id));
        }
        let handle = self.manager.pin(inner.block_id)?;
        let mut data = handle.write();
        let offset = vector_index * self.vector_bytes;
        let (mask, vals) = data[offset..offset + self.vector_bytes].split_at_mut(NULLMASK_BYTES);
        values.encode_into(mask, vals)?;
        stats.update(values);
        Ok(())
    }

    /// Apply a sorted batch of row updates belonging to one vector
    ///
    /// All ids must fall into the vector addressed by `ids[0]`; `offset` is
    /// the segment's starting row. Conflicts with any chain node whose
    /// version is uncommitted by another transaction, or committed after
    /// this transaction began, raise [`Error::UpdateConflict`]. A second
    /// batch from the same transaction merges into its existing node.
    pub fn update(
        &self,
        stats: &mut SegmentStatistics,
        txn: &mut Transaction<'_>,
        values: &Vector,
        ids: &[u64],
        offset: u64,
    ) -> Result<()> {
        if ids.is_empty() {
            return Err(Error::invalid_update("empty tuple id batch"));
        }
        if values.len() != ids.len() {
            return Err(Error::invalid_update(
                "value count does not match tuple id count",
            ));
        }
        if values.physical_type() != self.physical_type {
            return Err(Error::invalid_update(format!(
                "segment stores {}, got {} values",
                self.physical_type,
                values.physical_type()
            )));
        }
        for pair in ids.windows(2) {
            if pair[1] <= pair[0] {
                return Err(Error::invalid_update("tuple ids must be strictly ascending"));
            }
        }
        if ids[0] < offset {
            return Err(Error::invalid_update("tuple id below segment offset"));
        }

        let mut inner = self.inner.write();
        if inner.block_id < MAXIMUM_BLOCK {
            return Err(Error::ReadOnlyBlock(inner.block_id));
        }

        let vector_index = ((ids[0] - offset) / STANDARD_VECTOR_SIZE as u64) as usize;
        if vector_index >= self.max_vector_count {
            return Err(Error::invalid_update("tuple id beyond segment capacity"));
        }
        let vector_offset = offset + (vector_index * STANDARD_VECTOR_SIZE) as u64;
        if ids[ids.len() - 1] >= vector_offset + STANDARD_VECTOR_SIZE as u64 {
            return Err(Error::invalid_update(
                "update batch spans more than one vector",
            ));
        }

        if inner.versions.is_none() {
            inner.versions = Some(vec![None; self.max_vector_count].into_boxed_slice());
        }

        let rel_ids: Vec<u32> = ids.iter().map(|id| (id - vector_offset) as u32).collect();
        let head = inner.versions.as_ref().and_then(|v| v[vector_index]);

        // walk the whole chain: remember our own node, conflict-check the rest
        let mut own_node = None;
        let mut current = head;
        while let Some(node_id) = current {
            let node = inner.arena.get(node_id);
            if node.version_number == txn.transaction_id() {
                own_node = Some(node_id);
            } else if node.version_number > txn.start_time() && node.overlaps(&rel_ids) {
                return Err(Error::UpdateConflict);
            }
            current = node.next;
        }

        match own_node {
            Some(node_id) => {
                inner.arena.get_mut(node_id).merge(&rel_ids, values)?;
            }
            None => {
                let mut info = txn.create_update_info(self.physical_type, rel_ids.len());
                info.vector_index = vector_index;
                for (i, rel) in rel_ids.iter().enumerate() {
                    info.tuples.push(*rel);
                    info.payload.push_from(values, i)?;
                }
                info.next = head;
                let node_id = inner.arena.insert(info);
                if let Some(next_id) = head {
                    inner.arena.get_mut(next_id).prev = Some(node_id);
                }
                if let Some(versions) = inner.versions.as_mut() {
                    versions[vector_index] = Some(node_id);
                }
                txn.push_segment_update(Arc::clone(&self.inner), node_id);
            }
        }

        stats.update(values);
        Ok(())
    }

    /// Materialize the snapshot-visible state of one vector
    ///
    /// Base data plus every chain delta visible to `txn`; where several
    /// visible deltas touch a tuple, the newest wins.
    pub fn scan(
        &self,
        txn: &Transaction<'_>,
        vector_index: usize,
        result: &mut Vector,
    ) -> Result<()> {
        let inner = self.inner.read();
        self.scan_vector(&inner, txn, vector_index, result)
    }

    /// Scan one vector and refine the selection with pushed-down filters
    ///
    /// With an update chain present the vector is reconstructed under the
    /// snapshot and filtered against the base block's null mask; otherwise
    /// the base data is filtered directly.
    pub fn select(
        &self,
        txn: &Transaction<'_>,
        result: &mut Vector,
        filters: &[TableFilter],
        sel: &mut SelectionVector,
        approved_tuple_count: &mut usize,
        state: &ColumnScanState<'_>,
    ) -> Result<()> {
        let inner = self.inner.read();
        let vector_index = state.vector_index;
        let versioned = inner
            .versions
            .as_ref()
            .map_or(false, |v| v[vector_index].is_some());
        if versioned {
            self.scan_vector(&inner, txn, vector_index, result)?;
            let handle = self.manager.pin(inner.block_id)?;
            let nullmask = {
                let data = handle.read();
                let offset = vector_index * self.vector_bytes;
                NullMask::from_bytes(&data[offset..offset + NULLMASK_BYTES])
            };
            for filter in filters {
                filter_selection(sel, result, filter, approved_tuple_count, &nullmask)?;
            }
        } else {
            self.fetch_base_locked(&inner, vector_index, result)?;
            let nullmask = result.nulls().clone();
            for filter in filters {
                filter_selection(sel, result, filter, approved_tuple_count, &nullmask)?;
            }
        }
        Ok(())
    }

    /// Materialize base data for an index build
    ///
    /// At vector 0 a shared lock is taken and parked in `state` for the
    /// duration of the scan, keeping updaters out until the guard is
    /// dropped. Vectors with outstanding update chains cannot be indexed.
    pub fn index_scan<'a>(
        &'a self,
        state: &mut ColumnScanState<'a>,
        vector_index: usize,
        result: &mut Vector,
    ) -> Result<()> {
        if vector_index == 0 {
            state.locks.push(self.inner.read());
        }
        let inner = state
            .locks
            .last()
            .ok_or_else(|| Error::internal("index scan requires the shared lock taken at vector 0"))?;
        if let Some(versions) = inner.versions.as_ref() {
            if versions[vector_index].is_some() {
                return Err(Error::OutstandingUpdates);
            }
        }
        self.fetch_base_locked(inner, vector_index, result)
    }

    /// Promote a persisted block to a mutable in-memory copy, exactly once
    pub fn to_temporary(&self) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.block_id >= MAXIMUM_BLOCK {
            // another thread won the promotion
            return Ok(());
        }
        let current = self.manager.pin(inner.block_id)?;
        let handle = self.manager.allocate(BLOCK_ALLOC_SIZE);
        {
            let src = current.read();
            let mut dst = handle.write();
            dst[..BLOCK_SIZE].copy_from_slice(&src[..BLOCK_SIZE]);
        }
        log::debug!(
            "promoted block {} to in-memory block {}",
            inner.block_id,
            handle.block_id()
        );
        inner.block_id = handle.block_id();
        Ok(())
    }

    fn scan_vector(
        &self,
        inner: &SegmentInner,
        txn: &Transaction<'_>,
        vector_index: usize,
        result: &mut Vector,
    ) -> Result<()> {
        self.fetch_base_locked(inner, vector_index, result)?;
        let Some(versions) = inner.versions.as_ref() else {
            return Ok(());
        };
        let mut visible: SmallVec<[UpdateNodeId; 8]> = SmallVec::new();
        let mut current = versions[vector_index];
        while let Some(node_id) = current {
            let node = inner.arena.get(node_id);
            if txn.sees(node.version_number) {
                visible.push(node_id);
            }
            current = node.next;
        }
        // newest-first chain: apply oldest to newest so the newest delta wins
        for node_id in visible.iter().rev() {
            let node = inner.arena.get(*node_id);
            for (i, tuple) in node.tuples.iter().enumerate() {
                result.copy_from(*tuple as usize, &node.payload, i)?;
            }
        }
        Ok(())
    }

    fn fetch_base_locked(
        &self,
        inner: &SegmentInner,
        vector_index: usize,
        result: &mut Vector,
    ) -> Result<()> {
        if vector_index >= self.max_vector_count {
            return Err(Error::invalid_update("vector index beyond segment capacity"));
        }
        let handle = self.manager.pin(inner.block_id)?;
        let data = handle.read();
        let offset = vector_index * self.vector_bytes;
        let mask = &data[offset..offset + NULLMASK_BYTES];
        let values = &data[offset + NULLMASK_BYTES..offset + self.vector_bytes];
        *result = Vector::decode(self.physical_type, mask, values)?;
        Ok(())
    }
}
