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

//! In-memory buffer manager
//!
//! Blocks are the unit of storage handed to segments. Block ids below
//! [`MAXIMUM_BLOCK`] denote persisted, read-only blocks; ids at or above it
//! denote mutable in-memory blocks produced by [`BufferManager::allocate`].
//! A [`BlockHandle`] pins a block for the span of a physical access and
//! releases the pin on drop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rustc_hash::FxHashMap;

use crate::core::{Error, Result};

/// Usable bytes per block
pub const BLOCK_SIZE: usize = 256 * 1024;

/// Allocated bytes per block; the tail past [`BLOCK_SIZE`] carries block
/// metadata and must be at least as large as one vector's null mask
pub const BLOCK_ALLOC_SIZE: usize = BLOCK_SIZE + 1024;

/// Boundary between persisted block ids (below) and in-memory mutable block
/// ids (at or above)
pub const MAXIMUM_BLOCK: u64 = 1 << 62;

/// Identifier of a block managed by the buffer manager
pub type BlockId = u64;

/// One managed buffer
pub struct Block {
    id: BlockId,
    buffer: RwLock<Box<[u8]>>,
}

impl Block {
    fn new(id: BlockId, size: usize) -> Self {
        Self {
            id,
            buffer: RwLock::new(vec![0u8; size].into_boxed_slice()),
        }
    }
}

/// A pinned block; the pin is released when the handle is dropped
pub struct BlockHandle {
    block: Arc<Block>,
}

impl BlockHandle {
    /// Id of the pinned block
    pub fn block_id(&self) -> BlockId {
        self.block.id
    }

    /// Shared access to the block's bytes
    pub fn read(&self) -> RwLockReadGuard<'_, Box<[u8]>> {
        self.block.buffer.read()
    }

    /// Exclusive access to the block's bytes
    pub fn write(&self) -> RwLockWriteGuard<'_, Box<[u8]>> {
        self.block.buffer.write()
    }
}

/// In-memory buffer manager
///
/// Owns all blocks; segments hold pinned handles only for the span of a
/// physical access. Persisted blocks are staged through
/// [`BufferManager::create_persisted`] (a loader would do the same after
/// reading them off disk).
pub struct BufferManager {
    blocks: RwLock<FxHashMap<BlockId, Arc<Block>>>,
    next_persisted_id: AtomicU64,
    next_temporary_id: AtomicU64,
}

impl BufferManager {
    /// Create an empty buffer manager
    pub fn new() -> Self {
        Self {
            blocks: RwLock::new(FxHashMap::default()),
            next_persisted_id: AtomicU64::new(0),
            next_temporary_id: AtomicU64::new(MAXIMUM_BLOCK),
        }
    }

    /// Pin a block, returning an addressable handle
    pub fn pin(&self, block_id: BlockId) -> Result<BlockHandle> {
        let blocks = self.blocks.read();
        let block = blocks
            .get(&block_id)
            .ok_or(Error::BlockNotFound(block_id))?;
        Ok(BlockHandle {
            block: Arc::clone(block),
        })
    }

    /// Allocate a fresh mutable in-memory block of `size` bytes
    ///
    /// The returned handle carries a new block id at or above
    /// [`MAXIMUM_BLOCK`].
    pub fn allocate(&self, size: usize) -> BlockHandle {
        let id = self.next_temporary_id.fetch_add(1, Ordering::AcqRel);
        let block = Arc::new(Block::new(id, size));
        self.blocks.write().insert(id, Arc::clone(&block));
        BlockHandle { block }
    }

    /// Stage a persisted (read-only by convention) block and return its id
    ///
    /// Ids are assigned sequentially from zero, below [`MAXIMUM_BLOCK`].
    pub fn create_persisted(&self, data: &[u8]) -> BlockId {
        debug_assert!(data.len() <= BLOCK_ALLOC_SIZE);
        let id = self.next_persisted_id.fetch_add(1, Ordering::AcqRel);
        let block = Arc::new(Block::new(id, BLOCK_ALLOC_SIZE));
        block.buffer.write()[..data.len()].copy_from_slice(data);
        self.blocks.write().insert(id, block);
        id
    }
}

impl Default for BufferManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_assigns_temporary_ids() {
        let manager = BufferManager::new();
        let a = manager.allocate(BLOCK_ALLOC_SIZE);
        let b = manager.allocate(BLOCK_ALLOC_SIZE);
        assert!(a.block_id() >= MAXIMUM_BLOCK);
        assert!(b.block_id() > a.block_id());
    }

    #[test]
    fn test_persisted_ids_below_boundary() {
        let manager = BufferManager::new();
        let id = manager.create_persisted(&[1, 2, 3]);
        assert!(id < MAXIMUM_BLOCK);
        let handle = manager.pin(id).unwrap();
        assert_eq!(&handle.read()[..3], &[1, 2, 3]);
    }

    #[test]
    fn test_pin_unknown_block() {
        let manager = BufferManager::new();
        assert!(matches!(manager.pin(99), Err(Error::BlockNotFound(99))));
    }

    #[test]
    fn test_handle_writes_are_visible_to_later_pins() {
        let manager = BufferManager::new();
        let handle = manager.allocate(BLOCK_ALLOC_SIZE);
        handle.write()[0] = 0xAB;
        let again = manager.pin(handle.block_id()).unwrap();
        assert_eq!(again.read()[0], 0xAB);
    }
}
