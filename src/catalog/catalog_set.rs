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

//! Versioned catalog set
//!
//! A [`CatalogSet`] is a transactional name→entry map with snapshot
//! isolation. Every name maps to a singly-linked version chain, newest
//! first, terminated by a dummy node (`timestamp = 0`, deleted). Deletion
//! never removes a chain from the map; it installs a tombstone head.
//!
//! Chain nodes live in a slab arena indexed by [`EntryHandle`]: `child` is
//! an owned handle, `parent` a non-owning back-reference, and rollback is a
//! handle rewrite. One mutex serializes the map, the arena and every chain
//! mutation. Transactions hold shared ownership of the guarded state
//! through [`CatalogVersions`], so commit stamping and undo reach it
//! without caring about the payload type.
//!
//! # Chain invariants
//!
//! - At most one uncommitted head (`timestamp >= TRANSACTION_ID_START`) per
//!   chain; a second concurrent writer is a write-write conflict.
//! - Committed timestamps strictly decrease from head toward the tail.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::core::{Error, Result};
use crate::storage::mvcc::transaction::{Transaction, TRANSACTION_ID_START};

/// Handle of a version-chain node inside its set's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryHandle(u32);

/// Version-chain operations a transaction invokes at commit and rollback
///
/// `Transaction` is not generic over the catalog payload, so its undo buffer
/// reaches the owning set's guarded state through this object-safe trait.
pub trait CatalogVersions: Send + Sync {
    /// Stamp the parent of the buffered `child` with the commit timestamp
    fn commit_entry(&self, child: EntryHandle, commit_ts: u64);

    /// Splice the aborted head out, promoting `entry` back to its position
    fn undo(&self, entry: EntryHandle);
}

struct EntryNode<T> {
    name: Arc<str>,
    /// Tagged version: uncommitted transaction id or commit timestamp
    timestamp: u64,
    deleted: bool,
    child: Option<EntryHandle>,
    parent: Option<EntryHandle>,
    /// Payload; dummy and tombstone nodes carry none
    value: Option<Arc<T>>,
}

struct CatalogSetInner<T> {
    map: FxHashMap<Arc<str>, EntryHandle>,
    nodes: Vec<Option<EntryNode<T>>>,
    free: Vec<u32>,
}

impl<T> CatalogSetInner<T> {
    fn alloc(&mut self, node: EntryNode<T>) -> EntryHandle {
        if let Some(slot) = self.free.pop() {
            self.nodes[slot as usize] = Some(node);
            EntryHandle(slot)
        } else {
            let slot = self.nodes.len() as u32;
            self.nodes.push(Some(node));
            EntryHandle(slot)
        }
    }

    fn node(&self, handle: EntryHandle) -> &EntryNode<T> {
        self.nodes[handle.0 as usize]
            .as_ref()
            .expect("stale catalog entry handle")
    }

    fn node_mut(&mut self, handle: EntryHandle) -> &mut EntryNode<T> {
        self.nodes[handle.0 as usize]
            .as_mut()
            .expect("stale catalog entry handle")
    }

    fn release(&mut self, handle: EntryHandle) -> EntryNode<T> {
        let node = self.nodes[handle.0 as usize]
            .take()
            .expect("stale catalog entry handle");
        self.free.push(handle.0);
        node
    }

    /// First chain node visible to `txn`, walking from the head
    ///
    /// The tail dummy is always visible.
    fn visible_from(&self, head: EntryHandle, txn: &Transaction<'_>) -> EntryHandle {
        let mut current = head;
        loop {
            let node = self.node(current);
            let Some(child) = node.child else {
                return current;
            };
            if node.timestamp == txn.transaction_id() {
                // our own version
                return current;
            }
            if node.timestamp < txn.start_time() {
                // committed before we started
                return current;
            }
            current = child;
        }
    }

    fn commit_entry(&mut self, child: EntryHandle, commit_ts: u64) {
        let parent = self
            .node(child)
            .parent
            .expect("buffered catalog entry must have a parent");
        self.node_mut(parent).timestamp = commit_ts;
    }

    fn undo(&mut self, entry: EntryHandle) {
        let parent = self
            .node(entry)
            .parent
            .expect("undo target must have a parent");
        let parent_node = self.release(parent);
        debug_assert_eq!(parent_node.child, Some(entry));
        match parent_node.parent {
            Some(grandparent) => self.node_mut(grandparent).child = Some(entry),
            None => {
                self.map.insert(Arc::clone(&parent_node.name), entry);
            }
        }
        self.node_mut(entry).parent = parent_node.parent;
    }
}

/// Snapshot-isolated name→entry map
///
/// Process-wide; entries are never physically removed from the map.
pub struct CatalogSet<T> {
    inner: Arc<Mutex<CatalogSetInner<T>>>,
}

impl<T: Send + Sync + 'static> CatalogSet<T> {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(CatalogSetInner {
                map: FxHashMap::default(),
                nodes: Vec::new(),
                free: Vec::new(),
            })),
        }
    }

    /// Install `value` as the new head version for `name`
    ///
    /// Returns `Ok(false)` if a visible non-deleted version already exists,
    /// and a write-write conflict if the current head is uncommitted.
    pub fn create_entry(
        &self,
        txn: &mut Transaction<'_>,
        name: &str,
        value: T,
    ) -> Result<bool> {
        let mut inner = self.inner.lock();
        let (key, prev_head) = match inner.map.get(name).copied() {
            None => {
                // never created: start the chain with a dummy tombstone so
                // transactions begun before our commit keep seeing absence
                let key: Arc<str> = Arc::from(name);
                let dummy = inner.alloc(EntryNode {
                    name: Arc::clone(&key),
                    timestamp: 0,
                    deleted: true,
                    child: None,
                    parent: None,
                    value: None,
                });
                inner.map.insert(Arc::clone(&key), dummy);
                (key, dummy)
            }
            Some(head) => {
                let node = inner.node(head);
                if node.timestamp >= TRANSACTION_ID_START {
                    return Err(Error::write_write_conflict(name));
                }
                if !node.deleted {
                    // a committed live version exists
                    return Ok(false);
                }
                (Arc::clone(&node.name), head)
            }
        };

        let new_head = inner.alloc(EntryNode {
            name: Arc::clone(&key),
            timestamp: txn.transaction_id(),
            deleted: false,
            child: Some(prev_head),
            parent: None,
            value: Some(Arc::new(value)),
        });
        inner.node_mut(prev_head).parent = Some(new_head);
        inner.map.insert(key, new_head);
        drop(inner);

        log::trace!("create catalog entry '{}'", name);
        txn.push_catalog_entry(
            Arc::clone(&self.inner) as Arc<dyn CatalogVersions>,
            prev_head,
        );
        Ok(true)
    }

    /// Install a tombstone head for `name`
    ///
    /// Returns `Ok(false)` if no version is visible to `txn` or the visible
    /// version is already deleted; a write-write conflict if the current
    /// head is uncommitted.
    pub fn drop_entry(&self, txn: &mut Transaction<'_>, name: &str) -> Result<bool> {
        let mut inner = self.inner.lock();
        let Some(head) = inner.map.get(name).copied() else {
            return Ok(false);
        };
        if inner.node(head).timestamp >= TRANSACTION_ID_START {
            return Err(Error::write_write_conflict(name));
        }
        let visible = inner.visible_from(head, txn);
        if inner.node(visible).deleted {
            return Ok(false);
        }

        let key = Arc::clone(&inner.node(head).name);
        let tombstone = inner.alloc(EntryNode {
            name: Arc::clone(&key),
            timestamp: txn.transaction_id(),
            deleted: true,
            child: Some(head),
            parent: None,
            value: None,
        });
        inner.node_mut(head).parent = Some(tombstone);
        inner.map.insert(key, tombstone);
        drop(inner);

        log::trace!("drop catalog entry '{}'", name);
        txn.push_catalog_entry(Arc::clone(&self.inner) as Arc<dyn CatalogVersions>, head);
        Ok(true)
    }

    /// Returns true if a non-deleted version of `name` is visible to `txn`
    pub fn entry_exists(&self, txn: &Transaction<'_>, name: &str) -> bool {
        let inner = self.inner.lock();
        let Some(head) = inner.map.get(name).copied() else {
            return false;
        };
        let visible = inner.visible_from(head, txn);
        !inner.node(visible).deleted
    }

    /// The payload of the version of `name` visible to `txn`, if any
    pub fn get_entry(&self, txn: &Transaction<'_>, name: &str) -> Option<Arc<T>> {
        let inner = self.inner.lock();
        let head = inner.map.get(name).copied()?;
        let visible = inner.visible_from(head, txn);
        let node = inner.node(visible);
        if node.deleted {
            return None;
        }
        node.value.as_ref().map(Arc::clone)
    }

    /// Splice the aborted head above `entry` out of its chain
    ///
    /// Invoked with the chain position a transaction buffered when it
    /// installed a version; normally reached through rollback.
    pub fn undo(&self, entry: EntryHandle) {
        self.inner.lock().undo(entry);
    }

    /// Chain snapshot for `name`, head to tail, as (timestamp, deleted) pairs
    pub fn version_chain(&self, name: &str) -> Vec<(u64, bool)> {
        let inner = self.inner.lock();
        let mut chain = Vec::new();
        let Some(head) = inner.map.get(name).copied() else {
            return chain;
        };
        let mut current = Some(head);
        while let Some(handle) = current {
            let node = inner.node(handle);
            chain.push((node.timestamp, node.deleted));
            current = node.child;
        }
        chain
    }
}

impl<T: Send + Sync + 'static> Default for CatalogSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> CatalogVersions for Mutex<CatalogSetInner<T>> {
    fn commit_entry(&self, child: EntryHandle, commit_ts: u64) {
        self.lock().commit_entry(child, commit_ts);
    }

    fn undo(&self, entry: EntryHandle) {
        self.lock().undo(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::mvcc::transaction::TransactionManager;

    fn setup() -> (TransactionManager, CatalogSet<String>) {
        (TransactionManager::new(), CatalogSet::new())
    }

    #[test]
    fn test_create_and_read_own_write() {
        let (manager, set) = setup();
        let mut txn = manager.begin();
        assert!(set
            .create_entry(&mut txn, "t", "schema".to_string())
            .unwrap());
        assert!(set.entry_exists(&txn, "t"));
        assert_eq!(set.get_entry(&txn, "t").unwrap().as_str(), "schema");
    }

    #[test]
    fn test_uncommitted_entry_invisible_to_others() {
        let (manager, set) = setup();
        let mut t1 = manager.begin();
        set.create_entry(&mut t1, "t", "v".to_string()).unwrap();

        let t2 = manager.begin();
        assert!(!set.entry_exists(&t2, "t"));
        assert!(set.get_entry(&t2, "t").is_none());
    }

    #[test]
    fn test_committed_entry_visible_to_later_transactions() {
        let (manager, set) = setup();
        let mut t1 = manager.begin();
        set.create_entry(&mut t1, "t", "v".to_string()).unwrap();
        t1.commit().unwrap();

        let t2 = manager.begin();
        assert!(set.entry_exists(&t2, "t"));
    }

    #[test]
    fn test_snapshot_does_not_see_later_commit() {
        let (manager, set) = setup();
        let t2 = manager.begin();

        let mut t1 = manager.begin();
        set.create_entry(&mut t1, "t", "v".to_string()).unwrap();
        t1.commit().unwrap();

        // t2 began before t1 committed
        assert!(!set.entry_exists(&t2, "t"));
    }

    #[test]
    fn test_write_write_conflict_on_create() {
        let (manager, set) = setup();
        let mut t1 = manager.begin();
        set.create_entry(&mut t1, "t", "v1".to_string()).unwrap();

        let mut t2 = manager.begin();
        let err = set
            .create_entry(&mut t2, "t", "v2".to_string())
            .unwrap_err();
        assert!(matches!(err, Error::WriteWriteConflict { .. }));
    }

    #[test]
    fn test_create_existing_returns_false() {
        let (manager, set) = setup();
        let mut t1 = manager.begin();
        set.create_entry(&mut t1, "t", "v1".to_string()).unwrap();
        t1.commit().unwrap();

        let mut t2 = manager.begin();
        assert!(!set
            .create_entry(&mut t2, "t", "v2".to_string())
            .unwrap());
    }

    #[test]
    fn test_undo_restores_chain() {
        let (manager, set) = setup();
        let mut t0 = manager.begin();
        set.create_entry(&mut t0, "t", "base".to_string()).unwrap();
        let commit_ts = t0.commit().unwrap();
        let before = set.version_chain("t");
        assert_eq!(before, vec![(commit_ts, false), (0, true)]);

        let mut t1 = manager.begin();
        set.drop_entry(&mut t1, "t").unwrap();
        assert_eq!(set.version_chain("t").len(), 3);
        t1.rollback();

        assert_eq!(set.version_chain("t"), before);
        let t2 = manager.begin();
        assert!(set.entry_exists(&t2, "t"));
    }

    #[test]
    fn test_rollback_of_create_restores_absence() {
        let (manager, set) = setup();
        let mut t1 = manager.begin();
        set.create_entry(&mut t1, "t", "v".to_string()).unwrap();
        t1.rollback();

        let t2 = manager.begin();
        assert!(!set.entry_exists(&t2, "t"));
        // the dummy stays behind as the chain terminator
        assert_eq!(set.version_chain("t"), vec![(0, true)]);
    }

    #[test]
    fn test_drop_entry_tombstone() {
        let (manager, set) = setup();
        let mut t1 = manager.begin();
        set.create_entry(&mut t1, "t", "v".to_string()).unwrap();
        t1.commit().unwrap();

        let mut t2 = manager.begin();
        assert!(set.drop_entry(&mut t2, "t").unwrap());
        // dropper no longer sees it, a concurrent snapshot still does
        assert!(!set.entry_exists(&t2, "t"));
        let t3 = manager.begin();
        assert!(set.entry_exists(&t3, "t"));
        t2.commit().unwrap();

        let t4 = manager.begin();
        assert!(!set.entry_exists(&t4, "t"));
    }

    #[test]
    fn test_drop_missing_returns_false() {
        let (manager, set) = setup();
        let mut txn = manager.begin();
        assert!(!set.drop_entry(&mut txn, "missing").unwrap());
    }

    #[test]
    fn test_drop_conflicts_with_uncommitted_create() {
        let (manager, set) = setup();
        let mut t1 = manager.begin();
        set.create_entry(&mut t1, "t", "v".to_string()).unwrap();

        let mut t2 = manager.begin();
        let err = set.drop_entry(&mut t2, "t").unwrap_err();
        assert!(matches!(err, Error::WriteWriteConflict { .. }));
    }

    #[test]
    fn test_recreate_after_committed_drop() {
        let (manager, set) = setup();
        let mut t1 = manager.begin();
        set.create_entry(&mut t1, "t", "v1".to_string()).unwrap();
        t1.commit().unwrap();

        let mut t2 = manager.begin();
        set.drop_entry(&mut t2, "t").unwrap();
        t2.commit().unwrap();

        let mut t3 = manager.begin();
        assert!(set
            .create_entry(&mut t3, "t", "v2".to_string())
            .unwrap());
        assert_eq!(set.get_entry(&t3, "t").unwrap().as_str(), "v2");
    }

    #[test]
    fn test_dropped_transaction_rolls_back() {
        let (manager, set) = setup();
        {
            let mut t1 = manager.begin();
            set.create_entry(&mut t1, "t", "v".to_string()).unwrap();
            // dropped without commit
        }
        let t2 = manager.begin();
        assert!(!set.entry_exists(&t2, "t"));
    }
}
