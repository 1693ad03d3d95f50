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

//! Update-info records and the per-segment update arena
//!
//! An [`UpdateInfo`] is one transaction's delta against one vector of one
//! segment: a sorted list of intra-vector tuple offsets and a typed payload
//! of the new values. Nodes form a newest-first doubly-linked chain per
//! vector; the links are 32-bit arena handles rather than pointers, so
//! splicing a node out on rollback is a handle rewrite.
//!
//! Nodes are stored in the owning segment's update arena and are only
//! touched while the segment's lock is held.

use crate::core::{Result, Value};
use crate::storage::vector::Vector;

/// Handle of an update-info node inside its segment's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateNodeId(pub(crate) u32);

/// One transaction's uncommitted (or committed) delta for a single vector
#[derive(Debug)]
pub struct UpdateInfo {
    /// Tagged version: the writing transaction's id while uncommitted,
    /// replaced by the commit timestamp at commit
    pub(crate) version_number: u64,
    /// Which vector of the segment this delta applies to
    pub(crate) vector_index: usize,
    /// Strictly ascending intra-vector tuple offsets
    pub(crate) tuples: Vec<u32>,
    /// New values, parallel to `tuples`
    pub(crate) payload: Vector,
    /// Newer neighbor in the chain (toward the head)
    pub(crate) prev: Option<UpdateNodeId>,
    /// Older neighbor in the chain (toward the tail)
    pub(crate) next: Option<UpdateNodeId>,
}

impl UpdateInfo {
    pub(crate) fn new(version_number: u64, payload: Vector, capacity: usize) -> Self {
        Self {
            version_number,
            vector_index: 0,
            tuples: Vec::with_capacity(capacity),
            payload,
            prev: None,
            next: None,
        }
    }

    /// The tagged version number of this delta
    pub fn version_number(&self) -> u64 {
        self.version_number
    }

    /// Sorted intra-vector tuple offsets touched by this delta
    pub fn tuples(&self) -> &[u32] {
        &self.tuples
    }

    /// The value written for tuple offset `tuples()[i]`
    pub fn payload_value(&self, i: usize) -> Value {
        self.payload.value(i)
    }

    /// Returns true if any of the sorted `rel_ids` appears in `tuples`
    ///
    /// Both inputs are sorted, so this is a merge scan.
    pub(crate) fn overlaps(&self, rel_ids: &[u32]) -> bool {
        let mut i = 0;
        let mut j = 0;
        while i < rel_ids.len() && j < self.tuples.len() {
            if rel_ids[i] == self.tuples[j] {
                return true;
            } else if rel_ids[i] < self.tuples[j] {
                i += 1;
            } else {
                j += 1;
            }
        }
        false
    }

    /// Merge another sorted batch from the same transaction into this node
    ///
    /// For a tuple updated twice, the newer value wins.
    pub(crate) fn merge(&mut self, rel_ids: &[u32], values: &Vector) -> Result<()> {
        let capacity = self.tuples.len() + rel_ids.len();
        let mut merged_tuples = Vec::with_capacity(capacity);
        let mut merged_payload = Vector::with_capacity(self.payload.physical_type(), capacity);
        let mut i = 0;
        let mut j = 0;
        while i < self.tuples.len() || j < rel_ids.len() {
            if j >= rel_ids.len() || (i < self.tuples.len() && self.tuples[i] < rel_ids[j]) {
                merged_tuples.push(self.tuples[i]);
                merged_payload.push_from(&self.payload, i)?;
                i += 1;
            } else if i >= self.tuples.len() || rel_ids[j] < self.tuples[i] {
                merged_tuples.push(rel_ids[j]);
                merged_payload.push_from(values, j)?;
                j += 1;
            } else {
                merged_tuples.push(rel_ids[j]);
                merged_payload.push_from(values, j)?;
                i += 1;
                j += 1;
            }
        }
        self.tuples = merged_tuples;
        self.payload = merged_payload;
        Ok(())
    }
}

/// Slab arena holding a segment's update-info nodes
///
/// Freed slots are recycled through a free list so rollback-heavy workloads
/// do not grow the arena without bound.
pub(crate) struct UpdateArena {
    nodes: Vec<Option<UpdateInfo>>,
    free: Vec<u32>,
}

impl UpdateArena {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn insert(&mut self, info: UpdateInfo) -> UpdateNodeId {
        if let Some(slot) = self.free.pop() {
            self.nodes[slot as usize] = Some(info);
            UpdateNodeId(slot)
        } else {
            let slot = self.nodes.len() as u32;
            self.nodes.push(Some(info));
            UpdateNodeId(slot)
        }
    }

    pub fn get(&self, id: UpdateNodeId) -> &UpdateInfo {
        self.nodes[id.0 as usize]
            .as_ref()
            .expect("stale update-info handle")
    }

    pub fn get_mut(&mut self, id: UpdateNodeId) -> &mut UpdateInfo {
        self.nodes[id.0 as usize]
            .as_mut()
            .expect("stale update-info handle")
    }

    pub fn remove(&mut self, id: UpdateNodeId) -> UpdateInfo {
        let info = self.nodes[id.0 as usize]
            .take()
            .expect("stale update-info handle");
        self.free.push(id.0);
        info
    }

    #[cfg(test)]
    pub fn live_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PhysicalType;

    fn info_with_tuples(tuples: &[u32], values: &[i32]) -> UpdateInfo {
        let mut payload = Vector::with_capacity(PhysicalType::Int32, values.len());
        for v in values {
            payload.push(&Value::Integer(*v)).unwrap();
        }
        let mut info = UpdateInfo::new(1, payload, tuples.len());
        info.tuples.extend_from_slice(tuples);
        info
    }

    #[test]
    fn test_overlap_merge_scan() {
        let info = info_with_tuples(&[1, 3, 5], &[10, 30, 50]);
        assert!(info.overlaps(&[3, 7]));
        assert!(info.overlaps(&[0, 5]));
        assert!(!info.overlaps(&[0, 2, 4, 6]));
        assert!(!info.overlaps(&[]));
    }

    #[test]
    fn test_merge_disjoint() {
        let mut info = info_with_tuples(&[1, 5], &[10, 50]);
        let values = Vector::from_values(
            PhysicalType::Int32,
            &[Value::Integer(20), Value::Integer(30)],
        )
        .unwrap();
        info.merge(&[2, 3], &values).unwrap();
        assert_eq!(info.tuples(), &[1, 2, 3, 5]);
        assert_eq!(info.payload_value(1), Value::Integer(20));
        assert_eq!(info.payload_value(3), Value::Integer(50));
    }

    #[test]
    fn test_merge_newer_value_wins() {
        let mut info = info_with_tuples(&[1, 3], &[10, 30]);
        let values = Vector::from_values(PhysicalType::Int32, &[Value::Integer(99)]).unwrap();
        info.merge(&[3], &values).unwrap();
        assert_eq!(info.tuples(), &[1, 3]);
        assert_eq!(info.payload_value(1), Value::Integer(99));
    }

    #[test]
    fn test_arena_slot_reuse() {
        let mut arena = UpdateArena::new();
        let a = arena.insert(info_with_tuples(&[0], &[1]));
        let b = arena.insert(info_with_tuples(&[1], &[2]));
        arena.remove(a);
        let c = arena.insert(info_with_tuples(&[2], &[3]));
        assert_eq!(c, a);
        assert_eq!(arena.live_count(), 2);
        assert_eq!(arena.get(b).tuples(), &[1]);
    }
}
