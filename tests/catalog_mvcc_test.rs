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

//! Catalog Snapshot Isolation Tests
//!
//! End-to-end coverage of the versioned catalog set: created entries become
//! visible exactly at commit, concurrent writers conflict instead of
//! overwriting each other, and rollback restores the version chain to its
//! pre-statement shape.

use std::sync::Arc;
use std::thread;

use strata::{CatalogSet, Error, TransactionManager};

#[derive(Debug, PartialEq)]
struct TableEntry {
    column_count: usize,
}

fn setup() -> (Arc<TransactionManager>, Arc<CatalogSet<TableEntry>>) {
    (
        Arc::new(TransactionManager::new()),
        Arc::new(CatalogSet::new()),
    )
}

/// A committed entry is visible to transactions that begin afterwards, and
/// carries the creator's payload.
#[test]
fn test_create_commit_then_visible() {
    let (manager, catalog) = setup();

    let mut t1 = manager.begin();
    assert!(catalog
        .create_entry(&mut t1, "orders", TableEntry { column_count: 4 })
        .expect("create failed"));
    t1.commit().expect("commit failed");

    let t2 = manager.begin();
    assert!(catalog.entry_exists(&t2, "orders"));
    let entry = catalog.get_entry(&t2, "orders").expect("entry missing");
    assert_eq!(entry.column_count, 4);
}

/// An uncommitted entry stays invisible to a concurrent snapshot.
#[test]
fn test_uncommitted_create_invisible() {
    let (manager, catalog) = setup();

    let mut t1 = manager.begin();
    catalog
        .create_entry(&mut t1, "orders", TableEntry { column_count: 4 })
        .expect("create failed");

    let t2 = manager.begin();
    assert!(!catalog.entry_exists(&t2, "orders"));
    assert!(catalog.get_entry(&t2, "orders").is_none());

    // still invisible after t1 commits, because t2's snapshot predates it
    t1.commit().expect("commit failed");
    assert!(!catalog.entry_exists(&t2, "orders"));
}

/// A second uncommitted writer on the same name raises a write-write
/// conflict, for create and drop in either order.
#[test]
fn test_write_write_exclusion() {
    let (manager, catalog) = setup();

    let mut t1 = manager.begin();
    catalog
        .create_entry(&mut t1, "orders", TableEntry { column_count: 1 })
        .expect("create failed");

    let mut t2 = manager.begin();
    assert!(matches!(
        catalog.create_entry(&mut t2, "orders", TableEntry { column_count: 2 }),
        Err(Error::WriteWriteConflict { .. })
    ));
    assert!(matches!(
        catalog.drop_entry(&mut t2, "orders"),
        Err(Error::WriteWriteConflict { .. })
    ));

    // the same holds with an uncommitted tombstone at the head
    t1.commit().expect("commit failed");
    let mut t3 = manager.begin();
    assert!(catalog.drop_entry(&mut t3, "orders").expect("drop failed"));
    let mut t4 = manager.begin();
    assert!(matches!(
        catalog.create_entry(&mut t4, "orders", TableEntry { column_count: 3 }),
        Err(Error::WriteWriteConflict { .. })
    ));
}

/// Create followed by rollback leaves the chain exactly as it was.
#[test]
fn test_undo_inverts_create() {
    let (manager, catalog) = setup();

    let mut t0 = manager.begin();
    catalog
        .create_entry(&mut t0, "orders", TableEntry { column_count: 1 })
        .expect("create failed");
    t0.commit().expect("commit failed");
    let before = catalog.version_chain("orders");

    let mut t1 = manager.begin();
    catalog.drop_entry(&mut t1, "orders").expect("drop failed");
    assert_ne!(catalog.version_chain("orders"), before);
    t1.rollback();
    assert_eq!(catalog.version_chain("orders"), before);

    // a fresh name rolled back leaves only the dummy terminator
    let mut t2 = manager.begin();
    catalog
        .create_entry(&mut t2, "items", TableEntry { column_count: 2 })
        .expect("create failed");
    t2.rollback();
    assert_eq!(catalog.version_chain("items"), vec![(0, true)]);
    let t3 = manager.begin();
    assert!(!catalog.entry_exists(&t3, "items"));
}

/// A dropped entry disappears for post-commit snapshots while older
/// snapshots keep seeing the previous version.
#[test]
fn test_drop_respects_snapshots() {
    let (manager, catalog) = setup();

    let mut t1 = manager.begin();
    catalog
        .create_entry(&mut t1, "orders", TableEntry { column_count: 1 })
        .expect("create failed");
    t1.commit().expect("commit failed");

    let reader = manager.begin();

    let mut t2 = manager.begin();
    assert!(catalog.drop_entry(&mut t2, "orders").expect("drop failed"));
    t2.commit().expect("commit failed");

    // the reader began before the drop committed
    assert!(catalog.entry_exists(&reader, "orders"));
    let t3 = manager.begin();
    assert!(!catalog.entry_exists(&t3, "orders"));
}

/// Dropping a name that is absent (never created, or deleted under the
/// snapshot) reports absence rather than an error.
#[test]
fn test_drop_absent_entry() {
    let (manager, catalog) = setup();

    let mut t1 = manager.begin();
    assert!(!catalog.drop_entry(&mut t1, "ghost").expect("drop failed"));

    catalog
        .create_entry(&mut t1, "orders", TableEntry { column_count: 1 })
        .expect("create failed");
    t1.commit().expect("commit failed");
    let mut t2 = manager.begin();
    catalog.drop_entry(&mut t2, "orders").expect("drop failed");
    t2.commit().expect("commit failed");

    let mut t3 = manager.begin();
    assert!(!catalog.drop_entry(&mut t3, "orders").expect("drop failed"));
}

/// Interleaved snapshots each see their own consistent version of an entry
/// that is recreated across their lifetimes.
#[test]
fn test_recreate_versions_layer_correctly() {
    let (manager, catalog) = setup();

    let mut t1 = manager.begin();
    catalog
        .create_entry(&mut t1, "orders", TableEntry { column_count: 1 })
        .expect("create failed");
    t1.commit().expect("commit failed");

    let old_reader = manager.begin();

    let mut t2 = manager.begin();
    catalog.drop_entry(&mut t2, "orders").expect("drop failed");
    t2.commit().expect("commit failed");

    let mut t3 = manager.begin();
    catalog
        .create_entry(&mut t3, "orders", TableEntry { column_count: 9 })
        .expect("create failed");
    t3.commit().expect("commit failed");

    let new_reader = manager.begin();

    assert_eq!(
        catalog.get_entry(&old_reader, "orders").expect("missing").column_count,
        1
    );
    assert_eq!(
        catalog.get_entry(&new_reader, "orders").expect("missing").column_count,
        9
    );
}

/// Concurrent readers never observe a half-committed catalog state.
#[test]
fn test_concurrent_visibility_is_atomic() {
    let (manager, catalog) = setup();

    let writer_manager = Arc::clone(&manager);
    let writer_catalog = Arc::clone(&catalog);
    let writer = thread::spawn(move || {
        for i in 0..50 {
            let mut txn = writer_manager.begin();
            let name = format!("t{}", i);
            writer_catalog
                .create_entry(&mut txn, &name, TableEntry { column_count: i })
                .expect("create failed");
            txn.commit().expect("commit failed");
        }
    });

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let catalog = Arc::clone(&catalog);
            thread::spawn(move || {
                for _ in 0..200 {
                    let txn = manager.begin();
                    // whatever exists must be fully readable
                    for i in 0..50 {
                        let name = format!("t{}", i);
                        if let Some(entry) = catalog.get_entry(&txn, &name) {
                            assert_eq!(entry.column_count, i);
                        }
                    }
                }
            })
        })
        .collect();

    writer.join().expect("writer panicked");
    for reader in readers {
        reader.join().expect("reader panicked");
    }

    let txn = manager.begin();
    for i in 0..50 {
        assert!(catalog.entry_exists(&txn, &format!("t{}", i)));
    }
}

/// Conflicting writers retried after the winner commits eventually succeed.
#[test]
fn test_conflict_then_retry_succeeds() {
    let (manager, catalog) = setup();

    let mut t1 = manager.begin();
    catalog
        .create_entry(&mut t1, "orders", TableEntry { column_count: 1 })
        .expect("create failed");

    let mut t2 = manager.begin();
    assert!(matches!(
        catalog.create_entry(&mut t2, "orders", TableEntry { column_count: 2 }),
        Err(Error::WriteWriteConflict { .. })
    ));
    t1.commit().expect("commit failed");

    // after the winner commits the loser sees "already exists" instead
    let mut t3 = manager.begin();
    assert!(!catalog
        .create_entry(&mut t3, "orders", TableEntry { column_count: 2 })
        .expect("create failed"));
}
