// Explicit drops are used for clarity in memory tests. This documents the
// point at which every remaining entry should be released.
#![allow(clippy::drop_non_drop)]

//! Drop accounting tests for oaktree.
//!
//! Every key and value owned by the tree must be released exactly once,
//! whether it leaves through `remove`, `update`, `clear`, a rejected insert
//! or dropping the tree itself. Splits, steals and merges move entries
//! between nodes and must never duplicate or lose one.
//!
//! # Test Design
//!
//! Each test follows this pattern:
//! 1. Insert tracked entries sharing a drop counter
//! 2. Perform operations that restructure the tree
//! 3. Check the counter against the number of entries released so far
//!
//! For more thorough leak detection, run under LeakSanitizer:
//!
//! ```bash
//! RUSTFLAGS="-Zsanitizer=leak" cargo +nightly test --test memory_tests --target x86_64-unknown-linux-gnu
//! ```

use oaktree::BTree;
use std::cell::Cell;
use std::rc::Rc;

// ===========================================================================
// Helper Types
// ===========================================================================

/// A value that increments a shared counter when dropped.
#[derive(Debug)]
struct Tracked {
	id: i32,
	drops: Rc<Cell<usize>>,
}

impl Tracked {
	fn new(id: i32, drops: &Rc<Cell<usize>>) -> Self {
		Tracked {
			id,
			drops: Rc::clone(drops),
		}
	}
}

impl Drop for Tracked {
	fn drop(&mut self) {
		self.drops.set(self.drops.get() + 1);
	}
}

fn filled(t: usize, n: i32, drops: &Rc<Cell<usize>>) -> BTree<i32, Tracked> {
	let mut tree = BTree::new(t).unwrap();
	for i in 0..n {
		assert!(tree.insert(i, Tracked::new(i, drops)));
	}
	tree
}

// ===========================================================================
// Basic Drop Tests
// ===========================================================================

/// Dropping the tree releases every value exactly once.
#[test]
fn drop_tree_releases_all_values() {
	let drops = Rc::new(Cell::new(0));
	let tree = filled(2, 1_000, &drops);

	assert_eq!(drops.get(), 0, "no value should be dropped while in the tree");
	drop(tree);
	assert_eq!(drops.get(), 1_000);
}

/// Restructuring during inserts moves values without dropping them.
#[test]
fn splits_do_not_drop_values() {
	let drops = Rc::new(Cell::new(0));
	let mut tree = BTree::new(2).unwrap();

	for i in (0..500).rev() {
		tree.insert(i, Tracked::new(i, &drops));
		assert_eq!(drops.get(), 0);
	}
	tree.assert_invariants();
	assert!(tree.height() > 3);
}

/// Each removal hands back the value; the tree keeps no copy.
#[test]
fn remove_returns_ownership() {
	let drops = Rc::new(Cell::new(0));
	let mut tree = filled(3, 500, &drops);

	for i in 0..500 {
		let value = tree.remove(&i).unwrap();
		assert_eq!(value.id, i);
		assert_eq!(drops.get(), i as usize, "steals and merges must not drop values");
		drop(value);
		assert_eq!(drops.get(), i as usize + 1);
	}

	assert!(tree.is_empty());
	drop(tree);
	assert_eq!(drops.get(), 500);
}

/// Removing from the middle of an internal node substitutes the predecessor
/// or successor; only the removed value leaves the tree.
#[test]
fn remove_internal_keys() {
	let drops = Rc::new(Cell::new(0));
	let mut tree = filled(2, 300, &drops);
	let mut released = 0;

	while let Some(root_key) = tree.levels().first().and_then(|level| level[0].first().copied()) {
		let (key, value) = tree.remove_entry(&root_key).unwrap();
		assert_eq!(key, value.id);
		released += 1;
		drop(value);
		assert_eq!(drops.get(), released);
	}

	assert_eq!(released, 300);
}

// ===========================================================================
// Replacement Tests
// ===========================================================================

/// A rejected insert drops the offered value; the stored one survives.
#[test]
fn duplicate_insert_drops_offered_value() {
	let drops = Rc::new(Cell::new(0));
	let mut tree = filled(2, 10, &drops);

	assert!(!tree.insert(5, Tracked::new(-5, &drops)));
	assert_eq!(drops.get(), 1);
	assert_eq!(tree.get(&5).map(|v| v.id), Some(5));
	assert_eq!(tree.len(), 10);
}

/// Update returns the previous value and keeps the new one.
#[test]
fn update_returns_previous_value() {
	let drops = Rc::new(Cell::new(0));
	let mut tree = filled(2, 10, &drops);

	let old = tree.update(&3, Tracked::new(30, &drops)).unwrap();
	assert_eq!(old.id, 3);
	assert_eq!(drops.get(), 0);
	drop(old);
	assert_eq!(drops.get(), 1);
	assert_eq!(tree.get(&3).map(|v| v.id), Some(30));

	// A missing key stores nothing, so the offered value is dropped.
	assert!(tree.update(&99, Tracked::new(99, &drops)).is_none());
	assert_eq!(drops.get(), 2);

	drop(tree);
	assert_eq!(drops.get(), 12);
}

// ===========================================================================
// Bulk Release Tests
// ===========================================================================

#[test]
fn clear_releases_all_values() {
	let drops = Rc::new(Cell::new(0));
	let mut tree = filled(4, 2_000, &drops);

	tree.clear();
	assert_eq!(drops.get(), 2_000);
	assert!(tree.is_empty());

	tree.insert(1, Tracked::new(1, &drops));
	drop(tree);
	assert_eq!(drops.get(), 2_001);
}

#[test]
fn into_sorted_vec_transfers_all_values() {
	let drops = Rc::new(Cell::new(0));
	let tree = filled(2, 400, &drops);

	let entries = tree.into_sorted_vec();
	assert_eq!(drops.get(), 0);
	assert_eq!(entries.len(), 400);
	assert!(entries.iter().all(|(k, v)| *k == v.id));

	drop(entries);
	assert_eq!(drops.get(), 400);
}

/// Interleaved inserts and removes never leak or double drop.
#[test]
fn churn_accounts_for_every_value() {
	let drops = Rc::new(Cell::new(0));
	let mut tree = BTree::new(2).unwrap();
	let mut created = 0;

	for round in 0..10 {
		for i in 0..200 {
			// A rejected value is dropped on the spot.
			tree.insert(i, Tracked::new(i, &drops));
			created += 1;
		}
		for i in (round % 3..200).step_by(3) {
			tree.remove(&i);
		}
		tree.assert_invariants();
		assert_eq!(drops.get(), created - tree.len());
	}

	drop(tree);
	assert_eq!(drops.get(), created);
}
