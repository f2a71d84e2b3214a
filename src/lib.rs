//! # Oaktree: An In-Memory B-Tree Map
//!
//! This crate provides a single-threaded ordered map built as a classic
//! B-tree: every node stores key/value items, internal nodes also store
//! child subtrees, and the whole structure is kept height-balanced after
//! every mutation.
//!
//! ## Design Overview
//!
//! ### Minimum Degree
//!
//! A tree is configured with a minimum degree `t >= 2`. Every node except the
//! root holds between `t - 1` and `2t - 1` items, and an internal node has
//! exactly one more child than it has items. All leaves sit at the same
//! depth.
//!
//! ### Top-Down Rebalancing
//!
//! Both insertion and removal restructure the tree on the way *down*, so no
//! operation ever climbs back up to fix a parent:
//!
//! - **Insertion** splits any full node it is about to enter. The node that
//!   finally receives the new item is guaranteed to have room, and a split
//!   always has room to promote its median into the (already non-full)
//!   parent.
//! - **Removal** tops up any node at minimum occupancy before entering it,
//!   first by stealing an item from a sibling through the parent and
//!   otherwise by merging with a sibling. Whatever happens further down can
//!   then take one item from that node without underflowing it.
//!
//! ### Tree Structure
//!
//! ```text
//!                      ┌──────────────┐
//!                      │    [ 20 ]    │  <- root: 1 ..= 2t-1 items
//!                      └──────┬───────┘
//!                 ┌───────────┴───────────┐
//!                 ▼                       ▼
//!          ┌─────────────┐         ┌─────────────┐
//!          │  [ 7 | 10 ] │         │  [ 30 ]     │  <- t-1 ..= 2t-1 items
//!          └──────┬──────┘         └──────┬──────┘
//!          ┌──────┼──────┐          ┌─────┴─────┐
//!          ▼      ▼      ▼          ▼           ▼
//!         [3]    [8]   [12|15]    [25]       [40|50]     <- leaves, same depth
//! ```
//!
//! Items in internal nodes carry values too; a removed internal key is
//! replaced by its in-order predecessor or successor, which is then removed
//! from its leaf.
//!
//! ## Basic Usage
//!
//! ```
//! use oaktree::BTree;
//!
//! let mut tree = BTree::new(2).unwrap();
//!
//! assert!(tree.insert(10, "ten"));
//! assert!(tree.insert(7, "seven"));
//! assert!(!tree.insert(10, "again")); // duplicates are rejected
//!
//! assert_eq!(tree.get(&7), Some(&"seven"));
//! assert_eq!(tree.update(&7, "SEVEN"), Some("seven"));
//! assert_eq!(tree.remove(&10), Some("ten"));
//!
//! assert_eq!(tree.inorder_traverse(), vec![(&7, &"SEVEN")]);
//! assert_eq!(tree.len(), 1);
//! ```
//!
//! ## Thread Safety
//!
//! The tree performs no internal synchronisation. It is `Send`/`Sync` when
//! its keys, values and comparator are, which means shared reads are fine;
//! any mutation needs `&mut` access, so concurrent writers must wrap the
//! whole tree in an external lock.

use std::cmp::Ordering;
use std::fmt;
use std::mem;

use tracing::{debug, trace};

pub mod compare;
pub mod degree;
pub mod error;
mod node;
#[cfg(test)]
mod util;

pub use compare::{Comparator, Natural, Reverse};
pub use degree::{Degree, DEFAULT_DEGREE};
pub use error::{Error, Result};

use node::{Item, Node};

// ---------------------------------------------------------------------------
// Core Tree Structure
// ---------------------------------------------------------------------------

/// An ordered map from unique keys to values, stored as a B-tree.
///
/// # Type Parameters
///
/// - `K`: The key type.
/// - `V`: The value type.
/// - `C`: The [`Comparator`] ordering the keys. Defaults to [`Natural`],
///   the key's own `Ord`.
///
/// # Internal Structure
///
/// The tree owns its root node outright; each node owns its children. There
/// are no parent pointers, so restructuring is done from the parent's side
/// while descending.
pub struct BTree<K, V, C = Natural> {
	/// The root node, `None` when the tree is empty.
	root: Option<Box<Node<K, V>>>,
	/// Node capacity bounds, fixed at construction.
	degree: Degree,
	/// Number of items reachable from the root.
	len: usize,
	/// Total order over keys.
	comparator: C,
}

/// Which end of a subtree to take an item from.
#[derive(Debug, PartialEq, Copy, Clone)]
enum Edge {
	/// The minimum item (in-order successor of a parent separator).
	First,
	/// The maximum item (in-order predecessor of a parent separator).
	Last,
}

impl<K: Ord, V> BTree<K, V> {
	/// Creates an empty tree with minimum degree `t`, ordering keys by their
	/// `Ord` implementation.
	///
	/// # Errors
	///
	/// Returns [`Error::InvalidDegree`] if `t < 2`.
	///
	/// # Example
	///
	/// ```
	/// use oaktree::{BTree, Error};
	///
	/// let tree: BTree<i32, i32> = BTree::new(3).unwrap();
	/// assert!(tree.is_empty());
	/// assert_eq!(tree.degree(), 3);
	///
	/// assert!(matches!(BTree::<i32, i32>::new(1), Err(Error::InvalidDegree { degree: 1 })));
	/// ```
	pub fn new(t: usize) -> Result<Self> {
		Self::with_comparator(t, Natural)
	}
}

impl<K: Ord, V> Default for BTree<K, V> {
	/// Creates an empty tree with [`DEFAULT_DEGREE`].
	fn default() -> Self {
		Self::with_degree(Degree::default(), Natural)
	}
}

impl<K, V, C: Comparator<K>> BTree<K, V, C> {
	// -----------------------------------------------------------------------
	// Construction
	// -----------------------------------------------------------------------

	/// Creates an empty tree with minimum degree `t` and a caller-supplied key
	/// ordering.
	///
	/// # Errors
	///
	/// Returns [`Error::InvalidDegree`] if `t < 2`.
	///
	/// # Example
	///
	/// ```
	/// use oaktree::{BTree, Reverse};
	///
	/// let mut tree = BTree::with_comparator(2, Reverse).unwrap();
	/// tree.insert(1, ());
	/// tree.insert(3, ());
	/// tree.insert(2, ());
	///
	/// let keys: Vec<i32> = tree.inorder_traverse().into_iter().map(|(k, _)| *k).collect();
	/// assert_eq!(keys, vec![3, 2, 1]);
	/// ```
	pub fn with_comparator(t: usize, comparator: C) -> Result<Self> {
		Ok(Self::with_degree(Degree::new(t)?, comparator))
	}

	/// Creates an empty tree from an already validated [`Degree`].
	pub fn with_degree(degree: Degree, comparator: C) -> Self {
		debug!(degree = degree.get(), "created btree");
		BTree {
			root: None,
			degree,
			len: 0,
			comparator,
		}
	}

	// -----------------------------------------------------------------------
	// Tree Metadata
	// -----------------------------------------------------------------------

	/// Returns the number of entries in the tree. O(1).
	#[inline]
	pub fn len(&self) -> usize {
		self.len
	}

	/// Returns `true` if the tree holds no entries.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Returns the minimum degree `t` the tree was built with.
	#[inline]
	pub fn degree(&self) -> usize {
		self.degree.get()
	}

	/// Returns the comparator ordering the keys.
	#[inline]
	pub fn comparator(&self) -> &C {
		&self.comparator
	}

	/// Returns the number of levels in the tree.
	///
	/// - Height 0: empty tree
	/// - Height 1: a single root leaf
	/// - Height N: N-1 levels of internal nodes above the leaves
	pub fn height(&self) -> usize {
		let mut height = 0;
		let mut next = self.root.as_deref();
		while let Some(node) = next {
			height += 1;
			next = node.children.first().map(|child| &**child);
		}
		height
	}

	// -----------------------------------------------------------------------
	// Public API: Read Operations
	// -----------------------------------------------------------------------

	/// Returns a reference to the value stored under `key`.
	///
	/// Descends from the root, searching each node locally and following the
	/// child at the search position until the key is found or a leaf misses.
	///
	/// # Example
	///
	/// ```
	/// use oaktree::BTree;
	///
	/// let mut tree = BTree::new(2).unwrap();
	/// tree.insert(1, "one");
	///
	/// assert_eq!(tree.get(&1), Some(&"one"));
	/// assert_eq!(tree.get(&2), None);
	/// ```
	pub fn get(&self, key: &K) -> Option<&V> {
		let mut node = self.root.as_deref()?;
		loop {
			let (pos, exact) = node.search(key, &self.comparator);
			if exact {
				return Some(&node.items[pos].value);
			}
			if node.is_leaf() {
				return None;
			}
			node = &node.children[pos];
		}
	}

	/// Returns a mutable reference to the value stored under `key`.
	pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
		let mut node = self.root.as_deref_mut()?;
		loop {
			let (pos, exact) = node.search(key, &self.comparator);
			if exact {
				return Some(&mut node.items[pos].value);
			}
			if node.is_leaf() {
				return None;
			}
			node = &mut node.children[pos];
		}
	}

	/// Returns `true` if the tree contains `key`.
	pub fn contains_key(&self, key: &K) -> bool {
		self.get(key).is_some()
	}

	/// Returns the entry with the smallest key.
	///
	/// # Example
	///
	/// ```
	/// use oaktree::BTree;
	///
	/// let mut tree = BTree::new(2).unwrap();
	/// tree.insert(3, "three");
	/// tree.insert(1, "one");
	/// tree.insert(2, "two");
	///
	/// assert_eq!(tree.first_key_value(), Some((&1, &"one")));
	/// assert_eq!(tree.last_key_value(), Some((&3, &"three")));
	/// ```
	pub fn first_key_value(&self) -> Option<(&K, &V)> {
		self.root.as_deref()?.first().map(Item::as_pair)
	}

	/// Returns the entry with the largest key.
	pub fn last_key_value(&self) -> Option<(&K, &V)> {
		self.root.as_deref()?.last().map(Item::as_pair)
	}

	/// Returns every entry in ascending key order.
	///
	/// The result is fully materialised; it borrows from the tree but does not
	/// walk it lazily.
	pub fn inorder_traverse(&self) -> Vec<(&K, &V)> {
		let mut out = Vec::with_capacity(self.len);
		if let Some(root) = self.root.as_deref() {
			root.collect_into(&mut out);
		}
		out
	}

	/// Consumes the tree, returning every entry in ascending key order.
	pub fn into_sorted_vec(self) -> Vec<(K, V)> {
		let mut out = Vec::with_capacity(self.len);
		if let Some(root) = self.root {
			root.drain_into(&mut out);
		}
		out
	}

	// -----------------------------------------------------------------------
	// Public API: Write Operations
	// -----------------------------------------------------------------------

	/// Inserts a new entry, returning `false` if `key` is already present.
	///
	/// A duplicate key leaves the stored value untouched and the rejected
	/// `value` is dropped. Use [`update`](Self::update) to replace a value.
	///
	/// # Algorithm
	///
	/// Single pass from the root:
	/// 1. An exact match in the current node means a duplicate.
	/// 2. A full root is split first, growing the tree by one level.
	/// 3. At a leaf, the item is inserted at the search position.
	/// 4. Otherwise, if the child to enter is full (and does not itself hold
	///    the key), it is split and the promoted median decides whether to
	///    continue into the left or right half.
	///
	/// # Example
	///
	/// ```
	/// use oaktree::BTree;
	///
	/// let mut tree = BTree::new(2).unwrap();
	///
	/// assert!(tree.insert(1, "one"));
	/// assert!(!tree.insert(1, "uno"));
	/// assert_eq!(tree.get(&1), Some(&"one"));
	/// ```
	pub fn insert(&mut self, key: K, value: V) -> bool {
		let degree = self.degree;
		let comparator = &self.comparator;

		let root = match &mut self.root {
			Some(root) => root,
			slot @ None => {
				*slot = Some(Box::new(Node::leaf_with(Item::new(key, value), degree)));
				self.len = 1;
				trace!("created root leaf");
				return true;
			}
		};

		if root.is_full(degree) {
			if root.search(&key, comparator).1 {
				return false;
			}

			let (median, right) = root.split(degree);
			let left = mem::replace(root, Box::new(Node::new(degree)));
			root.items.push(median);
			root.children.reserve_exact(degree.max_children());
			root.children.push(left);
			root.children.push(Box::new(right));
			trace!("split root, tree grew one level");
		}

		let mut node: &mut Node<K, V> = root;
		loop {
			let (mut pos, exact) = node.search(&key, comparator);
			if exact {
				return false;
			}

			if node.is_leaf() {
				node.items.insert(pos, Item::new(key, value));
				break;
			}

			if node.children[pos].is_full(degree) {
				if node.children[pos].search(&key, comparator).1 {
					return false;
				}

				node.split_child(pos, degree);
				trace!(child = pos, "split full child");

				// The key is not the promoted median, it sits either side of it.
				if comparator.compare(&key, &node.items[pos].key) == Ordering::Greater {
					pos += 1;
				}
			}

			node = &mut node.children[pos];
		}

		self.len += 1;
		true
	}

	/// Replaces the value stored under `key`, returning the previous value.
	///
	/// Returns `None` and stores nothing if the key is absent.
	///
	/// # Example
	///
	/// ```
	/// use oaktree::BTree;
	///
	/// let mut tree = BTree::new(2).unwrap();
	/// tree.insert(1, "one");
	///
	/// assert_eq!(tree.update(&1, "uno"), Some("one"));
	/// assert_eq!(tree.update(&2, "dos"), None);
	/// assert_eq!(tree.len(), 1);
	/// ```
	pub fn update(&mut self, key: &K, value: V) -> Option<V> {
		self.get_mut(key).map(|slot| mem::replace(slot, value))
	}

	/// Removes `key` from the tree, returning its value if it was present.
	///
	/// # Example
	///
	/// ```
	/// use oaktree::BTree;
	///
	/// let mut tree = BTree::new(2).unwrap();
	/// tree.insert(1, "one");
	///
	/// assert_eq!(tree.remove(&1), Some("one"));
	/// assert_eq!(tree.remove(&1), None); // Already removed
	/// ```
	pub fn remove(&mut self, key: &K) -> Option<V> {
		self.remove_entry(key).map(|(_, v)| v)
	}

	/// Removes `key` from the tree, returning the stored key and value.
	///
	/// # Algorithm
	///
	/// The root has no lower occupancy bound, so it is searched directly:
	/// 1. A match in the root is deleted in place.
	/// 2. A miss in a root leaf means the key is absent.
	/// 3. Otherwise removal continues down the child at the search position,
	///    topping up every minimal node before entering it.
	///
	/// If the root ends up with no items it is replaced by its only child, or
	/// the tree becomes empty if the root was a leaf.
	pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
		let mut root = self.root.take()?;

		let (pos, exact) = root.search(key, &self.comparator);
		let removed = if exact {
			Some(self.delete_at(&mut root, pos))
		} else if root.is_leaf() {
			None
		} else {
			self.remove_below(&mut root, pos, key)
		};

		self.root = if root.items.is_empty() {
			let child = root.children.pop();
			if child.is_some() {
				trace!("collapsed empty root, tree shrank one level");
			} else {
				trace!("removed last entry");
			}
			child
		} else {
			Some(root)
		};

		let item = removed?;
		self.len -= 1;
		Some(item.into_pair())
	}

	/// Removes every entry, dropping all nodes.
	pub fn clear(&mut self) {
		debug!(len = self.len, "clearing btree");
		self.root = None;
		self.len = 0;
	}

	// -----------------------------------------------------------------------
	// Removal Internals
	// -----------------------------------------------------------------------

	/// Removes `key` from the subtree at `parent.children[idx]`.
	///
	/// Each node is rebalanced through its parent before it is searched, so
	/// it always holds at least `t` items when something below it (or in it)
	/// is removed.
	fn remove_below(&self, parent: &mut Node<K, V>, idx: usize, key: &K) -> Option<Item<K, V>> {
		let mut parent = parent;
		let mut idx = idx;

		loop {
			if parent.children[idx].is_minimal(self.degree) {
				idx = parent.rebalance_child(idx, self.degree);
			}

			let node: &mut Node<K, V> = &mut parent.children[idx];
			let (pos, exact) = node.search(key, &self.comparator);
			if exact {
				return Some(self.delete_at(node, pos));
			}
			if node.is_leaf() {
				return None;
			}

			parent = node;
			idx = pos;
		}
	}

	/// Removes and returns the first or last item of the subtree at
	/// `parent.children[idx]`, rebalancing on the way down like
	/// [`remove_below`](Self::remove_below).
	fn remove_edge_below(&self, parent: &mut Node<K, V>, idx: usize, edge: Edge) -> Item<K, V> {
		let mut parent = parent;
		let mut idx = idx;

		loop {
			if parent.children[idx].is_minimal(self.degree) {
				idx = parent.rebalance_child(idx, self.degree);
			}

			let node: &mut Node<K, V> = &mut parent.children[idx];
			if node.is_leaf() {
				let item = match edge {
					Edge::First => (!node.items.is_empty()).then(|| node.items.remove(0)),
					Edge::Last => node.items.pop(),
				};
				let Some(item) = item else {
					unreachable!("rebalanced leaf is empty - occupancy invariant violated")
				};
				return item;
			}

			idx = match edge {
				Edge::First => 0,
				Edge::Last => node.children.len() - 1,
			};
			parent = node;
		}
	}

	/// Removes the item at `pos` in `node`, which holds at least `t` items
	/// unless it is the root.
	///
	/// - Leaf: remove directly.
	/// - Internal, left child can lend: replace with the in-order predecessor.
	/// - Internal, right child can lend: replace with the in-order successor.
	/// - Otherwise merge both children around the item and delete it from
	///   the merged node.
	fn delete_at(&self, node: &mut Node<K, V>, pos: usize) -> Item<K, V> {
		if node.is_leaf() {
			return node.items.remove(pos);
		}

		if node.children[pos].can_lend(self.degree) {
			let predecessor = self.remove_edge_below(node, pos, Edge::Last);
			return mem::replace(&mut node.items[pos], predecessor);
		}

		if node.children[pos + 1].can_lend(self.degree) {
			let successor = self.remove_edge_below(node, pos + 1, Edge::First);
			return mem::replace(&mut node.items[pos], successor);
		}

		let merged_pos = node.children[pos].items.len();
		node.merge_children(pos);
		trace!(left = pos, "merged children around deleted separator");
		self.delete_at(&mut node.children[pos], merged_pos)
	}
}

impl<K: fmt::Debug, V: fmt::Debug, C: Comparator<K>> fmt::Debug for BTree<K, V, C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.inorder_traverse()).finish()
	}
}

// ===========================================================================
// Test-Only Validation Module
// ===========================================================================

/// Invariant validation for testing.
#[cfg(any(test, feature = "test-utils"))]
impl<K: fmt::Debug, V, C: Comparator<K>> BTree<K, V, C> {
	/// Validates all tree invariants. Panics with diagnostic info if any
	/// invariant is violated.
	///
	/// # Invariants Checked
	///
	/// 1. Occupancy: non-root nodes hold `t-1 ..= 2t-1` items, the root
	///    `1 ..= 2t-1`
	/// 2. Shape: internal nodes have exactly `items + 1` children
	/// 3. Key ordering: keys strictly ascending within each node
	/// 4. Subtree bounds: keys in `children[i]` lie between the separators
	///    either side of it
	/// 5. Balance: every leaf at the same depth
	/// 6. Count: `len()` equals the number of reachable items
	pub fn assert_invariants(&self) {
		let Some(root) = self.root.as_deref() else {
			assert_eq!(self.len, 0, "Empty tree reports len {}", self.len);
			return;
		};

		assert!(!root.items.is_empty(), "Root node holds no items between operations");

		let mut leaf_depth = None;
		let count = self.validate_node_recursive(root, 0, true, None, None, &mut leaf_depth);
		assert_eq!(count, self.len, "Reachable item count {} != len {}", count, self.len);
	}

	/// Recursively validates a node and its subtree, returning its item count.
	///
	/// # Arguments
	/// * `node` - The node to validate
	/// * `depth` - Current depth (0 = root)
	/// * `is_root` - Whether occupancy lower bounds are waived
	/// * `lower` - Exclusive lower bound from the parent, None if leftmost
	/// * `upper` - Exclusive upper bound from the parent, None if rightmost
	/// * `leaf_depth` - Depth of the first leaf seen
	fn validate_node_recursive<'a>(
		&self,
		node: &'a Node<K, V>,
		depth: usize,
		is_root: bool,
		lower: Option<&'a K>,
		upper: Option<&'a K>,
		leaf_depth: &mut Option<usize>,
	) -> usize {
		let keys: Vec<&K> = node.items.iter().map(|item| &item.key).collect();

		// Invariant 1: Occupancy
		assert!(
			node.items.len() <= self.degree.max_items(),
			"Node at depth {} holds {} items, max is {}: {:?}",
			depth,
			node.items.len(),
			self.degree.max_items(),
			keys
		);
		if !is_root {
			assert!(
				node.items.len() >= self.degree.min_items(),
				"Node at depth {} holds {} items, min is {}: {:?}",
				depth,
				node.items.len(),
				self.degree.min_items(),
				keys
			);
		}

		// Invariant 3: Key ordering
		for i in 1..keys.len() {
			assert!(
				self.comparator.compare(keys[i - 1], keys[i]) == Ordering::Less,
				"Keys not sorted at positions {} and {}: {:?} >= {:?}",
				i - 1,
				i,
				keys[i - 1],
				keys[i]
			);
		}

		// Invariant 4: Subtree bounds
		for key in &keys {
			if let Some(lower) = lower {
				assert!(
					self.comparator.compare(key, lower) == Ordering::Greater,
					"Key {:?} not greater than parent lower bound {:?}",
					key,
					lower
				);
			}
			if let Some(upper) = upper {
				assert!(
					self.comparator.compare(key, upper) == Ordering::Less,
					"Key {:?} not less than parent upper bound {:?}",
					key,
					upper
				);
			}
		}

		if node.is_leaf() {
			// Invariant 5: Balance
			if let Some(expected) = *leaf_depth {
				assert_eq!(
					depth, expected,
					"Leaf {:?} at depth {} but first leaf was at depth {}",
					keys, depth, expected
				);
			} else {
				*leaf_depth = Some(depth);
			}
			return node.items.len();
		}

		// Invariant 2: Shape
		assert_eq!(
			node.children.len(),
			node.items.len() + 1,
			"Internal node {:?} has {} children",
			keys,
			node.children.len()
		);

		let mut count = node.items.len();
		for (i, child) in node.children.iter().enumerate() {
			let child_lower = if i == 0 {
				lower
			} else {
				Some(&node.items[i - 1].key)
			};
			let child_upper = node.items.get(i).map(|item| &item.key).or(upper);
			count +=
				self.validate_node_recursive(child, depth + 1, false, child_lower, child_upper, leaf_depth);
		}
		count
	}

	/// Returns the keys of every node, level by level from the root.
	///
	/// Lets tests pin the exact shape a sequence of operations produces.
	pub fn levels(&self) -> Vec<Vec<Vec<K>>>
	where
		K: Clone,
	{
		let mut levels = Vec::new();
		let mut current: Vec<&Node<K, V>> = self.root.as_deref().into_iter().collect();

		while !current.is_empty() {
			levels.push(
				current
					.iter()
					.map(|node| node.items.iter().map(|item| item.key.clone()).collect())
					.collect(),
			);
			current = current
				.into_iter()
				.flat_map(|node| node.children.iter().map(|child| &**child))
				.collect();
		}
		levels
	}
}
