//! Node storage and the node-local primitives the tree algorithms are built
//! from.
//!
//! A [`Node`] owns its items and its children outright. Splits, merges and
//! steals move items and child boxes between nodes; nothing is shared and
//! there are no parent or sibling back-pointers, so a node that is absorbed
//! by a merge is simply dropped.
//!
//! ```text
//!            items:    [ k0 | k1 | k2 ]
//!            children: c0   c1   c2   c3
//!
//!   keys(c0) < k0 < keys(c1) < k1 < keys(c2) < k2 < keys(c3)
//! ```
//!
//! Nothing in here looks beyond a node and its direct children. Deciding
//! when to split, steal or merge is left to [`BTree`](crate::BTree).

use std::cmp::Ordering;
use std::fmt;
use std::mem;

use tracing::trace;

use crate::compare::Comparator;
use crate::degree::Degree;

// ===========================================================================
// Item
// ===========================================================================

/// An owned key/value pair living inside exactly one node.
pub(crate) struct Item<K, V> {
	pub(crate) key: K,
	pub(crate) value: V,
}

impl<K, V> Item<K, V> {
	#[inline]
	pub(crate) fn new(key: K, value: V) -> Self {
		Item {
			key,
			value,
		}
	}

	#[inline]
	pub(crate) fn as_pair(&self) -> (&K, &V) {
		(&self.key, &self.value)
	}

	#[inline]
	pub(crate) fn into_pair(self) -> (K, V) {
		(self.key, self.value)
	}
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Item<K, V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Item").field(&self.key).field(&self.value).finish()
	}
}

// ===========================================================================
// Node
// ===========================================================================

/// A B-tree node: sorted items plus, when internal, `items.len() + 1`
/// children.
pub(crate) struct Node<K, V> {
	/// Items in strictly ascending key order.
	pub(crate) items: Vec<Item<K, V>>,
	/// Child subtrees. Empty for a leaf.
	pub(crate) children: Vec<Box<Node<K, V>>>,
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Node<K, V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_leaf() {
			f.debug_struct("Leaf").field("items", &self.items).finish()
		} else {
			f.debug_struct("Internal")
				.field("items", &self.items)
				.field("children", &self.children)
				.finish()
		}
	}
}

impl<K, V> Node<K, V> {
	/// Creates an empty node with room for a full complement of items and
	/// children.
	pub(crate) fn new(degree: Degree) -> Self {
		Node {
			items: Vec::with_capacity(degree.max_items()),
			children: Vec::new(),
		}
	}

	/// Creates a leaf holding a single item. Used for the first insertion
	/// into an empty tree.
	pub(crate) fn leaf_with(item: Item<K, V>, degree: Degree) -> Self {
		let mut node = Node::new(degree);
		node.items.push(item);
		node
	}

	// -----------------------------------------------------------------------
	// Occupancy
	// -----------------------------------------------------------------------

	#[inline]
	pub(crate) fn is_leaf(&self) -> bool {
		self.children.is_empty()
	}

	/// Returns `true` if the node holds `2t - 1` items and must be split
	/// before anything is inserted beneath it.
	#[inline]
	pub(crate) fn is_full(&self, degree: Degree) -> bool {
		self.items.len() >= degree.max_items()
	}

	/// Returns `true` if the node holds exactly `t - 1` items, so removing
	/// from beneath it could leave it underfull.
	#[inline]
	pub(crate) fn is_minimal(&self, degree: Degree) -> bool {
		self.items.len() == degree.min_items()
	}

	/// Returns `true` if the node can give one item to a sibling and stay
	/// within bounds.
	#[inline]
	pub(crate) fn can_lend(&self, degree: Degree) -> bool {
		self.items.len() >= degree.get()
	}

	// -----------------------------------------------------------------------
	// Search
	// -----------------------------------------------------------------------

	/// Binary search over this node's own items.
	///
	/// # Returns
	///
	/// `(position, exact_match)` where:
	/// - `position`: smallest index whose key is not less than `key`, which is
	///   both the slot of a match and the insertion point on a miss. On an
	///   internal node it is also the child to descend into.
	/// - `exact_match`: `true` if `items[position]` has an equal key
	pub(crate) fn search<C>(&self, key: &K, comparator: &C) -> (usize, bool)
	where
		C: Comparator<K>,
	{
		let mut lower = 0;
		let mut upper = self.items.len();

		while lower < upper {
			let mid = lower + (upper - lower) / 2;
			match comparator.compare(&self.items[mid].key, key) {
				Ordering::Less => lower = mid + 1,
				Ordering::Greater => upper = mid,
				Ordering::Equal => return (mid, true),
			}
		}

		(lower, false)
	}

	// -----------------------------------------------------------------------
	// Split
	// -----------------------------------------------------------------------

	/// Splits a full node in place.
	///
	/// `self` keeps the first `t - 1` items (and first `t` children); the
	/// item at `t - 1` is returned for promotion together with a new right
	/// sibling holding the remaining `t - 1` items (and `t` children).
	pub(crate) fn split(&mut self, degree: Degree) -> (Item<K, V>, Node<K, V>) {
		let t = degree.get();
		debug_assert_eq!(self.items.len(), degree.max_items(), "split of a non-full node");

		let mut right = Node::new(degree);
		right.items.extend(self.items.drain(t..));
		if !self.is_leaf() {
			right.children.reserve_exact(degree.max_children());
			right.children.extend(self.children.drain(t..));
		}

		let Some(median) = self.items.pop() else {
			unreachable!("split left half is empty - node was not full")
		};

		(median, right)
	}

	/// Splits the full child at `idx`, promoting its median into this node.
	///
	/// Afterwards `items[idx]` is the promoted separator, `children[idx]` the
	/// left half and `children[idx + 1]` the right half.
	pub(crate) fn split_child(&mut self, idx: usize, degree: Degree) {
		let (median, right) = self.children[idx].split(degree);
		self.items.insert(idx, median);
		self.children.insert(idx + 1, Box::new(right));
	}

	// -----------------------------------------------------------------------
	// Steal and merge
	// -----------------------------------------------------------------------

	/// Rotates one item from the left sibling of `children[idx]` through the
	/// separator at `idx - 1`.
	///
	/// Returns `false` without touching anything if there is no left sibling
	/// or it is at minimum occupancy.
	pub(crate) fn steal_from_left(&mut self, idx: usize, degree: Degree) -> bool {
		if idx == 0 || !self.children[idx - 1].can_lend(degree) {
			return false;
		}

		let (left, rest) = self.children.split_at_mut(idx);
		let sibling = &mut left[idx - 1];
		let child = &mut rest[0];

		let Some(last) = sibling.items.pop() else {
			return false;
		};
		let separator = mem::replace(&mut self.items[idx - 1], last);
		child.items.insert(0, separator);

		if let Some(edge) = sibling.children.pop() {
			child.children.insert(0, edge);
		}

		true
	}

	/// Rotates one item from the right sibling of `children[idx]` through
	/// the separator at `idx`.
	///
	/// Returns `false` without touching anything if there is no right
	/// sibling or it is at minimum occupancy.
	pub(crate) fn steal_from_right(&mut self, idx: usize, degree: Degree) -> bool {
		if idx + 1 >= self.children.len() || !self.children[idx + 1].can_lend(degree) {
			return false;
		}

		let (left, rest) = self.children.split_at_mut(idx + 1);
		let child = &mut left[idx];
		let sibling = &mut rest[0];

		let first = sibling.items.remove(0);
		let separator = mem::replace(&mut self.items[idx], first);
		child.items.push(separator);

		if !sibling.is_leaf() {
			child.children.push(sibling.children.remove(0));
		}

		true
	}

	/// Absorbs the separator at `left_idx` and the whole of
	/// `children[left_idx + 1]` into `children[left_idx]`.
	///
	/// The right child is dropped; this node loses one item and one child.
	pub(crate) fn merge_children(&mut self, left_idx: usize) {
		let right = self.children.remove(left_idx + 1);
		let separator = self.items.remove(left_idx);

		let left = &mut self.children[left_idx];
		let Node {
			items,
			children,
		} = *right;

		left.items.push(separator);
		left.items.extend(items);
		left.children.extend(children);
	}

	/// Brings `children[idx]` from `t - 1` items up to at least `t`.
	///
	/// Steals from the left sibling first, then the right one; if neither can
	/// lend, merges with an adjacent sibling (the left one when it exists).
	///
	/// # Returns
	///
	/// The index of the child that now covers the original child's key
	/// range. It differs from `idx` only after a merge into the left sibling.
	pub(crate) fn rebalance_child(&mut self, idx: usize, degree: Degree) -> usize {
		if self.steal_from_left(idx, degree) {
			trace!(child = idx, "stole item from left sibling");
			return idx;
		}
		if self.steal_from_right(idx, degree) {
			trace!(child = idx, "stole item from right sibling");
			return idx;
		}

		let left = idx.saturating_sub(1);
		self.merge_children(left);
		trace!(left, right = left + 1, "merged siblings");
		left
	}

	// -----------------------------------------------------------------------
	// Extremes and traversal
	// -----------------------------------------------------------------------

	/// Smallest item in this subtree.
	pub(crate) fn first(&self) -> Option<&Item<K, V>> {
		let mut node = self;
		while let Some(child) = node.children.first() {
			node = child;
		}
		node.items.first()
	}

	/// Largest item in this subtree.
	pub(crate) fn last(&self) -> Option<&Item<K, V>> {
		let mut node = self;
		while let Some(child) = node.children.last() {
			node = child;
		}
		node.items.last()
	}

	/// Appends this subtree's entries to `out` in ascending key order:
	/// `c0, k0, c1, k1, ..., km, cm+1`.
	pub(crate) fn collect_into<'a>(&'a self, out: &mut Vec<(&'a K, &'a V)>) {
		if self.is_leaf() {
			out.extend(self.items.iter().map(Item::as_pair));
			return;
		}

		for (child, item) in self.children.iter().zip(&self.items) {
			child.collect_into(out);
			out.push(item.as_pair());
		}
		if let Some(last) = self.children.last() {
			last.collect_into(out);
		}
	}

	/// Consuming form of [`collect_into`](Self::collect_into).
	pub(crate) fn drain_into(self, out: &mut Vec<(K, V)>) {
		let Node {
			items,
			children,
		} = self;
		let mut children = children.into_iter();

		for item in items {
			if let Some(child) = children.next() {
				child.drain_into(out);
			}
			out.push(item.into_pair());
		}
		for child in children {
			child.drain_into(out);
		}
	}
}
