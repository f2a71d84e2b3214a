//! Key ordering supplied to a tree at construction.
//!
//! The tree never calls `Ord` directly. Every comparison goes through a
//! [`Comparator`], so keys without a natural order (or keys that need a
//! different one) can still be stored. The comparator must be a strict total
//! order that stays the same for the whole lifetime of the tree; a
//! comparator that changes its answer for the same pair silently breaks the
//! key-ordering invariant.

use std::cmp::Ordering;

/// A total order over keys of type `K`.
///
/// Closures of the form `Fn(&K, &K) -> Ordering` implement this trait, so a
/// comparator can be passed inline:
///
/// ```
/// use oaktree::BTree;
///
/// let mut tree = BTree::with_comparator(2, |a: &String, b: &String| a.len().cmp(&b.len())).unwrap();
/// assert!(tree.insert("ccc".to_string(), 3));
/// assert!(tree.insert("a".to_string(), 1));
/// // Same length means same key under this ordering.
/// assert!(!tree.insert("b".to_string(), 2));
/// ```
pub trait Comparator<K: ?Sized> {
	/// Compares two keys.
	fn compare(&self, a: &K, b: &K) -> Ordering;
}

impl<K: ?Sized, F> Comparator<K> for F
where
	F: Fn(&K, &K) -> Ordering,
{
	#[inline]
	fn compare(&self, a: &K, b: &K) -> Ordering {
		self(a, b)
	}
}

/// Ascending order from the key's own `Ord` implementation.
///
/// This is the default comparator of [`BTree`](crate::BTree).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Natural;

impl<K: Ord + ?Sized> Comparator<K> for Natural {
	#[inline]
	fn compare(&self, a: &K, b: &K) -> Ordering {
		a.cmp(b)
	}
}

/// Descending order from the key's own `Ord` implementation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Reverse;

impl<K: Ord + ?Sized> Comparator<K> for Reverse {
	#[inline]
	fn compare(&self, a: &K, b: &K) -> Ordering {
		b.cmp(a)
	}
}
