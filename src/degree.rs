//! The minimum degree of a tree and the node capacities derived from it.

use crate::error::{Error, Result};

/// Minimum degree used by [`BTree::default`](crate::BTree::default).
///
/// Nodes hold up to 11 items, which keeps each node's items within a couple
/// of cache lines for small keys.
pub const DEFAULT_DEGREE: usize = 6;

/// A validated minimum degree `t`.
///
/// Every node except the root holds between `t - 1` and `2t - 1` items and,
/// when internal, one more child than it has items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Degree(usize);

impl Degree {
	/// Validates `t`, rejecting anything below 2.
	///
	/// ```
	/// use oaktree::{Degree, Error};
	///
	/// let degree = Degree::new(3).unwrap();
	/// assert_eq!(degree.max_items(), 5);
	/// assert_eq!(Degree::new(1), Err(Error::InvalidDegree { degree: 1 }));
	/// ```
	pub fn new(t: usize) -> Result<Self> {
		if t < 2 {
			return Err(Error::InvalidDegree {
				degree: t,
			});
		}
		Ok(Degree(t))
	}

	/// Returns `t`.
	#[inline]
	pub fn get(self) -> usize {
		self.0
	}

	/// Largest number of items a node may hold (`2t - 1`).
	#[inline]
	pub fn max_items(self) -> usize {
		2 * self.0 - 1
	}

	/// Smallest number of items a non-root node may hold (`t - 1`).
	#[inline]
	pub fn min_items(self) -> usize {
		self.0 - 1
	}

	/// Largest number of children an internal node may hold (`2t`).
	#[inline]
	pub fn max_children(self) -> usize {
		2 * self.0
	}
}

impl Default for Degree {
	fn default() -> Self {
		Degree(DEFAULT_DEGREE)
	}
}

impl TryFrom<usize> for Degree {
	type Error = Error;

	fn try_from(t: usize) -> Result<Self> {
		Degree::new(t)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_degenerate_degrees() {
		assert_eq!(
			Degree::new(0),
			Err(Error::InvalidDegree {
				degree: 0
			})
		);
		assert_eq!(
			Degree::new(1),
			Err(Error::InvalidDegree {
				degree: 1
			})
		);
	}

	#[test]
	fn capacities_for_smallest_degree() {
		let degree = Degree::new(2).unwrap();
		assert_eq!(degree.get(), 2);
		assert_eq!(degree.min_items(), 1);
		assert_eq!(degree.max_items(), 3);
		assert_eq!(degree.max_children(), 4);
	}

	#[test]
	fn default_degree_is_valid() {
		let degree = Degree::default();
		assert_eq!(degree.get(), DEFAULT_DEGREE);
		assert_eq!(Degree::try_from(DEFAULT_DEGREE), Ok(degree));
	}

	#[test]
	fn error_message_names_the_degree() {
		let err = Degree::new(1).unwrap_err();
		assert_eq!(err.to_string(), "minimum degree must be at least 2, got 1");
	}
}
