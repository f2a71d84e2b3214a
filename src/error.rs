//! # Error Types for the B-tree
//!
//! Almost nothing in this crate can fail at runtime. Lookups that miss,
//! duplicate inserts and removals of absent keys are ordinary outcomes and
//! are reported through `bool` and `Option` return values, never through
//! this module.
//!
//! The one genuine error is asking for a tree whose minimum degree cannot
//! describe a valid B-tree:
//!
//! ```text
//! BTree::new(t)
//!      │
//!      ▼
//! Degree::new(t) ──── t < 2 ───► Err(InvalidDegree)
//!      │
//!      ▼ (Ok)
//! empty tree
//! ```
//!
//! Structural invariant violations are bugs in the tree itself. They are
//! caught by the invariant checker in tests and are not represented here.

use thiserror::Error;

/// Errors returned while configuring a tree.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
	/// The minimum degree was below 2.
	///
	/// With `t = 1` a non-root node would be allowed to hold zero items and
	/// a full node would hold a single item, so a split would produce two
	/// empty halves. With `t = 0` the capacity arithmetic underflows.
	#[error("minimum degree must be at least 2, got {degree}")]
	InvalidDegree {
		/// The rejected degree.
		degree: usize,
	},
}

/// A Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
