//! Test utilities for loading hand-built trees from JSON fixtures.
//!
//! Inserting keys only ever produces the shapes the split rules lead to.
//! Fixtures describe a node layout directly, so tests can start removal
//! from a shape that inserts would not easily reach (for example a
//! three-level tree with every node at minimum occupancy).
//!
//! ```json
//! { "degree": 2, "root": { "keys": [20], "children": [ { "keys": [10] }, { "keys": [30] } ] } }
//! ```
//!
//! Every entry is stored with value `key * 10`.
use crate::degree::Degree;
use crate::node::{Item, Node};
use crate::BTree;
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize, Debug)]
struct FixtureNode {
	keys: Vec<i32>,
	#[serde(default)]
	children: Vec<FixtureNode>,
}

#[derive(Deserialize, Debug)]
struct FixtureTree {
	degree: usize,
	root: Option<FixtureNode>,
}

fn translate_node(fixture: FixtureNode, degree: Degree) -> (Node<i32, i32>, usize) {
	let mut node = Node::new(degree);
	let mut count = fixture.keys.len();

	node.items.extend(fixture.keys.into_iter().map(|k| Item::new(k, k * 10)));
	for child in fixture.children {
		let (child, child_count) = translate_node(child, degree);
		node.children.push(Box::new(child));
		count += child_count;
	}

	(node, count)
}

/// Loads `fixtures/<name>` from the crate root.
pub(crate) fn tree_from_fixture(name: &str) -> BTree<i32, i32> {
	let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name);
	let file = std::fs::File::open(&path).expect("failed to find fixture file");
	let fixture: FixtureTree = serde_json::from_reader(file).unwrap();

	let mut tree = BTree::new(fixture.degree).unwrap();
	if let Some(root) = fixture.root {
		let (root, count) = translate_node(root, tree.degree);
		tree.root = Some(Box::new(root));
		tree.len = count;
	}
	tree
}
