// SPDX-FileCopyrightText: 2026 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Nested-set tree manager over a relational store.
//!
//! This crate maintains a nested-set index (`lft`/`rgt` interval columns)
//! for an arbitrary tree stored in a flat table: categories, org charts,
//! taxonomies. Interval containment encodes ancestry, so ancestor and
//! descendant listings are single range queries instead of recursive
//! walks.
//!
//! **Architecture**: This is the Tree Layer. All SQL runs through the
//! [`RelationalStore`](arbor_store::RelationalStore) interface from
//! `arbor-store`.
//!
//! # Key Features
//!
//! - Ancestor/descendant/sibling/child queries without recursion
//! - Insert, remove, and relocate subtrees, each in one transaction
//! - Full index reconstruction from `parent_id` adjacency
//! - Materialized-path listings and ASCII visualisation
//!
//! # Example
//!
//! ```ignore
//! use arbor_store::{OpenMode, SqliteStore};
//! use arbor_tree::NestedSetTree;
//!
//! let store = SqliteStore::open("taxonomy.db", OpenMode::Create)?;
//! store.create_tree_table("categories", "name")?;
//!
//! let tree: NestedSetTree<_, i64> = NestedSetTree::new(store, "categories", "name");
//! tree.insert_node(&1, None)?;
//! tree.insert_node(&2, Some(&1))?;
//!
//! for line in tree.visualise(&1, 0, false)? {
//!     println!("{line}");
//! }
//! ```

mod error;
mod key;
mod tree;
mod types;

pub use error::{Error, Result};
pub use key::NodeKey;
pub use tree::NestedSetTree;
pub use types::{DescendantEntry, NodeEntry, TreeEntry};
