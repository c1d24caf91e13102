// SPDX-FileCopyrightText: 2026 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! SQLite relational store layer for the arbor hierarchy manager.
//!
//! This crate provides the database half of arbor: a rusqlite-backed
//! connection wrapper and the [`RelationalStore`] interface that the
//! tree core in `arbor-tree` executes its queries through.
//!
//! **Architecture**: This is the Store Layer. The tree algorithms never
//! touch rusqlite directly; everything goes through [`RelationalStore`],
//! so alternative backends only need to implement that trait.
//!
//! # Key Features
//!
//! - Read-only, read-write, and create open modes
//! - In-memory database for testing
//! - Cached prepared statements
//! - Explicit transaction control (`begin`/`commit`/`rollback`)
//!
//! # Example
//!
//! ```ignore
//! use arbor_store::{OpenMode, RelationalStore, SqliteStore};
//!
//! let store = SqliteStore::open("taxonomy.db", OpenMode::Create)?;
//! store.create_tree_table("categories", "name")?;
//!
//! let count = store.scalar("SELECT COUNT(*) FROM categories", &[])?;
//! ```

mod connection;
mod error;
mod schema;
mod store;

pub use connection::{OpenMode, SqliteStore};
pub use error::{Error, Result};
pub use schema::tree_table_sql;
pub use store::{RelationalStore, Row};

/// SQL value type used for parameters and results throughout arbor.
pub use rusqlite::types::Value;
