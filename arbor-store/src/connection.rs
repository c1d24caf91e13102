// SPDX-FileCopyrightText: 2026 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Database connection management.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::error::{Error, Result};
use crate::schema::tree_table_sql;

/// Database open mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-only access (queries only, no tree mutations)
    ReadOnly,
    /// Read-write access to an existing database
    ReadWrite,
    /// Create new database if it doesn't exist
    Create,
}

/// SQLite database connection for tree-indexed tables.
#[derive(Debug)]
pub struct SqliteStore {
    pub(crate) conn: Connection,
}

impl SqliteStore {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref();
        let flags = match mode {
            OpenMode::ReadOnly => {
                if !path.exists() {
                    return Err(Error::DatabaseNotFound(path.to_owned()));
                }
                OpenFlags::SQLITE_OPEN_READ_ONLY
            }
            OpenMode::ReadWrite => {
                if !path.exists() {
                    return Err(Error::DatabaseNotFound(path.to_owned()));
                }
                OpenFlags::SQLITE_OPEN_READ_WRITE
            }
            OpenMode::Create => OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        };

        let conn = Connection::open_with_flags(path, flags).map_err(|e| Error::DatabaseOpen {
            path: path.to_owned(),
            source: e,
        })?;
        let store = Self { conn };

        if mode == OpenMode::Create {
            store.configure_pragmas()?;
        }

        debug!("Opened database at {} ({:?})", path.display(), mode);
        Ok(store)
    }

    /// Create an in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.configure_pragmas()?;
        debug!("Created in-memory database");
        Ok(store)
    }

    /// Configure SQLite pragmas for optimal performance.
    fn configure_pragmas(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            "#,
        )?;
        Ok(())
    }

    /// Create a tree-indexed table with the canonical column set.
    ///
    /// `label` names the display column (`name` in most schemas). Existing
    /// tables are left untouched.
    pub fn create_tree_table(&self, table: &str, label: &str) -> Result<()> {
        self.conn.execute_batch(&tree_table_sql(table, label))?;
        debug!("Created tree table '{table}'");
        Ok(())
    }

    /// Get raw connection (for advanced usage).
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Get mutable raw connection.
    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Check if the database contains the given table.
    pub fn has_table(&self, table: &str) -> Result<bool> {
        let count: i32 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
