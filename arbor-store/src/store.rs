// SPDX-FileCopyrightText: 2026 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! The relational store interface consumed by the tree core.
//!
//! All result-shaping follows the same convention: missing data is `None`
//! or an empty collection, never an error. Store failures surface as
//! [`Error`](crate::Error) and are otherwise untranslated.

use std::collections::HashMap;

use rusqlite::params_from_iter;
use rusqlite::types::Value;
use tracing::debug;

use crate::connection::SqliteStore;
use crate::error::Result;

/// A single result row as a column-name → value mapping.
pub type Row = HashMap<String, Value>;

/// Abstract relational store: scalar/row/set queries, mutations, and
/// transaction control.
///
/// `rollback` may only be called while a transaction is active.
pub trait RelationalStore {
    /// Single value from the first row/column, `None` if no rows matched.
    fn scalar(&self, sql: &str, params: &[Value]) -> Result<Option<Value>>;

    /// First matching row, `None` if no rows matched.
    fn row(&self, sql: &str, params: &[Value]) -> Result<Option<Row>>;

    /// All matching rows in result order.
    fn rows(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// First column of every matching row, in result order.
    fn column(&self, sql: &str, params: &[Value]) -> Result<Vec<Value>>;

    /// Execute a non-select statement, returning the affected row count.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<usize>;

    /// Begin a transaction.
    fn begin(&self) -> Result<()>;

    /// Commit the active transaction.
    fn commit(&self) -> Result<()>;

    /// Roll back the active transaction.
    fn rollback(&self) -> Result<()>;
}

impl RelationalStore for SqliteStore {
    fn scalar(&self, sql: &str, params: &[Value]) -> Result<Option<Value>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        match stmt.query_row(params_from_iter(params.iter()), |row| {
            row.get::<_, Value>(0)
        }) {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn row(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let names: Vec<String> = stmt.column_names().iter().map(|n| n.to_string()).collect();

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        match rows.next()? {
            Some(row) => {
                let mut mapping = Row::with_capacity(names.len());
                for (i, name) in names.iter().enumerate() {
                    mapping.insert(name.clone(), row.get::<_, Value>(i)?);
                }
                Ok(Some(mapping))
            }
            None => Ok(None),
        }
    }

    fn rows(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let names: Vec<String> = stmt.column_names().iter().map(|n| n.to_string()).collect();

        let mut result = Vec::new();
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        while let Some(row) = rows.next()? {
            let mut mapping = Row::with_capacity(names.len());
            for (i, name) in names.iter().enumerate() {
                mapping.insert(name.clone(), row.get::<_, Value>(i)?);
            }
            result.push(mapping);
        }
        Ok(result)
    }

    fn column(&self, sql: &str, params: &[Value]) -> Result<Vec<Value>> {
        let mut stmt = self.conn.prepare_cached(sql)?;

        let mut values = Vec::new();
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        while let Some(row) = rows.next()? {
            values.push(row.get::<_, Value>(0)?);
        }
        Ok(values)
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        Ok(stmt.execute(params_from_iter(params.iter()))?)
    }

    fn begin(&self) -> Result<()> {
        // IMMEDIATE takes the write lock up front so concurrent writers
        // fail at begin() rather than mid-mutation.
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        debug!("Transaction started");
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        debug!("Transaction committed");
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK")?;
        debug!("Transaction rolled back");
        Ok(())
    }
}
