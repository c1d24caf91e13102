// SPDX-FileCopyrightText: 2026 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Nested-set tree manager.
//!
//! Encodes an arbitrary tree in a flat table by giving every node an
//! integer interval `[lft, rgt]` such that interval containment encodes
//! ancestry. The manager only maintains `lft`/`rgt` (and keeps `parent_id`
//! in sync on moves); creating and deleting rows is the caller's job.
//!
//! A row is part of the positional index iff `lft < rgt`. Rows removed
//! from the index are left at `lft = rgt = 0` for the caller to delete.
//!
//! Write operations run in a single store transaction and roll back as a
//! whole on any failure. The manager performs no locking of its own:
//! correctness under concurrent writers is the store's isolation to
//! provide.

use std::marker::PhantomData;

use arbor_store::{RelationalStore, Row, Value};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::key::NodeKey;
use crate::types::{DescendantEntry, NodeEntry, TreeEntry};

/// Interval bounds of a positioned node.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    lft: i64,
    rgt: i64,
}

/// One level of the rebuild traversal.
struct Frame<K> {
    id: K,
    lft: i64,
    children: std::vec::IntoIter<K>,
}

/// Tree-shape queries and mutations over one tree-indexed table.
pub struct NestedSetTree<S, K> {
    store: S,
    table: String,
    label: String,
    _key: PhantomData<K>,
}

impl<S: RelationalStore, K: NodeKey> NestedSetTree<S, K> {
    /// Create a manager for `table`, using `label` as the display column.
    pub fn new(store: S, table: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
            label: label.into(),
            _key: PhantomData,
        }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The table this manager operates on.
    pub fn table(&self) -> &str {
        &self.table
    }

    // ---- read operations -------------------------------------------------

    /// Number of ancestors of `id`. `0` if `id` is unknown.
    pub fn count_ancestors(&self, id: &K) -> Result<u64> {
        let Some(node) = self.find_node(id)? else {
            return Ok(0);
        };
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE lft < ?1 AND rgt > ?2",
            self.table
        );
        let count = self
            .store
            .scalar(&sql, &[Value::Integer(node.lft), Value::Integer(node.rgt)])?;
        Ok(scalar_i64(count).max(0) as u64)
    }

    /// Ancestors of `id`, root first, immediate parent last.
    pub fn ancestors(&self, id: &K) -> Result<Vec<NodeEntry<K>>> {
        let Some(node) = self.find_node(id)? else {
            return Ok(Vec::new());
        };
        let sql = format!(
            "SELECT id, {} AS name FROM {} WHERE lft < ?1 AND rgt > ?2 ORDER BY lft ASC",
            self.label, self.table
        );
        let rows = self
            .store
            .rows(&sql, &[Value::Integer(node.lft), Value::Integer(node.rgt)])?;
        self.entries(&rows)
    }

    /// Number of other nodes sharing `id`'s parent. `0` if `id` is unknown.
    pub fn count_siblings(&self, id: &K) -> Result<u64> {
        let Some(parent) = self.parent_value(id)? else {
            return Ok(0);
        };
        let count = match parent {
            Value::Null => {
                let sql = format!("SELECT COUNT(*) FROM {} WHERE parent_id IS NULL", self.table);
                self.store.scalar(&sql, &[])?
            }
            value => {
                let sql = format!("SELECT COUNT(*) FROM {} WHERE parent_id = ?1", self.table);
                self.store.scalar(&sql, &[value])?
            }
        };
        // the count includes the node itself
        Ok((scalar_i64(count).max(0) as u64).saturating_sub(1))
    }

    /// All nodes sharing `id`'s parent (`id` included), name-ascending.
    pub fn siblings(&self, id: &K) -> Result<Vec<NodeEntry<K>>> {
        let Some(parent) = self.parent_value(id)? else {
            return Ok(Vec::new());
        };
        let rows = match parent {
            Value::Null => {
                let sql = format!(
                    "SELECT id, {} AS name FROM {} WHERE parent_id IS NULL ORDER BY name ASC",
                    self.label, self.table
                );
                self.store.rows(&sql, &[])?
            }
            value => {
                let sql = format!(
                    "SELECT id, {} AS name FROM {} WHERE parent_id = ?1 ORDER BY name ASC",
                    self.label, self.table
                );
                self.store.rows(&sql, &[value])?
            }
        };
        self.entries(&rows)
    }

    /// Number of immediate children of `id`.
    pub fn count_children(&self, id: &K) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE parent_id = ?1", self.table);
        let count = self.store.scalar(&sql, &[id.to_value()])?;
        Ok(scalar_i64(count).max(0) as u64)
    }

    /// Immediate children of `id`, name-ascending.
    pub fn children(&self, id: &K) -> Result<Vec<NodeEntry<K>>> {
        let sql = format!(
            "SELECT id, {} AS name FROM {} WHERE parent_id = ?1 ORDER BY name ASC",
            self.label, self.table
        );
        let rows = self.store.rows(&sql, &[id.to_value()])?;
        self.entries(&rows)
    }

    /// Number of descendants of `id`, from the interval width alone.
    pub fn count_descendants(&self, id: &K) -> Result<u64> {
        let sql = format!("SELECT (rgt - lft - 1) / 2 FROM {} WHERE id = ?1", self.table);
        let count = self.store.scalar(&sql, &[id.to_value()])?;
        Ok(scalar_i64(count).max(0) as u64)
    }

    /// All descendants of `id` in tree order, annotated with their depth.
    ///
    /// Depth counts from `id` (immediate children are depth 1) unless
    /// `absolute_depth` is set, in which case it counts from the root
    /// level. Single ordered scan; a stack of open `rgt` boundaries tracks
    /// the nesting.
    pub fn descendants(&self, id: &K, absolute_depth: bool) -> Result<Vec<DescendantEntry<K>>> {
        let Some(node) = self.find_node(id)? else {
            return Ok(Vec::new());
        };

        let sql = format!(
            "SELECT id, {} AS name, lft, rgt FROM {} WHERE lft > ?1 AND lft < ?2 ORDER BY lft ASC",
            self.label, self.table
        );
        let rows = self
            .store
            .rows(&sql, &[Value::Integer(node.lft), Value::Integer(node.rgt)])?;

        let offset = if absolute_depth {
            self.count_ancestors(id)? as u32
        } else {
            0
        };

        let mut open: Vec<i64> = Vec::new();
        let mut result = Vec::with_capacity(rows.len());
        for row in &rows {
            let lft = int_column(row, "lft")?;
            let rgt = int_column(row, "rgt")?;

            // ancestors whose rgt lies behind the cursor have closed
            while open.last().is_some_and(|&boundary| lft > boundary) {
                open.pop();
            }

            let depth = offset + open.len() as u32 + 1;

            // nodes with children stay open until the scan passes their rgt
            if rgt - lft > 1 {
                open.push(rgt);
            }

            result.push(DescendantEntry {
                id: key_column(row, "id")?,
                name: text_column(row, "name")?,
                depth,
            });
        }
        Ok(result)
    }

    /// List `id`'s subtree (the node itself included) with depth and a
    /// dotted materialized path.
    ///
    /// `max_depth` limits how many levels below `id` are returned
    /// (0 = unlimited). With `sort`, entries are re-ordered
    /// lexicographically by path instead of tree order.
    pub fn subtree(&self, id: &K, max_depth: u32, sort: bool) -> Result<Vec<TreeEntry<K>>> {
        let Some(node) = self.find_node(id)? else {
            return Ok(Vec::new());
        };

        // self-join: each positioned row in the interval, with its absolute
        // depth derived from the number of rows containing it
        let sql = format!(
            "SELECT n.id AS id, n.{label} AS name, COUNT(p.id) - 1 AS depth \
               FROM {table} AS n, {table} AS p \
              WHERE n.lft BETWEEN p.lft AND p.rgt \
                AND n.lft BETWEEN ?1 AND ?2 \
                AND n.lft < n.rgt AND p.lft < p.rgt \
           GROUP BY n.id \
           ORDER BY n.lft",
            label = self.label,
            table = self.table,
        );
        let rows = self
            .store
            .rows(&sql, &[Value::Integer(node.lft), Value::Integer(node.rgt)])?;

        // depth is absolute, so a relative limit must account for the
        // starting node's own level
        let limit = match max_depth {
            0 => None,
            n => Some(n + self.count_ancestors(id)? as u32),
        };

        let mut entries = Vec::with_capacity(rows.len());
        let mut path: Vec<String> = Vec::new();
        let mut base = 0u32;

        for row in &rows {
            let depth = int_column(row, "depth")?.max(0) as u32;
            if limit.is_some_and(|l| depth > l) {
                continue;
            }
            if entries.is_empty() {
                base = depth;
            }
            let name = text_column(row, "name")?;
            path.truncate(depth.saturating_sub(base) as usize);
            path.push(name.clone());

            entries.push(TreeEntry {
                id: key_column(row, "id")?,
                name,
                depth,
                path: path.join("."),
            });
        }

        if sort {
            entries.sort_by(|a, b| a.path.cmp(&b.path));
        }
        Ok(entries)
    }

    /// Render `id`'s subtree as indented text, one line per node.
    pub fn visualise(&self, id: &K, max_depth: u32, sort: bool) -> Result<Vec<String>> {
        let entries = self.subtree(id, max_depth, sort)?;
        let Some(min_depth) = entries.iter().map(|e| e.depth).min() else {
            return Ok(Vec::new());
        };
        Ok(entries
            .iter()
            .map(|e| format!("{}{}", "|-- ".repeat((e.depth - min_depth) as usize), e.name))
            .collect())
    }

    // ---- write operations ------------------------------------------------

    /// Add `id` to the positional index as the last child of `parent_id`,
    /// or as a new root when `parent_id` is `None`.
    ///
    /// The node's row must already exist and must not currently be
    /// positioned. Unknown node or parent is a no-op.
    pub fn insert_node(&self, id: &K, parent_id: Option<&K>) -> Result<()> {
        let inserted = self.in_transaction(|| {
            // the row must exist up front: positioning a phantom id would
            // commit a widened gap with nothing in it
            if self.parent_value(id)?.is_none() {
                return Ok(false);
            }

            let lft = match parent_id {
                Some(pid) => {
                    let Some(parent) = self.find_node(pid)? else {
                        return Ok(false);
                    };
                    // shift everything up to make room for the new node;
                    // both updates key off the pre-shift boundary
                    self.store.execute(
                        &format!("UPDATE {} SET rgt = rgt + 2 WHERE rgt >= ?1", self.table),
                        &[Value::Integer(parent.rgt)],
                    )?;
                    self.store.execute(
                        &format!("UPDATE {} SET lft = lft + 2 WHERE lft >= ?1", self.table),
                        &[Value::Integer(parent.rgt)],
                    )?;
                    parent.rgt
                }
                None => {
                    let sql = format!("SELECT MAX(rgt) FROM {}", self.table);
                    match self.store.scalar(&sql, &[])? {
                        Some(Value::Integer(max)) => max + 1,
                        _ => 0,
                    }
                }
            };

            self.store.execute(
                &format!("UPDATE {} SET lft = ?1, rgt = ?2 WHERE id = ?3", self.table),
                &[Value::Integer(lft), Value::Integer(lft + 1), id.to_value()],
            )?;
            Ok(true)
        })?;

        if inserted {
            debug!("inserted node {id:?} under {parent_id:?}");
        }
        Ok(())
    }

    /// Remove the subtree rooted at `id` from the positional index.
    ///
    /// Rows are not deleted; their intervals are zeroed and the vacated gap
    /// is closed. Unknown `id` is a no-op.
    pub fn remove_node(&self, id: &K) -> Result<()> {
        let Some(node) = self.find_node(id)? else {
            return Ok(());
        };

        self.in_transaction(|| {
            let diff = node.rgt - node.lft + 1;

            // blank the subtree's indexes; every descendant's lft falls
            // inside the interval
            self.store.execute(
                &format!(
                    "UPDATE {} SET lft = 0, rgt = 0 WHERE lft BETWEEN ?1 AND ?2",
                    self.table
                ),
                &[Value::Integer(node.lft), Value::Integer(node.rgt)],
            )?;

            // close the gap; the lft < rgt guard keeps unpositioned rows
            // out when the removed interval starts at the zero origin
            self.store.execute(
                &format!(
                    "UPDATE {} SET lft = lft - ?1 WHERE lft >= ?2 AND lft < rgt",
                    self.table
                ),
                &[Value::Integer(diff), Value::Integer(node.lft)],
            )?;
            self.store.execute(
                &format!(
                    "UPDATE {} SET rgt = rgt - ?1 WHERE rgt >= ?2 AND lft < rgt",
                    self.table
                ),
                &[Value::Integer(diff), Value::Integer(node.rgt)],
            )?;
            Ok(())
        })?;

        debug!("removed subtree at {id:?} (width {})", node.rgt - node.lft + 1);
        Ok(())
    }

    /// Relocate the subtree rooted at `id` to become the last child of
    /// `new_parent_id`, updating `parent_id` to match.
    ///
    /// Unknown node or parent is a no-op, as is moving a node beneath its
    /// own subtree.
    pub fn move_node(&self, id: &K, new_parent_id: &K) -> Result<()> {
        let Some(node) = self.find_node(id)? else {
            return Ok(());
        };
        let Some(parent) = self.find_node(new_parent_id)? else {
            return Ok(());
        };

        // re-homing a subtree inside itself cannot produce a valid index
        if parent.lft >= node.lft && parent.rgt <= node.rgt {
            return Ok(());
        }

        self.in_transaction(|| {
            let diff = node.rgt - node.lft + 1;
            let t = &self.table;

            // detach the subtree, keeping its shape as negative markers
            self.store.execute(
                &format!(
                    "UPDATE {t} SET lft = -(lft - ?1 + 1), rgt = -(rgt - ?1 + 1) \
                      WHERE lft >= ?1 AND rgt <= ?2 AND lft < rgt"
                ),
                &[Value::Integer(node.lft), Value::Integer(node.rgt)],
            )?;

            // collapse the vacated gap
            self.store.execute(
                &format!("UPDATE {t} SET lft = lft - ?1 WHERE lft > ?2"),
                &[Value::Integer(diff), Value::Integer(node.lft)],
            )?;
            self.store.execute(
                &format!("UPDATE {t} SET rgt = rgt - ?1 WHERE rgt > ?2"),
                &[Value::Integer(diff), Value::Integer(node.rgt)],
            )?;

            // the collapse may have shifted the new parent
            let parent = self.find_node(new_parent_id)?.ok_or(Error::Corrupt)?;

            // open a gap after the parent's last child slot
            self.store.execute(
                &format!("UPDATE {t} SET lft = lft + ?1 WHERE lft > ?2"),
                &[Value::Integer(diff), Value::Integer(parent.rgt)],
            )?;
            self.store.execute(
                &format!("UPDATE {t} SET rgt = rgt + ?1 WHERE rgt >= ?2"),
                &[Value::Integer(diff), Value::Integer(parent.rgt)],
            )?;

            // the gap just opened moved the parent's own rgt
            let parent = self.find_node(new_parent_id)?.ok_or(Error::Corrupt)?;

            // map the negative markers into the gap
            self.store.execute(
                &format!("UPDATE {t} SET lft = ?1 - ?2 - lft - 1 WHERE lft < 0"),
                &[Value::Integer(parent.rgt), Value::Integer(diff)],
            )?;
            self.store.execute(
                &format!("UPDATE {t} SET rgt = ?1 - ?2 - rgt - 1 WHERE rgt < 0"),
                &[Value::Integer(parent.rgt), Value::Integer(diff)],
            )?;

            // keep adjacency in step with the positional index
            self.store.execute(
                &format!("UPDATE {t} SET parent_id = ?1 WHERE id = ?2"),
                &[new_parent_id.to_value(), id.to_value()],
            )?;
            Ok(())
        })?;

        debug!("moved node {id:?} under {new_parent_id:?}");
        Ok(())
    }

    /// Recompute every interval from `parent_id` adjacency, which is
    /// treated as ground truth. With `sort`, children are visited in label
    /// order. Repairs a corrupted positional index.
    pub fn rebuild(&self, sort: bool) -> Result<()> {
        let positioned = self.in_transaction(|| {
            self.store.execute(
                &format!("UPDATE {} SET lft = 0, rgt = 0", self.table),
                &[],
            )?;

            let order = if sort {
                format!(" ORDER BY {} ASC", self.label)
            } else {
                String::new()
            };
            let roots_sql = format!(
                "SELECT id FROM {} WHERE parent_id IS NULL{order}",
                self.table
            );
            let children_sql = format!("SELECT id FROM {} WHERE parent_id = ?1{order}", self.table);
            let assign_sql = format!(
                "UPDATE {} SET lft = ?1, rgt = ?2 WHERE id = ?3",
                self.table
            );

            // depth-first with an explicit stack; a frame closes (and its
            // rgt is assigned) once all its children have been visited
            let mut positioned = 0u64;
            let mut free: i64 = 0;
            let mut stack: Vec<Frame<K>> = Vec::new();

            for root in self.key_list(&roots_sql, &[])? {
                let children = self.key_list(&children_sql, &[root.to_value()])?;
                stack.push(Frame {
                    id: root,
                    lft: free,
                    children: children.into_iter(),
                });
                free += 1;

                while !stack.is_empty() {
                    let next = stack.last_mut().and_then(|frame| frame.children.next());
                    match next {
                        Some(child) => {
                            let children = self.key_list(&children_sql, &[child.to_value()])?;
                            stack.push(Frame {
                                id: child,
                                lft: free,
                                children: children.into_iter(),
                            });
                            free += 1;
                        }
                        None => {
                            if let Some(frame) = stack.pop() {
                                let rgt = free;
                                free += 1;
                                self.store.execute(
                                    &assign_sql,
                                    &[
                                        Value::Integer(frame.lft),
                                        Value::Integer(rgt),
                                        frame.id.to_value(),
                                    ],
                                )?;
                                positioned += 1;
                            }
                        }
                    }
                }
            }
            Ok(positioned)
        })?;

        debug!("rebuilt index, {positioned} nodes positioned");
        Ok(())
    }

    // ---- internals -------------------------------------------------------

    /// Run `op` inside a transaction, committing on success and rolling
    /// back (re-raising the original error) on failure.
    fn in_transaction<T>(&self, op: impl FnOnce() -> Result<T>) -> Result<T> {
        self.store.begin()?;
        let result = op().and_then(|value| {
            self.store.commit()?;
            Ok(value)
        });
        if let Err(e) = &result {
            if let Err(rollback_err) = self.store.rollback() {
                warn!("rollback after '{e}' failed: {rollback_err}");
            }
        }
        result
    }

    /// Interval bounds of `id`, `None` if the row is missing or not part
    /// of the positional index (`lft >= rgt`).
    fn find_node(&self, id: &K) -> Result<Option<Bounds>> {
        let sql = format!("SELECT lft, rgt FROM {} WHERE id = ?1", self.table);
        let Some(row) = self.store.row(&sql, &[id.to_value()])? else {
            return Ok(None);
        };
        let bounds = Bounds {
            lft: int_column(&row, "lft")?,
            rgt: int_column(&row, "rgt")?,
        };
        Ok((bounds.lft < bounds.rgt).then_some(bounds))
    }

    /// `parent_id` of the row, `None` if the row does not exist.
    fn parent_value(&self, id: &K) -> Result<Option<Value>> {
        let sql = format!("SELECT parent_id FROM {} WHERE id = ?1", self.table);
        let Some(row) = self.store.row(&sql, &[id.to_value()])? else {
            return Ok(None);
        };
        match row.get("parent_id") {
            Some(value) => Ok(Some(value.clone())),
            None => Err(Error::Malformed("parent_id")),
        }
    }

    /// Decode the first column of every row as a key.
    fn key_list(&self, sql: &str, params: &[Value]) -> Result<Vec<K>> {
        self.store
            .column(sql, params)?
            .iter()
            .map(|value| K::from_value(value).ok_or(Error::Malformed("id")))
            .collect()
    }

    /// Decode `id`/`name` rows.
    fn entries(&self, rows: &[Row]) -> Result<Vec<NodeEntry<K>>> {
        rows.iter()
            .map(|row| {
                Ok(NodeEntry {
                    id: key_column(row, "id")?,
                    name: text_column(row, "name")?,
                })
            })
            .collect()
    }
}

fn scalar_i64(value: Option<Value>) -> i64 {
    match value {
        Some(Value::Integer(n)) => n,
        _ => 0,
    }
}

fn int_column(row: &Row, name: &'static str) -> Result<i64> {
    match row.get(name) {
        Some(Value::Integer(n)) => Ok(*n),
        _ => Err(Error::Malformed(name)),
    }
}

fn text_column(row: &Row, name: &'static str) -> Result<String> {
    match row.get(name) {
        Some(Value::Text(s)) => Ok(s.clone()),
        _ => Err(Error::Malformed(name)),
    }
}

fn key_column<K: NodeKey>(row: &Row, name: &'static str) -> Result<K> {
    row.get(name)
        .and_then(K::from_value)
        .ok_or(Error::Malformed(name))
}
