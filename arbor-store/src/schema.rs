// SPDX-FileCopyrightText: 2026 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Schema definition for tree-indexed tables.
//!
//! The tree core maintains only `lft`/`rgt`; `parent_id` adjacency and the
//! row lifecycle belong to the caller. Tables created here follow that
//! contract: freshly inserted rows start unpositioned (`lft = rgt = 0`)
//! until `insert_node` or `rebuild` assigns them an interval.

/// DDL for a tree-indexed table.
///
/// The table and label-column names are caller-chosen, so this is a
/// function rather than a `const`. The caller is responsible for passing
/// trusted identifiers; no quoting is applied.
pub fn tree_table_sql(table: &str, label: &str) -> String {
    format!(
        r#"
create table if not exists {table} (
    id        integer primary key not null,
    parent_id integer,
    lft       integer not null default 0,
    rgt       integer not null default 0,
    {label}   text not null
);

create index if not exists Idx{table}Lft on {table}(lft);
create index if not exists Idx{table}Rgt on {table}(rgt);
create index if not exists Idx{table}Parent on {table}(parent_id);
"#
    )
}
