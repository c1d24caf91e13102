// SPDX-FileCopyrightText: 2026 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Result row types for tree queries.

use crate::key::NodeKey;

/// A node as returned by ancestor/sibling/child listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEntry<K: NodeKey> {
    /// Caller-assigned row identity
    pub id: K,
    /// Value of the label column
    pub name: String,
}

/// A node in a descendant listing, annotated with its nesting depth.
///
/// Depth is relative to the queried node unless the listing was requested
/// with absolute depths, in which case it counts from the root level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescendantEntry<K: NodeKey> {
    /// Caller-assigned row identity
    pub id: K,
    /// Value of the label column
    pub name: String,
    /// Nesting depth (1 = immediate child in relative listings)
    pub depth: u32,
}

/// A node in a subtree listing, annotated with depth and materialized path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry<K: NodeKey> {
    /// Caller-assigned row identity
    pub id: K,
    /// Value of the label column
    pub name: String,
    /// Absolute nesting depth (0 = root level)
    pub depth: u32,
    /// Dot-separated label path from the queried node down to this entry
    pub path: String,
}
