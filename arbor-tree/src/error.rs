// SPDX-FileCopyrightText: 2026 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Error types for tree operations.

use thiserror::Error;

/// Result type for tree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during tree operations.
///
/// Store failures pass through untranslated; the remaining variants only
/// fire on rows that defeat decoding, which means the positional index is
/// corrupt and `rebuild` is the repair tool.
#[derive(Error, Debug)]
pub enum Error {
    /// Store failure, propagated unchanged
    #[error(transparent)]
    Store(#[from] arbor_store::Error),

    /// A row held an unexpected value type in the named column
    #[error("malformed row: unexpected value in column '{0}'")]
    Malformed(&'static str),

    /// A node vanished mid-transaction
    #[error("positional index is corrupt; run rebuild() to repair it")]
    Corrupt,
}
