// SPDX-FileCopyrightText: 2026 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Node key abstraction.
//!
//! The tree never generates or interprets row identity; it only binds keys
//! into queries and reads them back out. Any type that round-trips through
//! a SQL [`Value`] can serve as the key column.

use std::fmt;

use arbor_store::Value;

/// A caller-assigned node identifier.
pub trait NodeKey: Clone + Eq + fmt::Debug {
    /// Convert the key into a SQL parameter.
    fn to_value(&self) -> Value;

    /// Read the key back from a result column, `None` on a type mismatch.
    fn from_value(value: &Value) -> Option<Self>;
}

impl NodeKey for i64 {
    fn to_value(&self) -> Value {
        Value::Integer(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

impl NodeKey for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}
