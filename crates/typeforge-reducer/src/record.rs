// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Node record type.

use std::collections::BTreeMap;

use crate::value::Value;

/// Materialised record for a single node stored in the arena.
///
/// Invariants
/// - The node identifier is not embedded here; the store supplies it externally.
/// - Exactly one field acts as the discriminator; which one is decided by the
///   reducer configuration, not by the record.
/// - Field order is the map's key order, so iteration (and hashing) is
///   deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeRecord {
    /// Field name to value.
    pub fields: BTreeMap<String, Value>,
}

impl NodeRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a record whose discriminator field `field` holds `kind`.
    #[must_use]
    pub fn of_kind(field: &str, kind: &str) -> Self {
        Self::new().with(field, kind)
    }

    /// Builder-style field assignment.
    #[must_use]
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_owned(), value.into());
        self
    }

    /// Returns the value of `field`, if set.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Sets `field`, returning the previous value.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.to_owned(), value.into())
    }

    /// Returns the string held by `field` (used for discriminator lookups).
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Iterate over every node reference held by this record, in field order.
    pub fn references(&self) -> Vec<crate::ident::NodeId> {
        let mut out = Vec::new();
        for value in self.fields.values() {
            value.for_each_ref(&mut |id| out.push(id));
        }
        out
    }
}
