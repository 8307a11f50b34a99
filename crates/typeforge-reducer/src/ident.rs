// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier types for nodes, reducer invocations, and visits.

/// Canonical 256-bit digest used by [`crate::structural_digest`].
pub type Hash = [u8; 32];

/// Strongly typed identifier for a node record in a [`crate::NodeStore`].
///
/// A `NodeId` is the node's *identity*: two records with identical fields are
/// still distinct nodes when their ids differ. The store is append-only, so an
/// id handed out once always addresses the same record contents as far as the
/// engine is concerned.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u32);

impl NodeId {
    /// Returns the arena index backing this id.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of one top-level reducer invocation.
///
/// Drawn from the reducer's [`crate::TrackingStats`] and recorded in the
/// provenance of every node that invocation rewrote.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReducerId(u64);

impl ReducerId {
    /// Constructs a `ReducerId` from a raw `u64` value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying raw value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for ReducerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Locally unique sequence number of a visitation record.
///
/// Only meaningful within a single top-level invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default)]
pub struct VisitSeq(pub u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms_are_distinct() {
        assert_eq!(NodeId(7).to_string(), "#7");
        assert_eq!(ReducerId::from_raw(7).to_string(), "r7");
    }
}
