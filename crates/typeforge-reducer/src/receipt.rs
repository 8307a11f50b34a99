// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reduce receipts: what one top-level invocation did.
//!
//! A receipt is diagnostic only. It never influences the reduced graph, and
//! it is returned alongside the result by
//! [`crate::Reducer::reduce_with_receipt`] so tests and tooling can assert
//! "nothing was cloned" style properties without inspecting the arena.

use crate::ident::ReducerId;

/// Counters for a single top-level `reduce` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReduceReceipt {
    pub(crate) invocation: ReducerId,
    pub(crate) visits: u64,
    pub(crate) copies: u64,
    pub(crate) writes: u64,
    pub(crate) restarts: u64,
    pub(crate) cycle_reentries: u64,
    pub(crate) persisted_hits: u64,
    pub(crate) removals: u64,
    pub(crate) persisted: u64,
}

impl ReduceReceipt {
    pub(crate) fn new(invocation: ReducerId) -> Self {
        Self {
            invocation,
            visits: 0,
            copies: 0,
            writes: 0,
            restarts: 0,
            cycle_reentries: 0,
            persisted_hits: 0,
            removals: 0,
            persisted: 0,
        }
    }

    /// Invocation identifier (also recorded in provenance).
    #[must_use]
    pub fn invocation(&self) -> ReducerId {
        self.invocation
    }

    /// Visitation records pushed (fresh `reduce` calls).
    #[must_use]
    pub fn visits(&self) -> u64 {
        self.visits
    }

    /// Records allocated by the engine: working copies and owned replacements.
    #[must_use]
    pub fn copies(&self) -> u64 {
        self.copies
    }

    /// Field writes that actually changed a value.
    #[must_use]
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Dispatch restarts caused by discriminator changes.
    #[must_use]
    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    /// `reduce` calls that hit a node already in flight.
    #[must_use]
    pub fn cycle_reentries(&self) -> u64 {
        self.cycle_reentries
    }

    /// `reduce` calls answered from the persisted-entries table.
    #[must_use]
    pub fn persisted_hits(&self) -> u64 {
        self.persisted_hits
    }

    /// Nodes removed.
    #[must_use]
    pub fn removals(&self) -> u64 {
        self.removals
    }

    /// Persisted entries at the end of the invocation.
    #[must_use]
    pub fn persisted(&self) -> u64 {
        self.persisted
    }

    /// Returns `true` if the invocation allocated nothing and removed nothing.
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.copies == 0 && self.removals == 0
    }
}
