// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Provenance tracking for rewritten nodes.
//!
//! When tracking is enabled, every node a reducer actually rewrote (and only
//! those) receives a [`Provenance`] entry in the store's provenance plane:
//!
//! - `id`: a value drawn from the reducer's [`TrackingStats`] identity counter.
//! - `generation`: how many successive rewrites produced this instance.
//! - `reducers`: the invocation(s) responsible, per [`TrackMode`].
//! - `trace`: the ledger call chain at the time of the rewrite (debug only).
//!
//! Counters are injected. Reducers built without an explicit source get a
//! private one; tests that need stable numbering across several reducers pass
//! their own `Arc<TrackingStats>`.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::ident::{NodeId, ReducerId};
use crate::store::NodeStore;

/// Policy for attaching provenance to changed nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TrackMode {
    /// Never attach metadata.
    #[default]
    None,
    /// Keep only the most recent reducer id.
    Last,
    /// Accumulate every reducer id that touched the node's lineage.
    Multiple,
}

/// Counter source for identities and reducer invocation ids.
///
/// Atomic so that one source may be shared by reducers running on different
/// threads; each counter is strictly increasing.
#[derive(Debug, Default)]
pub struct TrackingStats {
    next_id: AtomicU64,
    next_reducer: AtomicU64,
}

impl TrackingStats {
    /// Creates a source whose counters start at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source whose counters both start at `base`.
    #[must_use]
    pub fn starting_at(base: u64) -> Self {
        Self {
            next_id: AtomicU64::new(base),
            next_reducer: AtomicU64::new(base),
        }
    }

    /// Draws the next identity value.
    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Draws the next reducer invocation id.
    pub fn next_reducer_id(&self) -> ReducerId {
        ReducerId::from_raw(self.next_reducer.fetch_add(1, Ordering::Relaxed))
    }

    /// Peeks at the next identity value without consuming it.
    #[must_use]
    pub fn peek_id(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed)
    }
}

/// Metadata attached to a rewritten node.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Provenance {
    /// Identity counter value.
    pub id: u64,
    /// Number of successive rewrites that produced this instance (>= 1).
    pub generation: u32,
    /// Responsible reducer invocations, oldest first, without duplicates.
    pub reducers: Vec<ReducerId>,
    /// Ledger call chain captured when `debug` is enabled.
    pub trace: Option<String>,
}

/// Stamps `result` as a rewrite of `source` performed by invocation `reducer`.
///
/// The generation and reducer lineage continue from `source`'s own metadata
/// when it has any (i.e. it was itself produced by an earlier pass).
pub(crate) fn stamp(
    store: &mut NodeStore,
    stats: &TrackingStats,
    mode: TrackMode,
    reducer: ReducerId,
    source: NodeId,
    result: NodeId,
    trace: Option<String>,
) {
    if mode == TrackMode::None {
        return;
    }
    let prior = store.provenance(source);
    let generation = prior.map_or(1, |p| p.generation.saturating_add(1));
    let reducers = match (mode, prior) {
        (TrackMode::Multiple, Some(p)) => {
            let mut ids = p.reducers.clone();
            if !ids.contains(&reducer) {
                ids.push(reducer);
            }
            ids
        }
        _ => vec![reducer],
    };
    let provenance = Provenance {
        id: stats.next_id(),
        generation,
        reducers,
        trace,
    };
    store.set_provenance(result, provenance);
}
