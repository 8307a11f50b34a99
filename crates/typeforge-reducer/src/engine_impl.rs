// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Core reducer implementation.
use std::sync::Arc;

use thiserror::Error;

use crate::context::ReduceContext;
use crate::ident::NodeId;
use crate::ledger::{Ledger, Visit};
use crate::pool::{PoolStats, SlotPool};
use crate::provenance::{TrackMode, TrackingStats};
use crate::receipt::ReduceReceipt;
use crate::spec::Spec;

/// Maximum number of discriminator-change restarts allowed for one visit.
///
/// Specs are expected to converge in a handful of steps (e.g. `UNION` ->
/// `STRING`); anything beyond this is treated as a configuration error.
pub const MAX_RESTARTS: u32 = 16;

/// Errors emitted by the reducer.
///
/// Every variant is fatal for the invocation that raised it: the engine is a
/// deterministic transformation, so there is nothing to retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReduceError {
    /// A reference pointed outside the store.
    #[error("node {0} does not exist in the store")]
    UnknownNode(NodeId),
    /// A reduced node lacks a string-valued discriminator.
    #[error("node {node} has no string discriminator field `{field}`")]
    MissingDiscriminator {
        /// Node that failed the lookup.
        node: NodeId,
        /// Configured discriminator field name.
        field: String,
    },
    /// A mutation targeted a node that is not currently being reduced.
    #[error("node {0} is not in flight; only nodes on the active reduce chain can be written")]
    NotInFlight(NodeId),
    /// A mutation targeted a node that was already removed.
    #[error("node {0} was removed and can no longer be written")]
    WriteAfterRemove(NodeId),
    /// A child the caller required was removed during reduction.
    #[error("required child was removed during reduction")]
    RequiredChildRemoved,
    /// `replace` kept flipping discriminators without converging.
    #[error(
        "dispatch for node {node} did not converge after {restarts} restarts: {}",
        .chain.join(" -> ")
    )]
    RestartLimitExceeded {
        /// Node whose dispatch kept restarting.
        node: NodeId,
        /// Restarts performed before giving up.
        restarts: u32,
        /// Discriminator of every dispatch round, oldest first.
        chain: Vec<String>,
    },
    /// A caller-asserted structural invariant failed.
    #[error("structural contract violated: {0}")]
    Contract(String),
    /// Internal invariant violated (engine state corruption).
    #[error("internal invariant violated: {0}")]
    InternalCorruption(&'static str),
}

impl ReduceError {
    /// Convenience constructor for [`ReduceError::Contract`].
    pub fn contract(message: impl Into<String>) -> Self {
        Self::Contract(message.into())
    }
}

/// Fails fast when a child that must survive reduction was removed.
///
/// # Errors
/// Returns [`ReduceError::RequiredChildRemoved`] for `None`.
pub fn require_defined(node: Option<NodeId>) -> Result<NodeId, ReduceError> {
    node.ok_or(ReduceError::RequiredChildRemoved)
}

/// Configuration fixed at build time.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) discriminator: String,
    pub(crate) track: TrackMode,
    pub(crate) immutable: bool,
    pub(crate) debug: bool,
    pub(crate) stats: Arc<TrackingStats>,
}

/// A configured rewrite pass.
///
/// Built by [`crate::ReducerBuilder`]. Owns the dispatch pipeline, the options,
/// the visitation ledger, and a slot pool of visit records that is reused
/// across invocations. `reduce` takes `&mut self`: one reducer serves one
/// invocation at a time, while independent reducers may run on separate
/// threads.
pub struct Reducer {
    settings: Settings,
    specs: Vec<Spec>,
    ledger: Ledger,
    pool: SlotPool<Visit>,
}

impl core::fmt::Debug for Reducer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Reducer")
            .field("settings", &self.settings)
            .field("specs", &self.specs)
            .finish_non_exhaustive()
    }
}

impl Reducer {
    pub(crate) fn new(settings: Settings, specs: Vec<Spec>, pool_capacity: usize) -> Self {
        Self {
            settings,
            specs,
            ledger: Ledger::default(),
            pool: SlotPool::with_capacity(pool_capacity),
        }
    }

    /// Reduces the graph rooted at `root`.
    ///
    /// Returns the reduced root: the identical `root` id when nothing changed,
    /// a fresh node when something did, or `None` when a handler removed it.
    ///
    /// # Errors
    /// Propagates the first [`ReduceError`] raised by the engine or a handler.
    pub fn reduce(
        &mut self,
        store: &mut crate::NodeStore,
        root: NodeId,
    ) -> Result<Option<NodeId>, ReduceError> {
        self.reduce_with_receipt(store, root).map(|(result, _)| result)
    }

    /// Reduces the graph rooted at `root`, also returning a [`ReduceReceipt`].
    ///
    /// # Errors
    /// Propagates the first [`ReduceError`] raised by the engine or a handler.
    pub fn reduce_with_receipt(
        &mut self,
        store: &mut crate::NodeStore,
        root: NodeId,
    ) -> Result<(Option<NodeId>, ReduceReceipt), ReduceError> {
        let invocation = self.settings.stats.next_reducer_id();
        let span = tracing::debug_span!("reduce", %invocation, %root);
        let _entered = span.enter();

        let mut cx = ReduceContext {
            store,
            ledger: &mut self.ledger,
            pool: &mut self.pool,
            specs: &self.specs,
            settings: &self.settings,
            receipt: ReduceReceipt::new(invocation),
        };
        let result = cx.reduce(root);
        let mut receipt = cx.receipt;
        receipt.persisted = self.ledger.persisted_len() as u64;

        // Visits left behind by an error still go back to the pool.
        for visit in self.ledger.reset() {
            self.pool.release(visit);
        }
        let result = result?;
        crate::telemetry::summary(&receipt);
        Ok((result, receipt))
    }

    /// Configured discriminator field name.
    #[must_use]
    pub fn discriminator(&self) -> &str {
        &self.settings.discriminator
    }

    /// Spec names in dispatch (priority) order.
    #[must_use]
    pub fn spec_names(&self) -> Vec<&str> {
        self.specs.iter().map(Spec::name).collect()
    }

    /// Provenance policy.
    #[must_use]
    pub fn track_mode(&self) -> TrackMode {
        self.settings.track
    }

    /// Returns `true` when mutations are disabled.
    #[must_use]
    pub fn is_immutable(&self) -> bool {
        self.settings.immutable
    }

    /// Returns `true` when provenance traces are captured.
    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.settings.debug
    }

    /// Counter source used for provenance and invocation ids.
    #[must_use]
    pub fn tracking_stats(&self) -> &Arc<TrackingStats> {
        &self.settings.stats
    }

    /// Allocation counters of the visit-record pool.
    #[must_use]
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ReducerBuilder;
    use crate::record::NodeRecord;
    use crate::store::NodeStore;

    #[test]
    fn require_defined_rejects_removed_children() {
        assert_eq!(require_defined(Some(NodeId(1))), Ok(NodeId(1)));
        assert_eq!(require_defined(None), Err(ReduceError::RequiredChildRemoved));
    }

    #[test]
    fn restart_error_lists_the_chain() {
        let err = ReduceError::RestartLimitExceeded {
            node: NodeId(3),
            restarts: 2,
            chain: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(
            err.to_string(),
            "dispatch for node #3 did not converge after 2 restarts: A -> B -> A"
        );
    }

    #[test]
    fn reducers_can_move_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Reducer>();
        assert_send_sync::<ReduceError>();
    }

    #[test]
    fn pool_is_reused_across_invocations() {
        let mut store = NodeStore::new();
        let root = store.insert(NodeRecord::of_kind("kind", "Leaf"));
        let mut reducer = ReducerBuilder::new("kind").build(None);

        let first = reducer.reduce(&mut store, root);
        assert_eq!(first, Ok(Some(root)));
        let second = reducer.reduce(&mut store, root);
        assert_eq!(second, Ok(Some(root)));
        let stats = reducer.pool_stats();
        assert_eq!(stats.allocated, 1);
        assert_eq!(stats.reused, 1);
    }

    #[test]
    fn missing_discriminator_is_reported() {
        let mut store = NodeStore::new();
        let root = store.insert(NodeRecord::new().with("x", 1));
        let mut reducer = ReducerBuilder::new("kind").build(None);
        let err = reducer.reduce(&mut store, root);
        assert_eq!(
            err,
            Err(ReduceError::MissingDiscriminator {
                node: root,
                field: "kind".into()
            })
        );
        // The ledger is clean again after the failure.
        assert_eq!(
            reducer.reduce(&mut store, NodeId(42)),
            Err(ReduceError::UnknownNode(NodeId(42)))
        );
    }
}
