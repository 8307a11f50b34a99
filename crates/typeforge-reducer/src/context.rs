// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The controller handed to every handler.
//!
//! A [`ReduceContext`] borrows the store and the reducer's ledger for the
//! duration of one top-level invocation. Handlers use it to read nodes
//! (always through their live working copy), to recurse into children, and
//! to walk further down the dispatch pipeline with [`ReduceContext::yield_base`].
//! The mutation half of the controller lives in `working_copy.rs`.

use crate::engine_impl::{ReduceError, Settings, MAX_RESTARTS};
use crate::ident::{NodeId, ReducerId};
use crate::ledger::{Ledger, Visit, Visitation};
use crate::pool::SlotPool;
use crate::provenance::{self, TrackMode};
use crate::receipt::ReduceReceipt;
use crate::record::NodeRecord;
use crate::spec::{find_handler, Spec};
use crate::store::NodeStore;
use crate::telemetry;
use crate::value::Value;

/// Per-invocation controller.
pub struct ReduceContext<'a> {
    pub(crate) store: &'a mut NodeStore,
    pub(crate) ledger: &'a mut Ledger,
    pub(crate) pool: &'a mut SlotPool<Visit>,
    pub(crate) specs: &'a [Spec],
    pub(crate) settings: &'a Settings,
    pub(crate) receipt: ReduceReceipt,
}

impl core::fmt::Debug for ReduceContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ReduceContext")
            .field("invocation", &self.receipt.invocation())
            .field("depth", &self.ledger.depth())
            .finish_non_exhaustive()
    }
}

impl ReduceContext<'_> {
    /// Reduces `node` and returns its result.
    ///
    /// - A node persisted earlier in this invocation returns the memoized
    ///   result without running any handler.
    /// - A node already being reduced higher up the call chain (a cycle),
    ///   addressed by its original id or by its live replacement, returns its
    ///   working copy, creating it on the spot if needed. In immutable mode
    ///   the original is returned instead.
    /// - A working copy produced by a finished visit of this invocation is
    ///   already reduced and returns itself.
    /// - Otherwise the node is dispatched through the pipeline. The result is
    ///   the original id when nothing changed beneath it, its working copy when
    ///   something did, or `None` when it was removed.
    ///
    /// # Errors
    /// [`ReduceError::UnknownNode`] / [`ReduceError::MissingDiscriminator`]
    /// for malformed input, plus anything a handler returns.
    pub fn reduce(&mut self, node: NodeId) -> Result<Option<NodeId>, ReduceError> {
        match self.ledger.classify(node) {
            Visitation::Done(result) => {
                self.receipt.persisted_hits += 1;
                telemetry::persisted_hit(node, result);
                return Ok(result);
            }
            Visitation::InFlight(idx) => return self.reenter(idx),
            Visitation::Settled => return Ok(Some(node)),
            Visitation::Fresh => {}
        }

        let kind = self.kind_of(node)?.to_owned();
        let mut visit = self.pool.take();
        visit.kinds.push(kind);
        let idx = self.ledger.push(visit, node);
        self.receipt.visits += 1;
        if let Some(v) = self.ledger.get(idx) {
            telemetry::visit(node, v.seq, v.round_kind().unwrap_or_default(), idx);
        }

        let dispatched = self.dispatch(idx, node);
        let trace = match (&dispatched, self.ledger.get(idx)) {
            (Ok(()), Some(v)) if self.wants_trace() && v.changes > 0 => Some(self.ledger.path()),
            _ => None,
        };

        let Some(visit) = self.ledger.pop() else {
            return Err(ReduceError::InternalCorruption("visit stack underflow"));
        };
        if let Err(err) = dispatched {
            self.pool.release(visit);
            return Err(err);
        }
        let result = self.finish(&visit, trace);
        self.pool.release(visit);
        Ok(result)
    }

    /// Runs the next applicable spec below the current one for `node`.
    ///
    /// Returns the node's live id afterwards (`None` if it was removed). If
    /// the node's discriminator already changed during this round, nothing
    /// runs: the pipeline restarts from the top once the current handler
    /// returns.
    ///
    /// # Errors
    /// [`ReduceError::NotInFlight`] when `node` is not being reduced, plus
    /// anything the next handler returns.
    pub fn yield_base(&mut self, node: NodeId) -> Result<Option<NodeId>, ReduceError> {
        let specs = self.specs;
        let idx = self
            .ledger
            .find_live(node)
            .ok_or(ReduceError::NotInFlight(node))?;
        let visit = self.visit(idx)?;
        let (original, depth) = (visit.original, visit.depth);
        let round = visit.round_kind().unwrap_or_default().to_owned();
        let Some(live) = visit.live() else {
            return Ok(None);
        };
        if self.kind_of(live)? != round {
            return Ok(Some(live));
        }
        if let Some((pos, handler)) = find_handler(specs, depth, &round) {
            self.visit_mut(idx)?.depth = pos + 1;
            (**handler)(self, original)?;
        }
        Ok(self.visit(idx)?.live())
    }

    /// [`Self::yield_base`], discarding the result.
    ///
    /// # Errors
    /// Same as [`Self::yield_base`].
    pub fn call_base(&mut self, node: NodeId) -> Result<(), ReduceError> {
        self.yield_base(node).map(|_| ())
    }

    /// Live id of `node`: its working copy while it is in flight, `None` once
    /// removed, the node itself otherwise.
    #[must_use]
    pub fn live(&self, node: NodeId) -> Option<NodeId> {
        match self.ledger.find_live(node).and_then(|idx| self.ledger.get(idx)) {
            Some(visit) => visit.live(),
            None => Some(node),
        }
    }

    /// Live record of `node`.
    #[must_use]
    pub fn record(&self, node: NodeId) -> Option<&NodeRecord> {
        self.live(node).and_then(|id| self.store.node(id))
    }

    /// Reads `field` of `node` through its live working copy.
    #[must_use]
    pub fn get(&self, node: NodeId, field: &str) -> Option<&Value> {
        self.record(node).and_then(|r| r.get(field))
    }

    /// Live discriminator of `node`.
    #[must_use]
    pub fn kind(&self, node: NodeId) -> Option<&str> {
        self.get(node, &self.settings.discriminator)
            .and_then(Value::as_str)
    }

    /// Single reference stored in `field`, if any.
    #[must_use]
    pub fn node_ref(&self, node: NodeId, field: &str) -> Option<NodeId> {
        self.get(node, field).and_then(Value::as_node)
    }

    /// References stored in the list `field`, in order. Non-reference
    /// elements are skipped.
    #[must_use]
    pub fn node_list(&self, node: NodeId, field: &str) -> Vec<NodeId> {
        self.get(node, field)
            .and_then(Value::as_list)
            .map(|items| items.iter().filter_map(Value::as_node).collect())
            .unwrap_or_default()
    }

    /// Read-only view of the whole store.
    #[must_use]
    pub fn store(&self) -> &NodeStore {
        self.store
    }

    /// Allocates a brand-new node, e.g. a child for a replacement record.
    pub fn create(&mut self, record: NodeRecord) -> NodeId {
        self.store.insert(record)
    }

    /// Changes observed so far by the visit reducing `node` (0 when it is not
    /// in flight).
    #[must_use]
    pub fn changes(&self, node: NodeId) -> u64 {
        self.ledger
            .find_live(node)
            .and_then(|idx| self.ledger.get(idx))
            .map_or(0, |v| v.changes)
    }

    /// Returns `true` when mutations are disabled for this reducer.
    #[must_use]
    pub fn is_immutable(&self) -> bool {
        self.settings.immutable
    }

    /// Configured discriminator field name.
    #[must_use]
    pub fn discriminator(&self) -> &str {
        &self.settings.discriminator
    }

    /// Id of the running top-level invocation.
    #[must_use]
    pub fn invocation(&self) -> ReducerId {
        self.receipt.invocation()
    }

    /// Number of nodes currently in flight.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.ledger.depth()
    }

    pub(crate) fn visit(&self, idx: usize) -> Result<&Visit, ReduceError> {
        self.ledger
            .get(idx)
            .ok_or(ReduceError::InternalCorruption("visit index out of range"))
    }

    pub(crate) fn visit_mut(&mut self, idx: usize) -> Result<&mut Visit, ReduceError> {
        self.ledger
            .get_mut(idx)
            .ok_or(ReduceError::InternalCorruption("visit index out of range"))
    }

    /// Returns the visit's engine-owned working copy, cloning one from its
    /// original (or from a non-owned replacement) the first time.
    pub(crate) fn ensure_working_copy(&mut self, idx: usize) -> Result<NodeId, ReduceError> {
        let visit = self.visit(idx)?;
        let source = visit.replacement.unwrap_or(visit.original);
        if visit.owned {
            return Ok(source);
        }
        let copy = self
            .store
            .clone_node(source)
            .ok_or(ReduceError::UnknownNode(source))?;
        let visit = self.visit_mut(idx)?;
        visit.replacement = Some(copy);
        visit.owned = true;
        self.receipt.copies += 1;
        Ok(copy)
    }

    fn kind_of(&self, node: NodeId) -> Result<&str, ReduceError> {
        let record = self
            .store
            .node(node)
            .ok_or(ReduceError::UnknownNode(node))?;
        record
            .str_field(&self.settings.discriminator)
            .ok_or_else(|| ReduceError::MissingDiscriminator {
                node,
                field: self.settings.discriminator.clone(),
            })
    }

    fn wants_trace(&self) -> bool {
        self.settings.debug && self.settings.track != TrackMode::None
    }

    fn reenter(&mut self, idx: usize) -> Result<Option<NodeId>, ReduceError> {
        self.receipt.cycle_reentries += 1;
        let visit = self.visit(idx)?;
        let original = visit.original;
        let placeholder = if self.settings.immutable {
            Some(original)
        } else if visit.removed {
            None
        } else {
            Some(self.ensure_working_copy(idx)?)
        };
        telemetry::cycle_reentry(original, placeholder);
        Ok(placeholder)
    }

    /// Runs dispatch rounds for the visit at `idx` until its discriminator
    /// stops changing.
    fn dispatch(&mut self, idx: usize, node: NodeId) -> Result<(), ReduceError> {
        let specs = self.specs;
        loop {
            let visit = self.visit(idx)?;
            let depth = visit.depth;
            let round = visit.round_kind().unwrap_or_default().to_owned();
            if let Some((pos, handler)) = find_handler(specs, depth, &round) {
                self.visit_mut(idx)?.depth = pos + 1;
                (**handler)(self, node)?;
            }

            let Some(live) = self.visit(idx)?.live() else {
                return Ok(());
            };
            let next = self.kind_of(live)?.to_owned();
            if next == round {
                return Ok(());
            }
            let visit = self.visit_mut(idx)?;
            if visit.restarts >= MAX_RESTARTS {
                let mut chain = std::mem::take(&mut visit.kinds);
                chain.push(next);
                return Err(ReduceError::RestartLimitExceeded {
                    node,
                    restarts: visit.restarts,
                    chain,
                });
            }
            visit.restarts += 1;
            visit.depth = 0;
            visit.kinds.push(next.clone());
            self.receipt.restarts += 1;
            telemetry::restart(node, &round, &next);
        }
    }

    /// Settles a popped visit: provenance, persistence, result.
    fn finish(&mut self, visit: &Visit, trace: Option<String>) -> Option<NodeId> {
        let result = visit.outcome();
        if let Some(out) = result {
            if visit.changes > 0 && visit.owned && visit.replacement == Some(out) {
                self.ledger.settle(out);
                provenance::stamp(
                    self.store,
                    &self.settings.stats,
                    self.settings.track,
                    self.receipt.invocation(),
                    visit.original,
                    out,
                    trace,
                );
            }
        }
        if visit.persist {
            self.ledger.persist(visit.original, result);
        }
        result
    }
}
