// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Visitation ledger: the stack of nodes whose reduction is in flight.
//!
//! One [`Visit`] exists per node currently being reduced on the active call
//! chain. Lookups are identity-keyed linear scans from the top of the stack;
//! rewrite graphs are shallow relative to their node count, so `O(depth)` is
//! the right trade against maintaining an index that must be kept in sync with
//! every push and pop.
//!
//! The ledger also owns the persisted-entries table and the set of settled
//! working copies. Both outlive individual visits but are cleared at the end
//! of every top-level invocation.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ident::{NodeId, VisitSeq};
use crate::pool::Recycle;

/// Bookkeeping for one node whose reduction is in progress.
#[derive(Debug)]
pub(crate) struct Visit {
    /// Locally unique sequence id.
    pub(crate) seq: VisitSeq,
    /// Identity of the node being reduced.
    pub(crate) original: NodeId,
    /// Live replacement, once the node changed or was replaced.
    pub(crate) replacement: Option<NodeId>,
    /// `true` when `replacement` is a working copy allocated for this visit
    /// and may therefore be written in place.
    pub(crate) owned: bool,
    /// Tombstone: the node was removed.
    pub(crate) removed: bool,
    /// Position of the next pipeline spec to consult.
    pub(crate) depth: usize,
    /// Changes observed while this visit was active (its own and its
    /// descendants').
    pub(crate) changes: u64,
    /// Memoize the final result for the rest of the invocation.
    pub(crate) persist: bool,
    /// Dispatch restarts caused by discriminator changes.
    pub(crate) restarts: u32,
    /// Discriminator of each dispatch round, oldest first.
    pub(crate) kinds: Vec<String>,
}

impl Default for Visit {
    fn default() -> Self {
        Self {
            seq: VisitSeq::default(),
            original: NodeId(0),
            replacement: None,
            owned: false,
            removed: false,
            depth: 0,
            changes: 0,
            persist: false,
            restarts: 0,
            kinds: Vec::new(),
        }
    }
}

impl Recycle for Visit {
    fn recycle(&mut self) {
        self.seq = VisitSeq::default();
        self.original = NodeId(0);
        self.replacement = None;
        self.owned = false;
        self.removed = false;
        self.depth = 0;
        self.changes = 0;
        self.persist = false;
        self.restarts = 0;
        self.kinds.clear();
    }
}

impl Visit {
    /// The node callers should observe right now; `None` once removed.
    pub(crate) fn live(&self) -> Option<NodeId> {
        if self.removed {
            None
        } else {
            Some(self.replacement.unwrap_or(self.original))
        }
    }

    /// Discriminator the current dispatch round started with.
    pub(crate) fn round_kind(&self) -> Option<&str> {
        self.kinds.last().map(String::as_str)
    }

    /// Final result of the visit, per the change counter.
    pub(crate) fn outcome(&self) -> Option<NodeId> {
        if self.removed {
            None
        } else if self.changes == 0 {
            Some(self.original)
        } else {
            Some(self.replacement.unwrap_or(self.original))
        }
    }
}

/// How a `reduce` call relates to work already done in this invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Visitation {
    /// Never seen in this invocation (or seen but not persisted).
    Fresh,
    /// Being reduced by an ancestor frame: a cycle. Carries the stack index.
    InFlight(usize),
    /// Persisted earlier in this invocation.
    Done(Option<NodeId>),
    /// A working copy minted by a visit that already finished; it is its
    /// own result.
    Settled,
}

/// Stack of active visits plus the persisted-entries table.
#[derive(Debug, Default)]
pub(crate) struct Ledger {
    stack: Vec<Visit>,
    persisted: FxHashMap<NodeId, Option<NodeId>>,
    settled: FxHashSet<NodeId>,
    next_seq: u64,
}

impl Ledger {
    /// Classifies `node` against persisted entries, the active stack and the
    /// settled working copies.
    ///
    /// A node is in flight when it is the original *or* the live replacement
    /// of an active visit, so a working copy written back into a field and
    /// reduced again is recognised as the same reduction.
    pub(crate) fn classify(&self, node: NodeId) -> Visitation {
        if let Some(done) = self.persisted.get(&node) {
            return Visitation::Done(*done);
        }
        if let Some(idx) = self.find_live(node) {
            return Visitation::InFlight(idx);
        }
        if self.settled.contains(&node) {
            return Visitation::Settled;
        }
        Visitation::Fresh
    }

    /// Pushes `visit` for `original` and returns its stack index.
    pub(crate) fn push(&mut self, mut visit: Visit, original: NodeId) -> usize {
        self.next_seq += 1;
        visit.seq = VisitSeq(self.next_seq);
        visit.original = original;
        self.stack.push(visit);
        self.stack.len() - 1
    }

    pub(crate) fn pop(&mut self) -> Option<Visit> {
        self.stack.pop()
    }

    /// Stack index of the visit whose original *or* live replacement is `node`.
    pub(crate) fn find_live(&self, node: NodeId) -> Option<usize> {
        self.stack
            .iter()
            .rposition(|v| v.original == node || v.replacement == Some(node))
    }

    pub(crate) fn get(&self, idx: usize) -> Option<&Visit> {
        self.stack.get(idx)
    }

    pub(crate) fn get_mut(&mut self, idx: usize) -> Option<&mut Visit> {
        self.stack.get_mut(idx)
    }

    /// Current stack depth.
    pub(crate) fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Records a change against every active visit.
    pub(crate) fn bump_all(&mut self) {
        for visit in &mut self.stack {
            visit.changes += 1;
        }
    }

    /// Memoizes the final result of `original`.
    pub(crate) fn persist(&mut self, original: NodeId, result: Option<NodeId>) {
        self.persisted.insert(original, result);
    }

    /// Marks `copy`, a finished visit's own working copy, as already reduced.
    pub(crate) fn settle(&mut self, copy: NodeId) {
        self.settled.insert(copy);
    }

    /// Number of persisted entries.
    pub(crate) fn persisted_len(&self) -> usize {
        self.persisted.len()
    }

    /// Human-readable call chain (`KIND#id > KIND#id`), root first.
    pub(crate) fn path(&self) -> String {
        let mut out = String::new();
        for (i, visit) in self.stack.iter().enumerate() {
            if i > 0 {
                out.push_str(" > ");
            }
            out.push_str(visit.round_kind().unwrap_or("?"));
            out.push_str(&visit.original.to_string());
        }
        out
    }

    /// Empties the stack (returning its visits) and forgets persisted entries
    /// and settled copies.
    pub(crate) fn reset(&mut self) -> Vec<Visit> {
        self.persisted.clear();
        self.settled.clear();
        self.next_seq = 0;
        std::mem::take(&mut self.stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(ledger: &mut Ledger, id: u32, kind: &str) -> usize {
        let mut visit = Visit::default();
        visit.kinds.push(kind.to_owned());
        ledger.push(visit, NodeId(id))
    }

    #[test]
    fn classify_distinguishes_fresh_in_flight_and_done() {
        let mut ledger = Ledger::default();
        push(&mut ledger, 1, "OBJECT");
        assert_eq!(ledger.classify(NodeId(1)), Visitation::InFlight(0));
        assert_eq!(ledger.classify(NodeId(2)), Visitation::Fresh);
        ledger.persist(NodeId(3), Some(NodeId(9)));
        assert_eq!(ledger.classify(NodeId(3)), Visitation::Done(Some(NodeId(9))));
    }

    #[test]
    fn working_copies_classify_as_in_flight_then_settled() {
        let mut ledger = Ledger::default();
        let idx = push(&mut ledger, 1, "Foo");
        if let Some(v) = ledger.get_mut(idx) {
            v.replacement = Some(NodeId(5));
            v.owned = true;
        }
        assert_eq!(ledger.classify(NodeId(5)), Visitation::InFlight(idx));
        ledger.pop();
        ledger.settle(NodeId(5));
        assert_eq!(ledger.classify(NodeId(5)), Visitation::Settled);
        assert_eq!(ledger.classify(NodeId(1)), Visitation::Fresh);
        ledger.reset();
        assert_eq!(ledger.classify(NodeId(5)), Visitation::Fresh);
    }

    #[test]
    fn bump_all_reaches_every_active_visit() {
        let mut ledger = Ledger::default();
        push(&mut ledger, 1, "A");
        push(&mut ledger, 2, "B");
        ledger.bump_all();
        ledger.bump_all();
        assert_eq!(ledger.get(0).map(|v| v.changes), Some(2));
        assert_eq!(ledger.get(1).map(|v| v.changes), Some(2));
    }

    #[test]
    fn find_live_matches_replacements() {
        let mut ledger = Ledger::default();
        let idx = push(&mut ledger, 1, "A");
        if let Some(v) = ledger.get_mut(idx) {
            v.replacement = Some(NodeId(7));
        }
        assert_eq!(ledger.find_live(NodeId(7)), Some(idx));
        assert_eq!(ledger.find_live(NodeId(8)), None);
    }

    #[test]
    fn path_and_reset() {
        let mut ledger = Ledger::default();
        push(&mut ledger, 1, "OBJECT");
        push(&mut ledger, 4, "STRING");
        assert_eq!(ledger.path(), "OBJECT#1 > STRING#4");
        ledger.persist(NodeId(4), None);
        let drained = ledger.reset();
        assert_eq!(drained.len(), 2);
        assert_eq!(ledger.depth(), 0);
        assert_eq!(ledger.persisted_len(), 0);
    }

    #[test]
    fn outcome_follows_change_counter() {
        let mut visit = Visit {
            original: NodeId(1),
            replacement: Some(NodeId(2)),
            ..Visit::default()
        };
        assert_eq!(visit.outcome(), Some(NodeId(1)));
        visit.changes = 1;
        assert_eq!(visit.outcome(), Some(NodeId(2)));
        visit.removed = true;
        assert_eq!(visit.outcome(), None);
        visit.recycle();
        assert_eq!(visit.outcome(), Some(NodeId(0)));
    }
}
