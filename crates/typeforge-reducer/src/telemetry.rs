// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

// Structured diagnostics for reducer internals.
// Trace-level only; nothing here runs on error paths.

use crate::ident::{NodeId, VisitSeq};
use crate::receipt::ReduceReceipt;

/// A fresh visit was pushed for `node`.
pub(crate) fn visit(node: NodeId, seq: VisitSeq, kind: &str, depth: usize) {
    tracing::trace!(%node, seq = seq.0, kind, depth, "visit");
}

/// A `reduce` call re-entered a node whose reduction is still in flight.
pub(crate) fn cycle_reentry(node: NodeId, placeholder: Option<NodeId>) {
    tracing::trace!(%node, ?placeholder, "cycle re-entry");
}

/// A `reduce` call was answered from the persisted-entries table.
pub(crate) fn persisted_hit(node: NodeId, result: Option<NodeId>) {
    tracing::trace!(%node, ?result, "persisted hit");
}

/// Dispatch for `node` restarts because its discriminator changed.
pub(crate) fn restart(node: NodeId, from: &str, to: &str) {
    tracing::trace!(%node, from, to, "discriminator changed; restarting dispatch");
}

/// Summary event emitted once per successful top-level invocation.
pub(crate) fn summary(receipt: &ReduceReceipt) {
    tracing::debug!(
        invocation = %receipt.invocation(),
        visits = receipt.visits(),
        copies = receipt.copies(),
        writes = receipt.writes(),
        restarts = receipt.restarts(),
        cycle_reentries = receipt.cycle_reentries(),
        persisted_hits = receipt.persisted_hits(),
        removals = receipt.removals(),
        "reduce finished"
    );
}
