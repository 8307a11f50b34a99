// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]

use typeforge_dry_tests::FOOS;
use typeforge_reducer::{NodeId, NodeStore, ReduceReceipt, Reducer, Value};

/// Reduces `root` and insists the result survived.
pub fn reduce_live(reducer: &mut Reducer, store: &mut NodeStore, root: NodeId) -> NodeId {
    reducer
        .reduce(store, root)
        .expect("reduce succeeds")
        .expect("root survives")
}

/// Like [`reduce_live`], also returning the receipt.
pub fn reduce_with_receipt(
    reducer: &mut Reducer,
    store: &mut NodeStore,
    root: NodeId,
) -> (NodeId, ReduceReceipt) {
    let (out, receipt) = reducer
        .reduce_with_receipt(store, root)
        .expect("reduce succeeds");
    (out.expect("root survives"), receipt)
}

/// References listed in `foos`.
pub fn foos(store: &NodeStore, id: NodeId) -> Vec<NodeId> {
    store.field(id, FOOS).map(Value::node_refs).unwrap_or_default()
}

/// Integer field `x`.
pub fn x_of(store: &NodeStore, id: NodeId) -> i64 {
    store
        .field(id, "x")
        .and_then(Value::as_int)
        .expect("node has integer x")
}
