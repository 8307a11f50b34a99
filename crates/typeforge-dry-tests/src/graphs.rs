// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph fixtures.

use typeforge_reducer::{NodeId, NodeRecord, NodeStore, Value};

/// Discriminator field used by every fixture.
pub const KIND: &str = "kind";

/// List field holding child references.
pub const FOOS: &str = "foos";

/// `{ kind: "Foo", x: 10, y: 20, common: "hello" }`.
pub fn foo_record() -> NodeRecord {
    NodeRecord::of_kind(KIND, "Foo")
        .with("x", 10)
        .with("y", 20)
        .with("common", "hello")
}

/// Two `Foo` nodes referencing each other through `foos`. Returns `(a, b)`.
pub fn cyclic_pair(store: &mut NodeStore) -> (NodeId, NodeId) {
    let a = store.insert(NodeRecord::of_kind(KIND, "Foo").with("x", 1));
    let b = store.insert(
        NodeRecord::of_kind(KIND, "Foo")
            .with("x", 2)
            .with(FOOS, vec![a]),
    );
    if let Some(rec) = store.node_mut(a) {
        rec.set(FOOS, vec![b]);
    }
    (a, b)
}

/// A `Foo` whose `foos` list contains itself.
pub fn self_loop(store: &mut NodeStore) -> NodeId {
    let id = store.insert(NodeRecord::of_kind(KIND, "Foo").with("x", 0));
    if let Some(rec) = store.node_mut(id) {
        rec.set(FOOS, vec![id]);
    }
    id
}

/// A root listing the same child twice. Returns `(root, child)`.
pub fn shared_child(store: &mut NodeStore) -> (NodeId, NodeId) {
    let child = store.insert(NodeRecord::of_kind(KIND, "Foo").with("x", 5));
    let root = store.insert(
        NodeRecord::of_kind(KIND, "Foo")
            .with("x", 0)
            .with(FOOS, vec![child, child]),
    );
    (root, child)
}

/// Builds a `Foo` tree in heap layout: node `i` holds `x = xs[i]` and lists
/// nodes `i * fanout + 1 ..= i * fanout + fanout` (those that exist) in
/// `foos`. Returns the ids in the same order as `xs`; the root is first.
///
/// An empty `xs` yields an empty vector.
pub fn build_tree(store: &mut NodeStore, xs: &[i64], fanout: usize) -> Vec<NodeId> {
    let mut ids = vec![NodeId(0); xs.len()];
    for i in (0..xs.len()).rev() {
        let children: Vec<Value> = (1..=fanout)
            .map(|k| i * fanout + k)
            .filter(|&c| c < xs.len())
            .map(|c| Value::Node(ids[c]))
            .collect();
        ids[i] = store.insert(
            NodeRecord::of_kind(KIND, "Foo")
                .with("x", xs[i])
                .with(FOOS, children),
        );
    }
    ids
}
