// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Untouched graphs come back as the very same nodes.

#![allow(missing_docs)]

mod common;

use common::{foos, reduce_live, reduce_with_receipt};
use typeforge_dry_tests::{
    build_tree, cyclic_pair, reducer_with, self_loop, shared_child, traversal_spec, walker,
};
use typeforge_reducer::{NodeStore, ReducerBuilder};

#[test]
fn empty_pipeline_returns_the_input_root() {
    let mut store = NodeStore::new();
    let ids = build_tree(&mut store, &[1, 2, 3, 4, 5, 6, 7], 2);
    let (a, _) = cyclic_pair(&mut store);
    let before = store.len();

    let mut reducer = ReducerBuilder::new("kind").build(None);
    assert_eq!(reduce_live(&mut reducer, &mut store, ids[0]), ids[0]);
    assert_eq!(reduce_live(&mut reducer, &mut store, a), a);
    assert_eq!(store.len(), before);
}

#[test]
fn unchanged_traversal_allocates_nothing() {
    let mut store = NodeStore::new();
    let ids = build_tree(&mut store, &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9], 3);
    let before = store.len();

    let mut reducer = reducer_with([traversal_spec()]);
    let (out, receipt) = reduce_with_receipt(&mut reducer, &mut store, ids[0]);

    assert_eq!(out, ids[0]);
    assert!(receipt.is_pristine());
    assert_eq!(receipt.visits(), ids.len() as u64);
    assert_eq!(receipt.writes(), 0);
    assert_eq!(store.len(), before);
}

#[test]
fn shared_children_stay_shared() {
    let mut store = NodeStore::new();
    let (root, child) = shared_child(&mut store);
    let mut reducer = reducer_with([traversal_spec()]);
    let out = reduce_live(&mut reducer, &mut store, root);
    assert_eq!(out, root);
    assert_eq!(foos(&store, out), vec![child, child]);
}

#[test]
fn immutable_walk_over_cycles_is_identity() {
    let mut store = NodeStore::new();
    let (a, b) = cyclic_pair(&mut store);
    let looped = self_loop(&mut store);
    let before = store.len();

    let mut reducer = walker();
    let (out, receipt) = reduce_with_receipt(&mut reducer, &mut store, a);
    assert_eq!(out, a);
    assert_eq!(foos(&store, b), vec![a]);
    assert_eq!(receipt.cycle_reentries(), 1);
    assert_eq!(reduce_live(&mut reducer, &mut store, looped), looped);
    assert_eq!(store.len(), before);
}
