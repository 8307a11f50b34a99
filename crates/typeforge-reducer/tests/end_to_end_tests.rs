// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Whole-pass scenarios.

#![allow(missing_docs)]

mod common;

use common::{reduce_live, reduce_with_receipt};
use typeforge_dry_tests::{
    build_tree, bye_spec, cyclic_pair, foo_record, increment_x_spec, reducer_with,
    traversal_spec, walker, KIND,
};
use typeforge_reducer::{structural_digest, NodeStore, Value};

#[test]
fn foo_common_becomes_bye() {
    let mut store = NodeStore::new();
    let root = store.insert(foo_record());
    let mut reducer = reducer_with([bye_spec()]);

    let (out, receipt) = reduce_with_receipt(&mut reducer, &mut store, root);

    assert_ne!(out, root);
    assert_eq!(store.field(out, "common"), Some(&Value::from("bye")));
    assert_eq!(store.field(out, "x"), Some(&Value::Int(10)));
    assert_eq!(store.field(out, "y"), Some(&Value::Int(20)));
    assert_eq!(store.field(out, KIND), Some(&Value::from("Foo")));
    assert_eq!(store.field(root, "common"), Some(&Value::from("hello")));
    assert_eq!(receipt.copies(), 1);
    assert_eq!(receipt.writes(), 1);

    // A second pass over the result has nothing left to do.
    assert_eq!(reduce_live(&mut reducer, &mut store, out), out);
}

#[test]
fn passes_are_deterministic_up_to_arena_placement() {
    let xs = [4, 1, 8, 3, 6, 5, 2, 9, 0];
    let mut store = NodeStore::new();
    let first = build_tree(&mut store, &xs, 3)[0];
    let (cycle_a, _) = cyclic_pair(&mut store);
    let second = build_tree(&mut store, &xs, 3)[0];
    let (cycle_b, _) = cyclic_pair(&mut store);

    let mut reducer = reducer_with([increment_x_spec(|x| x % 3 == 0), traversal_spec()]);
    let out_first = reduce_live(&mut reducer, &mut store, first);
    let out_second = reduce_live(&mut reducer, &mut store, second);
    let out_cycle_a = reduce_live(&mut reducer, &mut store, cycle_a);
    let out_cycle_b = reduce_live(&mut reducer, &mut store, cycle_b);

    assert_ne!(out_first, out_second);
    assert_eq!(
        structural_digest(&store, out_first).expect("digest"),
        structural_digest(&store, out_second).expect("digest")
    );
    assert_eq!(
        structural_digest(&store, out_cycle_a).expect("digest"),
        structural_digest(&store, out_cycle_b).expect("digest")
    );
    assert_ne!(
        structural_digest(&store, first).expect("digest"),
        structural_digest(&store, out_first).expect("digest")
    );
}

#[test]
fn the_same_traversal_serves_walks_and_rewrites() {
    let mut store = NodeStore::new();
    let ids = build_tree(&mut store, &[1, 2, 3], 2);
    let before = structural_digest(&store, ids[0]).expect("digest");

    let mut walk = walker();
    assert_eq!(reduce_live(&mut walk, &mut store, ids[0]), ids[0]);
    assert_eq!(structural_digest(&store, ids[0]).expect("digest"), before);
    assert!(walk.is_immutable());
}
