// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Cycles terminate and converge onto the working copies.

#![allow(missing_docs)]

mod common;

use common::{foos, reduce_live, reduce_with_receipt, x_of};
use typeforge_dry_tests::{
    cyclic_pair, increment_x_spec, reducer_with, self_loop, traversal_spec, FOOS,
};
use typeforge_reducer::{NodeStore, ReduceError, Spec, Value};

#[test]
fn mutual_cycle_closes_over_the_new_nodes() {
    let mut store = NodeStore::new();
    let (a, b) = cyclic_pair(&mut store);
    let mut reducer = reducer_with([increment_x_spec(|_| true), traversal_spec()]);

    let (reduced, receipt) = reduce_with_receipt(&mut reducer, &mut store, a);
    let reduced_b = foos(&store, reduced)[0];

    assert_ne!(reduced, a);
    assert_ne!(reduced_b, b);
    assert_eq!(foos(&store, reduced_b)[0], reduced);
    assert_eq!(x_of(&store, reduced), 2);
    assert_eq!(x_of(&store, reduced_b), 3);
    assert_eq!(receipt.copies(), 2);
    assert_eq!(receipt.cycle_reentries(), 1);

    // The input graph is untouched.
    assert_eq!(foos(&store, a), vec![b]);
    assert_eq!(foos(&store, b), vec![a]);
    assert_eq!(x_of(&store, a), 1);
}

#[test]
fn self_reference_points_at_its_own_copy() {
    let mut store = NodeStore::new();
    let looped = self_loop(&mut store);
    let mut reducer = reducer_with([increment_x_spec(|_| true), traversal_spec()]);

    let reduced = reduce_live(&mut reducer, &mut store, looped);
    assert_ne!(reduced, looped);
    assert_eq!(foos(&store, reduced), vec![reduced]);
    assert_eq!(foos(&store, looped), vec![looped]);
}

#[test]
fn reentry_hands_out_the_working_copy() {
    // A mutable traversal re-entering a cycle gets the in-progress copy, so
    // the back edge is rewired even though no value changed.
    let mut store = NodeStore::new();
    let (a, _) = cyclic_pair(&mut store);
    let mut reducer = reducer_with([traversal_spec()]);

    let reduced = reduce_live(&mut reducer, &mut store, a);
    let reduced_b = foos(&store, reduced)[0];
    assert_eq!(foos(&store, reduced_b), vec![reduced]);
}

#[test]
fn reentry_into_a_removed_node_yields_nothing() {
    let mut store = NodeStore::new();
    let looped = self_loop(&mut store);
    let spec = Spec::new("drop-self").on("Foo", |cx, node| {
        cx.remove(node)?;
        match cx.reduce(node)? {
            None => Ok(()),
            Some(_) => Err(ReduceError::contract("removed node resurfaced")),
        }
    });
    let mut reducer = reducer_with([spec]);
    assert_eq!(reducer.reduce(&mut store, looped), Ok(None));
}

#[test]
fn second_pass_over_a_cycle_reuses_the_working_copies() {
    let mut store = NodeStore::new();
    let (a, b) = cyclic_pair(&mut store);
    let spec = Spec::new("bump-then-walk-twice").on("Foo", |cx, node| {
        cx.put_with(node, "x", |v| Value::Int(v.as_int().unwrap_or(0) + 1))?;
        cx.reduce_children(node, FOOS)?;
        cx.reduce_children(node, FOOS)?;
        Ok(())
    });
    let mut reducer = reducer_with([spec]);

    let (reduced, receipt) = reduce_with_receipt(&mut reducer, &mut store, a);
    let reduced_b = foos(&store, reduced)[0];

    assert_ne!(reduced_b, b);
    assert_eq!(foos(&store, reduced_b)[0], reduced);
    assert_eq!(x_of(&store, reduced), 2);
    assert_eq!(x_of(&store, reduced_b), 3);
    assert_eq!(receipt.visits(), 2);
    assert_eq!(receipt.copies(), 2);
}

#[test]
fn reducing_the_live_copy_is_a_reentry() {
    let mut store = NodeStore::new();
    let (a, _) = cyclic_pair(&mut store);
    let spec = Spec::new("reduce-own-copy").on("Foo", |cx, node| {
        cx.put(node, "x", 10)?;
        let Some(live) = cx.live(node) else {
            return Err(ReduceError::contract("node vanished"));
        };
        if cx.reduce(live)? == Some(live) {
            Ok(())
        } else {
            Err(ReduceError::contract("live copy was reduced afresh"))
        }
    });
    let mut reducer = reducer_with([spec]);

    let (reduced, receipt) = reduce_with_receipt(&mut reducer, &mut store, a);
    assert_eq!(x_of(&store, reduced), 10);
    assert_eq!(receipt.visits(), 1);
    assert_eq!(receipt.copies(), 1);
    assert_eq!(receipt.cycle_reentries(), 1);
}
