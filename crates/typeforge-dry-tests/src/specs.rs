// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Synthetic specs for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use typeforge_reducer::{NodeRecord, Spec, Value};

use crate::graphs::{FOOS, KIND};

/// Shared call counter that handlers can bump.
#[derive(Debug, Clone, Default)]
pub struct HitCounter(Arc<AtomicUsize>);

impl HitCounter {
    /// Records one hit.
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Hits so far.
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}

/// Catch-all traversal: reduces `foos` and the single reference `child`,
/// writing results back.
pub fn traversal_spec() -> Spec {
    Spec::new("traverse").otherwise(|cx, node| {
        cx.reduce_children(node, FOOS)?;
        cx.reduce_field(node, "child")?;
        Ok(())
    })
}

/// Adds one to `x` of every `Foo` whose current `x` satisfies `pred`, then
/// defers to the next spec (usually [`traversal_spec`]).
pub fn increment_x_spec(pred: fn(i64) -> bool) -> Spec {
    Spec::new("increment-x").on("Foo", move |cx, node| {
        cx.put_with(node, "x", |v| match v.as_int() {
            Some(x) if pred(x) => Value::Int(x + 1),
            _ => v.clone(),
        })?;
        cx.call_base(node)
    })
}

/// Sets `common` to `"bye"` on every `Foo`.
pub fn bye_spec() -> Spec {
    Spec::new("bye").on("Foo", |cx, node| cx.put(node, "common", "bye"))
}

/// Replaces `OBJECT` nodes with a fresh `FLOAT` record.
///
/// `float_hits` counts `FLOAT` handler runs and `property_hits` counts
/// `PROPERTY` handler runs. After a replace, the `OBJECT` handler defers to
/// the next spec; since the discriminator changed, that deferral runs
/// nothing.
pub fn object_to_float_spec(float_hits: &HitCounter, property_hits: &HitCounter) -> Spec {
    let floats = float_hits.clone();
    let properties = property_hits.clone();
    Spec::new("object-to-float")
        .on("OBJECT", |cx, node| {
            cx.replace_with(node, NodeRecord::of_kind(KIND, "FLOAT").with("precision", 64))?;
            cx.call_base(node)
        })
        .on("FLOAT", move |cx, node| {
            floats.hit();
            cx.put(node, "visited", true)
        })
        .on("PROPERTY", move |_, _| {
            properties.hit();
            Ok(())
        })
}

/// Swaps `A` and `B` forever; never converges.
pub fn flip_flop_spec() -> Spec {
    Spec::new("flip-flop")
        .on("A", |cx, node| cx.put(node, KIND, "B"))
        .on("B", |cx, node| cx.put(node, KIND, "A"))
}
