// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for Typeforge crates.
#![forbid(unsafe_code)]
//!
//! Keeps graph construction and synthetic rewrite passes out of the engine's
//! integration tests so each test file reads as the property it checks.
//!
//! # Modules
//!
//! - [`graphs`] - Node graphs: foo records, trees, cycles, shared children
//! - [`specs`] - Synthetic specs (traversal, increment, variant switching)
//! - [`reducer`] - Reducer builder shortcuts

pub mod graphs;
pub mod reducer;
pub mod specs;

pub use graphs::{
    build_tree, cyclic_pair, foo_record, self_loop, shared_child, FOOS, KIND,
};
pub use reducer::{reducer_with, tracked_reducer, walker};
pub use specs::{
    bye_spec, flip_flop_spec, increment_x_spec, object_to_float_spec, traversal_spec, HitCounter,
};
