// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! typeforge-reducer: copy-on-write rewriting engine for schema type graphs.
//!
//! Every rewrite pass of the generator (type simplification, generics
//! resolution, interface alignment, AST lowering) is a [`Reducer`] built from
//! an ordered pipeline of [`Spec`]s. A reduction walks a possibly cyclic,
//! reference-sharing graph held in a [`NodeStore`] and returns a new root:
//!
//! - untouched subtrees keep their identity (same [`NodeId`]),
//! - every changed node is cloned exactly once into a working copy,
//! - cycles terminate and are rewired onto the working copies,
//! - optional provenance records which invocation produced each new node.
//!
//! ```
//! use typeforge_reducer::{NodeRecord, NodeStore, ReducerBuilder, Spec, Value};
//!
//! let mut store = NodeStore::new();
//! let root = store.insert(NodeRecord::of_kind("kind", "Foo").with("common", "hello"));
//!
//! let spec = Spec::new("bye").on("Foo", |cx, node| cx.put(node, "common", "bye"));
//! let mut reducer = ReducerBuilder::new("kind").build(Some(spec));
//!
//! let out = reducer.reduce(&mut store, root).ok().flatten();
//! assert!(out.is_some_and(|id| id != root));
//! assert_eq!(store.field(root, "common"), Some(&Value::from("hello")));
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod builder;
mod context;
mod digest;
mod engine_impl;
mod ident;
mod ledger;
mod pool;
mod provenance;
mod receipt;
mod record;
mod spec;
mod store;
mod telemetry;
mod value;
mod working_copy;

pub use builder::{ReducerBuilder, ReducerOptions};
pub use context::ReduceContext;
pub use digest::{short_hex, structural_digest};
pub use engine_impl::{require_defined, ReduceError, Reducer, MAX_RESTARTS};
pub use ident::{Hash, NodeId, ReducerId};
pub use pool::{PoolStats, Recycle, SlotPool, DEFAULT_POOL_CAPACITY};
pub use provenance::{Provenance, TrackMode, TrackingStats};
pub use receipt::ReduceReceipt;
pub use record::NodeRecord;
pub use spec::{Handler, Spec};
pub use store::NodeStore;
pub use value::Value;
