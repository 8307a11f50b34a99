// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canonical structural digest of a reachable graph.
//!
//! Nodes are numbered in breadth-first discovery order starting at `root`
//! (field order, then list/map element order), and references are hashed as
//! those numbers rather than arena ids. Two graphs with the same shape, the
//! same values, and the same sharing/cycle structure therefore hash equal no
//! matter where their records live in the store.
//!
//! Encoding (BLAKE3, little-endian lengths):
//! - `node_count: u64`
//! - per node in discovery order: `field_count: u64`, then per field (sorted by
//!   name) `name_len: u64`, `name`, encoded value
//! - values: one tag byte, then the payload (`f64` as raw bits; node refs as
//!   the `u64` discovery index; lists/maps length-prefixed)

use std::collections::VecDeque;

use blake3::Hasher;
use rustc_hash::FxHashMap;

use crate::engine_impl::ReduceError;
use crate::ident::{Hash, NodeId};
use crate::store::NodeStore;
use crate::value::Value;

const TAG_NULL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_FLOAT: u8 = 3;
const TAG_STR: u8 = 4;
const TAG_NODE: u8 = 5;
const TAG_LIST: u8 = 6;
const TAG_MAP: u8 = 7;

/// Computes the canonical digest of everything reachable from `root`.
///
/// # Errors
/// [`ReduceError::UnknownNode`] when a reachable reference is dangling.
pub fn structural_digest(store: &NodeStore, root: NodeId) -> Result<Hash, ReduceError> {
    let mut order: FxHashMap<NodeId, u64> = FxHashMap::default();
    let mut queue = VecDeque::new();
    order.insert(root, 0);
    queue.push_back(root);

    // Node bodies are hashed in discovery order; the count goes in front.
    let mut body = Hasher::new();
    while let Some(id) = queue.pop_front() {
        let record = store.node(id).ok_or(ReduceError::UnknownNode(id))?;
        body.update(&(record.fields.len() as u64).to_le_bytes());
        for (name, value) in &record.fields {
            write_bytes(&mut body, name.as_bytes());
            write_value(&mut body, value, &mut |target| {
                let next = order.len() as u64;
                *order.entry(target).or_insert_with(|| {
                    queue.push_back(target);
                    next
                })
            });
        }
    }

    let mut hasher = Hasher::new();
    hasher.update(&(order.len() as u64).to_le_bytes());
    hasher.update(body.finalize().as_bytes());
    Ok(*hasher.finalize().as_bytes())
}

/// First eight bytes of a digest as lowercase hex.
#[must_use]
pub fn short_hex(hash: &Hash) -> String {
    hex::encode(&hash[..8])
}

fn write_bytes(h: &mut Hasher, bytes: &[u8]) {
    h.update(&(bytes.len() as u64).to_le_bytes());
    h.update(bytes);
}

fn write_value(h: &mut Hasher, value: &Value, index_of: &mut impl FnMut(NodeId) -> u64) {
    match value {
        Value::Null => {
            h.update(&[TAG_NULL]);
        }
        Value::Bool(b) => {
            h.update(&[TAG_BOOL, u8::from(*b)]);
        }
        Value::Int(i) => {
            h.update(&[TAG_INT]);
            h.update(&i.to_le_bytes());
        }
        Value::Float(f) => {
            h.update(&[TAG_FLOAT]);
            h.update(&f.to_bits().to_le_bytes());
        }
        Value::Str(s) => {
            h.update(&[TAG_STR]);
            write_bytes(h, s.as_bytes());
        }
        Value::Node(id) => {
            h.update(&[TAG_NODE]);
            h.update(&index_of(*id).to_le_bytes());
        }
        Value::List(items) => {
            h.update(&[TAG_LIST]);
            h.update(&(items.len() as u64).to_le_bytes());
            for item in items {
                write_value(h, item, index_of);
            }
        }
        Value::Map(entries) => {
            h.update(&[TAG_MAP]);
            h.update(&(entries.len() as u64).to_le_bytes());
            for (k, v) in entries {
                write_bytes(h, k.as_bytes());
                write_value(h, v, index_of);
            }
        }
    }
}
