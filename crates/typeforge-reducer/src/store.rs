// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Append-only node arena used by reducers and tests.
use std::collections::BTreeMap;

use crate::ident::{NodeId, ReducerId};
use crate::provenance::Provenance;
use crate::record::NodeRecord;
use crate::value::Value;

/// In-memory node arena.
///
/// Records are addressed by [`NodeId`] (their index) and never removed, so a
/// reference held anywhere in the graph stays valid for the life of the store.
/// Reducers only ever *append*: working copies are fresh records, and the
/// records handed in by upstream producers keep their contents.
///
/// Provenance metadata lives in a side table rather than inside records so
/// that attaching it never changes a record's fields (and therefore never
/// disturbs structural equality or digests).
#[derive(Debug, Clone, Default)]
pub struct NodeStore {
    /// Arena of records; the index is the node id.
    pub(crate) nodes: Vec<NodeRecord>,
    /// Provenance plane. Entries exist only for nodes a reducer rewrote.
    pub(crate) provenance: BTreeMap<NodeId, Provenance>,
}

impl NodeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in the arena (including superseded originals).
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no record was ever inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Appends a record and returns its id.
    pub fn insert(&mut self, record: NodeRecord) -> NodeId {
        debug_assert!(
            self.nodes.len() < u32::MAX as usize,
            "node arena exhausted the u32 id space"
        );
        #[allow(clippy::cast_possible_truncation)]
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(record);
        id
    }

    /// Returns a shared reference to a node when it exists.
    pub fn node(&self, id: NodeId) -> Option<&NodeRecord> {
        self.nodes.get(id.index())
    }

    /// Returns a mutable reference to a node when it exists.
    ///
    /// Intended for graph construction (e.g. closing a cycle after both ends
    /// exist). Mutating a node while a reducer is working on it is not
    /// supported.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeRecord> {
        self.nodes.get_mut(id.index())
    }

    /// Returns `true` if `id` addresses a record in this store.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Returns the value of `field` on node `id`.
    pub fn field(&self, id: NodeId, field: &str) -> Option<&Value> {
        self.node(id).and_then(|n| n.get(field))
    }

    /// Iterate over all nodes (id, record) in id order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = (NodeId, &NodeRecord)> {
        self.nodes.iter().enumerate().map(|(i, rec)| {
            #[allow(clippy::cast_possible_truncation)]
            let id = NodeId(i as u32);
            (id, rec)
        })
    }

    /// Shallow-clones node `id` into a fresh record and returns the new id.
    ///
    /// Returns `None` if `id` does not exist.
    pub fn clone_node(&mut self, id: NodeId) -> Option<NodeId> {
        let record = self.node(id)?.clone();
        Some(self.insert(record))
    }

    /// Returns the provenance metadata attached to `id`, if any.
    pub fn provenance(&self, id: NodeId) -> Option<&Provenance> {
        self.provenance.get(&id)
    }

    /// Identity counter value assigned when `id` was produced by a rewrite.
    pub fn tracked_id(&self, id: NodeId) -> Option<u64> {
        self.provenance(id).map(|p| p.id)
    }

    /// Number of successive rewrites that produced `id`.
    pub fn tracked_generation(&self, id: NodeId) -> Option<u32> {
        self.provenance(id).map(|p| p.generation)
    }

    /// Reducer invocations recorded on `id` (oldest first). Empty when untracked.
    pub fn tracked_reducers(&self, id: NodeId) -> &[ReducerId] {
        self.provenance(id).map_or(&[], |p| p.reducers.as_slice())
    }

    pub(crate) fn set_provenance(&mut self, id: NodeId, provenance: Provenance) {
        self.provenance.insert(id, provenance);
    }
}
