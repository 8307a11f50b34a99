// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Copy-on-write mutation of in-flight nodes.
//!
//! Originals are never written. The first effective write to a node clones
//! it into a working copy owned by its visit; every later write for the same
//! visit lands on that copy. Writes that would not change a value are
//! dropped before any clone happens, which is what keeps untouched subtrees
//! identical to their input.
//!
//! Every effective mutation bumps the change counter of every visit on the
//! active chain, so ancestors learn that "something beneath me changed"
//! without inspecting their fields.

use crate::context::ReduceContext;
use crate::engine_impl::ReduceError;
use crate::ident::NodeId;
use crate::record::NodeRecord;
use crate::value::Value;

impl ReduceContext<'_> {
    /// Sets `field` of `node` to `value`.
    ///
    /// A no-op when the live value is already structurally equal (an absent
    /// field counts as `Null`), and always a no-op in immutable mode.
    ///
    /// # Errors
    /// [`ReduceError::NotInFlight`] if `node` is not being reduced,
    /// [`ReduceError::WriteAfterRemove`] if it was removed.
    pub fn put(
        &mut self,
        node: NodeId,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<(), ReduceError> {
        let value = value.into();
        self.put_with(node, field, move |_| value)
    }

    /// Sets `field` of `node` to `compute(current)`.
    ///
    /// `current` is the live value (`Null` when absent). Same no-op rules as
    /// [`Self::put`].
    ///
    /// # Errors
    /// Same as [`Self::put`].
    pub fn put_with<F>(&mut self, node: NodeId, field: &str, compute: F) -> Result<(), ReduceError>
    where
        F: FnOnce(&Value) -> Value,
    {
        if self.settings.immutable {
            return Ok(());
        }
        let idx = self.writable(node)?;
        let live = self
            .visit(idx)?
            .live()
            .ok_or(ReduceError::WriteAfterRemove(node))?;
        let null = Value::Null;
        let current = self.store.field(live, field).unwrap_or(&null);
        let next = compute(current);
        if current.same_as(&next) {
            return Ok(());
        }

        let copy = self.ensure_working_copy(idx)?;
        let record = self
            .store
            .node_mut(copy)
            .ok_or(ReduceError::UnknownNode(copy))?;
        record.set(field, next);
        self.ledger.bump_all();
        self.receipt.writes += 1;
        Ok(())
    }

    /// Installs the existing node `with` as `node`'s replacement.
    ///
    /// The replacement is not owned by the visit: a later `put` clones it
    /// before writing, so shared nodes are never modified in place. If the
    /// replacement carries a different discriminator, dispatch restarts from
    /// the first spec once the current handler returns.
    ///
    /// `with` must not be in flight on behalf of another visit: a node can be
    /// the live instance of only one reduction at a time.
    ///
    /// # Errors
    /// Same as [`Self::put`], plus [`ReduceError::UnknownNode`] for `with` and
    /// [`ReduceError::Contract`] when `with` is being reduced by another frame.
    pub fn replace(&mut self, node: NodeId, with: NodeId) -> Result<(), ReduceError> {
        if self.settings.immutable {
            return Ok(());
        }
        let idx = self.writable(node)?;
        if !self.store.contains(with) {
            return Err(ReduceError::UnknownNode(with));
        }
        if self.ledger.find_live(with).is_some_and(|owner| owner != idx) {
            return Err(ReduceError::contract(format!(
                "{with} is in flight and cannot replace {node}"
            )));
        }
        let visit = self.visit_mut(idx)?;
        if visit.live() == Some(with) {
            return Ok(());
        }
        visit.replacement = Some(with);
        visit.owned = false;
        self.ledger.bump_all();
        self.receipt.writes += 1;
        Ok(())
    }

    /// Allocates `record` and installs it as `node`'s owned replacement.
    ///
    /// Returns the new node's id.
    ///
    /// # Errors
    /// Same as [`Self::put`].
    pub fn replace_with(&mut self, node: NodeId, record: NodeRecord) -> Result<NodeId, ReduceError> {
        if self.settings.immutable {
            return Ok(node);
        }
        let idx = self.writable(node)?;
        let fresh = self.store.insert(record);
        let visit = self.visit_mut(idx)?;
        visit.replacement = Some(fresh);
        visit.owned = true;
        self.ledger.bump_all();
        self.receipt.copies += 1;
        self.receipt.writes += 1;
        Ok(fresh)
    }

    /// Tombstones `node`: its reduction result becomes `None`.
    ///
    /// Removing twice is a no-op.
    ///
    /// # Errors
    /// [`ReduceError::NotInFlight`] if `node` is not being reduced.
    pub fn remove(&mut self, node: NodeId) -> Result<(), ReduceError> {
        if self.settings.immutable {
            return Ok(());
        }
        let idx = self.in_flight(node)?;
        let visit = self.visit_mut(idx)?;
        if visit.removed {
            return Ok(());
        }
        visit.removed = true;
        self.ledger.bump_all();
        self.receipt.removals += 1;
        Ok(())
    }

    /// Memoizes `node`'s final result for the rest of this invocation.
    ///
    /// Later `reduce` calls for the same original return the memoized result
    /// without dispatching. Allowed in immutable mode.
    ///
    /// # Errors
    /// [`ReduceError::NotInFlight`] if `node` is not being reduced.
    pub fn persist(&mut self, node: NodeId) -> Result<(), ReduceError> {
        let idx = self.in_flight(node)?;
        self.visit_mut(idx)?.persist = true;
        Ok(())
    }

    /// Reduces the single reference in `field` and writes the result back.
    ///
    /// A removed child is stored as `Null`. Returns the reduced child, or
    /// `None` when the field held no reference or the child was removed.
    ///
    /// # Errors
    /// Anything raised while reducing the child or writing it back.
    pub fn reduce_field(&mut self, node: NodeId, field: &str) -> Result<Option<NodeId>, ReduceError> {
        let Some(child) = self.node_ref(node, field) else {
            return Ok(None);
        };
        let reduced = self.reduce(child)?;
        self.put(node, field, reduced)?;
        Ok(reduced)
    }

    /// Reduces every reference in the list `field` and writes the list back.
    ///
    /// Removed children are dropped from the list; non-reference elements are
    /// kept in place. Returns the surviving reduced children in order.
    ///
    /// # Errors
    /// Anything raised while reducing a child or writing the list back.
    pub fn reduce_children(&mut self, node: NodeId, field: &str) -> Result<Vec<NodeId>, ReduceError> {
        let Some(items) = self.get(node, field).and_then(Value::as_list) else {
            return Ok(Vec::new());
        };
        let items = items.to_vec();
        let mut kept = Vec::with_capacity(items.len());
        let mut survivors = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::Node(child) => {
                    if let Some(reduced) = self.reduce(child)? {
                        kept.push(Value::Node(reduced));
                        survivors.push(reduced);
                    }
                }
                other => kept.push(other),
            }
        }
        self.put(node, field, kept)?;
        Ok(survivors)
    }

    fn in_flight(&self, node: NodeId) -> Result<usize, ReduceError> {
        self.ledger
            .find_live(node)
            .ok_or(ReduceError::NotInFlight(node))
    }

    fn writable(&self, node: NodeId) -> Result<usize, ReduceError> {
        let idx = self.in_flight(node)?;
        if self.visit(idx)?.removed {
            return Err(ReduceError::WriteAfterRemove(node));
        }
        Ok(idx)
    }
}
