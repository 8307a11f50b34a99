// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Field values carried by node records.
//!
//! A [`Value`] is plain data with one exception: [`Value::Node`] is a reference
//! *by identity* to another record in the same [`crate::NodeStore`]. Change
//! detection in the working-copy manager relies on [`Value::same_as`], which is
//! structural for data and identity-based for references.

use std::collections::BTreeMap;

use crate::ident::NodeId;

/// A single field value.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Absent/empty value.
    #[default]
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// UTF-8 string.
    Str(String),
    /// Reference to another node by identity.
    Node(NodeId),
    /// Ordered collection.
    List(Vec<Value>),
    /// Keyed collection with deterministic iteration order.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Deep structural equality.
    ///
    /// Recurses into [`Value::List`] and [`Value::Map`]; node references are
    /// equal only when they point at the same id. Floats compare by total
    /// order, so a `NaN` is equal to an identical `NaN` and `0.0` differs from
    /// `-0.0`.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b).is_eq(),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Node(a), Self::Node(b)) => a == b,
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_as(y))
            }
            (Self::Map(a), Self::Map(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.same_as(vb))
            }
            _ => false,
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the referenced node, if this is a [`Value::Node`].
    #[must_use]
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Self::Node(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the string slice, if this is a [`Value::Str`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer, if this is a [`Value::Int`].
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the boolean, if this is a [`Value::Bool`].
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the elements, if this is a [`Value::List`].
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Collects the node references held directly by a list value.
    ///
    /// Non-reference elements are skipped. Returns an empty vector for
    /// anything that is not a list.
    #[must_use]
    pub fn node_refs(&self) -> Vec<NodeId> {
        self.as_list()
            .map(|items| items.iter().filter_map(Self::as_node).collect())
            .unwrap_or_default()
    }

    /// Visits every node reference reachable inside this value, in order.
    pub(crate) fn for_each_ref(&self, f: &mut impl FnMut(NodeId)) {
        match self {
            Self::Node(id) => f(*id),
            Self::List(items) => items.iter().for_each(|v| v.for_each_ref(f)),
            Self::Map(entries) => entries.values().for_each(|v| v.for_each_ref(f)),
            _ => {}
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

// `same_as` compares floats by total order, so equality is reflexive.
impl Eq for Value {}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<NodeId> for Value {
    fn from(v: NodeId) -> Self {
        Self::Node(v)
    }
}

impl From<Option<NodeId>> for Value {
    fn from(v: Option<NodeId>) -> Self {
        v.map_or(Self::Null, Self::Node)
    }
}

impl From<Vec<NodeId>> for Value {
    fn from(v: Vec<NodeId>) -> Self {
        Self::List(v.into_iter().map(Self::Node).collect())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Self::Map(v)
    }
}
