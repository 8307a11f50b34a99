// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Rewrite specs: discriminator-keyed handler tables.
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::context::ReduceContext;
use crate::engine_impl::ReduceError;
use crate::ident::NodeId;

/// Handler invoked for a node whose discriminator matched.
///
/// Parameters:
/// - `&mut ReduceContext`: controller exposing reads, `put`/`replace`/`remove`,
///   `persist`, `reduce` (recurse into a child), and `yield_base`/`call_base`.
/// - `NodeId`: the *original* node being reduced. Reads through the context
///   resolve to its live working copy.
///
/// Handlers are reference counted so a spec can be cloned into several
/// pipelines without copying closures.
pub type Handler =
    Arc<dyn Fn(&mut ReduceContext<'_>, NodeId) -> Result<(), ReduceError> + Send + Sync>;

/// One layer of a dispatch pipeline.
///
/// Maps discriminator values to handlers, plus an optional catch-all that
/// applies to every discriminator without a specific entry.
#[derive(Clone)]
pub struct Spec {
    name: Arc<str>,
    handlers: BTreeMap<String, Handler>,
    fallback: Option<Handler>,
}

impl core::fmt::Debug for Spec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Spec")
            .field("name", &self.name)
            .field("kinds", &self.handlers.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl Spec {
    /// Creates an empty spec. `name` is used in diagnostics only.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            handlers: BTreeMap::new(),
            fallback: None,
        }
    }

    /// Registers `handler` for nodes whose discriminator equals `kind`.
    ///
    /// A later registration for the same `kind` replaces the earlier one.
    #[must_use]
    pub fn on<F>(mut self, kind: &str, handler: F) -> Self
    where
        F: Fn(&mut ReduceContext<'_>, NodeId) -> Result<(), ReduceError> + Send + Sync + 'static,
    {
        self.handlers.insert(kind.to_owned(), Arc::new(handler));
        self
    }

    /// Registers the catch-all handler.
    #[must_use]
    pub fn otherwise<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut ReduceContext<'_>, NodeId) -> Result<(), ReduceError> + Send + Sync + 'static,
    {
        self.fallback = Some(Arc::new(handler));
        self
    }

    /// Diagnostic name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handler applicable to `kind`: the specific entry, else the catch-all.
    #[must_use]
    pub fn handler_for(&self, kind: &str) -> Option<&Handler> {
        self.handlers.get(kind).or(self.fallback.as_ref())
    }

    /// Returns `true` if this spec would handle `kind`.
    #[must_use]
    pub fn handles(&self, kind: &str) -> bool {
        self.handler_for(kind).is_some()
    }
}

/// Finds the first spec at or after `start` that handles `kind`.
pub(crate) fn find_handler<'s>(
    specs: &'s [Spec],
    start: usize,
    kind: &str,
) -> Option<(usize, &'s Handler)> {
    specs
        .iter()
        .enumerate()
        .skip(start)
        .find_map(|(pos, spec)| spec.handler_for(kind).map(|h| (pos, h)))
}
