// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reducer construction.
//!
//! A [`ReducerBuilder`] is a plain value: cloning one and adding a spec to
//! the clone leaves the original untouched, which is how call sites layer an
//! override on top of a shared base pipeline.

use std::sync::Arc;

use crate::engine_impl::{Reducer, Settings};
use crate::pool::DEFAULT_POOL_CAPACITY;
use crate::provenance::{TrackMode, TrackingStats};
use crate::spec::Spec;

/// Option set accepted by [`ReducerBuilder::options`].
///
/// Every key is optional; [`ReducerOptions::merge`] lets later sets override
/// earlier ones key by key. `tracking_stats` is never serialized.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct ReducerOptions {
    /// Provenance policy. Defaults to [`TrackMode::None`].
    pub track: Option<TrackMode>,
    /// Disable every mutation (walk-only passes).
    pub immutable: Option<bool>,
    /// Capture ledger call chains into provenance.
    pub debug: Option<bool>,
    /// Counter source; a fresh private one when absent.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub tracking_stats: Option<Arc<TrackingStats>>,
}

impl ReducerOptions {
    /// Sets `track`.
    #[must_use]
    pub fn track(mut self, mode: TrackMode) -> Self {
        self.track = Some(mode);
        self
    }

    /// Sets `immutable`.
    #[must_use]
    pub fn immutable(mut self, on: bool) -> Self {
        self.immutable = Some(on);
        self
    }

    /// Sets `debug`.
    #[must_use]
    pub fn debug(mut self, on: bool) -> Self {
        self.debug = Some(on);
        self
    }

    /// Sets the counter source.
    #[must_use]
    pub fn tracking_stats(mut self, stats: Arc<TrackingStats>) -> Self {
        self.tracking_stats = Some(stats);
        self
    }

    /// Overlays `later` on `self`: keys present in `later` win.
    #[must_use]
    pub fn merge(self, later: Self) -> Self {
        Self {
            track: later.track.or(self.track),
            immutable: later.immutable.or(self.immutable),
            debug: later.debug.or(self.debug),
            tracking_stats: later.tracking_stats.or(self.tracking_stats),
        }
    }
}

/// Builder for [`Reducer`].
#[derive(Debug, Clone)]
pub struct ReducerBuilder {
    discriminator: String,
    specs: Vec<Spec>,
    options: ReducerOptions,
    pool_capacity: usize,
}

impl ReducerBuilder {
    /// Starts a builder dispatching on the string field `discriminator`.
    #[must_use]
    pub fn new(discriminator: &str) -> Self {
        Self {
            discriminator: discriminator.to_owned(),
            specs: Vec::new(),
            options: ReducerOptions::default(),
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }

    /// Adds `spec` with the highest priority so far.
    #[must_use]
    pub fn spec(mut self, spec: Spec) -> Self {
        self.specs.insert(0, spec);
        self
    }

    /// Adds `specs`, in their given priority order, ahead of every spec added
    /// so far.
    #[must_use]
    pub fn specs(mut self, specs: impl IntoIterator<Item = Spec>) -> Self {
        let mut front: Vec<Spec> = specs.into_iter().collect();
        front.append(&mut self.specs);
        self.specs = front;
        self
    }

    /// Merges `options` over the options set so far.
    #[must_use]
    pub fn options(mut self, options: ReducerOptions) -> Self {
        self.options = self.options.merge(options);
        self
    }

    /// Maximum number of visit records kept for reuse between invocations.
    #[must_use]
    pub fn pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }

    /// Builds the reducer. `final_spec`, when given, gets the highest
    /// priority.
    #[must_use]
    pub fn build(self, final_spec: Option<Spec>) -> Reducer {
        let Self {
            discriminator,
            mut specs,
            options,
            pool_capacity,
        } = self;
        if let Some(spec) = final_spec {
            specs.insert(0, spec);
        }
        let settings = Settings {
            discriminator,
            track: options.track.unwrap_or_default(),
            immutable: options.immutable.unwrap_or(false),
            debug: options.debug.unwrap_or(false),
            stats: options
                .tracking_stats
                .unwrap_or_else(|| Arc::new(TrackingStats::new())),
        };
        Reducer::new(settings, specs, pool_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_specs_take_priority() {
        let base = ReducerBuilder::new("kind")
            .spec(Spec::new("base"))
            .spec(Spec::new("override"));
        let layered = base
            .clone()
            .specs([Spec::new("a"), Spec::new("b")])
            .build(Some(Spec::new("final")));
        assert_eq!(
            layered.spec_names(),
            vec!["final", "a", "b", "override", "base"]
        );
        assert_eq!(base.build(None).spec_names(), vec!["override", "base"]);
    }

    #[test]
    fn options_merge_key_by_key() {
        let stats = Arc::new(TrackingStats::starting_at(7));
        let reducer = ReducerBuilder::new("kind")
            .options(
                ReducerOptions::default()
                    .track(TrackMode::Last)
                    .debug(true)
                    .tracking_stats(Arc::clone(&stats)),
            )
            .options(ReducerOptions::default().track(TrackMode::Multiple))
            .build(None);
        assert_eq!(reducer.track_mode(), TrackMode::Multiple);
        assert!(reducer.is_debug());
        assert!(!reducer.is_immutable());
        assert!(Arc::ptr_eq(reducer.tracking_stats(), &stats));
    }

    #[test]
    fn default_stats_are_private_per_reducer() {
        let a = ReducerBuilder::new("kind").build(None);
        let b = ReducerBuilder::new("kind").build(None);
        assert!(!Arc::ptr_eq(a.tracking_stats(), b.tracking_stats()));
        assert_eq!(a.discriminator(), "kind");
    }
}
