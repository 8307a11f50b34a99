// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reducer builder shortcuts.

use std::sync::Arc;

use typeforge_reducer::{Reducer, ReducerBuilder, ReducerOptions, Spec, TrackMode, TrackingStats};

use crate::graphs::KIND;
use crate::specs::traversal_spec;

/// Reducer on [`KIND`] with `specs` in priority order (first wins).
pub fn reducer_with(specs: impl IntoIterator<Item = Spec>) -> Reducer {
    ReducerBuilder::new(KIND).specs(specs).build(None)
}

/// Immutable reducer running only [`traversal_spec`].
pub fn walker() -> Reducer {
    ReducerBuilder::new(KIND)
        .spec(traversal_spec())
        .options(ReducerOptions::default().immutable(true))
        .build(None)
}

/// Reducer with provenance tracking on an explicit counter source.
pub fn tracked_reducer(
    specs: impl IntoIterator<Item = Spec>,
    mode: TrackMode,
    stats: &Arc<TrackingStats>,
    debug: bool,
) -> Reducer {
    ReducerBuilder::new(KIND)
        .specs(specs)
        .options(
            ReducerOptions::default()
                .track(mode)
                .debug(debug)
                .tracking_stats(Arc::clone(stats)),
        )
        .build(None)
}
