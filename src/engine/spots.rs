//! Scoring of live-spot pseudo-QSOs outside a full sectioning pass.

use std::collections::BTreeMap;

use crate::{config::Settings, operation::Operation, qso::Qso};

use super::{
    dupes::LogView,
    errors::{isolate, ErrorSink},
    lookup::LookupSource,
    registry::ResolvedHandler,
    score::{Contribution, Score},
    traits::ScoringInput,
};

/// Borrowed state a spot is classified against.
pub struct SpotContext<'a> {
    /// The current log.
    pub log: &'a LogView<'a>,
    /// Operation in force now.
    pub operation: &'a Operation,
    /// Settings in force now.
    pub settings: &'a Settings,
    /// Handlers resolved for `operation`.
    pub resolved: &'a [ResolvedHandler],
    /// Current per-key scores, typically the last section's.
    pub scores: &'a BTreeMap<String, Score>,
    /// Decoration source.
    pub lookup: &'a dyn LookupSource,
    /// Where handler failures go.
    pub errors: &'a dyn ErrorSink,
}

/// What each resolved handler would say if `spot` were worked now.
///
/// `spot` must carry its `SpotInfo`; its id is never matched against the
/// log. Nothing is accumulated, and a failing handler is reported to
/// `ctx.errors` and left out.
pub fn classify_spot(spot: &Qso, ctx: &SpotContext<'_>) -> BTreeMap<String, Contribution> {
    let empty = Score::default();
    let mut out = BTreeMap::new();
    for rh in ctx.resolved {
        let Some(scorer) = rh.handler.scorer() else {
            continue;
        };
        let key = rh.score_key();
        let input = ScoringInput {
            qso: spot,
            log: ctx.log,
            operation: ctx.operation,
            reference: &rh.reference,
            score: ctx.scores.get(key).unwrap_or(&empty),
            settings: ctx.settings,
            lookup: ctx.lookup,
        };
        let scored = isolate(ctx.errors, key, None, "spot scoring", || scorer.score_qso(&input));
        if let Some(contribution) = scored {
            out.insert(key.to_string(), contribution);
        }
    }
    out
}
