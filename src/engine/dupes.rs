//! Near-dupe filtering against the section context of each earlier QSO.
//!
//! Award eligibility is judged against the operation context that was in
//! force when the earlier QSO was logged. A `break`/`start` marker can move
//! the operator to new references mid-log, so [`LogView`] records the
//! context of every entry in one pass.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{
    core::indices::{call_key, PosIndex},
    operation::{context_after_event, Operation},
    qso::{Qso, Reference},
    refs::contains_all_refs,
    types::QsoId,
};

/// How an earlier QSO's timestamp is compared with the target's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeComparison {
    /// Earlier only.
    #[default]
    Strict,
    /// Earlier or equal.
    Inclusive,
}

impl TimeComparison {
    /// `same_time_earlier` decides ties under `Inclusive`: an equal
    /// timestamp only counts when the candidate sits earlier in the log.
    fn is_before(&self, candidate: Option<u64>, target: u64, same_time_earlier: bool) -> bool {
        match (self, candidate) {
            (_, None) => false,
            (Self::Strict, Some(t)) => t < target,
            (Self::Inclusive, Some(t)) => t < target || (t == target && same_time_earlier),
        }
    }
}

/// Options narrowing a near-dupe search.
#[derive(Default)]
pub struct NearDupeOptions<'r> {
    /// References the candidate's own section context must include.
    pub with_section_refs: &'r [Reference],
    /// Timestamp comparison.
    pub time_comparison: TimeComparison,
    /// Extra predicate applied last.
    pub extra: Option<&'r dyn Fn(&Qso) -> bool>,
}

/// Read-only view of a log with per-entry operation context and a
/// by-callsign index.
pub struct LogView<'a> {
    qsos: &'a [Qso],
    contexts: Vec<Operation>,
    context_at: Vec<usize>,
    by_call: PosIndex<String>,
    pos: HashMap<QsoId, usize>,
}

impl<'a> LogView<'a> {
    /// Walks `qsos` once, starting from `operation`.
    pub fn new(qsos: &'a [Qso], operation: &Operation) -> Self {
        let mut contexts = vec![operation.clone()];
        let mut context_at = Vec::with_capacity(qsos.len());
        let mut by_call: PosIndex<String> = PosIndex::new();
        let mut pos = HashMap::with_capacity(qsos.len());

        for (idx, qso) in qsos.iter().enumerate() {
            if let Some(event) = qso.context_event() {
                contexts.push(context_after_event(operation, event.operation.as_ref()));
            }
            context_at.push(contexts.len() - 1);
            if qso.spot.is_none() {
                pos.insert(qso.id, idx);
            }
            if qso.is_contact() && !qso.their.call.is_empty() {
                by_call.entry(call_key(&qso.their.call)).or_default().push(idx);
            }
        }

        Self {
            qsos,
            contexts,
            context_at,
            by_call,
            pos,
        }
    }

    /// Underlying entries.
    pub fn qsos(&self) -> &'a [Qso] {
        self.qsos
    }

    /// Operation context at position `idx`, or the base one when out of range.
    pub fn context_at(&self, idx: usize) -> &Operation {
        let ctx = self.context_at.get(idx).copied().unwrap_or(0);
        &self.contexts[ctx]
    }

    /// Operation context in force for `qso`, if it is part of this log.
    pub fn context_of(&self, qso: &Qso) -> Option<&Operation> {
        self.position_of(qso).map(|idx| self.context_at(idx))
    }

    /// Spot ids come from the feed, so a spot is never matched by id.
    fn position_of(&self, qso: &Qso) -> Option<usize> {
        if qso.spot.is_some() {
            return None;
        }
        self.pos.get(&qso.id).copied()
    }

    /// Contacts with `call`, in log order, with their positions.
    pub fn same_call(&self, call: &str) -> impl Iterator<Item = (usize, &'a Qso)> + '_ {
        let qsos = self.qsos;
        self.by_call
            .get(&call_key(call))
            .into_iter()
            .flat_map(|ids| ids.iter())
            .map(move |idx| (*idx, &qsos[*idx]))
    }

    /// Earlier contacts with the same station that may be duplicates of `qso`.
    ///
    /// Returns them in log order; an empty result means `qso` is not a dupe.
    pub fn near_dupes(&self, qso: &Qso, options: &NearDupeOptions<'_>) -> Vec<&'a Qso> {
        let target_pos = self.position_of(qso);
        self.same_call(&qso.their.call)
            .filter(|(idx, q)| !q.deleted && target_pos != Some(*idx))
            .filter(|(idx, q)| match qso.start_at_ms {
                Some(t) => {
                    let earlier = target_pos.is_none_or(|p| *idx < p);
                    options.time_comparison.is_before(q.start_at_ms, t, earlier)
                }
                None => true,
            })
            .filter(|(idx, _)| {
                options.with_section_refs.is_empty()
                    || contains_all_refs(&self.context_at(*idx).refs, options.with_section_refs)
            })
            .filter(|(_, q)| options.extra.is_none_or(|f| f(*q)))
            .map(|(_, q)| q)
            .collect()
    }

    /// Every non-deleted contact whose section context includes `refs`.
    pub fn with_section_refs(&self, refs: &[Reference]) -> Vec<&'a Qso> {
        self.qsos
            .iter()
            .enumerate()
            .filter(|(_, q)| !q.deleted && q.is_contact())
            .filter(|(idx, _)| contains_all_refs(&self.context_at(*idx).refs, refs))
            .map(|(_, q)| q)
            .collect()
    }
}

/// Near-dupes of `qso` within `pool`, which starts under `operation`.
pub fn filter_near_dupes<'a>(
    qso: &Qso,
    pool: &'a [Qso],
    operation: &Operation,
    options: &NearDupeOptions<'_>,
) -> Vec<&'a Qso> {
    LogView::new(pool, operation).near_dupes(qso, options)
}

/// Contacts of `qsos` logged while every reference in `refs` was active.
pub fn filter_qsos_with_section_refs<'a>(
    qsos: &'a [Qso],
    operation: &Operation,
    refs: &[Reference],
) -> Vec<&'a Qso> {
    LogView::new(qsos, operation).with_section_refs(refs)
}
