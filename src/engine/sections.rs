//! Sectioning engine: folds a QSO log through the resolved handlers.
//!
//! The log is cut into sections on every UTC day change. A `break`/`start`
//! marker keeps the current section open but re-resolves handlers against
//! the patched operation; scores already held for a key survive that.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::{
    config::Settings,
    operation::{context_after_event, settings_after_event, Operation},
    qso::Qso,
    types::{day_start, QsoId, TimestampMs},
};

use super::{
    dupes::LogView,
    errors::{isolate, ErrorSink, TracingErrorSink},
    lookup::{LookupSource, NoLookup},
    registry::{Registry, ResolvedHandler},
    score::{Contribution, Score},
    traits::{AccumulateInput, ScoringInput, SectionInfo, SummarizeInput},
};

/// Inputs to one analysis pass.
pub struct AnalyzeInput<'a> {
    /// Log entries in order.
    pub qsos: &'a [Qso],
    /// Operation the log starts under.
    pub operation: &'a Operation,
    /// User settings.
    pub settings: &'a Settings,
    /// Keep deleted entries in `qsos` and section data.
    pub show_deleted_qsos: bool,
}

/// Contiguous run of the log sharing one UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// Start of the UTC day.
    pub day: TimestampMs,
    /// Member entries in log order.
    pub data: Vec<Qso>,
    /// Real QSOs.
    pub count: usize,
    /// Deleted entries.
    pub deleted: usize,
    /// Event markers.
    pub events: usize,
    /// Summarized score per handler key.
    pub scores: BTreeMap<String, Score>,
}

/// Result of [`SectionEngine::analyze`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Analysis {
    /// Entries visible to the caller.
    pub qsos: Vec<Qso>,
    /// Non-deleted real QSOs.
    pub active_qsos: Vec<Qso>,
    /// Day sections in order.
    pub sections: Vec<Section>,
    /// Each handler's contribution per QSO, keyed by score key.
    pub qso_scores: BTreeMap<QsoId, BTreeMap<String, Contribution>>,
}

struct OpenSection {
    day: TimestampMs,
    data: Vec<Qso>,
    count: usize,
    deleted: usize,
    events: usize,
    scores: BTreeMap<String, Score>,
    members: Vec<(String, ResolvedHandler)>,
    operation: Operation,
}

impl OpenSection {
    fn new(day: TimestampMs, operation: Operation) -> Self {
        Self {
            day,
            data: Vec::new(),
            count: 0,
            deleted: 0,
            events: 0,
            scores: BTreeMap::new(),
            members: Vec::new(),
            operation,
        }
    }
}

struct RunState {
    operation: Operation,
    settings: Settings,
    handlers: Vec<ResolvedHandler>,
    open: Option<OpenSection>,
    sections: Vec<Section>,
    carried: BTreeMap<String, Score>,
    history: BTreeMap<String, Vec<Score>>,
}

/// Runs analysis passes against one registry.
pub struct SectionEngine<'r> {
    registry: &'r Registry,
    lookup: &'r dyn LookupSource,
    errors: &'r dyn ErrorSink,
}

impl<'r> SectionEngine<'r> {
    /// Engine with no decoration data, reporting failures through `tracing`.
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            lookup: &NoLookup,
            errors: &TracingErrorSink,
        }
    }

    /// Uses `lookup` for reference names and entities.
    pub fn with_lookup(mut self, lookup: &'r dyn LookupSource) -> Self {
        self.lookup = lookup;
        self
    }

    /// Sends handler failures to `errors`.
    pub fn with_error_sink(mut self, errors: &'r dyn ErrorSink) -> Self {
        self.errors = errors;
        self
    }

    /// Walks `input.qsos` once and returns sections with summarized scores.
    ///
    /// Deleted and untimed entries never open a section. Those at the head
    /// of the log wait for the first timed entry and join its section.
    pub fn analyze(&self, input: &AnalyzeInput<'_>) -> Analysis {
        let log = LogView::new(input.qsos, input.operation);
        let mut state = RunState {
            operation: input.operation.clone(),
            settings: input.settings.clone(),
            handlers: self.registry.resolve_handlers(input.operation, input.settings),
            open: None,
            sections: Vec::new(),
            carried: BTreeMap::new(),
            history: BTreeMap::new(),
        };
        let mut out = Analysis::default();
        let mut held: Vec<&Qso> = Vec::new();

        for qso in input.qsos {
            if qso.spot.is_some() {
                continue;
            }
            if !qso.deleted || input.show_deleted_qsos {
                out.qsos.push(qso.clone());
            }

            let opening_day = qso.start_at_ms.filter(|_| !qso.deleted).map(day_start);
            if state.open.is_none() {
                let Some(day) = opening_day else {
                    held.push(qso);
                    continue;
                };
                self.open_section(&mut state, day);
                for early in held.drain(..) {
                    self.place(&mut state, early, None, &log, input, &mut out);
                }
            }
            self.place(&mut state, qso, opening_day, &log, input, &mut out);
        }

        if !held.is_empty() {
            let day = held.iter().find_map(|q| q.start_at_ms).map_or(0, day_start);
            self.open_section(&mut state, day);
            for early in held {
                self.place(&mut state, early, None, &log, input, &mut out);
            }
        }

        self.close_section(&mut state, true);
        out.sections = state.sections;
        out
    }

    /// Adds one entry to the open section, opening the next one when `day`
    /// moves on.
    fn place(
        &self,
        state: &mut RunState,
        qso: &Qso,
        day: Option<TimestampMs>,
        log: &LogView<'_>,
        input: &AnalyzeInput<'_>,
        out: &mut Analysis,
    ) {
        if let Some(day) = day {
            if state.open.as_ref().is_none_or(|open| open.day != day) {
                self.open_section(state, day);
            }
        }
        let Some(section) = state.open.as_mut() else {
            return;
        };

        if qso.deleted {
            section.deleted += 1;
            if input.show_deleted_qsos {
                section.data.push(qso.clone());
            }
            return;
        }

        if let Some(event) = &qso.event {
            section.events += 1;
            section.data.push(qso.clone());
            if event.kind.changes_context() {
                let patch = event.operation.as_ref();
                state.operation = context_after_event(input.operation, patch);
                state.settings = settings_after_event(input.settings, patch);
                state.handlers = self
                    .registry
                    .resolve_handlers(&state.operation, &state.settings);
                self.adopt_handlers(state);
            }
            return;
        }

        section.count += 1;
        section.data.push(qso.clone());
        out.active_qsos.push(qso.clone());

        let scored = self.score_qso(state, qso, log);
        if !scored.is_empty() {
            out.qso_scores.insert(qso.id, scored);
        }
    }

    fn open_section(&self, state: &mut RunState, day: TimestampMs) {
        self.close_section(state, false);
        debug!(day, "opening section");
        state.open = Some(OpenSection::new(day, state.operation.clone()));
        self.adopt_handlers(state);
    }

    /// Seeds every currently resolved handler into the open section.
    /// Keys the section already holds keep their score.
    fn adopt_handlers(&self, state: &mut RunState) {
        let Some(open) = state.open.as_mut() else {
            return;
        };
        open.operation = state.operation.clone();

        for rh in &state.handlers {
            let key = rh.score_key().to_string();
            if let Some(acc) = rh.handler.accumulator() {
                if !open.scores.contains_key(&key) {
                    let seed = if acc.carries_over() {
                        state
                            .carried
                            .get(&key)
                            .cloned()
                            .unwrap_or_else(|| acc.empty_score(&rh.reference))
                    } else {
                        acc.empty_score(&rh.reference)
                    };
                    open.scores.insert(key.clone(), seed);
                }
            }
            match open.members.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = rh.clone(),
                None => open.members.push((key, rh.clone())),
            }
        }
    }

    fn score_qso(
        &self,
        state: &mut RunState,
        qso: &Qso,
        log: &LogView<'_>,
    ) -> BTreeMap<String, Contribution> {
        let mut scored = BTreeMap::new();
        let Some(section) = state.open.as_mut() else {
            return scored;
        };

        for rh in &state.handlers {
            let Some(scorer) = rh.handler.scorer() else {
                continue;
            };
            let key = rh.score_key();
            let accumulator = rh.handler.accumulator();
            let current = section
                .scores
                .get(key)
                .cloned()
                .or_else(|| accumulator.map(|a| a.empty_score(&rh.reference)))
                .unwrap_or_default();

            let scoring = ScoringInput {
                qso,
                log,
                operation: &state.operation,
                reference: &rh.reference,
                score: &current,
                settings: &state.settings,
                lookup: self.lookup,
            };
            let Some(contribution) =
                isolate(self.errors, key, Some(qso.id), "scoring", || scorer.score_qso(&scoring))
            else {
                continue;
            };

            if let Some(acc) = accumulator {
                let accumulate = AccumulateInput {
                    contribution: &contribution,
                    score: &current,
                    operation: &state.operation,
                    reference: &rh.reference,
                };
                let next = isolate(self.errors, key, Some(qso.id), "accumulate", || {
                    acc.accumulate(&accumulate)
                });
                if let Some(next) = next {
                    section.scores.insert(key.to_string(), next);
                }
            }
            scored.insert(key.to_string(), contribution);
        }
        scored
    }

    fn close_section(&self, state: &mut RunState, is_final: bool) {
        let Some(open) = state.open.take() else {
            return;
        };
        let info = SectionInfo {
            day: open.day,
            count: open.count,
        };
        let mut scores = BTreeMap::new();

        for (key, rh) in &open.members {
            let Some(raw) = open.scores.get(key) else {
                continue;
            };
            state.carried.insert(key.clone(), raw.undecorated());
            let history = state.history.entry(key.clone()).or_default();
            let all = is_final.then(|| {
                let mut all = history.clone();
                all.push(raw.clone());
                all
            });

            let decorated = match rh.handler.summarizer() {
                Some(summarizer) => {
                    let summarize = SummarizeInput {
                        score: raw,
                        operation: &open.operation,
                        reference: &rh.reference,
                        section: info,
                        all_section_scores: all.as_deref(),
                        settings: &state.settings,
                        lookup: self.lookup,
                    };
                    isolate(self.errors, key, None, "summarize", || {
                        summarizer.summarize(&summarize)
                    })
                    .unwrap_or_else(|| raw.clone())
                }
                None => raw.clone(),
            };
            history.push(decorated.clone());
            scores.insert(key.clone(), decorated);
        }

        debug!(day = open.day, count = open.count, keys = scores.len(), "closing section");
        state.sections.push(Section {
            day: open.day,
            data: open.data,
            count: open.count,
            deleted: open.deleted,
            events: open.events,
            scores,
        });
    }
}

/// Analyzes `input` with a default engine over `registry`.
pub fn analyze_and_section_qsos(registry: &Registry, input: &AnalyzeInput<'_>) -> Analysis {
    SectionEngine::new(registry).analyze(input)
}
