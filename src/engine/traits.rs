use crate::{
    config::Settings,
    operation::Operation,
    qso::{Qso, Reference},
    types::TimestampMs,
};

use super::{
    dupes::LogView,
    errors::HandlerResult,
    lookup::LookupSource,
    score::{Contribution, Score},
};

/// Inputs to [`QsoScorer::score_qso`].
pub struct ScoringInput<'a> {
    /// QSO being scored.
    pub qso: &'a Qso,
    /// Whole log, with per-entry section context.
    pub log: &'a LogView<'a>,
    /// Operation context in force for this QSO.
    pub operation: &'a Operation,
    /// Reference this handler was bound to.
    pub reference: &'a Reference,
    /// Section score before this QSO.
    pub score: &'a Score,
    /// User settings.
    pub settings: &'a Settings,
    /// Decoration data.
    pub lookup: &'a dyn LookupSource,
}

/// Inputs to accumulate calls.
pub struct AccumulateInput<'a> {
    /// What the scorer returned for this QSO.
    pub contribution: &'a Contribution,
    /// Section score before this QSO.
    pub score: &'a Score,
    /// Operation context in force for this QSO.
    pub operation: &'a Operation,
    /// Reference this handler was bound to.
    pub reference: &'a Reference,
}

/// Counters of the section being closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionInfo {
    /// Start of the section's UTC day.
    pub day: TimestampMs,
    /// Real QSOs in the section.
    pub count: usize,
}

/// Inputs to [`Summarizer::summarize`].
pub struct SummarizeInput<'a> {
    /// Undecorated score at section close.
    pub score: &'a Score,
    /// Operation context at section close.
    pub operation: &'a Operation,
    /// Reference this handler was bound to.
    pub reference: &'a Reference,
    /// Section being closed.
    pub section: SectionInfo,
    /// This key's score across every section. Set only on the final call.
    pub all_section_scores: Option<&'a [Score]>,
    /// User settings.
    pub settings: &'a Settings,
    /// Decoration data.
    pub lookup: &'a dyn LookupSource,
}

/// Scores one QSO.
pub trait QsoScorer: Send + Sync {
    /// Returns this handler's contribution for `input.qso`.
    fn score_qso(&self, input: &ScoringInput<'_>) -> HandlerResult<Contribution>;
}

/// Aggregate that resets at every new section.
pub trait DayAccumulator: Send + Sync {
    /// Score a fresh section starts from.
    fn empty_score(&self, _reference: &Reference) -> Score {
        Score::default()
    }

    /// Folds one contribution into the section score.
    fn accumulate_for_day(&self, input: &AccumulateInput<'_>) -> HandlerResult<Score>;
}

/// Aggregate that carries over from the previous section.
pub trait OperationAccumulator: Send + Sync {
    /// Score used when no earlier section holds this key.
    fn empty_score(&self, _reference: &Reference) -> Score {
        Score::default()
    }

    /// Folds one contribution into the running score.
    fn accumulate_for_operation(&self, input: &AccumulateInput<'_>) -> HandlerResult<Score>;
}

/// Which accumulation style a handler uses. This choice is its lifecycle.
#[derive(Clone, Copy)]
pub enum Accumulator<'a> {
    /// Resets per section.
    ForDay(&'a dyn DayAccumulator),
    /// Carries over between sections.
    ForOperation(&'a dyn OperationAccumulator),
}

impl Accumulator<'_> {
    /// Declared empty score.
    pub fn empty_score(&self, reference: &Reference) -> Score {
        match self {
            Self::ForDay(a) => a.empty_score(reference),
            Self::ForOperation(a) => a.empty_score(reference),
        }
    }

    /// Dispatches to the implemented accumulate call.
    pub fn accumulate(&self, input: &AccumulateInput<'_>) -> HandlerResult<Score> {
        match self {
            Self::ForDay(a) => a.accumulate_for_day(input),
            Self::ForOperation(a) => a.accumulate_for_operation(input),
        }
    }

    /// True for carry-over accumulators.
    pub fn carries_over(&self) -> bool {
        matches!(self, Self::ForOperation(_))
    }
}

/// Attaches presentation fields when a section closes.
pub trait Summarizer: Send + Sync {
    /// Returns `input.score` decorated with label and summaries.
    fn summarize(&self, input: &SummarizeInput<'_>) -> HandlerResult<Score>;
}

/// A named scoring program.
pub trait Handler: Send + Sync {
    /// Stable handler key.
    fn key(&self) -> &str;

    /// QSO scoring capability.
    fn scorer(&self) -> Option<&dyn QsoScorer> {
        None
    }

    /// Accumulation capability.
    fn accumulator(&self) -> Option<Accumulator<'_>> {
        None
    }

    /// Summarization capability.
    fn summarizer(&self) -> Option<&dyn Summarizer> {
        None
    }

    /// Reference type hunted when the operation is not activating this
    /// program, if general hunting applies under `operation`/`settings`.
    fn general_hunting_type(&self, _operation: &Operation, _settings: &Settings) -> Option<&str> {
        None
    }
}
