use crate::{
    config::Settings,
    engine::{
        errors::HandlerResult,
        registry::{PRIMARY_SUBDIVISION_KEY, SECONDARY_SUBDIVISION_KEY},
        score::{Contribution, Notice, Presentation, Score},
        traits::{
            AccumulateInput, Accumulator, Handler, OperationAccumulator, QsoScorer, ScoringInput,
            SummarizeInput, Summarizer,
        },
    },
};

use super::{accumulate_distinct, entity::entity_of};

/// Which configured country a [`SubdivisionAward`] follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubdivisionSlot {
    /// `Settings::primary_country`.
    Primary,
    /// `Settings::secondary_country`.
    Secondary,
}

/// Distinct first-level subdivisions worked within one country.
#[derive(Debug, Clone, Copy)]
pub struct SubdivisionAward {
    slot: SubdivisionSlot,
}

impl SubdivisionAward {
    /// Award following `slot`.
    pub fn new(slot: SubdivisionSlot) -> Self {
        Self { slot }
    }

    fn country<'s>(&self, settings: &'s Settings) -> &'s str {
        match self.slot {
            SubdivisionSlot::Primary => &settings.primary_country,
            SubdivisionSlot::Secondary => &settings.secondary_country,
        }
    }
}

impl QsoScorer for SubdivisionAward {
    fn score_qso(&self, input: &ScoringInput<'_>) -> HandlerResult<Contribution> {
        let country = self.country(input.settings);
        let in_country =
            entity_of(input.qso, input).is_some_and(|e| e.eq_ignore_ascii_case(country));
        if !in_country {
            return Ok(Contribution::zero());
        }
        let Some(state) = input
            .qso
            .their
            .state
            .as_deref()
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
        else {
            return Ok(Contribution::zero());
        };

        let contribution = if input.score.has_tally(&state) {
            Contribution::zero()
        } else {
            Contribution::counted(1).with_notice(Notice::NewRef)
        };
        Ok(contribution.with_keys(vec![state]))
    }
}

impl OperationAccumulator for SubdivisionAward {
    fn accumulate_for_operation(&self, input: &AccumulateInput<'_>) -> HandlerResult<Score> {
        Ok(accumulate_distinct(input))
    }
}

impl Summarizer for SubdivisionAward {
    fn summarize(&self, input: &SummarizeInput<'_>) -> HandlerResult<Score> {
        let country = self.country(input.settings);
        let mut out = input.score.undecorated();
        let n = out.tallies.len();
        out.presentation = Some(Presentation {
            label: format!("{country} subdivisions"),
            icon: Some("map".to_string()),
            summary: format!("{n} worked"),
            long_summary: input.all_section_scores.map(|_| {
                let mut names: Vec<&str> = out.tallies.keys().map(String::as_str).collect();
                names.sort_unstable();
                names.join(" ")
            }),
        });
        Ok(out)
    }
}

impl Handler for SubdivisionAward {
    fn key(&self) -> &str {
        match self.slot {
            SubdivisionSlot::Primary => PRIMARY_SUBDIVISION_KEY,
            SubdivisionSlot::Secondary => SECONDARY_SUBDIVISION_KEY,
        }
    }

    fn scorer(&self) -> Option<&dyn QsoScorer> {
        Some(self)
    }

    fn accumulator(&self) -> Option<Accumulator<'_>> {
        Some(Accumulator::ForOperation(self))
    }

    fn summarizer(&self) -> Option<&dyn Summarizer> {
        Some(self)
    }
}
