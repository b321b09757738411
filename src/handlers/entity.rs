use crate::{
    engine::{
        errors::HandlerResult,
        registry::ENTITY_KEY,
        score::{Contribution, Notice, Presentation, Score},
        traits::{
            AccumulateInput, Accumulator, Handler, OperationAccumulator, QsoScorer, ScoringInput,
            SummarizeInput, Summarizer,
        },
    },
    qso::Qso,
};

use super::accumulate_distinct;

/// Entity for the other station: decoration first, then the lookup source.
pub(crate) fn entity_of(qso: &Qso, input: &ScoringInput<'_>) -> Option<String> {
    qso.their
        .entity_prefix
        .clone()
        .filter(|e| !e.trim().is_empty())
        .or_else(|| input.lookup.entity_for_call(&qso.their.call))
        .map(|e| e.trim().to_ascii_uppercase())
}

/// Distinct entities (countries) worked over the whole operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntityAward;

impl QsoScorer for EntityAward {
    fn score_qso(&self, input: &ScoringInput<'_>) -> HandlerResult<Contribution> {
        let Some(entity) = entity_of(input.qso, input) else {
            return Ok(Contribution::zero());
        };
        let contribution = if input.score.has_tally(&entity) {
            Contribution::zero()
        } else {
            Contribution::counted(1).with_notice(Notice::NewRef)
        };
        Ok(contribution.with_keys(vec![entity]))
    }
}

impl OperationAccumulator for EntityAward {
    fn accumulate_for_operation(&self, input: &AccumulateInput<'_>) -> HandlerResult<Score> {
        Ok(accumulate_distinct(input))
    }
}

impl Summarizer for EntityAward {
    fn summarize(&self, input: &SummarizeInput<'_>) -> HandlerResult<Score> {
        let mut out = input.score.undecorated();
        let n = out.tallies.len();
        out.presentation = Some(Presentation {
            label: "Entities".to_string(),
            icon: Some("earth".to_string()),
            summary: format!("{n} entities"),
            long_summary: input
                .all_section_scores
                .map(|_| format!("{n} entities in {} QSOs", out.qsos)),
        });
        Ok(out)
    }
}

impl Handler for EntityAward {
    fn key(&self) -> &str {
        ENTITY_KEY
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
