use tracing::trace;

use crate::{
    engine::{
        dupes::NearDupeOptions,
        errors::HandlerResult,
        registry::DEFAULT_OPERATION_KEY,
        score::{Alert, Contribution, Presentation, Score},
        traits::{
            AccumulateInput, Accumulator, DayAccumulator, Handler, QsoScorer, ScoringInput,
            SummarizeInput, Summarizer,
        },
    },
    qso::Qso,
    types::Band,
};

use super::activity::{classify_near_dupes, Dimension, DupeVerdict};

const DUPES_TALLY: &str = "duplicates";

/// Baseline duplicate/band/mode scoring for operations with no program
/// references. One point per contact unique per band and mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultOperation;

impl QsoScorer for DefaultOperation {
    fn score_qso(&self, input: &ScoringInput<'_>) -> HandlerResult<Contribution> {
        let qso = input.qso;
        if qso.band == Band::Other {
            return Ok(Contribution::alerted(Alert::InvalidBand));
        }

        let dupes = input.log.near_dupes(
            qso,
            &NearDupeOptions {
                time_comparison: input.settings.default_time_comparison,
                ..NearDupeOptions::default()
            },
        );
        let no_refs = |_: &Qso| Vec::new();
        let dims = [Dimension::Band, Dimension::Mode];
        let verdict = classify_near_dupes(qso, dupes, &dims, &no_refs);
        trace!(qso = qso.id, ?verdict, "default operation verdict");

        Ok(match verdict {
            DupeVerdict::Duplicate => Contribution::alerted(Alert::Duplicate),
            DupeVerdict::New(dim) => Contribution::counted(1).with_notice(dim.notice()),
            DupeVerdict::Unique | DupeVerdict::MaybeDupe => Contribution::counted(1),
        })
    }
}

impl DayAccumulator for DefaultOperation {
    fn accumulate_for_day(&self, input: &AccumulateInput<'_>) -> HandlerResult<Score> {
        let mut score = input.score.clone();
        let c = input.contribution;
        if c.value > 0 {
            score.value += c.value;
            score.qsos += 1;
        } else if c.is_duplicate() {
            score.bump(DUPES_TALLY);
        }
        Ok(score)
    }
}

impl Summarizer for DefaultOperation {
    fn summarize(&self, input: &SummarizeInput<'_>) -> HandlerResult<Score> {
        let score = input.score;
        let dupes = score.tally(DUPES_TALLY);
        let summary = if dupes > 0 {
            format!("{} QSOs, {} dupes", score.qsos, dupes)
        } else {
            format!("{} QSOs", score.qsos)
        };
        let long_summary = input.all_section_scores.map(|all| {
            let total: u64 = all.iter().map(|s| s.qsos).sum();
            format!("{total} QSOs over {} days", all.len())
        });

        let mut out = score.undecorated();
        out.presentation = Some(Presentation {
            label: "QSOs".to_string(),
            icon: Some("radio".to_string()),
            summary,
            long_summary,
        });
        Ok(out)
    }
}

impl Handler for DefaultOperation {
    fn key(&self) -> &str {
        DEFAULT_OPERATION_KEY
    }

    fn scorer(&self) -> Option<&dyn QsoScorer> {
        Some(self)
    }

    fn accumulator(&self) -> Option<Accumulator<'_>> {
        Some(Accumulator::ForDay(self))
    }

    fn summarizer(&self) -> Option<&dyn Summarizer> {
        Some(self)
    }
}
