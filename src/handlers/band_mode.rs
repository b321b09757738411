use crate::{
    engine::{
        errors::HandlerResult,
        registry::BAND_MODE_KEY,
        score::{Contribution, Notice, Presentation, Score},
        traits::{
            AccumulateInput, Accumulator, Handler, OperationAccumulator, QsoScorer, ScoringInput,
            SummarizeInput, Summarizer,
        },
    },
    types::{Band, Mode},
};

use super::accumulate_distinct;

const BAND_PREFIX: &str = "band:";
const MODE_PREFIX: &str = "mode:";

fn band_key(band: Band) -> String {
    format!("{BAND_PREFIX}{band}")
}

fn mode_key(mode: Mode) -> String {
    format!("{MODE_PREFIX}{mode}")
}

/// Distinct bands and modes used over the whole operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct BandModeDiversity;

impl QsoScorer for BandModeDiversity {
    fn score_qso(&self, input: &ScoringInput<'_>) -> HandlerResult<Contribution> {
        let qso = input.qso;
        let mut out = Contribution::zero();
        let mut keys = Vec::with_capacity(2);

        if qso.band != Band::Other {
            let key = band_key(qso.band);
            if !input.score.has_tally(&key) {
                out.value += 1;
                out.notices.push(Notice::NewBand);
            }
            keys.push(key);
        }
        if qso.mode != Mode::Other {
            let key = mode_key(qso.mode);
            if !input.score.has_tally(&key) {
                out.value += 1;
                out.notices.push(Notice::NewMode);
            }
            keys.push(key);
        }
        Ok(out.with_keys(keys))
    }
}

impl OperationAccumulator for BandModeDiversity {
    fn accumulate_for_operation(&self, input: &AccumulateInput<'_>) -> HandlerResult<Score> {
        Ok(accumulate_distinct(input))
    }
}

impl Summarizer for BandModeDiversity {
    fn summarize(&self, input: &SummarizeInput<'_>) -> HandlerResult<Score> {
        let mut out = input.score.undecorated();
        let bands = out.distinct_with_prefix(BAND_PREFIX);
        let modes = out.distinct_with_prefix(MODE_PREFIX);
        out.presentation = Some(Presentation {
            label: "Bands & Modes".to_string(),
            icon: Some("sine-wave".to_string()),
            summary: format!("{bands} bands, {modes} modes"),
            long_summary: None,
        });
        Ok(out)
    }
}

impl Handler for BandModeDiversity {
    fn key(&self) -> &str {
        BAND_MODE_KEY
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
