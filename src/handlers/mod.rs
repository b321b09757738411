/// Declarative activation/hunting programs.
pub mod activity;
/// Band and mode diversity award.
pub mod band_mode;
/// Baseline handler used when no operation reference resolves.
pub mod default_operation;
/// Entity (country) award.
pub mod entity;
/// First-level subdivision awards for two configured countries.
pub mod subdivision;

use crate::engine::{score::Score, traits::AccumulateInput};

/// Running count of distinct keys: every key in the contribution is tallied
/// and the headline value becomes the number of distinct keys seen.
pub(crate) fn accumulate_distinct(input: &AccumulateInput<'_>) -> Score {
    let mut score = input.score.clone();
    let keys = &input.contribution.keys;
    if !keys.is_empty() {
        score.qsos += 1;
        for key in keys {
            score.bump(key);
        }
    }
    score.value = score.tallies.len() as i64;
    score
}
