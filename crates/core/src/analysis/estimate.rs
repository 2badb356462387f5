//! Human effort estimates derived from the RE difficulty score.

/// Rough bytes of binary per line of source.
pub const BYTES_PER_LOC: f64 = 100.0;
/// Lines of code an expert gets through per hour on unobfuscated code.
pub const EXPERT_LOC_PER_HOUR: f64 = 200.0;
pub const MIN_EXPERT_HOURS: f64 = 0.5;

/// Novice/expert hour estimates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeEstimate {
    pub novice_hours: f64,
    pub expert_hours: f64,
}

/// Piecewise difficulty multiplier: 1-2x below 30, up to 4x below 50,
/// up to 8x below 70, then 8x plus half a point per score point.
pub fn difficulty_multiplier(score: f64) -> f64 {
    if score < 30.0 {
        1.0 + score / 30.0
    } else if score < 50.0 {
        2.0 + (score - 30.0) / 10.0
    } else if score < 70.0 {
        4.0 + (score - 50.0) / 5.0
    } else {
        8.0 + (score - 70.0) / 2.0
    }
}

pub fn estimate_re_time(difficulty_score: f64, file_size: u64) -> TimeEstimate {
    let base_hours = (file_size as f64 / BYTES_PER_LOC) / EXPERT_LOC_PER_HOUR;
    let expert_hours = (base_hours * difficulty_multiplier(difficulty_score)).max(MIN_EXPERT_HOURS);
    let novice_hours = expert_hours * (3.0 + difficulty_score / 20.0);
    TimeEstimate { novice_hours, expert_hours }
}
