//! Cross-run statistics over stored results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{ObfuscationMode, ReverseEngineeringMetrics};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; 0 for a single value.
    pub stdev: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl SummaryStats {
    /// `None` for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len();
        let mean = values.iter().sum::<f64>() / n as f64;
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };
        let stdev = if n > 1 {
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            var.sqrt()
        } else {
            0.0
        };
        Some(Self { mean, median, stdev, min: sorted[0], max: sorted[n - 1], count: n })
    }
}

/// Composite scores that summaries are computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
    ReDifficultyScore,
    SecurityScore,
    ResilienceScore,
}

impl ScoreKind {
    pub const ALL: [ScoreKind; 3] =
        [ScoreKind::ReDifficultyScore, ScoreKind::SecurityScore, ScoreKind::ResilienceScore];

    pub fn of(self, m: &ReverseEngineeringMetrics) -> f64 {
        match self {
            ScoreKind::ReDifficultyScore => m.re_difficulty_score,
            ScoreKind::SecurityScore => m.security_score,
            ScoreKind::ResilienceScore => m.resilience_score,
        }
    }
}

/// score kind -> mode -> summary, for every mode present in `results`.
pub type ModeSummary = BTreeMap<ScoreKind, BTreeMap<String, SummaryStats>>;

pub fn summarize_by_mode(results: &[ReverseEngineeringMetrics]) -> ModeSummary {
    let mut by_mode: BTreeMap<&str, Vec<&ReverseEngineeringMetrics>> = BTreeMap::new();
    for r in results {
        by_mode.entry(r.obfuscation_mode.as_str()).or_default().push(r);
    }

    ScoreKind::ALL
        .iter()
        .map(|kind| {
            let per_mode = by_mode
                .iter()
                .filter_map(|(mode, rs)| {
                    let values: Vec<f64> = rs.iter().map(|r| kind.of(r)).collect();
                    SummaryStats::from_values(&values).map(|s| (mode.to_string(), s))
                })
                .collect();
            (*kind, per_mode)
        })
        .collect()
}

/// Strip a trailing `_<mode>` suffix: `test_easy_normal` -> `test_easy`.
pub fn test_name(binary_name: &str, mode: &str) -> String {
    binary_name.strip_suffix(&format!("_{mode}")).unwrap_or(binary_name).to_string()
}

/// test name -> mode -> percentage change of the RE difficulty score vs. baseline.
///
/// Test cases without a baseline result are omitted.
pub fn improvement_over_baseline(
    results: &[ReverseEngineeringMetrics],
) -> BTreeMap<String, BTreeMap<String, f64>> {
    let mut by_test: BTreeMap<String, BTreeMap<&str, f64>> = BTreeMap::new();
    for r in results {
        by_test
            .entry(test_name(&r.binary_name, &r.obfuscation_mode))
            .or_default()
            .insert(r.obfuscation_mode.as_str(), r.re_difficulty_score);
    }

    by_test
        .into_iter()
        .filter_map(|(test, modes)| {
            let baseline = *modes.get(ObfuscationMode::BASELINE)?;
            let improvements = modes
                .iter()
                .filter(|(mode, _)| **mode != ObfuscationMode::BASELINE)
                .map(|(mode, score)| {
                    let pct =
                        if baseline > 0.0 { (score - baseline) / baseline * 100.0 } else { 0.0 };
                    (mode.to_string(), pct)
                })
                .collect();
            Some((test, improvements))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_matches_textbook_values() {
        let s = SummaryStats::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(s.mean, 5.0);
        assert_eq!(s.median, 4.5);
        assert!((s.stdev - 2.138089935).abs() < 1e-6);
        assert_eq!((s.min, s.max, s.count), (2.0, 9.0, 8));
        assert_eq!(SummaryStats::from_values(&[3.0]).unwrap().stdev, 0.0);
        assert!(SummaryStats::from_values(&[]).is_none());
    }

    #[test]
    fn test_name_strips_mode_suffix() {
        assert_eq!(test_name("test_easy_size_conservative", "size_conservative"), "test_easy");
        assert_eq!(test_name("a.out", "unknown"), "a.out");
    }
}
