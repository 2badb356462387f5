//! Classification of extracted strings into readable and encrypted.

use crate::analysis::entropy::{is_readable, EntropyStrategy, MIN_STRING_LEN};
use crate::model::StringAnalysisMetrics;

/// Strings above this entropy are counted as encrypted or obfuscated.
pub const ENCRYPTED_ENTROPY_THRESHOLD: f64 = 4.5;
/// Only the first strings contribute to the average entropy.
pub const ENTROPY_SAMPLE_SIZE: usize = 100;

/// Split a `strings -a` listing into trimmed, non-empty entries.
pub fn parse_listing(listing: &str) -> Vec<&str> {
    listing.split('\n').map(str::trim).filter(|s| !s.is_empty()).collect()
}

pub fn analyze(strings: &[&str], strategy: EntropyStrategy) -> StringAnalysisMetrics {
    let mut readable = 0u64;
    let mut encrypted = 0u64;

    for s in strings.iter().filter(|s| s.chars().count() >= MIN_STRING_LEN) {
        if strategy.entropy(s) > ENCRYPTED_ENTROPY_THRESHOLD {
            encrypted += 1;
        } else if is_readable(s) {
            readable += 1;
        }
    }

    let sample: Vec<f64> =
        strings.iter().take(ENTROPY_SAMPLE_SIZE).map(|s| strategy.entropy(s)).collect();
    let avg_entropy =
        if sample.is_empty() { 0.0 } else { sample.iter().sum::<f64>() / sample.len() as f64 };

    let total = strings.len() as u64;
    StringAnalysisMetrics {
        num_total_strings: total,
        num_readable_strings: readable,
        num_encrypted_strings: encrypted,
        avg_string_entropy: avg_entropy,
        string_obfuscation_rate: if total > 0 { encrypted as f64 / total as f64 } else { 0.0 },
    }
}
