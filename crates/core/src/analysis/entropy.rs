//! Character entropy and readability classification.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Formula used to score character entropy.
///
/// Historical baselines were produced with a formula that multiplies each
/// probability by the bit length of its integer part instead of `log2 p`.
/// That value is not Shannon entropy: it is 1.0 for a string made of a single
/// repeated character and 0.0 otherwise. It is kept selectable so old result
/// sets can be re-scored; new runs use [`EntropyStrategy::Shannon`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntropyStrategy {
    #[default]
    Shannon,
    Legacy,
}

impl EntropyStrategy {
    /// Entropy of `data` in bits per character. Empty input is 0.
    pub fn entropy(self, data: &str) -> f64 {
        let (counts, length) = char_counts(data);
        if length == 0 {
            return 0.0;
        }
        let length = length as f64;
        match self {
            EntropyStrategy::Shannon => counts
                .values()
                .map(|&count| {
                    let p = count as f64 / length;
                    -p * p.log2()
                })
                .sum(),
            EntropyStrategy::Legacy => counts
                .values()
                .map(|&count| {
                    let p = count as f64 / length;
                    p * bit_length(p.floor() as u64) as f64
                })
                .sum(),
        }
    }
}

fn char_counts(data: &str) -> (HashMap<char, usize>, usize) {
    let mut counts = HashMap::new();
    let mut length = 0;
    for c in data.chars() {
        *counts.entry(c).or_insert(0) += 1;
        length += 1;
    }
    (counts, length)
}

fn bit_length(value: u64) -> u32 {
    u64::BITS - value.leading_zeros()
}

/// Minimum length for a string to be classified at all.
pub const MIN_STRING_LEN: usize = 4;

/// A string is readable when more than this fraction of its characters are printable.
pub const READABLE_FRACTION: f64 = 0.8;

/// Whether a string looks human-readable.
pub fn is_readable(s: &str) -> bool {
    let total = s.chars().count();
    if total < MIN_STRING_LEN {
        return false;
    }
    let printable = s.chars().filter(|c| is_printable(*c)).count();
    printable as f64 / total as f64 > READABLE_FRACTION
}

fn is_printable(c: char) -> bool {
    c == ' ' || !(c.is_control() || c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_length_matches_integer_semantics() {
        assert_eq!(bit_length(0), 0);
        assert_eq!(bit_length(1), 1);
        assert_eq!(bit_length(8), 4);
    }

    #[test]
    fn tabs_are_not_printable() {
        assert!(is_readable("plain text"));
        assert!(!is_readable("a\tb\tc\td\t"));
    }
}
