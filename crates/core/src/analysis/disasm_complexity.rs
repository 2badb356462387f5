use crate::analysis::normalize::Listing;
use crate::model::DisassemblyComplexityMetrics;

const RECURSIVE_DESCENT_FACTOR: f64 = 0.95;
const INVALID_WEIGHT: f64 = 5.0;
const OVERLAP_WEIGHT: f64 = 10.0;

/// Disassembler trouble signals: undecodable bytes and listing coverage.
pub fn analyze(listing: &Listing) -> DisassemblyComplexityMetrics {
    let total_lines = listing.lines().len() as u64;
    let mut valid = 0u64;
    let mut invalid = 0u64;
    // Overlapping instructions are not visible in a linear listing.
    let overlapping = 0u64;

    for line in listing.lines() {
        let lower = line.to_lowercase();
        if lower.contains("cannot disassemble") || lower.contains("invalid") {
            invalid += 1;
        } else if is_instruction_shaped(line) {
            valid += 1;
        }
        if line.contains("(bad)") || line.contains("???") {
            invalid += 1;
        }
    }

    let linear = if total_lines > 0 { valid as f64 / total_lines as f64 } else { 0.0 };
    DisassemblyComplexityMetrics {
        linear_sweep_coverage: linear,
        recursive_descent_coverage: linear * RECURSIVE_DESCENT_FACTOR,
        num_invalid_instructions: invalid,
        num_overlapping_instructions: overlapping,
        anti_disassembly_score: (invalid as f64 * INVALID_WEIGHT
            + overlapping as f64 * OVERLAP_WEIGHT)
            .min(100.0),
    }
}

// Coverage counts every `addr:\t...` line, including the ones the normalizer
// drops as byte continuations.
fn is_instruction_shaped(line: &str) -> bool {
    line.contains(':') && line.contains('\t')
}
