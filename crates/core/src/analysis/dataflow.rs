//! Register def-use approximation.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::analysis::normalize::Listing;
use crate::model::DataFlowAnalysisMetrics;

const MAX_INDIRECTION_LEVELS: u64 = 5;
const INDIRECT_LINES_PER_LEVEL: u64 = 100;
const MEMORY_LINES_PER_ALIAS: u64 = 20;

fn register_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(rax|rbx|rcx|rdx|rsi|rdi|r\d+|eax|ebx)\b").expect("static regex")
    })
}

pub fn analyze(listing: &Listing) -> DataFlowAnalysisMetrics {
    let mut last_def: HashMap<&str, u64> = HashMap::new();
    let mut chains = 0u64;
    let mut distance_sum = 0u64;
    let mut line_num = 0u64;

    for line in listing.lines() {
        if !(line.contains(':') && line.contains('\t')) {
            continue;
        }
        line_num += 1;
        let defines = line.contains("mov") || line.contains("lea");
        for reg in register_re().find_iter(line) {
            let reg = reg.as_str();
            if defines {
                last_def.insert(reg, line_num);
            } else if let Some(def_line) = last_def.get(reg) {
                distance_sum += line_num - def_line;
                chains += 1;
            }
        }
    }

    let avg_distance = if chains > 0 { distance_sum as f64 / chains as f64 } else { 0.0 };

    let indirect_lines = listing
        .lines()
        .iter()
        .filter(|l| l.matches('[').count() + l.matches(']').count() > 2)
        .count() as u64;
    let indirection_levels = (indirect_lines / INDIRECT_LINES_PER_LEVEL).min(MAX_INDIRECTION_LEVELS);

    let memory_lines = listing.lines().iter().filter(|l| l.contains('[')).count() as u64;

    let complexity =
        (chains as f64 / 10.0 + avg_distance * 2.0 + indirection_levels as f64 * 5.0).min(100.0);

    DataFlowAnalysisMetrics {
        num_def_use_chains: chains,
        avg_def_use_distance: avg_distance,
        num_aliased_pointers: memory_lines / MEMORY_LINES_PER_ALIAS,
        pointer_indirection_levels: indirection_levels,
        data_flow_complexity_score: complexity,
    }
}
