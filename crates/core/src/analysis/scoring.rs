//! Composite scoring.
//!
//! Every weight, cap, threshold and multiplier lives in this module. They define
//! the benchmark: changing any of them makes new results incomparable with
//! earlier runs.

use crate::model::{
    AntiAnalysisMetrics, ControlFlowAnalysisMetrics, DataFlowAnalysisMetrics,
    DecompilationMetrics, DisassemblyComplexityMetrics, ScoreBreakdown, StaticAnalysisMetrics,
    StringAnalysisMetrics, SymbolAnalysisMetrics,
};

/// Weights of the component scores in the RE difficulty score.
pub mod re_weights {
    pub const COMPLEXITY: f64 = 0.12;
    pub const SYMBOL: f64 = 0.10;
    pub const STRING: f64 = 0.06;
    pub const DISASSEMBLY: f64 = 0.08;
    pub const CONTROL_FLOW: f64 = 0.35;
    pub const DATA_FLOW: f64 = 0.12;
    pub const ANTI_ANALYSIS: f64 = 0.12;
    pub const DECOMPILATION: f64 = 0.05;
}

/// Weights of the component scores in the security score.
pub mod security_weights {
    pub const ANTI_ANALYSIS: f64 = 0.50;
    pub const CONTROL_FLOW: f64 = 0.25;
    pub const SYMBOL: f64 = 0.12;
    pub const STRING: f64 = 0.13;
}

/// Weights in the resilience score.
pub mod resilience_weights {
    pub const RE_DIFFICULTY: f64 = 0.45;
    pub const SECURITY: f64 = 0.30;
    pub const COMPLEXITY: f64 = 0.12;
    pub const CONTROL_FLOW: f64 = 0.13;
}

/// Lowest RE difficulty reported, even for unobfuscated code.
pub const RE_DIFFICULTY_FLOOR: f64 = 20.0;
pub const MAX_SCORE: f64 = 100.0;

/// Opaque-predicate count above which the opaque/MBA technique is considered active.
pub const OPAQUE_TECHNIQUE_THRESHOLD: u64 = 5;
/// Anti-analysis component score above which strong anti-analysis is active.
pub const ANTI_ANALYSIS_TECHNIQUE_THRESHOLD: f64 = 40.0;

/// RE difficulty multiplier, indexed by active advanced techniques (capped at 4).
pub const TECHNIQUE_MULTIPLIERS: [f64; 5] = [1.0, 1.20, 1.40, 1.65, 1.85];
/// Security multiplier, indexed by active advanced techniques (capped at 4).
pub const SECURITY_MULTIPLIERS: [f64; 5] = [1.0, 1.0, 1.25, 1.45, 1.65];

/// Borrowed view of the eight bundles the aggregator consumes.
#[derive(Debug, Clone, Copy)]
pub struct MetricBundles<'a> {
    pub static_analysis: &'a StaticAnalysisMetrics,
    pub symbol: &'a SymbolAnalysisMetrics,
    pub string: &'a StringAnalysisMetrics,
    pub disassembly: &'a DisassemblyComplexityMetrics,
    pub control_flow: &'a ControlFlowAnalysisMetrics,
    pub data_flow: &'a DataFlowAnalysisMetrics,
    pub anti_analysis: &'a AntiAnalysisMetrics,
    pub decompilation: &'a DecompilationMetrics,
}

/// The three composite scores plus the breakdown that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct OverallScores {
    pub re_difficulty: f64,
    pub security: f64,
    pub resilience: f64,
    pub breakdown: ScoreBreakdown,
}

fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, MAX_SCORE)
}

/// Repeated label names can drive cyclomatic complexity below zero, so the
/// base is clamped before the boost as well as after it.
pub fn complexity_score(s: &StaticAnalysisMetrics) -> f64 {
    let base = clamp_score((s.cyclomatic_complexity / 30.0) * 25.0
        + ((1.0 - s.instruction_diversity) * 100.0) * 0.20
        + (s.num_indirect_jumps.min(50) as f64) * 1.0
        + s.max_nesting_depth as f64 * 4.0
        + (s.num_conditional_branches as f64 / 50.0) * 20.0);
    // Convex boost: heavily obfuscated code scales non-linearly.
    clamp_score(base * (1.0 + base / 200.0))
}

pub fn symbol_score(s: &SymbolAnalysisMetrics) -> f64 {
    let score = if !s.symbols_present {
        50.0
    } else {
        (s.symbol_name_entropy / 5.0 * 35.0).min(35.0)
            + (25.0 - s.num_symbols as f64 / 10.0).max(0.0)
    };
    clamp_score(score)
}

pub fn string_score(s: &StringAnalysisMetrics) -> f64 {
    (s.string_obfuscation_rate * 70.0 + (s.avg_string_entropy / 5.0 * 30.0).min(30.0))
        .clamp(0.0, MAX_SCORE)
}

pub fn disassembly_score(d: &DisassemblyComplexityMetrics) -> f64 {
    (d.anti_disassembly_score * 0.5
        + ((1.0 - d.linear_sweep_coverage) * 150.0) * 0.3
        + (d.num_invalid_instructions as f64 * 5.0) * 0.2)
        .clamp(0.0, MAX_SCORE)
}

pub fn control_flow_score(c: &ControlFlowAnalysisMetrics) -> f64 {
    let mut score = (c.cfg_density * 100.0 * 0.30).min(30.0)
        + (c.cfg_strongly_connected_components as f64 / 40.0 * 20.0).min(20.0);
    if c.num_opaque_predicates > 0 {
        score += (c.num_opaque_predicates as f64 * 3.5).min(35.0);
    }
    if c.control_flow_flattening_detected {
        score += 30.0;
    }
    if c.bogus_control_flow_detected {
        score += 15.0;
    }
    clamp_score(score)
}

pub fn data_flow_score(d: &DataFlowAnalysisMetrics) -> f64 {
    let base = d.data_flow_complexity_score * 0.6
        + (d.avg_def_use_distance * 0.8).min(25.0)
        + (d.pointer_indirection_levels as f64 * 3.0).min(15.0);
    clamp_score(base * 1.3)
}

pub fn anti_analysis_score(a: &AntiAnalysisMetrics) -> f64 {
    let mut score = (a.anti_debug_checks as f64 * 2.5).min(30.0)
        + (a.anti_vm_checks as f64 * 4.0).min(20.0)
        + (a.anti_dump_techniques as f64 * 7.5).min(15.0);
    if a.self_modifying_code_detected {
        score += 25.0;
    }
    if a.encryption_detected {
        score += 25.0;
    }
    if a.virtualization_detected {
        score += 20.0;
    }
    clamp_score(score)
}

pub fn decompilation_score(d: &DecompilationMetrics) -> f64 {
    ((1.0 - d.readability_score) * 50.0
        + d.ast_complexity * 0.4
        + (1.0 - d.variable_recovery_rate) * 25.0
        + (1.0 - d.type_recovery_rate) * 25.0)
        .clamp(0.0, MAX_SCORE)
}

/// Number of active advanced techniques, 0..=5.
pub fn advanced_techniques(
    cfg: &ControlFlowAnalysisMetrics,
    anti: &AntiAnalysisMetrics,
    anti_score: f64,
) -> u32 {
    [
        cfg.num_opaque_predicates > OPAQUE_TECHNIQUE_THRESHOLD,
        cfg.control_flow_flattening_detected,
        anti_score > ANTI_ANALYSIS_TECHNIQUE_THRESHOLD,
        anti.encryption_detected,
        anti.self_modifying_code_detected,
    ]
    .iter()
    .filter(|active| **active)
    .count() as u32
}

fn multiplier(table: &[f64; 5], techniques: u32) -> f64 {
    table[(techniques as usize).min(table.len() - 1)]
}

/// Combine all bundles into the RE difficulty, security and resilience scores.
pub fn calculate_overall_scores(b: &MetricBundles<'_>) -> OverallScores {
    let complexity = complexity_score(b.static_analysis);
    let symbol = symbol_score(b.symbol);
    let string = string_score(b.string);
    let disassembly = disassembly_score(b.disassembly);
    let control_flow = control_flow_score(b.control_flow);
    let data_flow = data_flow_score(b.data_flow);
    let anti = anti_analysis_score(b.anti_analysis);
    let decompilation = decompilation_score(b.decompilation);

    let techniques = advanced_techniques(b.control_flow, b.anti_analysis, anti);
    let technique_multiplier = multiplier(&TECHNIQUE_MULTIPLIERS, techniques);
    let security_multiplier = multiplier(&SECURITY_MULTIPLIERS, techniques);

    let re_base = complexity * re_weights::COMPLEXITY
        + symbol * re_weights::SYMBOL
        + string * re_weights::STRING
        + disassembly * re_weights::DISASSEMBLY
        + control_flow * re_weights::CONTROL_FLOW
        + data_flow * re_weights::DATA_FLOW
        + anti * re_weights::ANTI_ANALYSIS
        + decompilation * re_weights::DECOMPILATION;
    let re_difficulty = (re_base * technique_multiplier).max(RE_DIFFICULTY_FLOOR);

    let security_base = anti * security_weights::ANTI_ANALYSIS
        + control_flow * security_weights::CONTROL_FLOW
        + symbol * security_weights::SYMBOL
        + string * security_weights::STRING;
    let security = security_base * security_multiplier;

    // Resilience uses the unclamped RE and security scores.
    let resilience = re_difficulty * resilience_weights::RE_DIFFICULTY
        + security * resilience_weights::SECURITY
        + complexity * resilience_weights::COMPLEXITY
        + control_flow * resilience_weights::CONTROL_FLOW;

    let breakdown = ScoreBreakdown {
        complexity,
        symbol,
        string,
        disassembly,
        control_flow,
        data_flow,
        anti_analysis: anti,
        decompilation,
        advanced_techniques: techniques,
        technique_multiplier,
        security_multiplier,
    };
    log::debug!("score breakdown: {breakdown:?}");

    OverallScores {
        re_difficulty: clamp_score(re_difficulty),
        security: clamp_score(security),
        resilience: clamp_score(resilience),
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplier_tables_cap_at_four_techniques() {
        assert_eq!(multiplier(&TECHNIQUE_MULTIPLIERS, 0), 1.0);
        assert_eq!(multiplier(&TECHNIQUE_MULTIPLIERS, 3), 1.65);
        assert_eq!(multiplier(&TECHNIQUE_MULTIPLIERS, 5), 1.85);
        assert_eq!(multiplier(&SECURITY_MULTIPLIERS, 1), 1.0);
        assert_eq!(multiplier(&SECURITY_MULTIPLIERS, 2), 1.25);
        assert_eq!(multiplier(&SECURITY_MULTIPLIERS, 5), 1.65);
    }

    #[test]
    fn symbol_score_rewards_stripping() {
        assert_eq!(symbol_score(&SymbolAnalysisMetrics::default()), 50.0);
        let present = SymbolAnalysisMetrics {
            symbols_present: true,
            num_symbols: 500,
            symbol_name_entropy: 4.0,
            ..Default::default()
        };
        assert!((symbol_score(&present) - 28.0).abs() < 1e-9);
    }
}
