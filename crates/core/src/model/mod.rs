//! Metric bundles and the composite result document.
//!
//! Each bundle is computed once per binary by one analysis phase and is never
//! mutated afterwards. Ratio fields lie in `[0, 1]`, scores in `[0, 100]`.
//! `Default` is the "phase degraded" value used when a tool is unavailable.

use serde::{Deserialize, Serialize};

/// Instruction-level statistics extracted from the normalized listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticAnalysisMetrics {
    pub file_size: u64,
    pub num_instructions: u64,
    pub num_basic_blocks: u64,
    pub num_functions: u64,
    pub unique_opcodes: u64,

    pub cyclomatic_complexity: f64,
    /// Unique opcodes / total instructions.
    pub instruction_diversity: f64,
    pub avg_basic_block_size: f64,
    pub max_basic_block_size: u64,

    pub num_control_flow_edges: u64,
    pub num_indirect_jumps: u64,
    pub num_conditional_branches: u64,
    pub num_unconditional_jumps: u64,
    pub max_nesting_depth: u64,

    pub num_memory_operations: u64,
    pub num_register_operations: u64,
    pub register_pressure: f64,
    pub stack_complexity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolAnalysisMetrics {
    pub symbols_present: bool,
    pub num_symbols: u64,
    pub num_debug_symbols: u64,
    pub num_dynamic_symbols: u64,
    /// Entropy of all symbol names concatenated; a proxy for name mangling/renaming.
    pub symbol_name_entropy: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StringAnalysisMetrics {
    pub num_total_strings: u64,
    pub num_readable_strings: u64,
    pub num_encrypted_strings: u64,
    pub avg_string_entropy: f64,
    pub string_obfuscation_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisassemblyComplexityMetrics {
    /// Fraction of listing lines that decoded as instructions.
    pub linear_sweep_coverage: f64,
    pub recursive_descent_coverage: f64,
    pub num_invalid_instructions: u64,
    pub num_overlapping_instructions: u64,
    pub anti_disassembly_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlFlowAnalysisMetrics {
    pub cfg_nodes: u64,
    pub cfg_edges: u64,
    pub cfg_strongly_connected_components: u64,
    pub cfg_diameter: u64,
    pub cfg_density: f64,
    pub num_opaque_predicates: u64,
    pub control_flow_flattening_detected: bool,
    pub bogus_control_flow_detected: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataFlowAnalysisMetrics {
    pub num_def_use_chains: u64,
    pub avg_def_use_distance: f64,
    pub num_aliased_pointers: u64,
    pub pointer_indirection_levels: u64,
    pub data_flow_complexity_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AntiAnalysisMetrics {
    pub anti_debug_checks: u64,
    pub anti_vm_checks: u64,
    pub anti_dump_techniques: u64,
    pub self_modifying_code_detected: bool,
    pub packing_detected: bool,
    pub encryption_detected: bool,
    pub virtualization_detected: bool,
}

/// Decompilation difficulty. Everything except `ast_complexity` and
/// `decompilation_time` is a fixed default until a real decompiler is wired in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecompilationMetrics {
    pub decompilation_possible: bool,
    pub decompilation_time: f64,
    pub decompilation_coverage: f64,
    pub ast_complexity: f64,
    pub variable_recovery_rate: f64,
    pub type_recovery_rate: f64,
    /// 0-1, higher = more readable.
    pub readability_score: f64,
}

/// Intermediate component scores and multipliers behind the composite scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub complexity: f64,
    pub symbol: f64,
    pub string: f64,
    pub disassembly: f64,
    pub control_flow: f64,
    pub data_flow: f64,
    pub anti_analysis: f64,
    pub decompilation: f64,
    pub advanced_techniques: u32,
    pub technique_multiplier: f64,
    pub security_multiplier: f64,
}

/// Complete evaluation of one binary. Either fully populated or absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverseEngineeringMetrics {
    pub binary_name: String,
    pub obfuscation_mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary_sha256: Option<String>,

    pub static_analysis: StaticAnalysisMetrics,
    pub symbol_analysis: SymbolAnalysisMetrics,
    pub string_analysis: StringAnalysisMetrics,
    pub disassembly_complexity: DisassemblyComplexityMetrics,
    pub control_flow_analysis: ControlFlowAnalysisMetrics,
    pub data_flow_analysis: DataFlowAnalysisMetrics,
    pub anti_analysis: AntiAnalysisMetrics,
    pub decompilation: DecompilationMetrics,
    pub score_breakdown: ScoreBreakdown,

    /// 0-100, higher = harder to reverse-engineer.
    pub re_difficulty_score: f64,
    pub security_score: f64,
    pub resilience_score: f64,

    pub estimated_re_hours_novice: f64,
    pub estimated_re_hours_expert: f64,

    pub analysis_time_seconds: f64,
    /// RFC 3339 timestamp of when the analysis finished.
    pub analysis_timestamp: String,
}

/// Obfuscation configuration label attached to a result.
///
/// The label is a free-form tag; the well-known names only matter for
/// inferring a mode from a file name and for baseline comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObfuscationMode(pub String);

impl ObfuscationMode {
    pub const BASELINE: &'static str = "baseline";
    pub const NORMAL: &'static str = "normal";
    pub const SIZE_CONSERVATIVE: &'static str = "size_conservative";
    pub const MAXIMUM_SECURITY: &'static str = "maximum_security";
    pub const UNKNOWN: &'static str = "unknown";

    /// Well-known modes in the order reports list them.
    pub const KNOWN: [&'static str; 4] =
        [Self::BASELINE, Self::NORMAL, Self::SIZE_CONSERVATIVE, Self::MAXIMUM_SECURITY];

    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Infer the mode from a compiled test binary name such as `test_easy_normal`.
    pub fn infer_from_file_name(name: &str) -> Self {
        let found = Self::KNOWN.into_iter().find(|mode| name.contains(&format!("_{mode}")));
        Self::new(found.unwrap_or(Self::UNKNOWN))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_baseline(&self) -> bool {
        self.0 == Self::BASELINE
    }
}

impl Default for ObfuscationMode {
    fn default() -> Self {
        Self::new(Self::UNKNOWN)
    }
}

impl std::fmt::Display for ObfuscationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_known_modes_from_file_names() {
        assert_eq!(ObfuscationMode::infer_from_file_name("test_easy_baseline").as_str(), "baseline");
        assert_eq!(ObfuscationMode::infer_from_file_name("test_easy_normal").as_str(), "normal");
        assert_eq!(
            ObfuscationMode::infer_from_file_name("test_medium_size_conservative").as_str(),
            "size_conservative"
        );
        assert_eq!(
            ObfuscationMode::infer_from_file_name("test_difficult_maximum_security").as_str(),
            "maximum_security"
        );
        assert_eq!(ObfuscationMode::infer_from_file_name("a.out").as_str(), "unknown");
    }
}
