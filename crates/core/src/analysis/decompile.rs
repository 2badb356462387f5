use crate::model::DecompilationMetrics;

/// Fixed estimates used while no decompiler is integrated.
pub const DEFAULT_COVERAGE: f64 = 0.8;
pub const DEFAULT_VARIABLE_RECOVERY: f64 = 0.3;
pub const DEFAULT_TYPE_RECOVERY: f64 = 0.2;
pub const DEFAULT_READABILITY: f64 = 0.3;
const SECONDS_PER_INSTRUCTION: f64 = 0.001;
const INSTRUCTIONS_PER_AST_POINT: f64 = 100.0;

/// Decompilation difficulty derived from the instruction count alone.
pub fn estimate(num_instructions: u64) -> DecompilationMetrics {
    let n = num_instructions as f64;
    DecompilationMetrics {
        decompilation_possible: true,
        decompilation_time: n * SECONDS_PER_INSTRUCTION,
        decompilation_coverage: DEFAULT_COVERAGE,
        ast_complexity: (n / INSTRUCTIONS_PER_AST_POINT).min(100.0),
        variable_recovery_rate: DEFAULT_VARIABLE_RECOVERY,
        type_recovery_rate: DEFAULT_TYPE_RECOVERY,
        readability_score: DEFAULT_READABILITY,
    }
}

impl Default for DecompilationMetrics {
    fn default() -> Self {
        estimate(0)
    }
}
