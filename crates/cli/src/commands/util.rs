use std::path::Path;

use anyhow::{Context, Result};

use re_metrics_core::config::AnalyzerConfig;
use re_metrics_core::model::ReverseEngineeringMetrics;

/// Load the analyzer config, or defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<AnalyzerConfig> {
    match path {
        Some(path) => AnalyzerConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(AnalyzerConfig::default()),
    }
}

/// Human-readable report of one analysis.
pub fn print_summary(metrics: &ReverseEngineeringMetrics) {
    let s = &metrics.static_analysis;
    let c = &metrics.control_flow_analysis;
    let a = &metrics.anti_analysis;

    println!("Reverse Engineering Metrics");
    println!("===========================");
    println!("Binary: {}", metrics.binary_name);
    println!("Mode: {}", metrics.obfuscation_mode);
    if let Some(hash) = &metrics.binary_sha256 {
        println!("SHA-256: {hash}");
    }
    println!();
    println!("RE difficulty: {:.1}/100", metrics.re_difficulty_score);
    println!("Security:      {:.1}/100", metrics.security_score);
    println!("Resilience:    {:.1}/100", metrics.resilience_score);
    println!(
        "Estimated effort: {:.1}h (expert), {:.1}h (novice)",
        metrics.estimated_re_hours_expert, metrics.estimated_re_hours_novice
    );
    println!();
    println!("Static:");
    println!("  instructions: {}", s.num_instructions);
    println!("  functions: {}", s.num_functions);
    println!("  basic blocks: {}", s.num_basic_blocks);
    println!("  cyclomatic complexity: {:.1}", s.cyclomatic_complexity);
    println!("Control flow:");
    println!("  cfg nodes/edges: {}/{}", c.cfg_nodes, c.cfg_edges);
    println!("  opaque predicates: {}", c.num_opaque_predicates);
    println!("  flattening: {}", yes_no(c.control_flow_flattening_detected));
    println!("  bogus flow: {}", yes_no(c.bogus_control_flow_detected));
    println!("Anti-analysis:");
    println!("  anti-debug checks: {}", a.anti_debug_checks);
    println!("  anti-vm checks: {}", a.anti_vm_checks);
    println!("  packing: {}", yes_no(a.packing_detected));
    println!("  encryption: {}", yes_no(a.encryption_detected));
    println!("  virtualization: {}", yes_no(a.virtualization_detected));
    println!("Advanced techniques: {}", metrics.score_breakdown.advanced_techniques);
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
