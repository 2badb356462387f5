//! Metric extraction and scoring.
//!
//! The disassembly is normalized once into a [`normalize::Listing`]; every
//! extractor and detector below reads that listing by reference. Scoring and
//! time estimation run strictly after all extractors and only see the bundles.

pub mod cfg;
pub mod dataflow;
pub mod decompile;
pub mod detectors;
pub mod disasm_complexity;
pub mod entropy;
pub mod estimate;
pub mod normalize;
pub mod scoring;
pub mod static_metrics;
pub mod stats;
pub mod strings;
pub mod symbols;

use crate::model::{AntiAnalysisMetrics, ControlFlowAnalysisMetrics};
use cfg::ControlFlowGraph;
use detectors::{DetectorInput, Findings, Rule};
use normalize::Listing;

/// Control-flow bundle from the approximate graph plus the CFG-level detectors.
pub fn control_flow_metrics(listing: &Listing, findings: &Findings) -> ControlFlowAnalysisMetrics {
    let graph = ControlFlowGraph::build(listing);
    ControlFlowAnalysisMetrics {
        cfg_nodes: graph.node_count(),
        cfg_edges: graph.edge_count(),
        cfg_strongly_connected_components: graph.strongly_connected_components(),
        cfg_diameter: graph.diameter(),
        cfg_density: graph.density(),
        num_opaque_predicates: findings.get(Rule::OpaquePredicates).count(),
        control_flow_flattening_detected: findings.get(Rule::ControlFlowFlattening).flag(),
        bogus_control_flow_detected: findings.get(Rule::BogusControlFlow).flag(),
    }
}

/// Anti-analysis bundle from the detector findings.
pub fn anti_analysis_metrics(findings: &Findings) -> AntiAnalysisMetrics {
    AntiAnalysisMetrics {
        anti_debug_checks: findings.get(Rule::AntiDebug).count(),
        anti_vm_checks: findings.get(Rule::AntiVm).count(),
        anti_dump_techniques: findings.get(Rule::AntiDump).count(),
        self_modifying_code_detected: findings.get(Rule::SelfModifyingCode).flag(),
        packing_detected: findings.get(Rule::Packing).flag(),
        encryption_detected: findings.get(Rule::Encryption).flag(),
        virtualization_detected: findings.get(Rule::Virtualization).flag(),
    }
}

/// Run every detector rule once.
pub fn detect(listing: &Listing, section_headers: &str) -> Findings {
    Findings::evaluate(&DetectorInput { listing, section_headers })
}
