//! The per-binary evaluation pipeline.
//!
//! Phases run one after another on the calling thread. A missing or failing
//! tool only empties the listing that tool would have produced; the phase then
//! scores that empty input like any other text. Only a missing binary or an
//! unexpected internal failure aborts the whole analysis, so a returned
//! [`ReverseEngineeringMetrics`] is always fully populated.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use thiserror::Error;

use crate::analysis::entropy::EntropyStrategy;
use crate::analysis::estimate::{estimate_re_time, TimeEstimate};
use crate::analysis::normalize::Listing;
use crate::analysis::scoring::{calculate_overall_scores, MetricBundles, OverallScores};
use crate::analysis::symbols::SymbolListings;
use crate::analysis::{
    anti_analysis_metrics, control_flow_metrics, dataflow, decompile, detect, disasm_complexity,
    static_metrics, strings, symbols,
};
use crate::config::AnalyzerConfig;
use crate::model::{
    AntiAnalysisMetrics, ControlFlowAnalysisMetrics, DataFlowAnalysisMetrics,
    DecompilationMetrics, DisassemblyComplexityMetrics, ObfuscationMode,
    ReverseEngineeringMetrics, StaticAnalysisMetrics, StringAnalysisMetrics,
    SymbolAnalysisMetrics,
};
use crate::services::cache::DisassemblyCache;
use crate::services::tools::{ListingKind, SystemToolRunner, ToolRunner};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Binary not found at {0}")]
    MissingBinary(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Analysis failed: {0}")]
    Internal(String),
}

/// Raw tool output for one binary. Unavailable listings are empty strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawListings<'a> {
    pub disassembly: &'a str,
    pub symbols: &'a str,
    pub dynamic_symbols: &'a str,
    pub section_headers: &'a str,
    pub strings: &'a str,
}

/// Everything computed from the listings, before run metadata is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingAnalysis {
    pub static_analysis: StaticAnalysisMetrics,
    pub symbol_analysis: SymbolAnalysisMetrics,
    pub string_analysis: StringAnalysisMetrics,
    pub disassembly_complexity: DisassemblyComplexityMetrics,
    pub control_flow_analysis: ControlFlowAnalysisMetrics,
    pub data_flow_analysis: DataFlowAnalysisMetrics,
    pub anti_analysis: AntiAnalysisMetrics,
    pub decompilation: DecompilationMetrics,
    pub scores: OverallScores,
    pub time: TimeEstimate,
}

/// Pure evaluation of captured listings. `file_size` drives the time estimate.
pub fn analyze_listings(
    raw: &RawListings<'_>,
    file_size: u64,
    strategy: EntropyStrategy,
) -> ListingAnalysis {
    let listing = Listing::parse(raw.disassembly);

    log::info!("[Phase 1/8] Static analysis");
    let static_analysis = static_metrics::extract(&listing, file_size);
    log::debug!(
        "  instructions={} blocks={} functions={} cyclomatic={:.1} diversity={:.3}",
        static_analysis.num_instructions,
        static_analysis.num_basic_blocks,
        static_analysis.num_functions,
        static_analysis.cyclomatic_complexity,
        static_analysis.instruction_diversity
    );

    log::info!("[Phase 2/8] Symbol analysis");
    let symbol_analysis = symbols::analyze(
        &SymbolListings {
            symbols: raw.symbols,
            dynamic_symbols: raw.dynamic_symbols,
            section_headers: raw.section_headers,
        },
        strategy,
    );
    log::debug!("  {symbol_analysis:?}");

    log::info!("[Phase 3/8] String analysis");
    let string_analysis = strings::analyze(&strings::parse_listing(raw.strings), strategy);
    log::debug!("  {string_analysis:?}");

    log::info!("[Phase 4/8] Disassembly complexity analysis");
    let disassembly_complexity = disasm_complexity::analyze(&listing);
    log::debug!("  {disassembly_complexity:?}");

    let findings = detect(&listing, raw.section_headers);

    log::info!("[Phase 5/8] Control flow analysis");
    let control_flow_analysis = control_flow_metrics(&listing, &findings);
    log::debug!("  {control_flow_analysis:?}");

    log::info!("[Phase 6/8] Data flow analysis");
    let data_flow_analysis = dataflow::analyze(&listing);
    log::debug!("  {data_flow_analysis:?}");

    log::info!("[Phase 7/8] Anti-analysis technique detection");
    let anti_analysis = anti_analysis_metrics(&findings);
    log::debug!("  {anti_analysis:?}");

    log::info!("[Phase 8/8] Decompilation analysis");
    let decompilation = decompile::estimate(static_analysis.num_instructions);

    let scores = calculate_overall_scores(&MetricBundles {
        static_analysis: &static_analysis,
        symbol: &symbol_analysis,
        string: &string_analysis,
        disassembly: &disassembly_complexity,
        control_flow: &control_flow_analysis,
        data_flow: &data_flow_analysis,
        anti_analysis: &anti_analysis,
        decompilation: &decompilation,
    });
    let time = estimate_re_time(scores.re_difficulty, file_size);

    ListingAnalysis {
        static_analysis,
        symbol_analysis,
        string_analysis,
        disassembly_complexity,
        control_flow_analysis,
        data_flow_analysis,
        anti_analysis,
        decompilation,
        scores,
        time,
    }
}

/// Drives the tools, owns the disassembly cache and assembles results.
pub struct Evaluator {
    config: AnalyzerConfig,
    runner: Box<dyn ToolRunner>,
    cache: DisassemblyCache,
}

impl Evaluator {
    pub fn new(config: AnalyzerConfig, runner: Box<dyn ToolRunner>) -> Self {
        Self { config, runner, cache: DisassemblyCache::new() }
    }

    /// Evaluator backed by the installed binutils.
    pub fn with_system_tools(config: AnalyzerConfig) -> Self {
        let runner = SystemToolRunner::new(config.tools.clone());
        Self::new(config, Box::new(runner))
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn cache(&self) -> &DisassemblyCache {
        &self.cache
    }

    /// Drop cached disassembly so the next analysis re-runs the disassembler.
    pub fn reset_cache(&mut self) {
        self.cache.clear();
    }

    /// Analyze one binary end to end.
    pub fn analyze_binary(
        &mut self,
        binary_path: &Path,
        mode: &ObfuscationMode,
    ) -> Result<ReverseEngineeringMetrics, AnalysisError> {
        let binary_name = crate::util::binary_name(binary_path);
        log::info!("Analyzing {binary_name} (mode: {mode})");

        if !binary_path.is_file() {
            log::error!("Binary not found: {}", binary_path.display());
            return Err(AnalysisError::MissingBinary(binary_path.to_path_buf()));
        }

        let started = Instant::now();
        let file_size = std::fs::metadata(binary_path)?.len();

        let disassembly = self.disassembly(binary_path);
        let symbols = self.listing_or_empty(ListingKind::Symbols, binary_path);
        let dynamic_symbols = self.listing_or_empty(ListingKind::DynamicSymbols, binary_path);
        let section_headers = self.listing_or_empty(ListingKind::SectionHeaders, binary_path);
        let strings = self.listing_or_empty(ListingKind::Strings, binary_path);

        let raw = RawListings {
            disassembly: &disassembly,
            symbols: &symbols,
            dynamic_symbols: &dynamic_symbols,
            section_headers: &section_headers,
            strings: &strings,
        };
        let strategy = self.config.entropy_strategy;
        let analysis = panic::catch_unwind(AssertUnwindSafe(|| {
            analyze_listings(&raw, file_size, strategy)
        }))
        .map_err(|payload| {
            let message = panic_message(payload.as_ref());
            log::error!("Error during analysis of {binary_name}: {message}");
            AnalysisError::Internal(message)
        })?;

        let binary_sha256 = match crate::util::sha256_file(binary_path) {
            Ok(hash) => Some(hash),
            Err(e) => {
                log::warn!("Could not hash {}: {e:#}", binary_path.display());
                None
            }
        };

        let metrics = ReverseEngineeringMetrics {
            binary_name,
            obfuscation_mode: mode.as_str().to_string(),
            binary_sha256,
            static_analysis: analysis.static_analysis,
            symbol_analysis: analysis.symbol_analysis,
            string_analysis: analysis.string_analysis,
            disassembly_complexity: analysis.disassembly_complexity,
            control_flow_analysis: analysis.control_flow_analysis,
            data_flow_analysis: analysis.data_flow_analysis,
            anti_analysis: analysis.anti_analysis,
            decompilation: analysis.decompilation,
            score_breakdown: analysis.scores.breakdown,
            re_difficulty_score: analysis.scores.re_difficulty,
            security_score: analysis.scores.security,
            resilience_score: analysis.scores.resilience,
            estimated_re_hours_novice: analysis.time.novice_hours,
            estimated_re_hours_expert: analysis.time.expert_hours,
            analysis_time_seconds: started.elapsed().as_secs_f64(),
            analysis_timestamp: Utc::now().to_rfc3339(),
        };

        log::info!(
            "RE difficulty {:.1}/100, security {:.1}/100, resilience {:.1}/100, \
             expert {:.1}h, novice {:.1}h ({:.2}s)",
            metrics.re_difficulty_score,
            metrics.security_score,
            metrics.resilience_score,
            metrics.estimated_re_hours_expert,
            metrics.estimated_re_hours_novice,
            metrics.analysis_time_seconds
        );
        Ok(metrics)
    }

    fn disassembly(&mut self, binary: &Path) -> Arc<str> {
        let runner = &self.runner;
        self.cache
            .get_or_try_insert(binary, || runner.listing(ListingKind::Disassembly, binary))
            .unwrap_or_else(|e| {
                log::warn!("Disassembly failed: {e}");
                Arc::from("")
            })
    }

    fn listing_or_empty(&self, kind: ListingKind, binary: &Path) -> String {
        self.runner.listing(kind, binary).unwrap_or_else(|e| {
            log::warn!("{kind:?} listing unavailable: {e}");
            String::new()
        })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
