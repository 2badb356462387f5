use std::fs;
use std::path::{Path, PathBuf};

use re_metrics_core::config::AnalyzerConfig;
use re_metrics_core::model::ObfuscationMode;
use re_metrics_core::services::analysis::{AnalysisError, Evaluator};
use re_metrics_core::services::output::{load_metrics, metrics_file_name, save_metrics};
use re_metrics_core::services::tools::{FixtureToolRunner, ListingKind, ToolError, ToolRunner};
use tempfile::tempdir;

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample")
}

fn fake_binary(dir: &Path, name: &str, size: usize) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, vec![0x90u8; size]).expect("write binary");
    path
}

fn fixture_evaluator() -> Evaluator {
    Evaluator::new(AnalyzerConfig::default(), Box::new(FixtureToolRunner::new(fixture_dir())))
}

/// Fails every listing, as if no binutils were installed.
struct NoTools;

impl ToolRunner for NoTools {
    fn listing(&self, kind: ListingKind, _binary: &Path) -> Result<String, ToolError> {
        Err(ToolError::NotFound(format!("{kind:?}")))
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

#[test]
fn fixture_listings_produce_expected_metrics() {
    let dir = tempdir().expect("tempdir");
    let binary = fake_binary(dir.path(), "sample_normal", 20_000);
    let mut evaluator = fixture_evaluator();

    let mode = ObfuscationMode::infer_from_file_name("sample_normal");
    let m = evaluator.analyze_binary(&binary, &mode).expect("analysis");

    assert_eq!(m.binary_name, "sample_normal");
    assert_eq!(m.obfuscation_mode, "normal");
    assert_eq!(m.binary_sha256.as_deref().map(str::len), Some(64));

    let s = &m.static_analysis;
    assert_eq!(s.file_size, 20_000);
    assert_eq!(s.num_instructions, 17);
    assert_eq!(s.num_functions, 2);
    assert_eq!(s.num_basic_blocks, 5);
    assert_eq!(s.num_conditional_branches, 2);
    assert_eq!(s.num_unconditional_jumps, 3);
    assert_eq!(s.num_control_flow_edges, 7);
    assert_eq!(s.cyclomatic_complexity, 6.0);

    assert_eq!(m.control_flow_analysis.num_opaque_predicates, 1);
    assert_eq!(m.control_flow_analysis.cfg_nodes, 4);
    assert_eq!(m.control_flow_analysis.cfg_edges, 3);

    assert_eq!(m.symbol_analysis.num_symbols, 4);
    assert!(!m.symbol_analysis.symbols_present);
    assert_eq!(m.symbol_analysis.num_dynamic_symbols, 2);
    assert_eq!(m.symbol_analysis.num_debug_symbols, 1);

    assert_eq!(m.string_analysis.num_total_strings, 5);
    assert_eq!(m.string_analysis.num_encrypted_strings, 0);

    assert!(!m.anti_analysis.packing_detected);
    assert!((20.0..=100.0).contains(&m.re_difficulty_score));
    assert!(m.estimated_re_hours_novice > m.estimated_re_hours_expert);
    assert!(chrono::DateTime::parse_from_rfc3339(&m.analysis_timestamp).is_ok());
}

#[test]
fn repeated_analysis_is_idempotent() {
    let dir = tempdir().expect("tempdir");
    let binary = fake_binary(dir.path(), "sample_baseline", 4096);
    let mut evaluator = fixture_evaluator();
    let mode = ObfuscationMode::new(ObfuscationMode::BASELINE);

    let mut first = evaluator.analyze_binary(&binary, &mode).expect("first run");
    assert_eq!(evaluator.cache().len(), 1);
    let mut second = evaluator.analyze_binary(&binary, &mode).expect("second run");
    assert_eq!(evaluator.cache().len(), 1);

    evaluator.reset_cache();
    assert!(evaluator.cache().is_empty());
    let mut third = evaluator.analyze_binary(&binary, &mode).expect("third run");

    for m in [&mut first, &mut second, &mut third] {
        m.analysis_time_seconds = 0.0;
        m.analysis_timestamp.clear();
    }
    assert_eq!(first, second);
    assert_eq!(first, third);
}

#[test]
fn missing_binary_is_fatal() {
    let dir = tempdir().expect("tempdir");
    let mut evaluator = fixture_evaluator();
    let missing = dir.path().join("does_not_exist");

    let err = evaluator.analyze_binary(&missing, &ObfuscationMode::default()).unwrap_err();
    assert!(matches!(err, AnalysisError::MissingBinary(ref p) if p == &missing));
    assert!(err.to_string().contains("does_not_exist"));
    assert!(evaluator.cache().is_empty());
}

#[test]
fn unavailable_tools_degrade_to_empty_bundles() {
    let dir = tempdir().expect("tempdir");
    let binary = fake_binary(dir.path(), "stripped", 1024);
    let mut evaluator = Evaluator::new(AnalyzerConfig::default(), Box::new(NoTools));

    let m = evaluator.analyze_binary(&binary, &ObfuscationMode::default()).expect("analysis");
    assert_eq!(m.obfuscation_mode, "unknown");
    assert_eq!(m.static_analysis.num_instructions, 0);
    assert_eq!(m.static_analysis.file_size, 1024);
    assert_eq!(m.symbol_analysis.num_symbols, 0);
    assert_eq!(m.string_analysis.num_total_strings, 0);
    assert_eq!(m.re_difficulty_score, 20.0);
    // Failed disassembly is not cached.
    assert!(evaluator.cache().is_empty());
}

#[test]
fn partial_fixtures_only_affect_their_phase() {
    let dir = tempdir().expect("tempdir");
    let listings = dir.path().join("listings");
    fs::create_dir_all(&listings).expect("mkdir");
    fs::copy(fixture_dir().join("disasm.txt"), listings.join("disasm.txt")).expect("copy");
    let binary = fake_binary(dir.path(), "partial", 512);

    let mut evaluator =
        Evaluator::new(AnalyzerConfig::default(), Box::new(FixtureToolRunner::new(&listings)));
    let m = evaluator.analyze_binary(&binary, &ObfuscationMode::default()).expect("analysis");
    assert_eq!(m.static_analysis.num_instructions, 17);
    assert_eq!(m.symbol_analysis.num_symbols, 0);
    assert_eq!(m.string_analysis.num_total_strings, 0);
}

#[test]
fn metrics_document_round_trips_through_disk() {
    let dir = tempdir().expect("tempdir");
    let binary = fake_binary(dir.path(), "sample_maximum_security", 8192);
    let mut evaluator = fixture_evaluator();
    let mode = ObfuscationMode::infer_from_file_name("sample_maximum_security");
    let m = evaluator.analyze_binary(&binary, &mode).expect("analysis");

    let out_dir = dir.path().join("results");
    let path = save_metrics(&m, &out_dir).expect("save");
    assert_eq!(metrics_file_name(&m), "sample_maximum_security_maximum_security_metrics.json");
    assert_eq!(path, out_dir.join(metrics_file_name(&m)));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
    for key in [
        "binary_name",
        "obfuscation_mode",
        "static_analysis",
        "symbol_analysis",
        "string_analysis",
        "disassembly_complexity",
        "control_flow_analysis",
        "data_flow_analysis",
        "anti_analysis",
        "decompilation",
        "re_difficulty_score",
        "security_score",
        "resilience_score",
        "estimated_re_hours_novice",
        "estimated_re_hours_expert",
        "analysis_time_seconds",
        "analysis_timestamp",
    ] {
        assert!(json.get(key).is_some(), "missing key {key}");
    }

    assert_eq!(load_metrics(&path).expect("load"), m);
}
