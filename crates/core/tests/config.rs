use std::fs;

use re_metrics_core::analysis::entropy::EntropyStrategy;
use re_metrics_core::config::{AnalyzerConfig, ConfigError};
use tempfile::tempdir;

#[test]
fn defaults_match_documented_values() {
    let config = AnalyzerConfig::default();
    assert_eq!(config.entropy_strategy, EntropyStrategy::Shannon);
    assert_eq!(config.tools.objdump, "objdump");
    assert_eq!(config.tools.disassembly_timeout_secs, 60);
    assert_eq!(config.tools.metadata_timeout_secs, 10);
    assert_eq!(config.output_dir, "./reverse_engineering/results");
}

#[test]
fn partial_yaml_and_json_fill_in_defaults() {
    let dir = tempdir().expect("tempdir");

    let yaml = dir.path().join("analyzer.yaml");
    fs::write(&yaml, "entropy_strategy: legacy\ntools:\n  objdump: llvm-objdump\n").expect("write");
    let config = AnalyzerConfig::load(&yaml).expect("load yaml");
    assert_eq!(config.entropy_strategy, EntropyStrategy::Legacy);
    assert_eq!(config.tools.objdump, "llvm-objdump");
    assert_eq!(config.tools.nm, "nm");
    assert_eq!(config.tools.program_for("objdump"), "llvm-objdump");
    assert_eq!(config.tools.program_for("gdb"), "gdb");

    let json = dir.path().join("analyzer.json");
    fs::write(&json, r#"{"output_dir": "out", "tools": {"metadata_timeout_secs": 3}}"#)
        .expect("write");
    let config = AnalyzerConfig::load(&json).expect("load json");
    assert_eq!(config.output_dir, "out");
    assert_eq!(config.tools.metadata_timeout_secs, 3);
    assert_eq!(config.tools.disassembly_timeout_secs, 60);
    assert_eq!(config.entropy_strategy, EntropyStrategy::Shannon);
}

#[test]
fn load_errors_are_typed() {
    let dir = tempdir().expect("tempdir");
    assert!(matches!(
        AnalyzerConfig::load(&dir.path().join("missing.json")),
        Err(ConfigError::Read { .. })
    ));

    let bad = dir.path().join("bad.json");
    fs::write(&bad, "{ not json").expect("write");
    assert!(matches!(AnalyzerConfig::load(&bad), Err(ConfigError::Json(_))));

    let bad_yaml = dir.path().join("bad.yml");
    fs::write(&bad_yaml, "entropy_strategy: [nope").expect("write");
    assert!(matches!(AnalyzerConfig::load(&bad_yaml), Err(ConfigError::Yaml(_))));
}
