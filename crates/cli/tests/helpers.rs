use std::fs;

use re_bench::load_config;
use re_metrics_core::analysis::entropy::EntropyStrategy;
use tempfile::tempdir;

#[test]
fn load_config_defaults_without_a_file() {
    let config = load_config(None).expect("default config");
    assert_eq!(config.entropy_strategy, EntropyStrategy::Shannon);
}

#[test]
fn load_config_reads_yaml_and_reports_bad_paths() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("re.yml");
    fs::write(&path, "entropy_strategy: legacy\n").expect("write config");
    let config = load_config(Some(path.as_path())).expect("load");
    assert_eq!(config.entropy_strategy, EntropyStrategy::Legacy);

    let missing = dir.path().join("missing.yaml");
    let err = load_config(Some(missing.as_path())).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to load config"));
}
