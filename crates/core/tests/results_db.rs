use re_metrics_core::analysis::stats::{improvement_over_baseline, summarize_by_mode, ScoreKind};
use re_metrics_core::analysis::decompile;
use re_metrics_core::db::{DbError, ResultsDb, CURRENT_SCHEMA_VERSION};
use re_metrics_core::model::{
    AntiAnalysisMetrics, ControlFlowAnalysisMetrics, DataFlowAnalysisMetrics,
    DisassemblyComplexityMetrics, ReverseEngineeringMetrics, ScoreBreakdown,
    StaticAnalysisMetrics, StringAnalysisMetrics, SymbolAnalysisMetrics,
};
use rusqlite::Connection;
use tempfile::tempdir;

fn result(binary: &str, mode: &str, re_difficulty: f64) -> ReverseEngineeringMetrics {
    ReverseEngineeringMetrics {
        binary_name: binary.to_string(),
        obfuscation_mode: mode.to_string(),
        binary_sha256: None,
        static_analysis: StaticAnalysisMetrics::default(),
        symbol_analysis: SymbolAnalysisMetrics::default(),
        string_analysis: StringAnalysisMetrics::default(),
        disassembly_complexity: DisassemblyComplexityMetrics::default(),
        control_flow_analysis: ControlFlowAnalysisMetrics::default(),
        data_flow_analysis: DataFlowAnalysisMetrics::default(),
        anti_analysis: AntiAnalysisMetrics::default(),
        decompilation: decompile::estimate(0),
        score_breakdown: ScoreBreakdown::default(),
        re_difficulty_score: re_difficulty,
        security_score: re_difficulty / 2.0,
        resilience_score: re_difficulty / 4.0,
        estimated_re_hours_novice: 4.0,
        estimated_re_hours_expert: 1.0,
        analysis_time_seconds: 0.1,
        analysis_timestamp: "2024-01-01T00:00:00+00:00".to_string(),
    }
}

#[test]
fn results_round_trip_and_filter_by_mode() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("results.db");

    {
        let db = ResultsDb::open(&db_path).expect("open db");
        let version: i32 = db
            .connection()
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .expect("schema version");
        assert_eq!(version, CURRENT_SCHEMA_VERSION);

        let id = db.insert_result(&result("test_easy_baseline", "baseline", 25.0)).expect("insert");
        assert!(id > 0);
        db.insert_result(&result("test_easy_normal", "normal", 50.0)).expect("insert");
        db.insert_result(&result("test_hard_normal", "normal", 70.0)).expect("insert");
    }

    let db = ResultsDb::open(&db_path).expect("re-open db");
    let all = db.list_results(None).expect("list");
    assert_eq!(all.len(), 3);
    assert_eq!(all[0], result("test_easy_baseline", "baseline", 25.0));

    let normal = db.list_runs(Some("normal")).expect("list runs");
    assert_eq!(normal.len(), 2);
    assert_eq!(normal[0].binary_name, "test_easy_normal");
    assert_eq!(normal[1].re_difficulty, 70.0);
    assert!(db.list_results(Some("maximum_security")).expect("list").is_empty());

    let latest = db.latest_result("test_hard_normal").expect("latest").expect("present");
    assert_eq!(latest.re_difficulty_score, 70.0);
    assert!(db.latest_result("nope").expect("latest").is_none());
}

#[test]
fn newer_schema_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("future.db");
    {
        let conn = Connection::open(&db_path).expect("open raw");
        conn.execute_batch("PRAGMA user_version = 99;").expect("bump version");
    }
    match ResultsDb::open(&db_path) {
        Err(DbError::UnsupportedSchemaVersion { found, max_supported, .. }) => {
            assert_eq!(found, 99);
            assert_eq!(max_supported, CURRENT_SCHEMA_VERSION);
        }
        other => panic!("expected unsupported schema error, got {other:?}"),
    }
}

#[test]
fn stored_results_feed_mode_statistics() {
    let db = ResultsDb::open_in_memory().expect("open db");
    for (binary, mode, score) in [
        ("test_easy_baseline", "baseline", 20.0),
        ("test_easy_normal", "normal", 30.0),
        ("test_easy_maximum_security", "maximum_security", 60.0),
        ("test_hard_baseline", "baseline", 40.0),
        ("test_hard_normal", "normal", 50.0),
        ("orphan_normal", "normal", 70.0),
    ] {
        db.insert_result(&result(binary, mode, score)).expect("insert");
    }
    let results = db.list_results(None).expect("list");

    let summary = summarize_by_mode(&results);
    let re = &summary[&ScoreKind::ReDifficultyScore];
    assert_eq!(re["baseline"].mean, 30.0);
    assert_eq!(re["normal"].count, 3);
    assert_eq!(re["normal"].median, 50.0);
    assert_eq!(re["maximum_security"].stdev, 0.0);
    assert_eq!(summary[&ScoreKind::SecurityScore]["baseline"].mean, 15.0);

    let improvement = improvement_over_baseline(&results);
    assert_eq!(improvement.len(), 2, "tests without a baseline are skipped");
    assert_eq!(improvement["test_easy"]["normal"], 50.0);
    assert_eq!(improvement["test_easy"]["maximum_security"], 200.0);
    assert_eq!(improvement["test_hard"]["normal"], 25.0);
}
