use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use re_metrics_core::analysis::stats::{improvement_over_baseline, summarize_by_mode, ModeSummary};
use re_metrics_core::db::ResultsDb;

#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub total_runs: usize,
    pub summary: ModeSummary,
    /// test name -> mode -> percent change of RE difficulty vs. baseline
    pub improvement_over_baseline: BTreeMap<String, BTreeMap<String, f64>>,
}

/// Summarize stored results per mode and against each test's baseline.
pub fn stats_command(db_path: &Path, mode: Option<&str>, json: bool) -> Result<()> {
    if !db_path.is_file() {
        anyhow::bail!("Results database not found at {}", db_path.display());
    }
    let db = ResultsDb::open(db_path)
        .with_context(|| format!("Failed to open results database at {}", db_path.display()))?;
    let results = db.list_results(mode).context("Failed to load stored results")?;

    let report = StatsReport {
        total_runs: results.len(),
        summary: summarize_by_mode(&results),
        improvement_over_baseline: improvement_over_baseline(&results),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.total_runs == 0 {
        println!("Results: (none)");
        return Ok(());
    }

    println!("Results: {} run(s)", report.total_runs);
    for (kind, per_mode) in &report.summary {
        println!();
        println!("{kind:?}:");
        for (mode, s) in per_mode {
            println!(
                "  {mode}: mean {:.2}, median {:.2}, stdev {:.2}, min {:.2}, max {:.2} (n={})",
                s.mean, s.median, s.stdev, s.min, s.max, s.count
            );
        }
    }

    if !report.improvement_over_baseline.is_empty() {
        println!();
        println!("RE difficulty vs. baseline:");
        for (test, modes) in &report.improvement_over_baseline {
            for (mode, pct) in modes {
                println!("  {test} [{mode}]: {pct:+.1}%");
            }
        }
    }
    Ok(())
}
