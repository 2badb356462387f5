//! The metrics document: one pretty-printed JSON file per analyzed binary.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::model::ReverseEngineeringMetrics;

/// `<binary_name>_<mode>_metrics.json`
pub fn metrics_file_name(metrics: &ReverseEngineeringMetrics) -> String {
    format!("{}_{}_metrics.json", metrics.binary_name, metrics.obfuscation_mode)
}

/// Write the metrics document into `output_dir`, creating it if needed.
pub fn save_metrics(metrics: &ReverseEngineeringMetrics, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir).with_context(|| {
        format!("Failed to create output dir: {}", output_dir.display())
    })?;
    let path = output_dir.join(metrics_file_name(metrics));
    let json = serde_json::to_string_pretty(metrics).context("Failed to serialize metrics")?;
    fs::write(&path, json)
        .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
    log::info!("Metrics saved to: {}", path.display());
    Ok(path)
}

pub fn load_metrics(path: &Path) -> Result<ReverseEngineeringMetrics> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("Failed to read metrics at {}", path.display()))?;
    serde_json::from_str(&body).context("Failed to parse metrics JSON")
}
