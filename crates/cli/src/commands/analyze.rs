use std::path::PathBuf;

use anyhow::{Context, Result};

use re_metrics_core::db::ResultsDb;
use re_metrics_core::model::ObfuscationMode;
use re_metrics_core::services::analysis::Evaluator;
use re_metrics_core::services::output::save_metrics;
use re_metrics_core::services::tools::FixtureToolRunner;

use crate::commands::util::{load_config, print_summary};

/// Options for `re-bench analyze`.
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    pub binary: PathBuf,
    pub mode: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub fixtures: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub db: Option<PathBuf>,
    pub json: bool,
}

/// Analyze one binary, save its metrics document and optionally record it.
pub fn analyze_command(args: &AnalyzeArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let output_dir =
        args.output_dir.clone().unwrap_or_else(|| PathBuf::from(&config.output_dir));

    let mode = match &args.mode {
        Some(mode) => ObfuscationMode::new(mode.as_str()),
        None => {
            let name = re_metrics_core::util::binary_name(&args.binary);
            ObfuscationMode::infer_from_file_name(&name)
        }
    };

    let mut evaluator = match &args.fixtures {
        Some(dir) => Evaluator::new(config, Box::new(FixtureToolRunner::new(dir))),
        None => Evaluator::with_system_tools(config),
    };

    let metrics = evaluator
        .analyze_binary(&args.binary, &mode)
        .with_context(|| format!("Failed to analyze {}", args.binary.display()))?;

    let path = save_metrics(&metrics, &output_dir)?;

    if let Some(db_path) = &args.db {
        let db = ResultsDb::open(db_path)
            .with_context(|| format!("Failed to open results database at {}", db_path.display()))?;
        let id = db.insert_result(&metrics).context("Failed to record analysis result")?;
        log::info!("Recorded run #{id} in {}", db_path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        print_summary(&metrics);
        println!();
        println!("Metrics written to {}", path.display());
    }
    Ok(())
}

/// Print the mode inferred from a file name.
pub fn infer_mode_command(name: &str) {
    println!("{}", ObfuscationMode::infer_from_file_name(name));
}
