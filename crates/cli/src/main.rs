use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use re_bench::commands::{
    analyze_command, infer_mode_command, stats_command, tools_command, AnalyzeArgs,
};

/// Reverse-engineering difficulty benchmark.
///
/// A thin wrapper around `re-metrics-core` (`re_metrics_core` in code); all
/// measurement and scoring happens in the library.
#[derive(Parser, Debug)]
#[command(
    name = "re-bench",
    version,
    about = "Measure how hard a binary is to reverse engineer",
    long_about = None
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one binary and write its metrics document.
    Analyze {
        /// Path to the binary to analyze.
        binary: PathBuf,

        /// Obfuscation mode label. Inferred from the file name when omitted.
        #[arg(short, long)]
        mode: Option<String>,

        /// Directory for the metrics JSON. Defaults to the configured output dir.
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Read tool listings from this directory instead of running binutils.
        #[arg(long)]
        fixtures: Option<PathBuf>,

        /// Analyzer config file (.json, .yaml or .yml).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Also append the result to this results database.
        #[arg(long)]
        db: Option<PathBuf>,

        /// Print the metrics document to stdout instead of the summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Report which external analysis tools are installed.
    Tools {
        /// Analyzer config file providing tool program names.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Summarize stored results per obfuscation mode.
    Stats {
        /// Results database written by `analyze --db`.
        #[arg(long)]
        db: PathBuf,

        /// Only include results for this mode.
        #[arg(short, long)]
        mode: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print the obfuscation mode inferred from a binary file name.
    InferMode {
        /// File name such as `test_easy_maximum_security`.
        name: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Analyze { binary, mode, output_dir, fixtures, config, db, json } => {
            analyze_command(&AnalyzeArgs { binary, mode, output_dir, fixtures, config, db, json })?
        }
        Command::Tools { config, json } => tools_command(config.as_deref(), json)?,
        Command::Stats { db, mode, json } => stats_command(&db, mode.as_deref(), json)?,
        Command::InferMode { name } => infer_mode_command(&name),
    }

    Ok(())
}

/// Logs go to stderr so `--json` output on stdout stays machine-readable.
/// `RUST_LOG` still overrides the level chosen by `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .init();
}
