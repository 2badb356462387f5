use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::entropy::EntropyStrategy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("Failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// External tool names and timeouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub objdump: String,
    pub nm: String,
    pub readelf: String,
    pub strings: String,
    /// Full disassembly of large binaries can take a while.
    pub disassembly_timeout_secs: u64,
    /// Symbol, section and string listings.
    pub metadata_timeout_secs: u64,
    /// Version probes in [`crate::services::tools::detect_tools`].
    pub probe_timeout_secs: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            objdump: "objdump".to_string(),
            nm: "nm".to_string(),
            readelf: "readelf".to_string(),
            strings: "strings".to_string(),
            disassembly_timeout_secs: 60,
            metadata_timeout_secs: 10,
            probe_timeout_secs: 2,
        }
    }
}

impl ToolConfig {
    /// Configured program for a well-known tool name; other names pass through.
    pub fn program_for<'a>(&'a self, tool: &'a str) -> &'a str {
        match tool {
            "objdump" => &self.objdump,
            "nm" => &self.nm,
            "readelf" => &self.readelf,
            "strings" => &self.strings,
            other => other,
        }
    }
}

/// Serializable analyzer configuration.
///
/// Every field has a default, so a partial file is valid. Scoring
/// weights are deliberately absent: they are fixed in `analysis::scoring`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub entropy_strategy: EntropyStrategy,
    pub tools: ToolConfig,
    /// Where metric documents are written.
    pub output_dir: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            entropy_strategy: EntropyStrategy::default(),
            tools: ToolConfig::default(),
            output_dir: "./reverse_engineering/results".to_string(),
        }
    }
}

impl AnalyzerConfig {
    /// Load a config file; `.yaml`/`.yml` parse as YAML, everything else as JSON.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let body = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&body)?),
            _ => Ok(serde_json::from_str(&body)?),
        }
    }
}
