//! Adapters for the external listing tools (objdump, nm, readelf, strings).
//!
//! The analysis core never decodes machine code; it only consumes the text
//! these tools print. A [`ToolRunner`] produces each listing; failures are
//! reported as [`ToolError`] and the pipeline degrades the affected phase.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::config::ToolConfig;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),
    #[error("{tool} timed out after {seconds}s")]
    Timeout { tool: String, seconds: u64 },
    #[error("{tool} failed: {message}")]
    Failed { tool: String, message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The listings the analysis consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingKind {
    /// `objdump -d -M intel`
    Disassembly,
    /// `nm -C`
    Symbols,
    /// `nm -D`
    DynamicSymbols,
    /// `readelf -S`
    SectionHeaders,
    /// `strings -a`
    Strings,
}

impl ListingKind {
    pub const ALL: [ListingKind; 5] = [
        ListingKind::Disassembly,
        ListingKind::Symbols,
        ListingKind::DynamicSymbols,
        ListingKind::SectionHeaders,
        ListingKind::Strings,
    ];

    /// File name used by [`FixtureToolRunner`].
    pub fn fixture_file(self) -> &'static str {
        match self {
            ListingKind::Disassembly => "disasm.txt",
            ListingKind::Symbols => "nm.txt",
            ListingKind::DynamicSymbols => "nm_dynamic.txt",
            ListingKind::SectionHeaders => "sections.txt",
            ListingKind::Strings => "strings.txt",
        }
    }
}

/// Source of tool listings for one binary.
pub trait ToolRunner: Send + Sync {
    fn listing(&self, kind: ListingKind, binary: &Path) -> Result<String, ToolError>;
    fn name(&self) -> &'static str;
}

/// Runs the real binutils tools with per-listing timeouts.
#[derive(Debug, Clone, Default)]
pub struct SystemToolRunner {
    config: ToolConfig,
}

impl SystemToolRunner {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    fn command_for(&self, kind: ListingKind) -> (&str, Vec<&'static str>, u64) {
        let c = &self.config;
        match kind {
            ListingKind::Disassembly => {
                (c.objdump.as_str(), vec!["-d", "-M", "intel"], c.disassembly_timeout_secs)
            }
            ListingKind::Symbols => (c.nm.as_str(), vec!["-C"], c.metadata_timeout_secs),
            ListingKind::DynamicSymbols => (c.nm.as_str(), vec!["-D"], c.metadata_timeout_secs),
            ListingKind::SectionHeaders => (c.readelf.as_str(), vec!["-S"], c.metadata_timeout_secs),
            ListingKind::Strings => (c.strings.as_str(), vec!["-a"], c.metadata_timeout_secs),
        }
    }
}

impl ToolRunner for SystemToolRunner {
    fn listing(&self, kind: ListingKind, binary: &Path) -> Result<String, ToolError> {
        let (program, args, timeout) = self.command_for(kind);
        let mut cmd = Command::new(program);
        cmd.args(args).arg(binary);
        // Listing tools print partial output with non-zero status for some
        // inputs (e.g. nm on a stripped binary); stdout is kept either way.
        run_with_timeout(cmd, program, Duration::from_secs(timeout)).map(|out| out.stdout)
    }

    fn name(&self) -> &'static str {
        "system"
    }
}

/// Serves listings captured earlier from files in a directory.
///
/// Useful for tests and for re-scoring archived listings without the tools
/// installed. A missing file behaves like an unavailable tool.
#[derive(Debug, Clone)]
pub struct FixtureToolRunner {
    dir: PathBuf,
}

impl FixtureToolRunner {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ToolRunner for FixtureToolRunner {
    fn listing(&self, kind: ListingKind, _binary: &Path) -> Result<String, ToolError> {
        let path = self.dir.join(kind.fixture_file());
        if !path.is_file() {
            return Err(ToolError::NotFound(path.display().to_string()));
        }
        Ok(fs::read_to_string(path)?)
    }

    fn name(&self) -> &'static str {
        "fixtures"
    }
}

/// Captured output of a finished process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status_code: Option<i32>,
    pub stdout: String,
}

/// Spawn `cmd`, collect stdout, and kill it if it outlives `timeout`.
pub fn run_with_timeout(
    mut cmd: Command,
    tool: &str,
    timeout: Duration,
) -> Result<ProcessOutput, ToolError> {
    let mut child = cmd.stdout(Stdio::piped()).stderr(Stdio::null()).spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ToolError::NotFound(tool.to_string())
        } else {
            ToolError::Failed { tool: tool.to_string(), message: format!("failed to spawn: {e}") }
        }
    })?;

    let mut stdout = child.stdout.take().ok_or_else(|| ToolError::Failed {
        tool: tool.to_string(),
        message: "stdout was not captured".to_string(),
    })?;
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let res = stdout.read_to_end(&mut buf).map(|_| buf);
        let _ = tx.send(res);
    });

    match rx.recv_timeout(timeout) {
        Ok(read) => {
            let bytes = read?;
            let status = child.wait()?;
            Ok(ProcessOutput {
                status_code: status.code(),
                stdout: String::from_utf8_lossy(&bytes).to_string(),
            })
        }
        Err(_) => {
            let _ = child.kill();
            let _ = child.wait();
            Err(ToolError::Timeout { tool: tool.to_string(), seconds: timeout.as_secs() })
        }
    }
}

/// Availability of one external tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolStatus {
    pub name: String,
    pub essential: bool,
    pub available: bool,
}

pub const ESSENTIAL_TOOLS: [(&str, &str); 6] = [
    ("objdump", "--version"),
    ("readelf", "--version"),
    ("nm", "--version"),
    ("strings", "--version"),
    ("file", "--version"),
    ("size", "--version"),
];
pub const ADVANCED_TOOLS: [(&str, &str); 2] = [("r2", "-v"), ("gdb", "--version")];

/// Probe every known tool with its version flag.
///
/// A tool counts as available when it exits with status 0 or 1; several
/// binutils builds return 1 for `--version`.
pub fn detect_tools(config: &ToolConfig) -> Vec<ToolStatus> {
    let timeout = Duration::from_secs(config.probe_timeout_secs);
    let essential = ESSENTIAL_TOOLS.iter().map(|(name, flag)| (*name, *flag, true));
    let advanced = ADVANCED_TOOLS.iter().map(|(name, flag)| (*name, *flag, false));

    essential
        .chain(advanced)
        .map(|(name, flag, essential)| {
            let program = config.program_for(name);
            let mut cmd = Command::new(program);
            cmd.arg(flag);
            let available = matches!(
                run_with_timeout(cmd, program, timeout),
                Ok(ProcessOutput { status_code: Some(0 | 1), .. })
            );
            ToolStatus { name: name.to_string(), essential, available }
        })
        .collect()
}
