//! Result history database.
//!
//! Every finished analysis can be appended to a small SQLite file so that
//! runs across builds and modes can be compared later (`re-bench stats`).
//! The headline scores live in real columns for filtering; the full metrics
//! document is kept alongside as JSON.

mod results_db;

pub use results_db::{DbError, DbResult, ResultsDb, CURRENT_SCHEMA_VERSION};

/// One stored analysis run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StoredRun {
    pub id: i64,
    pub binary_name: String,
    pub mode: String,
    pub binary_sha256: Option<String>,
    pub re_difficulty: f64,
    pub security: f64,
    pub resilience: f64,
    pub expert_hours: f64,
    pub novice_hours: f64,
    pub analyzed_at: String,
}
