use std::path::Path;

use rusqlite::{params, Connection};
use thiserror::Error;

use crate::db::StoredRun;
use crate::model::ReverseEngineeringMetrics;

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Stored metrics document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The database was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },
}

pub type DbResult<T> = Result<T, DbError>;

/// SQLite-backed history of analysis runs.
#[derive(Debug)]
pub struct ResultsDb {
    conn: Connection,
}

impl ResultsDb {
    /// Open (or create) a results database and bring its schema up to date.
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory database, mostly for tests.
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Append one analysis result and return its row id.
    pub fn insert_result(&self, metrics: &ReverseEngineeringMetrics) -> DbResult<i64> {
        let document = serde_json::to_string(metrics)?;
        self.conn.execute(
            r#"
            INSERT INTO analysis_runs (
                binary_name, mode, binary_sha256, re_difficulty, security, resilience,
                expert_hours, novice_hours, analyzed_at, metrics_json
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                metrics.binary_name,
                metrics.obfuscation_mode,
                metrics.binary_sha256,
                metrics.re_difficulty_score,
                metrics.security_score,
                metrics.resilience_score,
                metrics.estimated_re_hours_expert,
                metrics.estimated_re_hours_novice,
                metrics.analysis_timestamp,
                document
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Summary rows, oldest first, optionally restricted to one mode.
    pub fn list_runs(&self, mode: Option<&str>) -> DbResult<Vec<StoredRun>> {
        fn map_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredRun> {
            Ok(StoredRun {
                id: row.get(0)?,
                binary_name: row.get(1)?,
                mode: row.get(2)?,
                binary_sha256: row.get(3)?,
                re_difficulty: row.get(4)?,
                security: row.get(5)?,
                resilience: row.get(6)?,
                expert_hours: row.get(7)?,
                novice_hours: row.get(8)?,
                analyzed_at: row.get(9)?,
            })
        }

        const COLUMNS: &str = "id, binary_name, mode, binary_sha256, re_difficulty, security, \
                               resilience, expert_hours, novice_hours, analyzed_at";
        let rows = match mode {
            Some(mode) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM analysis_runs WHERE mode = ?1 ORDER BY id"
                ))?;
                let rows = stmt.query_map(params![mode], map_run)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt =
                    self.conn.prepare(&format!("SELECT {COLUMNS} FROM analysis_runs ORDER BY id"))?;
                let rows = stmt.query_map([], map_run)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(rows)
    }

    /// Full metrics documents, oldest first, optionally restricted to one mode.
    pub fn list_results(&self, mode: Option<&str>) -> DbResult<Vec<ReverseEngineeringMetrics>> {
        let documents: Vec<String> = match mode {
            Some(mode) => {
                let mut stmt = self.conn.prepare(
                    "SELECT metrics_json FROM analysis_runs WHERE mode = ?1 ORDER BY id",
                )?;
                let rows = stmt.query_map(params![mode], |row| row.get(0))?;
                rows.collect::<Result<_, _>>()?
            }
            None => {
                let mut stmt =
                    self.conn.prepare("SELECT metrics_json FROM analysis_runs ORDER BY id")?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect::<Result<_, _>>()?
            }
        };

        let mut out = Vec::with_capacity(documents.len());
        for doc in documents {
            out.push(serde_json::from_str(&doc)?);
        }
        Ok(out)
    }

    /// Most recent run for a binary, if any.
    pub fn latest_result(&self, binary_name: &str) -> DbResult<Option<ReverseEngineeringMetrics>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT metrics_json FROM analysis_runs
            WHERE binary_name = ?1
            ORDER BY id DESC
            LIMIT 1
            "#,
        )?;
        let mut rows = stmt.query(params![binary_name])?;
        match rows.next()? {
            Some(row) => {
                let doc: String = row.get(0)?;
                Ok(Some(serde_json::from_str(&doc)?))
            }
            None => Ok(None),
        }
    }
}

/// Apply schema migrations using `PRAGMA user_version`.
///
/// Version map:
/// - 0: no schema
/// - 1: analysis_runs table
/// - 2: index on mode
fn apply_migrations(conn: &Connection) -> DbResult<()> {
    let mut current_version = current_schema_version(conn)?;

    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version == 0 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS analysis_runs (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                binary_name   TEXT NOT NULL,
                mode          TEXT NOT NULL,
                binary_sha256 TEXT,
                re_difficulty REAL NOT NULL,
                security      REAL NOT NULL,
                resilience    REAL NOT NULL,
                expert_hours  REAL NOT NULL,
                novice_hours  REAL NOT NULL,
                analyzed_at   TEXT NOT NULL,
                metrics_json  TEXT NOT NULL
            );

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
        current_version = 1;
    }

    if current_version < 2 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE INDEX IF NOT EXISTS idx_analysis_runs_mode ON analysis_runs(mode);
            PRAGMA user_version = 2;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

fn current_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}
