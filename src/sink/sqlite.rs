//! SQLite record sink
//!
//! Stores every record in a local database and keeps one `runs` row per
//! scrape with the configuration hash and the final counters.

use super::schema::initialize_schema;
use super::{RecordSink, SinkError, SinkResult};
use crate::engine::RunSummary;
use crate::record::JobRecord;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Status of a scrape run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Represents a scrape run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub pages_visited: u64,
    pub listings_seen: u64,
    pub records_emitted: u64,
    pub records_skipped: u64,
    pub sink_failures: u64,
}

/// SQLite sink backend
pub struct SqliteSink {
    conn: Mutex<Connection>,
    run_id: i64,
}

impl SqliteSink {
    /// Opens (or creates) the database and starts a new run
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `config_hash` - Hash of the configuration used for this run
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteSink)` - Successfully opened database with a fresh run
    /// * `Err(SinkError)` - Failed to open database
    pub fn open(path: &Path, config_hash: &str) -> SinkResult<Self> {
        let conn = Self::connect(path)?;
        Self::start_run(conn, config_hash)
    }

    /// Opens an existing database for statistics, without starting a run
    pub fn open_for_stats(path: &Path) -> SinkResult<Self> {
        if !path.exists() {
            return Err(SinkError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("database {} does not exist", path.display()),
            )));
        }
        let conn = Self::connect(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
            run_id: 0,
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory(config_hash: &str) -> SinkResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Self::start_run(conn, config_hash)
    }

    fn connect(path: &Path) -> SinkResult<Connection> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;
        initialize_schema(&conn)?;
        Ok(conn)
    }

    fn start_run(conn: Connection, config_hash: &str) -> SinkResult<Self> {
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        let run_id = conn.last_insert_rowid();
        tracing::info!("Started run {}", run_id);

        Ok(Self {
            conn: Mutex::new(conn),
            run_id,
        })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    fn lock(&self) -> SinkResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| SinkError::LockPoisoned)
    }

    // ===== Queries used by statistics =====

    pub fn count_records(&self) -> SinkResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM job_records", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn count_records_with_qualifications(&self) -> SinkResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM job_records WHERE qualifications <> ''",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn count_runs(&self) -> SinkResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Organizations with the most records, most frequent first
    pub fn top_organizations(&self, limit: usize) -> SinkResult<Vec<(String, u64)>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT org_name, COUNT(*) AS n FROM job_records
             WHERE org_name IS NOT NULL
             GROUP BY org_name ORDER BY n DESC, org_name ASC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;

        let mut organizations = Vec::new();
        for row in rows {
            organizations.push(row?);
        }
        Ok(organizations)
    }

    /// Most recent completed run
    pub fn latest_completed_run(&self) -> SinkResult<Option<RunRecord>> {
        let conn = self.lock()?;
        let run = conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status, pages_visited,
                 listings_seen, records_emitted, records_skipped, sink_failures
                 FROM runs WHERE status = ?1 ORDER BY id DESC LIMIT 1",
                params![RunStatus::Completed.to_db_string()],
                |row| {
                    Ok(RunRecord {
                        id: row.get(0)?,
                        started_at: row.get(1)?,
                        finished_at: row.get(2)?,
                        config_hash: row.get(3)?,
                        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                            .unwrap_or(RunStatus::Running),
                        pages_visited: row.get::<_, i64>(5)? as u64,
                        listings_seen: row.get::<_, i64>(6)? as u64,
                        records_emitted: row.get::<_, i64>(7)? as u64,
                        records_skipped: row.get::<_, i64>(8)? as u64,
                        sink_failures: row.get::<_, i64>(9)? as u64,
                    })
                },
            )
            .optional()?;
        Ok(run)
    }
}

#[async_trait]
impl RecordSink for SqliteSink {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn create(&self, record: &JobRecord) -> SinkResult<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO job_records (run_id, created_at, org_name, job_title, salary, location,
             date_posted, job_description, qualifications)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                self.run_id,
                now,
                record.org_name,
                record.job_title,
                record.salary,
                record.location,
                record.date_posted,
                record.job_description,
                record.qualifications,
            ],
        )?;
        Ok(())
    }

    async fn finish(&self, summary: &RunSummary) -> SinkResult<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, pages_visited = ?3,
             listings_seen = ?4, records_emitted = ?5, records_skipped = ?6, sink_failures = ?7
             WHERE id = ?8",
            params![
                RunStatus::Completed.to_db_string(),
                now,
                summary.pages_visited as i64,
                summary.listings_seen as i64,
                summary.records_emitted as i64,
                summary.total_skipped() as i64,
                summary.sink_failures as i64,
                self.run_id,
            ],
        )?;
        tracing::info!("Completed run {}", self.run_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SkipReason;
    use tempfile::TempDir;

    fn record(org: Option<&str>, qualifications: &str) -> JobRecord {
        JobRecord {
            org_name: org.map(str::to_string),
            job_title: Some("Analyst".to_string()),
            job_description: "Description".to_string(),
            qualifications: qualifications.to_string(),
            ..JobRecord::default()
        }
    }

    #[test]
    fn test_run_status_roundtrip() {
        for status in [RunStatus::Running, RunStatus::Completed] {
            assert_eq!(RunStatus::from_db_string(status.to_db_string()), Some(status));
        }
        assert_eq!(RunStatus::from_db_string("invalid"), None);
    }

    #[tokio::test]
    async fn test_create_and_count() {
        let sink = SqliteSink::new_in_memory("hash").unwrap();
        sink.create(&record(Some("Acme"), "SQL")).await.unwrap();
        sink.create(&record(Some("Acme"), "")).await.unwrap();
        sink.create(&record(Some("Globex"), "Python")).await.unwrap();
        sink.create(&record(None, "")).await.unwrap();

        assert_eq!(sink.count_records().unwrap(), 4);
        assert_eq!(sink.count_records_with_qualifications().unwrap(), 2);
        assert_eq!(
            sink.top_organizations(5).unwrap(),
            vec![("Acme".to_string(), 2), ("Globex".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn test_finish_completes_run() {
        let sink = SqliteSink::new_in_memory("abc123").unwrap();
        assert!(sink.latest_completed_run().unwrap().is_none());

        let mut summary = RunSummary {
            pages_visited: 2,
            listings_seen: 6,
            records_emitted: 5,
            ..RunSummary::default()
        };
        summary.record_skip(&SkipReason::TitleMissing);
        sink.finish(&summary).await.unwrap();

        let run = sink.latest_completed_run().unwrap().unwrap();
        assert_eq!(run.id, sink.run_id());
        assert_eq!(run.config_hash, "abc123");
        assert_eq!(run.status, RunStatus::Completed);
        assert!(run.finished_at.is_some());
        assert_eq!(run.records_emitted, 5);
        assert_eq!(run.records_skipped, 1);
    }

    #[tokio::test]
    async fn test_reopen_keeps_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobs.db");

        {
            let sink = SqliteSink::open(&path, "hash").unwrap();
            sink.create(&record(Some("Acme"), "SQL")).await.unwrap();
        }

        let stats = SqliteSink::open_for_stats(&path).unwrap();
        assert_eq!(stats.count_records().unwrap(), 1);
        assert_eq!(stats.count_runs().unwrap(), 1);
    }

    #[test]
    fn test_stats_on_missing_database() {
        let dir = TempDir::new().unwrap();
        let result = SqliteSink::open_for_stats(&dir.path().join("absent.db"));
        assert!(matches!(result, Err(SinkError::Io(_))));
    }
}
