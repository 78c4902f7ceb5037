//! Database schema of the SQLite sink

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per scrape run
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    pages_visited INTEGER NOT NULL DEFAULT 0,
    listings_seen INTEGER NOT NULL DEFAULT 0,
    records_emitted INTEGER NOT NULL DEFAULT 0,
    records_skipped INTEGER NOT NULL DEFAULT 0,
    sink_failures INTEGER NOT NULL DEFAULT 0
);

-- Emitted job records
CREATE TABLE IF NOT EXISTS job_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    created_at TEXT NOT NULL,
    org_name TEXT,
    job_title TEXT,
    salary TEXT,
    location TEXT,
    date_posted TEXT,
    job_description TEXT NOT NULL,
    qualifications TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_job_records_run ON job_records(run_id);
CREATE INDEX IF NOT EXISTS idx_job_records_org ON job_records(org_name);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
