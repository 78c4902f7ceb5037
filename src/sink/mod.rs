//! Record sinks
//!
//! A sink receives every emitted [`JobRecord`] individually, as soon as it is
//! assembled. Two backends exist:
//! - [`AirtableSink`] creates one row per record through the Airtable REST API
//! - [`SqliteSink`] stores records in a local database, together with run
//!   bookkeeping used by `--stats`
//!
//! Sinks are at-least-once targets: the engine never retries or deduplicates
//! a failed `create`.

mod airtable;
mod schema;
mod sqlite;

pub use airtable::AirtableSink;
pub use sqlite::{RunRecord, RunStatus, SqliteSink};

use crate::config::{Config, Credentials, SinkKind};
use crate::engine::RunSummary;
use crate::record::JobRecord;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors reported by record sinks
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Record rejected (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid sink endpoint: {0}")]
    Endpoint(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Destination of emitted records
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Short backend name for log lines
    fn name(&self) -> &str;

    /// Stores one record
    async fn create(&self, record: &JobRecord) -> SinkResult<()>;

    /// Called once after the run with its final counters
    async fn finish(&self, _summary: &RunSummary) -> SinkResult<()> {
        Ok(())
    }
}

/// Builds the sink selected in the configuration
///
/// # Arguments
///
/// * `config` - The loaded configuration
/// * `credentials` - Environment credentials (Airtable only)
/// * `config_hash` - Hash of the configuration, recorded with SQLite runs
pub fn build_sink(
    config: &Config,
    credentials: &Credentials,
    config_hash: &str,
) -> Result<Box<dyn RecordSink>, crate::HarvestError> {
    match config.sink.kind {
        SinkKind::Airtable => {
            let target = credentials.require_airtable()?;
            let sink = AirtableSink::new(&config.sink.airtable_endpoint, &target)?;
            Ok(Box::new(sink))
        }
        SinkKind::Sqlite => {
            let sink = SqliteSink::open(Path::new(&config.sink.database_path), config_hash)?;
            Ok(Box::new(sink))
        }
    }
}
