//! Scroll-Harvest: an incremental job-listing extractor
//!
//! This crate walks a paginated, infinite-scroll listing surface, extracts a
//! structured record for every listing and pushes each record to a sink.
//!
//! The traversal engine lives in [`engine`] and only talks to its
//! collaborators through traits:
//! - [`surface::Surface`] for the rendered page
//! - [`query::MetadataQuery`] for the per-listing metadata lookup
//! - [`sink::RecordSink`] for emitted records

pub mod config;
pub mod engine;
pub mod output;
pub mod query;
pub mod record;
pub mod session;
pub mod sink;
pub mod state;
pub mod surface;

use thiserror::Error;

/// Main error type for Scroll-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Surface error: {0}")]
    Surface(#[from] surface::SurfaceError),

    #[error("Metadata query error: {0}")]
    Query(#[from] query::QueryError),

    #[error("Sink error: {0}")]
    Sink(#[from] sink::SinkError),

    #[error("Session error: {0}")]
    Session(#[from] session::SessionError),

    #[error("Search bootstrap failed: {0}")]
    Search(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing environment variable: {0}")]
    MissingEnv(String),
}

/// Result type alias for Scroll-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, Credentials};
pub use engine::{Orchestrator, Outcome, RunSummary, SkipReason};
pub use record::JobRecord;
pub use state::{PageState, PaginationState, ScrollState};
