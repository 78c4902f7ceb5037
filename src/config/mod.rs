//! Configuration module for Scroll-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and reading credentials from the environment once at start-up.
//!
//! # Example
//!
//! ```no_run
//! use scroll_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Retrying metadata {} times", config.retry.max_attempts);
//! ```

mod credentials;
mod parser;
mod types;
mod validation;

// Re-export types
pub use credentials::{AirtableTarget, Credentials};
pub use types::{
    millis, BrowserConfig, Config, FieldConfig, MetadataConfig, MetadataProvider, RetryConfig,
    SearchConfig, SelectorConfig, SessionConfig, SinkConfig, SinkKind, TimingConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, load_or_default, parse_config,
};
