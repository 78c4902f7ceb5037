use crate::config::types::{
    Config, MetadataConfig, RetryConfig, SelectorConfig, SinkConfig, SinkKind, TimingConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_http_url("search.start-url", &config.search.start_url)?;
    validate_non_empty("search.input-selector", &config.search.input_selector)?;
    validate_http_url("session.login-url", &config.session.login_url)?;
    validate_non_empty("session.path", &config.session.path)?;
    validate_selectors(&config.selectors)?;
    validate_timing(&config.timing)?;
    validate_retry(&config.retry)?;
    validate_metadata(&config.metadata)?;
    validate_sink(&config.sink)?;
    Ok(())
}

/// Validates that a URL parses and uses http(s)
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}

fn validate_non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}

/// Validates selector configuration
fn validate_selectors(selectors: &SelectorConfig) -> Result<(), ConfigError> {
    for (field, value) in [
        ("selectors.listing-container", &selectors.listing_container),
        ("selectors.listing-item", &selectors.listing_item),
        ("selectors.details-card", &selectors.details_card),
        ("selectors.title", &selectors.title),
        ("selectors.description-container", &selectors.description_container),
        ("selectors.current-page", &selectors.current_page),
        ("selectors.page-control", &selectors.page_control),
    ] {
        validate_non_empty(field, value)?;
    }
    Ok(())
}

/// Validates timing configuration
fn validate_timing(timing: &TimingConfig) -> Result<(), ConfigError> {
    if timing.description_scroll_increment == 0 {
        return Err(ConfigError::Validation(
            "timing.description-scroll-increment must be > 0".to_string(),
        ));
    }

    if timing.listing_scroll_increment == 0 {
        return Err(ConfigError::Validation(
            "timing.listing-scroll-increment must be > 0".to_string(),
        ));
    }

    if timing.stagnant_polls == 0 {
        return Err(ConfigError::Validation(
            "timing.stagnant-polls must be >= 1".to_string(),
        ));
    }

    if timing.max_stabilization_polls < timing.stagnant_polls {
        return Err(ConfigError::Validation(format!(
            "timing.max-stabilization-polls ({}) must be >= timing.stagnant-polls ({})",
            timing.max_stabilization_polls, timing.stagnant_polls
        )));
    }

    for (field, value) in [
        ("timing.details-timeout-ms", timing.details_timeout_ms),
        ("timing.title-timeout-ms", timing.title_timeout_ms),
        ("timing.description-timeout-ms", timing.description_timeout_ms),
    ] {
        if value == 0 {
            return Err(ConfigError::Validation(format!("{} must be > 0", field)));
        }
    }

    Ok(())
}

/// Validates retry configuration
fn validate_retry(retry: &RetryConfig) -> Result<(), ConfigError> {
    if retry.max_attempts < 1 || retry.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "retry.max-attempts must be between 1 and 10, got {}",
            retry.max_attempts
        )));
    }
    Ok(())
}

/// Validates the metadata schema and provider endpoint
fn validate_metadata(metadata: &MetadataConfig) -> Result<(), ConfigError> {
    validate_identifier("metadata.root", &metadata.root)?;
    validate_http_url("metadata.agentql-endpoint", &metadata.agentql_endpoint)?;

    if metadata.fields.is_empty() {
        return Err(ConfigError::Validation(
            "metadata.fields must contain at least one field".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for field in &metadata.fields {
        validate_identifier("metadata field name", &field.name)?;
        validate_non_empty(&format!("selector of field '{}'", field.name), &field.selector)?;

        if !seen.insert(field.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate metadata field '{}'",
                field.name
            )));
        }
    }

    Ok(())
}

/// Field and root names end up as query identifiers and record keys
fn validate_identifier(field: &str, value: &str) -> Result<(), ConfigError> {
    validate_non_empty(field, value)?;

    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ConfigError::Validation(format!(
            "{} must contain only ASCII letters, digits and underscores, got '{}'",
            field, value
        )));
    }

    Ok(())
}

/// Validates sink configuration
fn validate_sink(sink: &SinkConfig) -> Result<(), ConfigError> {
    match sink.kind {
        SinkKind::Airtable => validate_http_url("sink.airtable-endpoint", &sink.airtable_endpoint),
        SinkKind::Sqlite => validate_non_empty("sink.database-path", &sink.database_path),
    }
}
