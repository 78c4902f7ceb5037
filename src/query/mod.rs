//! Metadata queries
//!
//! A metadata query resolves a [`MetadataSchema`] (named fields bound to
//! selectors) against the listing currently shown on the surface. Two
//! backends exist:
//! - [`SelectorQuery`] resolves the selectors locally against the page HTML
//! - [`AgentQlQuery`] sends the schema and page HTML to the AgentQL API
//!
//! Both may fail transiently; the engine wraps every call in a
//! [`RetryPolicy`](crate::engine::RetryPolicy).

mod agentql;
mod selector;

pub use agentql::AgentQlQuery;
pub use selector::SelectorQuery;

use crate::config::{Config, Credentials, MetadataConfig, MetadataProvider};
use crate::record::Metadata;
use crate::surface::{Surface, SurfaceError};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while querying listing metadata
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Transient query failure: {0}")]
    Transient(String),

    #[error("Query rejected (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Malformed query response: {0}")]
    Malformed(String),

    #[error("Invalid selector `{0}`")]
    Selector(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),
}

/// Result type for metadata queries
pub type QueryResult<T> = Result<T, QueryError>;

/// A named field bound to a selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub selector: String,
}

/// Named fields grouped under a root object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataSchema {
    pub root: String,
    pub fields: Vec<FieldSpec>,
}

impl MetadataSchema {
    pub fn from_config(config: &MetadataConfig) -> Self {
        Self {
            root: config.root.clone(),
            fields: config
                .fields
                .iter()
                .map(|f| FieldSpec {
                    name: f.name.clone(),
                    selector: f.selector.clone(),
                })
                .collect(),
        }
    }

    /// Renders the schema in AgentQL query syntax
    ///
    /// ```
    /// use scroll_harvest::query::{FieldSpec, MetadataSchema};
    ///
    /// let schema = MetadataSchema {
    ///     root: "job_details".to_string(),
    ///     fields: vec![FieldSpec { name: "job_title".to_string(), selector: "h1".to_string() }],
    /// };
    /// assert_eq!(
    ///     schema.to_query_text(),
    ///     "{\n    job_details {\n        job_title(selector=\"h1\")\n    }\n}"
    /// );
    /// ```
    pub fn to_query_text(&self) -> String {
        let mut text = format!("{{\n    {} {{\n", self.root);
        for field in &self.fields {
            text.push_str(&format!(
                "        {}(selector={})\n",
                field.name,
                serde_json::Value::String(field.selector.clone())
            ));
        }
        text.push_str("    }\n}");
        text
    }
}

/// Resolves listing metadata against the current surface
#[async_trait]
pub trait MetadataQuery: Send + Sync {
    /// Short backend name for log lines
    fn name(&self) -> &str;

    /// Runs the query once
    ///
    /// Every schema field appears in the result, mapped to `None` when the
    /// field could not be resolved.
    async fn query(&self, surface: &dyn Surface, schema: &MetadataSchema)
        -> QueryResult<Metadata>;
}

/// Builds the backend selected in the configuration
pub fn build_query(
    config: &Config,
    credentials: &Credentials,
) -> Result<Box<dyn MetadataQuery>, crate::HarvestError> {
    match config.metadata.provider {
        MetadataProvider::Selectors => Ok(Box::new(SelectorQuery::new())),
        MetadataProvider::AgentQl => {
            let api_key = credentials.require_agentql_key()?;
            let query = AgentQlQuery::new(&config.metadata.agentql_endpoint, api_key)?;
            Ok(Box::new(query))
        }
    }
}
