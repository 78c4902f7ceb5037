//! AgentQL-backed metadata query
//!
//! Posts the rendered schema together with a snapshot of the page HTML to
//! the AgentQL query-data endpoint. Rate limiting, server errors and
//! network failures are reported as transient so the retry policy can take
//! another attempt.

use super::{MetadataQuery, MetadataSchema, QueryError, QueryResult};
use crate::record::{coerce_to_text, Metadata};
use crate::surface::Surface;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: String,
    html: &'a str,
    params: QueryParams,
}

#[derive(Debug, Serialize)]
struct QueryParams {
    mode: &'static str,
}

/// Client for the AgentQL query-data API
pub struct AgentQlQuery {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl AgentQlQuery {
    /// Creates a client posting to `endpoint`
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self, QueryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Sends one query for an HTML snapshot
    pub async fn query_html(&self, html: &str, schema: &MetadataSchema) -> QueryResult<Metadata> {
        let request = QueryRequest {
            query: schema.to_query_text(),
            html,
            params: QueryParams { mode: "fast" },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-Key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| QueryError::Transient(format!("request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(QueryError::Transient(format!("AgentQL returned HTTP {status}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| QueryError::Malformed(e.to_string()))?;

        parse_response(&body, schema)
    }
}

/// Extracts the schema's fields from an AgentQL response body
///
/// A response without the root object yields every field as `None`.
fn parse_response(body: &Value, schema: &MetadataSchema) -> QueryResult<Metadata> {
    let data = body
        .get("data")
        .ok_or_else(|| QueryError::Malformed("response has no `data` object".to_string()))?;

    let root = data.get(&schema.root).filter(|v| !v.is_null());
    if root.is_none() {
        tracing::debug!("AgentQL response has no `{}` object", schema.root);
    }

    Ok(schema
        .fields
        .iter()
        .map(|field| {
            let value = root
                .and_then(|r| r.get(&field.name))
                .and_then(coerce_to_text)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());
            (field.name.clone(), value)
        })
        .collect())
}

#[async_trait]
impl MetadataQuery for AgentQlQuery {
    fn name(&self) -> &str {
        "agentql"
    }

    async fn query(
        &self,
        surface: &dyn Surface,
        schema: &MetadataSchema,
    ) -> QueryResult<Metadata> {
        let html = surface.content().await?;
        self.query_html(&html, schema).await
    }
}
