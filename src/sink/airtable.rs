//! Airtable record sink
//!
//! Creates one table row per record with `POST {endpoint}/{base}/{table}`.
//! Absent optional fields are left out of the row.

use super::{RecordSink, SinkError, SinkResult};
use crate::config::AirtableTarget;
use crate::record::JobRecord;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    fields: BTreeMap<&'static str, &'a str>,
}

/// Writes records to an Airtable table
pub struct AirtableSink {
    client: Client,
    table_url: Url,
    api_key: String,
}

impl AirtableSink {
    /// Creates a sink for the table named in `target`
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Base URL of the Airtable REST API
    /// * `target` - API key, base id and table name
    pub fn new(endpoint: &str, target: &AirtableTarget<'_>) -> SinkResult<Self> {
        let table_url = table_url(endpoint, target.base_id, target.table_name)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            table_url,
            api_key: target.api_key.to_string(),
        })
    }

    pub fn table_url(&self) -> &Url {
        &self.table_url
    }
}

/// Joins base id and table name onto the API endpoint, percent-encoding both
fn table_url(endpoint: &str, base_id: &str, table_name: &str) -> SinkResult<Url> {
    let mut url =
        Url::parse(endpoint).map_err(|e| SinkError::Endpoint(format!("{}: {}", endpoint, e)))?;

    url.path_segments_mut()
        .map_err(|_| SinkError::Endpoint(format!("{} cannot be a base URL", endpoint)))?
        .pop_if_empty()
        .push(base_id)
        .push(table_name);

    Ok(url)
}

#[async_trait]
impl RecordSink for AirtableSink {
    fn name(&self) -> &str {
        "airtable"
    }

    async fn create(&self, record: &JobRecord) -> SinkResult<()> {
        let request = CreateRequest {
            fields: record.fields(),
        };

        let response = self
            .client
            .post(self.table_url.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!("Airtable accepted {}", record.label());
        Ok(())
    }
}
