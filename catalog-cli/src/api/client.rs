//! Salesforce REST client implementing the query port
//!
//! Authenticates with a bearer access token, follows `nextRecordsUrl`
//! pagination and retries throttling and server errors.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

use super::port::QueryPort;
use super::resilience::{RetryConfig, RetryPolicy, RetryableError};

/// Default REST API version
pub const DEFAULT_API_VERSION: &str = "60.0";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Failure of a single REST call
#[derive(Debug, Clone)]
pub enum ApiError {
    /// Non-success HTTP status
    Http { status: u16, body: String },
    /// Connection, TLS or timeout failure
    Transport(String),
    /// Response body was not the expected JSON
    Decode(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Http { status, body } => write!(f, "HTTP {}: {}", status, body),
            ApiError::Transport(msg) => write!(f, "Request failed: {}", msg),
            ApiError::Decode(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl RetryableError for ApiError {
    fn is_retryable(&self) -> bool {
        match self {
            ApiError::Http { status, .. } => *status == 429 || (500..=599).contains(status),
            ApiError::Transport(_) => true,
            ApiError::Decode(_) => false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueryPage {
    #[serde(default)]
    records: Vec<serde_json::Value>,
    #[serde(default)]
    done: bool,
    #[serde(rename = "nextRecordsUrl")]
    next_records_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectListing {
    #[serde(default)]
    sobjects: Vec<ObjectSummary>,
}

#[derive(Debug, Deserialize)]
struct ObjectSummary {
    name: String,
}

/// REST client for one org
#[derive(Debug, Clone)]
pub struct SalesforceClient {
    http: reqwest::Client,
    instance_url: String,
    api_version: String,
    access_token: String,
    retry: RetryPolicy,
}

impl SalesforceClient {
    /// Create a client for `instance_url` (e.g., "https://acme.my.salesforce.com")
    pub fn new(
        instance_url: impl Into<String>,
        api_version: impl Into<String>,
        access_token: impl Into<String>,
        retry: RetryConfig,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            instance_url: instance_url.into().trim_end_matches('/').to_string(),
            api_version: api_version.into().trim_start_matches('v').to_string(),
            access_token: access_token.into(),
            retry: RetryPolicy::new(retry),
        })
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    /// URL of a resource under the versioned data API
    fn data_url(&self, resource: &str) -> String {
        format!(
            "{}/services/data/v{}/{}",
            self.instance_url, self.api_version, resource
        )
    }

    /// Turn a server-relative path (as in `nextRecordsUrl`) into a full URL
    fn absolute_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.instance_url, path)
        }
    }

    async fn get_once(&self, url: &str) -> Result<serde_json::Value, ApiError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, ApiError> {
        self.retry.execute("GET", move || self.get_once(url)).await
    }
}

/// Drop the `attributes` metadata object the API adds to every record and
/// relationship sub-record
pub fn strip_attributes(mut record: serde_json::Value) -> serde_json::Value {
    if let Some(obj) = record.as_object_mut() {
        obj.remove("attributes");
        for value in obj.values_mut() {
            if value.is_object() {
                *value = strip_attributes(value.take());
            }
        }
    }
    record
}

#[async_trait]
impl QueryPort for SalesforceClient {
    async fn query(&self, soql: &str) -> Result<Vec<serde_json::Value>> {
        debug!("SOQL ({} chars): {}", soql.len(), soql);

        let mut url = format!("{}?q={}", self.data_url("query"), urlencoding::encode(soql));
        let mut records = Vec::new();
        let mut pages = 0usize;

        loop {
            let body = self
                .get_json(&url)
                .await
                .with_context(|| format!("Query failed: {}", soql))?;
            let page: QueryPage = serde_json::from_value(body)
                .with_context(|| format!("Unexpected response shape for query: {}", soql))?;
            pages += 1;

            records.extend(page.records.into_iter().map(strip_attributes));

            match page.next_records_url {
                Some(next) if !page.done => url = self.absolute_url(&next),
                _ => break,
            }
        }

        debug!("Query returned {} records in {} page(s)", records.len(), pages);
        Ok(records)
    }

    async fn list_object_names(&self) -> Result<HashSet<String>> {
        let body = self
            .get_json(&self.data_url("sobjects"))
            .await
            .context("Failed to list objects")?;
        let listing: ObjectListing =
            serde_json::from_value(body).context("Unexpected response shape for object listing")?;

        Ok(listing.sobjects.into_iter().map(|o| o.name).collect())
    }
}
