//! Remote query port
//!
//! The retrieval core talks to the platform only through this trait, so runs
//! can be driven by the REST client or by an in-memory fake.

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;

/// Read access to the remote platform
#[async_trait]
pub trait QueryPort: Send + Sync {
    /// Execute a SOQL query and return every matching record, following
    /// server-side pagination. Transient failures are retried by the
    /// implementation; an error here means retries are exhausted.
    async fn query(&self, soql: &str) -> Result<Vec<serde_json::Value>>;

    /// API names of every object known to the platform
    async fn list_object_names(&self) -> Result<HashSet<String>>;
}
