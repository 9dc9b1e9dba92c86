//! Salesforce REST API access
//!
//! The core only depends on [`QueryPort`]. [`SalesforceClient`] is the
//! production implementation over the REST `query` and `sobjects` resources.

pub mod client;
pub mod port;
pub mod resilience;

pub use client::{SalesforceClient, DEFAULT_API_VERSION};
pub use port::QueryPort;
pub use resilience::RetryConfig;
