//! Retry handling for remote calls
//!
//! Wraps transient failures (throttling, server errors, dropped connections)
//! in exponential backoff before they are surfaced to the run.

pub mod retry;

pub use retry::{RetryConfig, RetryPolicy, RetryableError};
