//! Client for triggering workflow executions on a remote orchestrator appliance.

pub mod client;
pub mod params;

pub use client::{AuthToken, ExecutionState, OrchestratorClient, RetryPolicy};
pub use params::ExecutionParameter;

use std::time::Duration;

/// Error types for remote API calls.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("remote.base_url is not configured")]
    MissingBaseUrl,
    #[error("invalid remote configuration: {0}")]
    Config(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("server error {status}: {body}")]
    Server { status: u16, body: String },
    #[error("request rejected with {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Response(String),
    #[error("execution {execution_id} still {state} after {waited:?}")]
    Timeout {
        execution_id: String,
        state: String,
        waited: Duration,
    },
    #[error("invalid execution parameter '{spec}': {reason}")]
    Parameter { spec: String, reason: String },
}

impl RemoteError {
    /// Transport failures and 5xx responses are worth another attempt; anything else is final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RemoteError::Network(_) | RemoteError::Server { .. })
    }
}
