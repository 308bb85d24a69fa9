//! Errors surfaced by the Planet client.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Vendor endpoint answered with a non-success status.
    #[error("upstream request failed with status {status}: {body}")]
    UpstreamRequest { status: u16, body: String },

    /// Vendor response broke the asynchronous-job contract.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Search job reached the FAILED terminal state.
    #[error("upstream job failed: {code} - {message}")]
    UpstreamJob { code: String, message: String },

    /// Poll budget exhausted before a terminal state was observed.
    #[error("job still pending after {polls} polls ({waited:?})")]
    TimedOut { polls: u32, waited: Duration },

    #[error("job cancelled")]
    Cancelled,

    #[error("no credentials supplied")]
    MissingCredentials,

    /// Caller sent an `Authorization` header that cannot be forwarded.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(&'static str),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ClientError {
    pub async fn from_response(response: reqwest::Response) -> ClientError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "failed to read response body".to_string());
        ClientError::UpstreamRequest { status, body }
    }

    /// HTTP status of an upstream request failure.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ClientError::UpstreamRequest { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}
