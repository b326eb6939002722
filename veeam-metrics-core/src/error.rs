//! Error kinds raised along the metrics pipeline.
//!
//! Every stage returns its own error type so callers can see from the
//! signature what may fail. [`MetricsError`] is the single type that
//! reaches the top-level boundary in [`crate::aggregate`], where it is
//! rendered into the `{"error": ...}` document.

use thiserror::Error;

/// Response body as shown in error messages. Absent or empty reads `null`.
pub(crate) fn body_or_null(body: &Option<String>) -> &str {
    match body.as_deref() {
        Some(text) if !text.is_empty() => text,
        _ => "null",
    }
}

/// Failure raised by an [`crate::contract::HttpTransport`] before any
/// status code was received.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError(e.to_string())
    }
}

/// Bad or missing input parameters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid input parameters: {0}.")]
    InvalidInput(String),

    #[error("Required param is not set: {0}.")]
    MissingField(&'static str),

    #[error("Incorrect \"created_after\" parameter given: {0}\nMust be between 1 and 365 days.")]
    CreatedAfterOutOfRange(String),

    #[error("Incorrect \"{field}\" parameter given: {value}\nMust be a positive integer.")]
    NotPositiveInteger { field: &'static str, value: String },

    #[error("Incorrect \"api_endpoint\" parameter given: {0}.")]
    InvalidEndpoint(String),
}

/// Login failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Login failed with status code {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Failed to parse authentication token for the logon session.")]
    Unparseable,

    #[error("Auth response does not contain access token.")]
    MissingToken,

    #[error("Login request failed: {0}")]
    Transport(#[from] TransportError),
}

/// Failures of an authenticated GET.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Request failed with status code {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse response received from API.")]
    Unparseable,

    #[error("Request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("Malformed response from {url}: {reason}.")]
    Malformed { url: String, reason: String },
}

/// Per-job enrichment failure. Always recovered at the job boundary in
/// [`crate::enrich`]; it never reaches the top-level boundary.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EnrichmentError {
    #[error("job has no id")]
    MissingJobId,

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("sessions response field 'data' is not an array")]
    SessionsNotArray,

    #[error("session at index {0} is not an object")]
    SessionNotObject(usize),

    #[error("session at index {0} has no id")]
    SessionWithoutId(usize),
}

/// Any failure that aborts the whole run.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("Failed to create HTTP client: {0}")]
    Transport(#[from] TransportError),

    #[error("Failed to serialize metrics document: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type MetricsResult<T> = Result<T, MetricsError>;
