//! # contract: the HTTP capability the pipeline is given
//!
//! The pipeline never talks to the network directly. It builds
//! [`HttpRequest`] values and hands them to an [`HttpTransport`], then
//! inspects the returned status code and body itself. This keeps status
//! and parse handling in one place (see [`crate::auth`] and
//! [`crate::client`]) and lets tests swap in a `MockHttpTransport`.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall` so consumers can generate
//!   deterministic mocks for unit and integration tests.
//! - The mock is exported when the `test-export-mocks` feature is on.

use async_trait::async_trait;
use mockall::automock;

use crate::error::TransportError;

/// API version header sent with every request.
pub const API_VERSION_HEADER: &str = "x-api-version";
pub const API_VERSION: &str = "1.1-rev2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A fully described outgoing request. Proxy and timeout are properties
/// of the transport, not of individual requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        HttpRequest {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        HttpRequest {
            method: HttpMethod::Post,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body.into()),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// What came back. `body` is `None` when the server sent nothing at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Option<String>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        HttpResponse {
            status,
            body: Some(body.into()),
        }
    }

    pub fn empty(status: u16) -> Self {
        HttpResponse { status, body: None }
    }
}

/// Executes HTTP requests on behalf of the pipeline.
///
/// Implementations only fail with [`TransportError`] when no response was
/// received (connection, TLS, proxy, timeout). Any status code, including
/// 4xx/5xx, is returned as an `Ok` response.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}
