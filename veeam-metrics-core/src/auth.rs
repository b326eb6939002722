//! Password-grant login against `api/oauth2/token`.

use std::fmt;

use serde_json::Value;
use tracing::{debug, info};

use crate::config::RunConfig;
use crate::contract::{HttpRequest, HttpTransport, API_VERSION, API_VERSION_HEADER};
use crate::error::{body_or_null, AuthError};

pub const TOKEN_PATH: &str = "api/oauth2/token";

/// Bearer token for the current run. Never refreshed, never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        AuthToken(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthToken(<{} chars>)", self.0.len())
    }
}

/// Form body for the password grant, with user and password escaped.
pub fn token_request_body(config: &RunConfig) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("grant_type", "password")
        .append_pair("username", &config.user)
        .append_pair("password", &config.password)
        .finish()
}

/// Exchanges the configured credentials for a bearer token. One attempt.
pub async fn login<T>(transport: &T, config: &RunConfig) -> Result<AuthToken, AuthError>
where
    T: HttpTransport + ?Sized,
{
    let url = format!("{}{}", config.api_endpoint, TOKEN_PATH);
    info!(url = %url, user = %config.user, "Requesting access token");

    let request = HttpRequest::post(&url, token_request_body(config))
        .header("Content-Type", "application/x-www-form-urlencoded")
        .header(API_VERSION_HEADER, API_VERSION);

    let response = transport.execute(request).await?;
    let body = match response.body {
        Some(body) if response.status == 200 => body,
        body => {
            debug!(status = response.status, url = %url, "Login rejected");
            return Err(AuthError::Rejected {
                status: response.status,
                body: body_or_null(&body).to_string(),
            });
        }
    };

    let parsed: Value = serde_json::from_str(&body).map_err(|e| {
        debug!(error = ?e, "Token response is not JSON");
        AuthError::Unparseable
    })?;

    let token = match parsed.get("access_token") {
        Some(Value::String(token)) => token.clone(),
        Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
        None => return Err(AuthError::MissingToken),
    };

    info!(token_len = token.len(), "Obtained access token");
    Ok(AuthToken(token))
}
