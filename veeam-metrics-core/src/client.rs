//! Authenticated GET requests returning decoded JSON.

use serde_json::Value;
use tracing::debug;

use crate::auth::AuthToken;
use crate::config::RunConfig;
use crate::contract::{HttpRequest, HttpResponse, HttpTransport, API_VERSION, API_VERSION_HEADER};
use crate::error::{body_or_null, RequestError};

pub const JOBS_STATES_PATH: &str = "api/v1/jobs/states";
pub const SESSIONS_PATH: &str = "api/v1/sessions";
pub const REPOSITORIES_STATES_PATH: &str = "api/v1/backupInfrastructure/repositories/states";

/// Read-only view over the run's transport, config and token.
pub struct ApiClient<'a, T: ?Sized> {
    transport: &'a T,
    config: &'a RunConfig,
    token: &'a AuthToken,
}

impl<'a, T> ApiClient<'a, T>
where
    T: HttpTransport + ?Sized,
{
    pub fn new(transport: &'a T, config: &'a RunConfig, token: &'a AuthToken) -> Self {
        ApiClient {
            transport,
            config,
            token,
        }
    }

    pub fn config(&self) -> &RunConfig {
        self.config
    }

    /// Absolute URL for a path under the API endpoint.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_endpoint, path)
    }

    /// Session history query for one job, newest first.
    pub fn sessions_url(&self, job_id: &str) -> Result<String, RequestError> {
        let base = self.url(SESSIONS_PATH);
        let mut url = url::Url::parse(&base).map_err(|e| RequestError::Malformed {
            url: base.clone(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut()
            .append_pair("jobIdFilter", job_id)
            .append_pair("limit", &self.config.session_history_depth.to_string())
            .append_pair("orderDesc", "true");
        Ok(url.into())
    }

    /// GET `url` with the bearer token and decode the body as JSON.
    ///
    /// With an empty token no request goes out and the status check fails
    /// as if status 0 had been received.
    pub async fn get(&self, url: &str) -> Result<Value, RequestError> {
        let response = if self.token.is_empty() {
            debug!(url = %url, "No access token; request not sent");
            HttpResponse::empty(0)
        } else {
            let request = HttpRequest::get(url)
                .header("Authorization", format!("Bearer {}", self.token.as_str()))
                .header(API_VERSION_HEADER, API_VERSION);
            self.transport
                .execute(request)
                .await
                .map_err(|e| RequestError::Transport {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?
        };

        let body = match response.body {
            Some(body) if response.status == 200 => body,
            body => {
                debug!(status = response.status, url = %url, "API request failed");
                return Err(RequestError::Status {
                    status: response.status,
                    body: body_or_null(&body).to_string(),
                });
            }
        };

        debug!(url = %url, body_len = body.len(), "API response received");
        serde_json::from_str(&body).map_err(|e| {
            debug!(error = ?e, url = %url, "API response is not JSON");
            RequestError::Unparseable
        })
    }
}
