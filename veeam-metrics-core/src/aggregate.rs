//! Top-level orchestration: validate → login → enrich jobs → repositories
//! → one JSON string.
//!
//! [`run_with`] and [`run_params`] are the only places errors are caught.
//! Whatever fails, the caller gets exactly one JSON document back: either a
//! [`MetricsDocument`] or an [`ErrorDocument`], never both and never a panic.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::{login, AuthToken};
use crate::client::{ApiClient, REPOSITORIES_STATES_PATH};
use crate::config::{validate, RunConfig};
use crate::contract::HttpTransport;
use crate::enrich::{enrich_jobs, fetch_job_states};
use crate::error::{ConfigError, MetricsError, MetricsResult, TransportError};

/// Prefix of the single log line written for a failed run.
pub const ERROR_LOG_PREFIX: &str = "[ VEEAM ] ERROR: ";

/// Successful output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsDocument {
    /// Enriched jobs, in the order the API returned them.
    pub jobs_states: Vec<Value>,
    /// Passed through as returned by the API.
    pub repositories_states: Value,
}

/// Output of a failed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDocument {
    pub error: String,
}

/// Fetches jobs, enriches them, then fetches repository states.
///
/// Job enrichment failures are absorbed per job; the job list and the
/// repository call are not isolated and abort the run.
pub async fn collect_metrics<T>(
    transport: &T,
    config: &RunConfig,
    token: &AuthToken,
) -> MetricsResult<MetricsDocument>
where
    T: HttpTransport + ?Sized,
{
    let client = ApiClient::new(transport, config, token);

    let jobs = fetch_job_states(&client).await?;
    let jobs_states = enrich_jobs(&client, jobs).await;

    let repositories_states = client.get(&client.url(REPOSITORIES_STATES_PATH)).await?;
    info!("Fetched repository states");

    Ok(MetricsDocument {
        jobs_states,
        repositories_states,
    })
}

/// The whole pipeline for already-parsed input. The transport is built by
/// `connect` once the config is known, so proxy and timeout settings apply.
pub async fn run_pipeline<T, F>(params: &Value, connect: F) -> MetricsResult<MetricsDocument>
where
    T: HttpTransport,
    F: FnOnce(&RunConfig) -> Result<T, TransportError>,
{
    let config = validate(params)?;
    config.trace_loaded();

    let transport = connect(&config)?;
    let token = login(&transport, &config).await?;
    collect_metrics(&transport, &config, &token).await
}

/// Appends a period unless the message already ends with one.
pub fn normalize_message(message: impl Display) -> String {
    let mut message = message.to_string();
    if !message.ends_with('.') {
        message.push('.');
    }
    message
}

/// Logs the failure once and renders the error document.
pub fn render_error(message: impl Display) -> String {
    let message = normalize_message(message);
    warn!("{ERROR_LOG_PREFIX}{message}");
    json!({ "error": message }).to_string()
}

/// Runs the pipeline for parsed input and always returns one JSON string.
pub async fn run_params<T, F>(params: &Value, connect: F) -> String
where
    T: HttpTransport,
    F: FnOnce(&RunConfig) -> Result<T, TransportError>,
{
    let outcome = match run_pipeline(params, connect).await {
        Ok(document) => serde_json::to_string(&document).map_err(MetricsError::from),
        Err(e) => Err(e),
    };
    match outcome {
        Ok(output) => {
            info!(bytes = output.len(), "Metrics document ready");
            output
        }
        Err(e) => render_error(e),
    }
}

/// Runs the pipeline for the raw JSON input string.
pub async fn run_with<T, F>(input: &str, connect: F) -> String
where
    T: HttpTransport,
    F: FnOnce(&RunConfig) -> Result<T, TransportError>,
{
    match serde_json::from_str::<Value>(input) {
        Ok(params) => run_params(&params, connect).await,
        Err(e) => render_error(ConfigError::InvalidInput(e.to_string())),
    }
}
