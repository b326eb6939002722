//! Input validation: turns the raw parameter object into a [`RunConfig`].
//!
//! No network activity happens here. The checks run in a fixed order so the
//! first problem found is the one reported.

use std::fmt;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::ConfigError;

/// Required input fields, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 4] = ["api_endpoint", "user", "password", "created_after"];

pub const DEFAULT_SESSION_HISTORY_DEPTH: u32 = 3;
pub const DEFAULT_ENRICHMENT_CONCURRENCY: usize = 1;

/// Exclusive bounds for `created_after`, in days.
pub const CREATED_AFTER_MIN_EXCLUSIVE: i64 = 1;
pub const CREATED_AFTER_MAX_EXCLUSIVE: i64 = 365;

/// Validated, immutable parameters for a single run.
#[derive(Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Base URL of the REST API, always ending with `/`.
    pub api_endpoint: String,
    pub user: String,
    pub password: String,
    pub created_after_days: u32,
    pub http_proxy: Option<String>,
    pub session_history_depth: u32,
    /// Per-request timeout; `None` leaves it to the transport.
    pub timeout: Option<Duration>,
    /// How many job session histories may be fetched at once.
    pub enrichment_concurrency: usize,
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("api_endpoint", &self.api_endpoint)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("created_after_days", &self.created_after_days)
            .field("http_proxy", &self.http_proxy)
            .field("session_history_depth", &self.session_history_depth)
            .field("timeout", &self.timeout)
            .field("enrichment_concurrency", &self.enrichment_concurrency)
            .finish()
    }
}

impl RunConfig {
    pub fn trace_loaded(&self) {
        info!(
            api_endpoint = %self.api_endpoint,
            proxy = self.http_proxy.is_some(),
            session_history_depth = self.session_history_depth,
            enrichment_concurrency = self.enrichment_concurrency,
            "Loaded RunConfig"
        );
        debug!(?self, "RunConfig loaded (full debug)");
    }
}

/// Validates and normalises the raw input object.
pub fn validate(params: &Value) -> Result<RunConfig, ConfigError> {
    let Some(map) = params.as_object() else {
        return Err(ConfigError::MissingField(REQUIRED_FIELDS[0]));
    };

    for field in REQUIRED_FIELDS {
        if is_unset(map.get(field)) {
            return Err(ConfigError::MissingField(field));
        }
    }

    let api_endpoint = normalize_endpoint(&text(map, "api_endpoint")?);
    let user = text(map, "user")?;
    let password = text(map, "password")?;
    let created_after_days = created_after(&map["created_after"])?;

    url::Url::parse(&api_endpoint)
        .map_err(|e| ConfigError::InvalidEndpoint(format!("{api_endpoint} ({e})")))?;

    let http_proxy = match provided(map, "http_proxy") {
        Some(_) => Some(text(map, "http_proxy")?),
        None => None,
    };

    // A zero or `false` depth falls back to the default as well.
    let session_history_depth = match provided(map, "session_history_depth") {
        Some(v) if integer(v) != Some(0) && *v != Value::Bool(false) => {
            positive(v, "session_history_depth")?
        }
        _ => DEFAULT_SESSION_HISTORY_DEPTH,
    };

    let timeout = provided(map, "timeout_secs")
        .map(|v| positive(v, "timeout_secs"))
        .transpose()?
        .map(|secs| Duration::from_secs(u64::from(secs)));

    let enrichment_concurrency = provided(map, "enrichment_concurrency")
        .map(|v| positive(v, "enrichment_concurrency"))
        .transpose()?
        .map_or(DEFAULT_ENRICHMENT_CONCURRENCY, |n| n as usize);

    Ok(RunConfig {
        api_endpoint,
        user,
        password,
        created_after_days,
        http_proxy,
        session_history_depth,
        timeout,
        enrichment_concurrency,
    })
}

/// Appends a trailing `/` when missing. Idempotent.
pub fn normalize_endpoint(endpoint: &str) -> String {
    if endpoint.ends_with('/') {
        endpoint.to_string()
    } else {
        format!("{endpoint}/")
    }
}

fn is_unset(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn provided<'a>(map: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    map.get(field).filter(|v| !is_unset(Some(v)))
}

fn text(map: &Map<String, Value>, field: &'static str) -> Result<String, ConfigError> {
    match &map[field] {
        Value::String(s) => Ok(s.clone()),
        v @ (Value::Number(_) | Value::Bool(_)) => Ok(v.to_string()),
        _ => Err(ConfigError::InvalidInput(format!("\"{field}\" must be a string"))),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Integer from a JSON number or a numeric string.
fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as i64))
        }
        _ => None,
    }
}

fn created_after(value: &Value) -> Result<u32, ConfigError> {
    match integer(value) {
        Some(days) if days > CREATED_AFTER_MIN_EXCLUSIVE && days < CREATED_AFTER_MAX_EXCLUSIVE => {
            Ok(days as u32)
        }
        _ => Err(ConfigError::CreatedAfterOutOfRange(render(value))),
    }
}

fn positive(value: &Value, field: &'static str) -> Result<u32, ConfigError> {
    integer(value)
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| ConfigError::NotPositiveInteger {
            field,
            value: render(value),
        })
}
