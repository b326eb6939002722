//! Job enrichment: attach each job's recent session history.
//!
//! Jobs are fetched once, then every job is enriched independently. A job
//! whose history cannot be fetched or reduced keeps its place in the output
//! with an error marker instead of sessions; see [`recover_history`].
//!
//! Enrichment runs through a `buffered` stream, so at most
//! `enrichment_concurrency` session fetches are in flight and results come
//! back in the original job order.

use chrono::DateTime;
use futures::stream::{self, StreamExt};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::client::{ApiClient, JOBS_STATES_PATH};
use crate::contract::HttpTransport;
use crate::error::{EnrichmentError, RequestError};

/// `sessions.error` value for a job whose history could not be fetched.
pub const SESSION_ERROR_MARKER: &str = "Failed to fetch session history";
/// `lastMessage` value for a job whose history could not be fetched.
pub const SESSION_ERROR_SENTINEL: &str = "Session fetch error";

/// Summary fields copied from a session, in output order.
const SESSION_FIELDS_BEFORE_DURATION: [&str; 4] = ["state", "name", "creationTime", "endTime"];
const SESSION_FIELDS_AFTER_DURATION: [&str; 2] = ["progressPercent", "result"];

/// Reduced session history of one job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionHistory {
    /// Session summaries keyed by session id, newest first.
    pub sessions: Map<String, Value>,
    /// `result.message` of the newest session, when it carries one.
    pub last_message: Option<Value>,
}

/// Loose truthiness, as the upstream API's consumers treat it: empty
/// strings, zero, `false` and `null` are all "no value".
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Id rendered as a map key / query value. Strings and numbers only.
fn id_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `endTime - creationTime`.
///
/// Numbers are subtracted directly, so the result keeps their unit.
/// Two RFC 3339 timestamps give whole seconds (not milliseconds).
/// Anything else, including a missing end time, is `null`.
/// Negative results are kept.
pub fn session_duration(creation: Option<&Value>, end: Option<&Value>) -> Value {
    match (creation, end) {
        (Some(Value::Number(c)), Some(Value::Number(e))) => {
            if let (Some(c), Some(e)) = (c.as_i64(), e.as_i64()) {
                if let Some(diff) = e.checked_sub(c) {
                    return json!(diff);
                }
            }
            match (c.as_f64(), e.as_f64()) {
                (Some(c), Some(e)) => serde_json::Number::from_f64(e - c)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
                _ => Value::Null,
            }
        }
        (Some(Value::String(c)), Some(Value::String(e))) => {
            match (DateTime::parse_from_rfc3339(c), DateTime::parse_from_rfc3339(e)) {
                (Ok(c), Ok(e)) => json!(e.signed_duration_since(c).num_seconds()),
                _ => Value::Null,
            }
        }
        _ => Value::Null,
    }
}

/// Compact summary of one session. Absent upstream fields stay absent.
pub fn summarize_session(session: &Map<String, Value>) -> Map<String, Value> {
    let mut summary = Map::new();
    for field in SESSION_FIELDS_BEFORE_DURATION {
        if let Some(v) = session.get(field) {
            summary.insert(field.to_string(), v.clone());
        }
    }
    summary.insert(
        "duration".to_string(),
        session_duration(session.get("creationTime"), session.get("endTime")),
    );
    for field in SESSION_FIELDS_AFTER_DURATION {
        if let Some(v) = session.get(field) {
            summary.insert(field.to_string(), v.clone());
        }
    }
    summary
}

/// Reduces a sessions response (already newest first) into a [`SessionHistory`].
pub fn reduce_sessions(response: &Value) -> Result<SessionHistory, EnrichmentError> {
    let sessions: &[Value] = match response.get("data") {
        Some(Value::Array(sessions)) => sessions.as_slice(),
        Some(v) if is_truthy(v) => return Err(EnrichmentError::SessionsNotArray),
        _ => &[],
    };

    let mut history = SessionHistory::default();
    for (index, session) in sessions.iter().enumerate() {
        let session = session
            .as_object()
            .ok_or(EnrichmentError::SessionNotObject(index))?;
        let id = id_of(session.get("id")).ok_or(EnrichmentError::SessionWithoutId(index))?;
        debug!(session_id = %id, index, "Reducing session");

        // Repeated ids overwrite the earlier entry in place.
        history.sessions.insert(id, Value::Object(summarize_session(session)));

        if index == 0 {
            if let Some(message) = session
                .get("result")
                .and_then(|r| r.get("message"))
                .filter(|m| is_truthy(m))
            {
                history.last_message = Some(message.clone());
            }
        }
    }
    Ok(history)
}

/// Fetches and reduces the session history of one job.
pub async fn fetch_session_history<T>(
    client: &ApiClient<'_, T>,
    job_id: &str,
) -> Result<SessionHistory, EnrichmentError>
where
    T: HttpTransport + ?Sized,
{
    let url = client.sessions_url(job_id)?;
    let response = client.get(&url).await?;
    reduce_sessions(&response)
}

/// The per-job isolation boundary: a failed history becomes the error
/// marker plus sentinel message, a successful one is attached as is.
/// Entries that are not objects pass through untouched.
pub fn recover_history(job: Value, outcome: Result<SessionHistory, EnrichmentError>) -> Value {
    let mut record = match job {
        Value::Object(record) => record,
        other => return other,
    };

    match outcome {
        Ok(history) => {
            record.insert("sessions".to_string(), Value::Object(history.sessions));
            if let Some(message) = history.last_message {
                record.insert("lastMessage".to_string(), message);
            }
        }
        Err(e) => {
            warn!(job_id = ?id_of(record.get("id")), error = %e, "Session history unavailable for job");
            record.insert("sessions".to_string(), json!({ "error": SESSION_ERROR_MARKER }));
            record.insert("lastMessage".to_string(), json!(SESSION_ERROR_SENTINEL));
        }
    }
    Value::Object(record)
}

/// Enriches one job. Never fails: errors are folded in by [`recover_history`].
pub async fn enrich_job<T>(client: &ApiClient<'_, T>, job: Value) -> Value
where
    T: HttpTransport + ?Sized,
{
    let outcome = match job.as_object().map(|record| id_of(record.get("id"))) {
        Some(Some(id)) => fetch_session_history(client, &id).await,
        Some(None) => Err(EnrichmentError::MissingJobId),
        None => {
            warn!(job = %job, "Job entry is not an object; passing through");
            return job;
        }
    };
    recover_history(job, outcome)
}

/// `GET api/v1/jobs/states`. A missing `data` field means no jobs.
pub async fn fetch_job_states<T>(client: &ApiClient<'_, T>) -> Result<Vec<Value>, RequestError>
where
    T: HttpTransport + ?Sized,
{
    let url = client.url(JOBS_STATES_PATH);
    let response = client.get(&url).await?;

    let jobs = match response {
        Value::Object(mut body) => match body.remove("data") {
            Some(Value::Array(jobs)) => jobs,
            Some(v) if is_truthy(&v) => {
                return Err(RequestError::Malformed {
                    url,
                    reason: "field 'data' is not an array".to_string(),
                })
            }
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    info!(count = jobs.len(), "Fetched job states");
    Ok(jobs)
}

/// Enriches all jobs, keeping their original order.
pub async fn enrich_jobs<T>(client: &ApiClient<'_, T>, jobs: Vec<Value>) -> Vec<Value>
where
    T: HttpTransport + ?Sized,
{
    let concurrency = client.config().enrichment_concurrency.max(1);
    let enriched: Vec<Value> = stream::iter(jobs)
        .map(|job| enrich_job(client, job))
        .buffered(concurrency)
        .collect()
        .await;

    let degraded = enriched
        .iter()
        .filter(|job| job.get("lastMessage") == Some(&json!(SESSION_ERROR_SENTINEL)))
        .count();
    info!(jobs = enriched.len(), degraded, concurrency, "Enriched jobs with session history");
    enriched
}
