/// `load_config` module: reads the raw input parameters for one run and injects secrets from the environment.
///
/// The parameters stay a loosely typed JSON value here. Validation into a
/// `RunConfig` belongs to `veeam-metrics-core`, so the CLI and library report
/// identical errors for identical input.
///
/// # Sources
/// Tried in order, first match wins:
/// - inline JSON (`--params`)
/// - a file holding the JSON (`--params-file`)
/// - inline JSON from `VEEAM_PARAMS`
///
/// # Secrets
/// When the input carries no `password`, `VEEAM_PASSWORD` is injected, so the
/// password can live in the environment or a `.env` file instead of the
/// monitoring configuration.
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const PASSWORD_ENV: &str = "VEEAM_PASSWORD";
pub const PARAMS_ENV: &str = "VEEAM_PARAMS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamsSource {
    Inline(String),
    File(PathBuf),
}

impl ParamsSource {
    /// Picks the source from the command line, then [`PARAMS_ENV`].
    pub fn from_args(params: Option<String>, params_file: Option<PathBuf>) -> Result<Self> {
        if let Some(inline) = params {
            return Ok(ParamsSource::Inline(inline));
        }
        if let Some(path) = params_file {
            return Ok(ParamsSource::File(path));
        }
        match std::env::var(PARAMS_ENV) {
            Ok(inline) if !inline.is_empty() => {
                debug!("Using parameters from {PARAMS_ENV}");
                Ok(ParamsSource::Inline(inline))
            }
            _ => anyhow::bail!(
                "No input parameters given (use --params, --params-file or {PARAMS_ENV})"
            ),
        }
    }
}

/// Loads the parameter object and injects environment secrets.
pub fn load_params(source: ParamsSource) -> Result<Value> {
    let raw = match source {
        ParamsSource::Inline(raw) => {
            info!(len = raw.len(), "Using inline parameters");
            raw
        }
        ParamsSource::File(path) => read_params_file(&path)?,
    };

    let mut params: Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = ?e, "Failed to parse params JSON");
            return Err(anyhow::anyhow!("Failed to parse params JSON: {e}"));
        }
    };

    inject_secrets(&mut params);
    Ok(params)
}

fn read_params_file(path: &Path) -> Result<String> {
    info!(params_path = ?path, "Loading parameters from file");
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read params file {}", path.display()))
}

/// Fills `password` from [`PASSWORD_ENV`] when the input leaves it unset.
pub fn inject_secrets(params: &mut Value) {
    let Some(map) = params.as_object_mut() else {
        return;
    };
    let unset = match map.get("password") {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    };
    if !unset {
        return;
    }
    if let Some(password) = std::env::var(PASSWORD_ENV).ok().filter(|p| !p.is_empty()) {
        info!("Injected password from {PASSWORD_ENV}");
        map.insert("password".to_string(), Value::String(password));
    }
}
