use serde_json::json;
use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use veeam_metrics::load_config::{
    inject_secrets, load_params, ParamsSource, PARAMS_ENV, PASSWORD_ENV,
};

#[test]
#[serial]
fn loads_params_from_file() {
    env::remove_var(PASSWORD_ENV);
    let params_file = NamedTempFile::new().expect("temp file");
    write(
        params_file.path(),
        r#"{"api_endpoint":"https://veeam.example:9419","user":"monitor","password":"p","created_after":"14"}"#,
    )
    .unwrap();

    let params = load_params(ParamsSource::File(params_file.path().to_path_buf()))
        .expect("Params should load");
    assert_eq!(params["user"], json!("monitor"));
    assert_eq!(params["created_after"], json!("14"));
}

#[test]
#[serial]
fn password_is_injected_from_env_when_absent() {
    env::set_var(PASSWORD_ENV, "from-env");
    let params = load_params(ParamsSource::Inline(
        r#"{"api_endpoint":"https://h","user":"u","created_after":7}"#.into(),
    ))
    .expect("Params should load");
    env::remove_var(PASSWORD_ENV);

    assert_eq!(params["password"], json!("from-env"));
}

#[test]
#[serial]
fn explicit_password_is_not_overridden() {
    env::set_var(PASSWORD_ENV, "from-env");
    let mut params = json!({ "password": "explicit" });
    inject_secrets(&mut params);
    env::remove_var(PASSWORD_ENV);

    assert_eq!(params["password"], json!("explicit"));
}

#[test]
#[serial]
fn invalid_json_reports_parse_failure() {
    let err = load_params(ParamsSource::Inline("{not-json".into())).unwrap_err();
    assert!(err.to_string().contains("parse"), "Parse error expected, got: {err}");
}

#[test]
#[serial]
fn missing_source_is_an_error() {
    env::remove_var(PARAMS_ENV);
    let err = ParamsSource::from_args(None, None).unwrap_err();
    assert!(err.to_string().contains("--params"));
}

#[test]
#[serial]
fn inline_params_take_precedence_over_file() {
    env::set_var(PARAMS_ENV, r#"{"from":"env"}"#);
    let source = ParamsSource::from_args(Some("{}".into()), Some(PathBuf::from("p.json"))).unwrap();
    env::remove_var(PARAMS_ENV);
    assert_eq!(source, ParamsSource::Inline("{}".into()));
}

#[test]
#[serial]
fn params_file_takes_precedence_over_env() {
    env::set_var(PARAMS_ENV, r#"{"from":"env"}"#);
    let source = ParamsSource::from_args(None, Some(PathBuf::from("p.json"))).unwrap();
    env::remove_var(PARAMS_ENV);
    assert_eq!(source, ParamsSource::File(PathBuf::from("p.json")));
}

#[test]
#[serial]
fn env_params_are_the_last_fallback() {
    env::set_var(PARAMS_ENV, r#"{"from":"env"}"#);
    let source = ParamsSource::from_args(None, None).unwrap();
    env::remove_var(PARAMS_ENV);
    assert_eq!(source, ParamsSource::Inline(r#"{"from":"env"}"#.into()));
}
