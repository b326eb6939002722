use serde_json::json;
use veeam_metrics_core::auth::login;
use veeam_metrics_core::config::{validate, RunConfig};
use veeam_metrics_core::contract::{HttpMethod, HttpRequest, HttpResponse, MockHttpTransport};
use veeam_metrics_core::error::{AuthError, TransportError};

fn test_config() -> RunConfig {
    validate(&json!({
        "api_endpoint": "https://veeam.example:9419",
        "user": "monitor@corp",
        "password": "pa ss",
        "created_after": 7,
    }))
    .expect("valid config")
}

fn transport_returning(response: Result<HttpResponse, TransportError>) -> MockHttpTransport {
    let mut transport = MockHttpTransport::new();
    transport
        .expect_execute()
        .times(1)
        .return_once(move |_| response);
    transport
}

#[tokio::test]
async fn login_posts_form_and_returns_token() {
    let mut transport = MockHttpTransport::new();
    transport
        .expect_execute()
        .times(1)
        .withf(|req: &HttpRequest| {
            req.method == HttpMethod::Post
                && req.url == "https://veeam.example:9419/api/oauth2/token"
                && req.header_value("content-type") == Some("application/x-www-form-urlencoded")
                && req.header_value("x-api-version") == Some("1.1-rev2")
                && req.body.as_deref()
                    == Some("grant_type=password&username=monitor%40corp&password=pa+ss")
        })
        .returning(|_| Ok(HttpResponse::new(200, r#"{"access_token":"T","token_type":"bearer"}"#)));

    let token = login(&transport, &test_config()).await.expect("login should succeed");
    assert_eq!(token.as_str(), "T");
}

#[tokio::test]
async fn non_200_status_is_rejected_with_status_and_body() {
    let transport = transport_returning(Ok(HttpResponse::new(403, "Forbidden")));
    let err = login(&transport, &test_config()).await.unwrap_err();
    assert_eq!(
        err,
        AuthError::Rejected {
            status: 403,
            body: "Forbidden".into()
        }
    );
    assert!(err.to_string().contains("403"));
}

#[tokio::test]
async fn missing_body_is_rejected_even_with_200() {
    let transport = transport_returning(Ok(HttpResponse::empty(200)));
    let err = login(&transport, &test_config()).await.unwrap_err();
    assert_eq!(err.to_string(), "Login failed with status code 200: null");
}

#[tokio::test]
async fn unparseable_body_is_a_parse_error() {
    let transport = transport_returning(Ok(HttpResponse::new(200, "<html>login</html>")));
    let err = login(&transport, &test_config()).await.unwrap_err();
    assert_eq!(err, AuthError::Unparseable);
    assert_eq!(
        err.to_string(),
        "Failed to parse authentication token for the logon session."
    );
}

#[tokio::test]
async fn empty_200_body_is_a_parse_error() {
    let transport = transport_returning(Ok(HttpResponse::new(200, "")));
    let err = login(&transport, &test_config()).await.unwrap_err();
    assert_eq!(err, AuthError::Unparseable);
}

#[tokio::test]
async fn empty_error_body_reads_null() {
    let transport = transport_returning(Ok(HttpResponse::new(401, "")));
    let err = login(&transport, &test_config()).await.unwrap_err();
    assert_eq!(err.to_string(), "Login failed with status code 401: null");
}

#[tokio::test]
async fn body_without_access_token_is_rejected() {
    let transport = transport_returning(Ok(HttpResponse::new(200, r#"{"refresh_token":"R"}"#)));
    let err = login(&transport, &test_config()).await.unwrap_err();
    assert_eq!(err, AuthError::MissingToken);
}

#[tokio::test]
async fn transport_failure_is_an_auth_error() {
    let transport = transport_returning(Err(TransportError("connection refused".into())));
    let err = login(&transport, &test_config()).await.unwrap_err();
    assert!(matches!(err, AuthError::Transport(_)));
    assert!(err.to_string().contains("connection refused"));
}
