use async_trait::async_trait;
use reqwest::{Client, Proxy};
use tracing::debug;

use crate::config::RunConfig;
use crate::contract::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::error::TransportError;

/// [`HttpTransport`] backed by a single `reqwest` client.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds the client for one run: proxy and timeout come from the config.
    pub fn from_config(config: &RunConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder();

        if let Some(proxy) = &config.http_proxy {
            let proxy_url = with_scheme(proxy);
            debug!(proxy = %proxy_url, "Routing requests through proxy");
            builder = builder.proxy(Proxy::all(&proxy_url).map_err(|e| {
                debug!(error = ?e, proxy = %proxy_url, "Invalid proxy");
                TransportError(format!("invalid proxy {proxy_url}: {e}"))
            })?);
        }
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build()?;
        Ok(ReqwestTransport { client })
    }
}

/// Proxies given as `host:port` are plain HTTP proxies.
fn with_scheme(proxy: &str) -> String {
    if proxy.contains("://") {
        proxy.to_string()
    } else {
        format!("http://{proxy}")
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            debug!(error = ?e, url = %request.url, "HTTP request failed");
            TransportError::from(e)
        })?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        debug!(url = %request.url, status, body_len = text.len(), "HTTP response received");

        Ok(HttpResponse::new(status, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_proxy_gets_http_scheme() {
        assert_eq!(with_scheme("proxy.local:3128"), "http://proxy.local:3128");
        assert_eq!(with_scheme("https://proxy.local"), "https://proxy.local");
    }

    /// Answers the next `times` connections on a loopback port with one canned response.
    fn serve(raw_response: &'static str, times: usize) -> String {
        use std::io::{Read, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let addr = listener.local_addr().expect("local addr");
        std::thread::spawn(move || {
            for mut stream in listener.incoming().take(times).flatten() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(raw_response.as_bytes());
            }
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn empty_200_login_body_is_a_parse_error() {
        let endpoint =
            serve("HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n", 2);
        let config = crate::config::validate(&serde_json::json!({
            "api_endpoint": endpoint,
            "user": "u",
            "password": "p",
            "created_after": 7,
            "timeout_secs": 5,
        }))
        .unwrap();
        let transport = ReqwestTransport::from_config(&config).unwrap();

        let response = transport
            .execute(HttpRequest::get(format!("{}api/oauth2/token", config.api_endpoint)))
            .await
            .unwrap();
        assert_eq!(response, HttpResponse::new(200, ""));

        let err = crate::auth::login(&transport, &config).await.unwrap_err();
        assert_eq!(err, crate::error::AuthError::Unparseable);
    }
}
