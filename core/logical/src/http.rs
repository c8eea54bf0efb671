//! Vault HTTP API client.

use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use vaultkv_common::{Error, Result, VaultToken};

use crate::config::ClientConfig;
use crate::logical::LogicalClient;
use crate::secret::{QueryData, Secret, SecretData};

/// API version prefix prepended to every logical path.
const API_PREFIX: &str = "v1";

/// Path of the response-unwrapping endpoint.
const UNWRAP_PATH: &str = "sys/wrapping/unwrap";

/// Error body returned by the backend on failures.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<String>,
}

/// Logical client speaking the Vault HTTP API.
pub struct HttpLogical {
    http: Client,
    base: Url,
    token: VaultToken,
    namespace: Option<String>,
}

impl HttpLogical {
    /// Create a new HTTP client.
    ///
    /// # Errors
    /// - Invalid address
    /// - Unreadable or unparsable CA certificate
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base = config.base_url()?;

        let mut builder = Client::builder()
            .user_agent("vaultkv/0.1")
            .timeout(config.timeout());

        if let Some(path) = &config.ca_cert {
            let pem = std::fs::read(path)?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .or_else(|_| reqwest::Certificate::from_der(&pem))
                .map_err(|e| {
                    Error::InvalidInput(format!("Invalid CA certificate {}: {}", path.display(), e))
                })?;
            builder = builder.add_root_certificate(cert);
        }
        if config.tls_skip_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|e| Error::InvalidInput(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base,
            token: config.token.clone(),
            namespace: config.namespace.clone(),
        })
    }

    /// Create a client configured from the `VAULT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(&ClientConfig::from_env()?)
    }

    /// Resolve a logical path to its API URL.
    ///
    /// Each `/`-separated segment is percent-encoded, so `?`, `#` and `%`
    /// stay part of the path.
    fn url(&self, path: &str) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidInput(format!("Invalid base address {}", self.base)))?
            .pop_if_empty()
            .push(API_PREFIX)
            .extend(path.trim_start_matches('/').split('/'));
        Ok(url)
    }

    /// Send a single request.
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Option<&QueryData>,
        body: Option<Value>,
    ) -> Result<Response> {
        let url = self.url(path)?;
        debug!(method = %method, path = %path, "Sending logical request");

        let mut request = self
            .http
            .request(method, url)
            .header("X-Vault-Request", "true");

        if !self.token.is_empty() {
            request = request.header("X-Vault-Token", self.token.expose());
        }
        if let Some(namespace) = &self.namespace {
            request = request.header("X-Vault-Namespace", namespace);
        }
        if let Some(query) = query {
            let pairs: Vec<(&str, &str)> = query
                .iter()
                .flat_map(|(key, values)| {
                    values.iter().map(move |value| (key.as_str(), value.as_str()))
                })
                .collect();
            request = request.query(&pairs);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        request
            .send()
            .await
            .map_err(|e| Error::Network(format!("Request to {} failed: {}", path, e)))
    }

    /// Turn a response into an envelope.
    ///
    /// With `missing_ok`, a `404` yields the envelope only when the body
    /// carries data, and `None` otherwise.
    async fn handle_response(&self, response: Response, missing_ok: bool) -> Result<Option<Secret>> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(format!("Failed to read response: {}", e)))?;

        if status == StatusCode::NOT_FOUND && missing_ok {
            debug!(status = status.as_u16(), "Nothing stored at path");
            return Ok(parse_secret(&body).ok().flatten().filter(Secret::has_data));
        }

        if !status.is_success() {
            return Err(api_error(status, &body));
        }

        parse_secret(&body)
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        query: Option<&QueryData>,
        body: Option<Value>,
        missing_ok: bool,
    ) -> Result<Option<Secret>> {
        let response = self.send(method, path, query, body).await?;
        self.handle_response(response, missing_ok).await
    }
}

#[async_trait]
impl LogicalClient for HttpLogical {
    async fn read(&self, path: &str) -> Result<Option<Secret>> {
        self.call(Method::GET, path, None, None, true).await
    }

    async fn read_with_data(&self, path: &str, data: &QueryData) -> Result<Option<Secret>> {
        self.call(Method::GET, path, Some(data), None, true).await
    }

    async fn list(&self, path: &str) -> Result<Option<Secret>> {
        let method = Method::from_bytes(b"LIST")
            .map_err(|e| Error::InvalidInput(format!("Unsupported method: {}", e)))?;
        self.call(method, path, None, None, true).await
    }

    async fn write(&self, path: &str, data: SecretData) -> Result<Option<Secret>> {
        self.call(Method::PUT, path, None, Some(Value::Object(data)), false)
            .await
    }

    async fn delete(&self, path: &str) -> Result<Option<Secret>> {
        self.call(Method::DELETE, path, None, None, false).await
    }

    async fn delete_with_data(&self, path: &str, data: &QueryData) -> Result<Option<Secret>> {
        self.call(Method::DELETE, path, Some(data), None, false).await
    }

    async fn unwrap_token(&self, wrapping_token: &str) -> Result<Option<Secret>> {
        let body = if wrapping_token.is_empty() {
            None
        } else {
            Some(json!({ "token": wrapping_token }))
        };
        self.call(Method::PUT, UNWRAP_PATH, None, body, true).await
    }
}

/// Parse an envelope; blank bodies carry none.
fn parse_secret(body: &str) -> Result<Option<Secret>> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(body)
        .map(Some)
        .map_err(|e| Error::Decode(format!("Failed to parse response: {}", e)))
}

fn api_error(status: StatusCode, body: &str) -> Error {
    let errors = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(response) => response.errors,
        Err(_) if body.trim().is_empty() => Vec::new(),
        Err(_) => vec![body.trim().to_string()],
    };
    Error::Api {
        status: status.as_u16(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, Method as AxumMethod, StatusCode as AxumStatus, Uri};
    use axum::response::IntoResponse;
    use axum::Router;
    use std::sync::{Arc, Mutex};

    /// What the test server saw for one request.
    #[derive(Debug, Clone)]
    struct Seen {
        method: String,
        path: String,
        query: Option<String>,
        token: Option<String>,
        namespace: Option<String>,
        body: Option<Value>,
    }

    /// Start a server that records each request and answers with `status` and `body`.
    async fn serve(status: u16, body: &'static str) -> (ClientConfig, Arc<Mutex<Vec<Seen>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();

        let app = Router::new().fallback(
            move |method: AxumMethod, uri: Uri, headers: HeaderMap, payload: Bytes| {
                let recorder = recorder.clone();
                async move {
                    let header = |name: &str| {
                        headers
                            .get(name)
                            .and_then(|v| v.to_str().ok())
                            .map(String::from)
                    };
                    recorder.lock().unwrap().push(Seen {
                        method: method.to_string(),
                        path: uri.path().to_string(),
                        query: uri.query().map(String::from),
                        token: header("x-vault-token"),
                        namespace: header("x-vault-namespace"),
                        body: serde_json::from_slice(&payload).ok(),
                    });
                    (AxumStatus::from_u16(status).unwrap(), body).into_response()
                }
            },
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = ClientConfig {
            address: format!("http://{}", addr),
            token: VaultToken::new("hvs.test"),
            namespace: Some("team-a".to_string()),
            ..ClientConfig::default()
        };
        (config, seen)
    }

    #[tokio::test]
    async fn test_read_sends_token_and_namespace() {
        let (config, seen) = serve(200, r#"{"data": {"foo": "bar"}}"#).await;
        let client = HttpLogical::new(&config).unwrap();

        let secret = client.read("/cubbyhole/foo").await.unwrap().unwrap();
        assert_eq!(secret.data["foo"], "bar");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, "GET");
        assert_eq!(seen[0].path, "/v1/cubbyhole/foo");
        assert_eq!(seen[0].token.as_deref(), Some("hvs.test"));
        assert_eq!(seen[0].namespace.as_deref(), Some("team-a"));
    }

    #[tokio::test]
    async fn test_read_with_data_sends_query() {
        let (config, seen) = serve(200, r#"{"data": {"data": {}, "metadata": {}}}"#).await;
        let client = HttpLogical::new(&config).unwrap();

        let mut query = QueryData::new();
        query.insert("version".to_string(), vec!["3".to_string()]);
        client
            .read_with_data("/secret/data/app", &query)
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].path, "/v1/secret/data/app");
        assert_eq!(seen[0].query.as_deref(), Some("version=3"));
    }

    #[tokio::test]
    async fn test_list_uses_list_method() {
        let (config, seen) = serve(200, r#"{"data": {"keys": ["a", "b/"]}}"#).await;
        let client = HttpLogical::new(&config).unwrap();

        let secret = client.list("/secret/metadata/app").await.unwrap().unwrap();
        assert_eq!(secret.data["keys"], json!(["a", "b/"]));
        assert_eq!(seen.lock().unwrap()[0].method, "LIST");
    }

    #[tokio::test]
    async fn test_write_sends_json_body() {
        let (config, seen) = serve(204, "").await;
        let client = HttpLogical::new(&config).unwrap();

        let mut data = SecretData::new();
        data.insert("foo".to_string(), json!("bar"));
        let result = client.write("/cubbyhole/foo", data).await.unwrap();
        assert!(result.is_none());

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].method, "PUT");
        assert_eq!(seen[0].body, Some(json!({"foo": "bar"})));
    }

    #[tokio::test]
    async fn test_read_not_found_is_none() {
        let (config, _) = serve(404, r#"{"errors": []}"#).await;
        let client = HttpLogical::new(&config).unwrap();

        assert!(client.read("/cubbyhole/missing").await.unwrap().is_none());
        assert!(client.list("/cubbyhole/").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_not_found_keeps_payload() {
        let body = r#"{"data": {"data": null, "metadata": {"version": 2, "destroyed": true}}}"#;
        let (config, _) = serve(404, body).await;
        let client = HttpLogical::new(&config).unwrap();

        let secret = client.read("/secret/data/gone").await.unwrap().unwrap();
        assert_eq!(secret.data["metadata"]["version"], 2);
    }

    #[tokio::test]
    async fn test_write_error_status() {
        let body = r#"{"errors": ["check-and-set parameter did not match the current version"]}"#;
        let (config, _) = serve(400, body).await;
        let client = HttpLogical::new(&config).unwrap();

        let err = client
            .write("/secret/data/app", SecretData::new())
            .await
            .unwrap_err();
        match err {
            Error::Api { status, errors } => {
                assert_eq!(status, 400);
                assert_eq!(
                    errors,
                    vec!["check-and-set parameter did not match the current version"]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_not_found_is_error() {
        let (config, _) = serve(404, "").await;
        let client = HttpLogical::new(&config).unwrap();

        let err = client.delete("/cubbyhole/missing").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_delete_with_data_sends_query() {
        let (config, seen) = serve(204, "").await;
        let client = HttpLogical::new(&config).unwrap();

        let mut query = QueryData::new();
        query.insert("versions".to_string(), vec!["1".to_string(), "2".to_string()]);
        client
            .delete_with_data("/secret/data/app", &query)
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].method, "DELETE");
        assert_eq!(seen[0].query.as_deref(), Some("versions=1&versions=2"));
    }

    #[tokio::test]
    async fn test_unwrap_posts_token() {
        let (config, seen) = serve(200, r#"{"data": {"password": "hunter2"}}"#).await;
        let client = HttpLogical::new(&config).unwrap();

        let secret = client.unwrap_token("hvs.wrapping").await.unwrap().unwrap();
        assert_eq!(secret.data["password"], "hunter2");

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].method, "PUT");
        assert_eq!(seen[0].path, "/v1/sys/wrapping/unwrap");
        assert_eq!(seen[0].body, Some(json!({"token": "hvs.wrapping"})));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let (config, _) = serve(200, "<html>proxy error</html>").await;
        let client = HttpLogical::new(&config).unwrap();

        let err = client.read("/cubbyhole/foo").await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = ClientConfig {
            address: format!("http://{}", addr),
            ..ClientConfig::default()
        };
        let client = HttpLogical::new(&config).unwrap();

        let err = client.read("/cubbyhole/foo").await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[test]
    fn test_url_under_base_path() {
        let config = ClientConfig {
            address: "https://proxy.example.com/vault".to_string(),
            ..ClientConfig::default()
        };
        let client = HttpLogical::new(&config).unwrap();
        assert_eq!(
            client.url("/secret/data/app").unwrap().as_str(),
            "https://proxy.example.com/vault/v1/secret/data/app"
        );
    }

    #[test]
    fn test_url_escapes_reserved_characters() {
        let client = HttpLogical::new(&ClientConfig::default()).unwrap();

        let url = client.url("/secret/data/a?b#c").unwrap();
        assert_eq!(url.path(), "/v1/secret/data/a%3Fb%23c");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);

        let url = client.url("/secret/100%/x").unwrap();
        assert_eq!(url.path(), "/v1/secret/100%25/x");
    }

    #[tokio::test]
    async fn test_delete_reserved_characters_hit_the_named_secret() {
        let (config, seen) = serve(204, "").await;
        let client = HttpLogical::new(&config).unwrap();

        client.delete("/secret/a?b").await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].path, "/v1/secret/a%3Fb");
        assert_eq!(seen[0].query, None);
    }

    #[test]
    fn test_missing_ca_cert_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            ca_cert: Some(dir.path().join("ca.pem")),
            ..ClientConfig::default()
        };
        assert!(matches!(HttpLogical::new(&config), Err(Error::Io(_))));
    }
}
