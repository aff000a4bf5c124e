//! Single-attempt HTTP transport.

use async_trait::async_trait;
use relay_common::{ConnectorConfig, ConnectorError, ConnectorResult};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::taxonomy::{parse_retry_after, HttpFailure};

/// One fully-bound HTTP attempt: method, absolute URL, optional JSON
/// body. Cloned per attempt by the connector so retries never reuse a
/// consumed request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<Value>,
}

/// A 2xx response with its body already read.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Deserialize the body as JSON. Retrying cannot fix a malformed
    /// body, so this is a plain decode error, not a connector error.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }
}

/// Performs exactly one HTTP attempt. Retry, backoff, and classification
/// live in the executor, never here.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpFailure>;
}

/// The reqwest-backed transport.
///
/// The per-attempt timeout and the bearer credential are bound into the
/// client at construction, so every request issued through it carries
/// them without per-call plumbing.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// # Errors
    /// Returns `ConnectorError::Configuration` when the credential is not
    /// header-safe or the client cannot be constructed.
    pub fn from_config(config: &ConnectorConfig) -> ConnectorResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(credential) = config.credential() {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", credential.expose()))
                .map_err(|_| {
                    ConnectorError::configuration_field(
                        "credential contains characters not valid in a header",
                        "credential",
                    )
                })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .no_proxy()
            .build()
            .map_err(|err| {
                ConnectorError::configuration(format!("failed to build http client: {err}"))
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpFailure> {
        let mut builder = self.client.request(request.method.clone(), request.url.clone());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| HttpFailure::transport(format!("request failed: {err}")))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_retry_after);

        debug!(method = %request.method, url = %request.url, %status, "received response");

        let body = response
            .text()
            .await
            .map_err(|err| HttpFailure::transport(format!("failed to read body: {err}")))?;

        if status.is_success() {
            Ok(HttpResponse { status: status.as_u16(), body })
        } else {
            Err(HttpFailure::status(status.as_u16(), body).with_retry_after(retry_after))
        }
    }
}
