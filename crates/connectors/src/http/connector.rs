//! HTTP connector: URL joining plus the executor-driven attempt loop.

use std::sync::Arc;

use relay_common::{CallExecutor, ConnectorConfig, ConnectorError, ConnectorResult, EnvSource};
use reqwest::Method;
use serde_json::Value;
use url::Url;

use super::taxonomy::HttpTaxonomy;
use super::transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use super::HTTP_DEFAULTS;

/// Outbound HTTP connector bound to one base URL.
///
/// Every request goes through the shared call executor, so retries,
/// backoff, rate-limit waits, and metrics behave identically to the
/// other families.
pub struct HttpConnector {
    executor: CallExecutor<HttpTaxonomy>,
    transport: Arc<dyn HttpTransport>,
    base_url: Url,
}

impl HttpConnector {
    /// Build a connector over an injected transport.
    ///
    /// # Errors
    /// Returns `ConnectorError::Configuration` when the config's backoff
    /// parameters are out of range.
    pub fn new(
        config: ConnectorConfig,
        transport: Arc<dyn HttpTransport>,
        base_url: Url,
    ) -> ConnectorResult<Self> {
        let executor = CallExecutor::new(config, HttpTaxonomy)?;
        Ok(Self { executor, transport, base_url })
    }

    /// Build a connector from environment configuration with the
    /// reqwest transport.
    ///
    /// `prefix` is the connector-specific env prefix (e.g. `GITHUB`);
    /// `HTTP` keys and family defaults fill in the rest.
    ///
    /// # Errors
    /// Returns `ConnectorError::Configuration` for unparseable or
    /// out-of-range environment values.
    pub fn from_env(
        prefix: Option<&str>,
        base_url: Url,
        source: &dyn EnvSource,
    ) -> ConnectorResult<Self> {
        let config = ConnectorConfig::from_env(&HTTP_DEFAULTS, prefix, source)?;
        let transport = Arc::new(ReqwestTransport::from_config(&config)?);
        Self::new(config, transport, base_url)
    }

    pub fn config(&self) -> &ConnectorConfig {
        self.executor.config()
    }

    pub async fn get(&self, path: &str) -> ConnectorResult<HttpResponse> {
        self.send_json(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> ConnectorResult<HttpResponse> {
        self.send_json(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> ConnectorResult<HttpResponse> {
        self.send_json(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> ConnectorResult<HttpResponse> {
        self.send_json(Method::DELETE, path, None).await
    }

    /// Issue one logical request with retry.
    ///
    /// The request is fully bound before the loop starts and cloned per
    /// attempt, so every retry sends identical bytes.
    pub async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> ConnectorResult<HttpResponse> {
        let url = self.base_url.join(path).map_err(|err| {
            ConnectorError::configuration_field(format!("invalid request path {path:?}: {err}"), "path")
        })?;
        let operation = format!("{method} {path}");
        let request = HttpRequest { method, url, body: body.cloned() };

        let transport = Arc::clone(&self.transport);
        self.executor
            .execute(&operation, move || {
                let transport = Arc::clone(&transport);
                let request = request.clone();
                async move { transport.send(request).await }
            })
            .await
    }
}
