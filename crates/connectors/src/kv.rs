//! Key-value store connector family.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use relay_common::{CallExecutor, ConnectorConfig, ConnectorResult, EnvSource, FamilyDefaults};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resource::{ResourceFailure, ResourceTaxonomy};

/// Family tunables consulted when no environment override is present.
/// KV backends refuse to construct without a credential.
pub const KV_DEFAULTS: FamilyDefaults = FamilyDefaults {
    canonical_prefix: "KV",
    timeout: Duration::from_secs(2),
    max_retries: 3,
    backoff_base: Duration::from_millis(100),
    jitter_fraction: 0.1,
    credential_required: true,
};

/// One store command, e.g. `GET key` or `SET key value`. Arguments are
/// opaque JSON values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KvCommand {
    pub name: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl KvCommand {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), args: Vec::new() }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Performs exactly one command against a store.
#[async_trait]
pub trait KvTransport: Send + Sync {
    async fn command(&self, command: KvCommand) -> Result<Value, ResourceFailure>;
}

/// KV connector: commands with retry, plus get/set conveniences.
pub struct KvConnector {
    executor: CallExecutor<ResourceTaxonomy>,
    transport: Arc<dyn KvTransport>,
}

impl KvConnector {
    /// # Errors
    /// Returns `ConnectorError::Configuration` when the config's backoff
    /// parameters are out of range.
    pub fn new(config: ConnectorConfig, transport: Arc<dyn KvTransport>) -> ConnectorResult<Self> {
        let executor = CallExecutor::new(config, ResourceTaxonomy)?;
        Ok(Self { executor, transport })
    }

    /// # Errors
    /// Returns `ConnectorError::Configuration` for unparseable values or
    /// when the required credential is absent.
    pub fn from_env(
        prefix: Option<&str>,
        transport: Arc<dyn KvTransport>,
        source: &dyn EnvSource,
    ) -> ConnectorResult<Self> {
        let config = ConnectorConfig::from_env(&KV_DEFAULTS, prefix, source)?;
        Self::new(config, transport)
    }

    pub fn config(&self) -> &ConnectorConfig {
        self.executor.config()
    }

    /// Run one command with retry. A missing key is `Value::Null`, not an
    /// error.
    pub async fn command(&self, command: KvCommand) -> ConnectorResult<Value> {
        let operation = format!("kv_{}", command.name.to_lowercase());
        let transport = Arc::clone(&self.transport);

        self.executor
            .execute(&operation, move || {
                let transport = Arc::clone(&transport);
                let command = command.clone();
                async move { transport.command(command).await }
            })
            .await
    }

    pub async fn get(&self, key: &str) -> ConnectorResult<Value> {
        self.command(KvCommand::new("GET").arg(key)).await
    }

    pub async fn set(&self, key: &str, value: Value) -> ConnectorResult<()> {
        self.command(KvCommand::new("SET").arg(key).arg(value)).await.map(|_| ())
    }
}
