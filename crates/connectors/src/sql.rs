//! SQL connector family.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use relay_common::{CallExecutor, ConnectorConfig, ConnectorResult, EnvSource, FamilyDefaults};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resource::{ResourceFailure, ResourceTaxonomy};

/// Family tunables consulted when no environment override is present.
/// SQL backends refuse to construct without a credential.
pub const SQL_DEFAULTS: FamilyDefaults = FamilyDefaults {
    canonical_prefix: "SQL",
    timeout: Duration::from_secs(5),
    max_retries: 3,
    backoff_base: Duration::from_millis(250),
    jitter_fraction: 0.1,
    credential_required: true,
};

/// One parameterized statement. The statement text is opaque; no dialect
/// translation happens here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlStatement {
    pub statement: String,
    #[serde(default)]
    pub parameters: Vec<Value>,
}

impl SqlStatement {
    pub fn new(statement: impl Into<String>) -> Self {
        Self { statement: statement.into(), parameters: Vec::new() }
    }

    #[must_use]
    pub fn bind(mut self, parameter: Value) -> Self {
        self.parameters.push(parameter);
        self
    }
}

/// Result of one executed statement: affected-row count plus any rows,
/// each row an opaque JSON object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SqlOutcome {
    pub rows_affected: u64,
    #[serde(default)]
    pub rows: Vec<Value>,
}

/// Performs exactly one statement execution against a database.
#[async_trait]
pub trait SqlTransport: Send + Sync {
    async fn execute(&self, statement: SqlStatement) -> Result<SqlOutcome, ResourceFailure>;
}

/// SQL connector: statement execution with retry.
pub struct SqlConnector {
    executor: CallExecutor<ResourceTaxonomy>,
    transport: Arc<dyn SqlTransport>,
}

impl SqlConnector {
    /// # Errors
    /// Returns `ConnectorError::Configuration` when the config's backoff
    /// parameters are out of range.
    pub fn new(config: ConnectorConfig, transport: Arc<dyn SqlTransport>) -> ConnectorResult<Self> {
        let executor = CallExecutor::new(config, ResourceTaxonomy)?;
        Ok(Self { executor, transport })
    }

    /// # Errors
    /// Returns `ConnectorError::Configuration` for unparseable values or
    /// when the required credential is absent.
    pub fn from_env(
        prefix: Option<&str>,
        transport: Arc<dyn SqlTransport>,
        source: &dyn EnvSource,
    ) -> ConnectorResult<Self> {
        let config = ConnectorConfig::from_env(&SQL_DEFAULTS, prefix, source)?;
        Self::new(config, transport)
    }

    pub fn config(&self) -> &ConnectorConfig {
        self.executor.config()
    }

    /// Execute one statement with retry.
    ///
    /// Callers are responsible for only routing idempotent statements
    /// through a retrying connector.
    pub async fn execute(&self, statement: SqlStatement) -> ConnectorResult<SqlOutcome> {
        let transport = Arc::clone(&self.transport);

        self.executor
            .execute("sql_execute", move || {
                let transport = Arc::clone(&transport);
                let statement = statement.clone();
                async move { transport.execute(statement).await }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    use relay_common::ConnectorError;
    use serde_json::json;

    use super::*;
    use crate::resource::ResourceFailureKind;

    /// Fake database that drops the connection a scripted number of
    /// times before answering.
    #[derive(Debug)]
    struct FlakyDatabase {
        failures_before_success: u32,
        attempts: AtomicU32,
    }

    #[async_trait]
    impl SqlTransport for FlakyDatabase {
        async fn execute(&self, statement: SqlStatement) -> Result<SqlOutcome, ResourceFailure> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures_before_success {
                return Err(ResourceFailure::new(
                    ResourceFailureKind::ConnectionLost,
                    "connection reset by peer",
                ));
            }
            Ok(SqlOutcome {
                rows_affected: 1,
                rows: vec![json!({"statement": statement.statement})],
            })
        }
    }

    fn fast_config(max_retries: u32) -> ConnectorConfig {
        ConnectorConfig::builder()
            .max_retries(max_retries)
            .backoff_base(Duration::from_millis(1))
            .jitter_fraction(0.0)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_execute_retries_lost_connections() {
        let db = Arc::new(FlakyDatabase { failures_before_success: 1, attempts: AtomicU32::new(0) });
        let connector = SqlConnector::new(fast_config(3), db.clone()).unwrap();

        let outcome = connector
            .execute(SqlStatement::new("select 1").bind(json!(42)))
            .await
            .unwrap();

        assert_eq!(db.attempts.load(Ordering::SeqCst), 2);
        assert_eq!(outcome.rows_affected, 1);
    }

    /// An invalid statement is permanent: one attempt, typed error.
    #[tokio::test]
    async fn test_invalid_statement_is_permanent() {
        #[derive(Debug)]
        struct RejectingDatabase;

        #[async_trait]
        impl SqlTransport for RejectingDatabase {
            async fn execute(&self, _: SqlStatement) -> Result<SqlOutcome, ResourceFailure> {
                Err(ResourceFailure::new(ResourceFailureKind::InvalidRequest, "syntax error")
                    .with_code("42601"))
            }
        }

        let connector = SqlConnector::new(fast_config(3), Arc::new(RejectingDatabase)).unwrap();
        let result = connector.execute(SqlStatement::new("selec 1")).await;

        match result {
            Err(ConnectorError::Permanent { detail, attempts }) => {
                assert_eq!(attempts, 1);
                assert_eq!(detail.code.as_deref(), Some("42601"));
            }
            other => panic!("expected Permanent, got {other:?}"),
        }
    }

    /// The family requires a credential: `from_env` without one is a
    /// fatal configuration error, raised at construction.
    #[tokio::test]
    async fn test_from_env_requires_credential() {
        #[derive(Debug)]
        struct NeverCalled;

        #[async_trait]
        impl SqlTransport for NeverCalled {
            async fn execute(&self, _: SqlStatement) -> Result<SqlOutcome, ResourceFailure> {
                unreachable!("construction must fail first")
            }
        }

        let env: HashMap<String, String> = HashMap::new();
        let result = SqlConnector::from_env(Some("BILLING"), Arc::new(NeverCalled), &env);

        match result {
            Err(ConnectorError::Configuration { field, .. }) => {
                assert_eq!(field.as_deref(), Some("BILLING_AUTH_TOKEN"));
            }
            Err(other) => panic!("expected configuration error, got {other:?}"),
            Ok(_) => panic!("expected configuration error, got a connector"),
        }
    }

    /// Throttling respects the backend's wait hint.
    #[tokio::test(start_paused = true)]
    async fn test_throttle_hint_is_honored() {
        #[derive(Debug)]
        struct ThrottlingDatabase {
            attempts: AtomicU32,
        }

        #[async_trait]
        impl SqlTransport for ThrottlingDatabase {
            async fn execute(&self, _: SqlStatement) -> Result<SqlOutcome, ResourceFailure> {
                if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ResourceFailure::new(ResourceFailureKind::Throttled, "too many queries")
                        .with_retry_after(Duration::from_secs(2)))
                } else {
                    Ok(SqlOutcome::default())
                }
            }
        }

        let db = Arc::new(ThrottlingDatabase { attempts: AtomicU32::new(0) });
        let connector = SqlConnector::new(fast_config(2), db.clone()).unwrap();

        let started = tokio::time::Instant::now();
        let outcome = connector.execute(SqlStatement::new("select 1")).await;

        assert!(outcome.is_ok());
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }
}
