//! Queue connector family.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use relay_common::{CallExecutor, ConnectorConfig, ConnectorResult, EnvSource, FamilyDefaults};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resource::{ResourceFailure, ResourceTaxonomy};

/// Family tunables consulted when no environment override is present.
pub const QUEUE_DEFAULTS: FamilyDefaults = FamilyDefaults {
    canonical_prefix: "QUEUE",
    timeout: Duration::from_secs(10),
    max_retries: 5,
    backoff_base: Duration::from_millis(500),
    jitter_fraction: 0.2,
    credential_required: false,
};

/// One message bound for a topic. The payload is opaque; no broker
/// payload translation happens here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueMessage {
    pub topic: String,
    pub payload: Value,
}

impl QueueMessage {
    pub fn new(topic: impl Into<String>, payload: Value) -> Self {
        Self { topic: topic.into(), payload }
    }
}

/// Performs exactly one publish attempt against a broker.
#[async_trait]
pub trait QueueTransport: Send + Sync {
    async fn publish(&self, message: QueueMessage) -> Result<(), ResourceFailure>;
}

/// Queue connector: publish with retry.
pub struct QueueConnector {
    executor: CallExecutor<ResourceTaxonomy>,
    transport: Arc<dyn QueueTransport>,
}

impl QueueConnector {
    /// # Errors
    /// Returns `ConnectorError::Configuration` when the config's backoff
    /// parameters are out of range.
    pub fn new(config: ConnectorConfig, transport: Arc<dyn QueueTransport>) -> ConnectorResult<Self> {
        let executor = CallExecutor::new(config, ResourceTaxonomy)?;
        Ok(Self { executor, transport })
    }

    /// # Errors
    /// Returns `ConnectorError::Configuration` for unparseable or
    /// out-of-range environment values.
    pub fn from_env(
        prefix: Option<&str>,
        transport: Arc<dyn QueueTransport>,
        source: &dyn EnvSource,
    ) -> ConnectorResult<Self> {
        let config = ConnectorConfig::from_env(&QUEUE_DEFAULTS, prefix, source)?;
        Self::new(config, transport)
    }

    pub fn config(&self) -> &ConnectorConfig {
        self.executor.config()
    }

    /// Publish one message with retry.
    pub async fn publish(&self, message: QueueMessage) -> ConnectorResult<()> {
        let operation = format!("publish {}", message.topic);
        let transport = Arc::clone(&self.transport);

        self.executor
            .execute(&operation, move || {
                let transport = Arc::clone(&transport);
                let message = message.clone();
                async move { transport.publish(message).await }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use relay_common::{Category, ConnectorError};
    use serde_json::json;

    use super::*;
    use crate::resource::ResourceFailureKind;

    /// In-memory broker that fails a scripted number of times before
    /// accepting.
    #[derive(Debug)]
    struct FlakyBroker {
        failures_before_success: u32,
        attempts: AtomicU32,
        delivered: Mutex<Vec<QueueMessage>>,
        failure_kind: ResourceFailureKind,
    }

    impl FlakyBroker {
        fn new(failures_before_success: u32, failure_kind: ResourceFailureKind) -> Self {
            Self {
                failures_before_success,
                attempts: AtomicU32::new(0),
                delivered: Mutex::new(Vec::new()),
                failure_kind,
            }
        }

        fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QueueTransport for FlakyBroker {
        async fn publish(&self, message: QueueMessage) -> Result<(), ResourceFailure> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures_before_success {
                return Err(ResourceFailure::new(self.failure_kind, "broker unavailable"));
            }
            self.delivered.lock().unwrap().push(message);
            Ok(())
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

    /// A publish that hits transient broker faults recovers within the
    /// budget and delivers exactly once.
    #[tokio::test]
    async fn test_publish_recovers_from_transient_faults() {
        let broker = Arc::new(FlakyBroker::new(2, ResourceFailureKind::Server));
        let connector = QueueConnector::new(fast_config(5), broker.clone()).unwrap();

        let message = QueueMessage::new("orders", json!({"order_id": 7}));
        connector.publish(message).await.unwrap();

        assert_eq!(broker.attempts(), 3);
        let delivered = broker.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].topic, "orders");
    }

    /// Rejected credentials surface immediately without consuming the
    /// budget.
    #[tokio::test]
    async fn test_publish_auth_rejection_fails_fast() {
        let broker = Arc::new(FlakyBroker::new(u32::MAX, ResourceFailureKind::AuthRejected));
        let connector = QueueConnector::new(fast_config(5), broker.clone()).unwrap();

        let result = connector.publish(QueueMessage::new("orders", json!({}))).await;

        assert_eq!(broker.attempts(), 1);
        assert!(matches!(result, Err(ConnectorError::Unauthorized { .. })));
    }

    /// A broker that never comes back exhausts the budget as a network
    /// failure.
    #[tokio::test]
    async fn test_publish_exhausts_budget() {
        let broker = Arc::new(FlakyBroker::new(u32::MAX, ResourceFailureKind::ConnectionRefused));
        let connector = QueueConnector::new(fast_config(2), broker.clone()).unwrap();

        let result = connector.publish(QueueMessage::new("orders", json!({}))).await;

        assert_eq!(broker.attempts(), 3);
        match result {
            Err(ConnectorError::RetriesExhausted { last_category, attempts, .. }) => {
                assert_eq!(last_category, Category::Network);
                assert_eq!(attempts, 3);
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }
}
