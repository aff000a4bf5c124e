//! The resilient call executor: one retry loop for every connector.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tracing::{debug, error, warn};

use crate::config::ConnectorConfig;
use crate::error::{Category, ConnectorError, ConnectorResult, FailureDetail};
use crate::observability::{emit, events};
use crate::resilience::backoff::BackoffPolicy;
use crate::resilience::taxonomy::Taxonomy;

/// Orchestrates the attempt loop for a single-attempt operation.
///
/// The executor invokes the operation, classifies the outcome through the
/// family's [`Taxonomy`], applies backoff between retryable failures,
/// emits metrics, and raises a typed terminal error when appropriate. All
/// attempts for one logical call are strictly sequential; the backoff
/// wait and the operation itself are the only suspension points, both
/// ordinary awaits, so an enclosing `select!` or task abort cancels the
/// call promptly.
///
/// Each attempt is bounded by the configured timeout; a deadline overrun
/// is classified as a network failure and counts against the retry
/// budget rather than ending the call.
pub struct CallExecutor<X: Taxonomy> {
    config: ConnectorConfig,
    backoff: BackoffPolicy,
    taxonomy: X,
}

impl<X: Taxonomy> CallExecutor<X> {
    /// # Errors
    /// Returns `ConnectorError::Configuration` when the config's backoff
    /// parameters are out of range.
    pub fn new(config: ConnectorConfig, taxonomy: X) -> ConnectorResult<Self> {
        let backoff = BackoffPolicy::new(config.backoff_base(), config.jitter_fraction())?
            .with_ceiling(config.backoff_ceiling());
        Ok(Self { config, backoff, taxonomy })
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Execute `operation` with retry, backoff, and classification.
    ///
    /// `operation` performs exactly one attempt, already bound to its
    /// endpoint, payload, and auth by the calling connector. The loop
    /// issues at most `max_retries + 1` attempts and returns either the
    /// payload or one typed terminal error.
    pub async fn execute<F, Fut, T>(
        &self,
        operation_name: &str,
        mut operation: F,
    ) -> ConnectorResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, X::Failure>>,
    {
        let sink = Arc::clone(self.config.metrics_sink());
        let max_retries = self.config.max_retries();
        let mut attempt_index: u32 = 0;

        loop {
            let attempts_so_far = attempt_index + 1;
            debug!(
                operation = operation_name,
                attempt = attempts_so_far,
                budget = max_retries + 1,
                "issuing attempt"
            );

            let started = Instant::now();
            let outcome = tokio::time::timeout(self.config.timeout(), operation()).await;
            let elapsed = started.elapsed();

            let (category, detail, hint) = match outcome {
                Ok(Ok(payload)) => {
                    emit(
                        sink.as_ref(),
                        events::ATTEMPT,
                        &json!({
                            "operation": operation_name,
                            "attempt": attempts_so_far,
                            "duration_ms": elapsed.as_millis() as u64,
                            "outcome": "success",
                        }),
                    );
                    emit(
                        sink.as_ref(),
                        events::SUCCESS,
                        &json!({ "operation": operation_name, "attempts": attempts_so_far }),
                    );
                    if attempt_index > 0 {
                        debug!(
                            operation = operation_name,
                            attempts = attempts_so_far,
                            "succeeded after retries"
                        );
                    }
                    return Ok(payload);
                }
                Ok(Err(failure)) => {
                    let category = self.taxonomy.classify(&failure);
                    let hint = self.taxonomy.retry_after(&failure);
                    (category, self.taxonomy.detail(&failure), hint)
                }
                // Deadline overrun: no response arrived, counts against
                // the retry budget like any other network failure.
                Err(_) => (
                    Category::Network,
                    FailureDetail::from_message(format!(
                        "attempt timed out after {:?}",
                        self.config.timeout()
                    )),
                    None,
                ),
            };

            emit(
                sink.as_ref(),
                events::ATTEMPT,
                &json!({
                    "operation": operation_name,
                    "attempt": attempts_so_far,
                    "duration_ms": elapsed.as_millis() as u64,
                    "outcome": category.as_str(),
                }),
            );

            if !category.is_retryable() {
                warn!(
                    operation = operation_name,
                    attempt = attempts_so_far,
                    category = %category,
                    detail = %detail,
                    "fatal failure, not retrying"
                );
                emit(
                    sink.as_ref(),
                    events::FATAL,
                    &json!({
                        "operation": operation_name,
                        "attempts": attempts_so_far,
                        "category": category.as_str(),
                    }),
                );
                return Err(match category {
                    Category::Unauthorized => {
                        ConnectorError::Unauthorized { detail, attempts: attempts_so_far }
                    }
                    _ => ConnectorError::Permanent { detail, attempts: attempts_so_far },
                });
            }

            if attempt_index >= max_retries {
                error!(
                    operation = operation_name,
                    attempts = attempts_so_far,
                    category = %category,
                    detail = %detail,
                    "retry budget exhausted"
                );
                emit(
                    sink.as_ref(),
                    events::RETRIES_EXHAUSTED,
                    &json!({
                        "operation": operation_name,
                        "attempts": attempts_so_far,
                        "category": category.as_str(),
                    }),
                );
                return Err(ConnectorError::RetriesExhausted {
                    detail,
                    last_category: category,
                    attempts: attempts_so_far,
                });
            }

            // A server-supplied hint overrides the computed backoff.
            let delay = hint.unwrap_or_else(|| self.backoff.compute(attempt_index));
            warn!(
                operation = operation_name,
                attempt = attempts_so_far,
                category = %category,
                delay = ?delay,
                "attempt failed, backing off"
            );
            emit(
                sink.as_ref(),
                events::RETRY,
                &json!({
                    "operation": operation_name,
                    "attempt": attempts_so_far,
                    "category": category.as_str(),
                    "delay_ms": delay.as_millis() as u64,
                }),
            );

            tokio::time::sleep(delay).await;
            attempt_index += 1;
        }
    }
}
