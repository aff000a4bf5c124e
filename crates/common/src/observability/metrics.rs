//! Injected metrics sink for connector telemetry.

use std::fmt::Debug;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde_json::Value;

/// Event names emitted by the call executor.
pub mod events {
    /// One per attempt, carrying attempt index, duration, and outcome.
    pub const ATTEMPT: &str = "attempt";
    /// Emitted before each backoff wait.
    pub const RETRY: &str = "retry";
    /// Terminal: the call returned a payload.
    pub const SUCCESS: &str = "success";
    /// Terminal: the retry budget ran out in a retryable category.
    pub const RETRIES_EXHAUSTED: &str = "retries_exhausted";
    /// Terminal: a fatal category ended the call immediately.
    pub const FATAL: &str = "fatal";
}

/// Receiver for structured connector telemetry.
///
/// Implementations are invoked synchronously from inside the attempt loop
/// and must be cheap; anything expensive belongs behind a channel. A sink
/// must be safe to call concurrently from simultaneous `execute()` calls,
/// which the `Send + Sync` bound plus `&self` receiver enforce.
pub trait MetricsSink: Send + Sync + Debug {
    /// Record one event. Must not panic; a panicking sink is caught and
    /// the event dropped (see [`emit`]), never surfaced to the caller.
    fn record(&self, event: &str, payload: &Value);
}

/// Default sink: discards every event.
///
/// A plain local value, deliberately not a process-wide singleton, so two
/// connector instances can carry different sinks.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn record(&self, _event: &str, _payload: &Value) {}
}

/// Invoke a sink, swallowing any panic it raises.
///
/// Telemetry failures must never mask the real outcome of a call, so a
/// misbehaving sink costs us one log line and nothing else.
pub fn emit(sink: &dyn MetricsSink, event: &str, payload: &Value) {
    let outcome = catch_unwind(AssertUnwindSafe(|| sink.record(event, payload)));
    if outcome.is_err() {
        tracing::warn!(event, "metrics sink panicked; event dropped");
    }
}
