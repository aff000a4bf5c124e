//! Test utilities shared across Relay crates.
//!
//! Kept in the library (rather than duplicated per test module) so the
//! connectors crate can drive the same helpers in its integration tests.

use std::sync::Mutex;

use serde_json::Value;

use crate::observability::MetricsSink;

/// Sink that records every event for later assertion.
#[derive(Debug, Default)]
pub struct RecordingMetricsSink {
    events: Mutex<Vec<(String, Value)>>,
}

impl RecordingMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded (event, payload) pairs in emission order.
    pub fn events(&self) -> Vec<(String, Value)> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Names of recorded events, in order.
    pub fn event_names(&self) -> Vec<String> {
        self.events().into_iter().map(|(name, _)| name).collect()
    }

    /// Number of events recorded under the given name.
    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|(name, _)| name == event).count()
    }
}

impl MetricsSink for RecordingMetricsSink {
    fn record(&self, event: &str, payload: &Value) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push((event.to_string(), payload.clone()));
        }
    }
}
