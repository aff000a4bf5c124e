//! Observability abstractions for connector telemetry.
//!
//! Connectors report structured events through an injected [`MetricsSink`]
//! rather than a process-wide registry, so embedding applications decide
//! where telemetry goes (or nowhere, via the no-op default).

pub mod metrics;

pub use metrics::{emit, events, MetricsSink, NoopMetricsSink};
