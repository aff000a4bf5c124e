//! Shared primitives for Relay outbound connectors.
//!
//! Every connector family (HTTP, queue, SQL, KV) drives its vendor calls
//! through the same machinery defined here:
//!
//! - [`error`]: the terminal error taxonomy and classification traits
//! - [`observability`]: the injected metrics sink abstraction
//! - [`resilience`]: backoff policy and the resilient call executor
//! - [`config`]: the validated, immutable connector configuration model
//!
//! The executor performs no network I/O of its own; connectors inject a
//! transport closure and a per-family taxonomy, and receive either the
//! payload or one typed terminal error.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod config;
pub mod error;
pub mod observability;
pub mod resilience;
pub mod testing;

// Re-export commonly used types for convenience
// ------------------------
pub use config::{
    ConnectorConfig, ConnectorConfigBuilder, Credential, EnvSource, FamilyDefaults, ProcessEnv,
};
pub use error::{
    Category, ConnectorError, ConnectorResult, ErrorClassification, ErrorSeverity, FailureDetail,
};
pub use observability::{MetricsSink, NoopMetricsSink};
pub use resilience::{BackoffPolicy, CallExecutor, Taxonomy};
