//! Shared failure model for the queue, SQL, and KV families.
//!
//! These families face very different vendors but fail in the same
//! handful of shapes, so they share one failure record and one taxonomy
//! instead of each reimplementing the classification.

use std::time::Duration;

use relay_common::{Category, FailureDetail, Taxonomy};

/// Shape of a failed attempt against a queue, SQL, or KV backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceFailureKind {
    /// The driver gave up waiting for the backend.
    Timeout,
    /// No listener at the configured endpoint.
    ConnectionRefused,
    /// An established connection dropped mid-operation.
    ConnectionLost,
    /// The backend shed load and asked us to slow down.
    Throttled,
    /// Credentials were rejected.
    AuthRejected,
    /// The request itself is malformed and will never succeed.
    InvalidRequest,
    /// Backend-side fault that may clear on its own.
    Server,
}

/// One failed attempt, as reported by a family transport.
#[derive(Debug, Clone)]
pub struct ResourceFailure {
    pub kind: ResourceFailureKind,
    /// Vendor error code, when the driver surfaces one.
    pub code: Option<String>,
    pub message: String,
    /// Backend-supplied wait hint, when throttled.
    pub retry_after: Option<Duration>,
}

impl ResourceFailure {
    pub fn new(kind: ResourceFailureKind, message: impl Into<String>) -> Self {
        Self { kind, code: None, message: message.into(), retry_after: None }
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_retry_after(mut self, hint: Duration) -> Self {
        self.retry_after = Some(hint);
        self
    }
}

/// Maps [`ResourceFailureKind`] onto the common category set.
///
/// One taxonomy serves all three families; a family that needs to
/// diverge later gets its own type rather than a flag on this one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceTaxonomy;

impl Taxonomy for ResourceTaxonomy {
    type Failure = ResourceFailure;

    fn classify(&self, failure: &ResourceFailure) -> Category {
        match failure.kind {
            ResourceFailureKind::Timeout
            | ResourceFailureKind::ConnectionRefused
            | ResourceFailureKind::ConnectionLost => Category::Network,
            ResourceFailureKind::Throttled => Category::RateLimited,
            ResourceFailureKind::AuthRejected => Category::Unauthorized,
            ResourceFailureKind::InvalidRequest => Category::Permanent,
            ResourceFailureKind::Server => Category::Transient,
        }
    }

    fn retry_after(&self, failure: &ResourceFailure) -> Option<Duration> {
        failure.retry_after
    }

    fn detail(&self, failure: &ResourceFailure) -> FailureDetail {
        let detail = FailureDetail::from_message(failure.message.clone());
        match &failure.code {
            Some(code) => detail.with_code(code.clone()),
            None => detail,
        }
    }
}
