//! Status-code classification for the HTTP family.

use std::time::Duration;

use relay_common::{Category, FailureDetail, Taxonomy};
use tracing::debug;

/// A failed HTTP attempt: either a non-2xx response or a transport-level
/// fault that produced no response at all (`status: None`).
#[derive(Debug, Clone)]
pub struct HttpFailure {
    pub status: Option<u16>,
    /// Parsed Retry-After header, when the server sent a usable one.
    pub retry_after: Option<Duration>,
    pub message: String,
    /// Response body, truncated upstream if huge; absent for transport
    /// faults.
    pub body: Option<String>,
}

impl HttpFailure {
    /// A fault before any response arrived (DNS, connect, TLS, read).
    pub fn transport(message: impl Into<String>) -> Self {
        Self { status: None, retry_after: None, message: message.into(), body: None }
    }

    /// A non-2xx response.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            retry_after: None,
            message: format!("http status {status}"),
            body: Some(body.into()),
        }
    }

    #[must_use]
    pub fn with_retry_after(mut self, hint: Option<Duration>) -> Self {
        self.retry_after = hint;
        self
    }
}

/// Map a non-2xx status onto a category.
///
/// Priority order: 401/403 are credential rejections, 429 is throttling,
/// any 5xx may clear on its own, every other status is treated as a
/// request that will never succeed as written.
pub fn classify_status(status: u16) -> Category {
    match status {
        401 | 403 => Category::Unauthorized,
        429 => Category::RateLimited,
        500..=599 => Category::Transient,
        _ => Category::Permanent,
    }
}

/// Parse a Retry-After header value as a number of seconds.
///
/// Integer and fractional seconds are accepted; HTTP-date values and
/// garbage fall back to the computed backoff, logged at debug so a
/// misbehaving server is visible without spamming warnings.
pub(crate) fn parse_retry_after(raw: &str) -> Option<Duration> {
    match raw.trim().parse::<f64>() {
        Ok(secs) if secs >= 0.0 && secs.is_finite() => Some(Duration::from_secs_f64(secs)),
        _ => {
            debug!(value = raw, "unusable Retry-After header, falling back to backoff");
            None
        }
    }
}

/// [`Taxonomy`] for HTTP failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTaxonomy;

impl Taxonomy for HttpTaxonomy {
    type Failure = HttpFailure;

    fn classify(&self, failure: &HttpFailure) -> Category {
        match failure.status {
            Some(status) => classify_status(status),
            // No response at all: connection-level fault.
            None => Category::Network,
        }
    }

    fn retry_after(&self, failure: &HttpFailure) -> Option<Duration> {
        failure.retry_after
    }

    fn detail(&self, failure: &HttpFailure) -> FailureDetail {
        let mut detail = FailureDetail::from_message(failure.message.clone());
        if let Some(status) = failure.status {
            detail = detail.with_status(status);
        }
        if let Some(body) = &failure.body {
            detail = detail.with_body(body.clone());
        }
        detail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Validates the status classification priority order.
    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(401), Category::Unauthorized);
        assert_eq!(classify_status(403), Category::Unauthorized);
        assert_eq!(classify_status(429), Category::RateLimited);
        assert_eq!(classify_status(500), Category::Transient);
        assert_eq!(classify_status(503), Category::Transient);
        assert_eq!(classify_status(599), Category::Transient);
        assert_eq!(classify_status(400), Category::Permanent);
        assert_eq!(classify_status(404), Category::Permanent);
        assert_eq!(classify_status(418), Category::Permanent);
    }

    /// A fault with no response is a network failure regardless of
    /// remaining budget.
    #[test]
    fn test_no_response_is_network() {
        let taxonomy = HttpTaxonomy;
        let failure = HttpFailure::transport("connection refused");
        assert_eq!(taxonomy.classify(&failure), Category::Network);
    }

    #[test]
    fn test_parse_retry_after_seconds() {
        assert_eq!(parse_retry_after("3"), Some(Duration::from_secs(3)));
        assert_eq!(parse_retry_after("2.5"), Some(Duration::from_millis(2500)));
        assert_eq!(parse_retry_after(" 10 "), Some(Duration::from_secs(10)));
        assert_eq!(parse_retry_after("0"), Some(Duration::ZERO));
    }

    /// HTTP-date and garbage values fall back to the computed backoff.
    #[test]
    fn test_parse_retry_after_rejects_unusable() {
        assert_eq!(parse_retry_after("Wed, 21 Oct 2026 07:28:00 GMT"), None);
        assert_eq!(parse_retry_after("soon"), None);
        assert_eq!(parse_retry_after("-5"), None);
        assert_eq!(parse_retry_after("inf"), None);
    }

    #[test]
    fn test_detail_carries_status_and_body() {
        let taxonomy = HttpTaxonomy;
        let failure = HttpFailure::status(503, "upstream unavailable");
        let detail = taxonomy.detail(&failure);
        assert_eq!(detail.status, Some(503));
        assert_eq!(detail.body.as_deref(), Some("upstream unavailable"));
    }
}
