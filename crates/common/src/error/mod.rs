//! Error taxonomy shared by every connector family.
//!
//! The taxonomy separates two concerns that the retry machinery must not
//! mix up:
//!
//! 1. **[`Category`]** is the internal classification value that drives the
//!    attempt loop. It describes a single failed attempt and never crosses
//!    the executor boundary on its own.
//! 2. **[`ConnectorError`]** is the typed terminal error a caller receives.
//!    Only `Configuration`, `Unauthorized`, `Permanent`, and
//!    `RetriesExhausted` ever propagate; retryable categories are consumed
//!    by the loop until they either succeed or exhaust the budget.
//!
//! A successful attempt is represented by `Ok(_)` from the transport, not
//! by a category, which keeps classification total over failures.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Result type alias for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Classification of a single failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Generic server-side failure (5xx or equivalent). Retryable.
    Transient,
    /// The endpoint asked us to slow down (429 or a throttle signal).
    /// Retryable; a server-supplied hint overrides the computed backoff.
    RateLimited,
    /// Credentials rejected (401/403 or an auth-failure signal). Fatal,
    /// never retried: retrying cannot fix a bad token.
    Unauthorized,
    /// Caller or payload error (other 4xx, invalid statement). Fatal.
    Permanent,
    /// Failure before any response arrived: connection refused, DNS,
    /// reset, or a per-attempt deadline overrun. Retryable.
    Network,
}

impl Category {
    /// Whether the attempt loop may issue another attempt for this
    /// category (budget permitting).
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Transient | Self::RateLimited | Self::Network)
    }

    /// Stable name used in metrics payloads and log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::RateLimited => "rate_limited",
            Self::Unauthorized => "unauthorized",
            Self::Permanent => "permanent",
            Self::Network => "network",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vendor-agnostic record of the last raw outcome of a failed call.
///
/// Carried by terminal errors so the enclosing workflow step can decide
/// whether to alert, escalate, or fail without re-issuing the call.
#[derive(Debug, Clone, Default)]
pub struct FailureDetail {
    /// Protocol status code, when one was received (HTTP status, etc.).
    pub status: Option<u16>,
    /// Vendor or driver error code, when one was reported.
    pub code: Option<String>,
    /// Human-readable description of the failure.
    pub message: String,
    /// Raw response body, when one was received and small enough to keep.
    pub body: Option<String>,
}

impl FailureDetail {
    /// Detail with only a message, for failures without a response.
    pub fn from_message(message: impl Into<String>) -> Self {
        Self { message: message.into(), ..Self::default() }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

impl fmt::Display for FailureDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, self.code.as_deref()) {
            (Some(status), Some(code)) => {
                write!(f, "{} (status {status}, code {code})", self.message)
            }
            (Some(status), None) => write!(f, "{} (status {status})", self.message),
            (None, Some(code)) => write!(f, "{} (code {code})", self.message),
            (None, None) => f.write_str(&self.message),
        }
    }
}

/// Terminal error returned by a connector call.
///
/// Exactly one of these crosses the executor boundary per failed logical
/// call; the retryable categories stay internal to the attempt loop.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The connector configuration is invalid or incomplete. Raised at
    /// construction time, never deferred to the first call.
    #[error("invalid connector configuration: {message}")]
    Configuration {
        message: String,
        /// Configuration field or environment key at fault, when known.
        field: Option<String>,
    },

    /// Credentials were rejected. Failing fast: this indicates a caller
    /// or configuration problem, not infrastructure flakiness.
    #[error("authentication rejected after {attempts} attempt(s): {detail}")]
    Unauthorized { detail: FailureDetail, attempts: u32 },

    /// The endpoint rejected the request in a way a retry cannot fix.
    #[error("permanent failure after {attempts} attempt(s): {detail}")]
    Permanent { detail: FailureDetail, attempts: u32 },

    /// The retry budget ran out while the failure was still retryable.
    /// Wraps the last observed cause.
    #[error("retries exhausted after {attempts} attempt(s), last {last_category} failure: {detail}")]
    RetriesExhausted {
        detail: FailureDetail,
        /// Category of the final attempt's failure.
        last_category: Category,
        attempts: u32,
    },
}

impl ConnectorError {
    /// Configuration error without a specific field.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into(), field: None }
    }

    /// Configuration error naming the offending field or env key.
    pub fn configuration_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Configuration { message: message.into(), field: Some(field.into()) }
    }

    /// Number of attempts the executor issued before giving up. Zero for
    /// configuration errors, which never reach the attempt loop.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Configuration { .. } => 0,
            Self::Unauthorized { attempts, .. }
            | Self::Permanent { attempts, .. }
            | Self::RetriesExhausted { attempts, .. } => *attempts,
        }
    }

    /// The last raw outcome, when the error wraps one.
    pub fn detail(&self) -> Option<&FailureDetail> {
        match self {
            Self::Configuration { .. } => None,
            Self::Unauthorized { detail, .. }
            | Self::Permanent { detail, .. }
            | Self::RetriesExhausted { detail, .. } => Some(detail),
        }
    }
}

/// Severity levels for monitoring and alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    /// Informational, expected conditions.
    Info,
    /// Degraded but operational (throttling, exhausted retries).
    Warning,
    /// Failure requiring attention (bad credentials, bad config).
    Error,
    /// System integrity at risk.
    Critical,
}

/// Standard interface for classifying errors by their characteristics.
///
/// Lets workflow steps make retry/alert decisions without matching on
/// concrete error types.
pub trait ErrorClassification {
    /// Can the *enclosing operation* be re-issued later with a chance of
    /// success?
    fn is_retryable(&self) -> bool;

    /// How serious is this error for monitoring purposes?
    fn severity(&self) -> ErrorSeverity;

    /// Does this require immediate attention?
    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    /// Suggested delay before re-issuing, if applicable.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl ErrorClassification for ConnectorError {
    fn is_retryable(&self) -> bool {
        // RetriesExhausted is terminal for this call, but the workflow
        // step that issued it may reasonably schedule a fresh call later.
        match self {
            Self::RetriesExhausted { .. } => true,
            Self::Configuration { .. } | Self::Unauthorized { .. } | Self::Permanent { .. } => {
                false
            }
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::RetriesExhausted { .. } => ErrorSeverity::Warning,
            Self::Configuration { .. } | Self::Unauthorized { .. } | Self::Permanent { .. } => {
                ErrorSeverity::Error
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for the error taxonomy.

    use super::*;

    /// Validates `Category::is_retryable` for every variant.
    ///
    /// Assertions:
    /// - Ensures `Transient`, `RateLimited`, and `Network` are retryable.
    /// - Ensures `Unauthorized` and `Permanent` are not.
    #[test]
    fn test_category_retryability() {
        assert!(Category::Transient.is_retryable());
        assert!(Category::RateLimited.is_retryable());
        assert!(Category::Network.is_retryable());
        assert!(!Category::Unauthorized.is_retryable());
        assert!(!Category::Permanent.is_retryable());
    }

    #[test]
    fn test_failure_detail_display() {
        let detail = FailureDetail::from_message("boom").with_status(503).with_code("ECONN");
        assert_eq!(detail.to_string(), "boom (status 503, code ECONN)");

        let bare = FailureDetail::from_message("boom");
        assert_eq!(bare.to_string(), "boom");
    }

    #[test]
    fn test_connector_error_display_carries_attempts() {
        let err = ConnectorError::RetriesExhausted {
            detail: FailureDetail::from_message("server error").with_status(500),
            last_category: Category::Transient,
            attempts: 4,
        };
        let rendered = err.to_string();
        assert!(rendered.contains("4 attempt(s)"));
        assert!(rendered.contains("transient"));
        assert!(rendered.contains("status 500"));
    }

    /// Validates `ErrorClassification` for `ConnectorError`.
    ///
    /// Assertions:
    /// - `RetriesExhausted` is retryable at the workflow level with
    ///   `Warning` severity.
    /// - `Unauthorized` and `Configuration` are fatal with `Error`
    ///   severity and not critical.
    #[test]
    fn test_error_classification() {
        let exhausted = ConnectorError::RetriesExhausted {
            detail: FailureDetail::from_message("x"),
            last_category: Category::Network,
            attempts: 2,
        };
        assert!(exhausted.is_retryable());
        assert_eq!(exhausted.severity(), ErrorSeverity::Warning);

        let unauthorized = ConnectorError::Unauthorized {
            detail: FailureDetail::from_message("bad token").with_status(401),
            attempts: 1,
        };
        assert!(!unauthorized.is_retryable());
        assert_eq!(unauthorized.severity(), ErrorSeverity::Error);
        assert!(!unauthorized.is_critical());

        let config = ConnectorError::configuration_field("missing credential", "SQL_AUTH_TOKEN");
        assert!(!config.is_retryable());
        assert_eq!(config.attempts(), 0);
        assert!(config.detail().is_none());
    }
}
