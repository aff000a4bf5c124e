//! Per-family classification strategy.

use std::fmt::Debug;
use std::time::Duration;

use crate::error::{Category, FailureDetail};

/// Strategy that maps one connector family's raw failures onto the common
/// [`Category`] set.
///
/// Families differ wildly in what a failure looks like (HTTP status codes,
/// AMQP channel errors, SQL driver errors), but all of them collapse onto
/// the same five categories, which is what lets a single executor serve
/// every connector.
///
/// `classify` must be pure: identical failures always yield identical
/// categories.
pub trait Taxonomy: Send + Sync {
    /// Raw failure type produced by this family's transport.
    type Failure: Debug + Send;

    /// Map a failed attempt onto a category.
    fn classify(&self, failure: &Self::Failure) -> Category;

    /// Server-supplied wait hint (e.g. Retry-After). When present it
    /// overrides the computed backoff for the next wait. Hints are local
    /// to one logical call and never shared across calls.
    fn retry_after(&self, _failure: &Self::Failure) -> Option<Duration> {
        None
    }

    /// Vendor-agnostic detail record for terminal error reporting.
    fn detail(&self, failure: &Self::Failure) -> FailureDetail;
}
