//! Resilience machinery: backoff policy and the resilient call executor.
//!
//! The executor is the single retry loop every connector family shares.
//! Families differ only in the [`Taxonomy`] they plug in, which maps their
//! raw transport failures onto the common [`crate::error::Category`] set.

pub mod backoff;
pub mod constants;
pub mod executor;
pub mod taxonomy;

pub use backoff::BackoffPolicy;
pub use executor::CallExecutor;
pub use taxonomy::Taxonomy;
