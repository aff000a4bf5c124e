//! HTTP connector family.
//!
//! [`HttpConnector`] drives an [`HttpTransport`] through the shared call
//! executor; [`ReqwestTransport`] is the concrete transport. Status
//! classification lives in [`taxonomy`] as a pure function so it can be
//! tested without any I/O.

mod connector;
mod taxonomy;
mod transport;

use std::time::Duration;

use relay_common::FamilyDefaults;

pub use connector::HttpConnector;
pub use taxonomy::{classify_status, HttpFailure, HttpTaxonomy};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

/// Family tunables consulted when no environment override is present.
pub const HTTP_DEFAULTS: FamilyDefaults = FamilyDefaults {
    canonical_prefix: "HTTP",
    timeout: Duration::from_secs(30),
    max_retries: 3,
    backoff_base: Duration::from_millis(600),
    jitter_fraction: 0.2,
    credential_required: false,
};
