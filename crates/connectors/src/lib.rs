//! Connector families for the Relay workflow engine.
//!
//! Each family (HTTP, queue, SQL, KV) pairs a capability trait that
//! performs exactly one attempt with a taxonomy that classifies that
//! family's failures, and drives both through the shared
//! [`relay_common::CallExecutor`]. The executor owns retry, backoff,
//! rate-limit waits, and metrics; the modules here own only transport
//! mechanics and classification.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod http;
pub mod kv;
pub mod protocol;
pub mod queue;
pub mod resource;
pub mod sql;

pub use http::{
    classify_status, HttpConnector, HttpFailure, HttpRequest, HttpResponse, HttpTaxonomy,
    HttpTransport, ReqwestTransport, HTTP_DEFAULTS,
};
pub use kv::{KvCommand, KvConnector, KvTransport, KV_DEFAULTS};
pub use protocol::{PluginRequest, PluginResponse, ProtocolError, RequestKind, ResponseStatus};
pub use queue::{QueueConnector, QueueMessage, QueueTransport, QUEUE_DEFAULTS};
pub use resource::{ResourceFailure, ResourceFailureKind, ResourceTaxonomy};
pub use sql::{SqlConnector, SqlOutcome, SqlStatement, SqlTransport, SQL_DEFAULTS};
