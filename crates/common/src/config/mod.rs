//! Connector configuration model.
//!
//! Every connector family shares the same validated parameter bag:
//! per-attempt timeout, retry budget, backoff base, jitter fraction, an
//! optional backoff ceiling, an opaque credential, and the injected
//! metrics sink. A config is constructed once per connector instance and
//! immutable thereafter.
//!
//! ## Environment resolution
//!
//! `from_env` resolves each field in order: the connector-specific
//! prefixed key (`{PREFIX}_{FIELD}`), then the family's canonical key
//! (`{CANONICAL}_{FIELD}`), then the family's hardcoded default. A
//! required credential missing at both levels is a fatal configuration
//! error at construction time, never deferred to the first call.
//!
//! Recognized fields: `TIMEOUT_SECS`, `MAX_RETRIES`, `BACKOFF_BASE_MS`,
//! `JITTER`, `BACKOFF_CEILING_MS`, `AUTH_TOKEN`. Deployments configured
//! against the older surface keep working: `TIMEOUT` (float seconds) and
//! `BACKOFF_FACTOR` (float seconds) are accepted as fallbacks when the
//! newer key is absent.

mod env;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub use env::{EnvSource, ProcessEnv};

use crate::error::{ConnectorError, ConnectorResult};
use crate::observability::{MetricsSink, NoopMetricsSink};
use crate::resilience::constants::MAX_MAX_RETRIES;

/// Opaque credential material.
///
/// Debug output is redacted; access to the raw value is explicit via
/// [`Credential::expose`]. Empty credentials are rejected so a connector
/// never silently proceeds with a blank token.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    /// # Errors
    /// Returns `ConnectorError::Configuration` for an empty value.
    pub fn new(value: impl Into<String>) -> ConnectorResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ConnectorError::configuration("credential must not be empty"));
        }
        Ok(Self(value))
    }

    /// Deliberately-named accessor for the raw secret.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Per-family tunables and the family's canonical environment prefix.
#[derive(Debug, Clone, Copy)]
pub struct FamilyDefaults {
    /// Canonical prefix consulted when a connector-specific key is absent.
    pub canonical_prefix: &'static str,
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub jitter_fraction: f64,
    /// Whether this family refuses to construct without a credential.
    pub credential_required: bool,
}

/// Validated, immutable configuration shared by every connector family.
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    timeout: Duration,
    max_retries: u32,
    backoff_base: Duration,
    jitter_fraction: f64,
    backoff_ceiling: Option<Duration>,
    credential: Option<Credential>,
    metrics_sink: Arc<dyn MetricsSink>,
}

impl ConnectorConfig {
    pub fn builder() -> ConnectorConfigBuilder {
        ConnectorConfigBuilder::default()
    }

    /// Build a config from an environment-like source.
    ///
    /// `prefix` is the connector-specific prefix (e.g. `GITHUB`); when
    /// `None`, only the family's canonical prefix is consulted.
    ///
    /// # Errors
    /// Returns `ConnectorError::Configuration` for unparseable values or
    /// when a required credential is absent at both key levels.
    pub fn from_env(
        defaults: &FamilyDefaults,
        prefix: Option<&str>,
        source: &dyn EnvSource,
    ) -> ConnectorResult<Self> {
        let canonical = defaults.canonical_prefix;
        let prefix = prefix.unwrap_or(canonical);

        // Legacy key names (float seconds) are consulted only when the
        // current key is absent at both levels.
        let timeout = match lookup_duration_secs(source, prefix, canonical, "TIMEOUT_SECS")? {
            Some(timeout) => timeout,
            None => lookup_duration_secs(source, prefix, canonical, "TIMEOUT")?
                .unwrap_or(defaults.timeout),
        };
        let backoff_base = match lookup_duration_ms(source, prefix, canonical, "BACKOFF_BASE_MS")? {
            Some(base) => base,
            None => lookup_duration_secs(source, prefix, canonical, "BACKOFF_FACTOR")?
                .unwrap_or(defaults.backoff_base),
        };

        let mut builder = Self::builder()
            .timeout(timeout)
            .max_retries(
                lookup_u32(source, prefix, canonical, "MAX_RETRIES")?
                    .unwrap_or(defaults.max_retries),
            )
            .backoff_base(backoff_base)
            .jitter_fraction(
                lookup_f64(source, prefix, canonical, "JITTER")?
                    .unwrap_or(defaults.jitter_fraction),
            );

        if let Some(ceiling) = lookup_duration_ms(source, prefix, canonical, "BACKOFF_CEILING_MS")?
        {
            builder = builder.backoff_ceiling(ceiling);
        }

        match env::resolve(source, prefix, canonical, "AUTH_TOKEN") {
            Some((key, value)) => {
                let credential = Credential::new(value).map_err(|_| {
                    ConnectorError::configuration_field("credential must not be empty", key)
                })?;
                builder = builder.credential(credential);
            }
            None if defaults.credential_required => {
                return Err(ConnectorError::configuration_field(
                    format!(
                        "required credential missing: set {prefix}_AUTH_TOKEN or \
                         {canonical}_AUTH_TOKEN"
                    ),
                    format!("{prefix}_AUTH_TOKEN"),
                ));
            }
            None => {}
        }

        builder.build()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Maximum number of additional attempts after the first.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn backoff_base(&self) -> Duration {
        self.backoff_base
    }

    pub fn jitter_fraction(&self) -> f64 {
        self.jitter_fraction
    }

    pub fn backoff_ceiling(&self) -> Option<Duration> {
        self.backoff_ceiling
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn metrics_sink(&self) -> &Arc<dyn MetricsSink> {
        &self.metrics_sink
    }
}

/// Builder for [`ConnectorConfig`] with validation at `build`.
#[derive(Debug)]
pub struct ConnectorConfigBuilder {
    timeout: Duration,
    max_retries: u32,
    backoff_base: Duration,
    jitter_fraction: f64,
    backoff_ceiling: Option<Duration>,
    credential: Option<Credential>,
    metrics_sink: Arc<dyn MetricsSink>,
}

impl Default for ConnectorConfigBuilder {
    fn default() -> Self {
        use crate::resilience::constants::{
            DEFAULT_BACKOFF_BASE, DEFAULT_JITTER_FRACTION, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT,
        };
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: DEFAULT_BACKOFF_BASE,
            jitter_fraction: DEFAULT_JITTER_FRACTION,
            backoff_ceiling: None,
            credential: None,
            metrics_sink: Arc::new(NoopMetricsSink),
        }
    }
}

impl ConnectorConfigBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    pub fn jitter_fraction(mut self, fraction: f64) -> Self {
        self.jitter_fraction = fraction;
        self
    }

    pub fn backoff_ceiling(mut self, ceiling: Duration) -> Self {
        self.backoff_ceiling = Some(ceiling);
        self
    }

    pub fn credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics_sink = sink;
        self
    }

    /// # Errors
    /// Returns `ConnectorError::Configuration` when any parameter is out
    /// of range.
    pub fn build(self) -> ConnectorResult<ConnectorConfig> {
        if self.timeout.is_zero() {
            return Err(ConnectorError::configuration_field(
                "timeout must be greater than zero",
                "timeout",
            ));
        }
        if self.max_retries > MAX_MAX_RETRIES {
            return Err(ConnectorError::configuration_field(
                format!("max_retries must be at most {MAX_MAX_RETRIES}, got {}", self.max_retries),
                "max_retries",
            ));
        }
        if self.backoff_base.is_zero() {
            return Err(ConnectorError::configuration_field(
                "backoff base must be greater than zero",
                "backoff_base",
            ));
        }
        if !(0.0..1.0).contains(&self.jitter_fraction) {
            return Err(ConnectorError::configuration_field(
                format!("jitter fraction must be in [0, 1), got {}", self.jitter_fraction),
                "jitter_fraction",
            ));
        }

        Ok(ConnectorConfig {
            timeout: self.timeout,
            max_retries: self.max_retries,
            backoff_base: self.backoff_base,
            jitter_fraction: self.jitter_fraction,
            backoff_ceiling: self.backoff_ceiling,
            credential: self.credential,
            metrics_sink: self.metrics_sink,
        })
    }
}

fn lookup_u32(
    source: &dyn EnvSource,
    prefix: &str,
    canonical: &str,
    field: &str,
) -> ConnectorResult<Option<u32>> {
    match env::resolve(source, prefix, canonical, field) {
        Some((key, value)) => value
            .parse::<u32>()
            .map(Some)
            .map_err(|e| ConnectorError::configuration_field(format!("invalid {key}: {e}"), key)),
        None => Ok(None),
    }
}

fn lookup_f64(
    source: &dyn EnvSource,
    prefix: &str,
    canonical: &str,
    field: &str,
) -> ConnectorResult<Option<f64>> {
    match env::resolve(source, prefix, canonical, field) {
        Some((key, value)) => value
            .parse::<f64>()
            .map(Some)
            .map_err(|e| ConnectorError::configuration_field(format!("invalid {key}: {e}"), key)),
        None => Ok(None),
    }
}

fn lookup_duration_secs(
    source: &dyn EnvSource,
    prefix: &str,
    canonical: &str,
    field: &str,
) -> ConnectorResult<Option<Duration>> {
    match lookup_f64(source, prefix, canonical, field)? {
        Some(secs) if secs > 0.0 && secs.is_finite() => Ok(Some(Duration::from_secs_f64(secs))),
        Some(secs) => Err(ConnectorError::configuration_field(
            format!("{field} must be a positive number of seconds, got {secs}"),
            format!("{prefix}_{field}"),
        )),
        None => Ok(None),
    }
}

fn lookup_duration_ms(
    source: &dyn EnvSource,
    prefix: &str,
    canonical: &str,
    field: &str,
) -> ConnectorResult<Option<Duration>> {
    match env::resolve(source, prefix, canonical, field) {
        Some((key, value)) => value
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|e| ConnectorError::configuration_field(format!("invalid {key}: {e}"), key)),
        None => Ok(None),
    }
}
