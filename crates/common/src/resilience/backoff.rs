//! Exponential backoff with bounded random jitter.

use std::time::Duration;

use rand::Rng;

use crate::error::{ConnectorError, ConnectorResult};
use crate::resilience::constants::MAX_BACKOFF_EXPONENT;

/// Pure attempt-index → wait-duration policy.
///
/// Nominal wait is `base * 2^attempt_index`; the final wait perturbs the
/// nominal by up to ± `jitter_fraction` of itself, drawn uniformly, and is
/// clamped to ≥ 0. There is no implicit upper cap: large retry budgets can
/// produce long waits unless a ceiling is configured explicitly.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    base: Duration,
    jitter_fraction: f64,
    ceiling: Option<Duration>,
}

impl BackoffPolicy {
    /// Create a policy with validation.
    ///
    /// # Errors
    /// Returns `ConnectorError::Configuration` when `base` is zero or
    /// `jitter_fraction` falls outside `[0, 1)`.
    pub fn new(base: Duration, jitter_fraction: f64) -> ConnectorResult<Self> {
        if base.is_zero() {
            return Err(ConnectorError::configuration_field(
                "backoff base must be greater than zero",
                "backoff_base",
            ));
        }
        if !(0.0..1.0).contains(&jitter_fraction) {
            return Err(ConnectorError::configuration_field(
                format!("jitter fraction must be in [0, 1), got {jitter_fraction}"),
                "jitter_fraction",
            ));
        }
        Ok(Self { base, jitter_fraction, ceiling: None })
    }

    /// Cap every computed wait at `ceiling`, applied after jitter.
    pub fn with_ceiling(mut self, ceiling: Option<Duration>) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Compute the wait before the attempt after `attempt_index` (0-based).
    pub fn compute(&self, attempt_index: u32) -> Duration {
        let nominal = self.nominal(attempt_index);
        let jittered = self.apply_jitter(nominal);
        match self.ceiling {
            Some(ceiling) => jittered.min(ceiling),
            None => jittered,
        }
    }

    /// Exponential delay without jitter.
    fn nominal(&self, attempt_index: u32) -> Duration {
        // Cap the exponent to prevent overflow; saturate the product.
        let exponent = attempt_index.min(MAX_BACKOFF_EXPONENT);
        let multiplier = 2_u32.saturating_pow(exponent);
        self.base.saturating_mul(multiplier)
    }

    /// Perturb the delay to avoid synchronized retry storms.
    fn apply_jitter(&self, delay: Duration) -> Duration {
        if self.jitter_fraction == 0.0 {
            return delay;
        }

        let mut rng = rand::thread_rng();
        let offset: f64 = rng.gen_range(-1.0..=1.0) * self.jitter_fraction;
        let secs = (delay.as_secs_f64() * (1.0 + offset)).max(0.0);
        Duration::from_secs_f64(secs)
    }
}
