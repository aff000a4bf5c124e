// Constants for the resilience module
use std::time::Duration;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default retry budget (additional attempts after the first).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for exponential backoff.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(600);

/// Default jitter fraction (0.0 = no jitter; must stay below 1.0).
pub const DEFAULT_JITTER_FRACTION: f64 = 0.2;

/// Maximum exponent for exponential backoff calculation to prevent
/// overflow.
pub const MAX_BACKOFF_EXPONENT: u32 = 30;

/// Maximum allowed retry budget.
pub const MAX_MAX_RETRIES: u32 = 100;
