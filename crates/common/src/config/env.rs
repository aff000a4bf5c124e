//! Environment-style configuration sources.

use std::collections::HashMap;

/// Read-only view over an environment-like key/value source.
///
/// Production code uses [`ProcessEnv`]; tests inject a `HashMap` so
/// resolution order can be asserted without touching process state.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Resolve one field: connector-specific prefixed key first, then the
/// family's canonical key. Returns the winning key alongside the value so
/// parse errors can name their source.
pub(crate) fn resolve(
    env: &dyn EnvSource,
    prefix: &str,
    canonical: &str,
    field: &str,
) -> Option<(String, String)> {
    let prefixed = format!("{prefix}_{field}");
    if let Some(value) = env.get(&prefixed) {
        return Some((prefixed, value));
    }
    if prefix != canonical {
        let fallback = format!("{canonical}_{field}");
        if let Some(value) = env.get(&fallback) {
            return Some((fallback, value));
        }
    }
    None
}
