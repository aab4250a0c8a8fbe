//! Runtime configuration for store connections and edit retries.

use crate::error::CoreError;
use std::time::Duration;

/// Environment variable overriding [`CoreConfig::busy_timeout`] in milliseconds.
pub const BUSY_TIMEOUT_ENV: &str = "THREADLINE_BUSY_TIMEOUT_MS";
/// Environment variable overriding [`CoreConfig::max_edit_attempts`].
pub const MAX_EDIT_ATTEMPTS_ENV: &str = "THREADLINE_MAX_EDIT_ATTEMPTS";

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_MAX_EDIT_ATTEMPTS: u32 = 5;

/// Configuration shared by connection bootstrap and services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// How long a connection waits on a locked database before failing.
    pub busy_timeout: Duration,
    /// Attempts for one article/comment edit before surfacing a conflict.
    ///
    /// Values below 1 are treated as 1.
    pub max_edit_attempts: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            max_edit_attempts: DEFAULT_MAX_EDIT_ATTEMPTS,
        }
    }
}

impl CoreConfig {
    /// Builds a config from the process environment.
    ///
    /// Unset variables fall back to defaults; malformed values are rejected.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(BUSY_TIMEOUT_ENV) {
            let millis = raw.trim().parse::<u64>().map_err(|_| {
                CoreError::Validation(format!(
                    "{BUSY_TIMEOUT_ENV} must be a non-negative integer, got `{raw}`"
                ))
            })?;
            config.busy_timeout = Duration::from_millis(millis);
        }

        if let Some(raw) = lookup(MAX_EDIT_ATTEMPTS_ENV) {
            let attempts = raw.trim().parse::<u32>().map_err(|_| {
                CoreError::Validation(format!(
                    "{MAX_EDIT_ATTEMPTS_ENV} must be a positive integer, got `{raw}`"
                ))
            })?;
            config.max_edit_attempts = attempts;
        }

        Ok(config)
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn with_max_edit_attempts(mut self, max_edit_attempts: u32) -> Self {
        self.max_edit_attempts = max_edit_attempts;
        self
    }

    /// Effective attempt bound, never below one.
    pub fn edit_attempts(&self) -> u32 {
        self.max_edit_attempts.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, BUSY_TIMEOUT_ENV, MAX_EDIT_ATTEMPTS_ENV};
    use crate::error::ErrorKind;
    use std::collections::HashMap;
    use std::time::Duration;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn missing_variables_use_defaults() {
        let config = CoreConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn variables_override_defaults() {
        let config = CoreConfig::from_lookup(lookup_from(&[
            (BUSY_TIMEOUT_ENV, "250"),
            (MAX_EDIT_ATTEMPTS_ENV, "9"),
        ]))
        .unwrap();
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert_eq!(config.max_edit_attempts, 9);
    }

    #[test]
    fn malformed_variable_is_a_validation_error() {
        let err = CoreConfig::from_lookup(lookup_from(&[(MAX_EDIT_ATTEMPTS_ENV, "many")]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn zero_attempts_still_runs_once() {
        assert_eq!(CoreConfig::default().with_max_edit_attempts(0).edit_attempts(), 1);
    }
}
