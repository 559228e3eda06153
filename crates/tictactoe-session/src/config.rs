//! Session timing and framing limits.

use std::{str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tictactoe_transport::DEFAULT_MAX_FRAME_LEN;

/// Default heartbeat interval in milliseconds.
pub const HEARTBEAT_INTERVAL_MS: u64 = 5_000;
/// Default silence after which the peer is considered gone.
pub const LIVENESS_TIMEOUT_MS: u64 = 15_000;
/// Default bound on a single send.
pub const SEND_TIMEOUT_MS: u64 = 3_000;
/// Default pause between the disconnect notice and closing the stream.
pub const FLUSH_DELAY_MS: u64 = 200;
/// Default size of each read from the stream.
pub const READ_BUFFER_LEN: usize = 1024;
/// Default number of consecutive malformed frames tolerated.
pub const MAX_CONSECUTIVE_MALFORMED: u32 = 16;

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Interval between outgoing pings in milliseconds.
    pub heartbeat_interval_ms: u64,
    /// Silence in milliseconds after which the link is dropped. Checked
    /// every third of this period.
    pub liveness_timeout_ms: u64,
    /// Bound on a single send in milliseconds.
    pub send_timeout_ms: u64,
    /// Pause in milliseconds after the disconnect notice.
    pub flush_delay_ms: u64,
    /// Bytes requested per read.
    pub read_buffer_len: usize,
    /// Longest accepted frame.
    pub max_frame_len: usize,
    /// Consecutive malformed frames before the link is dropped. `None`
    /// tolerates any number.
    pub max_consecutive_malformed: Option<u32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: HEARTBEAT_INTERVAL_MS,
            liveness_timeout_ms: LIVENESS_TIMEOUT_MS,
            send_timeout_ms: SEND_TIMEOUT_MS,
            flush_delay_ms: FLUSH_DELAY_MS,
            read_buffer_len: READ_BUFFER_LEN,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            max_consecutive_malformed: Some(MAX_CONSECUTIVE_MALFORMED),
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by `TICTACTOE_*` environment variables.
    ///
    /// # Errors
    /// Returns an error if a variable does not parse or a period is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`Self::from_env`] with an explicit variable source.
    ///
    /// # Errors
    /// Returns an error if a variable does not parse or a period is zero.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(ms) = parse_var(&lookup, "TICTACTOE_HEARTBEAT_MS")? {
            config.heartbeat_interval_ms = ms;
        }
        if let Some(ms) = parse_var(&lookup, "TICTACTOE_LIVENESS_TIMEOUT_MS")? {
            config.liveness_timeout_ms = ms;
        }
        if let Some(ms) = parse_var(&lookup, "TICTACTOE_SEND_TIMEOUT_MS")? {
            config.send_timeout_ms = ms;
        }
        if let Some(ms) = parse_var(&lookup, "TICTACTOE_FLUSH_DELAY_MS")? {
            config.flush_delay_ms = ms;
        }
        if let Some(len) = parse_var(&lookup, "TICTACTOE_MAX_FRAME_LEN")? {
            config.max_frame_len = len;
        }
        if let Some(raw) = lookup("TICTACTOE_MAX_MALFORMED") {
            config.max_consecutive_malformed = match raw.trim() {
                "none" | "0" => None,
                n => Some(n.parse().map_err(|_| ConfigError::InvalidValue {
                    var: "TICTACTOE_MAX_MALFORMED",
                    value: raw.clone(),
                })?),
            };
        }
        config.validate()?;
        Ok(config)
    }

    /// Checks that every period and limit is usable.
    ///
    /// # Errors
    /// Returns the first field that is zero.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.heartbeat_interval_ms == 0 {
            return Err(ConfigError::Zero("heartbeat_interval_ms"));
        }
        if self.liveness_timeout_ms < 3 {
            return Err(ConfigError::Zero("liveness_timeout_ms"));
        }
        if self.send_timeout_ms == 0 {
            return Err(ConfigError::Zero("send_timeout_ms"));
        }
        if self.read_buffer_len == 0 {
            return Err(ConfigError::Zero("read_buffer_len"));
        }
        if self.max_frame_len == 0 {
            return Err(ConfigError::Zero("max_frame_len"));
        }
        Ok(())
    }

    #[must_use]
    pub const fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    #[must_use]
    pub const fn liveness_timeout(&self) -> Duration {
        Duration::from_millis(self.liveness_timeout_ms)
    }

    /// How often the liveness monitor looks at the last receive time.
    #[must_use]
    pub const fn liveness_check_interval(&self) -> Duration {
        Duration::from_millis(self.liveness_timeout_ms / 3)
    }

    #[must_use]
    pub const fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    #[must_use]
    pub const fn flush_delay(&self) -> Duration {
        Duration::from_millis(self.flush_delay_ms)
    }
}

/// Reads and parses one variable. Unset variables yield `None`.
///
/// # Errors
/// Returns [`ConfigError::InvalidValue`] when the value does not parse.
pub fn parse_var<T: FromStr>(
    lookup: impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    lookup(var)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { var, value: raw })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(5));
        assert_eq!(config.liveness_timeout(), Duration::from_secs(15));
        assert_eq!(config.liveness_check_interval(), Duration::from_secs(5));
        assert_eq!(config.send_timeout(), Duration::from_secs(3));
        assert_eq!(config.flush_delay(), Duration::from_millis(200));
        assert_eq!(config.max_consecutive_malformed, Some(16));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_env_overrides() {
        let config = SessionConfig::from_lookup(lookup(&[
            ("TICTACTOE_HEARTBEAT_MS", "1000"),
            ("TICTACTOE_LIVENESS_TIMEOUT_MS", " 3000 "),
            ("TICTACTOE_MAX_MALFORMED", "none"),
        ]))
        .unwrap();
        assert_eq!(config.heartbeat_interval_ms, 1000);
        assert_eq!(config.liveness_timeout_ms, 3000);
        assert_eq!(config.max_consecutive_malformed, None);
        assert_eq!(config.send_timeout_ms, SEND_TIMEOUT_MS);
    }

    #[test]
    fn test_env_rejects_garbage() {
        let err = SessionConfig::from_lookup(lookup(&[("TICTACTOE_SEND_TIMEOUT_MS", "soon")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                var: "TICTACTOE_SEND_TIMEOUT_MS",
                value: "soon".to_string()
            }
        );

        let err = SessionConfig::from_lookup(lookup(&[("TICTACTOE_HEARTBEAT_MS", "0")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Zero("heartbeat_interval_ms"));
    }

    #[test]
    fn test_partial_json() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"send_timeout_ms": 500}"#).unwrap();
        assert_eq!(config.send_timeout_ms, 500);
        assert_eq!(config.heartbeat_interval_ms, HEARTBEAT_INTERVAL_MS);
    }
}
