//! Synchronization timing.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tictactoe_session::{ConfigError, SessionConfig, config::parse_var};

/// Default bound on a reset or rematch handshake.
pub const HANDSHAKE_TIMEOUT_MS: u64 = 30_000;
/// Default delay before a drawn remote game offers a rematch.
pub const DRAW_PROMPT_MS: u64 = 1_000;
/// Default delay before the computer answers.
pub const AI_DELAY_MS: u64 = 500;

/// Configuration of the sync actor and the session it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// How long a reset or rematch may wait for the peer, in milliseconds.
    pub handshake_timeout_ms: u64,
    /// Delay before the rematch offer after a remote draw, in milliseconds.
    pub draw_prompt_ms: u64,
    /// Delay before the computer's move in single-player mode.
    pub ai_delay_ms: u64,
    pub session: SessionConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            handshake_timeout_ms: HANDSHAKE_TIMEOUT_MS,
            draw_prompt_ms: DRAW_PROMPT_MS,
            ai_delay_ms: AI_DELAY_MS,
            session: SessionConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Defaults overridden by `TICTACTOE_*` environment variables.
    ///
    /// # Errors
    /// Returns an error if a variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`Self::from_env`] with an explicit variable source.
    ///
    /// # Errors
    /// Returns an error if a variable does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self {
            session: SessionConfig::from_lookup(&lookup)?,
            ..Self::default()
        };
        if let Some(ms) = parse_var(&lookup, "TICTACTOE_HANDSHAKE_TIMEOUT_MS")? {
            config.handshake_timeout_ms = ms;
        }
        if let Some(ms) = parse_var(&lookup, "TICTACTOE_DRAW_PROMPT_MS")? {
            config.draw_prompt_ms = ms;
        }
        if let Some(ms) = parse_var(&lookup, "TICTACTOE_AI_DELAY_MS")? {
            config.ai_delay_ms = ms;
        }
        Ok(config)
    }

    #[must_use]
    pub const fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    #[must_use]
    pub const fn draw_prompt_delay(&self) -> Duration {
        Duration::from_millis(self.draw_prompt_ms)
    }

    #[must_use]
    pub const fn ai_delay(&self) -> Duration {
        Duration::from_millis(self.ai_delay_ms)
    }
}
