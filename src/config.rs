//! Service configuration parsed from environment variables.
//!
//! Model provider settings live in [`crate::llm::config`]; this module covers
//! the HTTP listener and the per-turn limits of the orchestrator.

use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_TURN_MAX_TOKENS: u32 = 8192;
pub const DEFAULT_TURN_TIMEOUT_SECS: u64 = 180;

/// Parse `key` from the environment, falling back to `default` when the
/// variable is unset or malformed.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

// =============================================================================
// TURN CONFIG
// =============================================================================

/// Limits applied to a single orchestrator turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnConfig {
    /// Output token ceiling for the model reply.
    pub max_tokens: u32,
    /// Wall-clock ceiling for the model call. A turn that exceeds it fails
    /// with no file changes.
    pub timeout: Duration,
    /// Number of prior messages sent to the model. `None` keeps the full history.
    pub history_limit: Option<usize>,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_TURN_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TURN_TIMEOUT_SECS),
            history_limit: None,
        }
    }
}

impl TurnConfig {
    /// - `TURN_MAX_TOKENS`: default 8192
    /// - `TURN_TIMEOUT_SECS`: default 180
    /// - `TURN_HISTORY_LIMIT`: default 0 (unlimited)
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            max_tokens: env_parse("TURN_MAX_TOKENS", DEFAULT_TURN_MAX_TOKENS),
            timeout: Duration::from_secs(env_parse("TURN_TIMEOUT_SECS", DEFAULT_TURN_TIMEOUT_SECS)),
            history_limit: history_limit(env_parse("TURN_HISTORY_LIMIT", 0)),
        }
    }
}

fn history_limit(raw: usize) -> Option<usize> {
    (raw > 0).then_some(raw)
}

// =============================================================================
// SERVER CONFIG
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self { port: env_parse("PORT", DEFAULT_PORT) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_history_limit_means_unlimited() {
        assert_eq!(history_limit(0), None);
        assert_eq!(history_limit(12), Some(12));
    }

    #[test]
    fn env_parse_falls_back_on_garbage() {
        unsafe { std::env::set_var("VIBEFOLIO_TEST_GARBAGE", "not-a-number") };
        assert_eq!(env_parse("VIBEFOLIO_TEST_GARBAGE", 7_u32), 7);
        unsafe { std::env::remove_var("VIBEFOLIO_TEST_GARBAGE") };
    }

    #[test]
    fn env_parse_trims_whitespace() {
        unsafe { std::env::set_var("VIBEFOLIO_TEST_PADDED", " 42 ") };
        assert_eq!(env_parse("VIBEFOLIO_TEST_PADDED", 0_u64), 42);
        unsafe { std::env::remove_var("VIBEFOLIO_TEST_PADDED") };
    }

    #[test]
    fn default_turn_config_keeps_full_history() {
        let cfg = TurnConfig::default();
        assert_eq!(cfg.history_limit, None);
        assert_eq!(cfg.timeout, Duration::from_secs(DEFAULT_TURN_TIMEOUT_SECS));
    }
}
