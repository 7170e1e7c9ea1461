//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. The
//! service keeps no project state of its own: every request carries the file
//! set it works on, so the state is only the orchestrator and the limiter.

use std::sync::Arc;

use crate::config::TurnConfig;
use crate::llm::LlmChat;
use crate::rate_limit::RateLimiter;
use crate::services::turn::Orchestrator;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    /// `None` if LLM env vars are not configured.
    pub orchestrator: Option<Arc<Orchestrator>>,
    /// In-memory rate limiter for model-calling endpoints.
    pub rate_limiter: RateLimiter,
}

impl AppState {
    #[must_use]
    pub fn new(llm: Option<Arc<dyn LlmChat>>, turn: TurnConfig, rate_limiter: RateLimiter) -> Self {
        Self { orchestrator: llm.map(|llm| Arc::new(Orchestrator::new(llm, turn))), rate_limiter }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use crate::rate_limit::RateLimitConfig;

    /// `AppState` without an LLM.
    #[must_use]
    pub fn test_app_state() -> AppState {
        AppState::new(None, TurnConfig::default(), RateLimiter::with_config(RateLimitConfig::default()))
    }

    /// `AppState` with a mock LLM.
    #[must_use]
    pub fn test_app_state_with_llm(llm: Arc<dyn LlmChat>) -> AppState {
        AppState::new(Some(llm), TurnConfig::default(), RateLimiter::with_config(RateLimitConfig::default()))
    }

    /// `AppState` with a mock LLM and custom rate limits.
    #[must_use]
    pub fn test_app_state_with_limits(llm: Arc<dyn LlmChat>, limits: RateLimitConfig) -> AppState {
        AppState::new(Some(llm), TurnConfig::default(), RateLimiter::with_config(limits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orchestrator_requires_an_llm() {
        assert!(test_helpers::test_app_state().orchestrator.is_none());
    }
}
