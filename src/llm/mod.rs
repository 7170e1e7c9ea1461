//! LLM — multi-provider adapter for the site builder.
//!
//! DESIGN
//! ======
//! Uses environment variables instead of config files. `LlmClient` dispatches
//! to Anthropic or `OpenAI` based on `LLM_PROVIDER`. Everything above this
//! module talks to the [`LlmChat`] trait so tests can swap in a mock.

pub mod anthropic;
pub mod config;
pub mod openai;
pub mod types;

use config::{LlmConfig, LlmProviderKind};
pub use types::LlmChat;
use types::{ChatResponse, LlmError, Message};

// =============================================================================
// CLIENT DISPATCH
// =============================================================================

/// Concrete LLM client that dispatches to either Anthropic or `OpenAI`.
///
/// Configured from environment variables by [`LlmClient::from_env`].
pub struct LlmClient {
    inner: LlmProvider,
    model: String,
}

enum LlmProvider {
    Anthropic(anthropic::AnthropicClient),
    OpenAi(openai::OpenAiClient),
}

impl LlmClient {
    /// Build an LLM client from environment variables (see [`LlmConfig::from_env`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or the HTTP client fails.
    pub fn from_env() -> Result<Self, LlmError> {
        let config = LlmConfig::from_env()?;
        Self::from_config(config)
    }

    /// Build an LLM client from a parsed typed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider HTTP client fails to build.
    pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
        let model = config.model.clone();
        let inner = match config.provider {
            LlmProviderKind::Anthropic => {
                LlmProvider::Anthropic(anthropic::AnthropicClient::new(config.api_key, config.timeouts)?)
            }
            LlmProviderKind::OpenAi => LlmProvider::OpenAi(openai::OpenAiClient::new(
                config.api_key,
                config.openai_mode,
                config.openai_base_url,
                config.timeouts,
            )?),
        };
        Ok(Self { inner, model })
    }

    /// Return the configured model name (e.g. `"claude-sonnet-4-5-20250929"`).
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl LlmChat for LlmClient {
    async fn chat(&self, max_tokens: u32, system: &str, messages: &[Message]) -> Result<ChatResponse, LlmError> {
        match &self.inner {
            LlmProvider::Anthropic(c) => c.chat(&self.model, max_tokens, system, messages).await,
            LlmProvider::OpenAi(c) => c.chat(&self.model, max_tokens, system, messages).await,
        }
    }
}

// =============================================================================
// COMPLETION
// =============================================================================

/// One model completion: send the history, get the reply text back.
///
/// Thinking and unknown blocks are dropped; multiple text blocks are joined
/// with newlines so file markers split across blocks still line up.
///
/// # Errors
///
/// Propagates the provider's [`LlmError`].
pub async fn complete(
    llm: &dyn LlmChat,
    max_tokens: u32,
    system: &str,
    messages: &[Message],
) -> Result<String, LlmError> {
    let response = llm.chat(max_tokens, system, messages).await?;
    tracing::info!(
        model = %response.model,
        stop_reason = %response.stop_reason,
        input_tokens = response.input_tokens,
        output_tokens = response.output_tokens,
        "llm: completion"
    );
    if response.stop_reason == "max_tokens" {
        tracing::warn!("llm: reply truncated at max_tokens; trailing file may be incomplete");
    }
    Ok(response.text())
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
