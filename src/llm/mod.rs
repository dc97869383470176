//! LLM driver traits and implementations.
//!
//! # Overview
//!
//! The [`LlmDriver`] trait defines the streaming interface to an upstream
//! model. The [`Optimizer`] builds on a driver to run prompt-optimization
//! turns against a [`Conversation`](crate::conversation::Conversation).
//!
//! # Drivers
//!
//! - [`ChatCompletionsDriver`]: OpenAI-compatible Chat Completions API. Gemini,
//!   Azure, `OpenRouter`, Groq and local servers all expose this surface.
//!
//! # Example
//!
//! ```rust,ignore
//! use prompt_optimizer::llm::{LlmSettings, Optimizer};
//!
//! let settings = LlmSettings::from_config(&config.llm);
//! let optimizer = Optimizer::new(settings, config.generation.clone());
//! ```

pub mod chat_completions;
pub mod optimizer;
pub mod provider;

pub use chat_completions::ChatCompletionsDriver;
pub use optimizer::Optimizer;
pub use provider::Provider;

use std::pin::Pin;

use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::normalized::NormalizedEvent;

/// LLM connection and model settings.
#[derive(Clone)]
pub struct LlmSettings {
    /// Base URL for the LLM API.
    pub base_url: String,
    /// Optional API key for authentication.
    pub api_key: Option<String>,
    /// Model identifier (e.g., `gemini-2.0-flash`).
    pub model: String,
    /// Provider type, detected from `base_url`.
    pub provider: Provider,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("provider", &self.provider)
            .finish()
    }
}

impl LlmSettings {
    /// Build settings from the `llm` configuration section.
    #[must_use]
    pub fn from_config(cfg: &LlmConfig) -> Self {
        let mut provider = Provider::detect_from_url(&cfg.base_url);

        if let Provider::AzureOpenAI { .. } = &provider
            && let Some(deployment) = &cfg.deployment_name
        {
            provider = Provider::AzureOpenAI {
                deployment_name: deployment.clone(),
                api_version: cfg
                    .api_version
                    .clone()
                    .unwrap_or_else(|| provider::DEFAULT_AZURE_API_VERSION.to_string()),
            };
        }

        Self {
            base_url: cfg.base_url.clone(),
            api_key: cfg.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: cfg.model.clone(),
            provider,
        }
    }
}

/// Sampling parameters sent with every generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
        }
    }
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction.
    System,
    /// User prompt.
    User,
    /// Model reply.
    #[serde(alias = "model")]
    Assistant,
}

impl MessageRole {
    /// Name shown to chat clients, which call the assistant "model".
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "model",
        }
    }
}

/// A message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Request to an LLM driver.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Conversation messages, system instruction first.
    pub messages: Vec<Message>,
    /// Sampling parameters.
    pub generation: GenerationConfig,
}

/// Boxed stream of driver events.
pub type EventStream = Pin<Box<dyn Stream<Item = anyhow::Result<NormalizedEvent>> + Send>>;

/// Trait for LLM streaming drivers.
///
/// Implementations emit [`NormalizedEvent`]s as the model generates output
/// and finish with [`NormalizedEvent::Done`].
#[async_trait::async_trait]
pub trait LlmDriver: Send + Sync {
    /// Stream a response from the LLM.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent or is rejected.
    async fn stream(&self, req: LlmRequest) -> anyhow::Result<EventStream>;
}
