//! Prompt Engineering Optimizer
//!
//! A streaming chat service that rewrites user prompts into stronger prompts
//! with the help of a language model, plus the client that talks to it.
//!
//! # Architecture
//!
//! - **Server**: Axum HTTP server streaming tokens over SSE
//! - **Optimizer**: few-shot conversation driven through an OpenAI-compatible
//!   Chat Completions endpoint
//! - **Client**: `reqwest` SSE client and the reducer that turns payloads into
//!   chat state
//! - **UI**: server-rendered landing and chat pages
//!
//! # Modules
//!
//! - [`llm`]: driver trait, Chat Completions driver and the optimizer
//! - [`conversation`]: conversation history and store
//! - [`normalized`]: stream event model and wire payload
//! - [`render`]: fenced code block scanner and renderers
//! - [`client`]: HTTP client and chat view reducer

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::implicit_hasher)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::unused_async)]

pub mod client;
pub mod config;
pub mod conversation;
pub mod llm;
pub mod normalized;
pub mod rate_limit;
pub mod render;
pub mod server;
pub mod sse;
pub mod telemetry;
pub mod ui;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::rate_limit::GenerationLimiter;

use conversation::ConversationStore;
use llm::Optimizer;

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Global configuration.
    pub config: Arc<AppConfig>,
    /// Optimizer that runs generation turns.
    pub optimizer: Arc<Optimizer>,
    /// Conversation histories, including the default one.
    pub conversations: ConversationStore,
    /// Shared limiter for the generation routes.
    pub rate_limiter: Arc<GenerationLimiter>,
}

impl AppState {
    #[must_use]
    pub fn new(config: Arc<AppConfig>, optimizer: Optimizer) -> Self {
        let rate_limiter = Arc::new(GenerationLimiter::from_config(&config.resilience));
        Self {
            config,
            optimizer: Arc::new(optimizer),
            conversations: ConversationStore::new(),
            rate_limiter,
        }
    }
}
