//! Prompt optimizer: runs one conversation turn against the upstream model.
//!
//! A turn:
//! 1. Waits for exclusive use of the conversation
//! 2. Appends the formatted user prompt to the history
//! 3. Streams the model's reply as `token` payloads
//! 4. On success, stores the full reply and emits `done`
//! 5. On failure, emits `error` then `done`; no reply is stored
//!
//! # Example
//!
//! ```rust,ignore
//! use prompt_optimizer::llm::Optimizer;
//!
//! let optimizer = Optimizer::new(settings, generation);
//! let stream = optimizer.stream_turn(conversation, "Write a haiku", false);
//! ```

use std::sync::Arc;

use futures::{Stream, StreamExt};
use uuid::Uuid;

use crate::conversation::{Conversation, format_prompt, prompts::SYSTEM_INSTRUCTION};
use crate::normalized::{NormalizedEvent, StreamPayload};

use super::{ChatCompletionsDriver, GenerationConfig, LlmDriver, LlmRequest, LlmSettings, Message};

/// Reply returned by [`Optimizer::complete_turn`] when the model produced nothing.
pub const NO_RESPONSE: &str = "No response generated yet.";

/// Prompt optimizer over an [`LlmDriver`].
#[derive(Clone)]
pub struct Optimizer {
    driver: Arc<dyn LlmDriver>,
    generation: GenerationConfig,
    system_instruction: Arc<str>,
}

impl std::fmt::Debug for Optimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Optimizer")
            .field("generation", &self.generation)
            .field("system_instruction_len", &self.system_instruction.len())
            .finish_non_exhaustive()
    }
}

impl Optimizer {
    /// Create an optimizer talking to a Chat Completions endpoint.
    #[must_use]
    pub fn new(settings: LlmSettings, generation: GenerationConfig) -> Self {
        Self::with_driver(Arc::new(ChatCompletionsDriver::new(settings)), generation)
    }

    /// Create an optimizer over any driver.
    #[must_use]
    pub fn with_driver(driver: Arc<dyn LlmDriver>, generation: GenerationConfig) -> Self {
        Self {
            driver,
            generation,
            system_instruction: Arc::from(SYSTEM_INSTRUCTION),
        }
    }

    /// Replace the built-in system instruction.
    #[must_use]
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Arc::from(instruction.into());
        self
    }

    #[must_use]
    pub fn generation(&self) -> &GenerationConfig {
        &self.generation
    }

    fn request(&self, conversation: &Conversation) -> LlmRequest {
        let mut messages = vec![Message::system(self.system_instruction.as_ref())];
        messages.extend(conversation.messages());
        LlmRequest {
            messages,
            generation: self.generation.clone(),
        }
    }

    /// Run one turn and stream its payloads.
    ///
    /// The stream always ends with a `done` payload.
    pub fn stream_turn(
        &self,
        conversation: Conversation,
        prompt: &str,
        is_followup: bool,
    ) -> impl Stream<Item = StreamPayload> + Send + 'static {
        let optimizer = self.clone();
        let formatted = format_prompt(prompt, is_followup);
        let request_id = Uuid::new_v4().to_string();

        async_stream::stream! {
            let _turn = conversation.begin_turn().await;

            conversation.add_user_message(formatted);
            let req = optimizer.request(&conversation);

            tracing::info!(
                request_id = %request_id,
                session_id = %conversation.id(),
                is_followup = is_followup,
                message_count = req.messages.len(),
                "Starting optimization turn"
            );

            let mut full_response = String::new();
            let failure = match optimizer.driver.stream(req).await {
                Err(e) => Some(e.to_string()),
                Ok(driver_stream) => {
                    let mut failure = None;
                    futures::pin_mut!(driver_stream);
                    while let Some(item) = driver_stream.next().await {
                        match item {
                            Ok(NormalizedEvent::MessageDelta { text }) => {
                                if text.is_empty() {
                                    continue;
                                }
                                full_response.push_str(&text);
                                tracing::trace!(request_id = %request_id, delta_length = text.len(), "Message delta");
                                yield StreamPayload::token(text);
                            }
                            Ok(NormalizedEvent::Done) => break,
                            Ok(NormalizedEvent::Error { message, code }) => {
                                tracing::warn!(request_id = %request_id, code = ?code, "Upstream reported an error");
                                failure = Some(message);
                                break;
                            }
                            Err(e) => {
                                failure = Some(e.to_string());
                                break;
                            }
                        }
                    }
                    failure
                }
            };

            match failure {
                None => {
                    if full_response.is_empty() {
                        tracing::warn!(request_id = %request_id, "Model returned an empty reply");
                    } else {
                        conversation.add_model_message(full_response.clone());
                    }
                    tracing::info!(
                        request_id = %request_id,
                        session_id = %conversation.id(),
                        content_length = full_response.len(),
                        "Turn complete"
                    );
                }
                Some(message) => {
                    tracing::error!(
                        request_id = %request_id,
                        session_id = %conversation.id(),
                        error = %message,
                        "Error during content generation"
                    );
                    yield StreamPayload::error(message);
                }
            }

            yield StreamPayload::done();
        }
    }

    /// Run one turn to completion and return the model reply.
    ///
    /// # Errors
    ///
    /// Returns the upstream error message if generation failed.
    pub async fn complete_turn(
        &self,
        conversation: &Conversation,
        prompt: &str,
        is_followup: bool,
    ) -> anyhow::Result<String> {
        let stream = self.stream_turn(conversation.clone(), prompt, is_followup);
        futures::pin_mut!(stream);

        let mut reply = String::new();
        while let Some(payload) = stream.next().await {
            if let Some(token) = payload.token {
                reply.push_str(&token);
            }
            if let Some(error) = payload.error {
                anyhow::bail!(error);
            }
        }

        if reply.is_empty() {
            Ok(NO_RESPONSE.to_string())
        } else {
            Ok(reply)
        }
    }
}
