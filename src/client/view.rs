//! Chat view state and the reducer that folds stream payloads into it.

use serde::Serialize;

use crate::normalized::StreamPayload;

/// Shown in place of a model reply that failed before producing any text.
pub const FALLBACK_REPLY: &str =
    "Sorry, there was an error processing your request. Please try again.";

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// A message as displayed in the chat view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Parameters of one `/generate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub is_followup: bool,
}

/// UI state of the chat view.
///
/// The view owns the message list and the loading flag. While a reply is
/// streaming, the full text received so far is kept outside the message list
/// and copied into the trailing model message on every token.
#[derive(Debug, Clone, Default)]
pub struct ChatView {
    messages: Vec<ChatMessage>,
    is_loading: bool,
    full_response: String,
}

impl ChatView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// The trailing model message, if the view ends with one.
    #[must_use]
    pub fn last_reply(&self) -> Option<&str> {
        self.messages
            .last()
            .filter(|m| m.role == ChatRole::Model)
            .map(|m| m.content.as_str())
    }

    /// Start a turn.
    ///
    /// Returns `None` for blank input. Otherwise appends the user message and
    /// an empty model placeholder and returns the request to send.
    pub fn submit(&mut self, prompt: &str) -> Option<GenerateRequest> {
        if prompt.trim().is_empty() {
            return None;
        }

        let is_followup = !self.messages.is_empty();
        self.messages.push(ChatMessage {
            role: ChatRole::User,
            content: prompt.to_string(),
        });
        self.messages.push(ChatMessage {
            role: ChatRole::Model,
            content: String::new(),
        });
        self.full_response.clear();
        self.is_loading = true;

        Some(GenerateRequest {
            prompt: prompt.to_string(),
            is_followup,
        })
    }

    /// Fold one payload into the view.
    ///
    /// Returns `true` when the connection should be closed. Payloads that
    /// arrive when no turn is in flight are ignored.
    pub fn apply(&mut self, payload: &StreamPayload) -> bool {
        if !self.is_loading {
            return true;
        }

        let mut close = false;

        if let Some(token) = payload.token.as_deref().filter(|t| !t.is_empty()) {
            self.full_response.push_str(token);
            if let Some(last) = self.messages.last_mut().filter(|m| m.role == ChatRole::Model) {
                last.content.clone_from(&self.full_response);
            }
        }

        if payload.is_terminal() {
            self.is_loading = false;
            close = true;
        }

        if payload.error.as_deref().is_some_and(|e| !e.is_empty()) {
            self.is_loading = false;
            self.fill_empty_reply();
            close = true;
        }

        close
    }

    /// The connection failed before the stream finished.
    pub fn connection_failed(&mut self) {
        self.is_loading = false;
        self.fill_empty_reply();
    }

    /// Drop every message.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.full_response.clear();
        self.is_loading = false;
    }

    fn fill_empty_reply(&mut self) {
        if let Some(last) = self.trailing_model_mut()
            && last.content.is_empty()
        {
            last.content = FALLBACK_REPLY.to_string();
        }
    }

    fn trailing_model_mut(&mut self) -> Option<&mut ChatMessage> {
        self.messages.last_mut().filter(|m| m.role == ChatRole::Model)
    }
}
