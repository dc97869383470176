//! Normalized event types for streaming generation.
//!
//! Two layers live here:
//!
//! - [`NormalizedEvent`]: what an upstream driver emits while the model is
//!   generating, independent of the provider's wire format.
//! - [`StreamPayload`]: the record sent to chat clients over SSE. Each event
//!   carries one JSON object with optional `token`, `done` and `error` fields.
//!
//! # Example
//!
//! ```rust
//! use prompt_optimizer::normalized::{StreamPayload, sse_event};
//!
//! let sse = sse_event(&StreamPayload::token("Hello"));
//! assert_eq!(sse, "data: {\"token\":\"Hello\"}\n\n");
//! ```

use serde::{Deserialize, Serialize};

/// Normalized streaming events emitted by LLM drivers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum NormalizedEvent {
    /// Incremental text delta from the model.
    #[serde(rename = "message.delta")]
    MessageDelta {
        /// The text fragment to append.
        text: String,
    },

    /// The upstream reported an error mid-stream.
    #[serde(rename = "error")]
    Error {
        /// Error message.
        message: String,
        /// Optional error code for programmatic handling.
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },

    /// Upstream generation has finished.
    #[serde(rename = "done")]
    Done,
}

/// Browser-facing payload carried in the `data:` line of each SSE event.
///
/// Fields are independent: a consumer processes `token`, then `done`, then
/// `error`, in that order, for every payload it receives.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamPayload {
    /// Newly generated text fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Set once the stream is complete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    /// Generation failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StreamPayload {
    /// A payload carrying a generated text fragment.
    #[must_use]
    pub fn token(text: impl Into<String>) -> Self {
        Self {
            token: Some(text.into()),
            ..Self::default()
        }
    }

    /// The terminal payload.
    #[must_use]
    pub fn done() -> Self {
        Self {
            done: Some(true),
            ..Self::default()
        }
    }

    /// A payload reporting a generation failure.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Whether this payload ends the stream.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.done == Some(true)
    }
}

/// Convert a [`StreamPayload`] to an SSE-formatted string.
///
/// Events are unnamed so that `EventSource.onmessage` receives them.
pub fn sse_event(payload: &StreamPayload) -> String {
    let json = serde_json::to_string(payload).unwrap_or_else(|e| {
        serde_json::json!({ "error": e.to_string() }).to_string()
    });

    format!("data: {json}\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_omits_absent_fields() {
        let json = serde_json::to_string(&StreamPayload::done()).unwrap();
        assert_eq!(json, r#"{"done":true}"#);

        let json = serde_json::to_string(&StreamPayload::error("boom")).unwrap();
        assert_eq!(json, r#"{"error":"boom"}"#);
    }

    #[test]
    fn test_payload_parses_partial_objects() {
        let payload: StreamPayload = serde_json::from_str(r#"{"token":"a","done":true}"#).unwrap();
        assert_eq!(payload.token.as_deref(), Some("a"));
        assert!(payload.is_terminal());

        let payload: StreamPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(payload, StreamPayload::default());
        assert!(!payload.is_terminal());
    }

    #[test]
    fn test_sse_event_format() {
        let sse = sse_event(&StreamPayload::token("line\nbreak"));
        assert!(sse.starts_with("data: "));
        assert!(sse.ends_with("\n\n"));
        // Newlines inside the token stay escaped within one data line.
        assert_eq!(sse.matches('\n').count(), 2);
    }

    #[test]
    fn test_normalized_event_serialization() {
        let event = NormalizedEvent::MessageDelta {
            text: "Hello".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("message.delta"));
        assert!(json.contains("Hello"));
    }
}
