//! OpenAI-compatible Chat Completions driver.
//!
//! This module implements the [`LlmDriver`] trait for the Chat Completions
//! API, streaming text deltas as [`NormalizedEvent`]s.

use futures::StreamExt;

use crate::normalized::NormalizedEvent;
use crate::sse::{SseDecoder, SseFrame};

use super::{EventStream, LlmDriver, LlmRequest, LlmSettings};

/// Driver for OpenAI-compatible Chat Completions endpoints.
#[derive(Clone)]
pub struct ChatCompletionsDriver {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ChatCompletionsDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsDriver")
            .field("settings", &self.settings)
            .finish()
    }
}

impl ChatCompletionsDriver {
    /// Create a new Chat Completions driver with the given settings.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    /// Build the JSON request body.
    fn request_body(&self, req: &LlmRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.settings.model,
            "stream": true,
            "messages": req.messages,
            "temperature": req.generation.temperature,
            "top_p": req.generation.top_p,
            "max_tokens": req.generation.max_output_tokens,
        });
        if self.settings.provider.supports_top_k() {
            body["top_k"] = serde_json::json!(req.generation.top_k);
        }
        body
    }
}

#[async_trait::async_trait]
impl LlmDriver for ChatCompletionsDriver {
    async fn stream(&self, req: LlmRequest) -> anyhow::Result<EventStream> {
        let url = self.settings.provider.build_chat_url(&self.settings.base_url);
        let body = self.request_body(&req);

        tracing::debug!(
            url = %url,
            model = %self.settings.model,
            message_count = req.messages.len(),
            "Sending chat completions request"
        );

        let mut rb = self.http.post(&url).json(&body);
        if let Some(k) = &self.settings.api_key {
            rb = if self.settings.provider.uses_api_key_header() {
                rb.header("api-key", k)
            } else {
                rb.bearer_auth(k)
            };
        }

        let resp = rb.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            anyhow::bail!("upstream returned {status}: {}", upstream_error_message(&detail));
        }

        let byte_stream = resp.bytes_stream();

        let out = async_stream::try_stream! {
            let mut decoder = SseDecoder::new();
            let mut finished = false;

            futures::pin_mut!(byte_stream);
            'read: while let Some(chunk) = byte_stream.next().await {
                let chunk = chunk?;
                for frame in decoder.push(&chunk) {
                    for event in frame_events(&frame)? {
                        let terminal = matches!(event, NormalizedEvent::Done | NormalizedEvent::Error { .. });
                        yield event;
                        if terminal {
                            finished = true;
                            break 'read;
                        }
                    }
                }
            }

            if !finished {
                if let Some(frame) = decoder.finish() {
                    for event in frame_events(&frame)? {
                        yield event;
                    }
                }
                // A body that closes without `[DONE]` still ends the turn.
                yield NormalizedEvent::Done;
            }
        };

        Ok(Box::pin(out))
    }
}

/// Translate one upstream SSE frame into normalized events.
fn frame_events(frame: &SseFrame) -> anyhow::Result<Vec<NormalizedEvent>> {
    let data = frame.data.trim();
    if data.is_empty() {
        return Ok(Vec::new());
    }
    if data == "[DONE]" {
        return Ok(vec![NormalizedEvent::Done]);
    }

    let v: serde_json::Value = serde_json::from_str(data)?;

    if let Some(err) = v.get("error") {
        let message = err
            .get("message")
            .and_then(|m| m.as_str())
            .or_else(|| err.as_str())
            .map_or_else(|| err.to_string(), ToString::to_string);
        let code = err.get("code").map(|c| match c.as_str() {
            Some(s) => s.to_string(),
            None => c.to_string(),
        });
        return Ok(vec![NormalizedEvent::Error { message, code }]);
    }

    let text = v["choices"][0]["delta"]["content"].as_str().unwrap_or_default();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![NormalizedEvent::MessageDelta {
        text: text.to_string(),
    }])
}

/// Pull a readable message out of an upstream error body.
fn upstream_error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let message = parsed.as_ref().and_then(|v| {
        let err = v.as_array().and_then(|a| a.first()).unwrap_or(v);
        err["error"]["message"].as_str().map(ToString::to_string)
    });
    message.unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{GenerationConfig, Message, Provider};

    fn frame(data: &str) -> SseFrame {
        SseFrame {
            event: None,
            data: data.to_string(),
        }
    }

    #[test]
    fn test_delta_frame() {
        let events =
            frame_events(&frame(r#"{"choices":[{"delta":{"content":"Hi"},"index":0}]}"#)).unwrap();
        assert_eq!(
            events,
            vec![NormalizedEvent::MessageDelta {
                text: "Hi".to_string()
            }]
        );
    }

    #[test]
    fn test_role_only_frame_is_skipped() {
        let events =
            frame_events(&frame(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#)).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_done_and_error_frames() {
        assert_eq!(frame_events(&frame("[DONE]")).unwrap(), vec![NormalizedEvent::Done]);

        let events =
            frame_events(&frame(r#"{"error":{"message":"quota exceeded","code":429}}"#)).unwrap();
        assert_eq!(
            events,
            vec![NormalizedEvent::Error {
                message: "quota exceeded".to_string(),
                code: Some("429".to_string()),
            }]
        );
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(frame_events(&frame("{not json")).is_err());
    }

    #[test]
    fn test_upstream_error_message() {
        let body = r#"[{"error":{"code":400,"message":"API key not valid"}}]"#;
        assert_eq!(upstream_error_message(body), "API key not valid");
        assert_eq!(upstream_error_message("plain failure\n"), "plain failure");
    }

    #[test]
    fn test_request_body_respects_provider() {
        let settings = LlmSettings {
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            api_key: None,
            model: "gemini-2.0-flash".to_string(),
            provider: Provider::Gemini,
        };
        let driver = ChatCompletionsDriver::new(settings);
        let req = LlmRequest {
            messages: vec![Message::system("be brief"), Message::user("hi")],
            generation: GenerationConfig::default(),
        };
        let body = driver.request_body(&req);
        assert_eq!(body["stream"], true);
        assert_eq!(body["max_tokens"], 8192);
        assert_eq!(body["messages"][0]["role"], "system");
        assert!(body.get("top_k").is_none());
    }
}
