//! Client for the `/generate` streaming endpoint.
//!
//! [`GenerateClient`] opens the SSE stream and decodes [`StreamPayload`]s;
//! [`ChatView`] folds them into displayable chat state.
//!
//! # Example
//!
//! ```rust,no_run
//! use prompt_optimizer::client::{ChatView, GenerateClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GenerateClient::new("http://127.0.0.1:5000")?;
//! let mut view = ChatView::new();
//! let reply = client
//!     .run_turn(&mut view, "Write a haiku about rust", |token| print!("{token}"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod view;

pub use error::{ClientError, Result};
pub use view::{ChatMessage, ChatRole, ChatView, FALLBACK_REPLY, GenerateRequest};

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::normalized::StreamPayload;
use crate::sse::SseDecoder;

#[derive(Debug, Serialize)]
struct CompleteRequest<'a> {
    prompt: &'a str,
    is_followup: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct CompleteResponse {
    response: String,
}

/// HTTP client for the optimizer server.
#[derive(Debug, Clone)]
pub struct GenerateClient {
    base_url: Url,
    http: reqwest::Client,
    session_id: Option<String>,
}

impl GenerateClient {
    /// Create a client for the server at `base_url`.
    ///
    /// A path prefix on `base_url` is kept, so `http://host/peo` calls
    /// `http://host/peo/generate`.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let mut base_url = Url::parse(base_url.as_ref())?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
            session_id: None,
        })
    }

    /// Use a named conversation instead of the server's default one.
    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Url {
        self.base_url
            .join(path)
            .unwrap_or_else(|_| self.base_url.clone())
    }

    /// URL of the SSE stream for `req`.
    #[must_use]
    pub fn generate_url(&self, req: &GenerateRequest) -> Url {
        let mut url = self.url("generate");
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("prompt", &req.prompt)
                .append_pair("is_followup", if req.is_followup { "true" } else { "false" });
            if let Some(id) = &self.session_id {
                query.append_pair("session_id", id);
            }
        }
        url
    }

    /// Open the stream for one turn.
    ///
    /// The stream ends after the `done` payload. Payloads that are not valid
    /// JSON are skipped.
    pub async fn stream(
        &self,
        req: &GenerateRequest,
    ) -> Result<impl Stream<Item = Result<StreamPayload>> + Send + 'static> {
        let response = self
            .http
            .get(self.generate_url(req))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let byte_stream = response.bytes_stream();

        Ok(async_stream::stream! {
            let mut decoder = SseDecoder::new();
            let mut finished = false;

            futures::pin_mut!(byte_stream);
            'read: while let Some(chunk) = byte_stream.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(ClientError::from(e));
                        return;
                    }
                };
                for frame in decoder.push(&chunk) {
                    let Some(payload) = parse_payload(&frame.data) else {
                        continue;
                    };
                    let terminal = payload.is_terminal();
                    yield Ok::<StreamPayload, ClientError>(payload);
                    if terminal {
                        finished = true;
                        break 'read;
                    }
                }
            }

            if !finished {
                if let Some(payload) = decoder.finish().and_then(|f| parse_payload(&f.data)) {
                    finished = payload.is_terminal();
                    yield Ok(payload);
                }
            }

            if !finished {
                yield Err(ClientError::StreamEnded);
            }
        })
    }

    /// Run a turn without streaming and return the model reply.
    pub async fn complete(&self, req: &GenerateRequest) -> Result<String> {
        let body = CompleteRequest {
            prompt: &req.prompt,
            is_followup: req.is_followup,
            session_id: self.session_id.as_deref(),
        };
        let response = self
            .http
            .post(self.url("generate_complete"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: CompleteResponse = response.json().await?;
        Ok(body.response)
    }

    /// Submit `prompt` through `view` and stream the reply into it.
    ///
    /// `on_token` sees every fragment as it arrives. Returns `Ok(None)` for a
    /// blank prompt, otherwise the final reply text.
    pub async fn run_turn(
        &self,
        view: &mut ChatView,
        prompt: &str,
        mut on_token: impl FnMut(&str),
    ) -> Result<Option<String>> {
        let Some(req) = view.submit(prompt) else {
            return Ok(None);
        };

        let stream = match self.stream(&req).await {
            Ok(s) => s,
            Err(e) => {
                view.connection_failed();
                return Err(e);
            }
        };
        futures::pin_mut!(stream);

        while let Some(item) = stream.next().await {
            match item {
                Ok(payload) => {
                    if let Some(token) = &payload.token {
                        on_token(token);
                    }
                    let error = payload.error.clone();
                    if view.apply(&payload) {
                        if let Some(error) = error {
                            return Err(ClientError::Generation(error));
                        }
                        break;
                    }
                }
                Err(e) => {
                    view.connection_failed();
                    return Err(e);
                }
            }
        }

        Ok(view.last_reply().map(ToString::to_string))
    }
}

fn parse_payload(data: &str) -> Option<StreamPayload> {
    if data.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(data) {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed stream payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_url_encoding() {
        let client = GenerateClient::new("http://localhost:5000").unwrap();
        let url = client.generate_url(&GenerateRequest {
            prompt: "a & b = c?".to_string(),
            is_followup: true,
        });
        assert_eq!(url.path(), "/generate");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("prompt".to_string(), "a & b = c?".to_string()),
                ("is_followup".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn test_generate_url_with_session() {
        let client = GenerateClient::new("http://localhost:5000/")
            .unwrap()
            .with_session("s-1");
        let url = client.generate_url(&GenerateRequest {
            prompt: "p".to_string(),
            is_followup: false,
        });
        assert!(url.as_str().ends_with("is_followup=false&session_id=s-1"));
    }

    #[test]
    fn test_base_path_prefix_is_kept() {
        let req = GenerateRequest {
            prompt: "p".to_string(),
            is_followup: false,
        };
        for base in ["http://host/peo", "http://host/peo/"] {
            let client = GenerateClient::new(base).unwrap();
            assert_eq!(client.generate_url(&req).path(), "/peo/generate");
            assert_eq!(client.url("generate_complete").as_str(), "http://host/peo/generate_complete");
        }
    }

    #[test]
    fn test_parse_payload_skips_garbage() {
        assert!(parse_payload("not json").is_none());
        assert!(parse_payload("").is_none());
        assert_eq!(parse_payload(r#"{"token":"x"}"#), Some(StreamPayload::token("x")));
    }
}
