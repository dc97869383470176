#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use prompt_optimizer::AppState;
use prompt_optimizer::config::{
    AppConfig, LlmConfig, LogConfig, ResilienceConfig, ServerConfig, SessionConfig,
};
use prompt_optimizer::llm::{
    EventStream, GenerationConfig, LlmDriver, LlmRequest, Optimizer,
};
use prompt_optimizer::normalized::NormalizedEvent;

/// Driver that answers every request with the same script.
pub struct ScriptedDriver {
    tokens: Vec<String>,
    error: Option<String>,
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedDriver {
    pub fn replying(tokens: &[&str]) -> Self {
        Self {
            tokens: tokens.iter().map(ToString::to_string).collect(),
            error: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(tokens: &[&str], error: &str) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::replying(tokens)
        }
    }
}

#[async_trait::async_trait]
impl LlmDriver for ScriptedDriver {
    async fn stream(&self, req: LlmRequest) -> anyhow::Result<EventStream> {
        self.requests.lock().unwrap().push(req);

        let mut events: Vec<anyhow::Result<NormalizedEvent>> = self
            .tokens
            .iter()
            .map(|t| Ok(NormalizedEvent::MessageDelta { text: t.clone() }))
            .collect();
        match &self.error {
            Some(message) => events.push(Ok(NormalizedEvent::Error {
                message: message.clone(),
                code: None,
            })),
            None => events.push(Ok(NormalizedEvent::Done)),
        }
        Ok(Box::pin(futures::stream::iter(events)))
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
        },
        llm: LlmConfig {
            base_url: "http://localhost:9".to_string(),
            model: "test-model".to_string(),
            api_key: None,
            deployment_name: None,
            api_version: None,
        },
        generation: GenerationConfig::default(),
        resilience: ResilienceConfig {
            rate_limit_enabled: false,
            requests_per_second: 100,
            burst_size: 100,
            timeout_disabled: false,
            request_timeout_secs: 30,
        },
        session: SessionConfig {
            idle_timeout_secs: 1800,
            sweep_interval_secs: 60,
        },
        log: LogConfig {
            format: "pretty".to_string(),
            filter: "warn".to_string(),
        },
    }
}

pub fn state_with(driver: Arc<ScriptedDriver>, config: AppConfig) -> AppState {
    let optimizer = Optimizer::with_driver(driver, config.generation.clone());
    AppState::new(Arc::new(config), optimizer)
}
