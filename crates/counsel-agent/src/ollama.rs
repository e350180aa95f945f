use std::time::Duration;

use async_trait::async_trait;
use counsel_core::agent::{Generation, GenerationClient, GenerationConfig};
use counsel_core::{GenerationError, TokenUsage};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{classify_status, classify_transport, http_client};

/// Calls a locally-hosted Ollama model via its native chat API.
///
/// Keeps complaint text on the local machine.
pub struct OllamaBackend {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl OllamaBackend {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            timeout_secs: 300,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

#[derive(Serialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    num_predict: u32,
}

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
    #[serde(default)]
    prompt_eval_count: u64,
    #[serde(default)]
    eval_count: u64,
}

#[derive(Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

#[async_trait]
impl GenerationClient for OllamaBackend {
    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<Generation, GenerationError> {
        let request_body = OllamaChatRequest {
            model: self.model.clone(),
            messages: vec![OllamaMessage {
                role: "user".into(),
                content: prompt.to_string(),
            }],
            stream: false,
            options: OllamaOptions {
                temperature: config.temperature,
                top_p: config.top_p,
                top_k: config.top_k,
                num_predict: config.max_output_tokens,
            },
        };

        info!(
            model = %self.model,
            base_url = %self.base_url,
            "calling ollama chat API"
        );

        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let client = http_client(Duration::from_secs(self.timeout_secs))?;

        let response = match client.post(&url).json(&request_body).send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                warn!(timeout_secs = self.timeout_secs, "ollama request timed out");
                return Err(classify_transport(&e));
            },
            Err(e) => {
                warn!("ollama request failed: {}", e);
                return Err(classify_transport(&e));
            },
        };

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            warn!("failed to read ollama response: {}", e);
            GenerationError::Transient(format!("failed to read ollama response: {e}"))
        })?;

        if !status.is_success() {
            warn!(status = %status, "ollama returned non-200: {}", body);
            return Err(classify_status(status, &body));
        }

        let parsed: OllamaChatResponse = serde_json::from_str(&body).map_err(|e| {
            warn!("failed to parse ollama response: {}", e);
            GenerationError::Fatal(format!("failed to parse ollama response: {e}"))
        })?;

        let text = parsed.message.content;
        if text.trim().is_empty() {
            return Err(GenerationError::Fatal("ollama returned an empty message".into()));
        }
        let usage = TokenUsage::new(parsed.prompt_eval_count, parsed.eval_count);

        info!(
            model = %self.model,
            tokens = usage.total_tokens,
            output_len = text.len(),
            "ollama response received"
        );

        Ok(Generation { text, usage })
    }

    fn model_name(&self) -> String {
        self.model.clone()
    }
}
