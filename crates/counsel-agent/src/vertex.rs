use std::time::Duration;

use async_trait::async_trait;
use counsel_core::agent::{Generation, GenerationClient, GenerationConfig};
use counsel_core::{GenerationError, TokenUsage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{classify_status, classify_transport, http_client};

/// Calls a Gemini model through the Vertex AI `generateContent` REST API.
///
/// Authenticates with a pre-issued OAuth access token (for example the
/// output of `gcloud auth print-access-token`).
pub struct VertexBackend {
    pub project_id: String,
    pub location: String,
    pub model: String,
    access_token: String,
    endpoint: String,
    pub timeout_secs: u64,
}

impl VertexBackend {
    pub fn new(
        project_id: impl Into<String>,
        location: impl Into<String>,
        model: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        let location = location.into();
        Self {
            endpoint: format!("https://{location}-aiplatform.googleapis.com"),
            project_id: project_id.into(),
            location,
            model: model.into(),
            access_token: access_token.into(),
            timeout_secs: 120,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Replace the regional API host, e.g. with a local stub.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.project_id,
            self.location,
            self.model
        )
    }
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SamplingParams {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: SamplingParams,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: UsageMetadata,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[async_trait]
impl GenerationClient for VertexBackend {
    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<Generation, GenerationError> {
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: SamplingParams {
                temperature: config.temperature,
                top_p: config.top_p,
                top_k: config.top_k,
                max_output_tokens: config.max_output_tokens,
            },
        };

        debug!(
            model = %self.model,
            location = %self.location,
            prompt_len = prompt.len(),
            "calling vertex generateContent"
        );

        let client = http_client(Duration::from_secs(self.timeout_secs))?;
        let response = client
            .post(self.url())
            .bearer_auth(&self.access_token)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                warn!(model = %self.model, "vertex request failed: {}", e);
                classify_transport(&e)
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::Transient(format!("failed to read vertex response: {e}")))?;

        if !status.is_success() {
            warn!(model = %self.model, status = %status, "vertex returned non-200");
            return Err(classify_status(status, &body));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| GenerationError::Fatal(format!("failed to parse vertex response: {e}")))?;

        let Some(candidate) = parsed.candidates.into_iter().next() else {
            return Err(GenerationError::Fatal("vertex response has no candidates".into()));
        };
        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(GenerationError::Fatal(format!(
                "vertex candidate has no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        let usage = TokenUsage::new(
            parsed.usage_metadata.prompt_token_count,
            parsed.usage_metadata.candidates_token_count,
        );

        info!(
            model = %self.model,
            tokens = usage.total_tokens,
            output_len = text.len(),
            "vertex response received"
        );

        Ok(Generation { text, usage })
    }

    fn model_name(&self) -> String {
        self.model.clone()
    }
}
