use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::types::TokenUsage;

/// Sampling parameters forwarded to the text-generation service.
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
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 2048,
        }
    }
}

/// Text plus token accounting returned by one successful call.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    pub usage: TokenUsage,
}

#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<Generation, GenerationError>;

    /// Short identifier used in logs and report metadata.
    fn model_name(&self) -> String;

    /// One tiny round-trip to prove credentials and connectivity at startup.
    async fn health_check(&self) -> Result<(), GenerationError> {
        let config = GenerationConfig {
            max_output_tokens: 16,
            ..GenerationConfig::default()
        };
        let generation = self.generate("Reply with the single word OK.", &config).await?;
        if generation.text.trim().is_empty() {
            return Err(GenerationError::Fatal("health check returned no text".into()));
        }
        Ok(())
    }
}
