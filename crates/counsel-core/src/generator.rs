use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::agent::{GenerationClient, GenerationConfig};
use crate::error::{GenerationError, ReportError};
use crate::metrics::MetricsCollector;
use crate::types::TokenUsage;

/// Transport retry budget for a single generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Wait after the failed attempt with zero-based index `attempt`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Per-1000-token prices used to derive the cost of a call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingRates {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

impl Default for PricingRates {
    fn default() -> Self {
        Self {
            input_per_1k: 0.00025,
            output_per_1k: 0.00125,
        }
    }
}

impl PricingRates {
    pub fn cost(&self, usage: &TokenUsage) -> f64 {
        usage.input_tokens as f64 / 1000.0 * self.input_per_1k
            + usage.output_tokens as f64 / 1000.0 * self.output_per_1k
    }
}

/// One successful generation with its accounting.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub text: String,
    pub usage: TokenUsage,
    pub cost: f64,
}

/// Wraps a [`GenerationClient`] with bounded exponential-backoff retry,
/// cost derivation and metrics recording.
pub struct SectionGenerator {
    client: Arc<dyn GenerationClient>,
    config: GenerationConfig,
    retry: RetryPolicy,
    pricing: PricingRates,
    metrics: Arc<MetricsCollector>,
}

impl SectionGenerator {
    pub fn new(client: Arc<dyn GenerationClient>, metrics: Arc<MetricsCollector>) -> Self {
        Self {
            client,
            config: GenerationConfig::default(),
            retry: RetryPolicy::default(),
            pricing: PricingRates::default(),
            metrics,
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = RetryPolicy {
            max_attempts: retry.max_attempts.max(1),
            ..retry
        };
        self
    }

    pub fn with_pricing(mut self, pricing: PricingRates) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn model_name(&self) -> String {
        self.client.model_name()
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    /// Call the client until it succeeds, the retry budget runs out, or it
    /// reports a fatal error. Only transient failures are retried.
    pub async fn generate_with_retry(&self, prompt: &str) -> Result<Draft, ReportError> {
        let mut last_error = None;

        for attempt in 0..self.retry.max_attempts {
            match self.client.generate(prompt, &self.config).await {
                Ok(generation) => {
                    self.metrics.record_attempt(true);
                    self.metrics.record_usage(generation.usage);
                    let cost = self.pricing.cost(&generation.usage);
                    debug!(
                        attempt = attempt + 1,
                        tokens = generation.usage.total_tokens,
                        cost,
                        "generation succeeded"
                    );
                    return Ok(Draft {
                        text: generation.text,
                        usage: generation.usage,
                        cost,
                    });
                }
                Err(e @ GenerationError::Fatal(_)) => {
                    self.metrics.record_attempt(false);
                    error!(attempt = attempt + 1, error = %e, "generation failed, not retrying");
                    return Err(ReportError::GenerationFailed {
                        attempts: attempt + 1,
                        source: e,
                    });
                }
                Err(e) => {
                    self.metrics.record_attempt(false);
                    if attempt + 1 < self.retry.max_attempts {
                        let delay = self.retry.delay_after(attempt);
                        warn!(
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "generation failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    } else {
                        error!(attempt = attempt + 1, error = %e, "generation retries exhausted");
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(ReportError::GenerationFailed {
            attempts: self.retry.max_attempts,
            source: last_error
                .unwrap_or_else(|| GenerationError::Fatal("no generation attempt was made".into())),
        })
    }
}
