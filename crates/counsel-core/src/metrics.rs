use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::quality::DEFAULT_QUALITY_THRESHOLD;
use crate::types::{TokenUsage, ValidationResult};

/// Validations considered by [`MetricsCollector::quality_metrics`].
const QUALITY_WINDOW: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TokenUsageStats {
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_tokens: u64,
    pub average_tokens_per_request: f64,
    pub total_requests: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QualityMetrics {
    pub average_quality_score: f64,
    pub pass_rate: f64,
    pub validations: usize,
    pub quality_threshold: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub token_usage: TokenUsageStats,
    pub quality: QualityMetrics,
    pub average_processing_time: f64,
    pub success_rate: f64,
    pub total_attempts: u64,
    pub reports_completed: usize,
}

/// Running aggregates only; nothing here grows with uptime except the
/// bounded validation window.
#[derive(Debug, Default)]
struct MetricsState {
    input_tokens: u64,
    output_tokens: u64,
    requests: usize,
    processing_seconds: f64,
    reports: usize,
    attempts: u64,
    successes: u64,
    validations: VecDeque<(f64, bool)>,
}

/// Process-wide counters shared by every pipeline run.
///
/// Injected as `Arc<MetricsCollector>` rather than held in a global so tests
/// can observe a private instance.
#[derive(Debug)]
pub struct MetricsCollector {
    quality_threshold: f64,
    state: Mutex<MetricsState>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new(DEFAULT_QUALITY_THRESHOLD)
    }
}

impl MetricsCollector {
    pub fn new(quality_threshold: f64) -> Self {
        Self {
            quality_threshold,
            state: Mutex::new(MetricsState::default()),
        }
    }

    // A panic while holding the lock cannot leave the counters half-written,
    // so a poisoned mutex is still safe to read.
    fn state(&self) -> MutexGuard<'_, MetricsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_attempt(&self, success: bool) {
        let mut s = self.state();
        s.attempts += 1;
        if success {
            s.successes += 1;
        }
    }

    pub fn record_usage(&self, usage: TokenUsage) {
        let mut s = self.state();
        s.input_tokens += usage.input_tokens;
        s.output_tokens += usage.output_tokens;
        s.requests += 1;
    }

    pub fn record_processing_time(&self, seconds: f64) {
        let mut s = self.state();
        s.processing_seconds += seconds;
        s.reports += 1;
    }

    pub fn record_validation(&self, result: &ValidationResult) {
        let mut s = self.state();
        if s.validations.len() == QUALITY_WINDOW {
            s.validations.pop_front();
        }
        s.validations.push_back((result.overall_score, result.passed));
    }

    pub fn token_usage_stats(&self) -> TokenUsageStats {
        let s = self.state();
        let total_requests = s.requests;
        let total_input_tokens = s.input_tokens;
        let total_output_tokens = s.output_tokens;
        let total_tokens = total_input_tokens + total_output_tokens;
        let average_tokens_per_request = if total_requests == 0 {
            0.0
        } else {
            total_tokens as f64 / total_requests as f64
        };
        TokenUsageStats {
            total_input_tokens,
            total_output_tokens,
            total_tokens,
            average_tokens_per_request,
            total_requests,
        }
    }

    pub fn average_processing_time(&self) -> f64 {
        let s = self.state();
        if s.reports == 0 {
            return 0.0;
        }
        s.processing_seconds / s.reports as f64
    }

    /// Fraction of generation calls that succeeded; 0.0 before any call.
    pub fn success_rate(&self) -> f64 {
        let s = self.state();
        if s.attempts == 0 {
            return 0.0;
        }
        s.successes as f64 / s.attempts as f64
    }

    pub fn quality_metrics(&self) -> QualityMetrics {
        let s = self.state();
        let recent = &s.validations;
        if recent.is_empty() {
            return QualityMetrics {
                quality_threshold: self.quality_threshold,
                ..QualityMetrics::default()
            };
        }
        let n = recent.len() as f64;
        QualityMetrics {
            average_quality_score: recent.iter().map(|(score, _)| score).sum::<f64>() / n,
            pass_rate: recent.iter().filter(|(_, passed)| *passed).count() as f64 / n,
            validations: recent.len(),
            quality_threshold: self.quality_threshold,
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let (total_attempts, reports_completed) = {
            let s = self.state();
            (s.attempts, s.reports)
        };
        MetricsSnapshot {
            token_usage: self.token_usage_stats(),
            quality: self.quality_metrics(),
            average_processing_time: self.average_processing_time(),
            success_rate: self.success_rate(),
            total_attempts,
            reports_completed,
        }
    }

    pub fn reset(&self) {
        *self.state() = MetricsState::default();
    }
}
