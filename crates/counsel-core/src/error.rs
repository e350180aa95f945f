use thiserror::Error;

/// Failure classification reported by a [`GenerationClient`](crate::agent::GenerationClient).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Network, timeout, rate-limit or server-side failure. Worth retrying.
    #[error("transient generation failure: {0}")]
    Transient(String),
    /// Authentication, malformed request or unusable response. Never retried.
    #[error("fatal generation failure: {0}")]
    Fatal(String),
}

impl GenerationError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    /// Missing identifiers or credentials. Raised at startup, never per request.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Retry budget exhausted or a fatal call failure. Aborts the whole report.
    #[error("generation failed after {attempts} attempt(s): {source}")]
    GenerationFailed {
        attempts: u32,
        #[source]
        source: GenerationError,
    },

    #[error("unknown section type: {0}")]
    UnknownSectionType(String),

    #[error("unknown persona key: {0}")]
    UnknownPersonaKey(String),
}
