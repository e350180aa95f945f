pub mod agent;
pub mod config;
pub mod error;
pub mod generator;
pub mod metrics;
pub mod orchestrator;
pub mod pipeline;
pub mod prompt;
pub mod quality;
pub mod types;

pub use error::{GenerationError, ReportError};
pub use types::*;
