use std::collections::HashMap;
use std::time::Duration;

use crate::agent::GenerationConfig;
use crate::error::ReportError;
use crate::generator::PricingRates;
use crate::quality::DEFAULT_QUALITY_THRESHOLD;

/// Full application configuration.
/// Read from the process environment, falling back to a `.env` file.
#[derive(Debug, Clone)]
pub struct Config {
    // Text-generation service
    /// "vertex" (default) or "ollama".
    pub backend: String,
    pub project_id: String,
    pub location: String,
    pub model: String,
    pub vertex_access_token: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub request_timeout_s: u64,
    /// Issue one tiny generation at startup to prove credentials.
    pub verify_on_startup: bool,

    // Sampling
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,

    // Cost / quality
    pub input_cost_per_1k: f64,
    pub output_cost_per_1k: f64,
    pub quality_threshold: f64,

    // Web service
    pub web_bind: String,
    pub web_port: u16,
    pub debug: bool,
}

fn parse_dotenv() -> HashMap<String, String> {
    let mut map = HashMap::new();
    let Ok(contents) = std::fs::read_to_string(".env") else {
        return map;
    };
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((k, v)) = line.split_once('=') {
            let v = v.trim().trim_matches('"');
            map.insert(k.trim().to_string(), v.to_string());
        }
    }
    map
}

/// Process environment, skipping entries that are not valid UTF-8.
fn process_env() -> impl Iterator<Item = (String, String)> {
    std::env::vars_os().filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
}

fn get(key: &str, vars: &HashMap<String, String>) -> Option<String> {
    vars.get(key).filter(|v| !v.is_empty()).cloned()
}

fn get_str(key: &str, vars: &HashMap<String, String>, default: &str) -> String {
    get(key, vars).unwrap_or_else(|| default.to_string())
}

fn get_bool(key: &str, vars: &HashMap<String, String>, default: bool) -> bool {
    match get(key, vars).map(|v| v.to_ascii_lowercase()).as_deref() {
        Some("true") | Some("1") | Some("yes") => true,
        Some("false") | Some("0") | Some("no") => false,
        _ => default,
    }
}

fn get_parsed<T: std::str::FromStr>(key: &str, vars: &HashMap<String, String>, default: T) -> T {
    get(key, vars)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Process environment first, then `.env` in the working directory.
    pub fn from_env() -> Self {
        let mut vars = parse_dotenv();
        vars.extend(process_env());
        Self::from_vars(&vars)
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let defaults = GenerationConfig::default();
        let pricing = PricingRates::default();
        Self {
            backend: get_str("BACKEND", vars, "vertex").to_ascii_lowercase(),
            project_id: get_str("PROJECT_ID", vars, ""),
            location: get_str("LOCATION", vars, "us-central1"),
            model: get_str("MODEL", vars, "gemini-2.0-flash"),
            vertex_access_token: get_str("VERTEX_ACCESS_TOKEN", vars, ""),
            ollama_url: get_str("OLLAMA_URL", vars, "http://localhost:11434"),
            ollama_model: get_str("OLLAMA_MODEL", vars, "llama3.1"),
            request_timeout_s: get_parsed("REQUEST_TIMEOUT_S", vars, 120),
            verify_on_startup: get_bool("VERIFY_ON_STARTUP", vars, false),

            temperature: get_parsed("TEMPERATURE", vars, defaults.temperature),
            top_p: get_parsed("TOP_P", vars, defaults.top_p),
            top_k: get_parsed("TOP_K", vars, defaults.top_k),
            max_output_tokens: get_parsed("MAX_OUTPUT_TOKENS", vars, defaults.max_output_tokens),

            input_cost_per_1k: get_parsed("INPUT_COST_PER_1K", vars, pricing.input_per_1k),
            output_cost_per_1k: get_parsed("OUTPUT_COST_PER_1K", vars, pricing.output_per_1k),
            quality_threshold: get_parsed("QUALITY_THRESHOLD", vars, DEFAULT_QUALITY_THRESHOLD),

            web_bind: get_str("WEB_BIND", vars, "0.0.0.0"),
            web_port: get_parsed("WEB_PORT", vars, 8000),
            debug: get_bool("DEBUG", vars, false),
        }
    }

    /// Startup check. Any error here is fatal; requests never see it.
    pub fn validate(&self) -> Result<(), ReportError> {
        match self.backend.as_str() {
            "vertex" => {
                if self.project_id.is_empty() {
                    return Err(ReportError::Configuration(
                        "PROJECT_ID is required for the vertex backend".into(),
                    ));
                }
                if self.vertex_access_token.is_empty() {
                    return Err(ReportError::Configuration(
                        "VERTEX_ACCESS_TOKEN is required for the vertex backend".into(),
                    ));
                }
            }
            "ollama" => {}
            other => {
                return Err(ReportError::Configuration(format!(
                    "unknown BACKEND {other:?}, expected vertex or ollama"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.quality_threshold) {
            return Err(ReportError::Configuration(format!(
                "QUALITY_THRESHOLD must be within [0, 1], got {}",
                self.quality_threshold
            )));
        }
        Ok(())
    }

    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            max_output_tokens: self.max_output_tokens,
        }
    }

    pub fn pricing(&self) -> PricingRates {
        PricingRates {
            input_per_1k: self.input_cost_per_1k,
            output_per_1k: self.output_cost_per_1k,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_s)
    }

    /// Model identifier of the selected backend.
    pub fn active_model(&self) -> &str {
        if self.backend == "ollama" {
            &self.ollama_model
        } else {
            &self.model
        }
    }

    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "counsel_server=debug,counsel_core=debug,counsel_domains=debug,counsel_agent=debug,tower_http=debug"
        } else {
            "counsel_server=info,counsel_core=info,counsel_domains=info,counsel_agent=info,tower_http=info"
        }
    }
}
