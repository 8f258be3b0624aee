//! Configuration management for the solve Lambda.

use std::env;
use std::str::FromStr;

/// Default Generative Language API base URL.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";

/// Application configuration loaded from environment variables.
///
/// The upstream credential is deliberately absent: it is read per invocation
/// through [`crate::ApiKeySource`].
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Upstream API base URL (no trailing slash)
    pub api_base: String,
    /// Model name used in the generateContent path
    pub model: String,
    /// Width of a rate-limit window in milliseconds
    pub rate_limit_window_ms: u64,
    /// Requests allowed per identity per window
    pub max_requests_per_window: u32,
    /// Maximum question length in characters
    pub max_question_length: usize,
    /// Sampling temperature sent upstream
    pub temperature: f32,
    /// Output token cap sent upstream
    pub max_output_tokens: u32,
    /// Secrets Manager ARN holding the API key, if the env var is not used
    pub api_key_secret_arn: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            rate_limit_window_ms: 60 * 1000,
            max_requests_per_window: 6,
            max_question_length: 4000,
            temperature: 0.2,
            max_output_tokens: 2048,
            api_key_secret_arn: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base: env::var("GEMINI_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            model: env::var("GEMINI_MODEL").unwrap_or(defaults.model),
            rate_limit_window_ms: parse_var("RATE_LIMIT_WINDOW_MS", defaults.rate_limit_window_ms),
            max_requests_per_window: parse_var(
                "RATE_LIMIT_MAX_REQUESTS",
                defaults.max_requests_per_window,
            ),
            max_question_length: parse_var("MAX_QUESTION_LENGTH", defaults.max_question_length),
            temperature: parse_var("GEMINI_TEMPERATURE", defaults.temperature),
            max_output_tokens: parse_var("GEMINI_MAX_OUTPUT_TOKENS", defaults.max_output_tokens),
            api_key_secret_arn: env::var("GEMINI_API_KEY_SECRET_ARN")
                .ok()
                .filter(|arn| !arn.trim().is_empty()),
        }
    }

    /// Full generateContent endpoint for the configured model.
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
