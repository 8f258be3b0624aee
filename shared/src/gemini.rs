//! Client for the Generative Language `generateContent` endpoint.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::{Config, Error, Result};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Request body for `generateContent`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

/// One content block.
#[derive(Debug, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

/// One text part.
#[derive(Debug, Serialize)]
pub struct Part {
    pub text: String,
}

/// Sampling parameters.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl GenerateContentRequest {
    /// Single user block holding the whole prompt.
    pub fn from_prompt(prompt: &str, generation_config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config,
        }
    }
}

/// Client for invoking the upstream model.
///
/// Issues exactly one POST per call. No retries, and no timeout beyond whatever the
/// hosting platform enforces.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http_client: reqwest::Client,
    endpoint: String,
    generation_config: GenerationConfig,
}

impl GeminiClient {
    /// Create a new client.
    pub fn new(http_client: reqwest::Client, endpoint: String, generation_config: GenerationConfig) -> Self {
        Self {
            http_client,
            endpoint,
            generation_config,
        }
    }

    /// Create a client from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            reqwest::Client::new(),
            config.endpoint(),
            GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
            },
        )
    }

    /// Send the prompt and return the raw JSON response.
    ///
    /// A non-success status yields [`Error::Upstream`] carrying that status and the
    /// unmodified response body.
    pub async fn generate(&self, api_key: &str, prompt: &str) -> Result<Value> {
        let payload = GenerateContentRequest::from_prompt(prompt, self.generation_config);

        debug!(endpoint = %self.endpoint, prompt_len = prompt.len(), "Calling upstream");

        let response = self
            .http_client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!("Upstream request failed: {}", e);
                Error::Upstream {
                    status: None,
                    detail: format!("Failed to reach upstream: {}", e),
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| Error::Upstream {
            status: None,
            detail: format!("Failed to read upstream response: {}", e),
        })?;

        if !status.is_success() {
            error!(status = status.as_u16(), "Upstream returned an error status");
            return Err(Error::Upstream {
                status: Some(status.as_u16()),
                detail: body,
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Upstream {
            status: None,
            detail: format!("Failed to parse upstream response: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let request = GenerateContentRequest::from_prompt(
            "Solve it",
            GenerationConfig {
                temperature: 0.25,
                max_output_tokens: 2048,
            },
        );

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"].as_array().unwrap().len(), 1);
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Solve it");
        assert_eq!(json["generationConfig"]["temperature"], 0.25);
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 2048);
    }
}
