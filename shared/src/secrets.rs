//! Upstream API key resolution.
//!
//! The key is looked up on every invocation: first the `GEMINI_API_KEY` environment
//! variable, then (if configured) AWS Secrets Manager.

use aws_sdk_secretsmanager::Client as SecretsClient;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::sync::OnceLock;
use tokio::sync::RwLock;

use crate::{Error, Result};

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Cached secrets with lazy initialization.
static SECRETS_CACHE: OnceLock<RwLock<HashMap<String, String>>> = OnceLock::new();

fn get_cache() -> &'static RwLock<HashMap<String, String>> {
    SECRETS_CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Secret payload stored as JSON.
#[derive(Debug, Deserialize)]
struct ApiKeySecret {
    api_key: String,
}

/// Where the upstream API key comes from.
#[derive(Debug, Clone)]
pub enum ApiKeySource {
    /// Environment variable, falling back to a Secrets Manager secret
    Environment {
        var: String,
        secret: Option<(SecretsClient, String)>,
    },
    /// A value fixed at construction
    Fixed(Option<String>),
}

impl ApiKeySource {
    /// Read `GEMINI_API_KEY`, with an optional Secrets Manager fallback.
    pub fn environment(secret: Option<(SecretsClient, String)>) -> Self {
        ApiKeySource::Environment {
            var: API_KEY_VAR.to_string(),
            secret,
        }
    }

    /// Resolve the key. `Ok(None)` means no key is configured anywhere.
    pub async fn resolve(&self) -> Result<Option<String>> {
        match self {
            ApiKeySource::Fixed(key) => Ok(non_blank(key.clone())),
            ApiKeySource::Environment { var, secret } => {
                if let Some(key) = non_blank(env::var(var).ok()) {
                    return Ok(Some(key));
                }
                match secret {
                    Some((client, arn)) => {
                        let raw = get_secret(client, arn).await?;
                        Ok(non_blank(Some(parse_api_key(&raw))))
                    }
                    None => Ok(None),
                }
            }
        }
    }
}

fn non_blank(key: Option<String>) -> Option<String> {
    key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
}

/// Accept either a bare key or `{"api_key": "..."}`.
fn parse_api_key(secret_string: &str) -> String {
    serde_json::from_str::<ApiKeySecret>(secret_string)
        .map(|secret| secret.api_key)
        .unwrap_or_else(|_| secret_string.to_string())
        .trim()
        .to_string()
}

/// Get a secret value from Secrets Manager with caching.
pub async fn get_secret(client: &SecretsClient, secret_arn: &str) -> Result<String> {
    // Check cache first
    {
        let cache = get_cache().read().await;
        if let Some(value) = cache.get(secret_arn) {
            return Ok(value.clone());
        }
    }

    let response = client
        .get_secret_value()
        .secret_id(secret_arn)
        .send()
        .await
        .map_err(|e| Error::Aws(format!("Failed to get secret: {}", e)))?;

    let secret_string = response
        .secret_string()
        .ok_or_else(|| Error::Aws("Secret has no string value".to_string()))?
        .to_string();

    {
        let mut cache = get_cache().write().await;
        cache.insert(secret_arn.to_string(), secret_string.clone());
    }

    Ok(secret_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_key() {
        assert_eq!(parse_api_key(r#"{"api_key":"AIza-123"}"#), "AIza-123");
        assert_eq!(parse_api_key("  AIza-raw\n"), "AIza-raw");
    }

    #[tokio::test]
    async fn test_fixed_source() {
        let source = ApiKeySource::Fixed(Some(" key ".to_string()));
        assert_eq!(source.resolve().await.unwrap().as_deref(), Some("key"));

        let source = ApiKeySource::Fixed(Some("   ".to_string()));
        assert_eq!(source.resolve().await.unwrap(), None);

        assert_eq!(ApiKeySource::Fixed(None).resolve().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_environment_source_without_secret() {
        let source = ApiKeySource::Environment {
            var: "SOLVE_TEST_UNSET_API_KEY".to_string(),
            secret: None,
        };
        assert_eq!(source.resolve().await.unwrap(), None);
    }
}
