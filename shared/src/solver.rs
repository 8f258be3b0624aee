//! The solve pipeline: quota, input, prompt, upstream, answer.
//!
//! Each stage short-circuits on failure; nothing is retried.

use lambda_http::http::Method;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::extract::extract_answer;
use crate::gemini::GeminiClient;
use crate::http::Envelope;
use crate::normalize::NormalizedRequest;
use crate::prompt::build_prompt;
use crate::rate_limit::{RateLimiter, RequestIdentity};
use crate::secrets::ApiKeySource;
use crate::{Config, Error, Result};

/// One incoming invocation, stripped of transport details.
#[derive(Debug, Clone, Copy)]
pub struct SolveCall<'a> {
    pub method: &'a Method,
    pub identity: &'a RequestIdentity,
    pub body: &'a [u8],
}

/// Request pipeline with its collaborators injected.
pub struct Solver {
    config: Config,
    limiter: RateLimiter,
    client: GeminiClient,
    api_key: ApiKeySource,
}

impl Solver {
    pub fn new(config: Config, limiter: RateLimiter, client: GeminiClient, api_key: ApiKeySource) -> Self {
        Self {
            config,
            limiter,
            client,
            api_key,
        }
    }

    /// Wire up a solver from configuration, on the wall clock.
    pub fn from_config(config: Config, api_key: ApiKeySource) -> Self {
        let limiter = RateLimiter::new(config.rate_limit_window_ms, config.max_requests_per_window);
        let client = GeminiClient::from_config(&config);
        Self::new(config, limiter, client, api_key)
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Run the pipeline and map the outcome to a response envelope.
    pub async fn handle(&self, call: SolveCall<'_>) -> Envelope {
        let result = self.solve(call).await;
        if let Err(e) = &result {
            warn!(status = e.status_code(), error = %e, "Solve request failed");
        }
        Envelope::from(result)
    }

    /// Run the pipeline on its own task so a panic becomes a 500 instead of
    /// tearing down the invocation.
    pub async fn handle_owned(
        self: Arc<Self>,
        method: Method,
        identity: RequestIdentity,
        body: Vec<u8>,
    ) -> Envelope {
        let task = tokio::spawn(async move {
            self.handle(SolveCall {
                method: &method,
                identity: &identity,
                body: &body,
            })
            .await
        });

        match task.await {
            Ok(envelope) => envelope,
            Err(e) => {
                let err = Error::from(e);
                error!(error = %err, "Solve task aborted");
                Envelope::from(Err::<String, _>(err))
            }
        }
    }

    /// Run the pipeline, returning the answer text.
    pub async fn solve(&self, call: SolveCall<'_>) -> Result<String> {
        if call.method != Method::POST {
            return Err(Error::MethodNotAllowed);
        }

        if !self.limiter.check(call.identity) {
            return Err(Error::RateLimited);
        }

        let body = parse_body(call.body)?;
        let request = NormalizedRequest::from_body(&body, self.config.max_question_length)?;

        let api_key = self.api_key.resolve().await?.ok_or(Error::MissingCredential)?;

        info!(
            identity = %call.identity,
            topic = %request.topic,
            question_len = request.question.chars().count(),
            "Solving problem"
        );

        let prompt = build_prompt(&request.question, &request.topic);
        let raw = self.client.generate(&api_key, &prompt).await?;
        let answer = extract_answer(&raw)?;

        info!(answer_len = answer.len(), "Problem solved");
        Ok(answer)
    }
}

/// Parse the request body; an empty body counts as `{}`.
fn parse_body(body: &[u8]) -> Result<Value> {
    if body.is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solver(api_key: Option<&str>) -> Solver {
        let config = Config {
            api_base: "http://127.0.0.1:9".to_string(),
            max_requests_per_window: 2,
            ..Config::default()
        };
        Solver::from_config(config, ApiKeySource::Fixed(api_key.map(str::to_string)))
    }

    #[tokio::test]
    async fn test_non_post_is_rejected_before_quota() {
        let solver = solver(Some("key"));
        let identity = RequestIdentity::new("ip");
        let call = SolveCall {
            method: &Method::GET,
            identity: &identity,
            body: b"",
        };

        let err = solver.solve(call).await.unwrap_err();
        assert_eq!(err.status_code(), 405);
        assert!(solver.limiter().window(&identity).is_none());
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let solver = solver(Some("key"));
        let identity = RequestIdentity::new("ip");
        let call = SolveCall {
            method: &Method::POST,
            identity: &identity,
            body: b"{not json",
        };

        let envelope = solver.handle(call).await;
        assert_eq!(envelope.status, 400);
        assert!(envelope.body.contains(r#""error":"Invalid JSON""#));
    }

    #[tokio::test]
    async fn test_empty_body_is_missing_question() {
        let solver = solver(Some("key"));
        let identity = RequestIdentity::new("ip");
        let call = SolveCall {
            method: &Method::POST,
            identity: &identity,
            body: b"",
        };

        assert!(matches!(solver.solve(call).await, Err(Error::MissingQuestion)));
    }

    #[tokio::test]
    async fn test_rejected_requests_still_consume_quota() {
        let solver = solver(Some("key"));
        let identity = RequestIdentity::new("ip");
        let call = SolveCall {
            method: &Method::POST,
            identity: &identity,
            body: br#"{"question": ""}"#,
        };

        assert!(matches!(solver.solve(call).await, Err(Error::MissingQuestion)));
        assert!(matches!(solver.solve(call).await, Err(Error::MissingQuestion)));
        assert!(matches!(solver.solve(call).await, Err(Error::RateLimited)));
    }

    #[tokio::test]
    async fn test_handle_owned_runs_pipeline() {
        let solver = Arc::new(solver(None));
        let envelope = solver
            .handle_owned(
                Method::POST,
                RequestIdentity::new("ip"),
                br#"{"question": "Why?"}"#.to_vec(),
            )
            .await;

        assert_eq!(envelope.status, 500);
        assert!(envelope.body.contains("GEMINI_API_KEY not configured on server"));
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(b"").unwrap(), Value::Object(Map::new()));
        assert!(matches!(parse_body(b"[1,"), Err(Error::InvalidJson(_))));
    }
}
