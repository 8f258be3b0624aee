//! Solve Lambda - Handles the /solve endpoint.
//!
//! This Lambda accepts a physics problem and topic, enforces a per-client quota,
//! forwards a tutoring prompt to the Gemini API and returns the flattened answer.

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use shared::{ApiKeySource, Config, RequestIdentity, Solver};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across requests.
struct AppState {
    solver: Arc<Solver>,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env();

        let secret = match &config.api_key_secret_arn {
            Some(arn) => {
                let aws_config =
                    aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
                let secrets_client = aws_sdk_secretsmanager::Client::new(&aws_config);
                Some((secrets_client, arn.clone()))
            }
            None => None,
        };

        info!(
            endpoint = %config.endpoint(),
            window_ms = config.rate_limit_window_ms,
            max_requests = config.max_requests_per_window,
            "Solve Lambda initialised"
        );

        Ok(Self {
            solver: Arc::new(Solver::from_config(config, ApiKeySource::environment(secret))),
        })
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let identity = RequestIdentity::from_headers(event.headers());

    info!("Solve request: {} from {}", event.method(), identity);

    let envelope = Arc::clone(&state.solver)
        .handle_owned(event.method().clone(), identity, event.body().to_vec())
        .await;

    envelope.into_response()
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
