//! Shared library for the PhyMaster solve Lambda.
//!
//! Holds the whole request pipeline so the Lambda binary stays a thin adapter
//! between API Gateway and [`Solver`].

pub mod config;
pub mod error;
pub mod extract;
pub mod gemini;
pub mod http;
pub mod models;
pub mod normalize;
pub mod prompt;
pub mod rate_limit;
pub mod secrets;
pub mod solver;

pub use config::Config;
pub use error::{Error, Result};
pub use extract::extract_answer;
pub use gemini::{GeminiClient, GenerationConfig};
pub use http::Envelope;
pub use models::{ErrorBody, SolveResponse};
pub use normalize::{normalize, NormalizedRequest};
pub use prompt::build_prompt;
pub use rate_limit::{Clock, ManualClock, RateLimiter, RateWindow, RequestIdentity, SystemClock};
pub use secrets::{get_secret, ApiKeySource};
pub use solver::{SolveCall, Solver};
