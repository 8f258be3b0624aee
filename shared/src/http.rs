//! HTTP helpers for the solve Lambda.

use lambda_http::http::HeaderMap;
use lambda_http::{Body, Response};
use serde::Serialize;

use crate::models::{ErrorBody, SolveResponse};
use crate::rate_limit::RequestIdentity;
use crate::Result;

/// Headers consulted, in order, for the client address.
pub const CLIENT_IP_HEADERS: [&str; 2] = ["x-nf-client-connection-ip", "x-forwarded-for"];

const FALLBACK_BODY: &str = r#"{"error":"Internal error"}"#;

/// Status code and serialized JSON body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub status: u16,
    pub body: String,
}

impl Envelope {
    /// Serialize `data` with the given status.
    pub fn json<T: Serialize>(status: u16, data: &T) -> Self {
        let body = serde_json::to_string(data).unwrap_or_else(|_| FALLBACK_BODY.to_string());
        Self { status, body }
    }

    /// Build the Lambda response.
    pub fn into_response(self) -> std::result::Result<Response<Body>, lambda_http::Error> {
        Ok(Response::builder()
            .status(self.status)
            .header("content-type", "application/json")
            .body(Body::from(self.body))?)
    }
}

impl From<Result<String>> for Envelope {
    fn from(result: Result<String>) -> Self {
        match result {
            Ok(answer) => Envelope::json(200, &SolveResponse { answer }),
            Err(err) => Envelope::json(err.status_code(), &ErrorBody::from(&err)),
        }
    }
}

impl RequestIdentity {
    /// Derive the rate-limit identity from forwarding headers.
    ///
    /// Only the first (client-most) address of `x-forwarded-for` is used.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        CLIENT_IP_HEADERS
            .iter()
            .filter_map(|name| headers.get(*name))
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| value.split(',').next())
            .map(str::trim)
            .find(|ip| !ip.is_empty())
            .map(RequestIdentity::new)
            .unwrap_or_else(|| RequestIdentity::new("unknown"))
    }
}
