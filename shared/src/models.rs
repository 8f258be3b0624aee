//! Response payloads.

use serde::{Deserialize, Serialize};

/// Successful solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveResponse {
    pub answer: String,
}

/// Failure body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<&crate::Error> for ErrorBody {
    fn from(err: &crate::Error) -> Self {
        Self {
            error: err.to_string(),
            detail: err.detail(),
        }
    }
}
