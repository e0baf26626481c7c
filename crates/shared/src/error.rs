use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    Internal,
}

/// Wire-level error body returned by the REST backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Failure of one gateway operation. Load failures are recovered locally by
/// the controller; mutation failures are surfaced and left retryable.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway target not configured; call set_base_url first")]
    Unconfigured,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("http {status}: {detail}")]
    Http { status: u16, detail: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("failed to decode response payload: {0}")]
    Decode(String),
    #[error("{}: {}", .0.code_label(), .0.message)]
    Api(ApiError),
}

impl ApiError {
    fn code_label(&self) -> &'static str {
        match self.code {
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::Forbidden => "forbidden",
            ErrorCode::NotFound => "not_found",
            ErrorCode::Validation => "validation",
            ErrorCode::Internal => "internal",
        }
    }
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        match self {
            GatewayError::Http { status, .. } => *status == 404,
            GatewayError::Api(err) => err.code == ErrorCode::NotFound,
            _ => false,
        }
    }
}
