// src/handlers/error.rs
use std::fmt;
use warp::http::StatusCode;
use warp::reject::Reject;

use crate::error::CalcError;

#[derive(Debug, Clone)]
pub struct ApiError {
    pub message: String,
    pub status: StatusCode,
}

impl ApiError {
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        ApiError {
            message: message.into(),
            status,
        }
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::BAD_REQUEST)
    }

    pub fn external_error(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::BAD_GATEWAY)
    }

    pub fn cache_error(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn rate_unavailable() -> Self {
        Self::new(
            "CDI rate unavailable, enter it manually",
            StatusCode::SERVICE_UNAVAILABLE,
        )
    }
}

impl From<CalcError> for ApiError {
    fn from(err: CalcError) -> Self {
        match err {
            CalcError::Validation(_) => ApiError::validation_error(err.to_string()),
            CalcError::Fetch { .. } | CalcError::Format(_) => ApiError::external_error(err.to_string()),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}
impl Reject for ApiError {}
