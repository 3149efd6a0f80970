// src/error.rs
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    #[error("CDI fetch failed: {message}")]
    Fetch {
        status: Option<u16>,
        message: String,
    },

    #[error("Unexpected CDI payload: {0}")]
    Format(String),

    #[error("Invalid input: {0}")]
    Validation(String),
}

impl CalcError {
    pub fn fetch(message: impl Into<String>) -> Self {
        CalcError::Fetch {
            status: None,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CalcError::Validation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, CalcError>;
