//! Error handling and custom error types
//!
//! Provides unified error handling across the crate using thiserror. Failures
//! inside an adapter invocation never surface here; they are folded into an
//! error-bearing [`LlmResponse`](crate::llm::LlmResponse) instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported mode: {0}")]
    UnsupportedMode(String),

    #[error("Gateway error {code}: {message}")]
    Gateway { code: String, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
