// src/error.rs

//! Error type shared by every stage of a watch run.
//!
//! Most stages swallow their errors into a degraded result (empty item
//! list, empty state, `DeliveryOutcome::Failed`), so an `AppError` only
//! escapes a run during startup.

use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[cfg(feature = "s3")]
    #[error("S3 request failed: {0}")]
    S3(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport failure or non-success status from any remote endpoint
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config file is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("bad URL: {0}")]
    Url(#[from] url::ParseError),

    /// A source's item or link selector does not parse
    #[error("invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Missing credentials or an unusable setting, found before any network call
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid value: {0}")]
    Validation(String),

    /// The state document could not be written (or decoded after reading)
    #[error("state store error: {0}")]
    Store(String),

    /// The chat endpoint rejected the digest
    #[error("notification rejected: {0}")]
    Notify(String),
}

impl AppError {
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    pub fn notify(message: impl Into<String>) -> Self {
        Self::Notify(message.into())
    }
}
