//! Error types for SmartMeal
//!
//! This module defines all error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Fallback message shown when the service gives no usable detail.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong";

/// Main error type for SmartMeal operations
///
/// Network failures, non-success statuses and undecodable responses all
/// collapse into [`SmartMealError::Service`]; callers only ever see one
/// human-readable message for anything that went wrong at the remote
/// boundary.
#[derive(Error, Debug)]
pub enum SmartMealError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any failure talking to the remote service
    ///
    /// The payload is the message meant for the user: the service's `detail`
    /// field when present, otherwise [`GENERIC_FAILURE_MESSAGE`].
    #[error("Service error: {0}")]
    Service(String),

    /// Session store errors (empty values, unreadable store file)
    #[error("Session error: {0}")]
    Session(String),

    /// Frame capture or encoding errors
    #[error("Capture error: {0}")]
    Capture(String),

    /// Interactive command errors
    #[error("Command error: {0}")]
    Command(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// Image decoding/encoding errors
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type alias for SmartMeal operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

/// Extract the message a view should show for a failed operation.
///
/// Service errors carry their user-facing text verbatim; anything else is
/// reported with the generic fallback so internal details never leak into
/// the inline error line.
///
/// # Examples
///
/// ```
/// use smartmeal::error::{user_message, SmartMealError};
///
/// let err: anyhow::Error = SmartMealError::Service("Username already taken".into()).into();
/// assert_eq!(user_message(&err), "Username already taken");
/// ```
pub fn user_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<SmartMealError>() {
        Some(SmartMealError::Service(message)) => message.clone(),
        _ => GENERIC_FAILURE_MESSAGE.to_string(),
    }
}
