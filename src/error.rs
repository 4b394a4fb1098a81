//! Error types for Daily Readings.

use std::time::Duration;

/// Top-level error type for a pipeline run or service startup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Reflection error: {0}")]
    Reflection(#[from] ReflectionError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Recipient store errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
}

/// Retrieval of the raw readings document failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("Request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Unexpected content type from {url}: {content_type}")]
    ContentType { url: String, content_type: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// The readings document lacked a mandatory section.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Gospel section not found in readings for {date}")]
    MissingGospel { date: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Generative reflection could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum ReflectionError {
    #[error("Reflection request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Reflection model returned empty content")]
    EmptyResponse,

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// A single recipient's send failed.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP send failed: {0}")]
    Smtp(String),

    #[error("Delivery task aborted: {0}")]
    Aborted(String),
}

/// Result type alias for Daily Readings.
pub type Result<T> = std::result::Result<T, Error>;
