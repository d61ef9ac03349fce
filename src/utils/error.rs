// src/utils/error.rs
use actix_web::http::StatusCode;
use thiserror::Error;

/// Failure taxonomy for the aggregator. The first five variants map
/// one-to-one onto the RPC status table; the rest are internal faults
/// that surface as 500.
#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Authentication rejected by target: {0}")]
    Auth(String),

    #[error("Target unavailable: {0}")]
    Unavailable(String),

    #[error("Incompatible response from target: {0}")]
    Protocol(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Task error: {0}")]
    Task(String),

    #[error("Event error: {0}")]
    Event(String),
}

impl AggregatorError {
    /// HTTP status carried by the RPC envelope for this failure.
    /// `Unavailable` and `Protocol` stay distinct on purpose: the first
    /// tells the caller to retry later, the second to escalate.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AggregatorError::Validation(_) => StatusCode::BAD_REQUEST,
            AggregatorError::Conflict(_) => StatusCode::CONFLICT,
            AggregatorError::Auth(_) => StatusCode::UNAUTHORIZED,
            AggregatorError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AggregatorError::Protocol(_)
            | AggregatorError::Config(_)
            | AggregatorError::Storage(_)
            | AggregatorError::Crypto(_)
            | AggregatorError::Task(_)
            | AggregatorError::Event(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
