use thiserror::Error;

use crate::domain::{MarketId, TokenId};

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Venue-level failures while placing or cancelling a single order.
///
/// Execution clients translate these into a [`PlacementOutcome`](crate::domain::PlacementOutcome)
/// before the coordinator sees them, so a failing leg never aborts its sibling.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("invalid token ID '{token_id}': {reason}")]
    InvalidTokenId { token_id: String, reason: String },

    #[error("order rejected: {0}")]
    OrderRejected(String),

    #[error("failed to build order: {0}")]
    OrderBuildFailed(String),

    #[error("failed to sign order: {0}")]
    SigningFailed(String),

    #[error("failed to submit order: {0}")]
    SubmissionFailed(String),

    #[error("failed to cancel order {order_id}: {reason}")]
    CancelFailed { order_id: String, reason: String },
}

/// Reasons the execution guard refuses a trigger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    /// An execution for this market is already in flight.
    #[error("execution already in flight for market {market_id}")]
    Conflict { market_id: MarketId },

    /// The market has unresolved exposure and is closed to new executions.
    #[error("market {market_id} halted: {reason}")]
    Halted { market_id: MarketId, reason: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Guard(#[from] GuardError),

    /// One leg filled, the other did not, and flattening the filled leg failed.
    #[error("unresolved exposure in market {market_id} on token {token_id}: {reason}")]
    AsymmetricExposure {
        market_id: MarketId,
        token_id: TokenId,
        reason: String,
    },

    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[cfg(feature = "polymarket")]
    #[error("Polymarket SDK error: {0}")]
    Polymarket(#[from] polymarket_client_sdk::error::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::WebSocket(Box::new(err))
    }
}
