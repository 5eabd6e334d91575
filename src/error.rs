use thiserror::Error;

use crate::domain::error::DomainError;
use crate::domain::PoolId;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("unknown asset symbol '{symbol}'")]
    UnknownAsset { symbol: String },

    #[error("asset '{symbol}' is configured more than once")]
    DuplicateAsset { symbol: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Errors raised while talking to the venue or the chain.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: &'static str, secs: u64 },

    #[error("order rejected: {0}")]
    OrderRejected(String),

    #[error("failed to submit order: {0}")]
    SubmissionFailed(String),

    #[error("swap simulation failed: {0}")]
    SimulationFailed(String),

    #[error("transaction failed with code {code}: {log}")]
    TransactionFailed { code: u32, log: String },

    #[error("request failed: {0}")]
    RequestFailed(String),
}

/// How a failure should be treated by the per-pair cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Network or RPC failure. The pair is retried on the next block.
    Transient,
    /// Inputs are not there yet (book not populated, orders not loaded).
    DataUnavailable,
    /// A programming error. The responsible component must stop.
    InvalidState,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("order book for {symbol} is not populated")]
    BookUnavailable { symbol: String },

    #[error("on-chain orders for pool {pool_id} are not loaded")]
    SnapshotUnavailable { pool_id: PoolId },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Classify this error for the coordinator's abort-or-halt decision.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::Config(_) => ErrorClass::InvalidState,
            Error::Domain(e) if e.is_invariant_violation() => ErrorClass::InvalidState,
            Error::Domain(_) => ErrorClass::DataUnavailable,
            Error::BookUnavailable { .. } | Error::SnapshotUnavailable { .. } => {
                ErrorClass::DataUnavailable
            }
            Error::Execution(_) | Error::Json(_) => ErrorClass::Transient,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_direction_is_invalid_state() {
        let err = Error::from(DomainError::UnknownDirection {
            tag: "sideways".into(),
        });
        assert_eq!(err.class(), ErrorClass::InvalidState);
    }

    #[test]
    fn missing_book_is_data_unavailable() {
        let err = Error::BookUnavailable {
            symbol: "BTCUSDC".into(),
        };
        assert_eq!(err.class(), ErrorClass::DataUnavailable);
    }

    #[test]
    fn timeout_is_transient() {
        let err = Error::from(ExecutionError::Timeout {
            operation: "balances",
            secs: 10,
        });
        assert_eq!(err.class(), ErrorClass::Transient);
        assert_eq!(err.to_string(), "balances timed out after 10s");
    }

    #[test]
    fn malformed_stream_frame_is_transient() {
        let err = crate::adapter::bybit::OrderbookMessage::parse("not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        assert_eq!(err.class(), ErrorClass::Transient);
    }
}
