//! Domain validation errors for core domain types.
//!
//! These are returned by the pure arithmetic and book-walking code. None of
//! them halts the process on its own; the execution coordinator decides
//! whether an error aborts the cycle or signals a broken invariant (see
//! [`DomainError::is_invariant_violation`]).

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A decimal string from a feed or contract could not be parsed.
    #[error("invalid decimal '{value}'")]
    InvalidDecimal {
        /// The offending input.
        value: String,
    },

    /// A power of ten or product fell outside what `Decimal` can represent.
    #[error("precision overflow while {operation}")]
    PrecisionOverflow {
        /// What was being computed.
        operation: &'static str,
    },

    /// A tick index outside the supported price range.
    #[error("tick {tick} is outside the supported range")]
    TickOutOfRange {
        /// The rejected tick.
        tick: i64,
    },

    /// A price that cannot be mapped back onto a tick.
    #[error("price {price} cannot be expressed as a tick")]
    PriceOutOfRange {
        /// The rejected price.
        price: Decimal,
    },

    /// An order direction tag other than `bid` or `ask`.
    #[error("unknown order direction '{tag}'")]
    UnknownDirection {
        /// The raw tag.
        tag: String,
    },

    /// An order on the wrong side of the book was handed to the fill sizer.
    #[error("expected {expected} orders, found a {found} order (tick {tick_id}, order {order_id})")]
    UnexpectedDirection {
        /// Side the walk was sizing.
        expected: &'static str,
        /// Side found on the order.
        found: String,
        /// Tick of the offending order.
        tick_id: i64,
        /// Id of the offending order.
        order_id: i64,
    },
}

impl DomainError {
    /// Whether this error means the caller handed the domain layer data it
    /// must never produce. The coordinator halts on these.
    #[must_use]
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            DomainError::UnknownDirection { .. } | DomainError::UnexpectedDirection { .. }
        )
    }
}
