//! Minimum fill size.
//!
//! Fills below the venue's minimum order, or worth less than a small USD
//! notional when the venue publishes no minimum, are abandoned.

use rust_decimal::Decimal;

use super::error::DomainError;
use super::money::{shift, Price, Volume};

/// Decides whether a fill is large enough to execute.
#[derive(Debug, Clone, Copy)]
pub struct MinimumFillPolicy {
    min_notional: Decimal,
}

impl MinimumFillPolicy {
    /// `min_notional` is the USD value used when no static minimum exists.
    #[must_use]
    pub const fn new(min_notional: Decimal) -> Self {
        Self { min_notional }
    }

    /// Base-native amount worth `min_notional` at `usd_price` per whole base
    /// unit, rounded up.
    pub fn from_notional(&self, usd_price: Price, base_decimals: u32) -> Result<Volume, DomainError> {
        if usd_price <= Decimal::ZERO {
            return Err(DomainError::InvalidDecimal {
                value: usd_price.to_string(),
            });
        }
        let human = self
            .min_notional
            .checked_div(usd_price)
            .ok_or(DomainError::PrecisionOverflow {
                operation: "computing minimum fill",
            })?;
        Ok(shift(human, base_decimals as i32)?.ceil())
    }

    /// Whether `fill` reaches `minimum` (both base-native).
    #[must_use]
    pub fn is_met(&self, fill: Volume, minimum: Volume) -> bool {
        fill >= minimum
    }
}
