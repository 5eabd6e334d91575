//! Conversion between on-chain tick prices and venue prices.
//!
//! On-chain prices are quoted in native units (quote-native per
//! base-native). Venue prices are human-readable (quote per base). The two
//! differ by `10^(base_decimals - quote_decimals)`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::error::DomainError;
use super::money::{pow10, shift, Price};

/// Ticks spanned by one power of ten.
const TICKS_PER_DECADE: i64 = 9_000_000;

/// Exponent of the additive increment at price one.
const EXPONENT_AT_PRICE_ONE: i64 = -6;

/// Lowest tick whose price `Decimal` represents exactly (price `10^-12`).
pub const MIN_TICK: i64 = -108_000_000;

/// Highest tick whose price `Decimal` represents (price `10^27`).
pub const MAX_TICK: i64 = 243_000_000;

fn overflow() -> DomainError {
    DomainError::PrecisionOverflow {
        operation: "converting tick price",
    }
}

/// Price of a tick in chain convention.
///
/// Each decade of price is split into 9,000,000 equal additive steps, so
/// the price is `10^d + n · 10^e` where `d` is the decade, `n` the offset
/// within it and `e` the step exponent.
///
/// # Errors
///
/// Returns [`DomainError::TickOutOfRange`] outside `[MIN_TICK, MAX_TICK]`.
pub fn tick_to_price(tick: i64) -> Result<Price, DomainError> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(DomainError::TickOutOfRange { tick });
    }
    if tick == 0 {
        return Ok(Decimal::ONE);
    }

    let delta = tick / TICKS_PER_DECADE;
    let mut exponent = EXPONENT_AT_PRICE_ONE + delta;
    if tick < 0 {
        exponent -= 1;
    }
    let steps = tick - delta * TICKS_PER_DECADE;

    let decade = pow10(delta as i32).ok_or_else(overflow)?;
    let increment = pow10(exponent as i32).ok_or_else(overflow)?;
    Decimal::from(steps)
        .checked_mul(increment)
        .and_then(|offset| decade.checked_add(offset))
        .ok_or_else(overflow)
}

/// Highest tick whose price does not exceed `price`.
///
/// # Errors
///
/// Returns [`DomainError::PriceOutOfRange`] for non-positive prices or
/// prices beyond the supported tick range.
pub fn price_to_tick(price: Price) -> Result<i64, DomainError> {
    let out_of_range = || DomainError::PriceOutOfRange { price };
    if price <= Decimal::ZERO {
        return Err(out_of_range());
    }
    if price == Decimal::ONE {
        return Ok(0);
    }

    let (decade, exponent) = if price > Decimal::ONE {
        let mut k: i64 = 0;
        while pow10((k + 1) as i32).is_some_and(|next| next <= price) {
            k += 1;
        }
        (k, EXPONENT_AT_PRICE_ONE + k)
    } else {
        let mut k: i64 = 0;
        while pow10((k - 1) as i32).is_some_and(|next| next > price) {
            k -= 1;
        }
        (k, EXPONENT_AT_PRICE_ONE + k - 1)
    };

    let base = pow10(decade as i32).ok_or_else(out_of_range)?;
    let increment = pow10(exponent as i32).ok_or_else(out_of_range)?;
    let steps = (price - base)
        .checked_div(increment)
        .ok_or_else(out_of_range)?
        .floor();
    let steps = steps.to_i64().ok_or_else(out_of_range)?;

    let tick = decade * TICKS_PER_DECADE + steps;
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(out_of_range());
    }
    Ok(tick)
}

/// Converts prices between chain and venue conventions for one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceReconciler {
    base_decimals: u32,
    quote_decimals: u32,
}

impl PriceReconciler {
    #[must_use]
    pub const fn new(base_decimals: u32, quote_decimals: u32) -> Self {
        Self {
            base_decimals,
            quote_decimals,
        }
    }

    #[must_use]
    pub const fn base_decimals(&self) -> u32 {
        self.base_decimals
    }

    #[must_use]
    pub const fn quote_decimals(&self) -> u32 {
        self.quote_decimals
    }

    /// Chain-convention price to venue (human) price.
    pub fn unscale(&self, chain_price: Price) -> Result<Price, DomainError> {
        shift(chain_price, self.exponent())
    }

    /// Venue (human) price to chain-convention price.
    pub fn scale(&self, venue_price: Price) -> Result<Price, DomainError> {
        shift(venue_price, -self.exponent())
    }

    /// Human price of a tick.
    pub fn price_at_tick(&self, tick: i64) -> Result<Price, DomainError> {
        self.unscale(tick_to_price(tick)?)
    }

    fn exponent(&self) -> i32 {
        self.base_decimals as i32 - self.quote_decimals as i32
    }
}
