//! Monetary types for price and volume representation.
//!
//! Everything on the detection and sizing path is a [`Decimal`]. Venue
//! feeds hand us decimal strings, which are parsed losslessly at the edge.

use std::str::FromStr;

use rust_decimal::Decimal;

use super::error::DomainError;

/// Price represented as a Decimal for precision.
pub type Price = Decimal;

/// Volume represented as a Decimal for precision.
pub type Volume = Decimal;

/// Largest power of ten representable by `Decimal` in either direction.
const MAX_POW10: i32 = 28;

/// `10^exp`, or `None` when it is not representable.
#[must_use]
pub fn pow10(exp: i32) -> Option<Decimal> {
    if exp.unsigned_abs() > MAX_POW10 as u32 {
        return None;
    }
    if exp >= 0 {
        Decimal::try_from_i128_with_scale(10_i128.pow(exp as u32), 0).ok()
    } else {
        Decimal::try_from_i128_with_scale(1, exp.unsigned_abs()).ok()
    }
}

/// Multiply `value` by `10^exp`.
///
/// # Errors
///
/// Returns [`DomainError::PrecisionOverflow`] when the factor or the product
/// is not representable.
pub fn shift(value: Decimal, exp: i32) -> Result<Decimal, DomainError> {
    let overflow = DomainError::PrecisionOverflow {
        operation: "shifting decimal places",
    };
    if exp >= 0 {
        let factor = pow10(exp).ok_or(overflow.clone())?;
        value.checked_mul(factor).ok_or(overflow)
    } else {
        let divisor = pow10(-exp).ok_or(overflow.clone())?;
        value.checked_div(divisor).ok_or(overflow)
    }
}

/// Parse a decimal string as delivered by a feed or contract.
///
/// # Errors
///
/// Returns [`DomainError::InvalidDecimal`] for anything `Decimal` rejects.
pub fn parse_decimal(value: &str) -> Result<Decimal, DomainError> {
    Decimal::from_str(value.trim()).map_err(|_| DomainError::InvalidDecimal {
        value: value.to_string(),
    })
}

/// Convert a human amount to whole native units, rounding toward zero.
pub fn to_native(human: Decimal, decimals: u32) -> Result<Decimal, DomainError> {
    Ok(shift(human, decimals as i32)?.trunc())
}

/// Convert whole native units back to a human amount.
pub fn to_human(native: Decimal, decimals: u32) -> Result<Decimal, DomainError> {
    shift(native, -(decimals as i32))
}
