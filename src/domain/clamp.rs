//! Bounding a fill by what the accounts actually hold.

use rust_decimal::Decimal;

use super::fill::FillPlan;
use super::money::Volume;

/// `amount` capped at `available`.
#[must_use]
pub fn clamp(amount: Volume, available: Volume) -> Volume {
    amount.min(available)
}

/// Shrink `plan` so neither leg spends more than its balance.
///
/// `base_available` and `quote_available` are the balances that fund the
/// plan: for [`ArbDirection::ChainBidOverVenueAsk`](super::detector::ArbDirection)
/// the chain's base and the venue's quote, the other way round for the
/// opposite direction. Whichever side binds tighter is clamped and the
/// other is re-derived from the plan's price. Both results are truncated
/// to whole native units.
#[must_use]
pub fn clamp_plan(plan: &FillPlan, base_available: Volume, quote_available: Volume) -> FillPlan {
    let Some(ratio) = plan.price() else {
        return plan.resized(Decimal::ZERO, Decimal::ZERO);
    };
    let base_cap = clamp(plan.base(), base_available.max(Decimal::ZERO));
    let quote_cap = clamp(plan.quote(), quote_available.max(Decimal::ZERO));

    let quote_cap_in_base = quote_cap.checked_div(ratio).unwrap_or(Decimal::ZERO);
    let (base, quote) = if quote_cap_in_base < base_cap {
        let quote = quote_cap.trunc();
        let base = quote.checked_div(ratio).unwrap_or(Decimal::ZERO).trunc();
        (base, quote)
    } else {
        let base = base_cap.trunc();
        let quote = base.checked_mul(ratio).unwrap_or(Decimal::ZERO).trunc();
        (base, quote)
    };

    plan.resized(base.min(base_cap), quote.min(quote_cap))
}
