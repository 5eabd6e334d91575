//! Profitability of a sized, clamped fill.
//!
//! The chain leg is simulated first. Its output, less the slippage
//! allowance, is compared with what the plan commits of the same asset;
//! when the chain leg buys base back, the quote left over from the venue
//! sale counts too. The result has to pay for gas and the venue taker fee.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::app::config::{ArbitrageConfig, ChainConfig};
use crate::domain::money::to_human;
use crate::domain::{ArbDirection, DomainError, FillPlan, Price, PriceReconciler, Volume};
use crate::exchange::SwapSimulation;

const BPS: Decimal = dec!(10000);

/// USD prices of one whole unit of each asset involved in a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceSheet {
    pub base_usd: Price,
    pub quote_usd: Price,
    pub fee_usd: Price,
}

/// Outcome of [`ProfitModel::assess`]. Values are in USD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profitability {
    pub profit_value: Decimal,
    pub gas_value: Decimal,
    pub venue_fee_value: Decimal,
    /// Minimum swap output to request, in native units of the output asset.
    pub min_out: Volume,
    pub gas_limit: u64,
}

impl Profitability {
    #[must_use]
    pub fn cost_value(&self) -> Decimal {
        self.gas_value + self.venue_fee_value
    }

    #[must_use]
    pub fn is_profitable(&self) -> bool {
        self.profit_value >= self.cost_value()
    }
}

#[derive(Debug, Clone)]
pub struct ProfitModel {
    slippage_tolerance: Decimal,
    venue_taker_fee_bps: Decimal,
    gas_price: Decimal,
    gas_adjustment: Decimal,
    fee_decimals: u32,
}

impl ProfitModel {
    #[must_use]
    pub fn new(arbitrage: &ArbitrageConfig, chain: &ChainConfig) -> Self {
        Self {
            slippage_tolerance: arbitrage.slippage_tolerance,
            venue_taker_fee_bps: arbitrage.venue_taker_fee_bps,
            gas_price: chain.gas_price,
            gas_adjustment: chain.gas_adjustment,
            fee_decimals: chain.fee_decimals,
        }
    }

    /// Price the plan against the simulated swap.
    pub fn assess(
        &self,
        plan: &FillPlan,
        simulation: &SwapSimulation,
        reconciler: &PriceReconciler,
        prices: &PriceSheet,
    ) -> Result<Profitability, DomainError> {
        let overflow = || DomainError::PrecisionOverflow {
            operation: "assessing profitability",
        };

        let min_out = simulation
            .expected_out
            .checked_mul(Decimal::ONE - self.slippage_tolerance)
            .ok_or_else(overflow)?
            .trunc();

        let profit_value = match plan.direction() {
            ArbDirection::ChainBidOverVenueAsk => {
                to_human(min_out - plan.quote(), reconciler.quote_decimals())? * prices.quote_usd
            }
            // the swap buys back the sold base; the spread stays in quote
            ArbDirection::VenueBidOverChainAsk => {
                let spread =
                    to_human(plan.quote() - plan.chain_quote(), reconciler.quote_decimals())?;
                let base_drift = to_human(min_out - plan.base(), reconciler.base_decimals())?;
                spread * prices.quote_usd + base_drift * prices.base_usd
            }
        };

        let gas_limit = (Decimal::from(simulation.gas_estimate) * self.gas_adjustment)
            .ceil()
            .to_u64()
            .ok_or_else(overflow)?;
        let gas_fee = Decimal::from(gas_limit) * self.gas_price;
        let gas_value = to_human(gas_fee, self.fee_decimals)? * prices.fee_usd;

        let venue_notional = to_human(plan.quote(), reconciler.quote_decimals())? * prices.quote_usd;
        let venue_fee_value = venue_notional * self.venue_taker_fee_bps / BPS;

        Ok(Profitability {
            profit_value,
            gas_value,
            venue_fee_value,
            min_out,
            gas_limit,
        })
    }
}
