//! Per-pair arbitrage cycle.
//!
//! Each block, every pair runs one cycle:
//!
//! ```text
//! cooldown check → balances → detect → size → clamp → minimum
//!   → simulate → profitability → dual-leg execution → claim → cooldown
//! ```
//!
//! Economic rejections end the cycle with a [`SkipReason`]. Transient and
//! data-unavailable errors abort only this pair's cycle. An invalid-state
//! error panics.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info, warn};

use crate::app::call::with_timeout;
use crate::app::config::Config;
use crate::app::execution::{execute_dual_leg, DualLegStatus, LegOutcome};
use crate::app::feed::BookStore;
use crate::app::profit::{PriceSheet, ProfitModel};
use crate::app::state::{ClaimLedger, CooldownTable};
use crate::app::ticks::SnapshotStore;
use crate::domain::claim::batch_claim_msg;
use crate::domain::clamp::clamp_plan;
use crate::domain::money::{to_human, to_native};
use crate::domain::{
    ArbDirection, ArbitrageDetector, FillPlan, FillSizer, MinimumFillPolicy, Price,
    PriceReconciler, TradingPair, Volume,
};
use crate::error::{Error, ErrorClass, Result};
use crate::exchange::{
    CanonicalBook, ChainExecutor, ChainQuery, Coin, MarketOrder, OrderSide, SwapRequest,
    VenueTrader,
};

/// The external services a cycle talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub venue: Arc<dyn VenueTrader>,
    pub chain_query: Arc<dyn ChainQuery>,
    pub chain_exec: Arc<dyn ChainExecutor>,
}

/// Stores shared by every pair.
#[derive(Clone, Default)]
pub struct SharedStores {
    pub books: Arc<BookStore>,
    pub snapshots: Arc<SnapshotStore>,
    pub cooldowns: Arc<CooldownTable>,
}

/// Everything about a pair that is resolved once at startup.
#[derive(Debug, Clone)]
pub struct PairContext {
    pair: TradingPair,
    reconciler: PriceReconciler,
    book: CanonicalBook,
    /// Static minimum base fill, native units.
    min_base: Option<Volume>,
    /// Venue minimum order value, native quote units.
    min_quote: Option<Volume>,
    base_precision: Option<u32>,
    quote_precision: Option<u32>,
}

impl PairContext {
    /// Resolve decimals, the canonical on-chain book and venue minimums.
    pub async fn resolve(
        pair: TradingPair,
        collaborators: &Collaborators,
        timeout: Duration,
    ) -> Result<Self> {
        let chain = &collaborators.chain_query;
        let base_decimals = match pair.base().decimals() {
            Some(decimals) => decimals,
            None => {
                with_timeout(timeout, "asset decimals", chain.asset_decimals(pair.base().denom()))
                    .await?
            }
        };
        let quote_decimals = match pair.quote().decimals() {
            Some(decimals) => decimals,
            None => {
                with_timeout(timeout, "asset decimals", chain.asset_decimals(pair.quote().denom()))
                    .await?
            }
        };
        let book = with_timeout(
            timeout,
            "canonical book",
            chain.canonical_book(pair.base().denom(), pair.quote().denom()),
        )
        .await?;
        let minimums = with_timeout(
            timeout,
            "instrument minimums",
            collaborators
                .venue
                .instrument_minimums(&pair.venue_symbol()),
        )
        .await?;

        let min_base = pair
            .base()
            .min_fill()
            .or(minimums.min_base_qty)
            .map(|human| to_native(human, base_decimals))
            .transpose()?;
        let min_quote = minimums
            .min_quote_qty
            .map(|human| to_native(human, quote_decimals))
            .transpose()?;

        info!(
            pair = %pair,
            pool = %book.pool_id,
            contract = %book.contract_address,
            base_decimals,
            quote_decimals,
            "Pair registered"
        );

        Ok(Self {
            pair,
            reconciler: PriceReconciler::new(base_decimals, quote_decimals),
            book,
            min_base,
            min_quote,
            base_precision: minimums.base_precision,
            quote_precision: minimums.quote_precision,
        })
    }

    #[must_use]
    pub const fn book(&self) -> &CanonicalBook {
        &self.book
    }
}

/// Why a cycle ended without executing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoOpportunity,
    /// The books cross but no size could be matched.
    NoFill,
    /// Balances cannot fund any of the matched size.
    InsufficientBalance,
    /// `fill` and `minimum` are native units of the constrained asset.
    BelowMinimum { fill: Volume, minimum: Volume },
    Unprofitable {
        profit_value: Decimal,
        cost_value: Decimal,
    },
}

/// Result of submitting the accumulated claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimFlush {
    Nothing,
    Submitted { count: usize, tx_hash: String },
    Failed { count: usize, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub plan: FillPlan,
    pub venue_leg: LegOutcome,
    pub chain_leg: LegOutcome,
    pub status: DualLegStatus,
    pub claims: ClaimFlush,
    pub cooldown_until: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    CoolingDown { blocked_until: u64 },
    Skipped(SkipReason),
    Aborted { class: ErrorClass, reason: String },
    Executed(Box<ExecutionReport>),
}

/// Balances relevant to one pair, native units.
#[derive(Debug, Clone, Copy)]
struct Balances {
    venue_base: Volume,
    venue_quote: Volume,
    chain_base: Volume,
    chain_quote: Volume,
}

impl Balances {
    /// (base, quote) balances that fund `direction`.
    const fn funding(&self, direction: ArbDirection) -> (Volume, Volume) {
        match direction {
            ArbDirection::ChainBidOverVenueAsk => (self.chain_base, self.venue_quote),
            ArbDirection::VenueBidOverChainAsk => (self.venue_base, self.chain_quote),
        }
    }
}

/// Runs the arbitrage cycle for one pair.
pub struct ExecutionCoordinator {
    ctx: PairContext,
    key: String,
    account_address: String,
    usd_denom: String,
    fee_denom: String,
    cooldown_blocks: u64,
    timeout: Duration,
    detector: ArbitrageDetector,
    sizer: FillSizer,
    minimum: MinimumFillPolicy,
    profit: ProfitModel,
    stores: SharedStores,
    claims: ClaimLedger,
    collaborators: Collaborators,
}

impl ExecutionCoordinator {
    pub fn new(
        ctx: PairContext,
        config: &Config,
        stores: SharedStores,
        collaborators: Collaborators,
    ) -> Self {
        let arbitrage = &config.arbitrage;
        Self {
            key: ctx.pair.to_string(),
            sizer: FillSizer::new(ctx.reconciler),
            ctx,
            account_address: config.chain.account_address.clone(),
            usd_denom: config.chain.usd_denom.clone(),
            fee_denom: config.chain.fee_denom.clone(),
            cooldown_blocks: arbitrage.cooldown_blocks,
            timeout: arbitrage.call_timeout(),
            detector: ArbitrageDetector::new(arbitrage.min_deviation_bps),
            minimum: MinimumFillPolicy::new(arbitrage.min_fill_notional),
            profit: ProfitModel::new(arbitrage, &config.chain),
            stores,
            claims: ClaimLedger::new(),
            collaborators,
        }
    }

    #[must_use]
    pub const fn context(&self) -> &PairContext {
        &self.ctx
    }

    /// Display name of the pair, e.g. `BTC/USDC`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.key
    }

    /// Run one cycle at block `height`.
    ///
    /// # Panics
    ///
    /// Panics on an invalid-state error, such as an on-chain order on the
    /// wrong side of the book.
    pub async fn run_cycle(&self, height: u64) -> CycleOutcome {
        let outcome = match self.try_cycle(height).await {
            Ok(outcome) => outcome,
            Err(e) if e.class() == ErrorClass::InvalidState => {
                panic!("{}: invalid state at height {height}: {e}", self.key)
            }
            Err(e) => {
                warn!(pair = %self.key, height, error = %e, "Cycle aborted");
                CycleOutcome::Aborted {
                    class: e.class(),
                    reason: e.to_string(),
                }
            }
        };
        if !matches!(outcome, CycleOutcome::Executed(_)) {
            self.claims.discard();
        }
        outcome
    }

    async fn try_cycle(&self, height: u64) -> Result<CycleOutcome> {
        if let Some(blocked_until) = self.stores.cooldowns.blocked_until(&self.key, height) {
            debug!(pair = %self.key, height, blocked_until, "Cooling down");
            return Ok(CycleOutcome::CoolingDown { blocked_until });
        }

        let balances = self.fetch_balances().await?;

        let symbol = self.ctx.pair.venue_symbol();
        let book = self
            .stores
            .books
            .get(&symbol)
            .ok_or(Error::BookUnavailable { symbol })?;
        let pool_id = self.ctx.book.pool_id;
        let snapshot = self
            .stores
            .snapshots
            .get(pool_id)
            .ok_or(Error::SnapshotUnavailable { pool_id })?;

        let Some(opportunity) = self.detector.detect(&book, &snapshot, &self.ctx.reconciler)?
        else {
            return Ok(CycleOutcome::Skipped(SkipReason::NoOpportunity));
        };
        let direction = opportunity.direction();
        info!(
            pair = %self.key,
            direction = %direction,
            bid = %opportunity.bid(),
            ask = %opportunity.ask(),
            deviation_bps = %opportunity.deviation_bps().round_dp(2),
            "Arbitrage detected"
        );

        let native = book.restate_bids_in_quote()?.rescale(
            self.ctx.reconciler.base_decimals() as i32,
            self.ctx.reconciler.quote_decimals() as i32,
        )?;
        let plan = match direction {
            ArbDirection::ChainBidOverVenueAsk => {
                self.sizer
                    .size(direction, &native.asks_ascending(), snapshot.bids_descending())?
            }
            ArbDirection::VenueBidOverChainAsk => {
                self.sizer
                    .size(direction, &native.bids_descending(), snapshot.asks_ascending())?
            }
        };
        if plan.is_empty() {
            info!(pair = %self.key, "No matched size");
            return Ok(CycleOutcome::Skipped(SkipReason::NoFill));
        }
        debug!(pair = %self.key, base = %plan.base(), quote = %plan.quote(), "Fill sized");

        let (base_available, quote_available) = balances.funding(direction);
        let plan = clamp_plan(&plan, base_available, quote_available);
        self.claims.record(plan.claims());
        if plan.is_empty() {
            info!(
                pair = %self.key,
                base_available = %base_available,
                quote_available = %quote_available,
                "Insufficient balance"
            );
            return Ok(CycleOutcome::Skipped(SkipReason::InsufficientBalance));
        }

        let prices = self.fetch_prices().await?;
        let minimum = match self.ctx.min_base {
            Some(minimum) => minimum,
            None => self
                .minimum
                .from_notional(prices.base_usd, self.ctx.reconciler.base_decimals())?,
        };
        if !self.minimum.is_met(plan.base(), minimum) {
            info!(pair = %self.key, fill = %plan.base(), minimum = %minimum, "Fill below minimum");
            return Ok(CycleOutcome::Skipped(SkipReason::BelowMinimum {
                fill: plan.base(),
                minimum,
            }));
        }
        if let (ArbDirection::ChainBidOverVenueAsk, Some(min_quote)) = (direction, self.ctx.min_quote)
        {
            if !self.minimum.is_met(plan.quote(), min_quote) {
                info!(pair = %self.key, fill = %plan.quote(), minimum = %min_quote, "Venue order below minimum");
                return Ok(CycleOutcome::Skipped(SkipReason::BelowMinimum {
                    fill: plan.quote(),
                    minimum: min_quote,
                }));
            }
        }

        let (coin_in, denom_out) = self.swap_leg(&plan);
        let simulation = with_timeout(
            self.timeout,
            "swap simulation",
            self.collaborators.chain_exec.simulate_swap(&coin_in, &denom_out),
        )
        .await?;
        let profit = self
            .profit
            .assess(&plan, &simulation, &self.ctx.reconciler, &prices)?;
        if !profit.is_profitable() {
            info!(
                pair = %self.key,
                profit = %profit.profit_value,
                cost = %profit.cost_value(),
                "Not profitable after costs"
            );
            return Ok(CycleOutcome::Skipped(SkipReason::Unprofitable {
                profit_value: profit.profit_value,
                cost_value: profit.cost_value(),
            }));
        }

        let order = self.venue_order(&plan)?;
        let swap = SwapRequest {
            coin_in,
            denom_out,
            min_out: profit.min_out,
            gas_limit: profit.gas_limit,
        };
        info!(
            pair = %self.key,
            direction = %direction,
            base = %plan.base(),
            quote = %plan.quote(),
            expected_profit = %profit.profit_value,
            "Executing arbitrage"
        );
        let execution = execute_dual_leg(
            self.collaborators.venue.as_ref(),
            self.collaborators.chain_exec.as_ref(),
            &order,
            &swap,
            self.timeout,
        )
        .await;
        let status = execution.status();

        let claims = self.flush_claims().await;

        let cooldown_until = height + self.cooldown_blocks;
        self.stores.cooldowns.block_until(&self.key, cooldown_until);
        info!(pair = %self.key, cooldown_until, "Pair cooling down");

        Ok(CycleOutcome::Executed(Box::new(ExecutionReport {
            plan,
            venue_leg: execution.venue,
            chain_leg: execution.chain,
            status,
            claims,
            cooldown_until,
        })))
    }

    async fn fetch_balances(&self) -> Result<Balances> {
        let (venue, chain) = tokio::try_join!(
            with_timeout(self.timeout, "venue balances", self.collaborators.venue.balances()),
            with_timeout(
                self.timeout,
                "chain balances",
                self.collaborators
                    .chain_exec
                    .account_balances(&self.account_address)
            ),
        )?;

        let pair = &self.ctx.pair;
        let reconciler = &self.ctx.reconciler;
        let venue_amount = |symbol: &str, decimals: u32| {
            to_native(venue.get(symbol).copied().unwrap_or(Decimal::ZERO), decimals)
        };
        let chain_amount = |denom: &str| {
            chain
                .iter()
                .find(|coin| coin.denom == denom)
                .map_or(Decimal::ZERO, |coin| coin.amount)
        };

        Ok(Balances {
            venue_base: venue_amount(pair.base().symbol(), reconciler.base_decimals())?,
            venue_quote: venue_amount(pair.quote().symbol(), reconciler.quote_decimals())?,
            chain_base: chain_amount(pair.base().denom()),
            chain_quote: chain_amount(pair.quote().denom()),
        })
    }

    async fn fetch_prices(&self) -> Result<PriceSheet> {
        let pair = &self.ctx.pair;
        let (base_usd, quote_usd, fee_usd) = tokio::try_join!(
            self.usd_price(pair.base().denom()),
            self.usd_price(pair.quote().denom()),
            self.usd_price(&self.fee_denom),
        )?;
        Ok(PriceSheet {
            base_usd,
            quote_usd,
            fee_usd,
        })
    }

    async fn usd_price(&self, denom: &str) -> Result<Price> {
        if denom == self.usd_denom {
            return Ok(Decimal::ONE);
        }
        with_timeout(
            self.timeout,
            "price",
            self.collaborators.chain_query.price(denom, &self.usd_denom),
        )
        .await
    }

    /// Coin sent into the swap and the denomination it returns.
    fn swap_leg(&self, plan: &FillPlan) -> (Coin, String) {
        let base = self.ctx.pair.base().denom();
        let quote = self.ctx.pair.quote().denom();
        match plan.direction() {
            ArbDirection::ChainBidOverVenueAsk => (Coin::new(base, plan.base()), quote.to_string()),
            ArbDirection::VenueBidOverChainAsk => {
                (Coin::new(quote, plan.chain_quote()), base.to_string())
            }
        }
    }

    fn venue_order(&self, plan: &FillPlan) -> Result<MarketOrder> {
        let reconciler = &self.ctx.reconciler;
        let (side, quantity, precision) = match plan.direction() {
            ArbDirection::ChainBidOverVenueAsk => (
                OrderSide::Buy,
                to_human(plan.quote(), reconciler.quote_decimals())?,
                self.ctx.quote_precision,
            ),
            ArbDirection::VenueBidOverChainAsk => (
                OrderSide::Sell,
                to_human(plan.base(), reconciler.base_decimals())?,
                self.ctx.base_precision,
            ),
        };
        let quantity = precision.map_or(quantity, |dp| {
            quantity.round_dp_with_strategy(dp, RoundingStrategy::ToZero)
        });
        Ok(MarketOrder {
            symbol: self.ctx.pair.venue_symbol(),
            side,
            quantity,
        })
    }

    async fn flush_claims(&self) -> ClaimFlush {
        let claims = self.claims.drain();
        if claims.is_empty() {
            return ClaimFlush::Nothing;
        }
        let count = claims.len();
        let msg = match batch_claim_msg(&claims) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(pair = %self.key, error = %e, "Failed to encode claims");
                return ClaimFlush::Failed {
                    count,
                    error: e.to_string(),
                };
            }
        };

        let result = with_timeout(
            self.timeout,
            "batch claim",
            self.collaborators
                .chain_exec
                .execute_contract(&self.ctx.book.contract_address, msg),
        )
        .await;
        match result {
            Ok(receipt) if receipt.is_success() => {
                info!(pair = %self.key, count, tx = %receipt.tx_hash, "Claims submitted");
                ClaimFlush::Submitted {
                    count,
                    tx_hash: receipt.tx_hash,
                }
            }
            Ok(receipt) => {
                warn!(pair = %self.key, count, code = receipt.code, "Claim transaction failed");
                ClaimFlush::Failed {
                    count,
                    error: receipt.raw_log,
                }
            }
            Err(e) => {
                warn!(pair = %self.key, count, error = %e, "Claim submission failed");
                ClaimFlush::Failed {
                    count,
                    error: e.to_string(),
                }
            }
        }
    }
}
