//! Collaborator trait definitions.
//!
//! The engine never talks to a venue or a node directly. These traits are
//! the whole surface it needs; adapters and the test kit implement them.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{OnChainOrder, OrderId, PoolId, Price, Volume};
use crate::error::Error;

/// Order side on the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    /// Buy order.
    Buy,
    /// Sell order.
    Sell,
}

/// A venue market order.
///
/// The quantity is in human units of the quote asset for a buy and of the
/// base asset for a sell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketOrder {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
}

/// Acknowledgement of an accepted venue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    pub order_id: OrderId,
}

/// Trading minimums the venue publishes for an instrument, in human units.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstrumentMinimums {
    pub min_base_qty: Option<Decimal>,
    pub min_quote_qty: Option<Decimal>,
    /// Decimal places the venue accepts for base quantities.
    pub base_precision: Option<u32>,
    /// Decimal places the venue accepts for quote quantities.
    pub quote_precision: Option<u32>,
}

/// An amount of one chain denomination, in native units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coin {
    pub denom: String,
    pub amount: Volume,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: Volume) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

/// Where a pair's orderbook lives on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalBook {
    pub pool_id: PoolId,
    pub contract_address: String,
}

/// Result of simulating a swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapSimulation {
    /// Native units of the output denomination.
    pub expected_out: Volume,
    /// Gas units the transaction is expected to use.
    pub gas_estimate: u64,
}

/// A swap to broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub coin_in: Coin,
    pub denom_out: String,
    /// Swap fails on chain if it would return less than this.
    pub min_out: Volume,
    pub gas_limit: u64,
}

/// Outcome of a broadcast transaction. A non-zero code means it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub code: u32,
    pub raw_log: String,
}

impl TxReceipt {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// Trading and account access on the centralized venue.
#[async_trait]
pub trait VenueTrader: Send + Sync {
    /// Place a market order.
    async fn place_market_order(&self, order: &MarketOrder) -> Result<OrderReceipt, Error>;

    /// Wallet balances in human units, keyed by asset symbol.
    async fn balances(&self) -> Result<HashMap<String, Decimal>, Error>;

    /// Published minimums for a symbol.
    async fn instrument_minimums(&self, symbol: &str) -> Result<InstrumentMinimums, Error>;

    /// Get the venue name for logging/debugging.
    fn venue_name(&self) -> &'static str;
}

/// Read-only chain queries.
#[async_trait]
pub trait ChainQuery: Send + Sync {
    /// Resting orders at one tick of an orderbook contract.
    async fn resting_orders(&self, contract: &str, tick_id: i64)
        -> Result<Vec<OnChainOrder>, Error>;

    /// Ticks of a pool that currently hold liquidity.
    async fn active_ticks(&self, pool_id: PoolId) -> Result<Vec<i64>, Error>;

    /// The orderbook pool trading `base_denom` against `quote_denom`.
    async fn canonical_book(&self, base_denom: &str, quote_denom: &str)
        -> Result<CanonicalBook, Error>;

    /// Decimal precision of a denomination.
    async fn asset_decimals(&self, denom: &str) -> Result<u32, Error>;

    /// Human price of one `base_denom` in `quote_denom`.
    async fn price(&self, base_denom: &str, quote_denom: &str) -> Result<Price, Error>;
}

/// Chain transactions signed by the engine's account.
#[async_trait]
pub trait ChainExecutor: Send + Sync {
    async fn simulate_swap(&self, coin_in: &Coin, denom_out: &str)
        -> Result<SwapSimulation, Error>;

    async fn execute_swap(&self, swap: &SwapRequest) -> Result<TxReceipt, Error>;

    /// Execute a contract with a raw JSON message.
    async fn execute_contract(&self, contract: &str, msg: Vec<u8>) -> Result<TxReceipt, Error>;

    /// Native balances held by `address`.
    async fn account_balances(&self, address: &str) -> Result<Vec<Coin>, Error>;
}
