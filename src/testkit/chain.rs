//! Scripted chain.
//!
//! Serves pools, resting orders, decimals and prices from memory, answers
//! simulations with a fixed response, and records every transaction.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{OnChainOrder, PoolId, Price};
use crate::error::{Error, ExecutionError};
use crate::exchange::{
    CanonicalBook, ChainExecutor, ChainQuery, Coin, SwapRequest, SwapSimulation, TxReceipt,
};

#[derive(Debug, Default)]
struct ChainState {
    books: HashMap<(String, String), CanonicalBook>,
    ticks: HashMap<PoolId, Vec<i64>>,
    orders: HashMap<(String, i64), Vec<OnChainOrder>>,
    failing_ticks: HashSet<i64>,
    decimals: HashMap<String, u32>,
    prices: HashMap<(String, String), Price>,
    balances: HashMap<String, Vec<Coin>>,
    simulation: Option<SwapSimulation>,
    swap_code: u32,
}

#[derive(Debug, Default)]
pub struct MockChain {
    state: Mutex<ChainState>,
    tick_queries: Mutex<Vec<PoolId>>,
    simulations: Mutex<Vec<Coin>>,
    swaps: Mutex<Vec<SwapRequest>>,
    contract_calls: Mutex<Vec<(String, Vec<u8>)>>,
    fail_active_ticks: AtomicBool,
    fail_swaps: AtomicBool,
    next_tx: AtomicU64,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the orderbook pool for `base`/`quote`.
    pub fn add_pool(&self, base: &str, quote: &str, pool_id: PoolId, contract: &str) {
        self.state.lock().books.insert(
            (base.to_string(), quote.to_string()),
            CanonicalBook {
                pool_id,
                contract_address: contract.to_string(),
            },
        );
    }

    /// Replace every resting order of a pool. Active ticks follow the
    /// orders given.
    pub fn set_orders(&self, pool_id: PoolId, contract: &str, orders: Vec<OnChainOrder>) {
        let mut state = self.state.lock();
        state.orders.retain(|(c, _), _| c != contract);
        let mut ticks = Vec::new();
        for order in orders {
            if !ticks.contains(&order.tick_id) {
                ticks.push(order.tick_id);
            }
            state
                .orders
                .entry((contract.to_string(), order.tick_id))
                .or_default()
                .push(order);
        }
        state.ticks.insert(pool_id, ticks);
    }

    /// Make resting-order queries for `tick_id` fail.
    pub fn fail_tick(&self, tick_id: i64) {
        self.state.lock().failing_ticks.insert(tick_id);
    }

    pub fn fail_active_ticks(&self, fail: bool) {
        self.fail_active_ticks.store(fail, Ordering::SeqCst);
    }

    pub fn set_decimals(&self, denom: &str, decimals: u32) {
        self.state.lock().decimals.insert(denom.to_string(), decimals);
    }

    pub fn set_price(&self, base: &str, quote: &str, price: Price) {
        self.state
            .lock()
            .prices
            .insert((base.to_string(), quote.to_string()), price);
    }

    pub fn set_balance(&self, address: &str, coin: Coin) {
        let mut state = self.state.lock();
        let coins = state.balances.entry(address.to_string()).or_default();
        coins.retain(|c| c.denom != coin.denom);
        coins.push(coin);
    }

    pub fn set_simulation(&self, simulation: SwapSimulation) {
        self.state.lock().simulation = Some(simulation);
    }

    /// Result code the next swaps are reported with.
    pub fn set_swap_code(&self, code: u32) {
        self.state.lock().swap_code = code;
    }

    /// Refuse to broadcast swaps.
    pub fn fail_swaps(&self, fail: bool) {
        self.fail_swaps.store(fail, Ordering::SeqCst);
    }

    /// Pools whose active ticks were queried, in call order.
    pub fn tick_queries(&self) -> Vec<PoolId> {
        self.tick_queries.lock().clone()
    }

    pub fn simulations(&self) -> Vec<Coin> {
        self.simulations.lock().clone()
    }

    pub fn swaps(&self) -> Vec<SwapRequest> {
        self.swaps.lock().clone()
    }

    /// Contract executions as (contract, message) pairs.
    pub fn contract_calls(&self) -> Vec<(String, Vec<u8>)> {
        self.contract_calls.lock().clone()
    }

    fn tx_hash(&self, prefix: &str) -> String {
        let n = self.next_tx.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{prefix}{n:04}")
    }
}

fn request_failed(reason: String) -> Error {
    ExecutionError::RequestFailed(reason).into()
}

#[async_trait]
impl ChainQuery for MockChain {
    async fn resting_orders(&self, contract: &str, tick_id: i64) -> Result<Vec<OnChainOrder>, Error> {
        let state = self.state.lock();
        if state.failing_ticks.contains(&tick_id) {
            return Err(request_failed(format!("tick {tick_id} query failed")));
        }
        Ok(state
            .orders
            .get(&(contract.to_string(), tick_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn active_ticks(&self, pool_id: PoolId) -> Result<Vec<i64>, Error> {
        self.tick_queries.lock().push(pool_id);
        if self.fail_active_ticks.load(Ordering::SeqCst) {
            return Err(request_failed(format!("pool {pool_id} unreachable")));
        }
        Ok(self
            .state
            .lock()
            .ticks
            .get(&pool_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn canonical_book(&self, base_denom: &str, quote_denom: &str) -> Result<CanonicalBook, Error> {
        self.state
            .lock()
            .books
            .get(&(base_denom.to_string(), quote_denom.to_string()))
            .cloned()
            .ok_or_else(|| request_failed(format!("no orderbook for {base_denom}/{quote_denom}")))
    }

    async fn asset_decimals(&self, denom: &str) -> Result<u32, Error> {
        self.state
            .lock()
            .decimals
            .get(denom)
            .copied()
            .ok_or_else(|| request_failed(format!("unknown denom {denom}")))
    }

    async fn price(&self, base_denom: &str, quote_denom: &str) -> Result<Price, Error> {
        self.state
            .lock()
            .prices
            .get(&(base_denom.to_string(), quote_denom.to_string()))
            .copied()
            .ok_or_else(|| request_failed(format!("no price for {base_denom}/{quote_denom}")))
    }
}

#[async_trait]
impl ChainExecutor for MockChain {
    async fn simulate_swap(&self, coin_in: &Coin, denom_out: &str) -> Result<SwapSimulation, Error> {
        self.simulations.lock().push(coin_in.clone());
        self.state.lock().simulation.clone().ok_or_else(|| {
            ExecutionError::SimulationFailed(format!("no route to {denom_out}")).into()
        })
    }

    async fn execute_swap(&self, swap: &SwapRequest) -> Result<TxReceipt, Error> {
        self.swaps.lock().push(swap.clone());
        if self.fail_swaps.load(Ordering::SeqCst) {
            return Err(ExecutionError::SubmissionFailed("node unavailable".into()).into());
        }
        let code = self.state.lock().swap_code;
        Ok(TxReceipt {
            tx_hash: self.tx_hash("SWAP"),
            code,
            raw_log: if code == 0 {
                String::new()
            } else {
                "slippage exceeded".into()
            },
        })
    }

    async fn execute_contract(&self, contract: &str, msg: Vec<u8>) -> Result<TxReceipt, Error> {
        self.contract_calls.lock().push((contract.to_string(), msg));
        Ok(TxReceipt {
            tx_hash: self.tx_hash("CLAIM"),
            code: 0,
            raw_log: String::new(),
        })
    }

    async fn account_balances(&self, address: &str) -> Result<Vec<Coin>, Error> {
        Ok(self
            .state
            .lock()
            .balances
            .get(address)
            .cloned()
            .unwrap_or_default())
    }
}
