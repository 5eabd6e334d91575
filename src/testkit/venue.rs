//! Scripted venue.
//!
//! Holds balances and instrument minimums in memory and records every
//! order it receives. Orders can be made to fail or to stall.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::error::{Error, ExecutionError};
use crate::exchange::{InstrumentMinimums, MarketOrder, OrderReceipt, VenueTrader};

#[derive(Debug, Default)]
pub struct MockVenue {
    balances: Mutex<HashMap<String, Decimal>>,
    minimums: Mutex<HashMap<String, InstrumentMinimums>>,
    orders: Mutex<Vec<MarketOrder>>,
    balance_latency: Mutex<Option<Duration>>,
    order_latency: Mutex<Option<Duration>>,
    reject_orders: AtomicBool,
    fail_balances: AtomicBool,
    next_id: AtomicU64,
}

impl MockVenue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a human-unit balance for `symbol`.
    pub fn with_balance(self, symbol: &str, amount: Decimal) -> Self {
        self.set_balance(symbol, amount);
        self
    }

    pub fn with_minimums(self, symbol: &str, minimums: InstrumentMinimums) -> Self {
        self.minimums.lock().insert(symbol.to_string(), minimums);
        self
    }

    pub fn set_balance(&self, symbol: &str, amount: Decimal) {
        self.balances.lock().insert(symbol.to_string(), amount);
    }

    /// Reject every subsequent order.
    pub fn reject_orders(&self, reject: bool) {
        self.reject_orders.store(reject, Ordering::SeqCst);
    }

    pub fn fail_balances(&self, fail: bool) {
        self.fail_balances.store(fail, Ordering::SeqCst);
    }

    /// Delay every balance request by `latency`.
    pub fn set_balance_latency(&self, latency: Duration) {
        *self.balance_latency.lock() = Some(latency);
    }

    /// Delay every order by `latency`.
    pub fn set_order_latency(&self, latency: Duration) {
        *self.order_latency.lock() = Some(latency);
    }

    /// Orders received so far, including rejected ones.
    pub fn orders(&self) -> Vec<MarketOrder> {
        self.orders.lock().clone()
    }
}

#[async_trait]
impl VenueTrader for MockVenue {
    async fn place_market_order(&self, order: &MarketOrder) -> Result<OrderReceipt, Error> {
        let latency = *self.order_latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.orders.lock().push(order.clone());

        if self.reject_orders.load(Ordering::SeqCst) {
            return Err(ExecutionError::OrderRejected("insufficient liquidity".into()).into());
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(OrderReceipt {
            order_id: format!("venue-{id}").into(),
        })
    }

    async fn balances(&self) -> Result<HashMap<String, Decimal>, Error> {
        let latency = *self.balance_latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.fail_balances.load(Ordering::SeqCst) {
            return Err(ExecutionError::RequestFailed("wallet balance unavailable".into()).into());
        }
        Ok(self.balances.lock().clone())
    }

    async fn instrument_minimums(&self, symbol: &str) -> Result<InstrumentMinimums, Error> {
        Ok(self.minimums.lock().get(symbol).cloned().unwrap_or_default())
    }

    fn venue_name(&self) -> &'static str {
        "mock"
    }
}
