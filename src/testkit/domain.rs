//! Builders for domain primitives used across tests.

use rust_decimal::Decimal;

use crate::domain::reconcile::price_to_tick;
use crate::domain::{
    BookUpdate, OnChainOrder, OrderDirection, PriceLevel, PriceReconciler, UpdateKind,
};

/// Tick id of a human BTC/USDC price (8 and 6 decimals).
pub fn btc_usdc_tick(human: Decimal) -> i64 {
    let chain = PriceReconciler::new(8, 6)
        .scale(human)
        .expect("price is representable");
    price_to_tick(chain).expect("price is within the tick range")
}

/// A resting bid of `quote_native` at `tick_id`.
pub fn chain_bid(tick_id: i64, order_id: i64, quote_native: Decimal) -> OnChainOrder {
    OnChainOrder::new(tick_id, order_id, OrderDirection::Bid, "osmo1maker", quote_native)
}

/// A resting ask of `base_native` at `tick_id`.
pub fn chain_ask(tick_id: i64, order_id: i64, base_native: Decimal) -> OnChainOrder {
    OnChainOrder::new(tick_id, order_id, OrderDirection::Ask, "osmo1maker", base_native)
}

fn levels(levels: &[(Decimal, Decimal)]) -> Vec<PriceLevel> {
    levels
        .iter()
        .map(|&(price, size)| PriceLevel::new(price, size))
        .collect()
}

/// A venue snapshot with human prices and sizes.
pub fn venue_snapshot(
    symbol: &str,
    bids: &[(Decimal, Decimal)],
    asks: &[(Decimal, Decimal)],
) -> BookUpdate {
    BookUpdate {
        symbol: symbol.to_string(),
        kind: UpdateKind::Snapshot,
        bids: levels(bids),
        asks: levels(asks),
    }
}
