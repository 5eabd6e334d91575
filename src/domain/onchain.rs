//! Resting orders on the on-chain limit order book.
//!
//! The orderbook contract reports one record per resting order. Ticks are
//! the contract's price index (see [`crate::domain::reconcile::tick_to_price`]).
//! Bid quantities are denominated in the quote asset and ask quantities in
//! the base asset, both in native units.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::PoolId;
use super::money::Volume;

/// Direction of an on-chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderDirection {
    Bid,
    Ask,
}

impl OrderDirection {
    /// Parse the contract's direction tag.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownDirection`] for any tag other than
    /// `bid` or `ask`.
    pub fn parse(tag: &str) -> Result<Self, DomainError> {
        match tag {
            "bid" => Ok(OrderDirection::Bid),
            "ask" => Ok(OrderDirection::Ask),
            other => Err(DomainError::UnknownDirection {
                tag: other.to_string(),
            }),
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderDirection::Bid => "bid",
            OrderDirection::Ask => "ask",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resting order as reported by the orderbook contract.
///
/// The direction is kept as the raw tag; [`OnChainOrder::direction`]
/// validates it where it matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnChainOrder {
    pub tick_id: i64,
    pub order_id: i64,
    pub order_direction: String,
    pub owner: String,
    /// Remaining quantity in native units.
    pub quantity: Volume,
    #[serde(default)]
    pub etas: Option<String>,
    #[serde(default)]
    pub claim_bounty: Option<String>,
    #[serde(default)]
    pub placed_quantity: Option<Volume>,
    #[serde(default)]
    pub placed_at: Option<String>,
}

impl OnChainOrder {
    /// Convenience constructor for an order with the given identity.
    pub fn new(
        tick_id: i64,
        order_id: i64,
        direction: OrderDirection,
        owner: impl Into<String>,
        quantity: Volume,
    ) -> Self {
        Self {
            tick_id,
            order_id,
            order_direction: direction.as_str().to_string(),
            owner: owner.into(),
            quantity,
            etas: None,
            claim_bounty: None,
            placed_quantity: Some(quantity),
            placed_at: None,
        }
    }

    /// The validated order direction.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownDirection`] for an unrecognized tag.
    pub fn direction(&self) -> Result<OrderDirection, DomainError> {
        OrderDirection::parse(&self.order_direction)
    }
}

/// Point-in-time view of the resting orders of one pool.
///
/// Rebuilt wholesale whenever the pool's ticks are refreshed. Bids are kept
/// sorted by tick descending and asks by tick ascending; within a tick the
/// earlier order id comes first.
#[derive(Debug, Clone)]
pub struct OnChainBookView {
    pool_id: PoolId,
    height: u64,
    bids: Vec<OnChainOrder>,
    asks: Vec<OnChainOrder>,
}

impl OnChainBookView {
    /// Partition and sort `orders`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownDirection`] if any order carries an
    /// unrecognized direction tag.
    pub fn from_orders(
        pool_id: PoolId,
        height: u64,
        orders: impl IntoIterator<Item = OnChainOrder>,
    ) -> Result<Self, DomainError> {
        let mut bids = Vec::new();
        let mut asks = Vec::new();
        for order in orders {
            match order.direction()? {
                OrderDirection::Bid => bids.push(order),
                OrderDirection::Ask => asks.push(order),
            }
        }
        bids.sort_by(|a, b| b.tick_id.cmp(&a.tick_id).then(a.order_id.cmp(&b.order_id)));
        asks.sort_by(|a, b| a.tick_id.cmp(&b.tick_id).then(a.order_id.cmp(&b.order_id)));
        Ok(Self {
            pool_id,
            height,
            bids,
            asks,
        })
    }

    #[must_use]
    pub const fn pool_id(&self) -> PoolId {
        self.pool_id
    }

    /// Block height the snapshot was taken at.
    #[must_use]
    pub const fn height(&self) -> u64 {
        self.height
    }

    /// Bids, highest tick first.
    #[must_use]
    pub fn bids_descending(&self) -> &[OnChainOrder] {
        &self.bids
    }

    /// Asks, lowest tick first.
    #[must_use]
    pub fn asks_ascending(&self) -> &[OnChainOrder] {
        &self.asks
    }

    #[must_use]
    pub fn best_bid(&self) -> Option<&OnChainOrder> {
        self.bids.first()
    }

    #[must_use]
    pub fn best_ask(&self) -> Option<&OnChainOrder> {
        self.asks.first()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bids.len() + self.asks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn decodes_contract_record() {
        let json = r#"{
            "tick_id": -1500000,
            "order_id": 12,
            "order_direction": "ask",
            "owner": "osmo1owner",
            "quantity": "250000",
            "etas": "0",
            "claim_bounty": null,
            "placed_quantity": "300000",
            "placed_at": "1718000000000"
        }"#;
        let order: OnChainOrder = serde_json::from_str(json).unwrap();

        assert_eq!(order.tick_id, -1_500_000);
        assert_eq!(order.quantity, dec!(250000));
        assert_eq!(order.placed_quantity, Some(dec!(300000)));
        assert_eq!(order.direction().unwrap(), OrderDirection::Ask);
    }

    #[test]
    fn unknown_direction_is_rejected() {
        let mut order = OnChainOrder::new(1, 1, OrderDirection::Bid, "o", dec!(1));
        order.order_direction = "sideways".into();
        assert!(matches!(
            OnChainBookView::from_orders(PoolId::new(1), 1, vec![order]),
            Err(DomainError::UnknownDirection { .. })
        ));
    }

    #[test]
    fn view_sorts_by_tick_then_order_id() {
        let orders = vec![
            OnChainOrder::new(100, 3, OrderDirection::Bid, "a", dec!(1)),
            OnChainOrder::new(200, 4, OrderDirection::Bid, "b", dec!(1)),
            OnChainOrder::new(200, 2, OrderDirection::Bid, "c", dec!(1)),
            OnChainOrder::new(500, 5, OrderDirection::Ask, "d", dec!(1)),
            OnChainOrder::new(300, 6, OrderDirection::Ask, "e", dec!(1)),
        ];
        let view = OnChainBookView::from_orders(PoolId::new(7), 42, orders).unwrap();

        let bid_ids: Vec<i64> = view.bids_descending().iter().map(|o| o.order_id).collect();
        assert_eq!(bid_ids, vec![2, 4, 3]);
        let ask_ticks: Vec<i64> = view.asks_ascending().iter().map(|o| o.tick_id).collect();
        assert_eq!(ask_ticks, vec![300, 500]);
        assert_eq!(view.height(), 42);
        assert_eq!(view.len(), 5);
    }
}
