//! Sizing a fill by walking both books.
//!
//! The walk pairs the venue's levels with the resting on-chain orders on
//! the opposite side, best prices first, and accumulates matched size
//! until the books stop crossing or either side runs out. Everything is
//! measured in native units and chain-convention prices:
//!
//! - venue asks carry base-native sizes, venue bids quote-native sizes
//!   (see [`crate::domain::book::OrderBook::restate_bids_in_quote`]);
//! - on-chain bids carry quote-native quantities, asks base-native ones.
//!
//! Each level is converted to base so the two sides can be compared, and
//! the matched amount is priced at the venue's level price.

use rust_decimal::Decimal;

use super::book::PriceLevel;
use super::claim::PendingClaim;
use super::detector::ArbDirection;
use super::error::DomainError;
use super::money::Volume;
use super::onchain::{OnChainOrder, OrderDirection};
use super::reconcile::{tick_to_price, PriceReconciler};

/// An on-chain order touched by the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateClaim {
    claim: PendingClaim,
    /// Base already accumulated when this order was first reached.
    touched_at: Volume,
}

impl CandidateClaim {
    #[must_use]
    pub const fn claim(&self) -> PendingClaim {
        self.claim
    }

    #[must_use]
    pub const fn touched_at(&self) -> Volume {
        self.touched_at
    }
}

/// One matched segment of the walk, priced at a single on-chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FillStep {
    base_before: Volume,
    chain_quote_before: Volume,
    chain_price: Decimal,
}

/// Matched size for one cycle, in native units.
///
/// For [`ArbDirection::ChainBidOverVenueAsk`] `quote` is what the venue buy
/// costs and `base` is what gets sold on chain. For
/// [`ArbDirection::VenueBidOverChainAsk`] `base` is sold on the venue for
/// `quote`, and `chain_quote` buys the same base back from the matched
/// on-chain asks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillPlan {
    direction: ArbDirection,
    base: Volume,
    quote: Volume,
    chain_quote: Volume,
    steps: Vec<FillStep>,
    claims: Vec<CandidateClaim>,
}

impl FillPlan {
    #[must_use]
    pub const fn empty(direction: ArbDirection) -> Self {
        Self {
            direction,
            base: Decimal::ZERO,
            quote: Decimal::ZERO,
            chain_quote: Decimal::ZERO,
            steps: Vec::new(),
            claims: Vec::new(),
        }
    }

    #[must_use]
    pub const fn direction(&self) -> ArbDirection {
        self.direction
    }

    #[must_use]
    pub const fn base(&self) -> Volume {
        self.base
    }

    #[must_use]
    pub const fn quote(&self) -> Volume {
        self.quote
    }

    /// `base` priced at the matched on-chain orders, in quote-native units.
    #[must_use]
    pub const fn chain_quote(&self) -> Volume {
        self.chain_quote
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.base <= Decimal::ZERO || self.quote <= Decimal::ZERO
    }

    /// Average chain-convention price of the plan (quote per base).
    #[must_use]
    pub fn price(&self) -> Option<Decimal> {
        if self.is_empty() {
            return None;
        }
        self.quote.checked_div(self.base)
    }

    #[must_use]
    pub fn candidate_claims(&self) -> &[CandidateClaim] {
        &self.claims
    }

    /// Claims for every on-chain order this plan reaches.
    pub fn claims(&self) -> impl Iterator<Item = PendingClaim> + '_ {
        self.claims.iter().map(CandidateClaim::claim)
    }

    /// The same plan cut down to `base`/`quote`. Orders the smaller fill no
    /// longer reaches are dropped from the claim list and `chain_quote` is
    /// re-priced along the walk, truncated to whole native units.
    #[must_use]
    pub fn resized(&self, base: Volume, quote: Volume) -> Self {
        let steps: Vec<FillStep> = self
            .steps
            .iter()
            .filter(|s| s.base_before < base)
            .copied()
            .collect();
        let chain_quote = steps.last().map_or(Decimal::ZERO, |s| {
            (s.chain_quote_before + (base - s.base_before) * s.chain_price).trunc()
        });
        Self {
            direction: self.direction,
            base,
            quote,
            chain_quote,
            steps,
            claims: self
                .claims
                .iter()
                .filter(|c| c.touched_at < base)
                .copied()
                .collect(),
        }
    }

    fn record(&mut self, matched: Volume, chain_price: Decimal) -> Result<(), DomainError> {
        self.steps.push(FillStep {
            base_before: self.base,
            chain_quote_before: self.chain_quote,
            chain_price,
        });
        self.base += matched;
        self.chain_quote += mul(matched, chain_price)?;
        Ok(())
    }

    fn touch(&mut self, order: &OnChainOrder) {
        self.claims.push(CandidateClaim {
            claim: PendingClaim::new(order.tick_id, order.order_id),
            touched_at: self.base,
        });
    }
}

fn overflow() -> DomainError {
    DomainError::PrecisionOverflow {
        operation: "sizing fill",
    }
}

fn mul(a: Decimal, b: Decimal) -> Result<Decimal, DomainError> {
    a.checked_mul(b).ok_or_else(overflow)
}

fn div(a: Decimal, b: Decimal) -> Result<Decimal, DomainError> {
    a.checked_div(b).ok_or_else(overflow)
}

fn expect_direction(order: &OnChainOrder, expected: OrderDirection) -> Result<(), DomainError> {
    let found = order.direction()?;
    if found == expected {
        return Ok(());
    }
    Err(DomainError::UnexpectedDirection {
        expected: expected.as_str(),
        found: found.as_str().to_string(),
        tick_id: order.tick_id,
        order_id: order.order_id,
    })
}

fn size_at(levels: &[PriceLevel], index: usize) -> Volume {
    levels.get(index).map_or(Decimal::ZERO, PriceLevel::size)
}

fn quantity_at(orders: &[OnChainOrder], index: usize) -> Volume {
    orders.get(index).map_or(Decimal::ZERO, |o| o.quantity)
}

/// Walks venue depth against on-chain depth for one pair.
#[derive(Debug, Clone, Copy)]
pub struct FillSizer {
    reconciler: PriceReconciler,
}

impl FillSizer {
    #[must_use]
    pub const fn new(reconciler: PriceReconciler) -> Self {
        Self { reconciler }
    }

    /// Size the fill for `direction`.
    ///
    /// `venue` is the venue side being hit: asks (ascending) for
    /// [`ArbDirection::ChainBidOverVenueAsk`], bids (descending) for
    /// [`ArbDirection::VenueBidOverChainAsk`]. `chain` is the opposite
    /// on-chain side in priority order.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnexpectedDirection`] if `chain` holds orders
    /// from the wrong side, or a pricing error for an unpriceable tick.
    pub fn size(
        &self,
        direction: ArbDirection,
        venue: &[PriceLevel],
        chain: &[OnChainOrder],
    ) -> Result<FillPlan, DomainError> {
        match direction {
            ArbDirection::ChainBidOverVenueAsk => self.against_chain_bids(venue, chain),
            ArbDirection::VenueBidOverChainAsk => self.against_chain_asks(venue, chain),
        }
    }

    fn against_chain_bids(
        &self,
        venue_asks: &[PriceLevel],
        chain_bids: &[OnChainOrder],
    ) -> Result<FillPlan, DomainError> {
        let mut plan = FillPlan::empty(ArbDirection::ChainBidOverVenueAsk);
        let (mut vi, mut ci) = (0, 0);
        let mut venue_left = size_at(venue_asks, 0);
        let mut chain_left = quantity_at(chain_bids, 0);
        let mut touched = false;

        while vi < venue_asks.len() && ci < chain_bids.len() {
            let order = &chain_bids[ci];
            expect_direction(order, OrderDirection::Bid)?;
            let level = &venue_asks[vi];
            let chain_price = tick_to_price(order.tick_id)?;
            if self.reconciler.unscale(chain_price)? < level.price() {
                break;
            }
            if venue_left <= Decimal::ZERO {
                vi += 1;
                venue_left = size_at(venue_asks, vi);
                continue;
            }
            if chain_left <= Decimal::ZERO {
                ci += 1;
                chain_left = quantity_at(chain_bids, ci);
                touched = false;
                continue;
            }

            let venue_price = self.reconciler.scale(level.price())?;
            let chain_left_base = div(chain_left, chain_price)?;
            let matched = venue_left.min(chain_left_base);

            if !touched {
                plan.touch(order);
                touched = true;
            }
            plan.quote += mul(matched, venue_price)?;
            plan.record(matched, chain_price)?;

            venue_left -= matched;
            chain_left = if matched == chain_left_base {
                Decimal::ZERO
            } else {
                chain_left - mul(matched, chain_price)?
            };
        }

        Ok(plan)
    }

    fn against_chain_asks(
        &self,
        venue_bids: &[PriceLevel],
        chain_asks: &[OnChainOrder],
    ) -> Result<FillPlan, DomainError> {
        let mut plan = FillPlan::empty(ArbDirection::VenueBidOverChainAsk);
        let (mut vi, mut ci) = (0, 0);
        let mut venue_left = size_at(venue_bids, 0);
        let mut chain_left = quantity_at(chain_asks, 0);
        let mut touched = false;

        while vi < venue_bids.len() && ci < chain_asks.len() {
            let order = &chain_asks[ci];
            expect_direction(order, OrderDirection::Ask)?;
            let level = &venue_bids[vi];
            let chain_price = tick_to_price(order.tick_id)?;
            if level.price() < self.reconciler.unscale(chain_price)? {
                break;
            }
            if venue_left <= Decimal::ZERO {
                vi += 1;
                venue_left = size_at(venue_bids, vi);
                continue;
            }
            if chain_left <= Decimal::ZERO {
                ci += 1;
                chain_left = quantity_at(chain_asks, ci);
                touched = false;
                continue;
            }

            let venue_price = self.reconciler.scale(level.price())?;
            let venue_left_base = div(venue_left, venue_price)?;
            let matched = venue_left_base.min(chain_left);

            if !touched {
                plan.touch(order);
                touched = true;
            }
            let proceeds = mul(matched, venue_price)?;
            plan.quote += proceeds;
            plan.record(matched, chain_price)?;

            chain_left -= matched;
            venue_left = if matched == venue_left_base {
                Decimal::ZERO
            } else {
                venue_left - proceeds
            };
        }

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reconcile::price_to_tick;
    use rust_decimal_macros::dec;

    // BTC (8 decimals) against USDC (6 decimals)
    fn sizer() -> FillSizer {
        FillSizer::new(PriceReconciler::new(8, 6))
    }

    fn tick(human: Decimal) -> i64 {
        let chain = PriceReconciler::new(8, 6).scale(human).unwrap();
        price_to_tick(chain).unwrap()
    }

    fn bid(tick_id: i64, order_id: i64, quote_native: Decimal) -> OnChainOrder {
        OnChainOrder::new(tick_id, order_id, OrderDirection::Bid, "maker", quote_native)
    }

    fn ask(tick_id: i64, order_id: i64, base_native: Decimal) -> OnChainOrder {
        OnChainOrder::new(tick_id, order_id, OrderDirection::Ask, "maker", base_native)
    }

    #[test]
    fn chain_bids_limited_by_venue_depth() {
        // venue sells 0.01 BTC at 60500; chain bids 1000 USDC at 61000
        let venue = [PriceLevel::new(dec!(60500), dec!(1000000))];
        let chain = [bid(tick(dec!(61000)), 1, dec!(1000000000))];

        let plan = sizer()
            .size(ArbDirection::ChainBidOverVenueAsk, &venue, &chain)
            .unwrap();

        assert_eq!(plan.base(), dec!(1000000));
        assert_eq!(plan.quote(), dec!(605000000));
        assert_eq!(plan.claims().collect::<Vec<_>>(), vec![PendingClaim::new(tick(dec!(61000)), 1)]);
    }

    #[test]
    fn chain_bids_limited_by_chain_depth() {
        // chain bids only 122 USDC at 61000 = 0.002 BTC
        let venue = [PriceLevel::new(dec!(60500), dec!(1000000))];
        let chain = [bid(tick(dec!(61000)), 1, dec!(122000000))];

        let plan = sizer()
            .size(ArbDirection::ChainBidOverVenueAsk, &venue, &chain)
            .unwrap();

        assert_eq!(plan.base(), dec!(200000));
        assert_eq!(plan.quote(), dec!(121000000));
    }

    #[test]
    fn walk_stops_when_books_uncross() {
        let venue = [
            PriceLevel::new(dec!(60500), dec!(100000)),
            PriceLevel::new(dec!(61500), dec!(100000)),
        ];
        let chain = [bid(tick(dec!(61000)), 1, dec!(1000000000))];

        let plan = sizer()
            .size(ArbDirection::ChainBidOverVenueAsk, &venue, &chain)
            .unwrap();

        assert_eq!(plan.base(), dec!(100000));
    }

    #[test]
    fn each_touched_order_is_claimed_once() {
        let venue = [
            PriceLevel::new(dec!(60000), dec!(100000)),
            PriceLevel::new(dec!(60100), dec!(100000)),
            PriceLevel::new(dec!(60200), dec!(100000)),
        ];
        let chain = [
            bid(tick(dec!(61000)), 1, dec!(91500000)),
            bid(tick(dec!(60900)), 2, dec!(500000000)),
        ];

        let plan = sizer()
            .size(ArbDirection::ChainBidOverVenueAsk, &venue, &chain)
            .unwrap();

        let ids: Vec<i64> = plan.claims().map(|c| c.order_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(plan.base(), dec!(300000));
        assert_eq!(plan.candidate_claims()[1].touched_at(), dec!(150000));
    }

    #[test]
    fn venue_bid_fill_stops_at_smaller_side() {
        // chain asks 0.5 BTC at 60000; venue bids 1000 USDC at 60000
        let venue = [PriceLevel::new(dec!(60000), dec!(1000000000))];
        let chain = [ask(tick(dec!(60000)), 9, dec!(50000000))];

        let plan = sizer()
            .size(ArbDirection::VenueBidOverChainAsk, &venue, &chain)
            .unwrap();

        assert_eq!(plan.base().trunc(), dec!(1666666));
        assert!(plan.base() < dec!(50000000));
        assert_eq!(plan.claims().collect::<Vec<_>>(), vec![PendingClaim::new(tick(dec!(60000)), 9)]);
    }

    #[test]
    fn venue_bid_fill_consumes_chain_ask() {
        // chain asks 0.001 BTC at 60000; venue bids 6100 USDC at 61000
        let venue = [PriceLevel::new(dec!(61000), dec!(6100000000))];
        let chain = [ask(tick(dec!(60000)), 3, dec!(100000))];

        let plan = sizer()
            .size(ArbDirection::VenueBidOverChainAsk, &venue, &chain)
            .unwrap();

        assert_eq!(plan.base(), dec!(100000));
        assert_eq!(plan.quote(), dec!(61000000));
        assert_eq!(plan.chain_quote(), dec!(60000000));
    }

    #[test]
    fn resize_reprices_chain_cost_along_the_walk() {
        let venue = [PriceLevel::new(dec!(61000), dec!(6100000000))];
        let chain = [
            ask(tick(dec!(60000)), 3, dec!(100000)),
            ask(tick(dec!(60300)), 4, dec!(100000)),
        ];
        let plan = sizer()
            .size(ArbDirection::VenueBidOverChainAsk, &venue, &chain)
            .unwrap();
        assert_eq!(plan.chain_quote(), dec!(120300000));

        let partial = plan.resized(dec!(150000), dec!(91500000));
        assert_eq!(partial.chain_quote(), dec!(90150000));
        assert_eq!(partial.claims().count(), 2);

        let first_only = plan.resized(dec!(100000), dec!(61000000));
        assert_eq!(first_only.chain_quote(), dec!(60000000));
        assert_eq!(first_only.claims().count(), 1);
    }

    #[test]
    fn wrong_side_is_an_invariant_violation() {
        let venue = [PriceLevel::new(dec!(60000), dec!(1))];
        let chain = [ask(tick(dec!(61000)), 1, dec!(1))];

        let err = sizer()
            .size(ArbDirection::ChainBidOverVenueAsk, &venue, &chain)
            .unwrap_err();
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn empty_books_give_empty_plan() {
        let plan = sizer()
            .size(ArbDirection::ChainBidOverVenueAsk, &[], &[])
            .unwrap();
        assert!(plan.is_empty());
        assert!(plan.price().is_none());
    }

    #[test]
    fn resize_drops_unreached_claims() {
        let venue = [
            PriceLevel::new(dec!(60000), dec!(100000)),
            PriceLevel::new(dec!(60100), dec!(100000)),
        ];
        let chain = [
            bid(tick(dec!(61000)), 1, dec!(61000000)),
            bid(tick(dec!(60900)), 2, dec!(500000000)),
        ];
        let plan = sizer()
            .size(ArbDirection::ChainBidOverVenueAsk, &venue, &chain)
            .unwrap();
        assert_eq!(plan.claims().count(), 2);

        let smaller = plan.resized(dec!(100000), dec!(6000000000));
        assert_eq!(smaller.claims().count(), 1);
    }
}
