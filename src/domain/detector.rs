//! Cross-venue arbitrage detection.
//!
//! An opportunity exists when one side of one venue crosses the opposite
//! side of the other by at least the configured deviation:
//!
//! ```text
//! deviation_bps = (1 - ask / bid) * 10_000
//! ```
//!
//! Both prices are compared in venue (human) convention, so on-chain tick
//! prices are unscaled first.

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::book::OrderBook;
use super::error::DomainError;
use super::money::Price;
use super::onchain::OnChainBookView;
use super::reconcile::{tick_to_price, PriceReconciler};

const BPS: Decimal = dec!(10000);

/// Which way the books cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArbDirection {
    /// Resting on-chain bids above the venue's best ask: buy on the venue,
    /// sell into the on-chain bids.
    ChainBidOverVenueAsk,
    /// Venue bids above the resting on-chain asks: buy the on-chain asks,
    /// sell on the venue.
    VenueBidOverChainAsk,
}

impl fmt::Display for ArbDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArbDirection::ChainBidOverVenueAsk => write!(f, "chain-bid-over-venue-ask"),
            ArbDirection::VenueBidOverChainAsk => write!(f, "venue-bid-over-chain-ask"),
        }
    }
}

/// A detected crossing of the two books at their best levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opportunity {
    direction: ArbDirection,
    bid: Price,
    ask: Price,
    deviation_bps: Decimal,
}

impl Opportunity {
    #[must_use]
    pub const fn direction(&self) -> ArbDirection {
        self.direction
    }

    /// Best bid of the buying side, in venue convention.
    #[must_use]
    pub const fn bid(&self) -> Price {
        self.bid
    }

    /// Best ask of the selling side, in venue convention.
    #[must_use]
    pub const fn ask(&self) -> Price {
        self.ask
    }

    #[must_use]
    pub const fn deviation_bps(&self) -> Decimal {
        self.deviation_bps
    }
}

/// Compares best levels of the venue and on-chain books.
#[derive(Debug, Clone, Copy)]
pub struct ArbitrageDetector {
    min_deviation_bps: Decimal,
}

impl ArbitrageDetector {
    #[must_use]
    pub const fn new(min_deviation_bps: Decimal) -> Self {
        Self { min_deviation_bps }
    }

    #[must_use]
    pub const fn min_deviation_bps(&self) -> Decimal {
        self.min_deviation_bps
    }

    /// On-chain best bid (already unscaled) against the venue best ask.
    #[must_use]
    pub fn exists_arb_from_chain(
        &self,
        chain_bid: Option<Price>,
        venue_ask: Option<Price>,
    ) -> Option<Opportunity> {
        self.check(ArbDirection::ChainBidOverVenueAsk, chain_bid?, venue_ask?)
    }

    /// Venue best bid against the on-chain best ask (already unscaled).
    #[must_use]
    pub fn exists_arb_from_venue(
        &self,
        venue_bid: Option<Price>,
        chain_ask: Option<Price>,
    ) -> Option<Opportunity> {
        self.check(ArbDirection::VenueBidOverChainAsk, venue_bid?, chain_ask?)
    }

    /// Check both directions on the current books.
    ///
    /// `venue` must carry human prices; its sizes are not looked at.
    ///
    /// # Errors
    ///
    /// Fails only when an on-chain tick cannot be priced.
    pub fn detect(
        &self,
        venue: &OrderBook,
        chain: &OnChainBookView,
        reconciler: &PriceReconciler,
    ) -> Result<Option<Opportunity>, DomainError> {
        let chain_bid = chain
            .best_bid()
            .map(|order| reconciler.unscale(tick_to_price(order.tick_id)?))
            .transpose()?;
        let venue_ask = venue.best_ask().map(|level| level.price());
        if let Some(opportunity) = self.exists_arb_from_chain(chain_bid, venue_ask) {
            return Ok(Some(opportunity));
        }

        let chain_ask = chain
            .best_ask()
            .map(|order| reconciler.unscale(tick_to_price(order.tick_id)?))
            .transpose()?;
        let venue_bid = venue.best_bid().map(|level| level.price());
        Ok(self.exists_arb_from_venue(venue_bid, chain_ask))
    }

    fn check(&self, direction: ArbDirection, bid: Price, ask: Price) -> Option<Opportunity> {
        if bid <= Decimal::ZERO || bid <= ask {
            return None;
        }
        let deviation_bps = (Decimal::ONE - ask.checked_div(bid)?).checked_mul(BPS)?;
        (deviation_bps >= self.min_deviation_bps).then_some(Opportunity {
            direction,
            bid,
            ask,
            deviation_bps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> ArbitrageDetector {
        ArbitrageDetector::new(dec!(60))
    }

    #[test]
    fn chain_bid_above_venue_ask_is_detected() {
        let opp = detector()
            .exists_arb_from_chain(Some(dec!(61000)), Some(dec!(60500)))
            .unwrap();
        assert_eq!(opp.direction(), ArbDirection::ChainBidOverVenueAsk);
        assert!(opp.deviation_bps() > dec!(81) && opp.deviation_bps() < dec!(82));
    }

    #[test]
    fn deviation_below_floor_is_ignored() {
        let strict = ArbitrageDetector::new(dec!(100));
        assert!(strict
            .exists_arb_from_chain(Some(dec!(61000)), Some(dec!(60500)))
            .is_none());
    }

    #[test]
    fn missing_side_means_no_arb() {
        assert!(detector().exists_arb_from_chain(None, Some(dec!(1))).is_none());
        assert!(detector().exists_arb_from_venue(Some(dec!(1)), None).is_none());
    }

    #[test]
    fn uncrossed_books_are_ignored() {
        assert!(detector()
            .exists_arb_from_venue(Some(dec!(59000)), Some(dec!(60000)))
            .is_none());
    }

    #[test]
    fn venue_bid_above_chain_ask_is_detected() {
        let opp = detector()
            .exists_arb_from_venue(Some(dec!(61000)), Some(dec!(60000)))
            .unwrap();
        assert_eq!(opp.direction(), ArbDirection::VenueBidOverChainAsk);
        assert_eq!(opp.bid(), dec!(61000));
        assert_eq!(opp.ask(), dec!(60000));
    }

    #[test]
    fn exact_floor_counts() {
        let opp = detector().exists_arb_from_chain(Some(dec!(10000)), Some(dec!(9940)));
        assert_eq!(opp.unwrap().deviation_bps(), dec!(60));
    }
}
