//! Venue order book types.
//!
//! - [`PriceLevel`] - A single price level with size
//! - [`OrderBook`] - Aggregated depth for one venue symbol
//!
//! # Order Book Structure
//!
//! Levels are keyed by price on each side. The feed mutates the book in
//! place while cycles read it concurrently, so every read hands back a
//! sorted copy taken under the lock:
//! - **Bids**: Buy orders, sorted by price descending (best bid first)
//! - **Asks**: Sell orders, sorted by price ascending (best ask first)
//!
//! # Examples
//!
//! ```
//! use cexarb::domain::book::{OrderBook, Side};
//! use rust_decimal_macros::dec;
//!
//! let book = OrderBook::new("BTCUSDC");
//! book.upsert(Side::Bid, dec!(60000), dec!(0.5));
//! book.upsert(Side::Bid, dec!(60010), dec!(0.1));
//! book.upsert(Side::Ask, dec!(60020), dec!(0.2));
//!
//! assert_eq!(book.best_bid().unwrap().price(), dec!(60010));
//! assert_eq!(book.best_ask().unwrap().price(), dec!(60020));
//! ```

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;

use super::error::DomainError;
use super::money::{pow10, Price, Volume};

/// Side of a venue order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => write!(f, "bid"),
            Side::Ask => write!(f, "ask"),
        }
    }
}

/// A single price level in an order book.
///
/// Represents aggregated orders at a specific price point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceLevel {
    /// The price at this level.
    price: Price,
    /// Total volume available at this price.
    size: Volume,
}

impl PriceLevel {
    /// Creates a new price level.
    #[must_use]
    pub const fn new(price: Price, size: Volume) -> Self {
        Self { price, size }
    }

    /// Returns the price at this level.
    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }

    /// Returns the total volume available at this level.
    #[must_use]
    pub const fn size(&self) -> Volume {
        self.size
    }
}

/// Whether a feed message carries the full book or changes to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    Snapshot,
    Delta,
}

/// A decoded venue book message. A zero size in a delta deletes the level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookUpdate {
    pub symbol: String,
    pub kind: UpdateKind,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
}

#[derive(Debug, Clone, Default)]
struct Levels {
    bids: HashMap<Price, Volume>,
    asks: HashMap<Price, Volume>,
}

impl Levels {
    fn side(&self, side: Side) -> &HashMap<Price, Volume> {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut HashMap<Price, Volume> {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }
}

/// Aggregated venue depth for one symbol.
///
/// Sizes are whatever units the owner put in: human base units as
/// delivered by the feed, or the converted views produced by
/// [`OrderBook::restate_bids_in_quote`] and [`OrderBook::rescale`].
/// A price is present on at most one side; writing a level removes the
/// same price from the opposite side.
#[derive(Debug)]
pub struct OrderBook {
    symbol: String,
    levels: Mutex<Levels>,
}

impl OrderBook {
    /// Creates a new empty order book.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            levels: Mutex::new(Levels::default()),
        }
    }

    /// Creates a book from full snapshot levels. Zero-size levels are skipped.
    pub fn with_levels(
        symbol: impl Into<String>,
        bids: impl IntoIterator<Item = PriceLevel>,
        asks: impl IntoIterator<Item = PriceLevel>,
    ) -> Self {
        let book = Self::new(symbol);
        book.replace(bids, asks);
        book
    }

    /// Returns the venue symbol for this book.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Set the size at `price`. A zero size deletes the level.
    pub fn upsert(&self, side: Side, price: Price, size: Volume) {
        let mut levels = self.levels.lock();
        if size.is_zero() {
            levels.side_mut(side).remove(&price);
            return;
        }
        levels.side_mut(side.opposite()).remove(&price);
        levels.side_mut(side).insert(price, size);
    }

    /// Delete the level at `price`. Absent keys are a no-op.
    pub fn remove(&self, side: Side, price: Price) {
        self.levels.lock().side_mut(side).remove(&price);
    }

    /// Replace both sides atomically with full snapshot levels.
    pub fn replace(
        &self,
        bids: impl IntoIterator<Item = PriceLevel>,
        asks: impl IntoIterator<Item = PriceLevel>,
    ) {
        let mut fresh = Levels::default();
        for level in bids.into_iter().filter(|l| !l.size.is_zero()) {
            fresh.bids.insert(level.price, level.size);
        }
        for level in asks.into_iter().filter(|l| !l.size.is_zero()) {
            if !fresh.bids.contains_key(&level.price) {
                fresh.asks.insert(level.price, level.size);
            }
        }
        *self.levels.lock() = fresh;
    }

    /// Bid levels sorted by price descending.
    #[must_use]
    pub fn bids_descending(&self) -> Vec<PriceLevel> {
        let mut levels = self.copy_side(Side::Bid);
        levels.sort_by(|a, b| b.price.cmp(&a.price));
        levels
    }

    /// Ask levels sorted by price ascending.
    #[must_use]
    pub fn asks_ascending(&self) -> Vec<PriceLevel> {
        let mut levels = self.copy_side(Side::Ask);
        levels.sort_by(|a, b| a.price.cmp(&b.price));
        levels
    }

    /// Returns the best bid (highest buy price).
    #[must_use]
    pub fn best_bid(&self) -> Option<PriceLevel> {
        let levels = self.levels.lock();
        levels
            .bids
            .iter()
            .max_by(|a, b| a.0.cmp(b.0))
            .map(|(p, s)| PriceLevel::new(*p, *s))
    }

    /// Returns the best ask (lowest sell price).
    #[must_use]
    pub fn best_ask(&self) -> Option<PriceLevel> {
        let levels = self.levels.lock();
        levels
            .asks
            .iter()
            .min_by(|a, b| a.0.cmp(b.0))
            .map(|(p, s)| PriceLevel::new(*p, *s))
    }

    /// Number of levels on `side`.
    #[must_use]
    pub fn depth(&self, side: Side) -> usize {
        self.levels.lock().side(side).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        let levels = self.levels.lock();
        levels.bids.is_empty() && levels.asks.is_empty()
    }

    /// Deep copy with ask sizes multiplied by `10^base_exp` and bid sizes by
    /// `10^quote_exp`. Prices are untouched.
    ///
    /// Bids are scaled by the quote exponent because callers restate bids in
    /// quote units first (see [`OrderBook::restate_bids_in_quote`]).
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::PrecisionOverflow`] when a factor or product
    /// is not representable.
    pub fn rescale(&self, base_exp: i32, quote_exp: i32) -> Result<OrderBook, DomainError> {
        let overflow = || DomainError::PrecisionOverflow {
            operation: "rescaling book sizes",
        };
        let base_factor = pow10(base_exp).ok_or_else(overflow)?;
        let quote_factor = pow10(quote_exp).ok_or_else(overflow)?;
        self.map_sizes(
            |_, size| size.checked_mul(quote_factor).ok_or_else(overflow),
            |_, size| size.checked_mul(base_factor).ok_or_else(overflow),
        )
    }

    /// Deep copy with every bid size replaced by `size × price`, so bids
    /// state how much quote the buyer is offering. Asks are untouched.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::PrecisionOverflow`] if a product overflows.
    pub fn restate_bids_in_quote(&self) -> Result<OrderBook, DomainError> {
        self.map_sizes(
            |price, size| {
                size.checked_mul(price).ok_or(DomainError::PrecisionOverflow {
                    operation: "restating bids in quote",
                })
            },
            |_, size| Ok(size),
        )
    }

    fn map_sizes<B, A>(&self, bid: B, ask: A) -> Result<OrderBook, DomainError>
    where
        B: Fn(Price, Volume) -> Result<Volume, DomainError>,
        A: Fn(Price, Volume) -> Result<Volume, DomainError>,
    {
        let snapshot = self.levels.lock().clone();
        let mut mapped = Levels::default();
        for (price, size) in snapshot.bids {
            mapped.bids.insert(price, bid(price, size)?);
        }
        for (price, size) in snapshot.asks {
            mapped.asks.insert(price, ask(price, size)?);
        }
        Ok(OrderBook {
            symbol: self.symbol.clone(),
            levels: Mutex::new(mapped),
        })
    }

    fn copy_side(&self, side: Side) -> Vec<PriceLevel> {
        let levels = self.levels.lock();
        levels
            .side(side)
            .iter()
            .map(|(price, size)| PriceLevel::new(*price, *size))
            .collect()
    }
}

impl Clone for OrderBook {
    fn clone(&self) -> Self {
        Self {
            symbol: self.symbol.clone(),
            levels: Mutex::new(self.levels.lock().clone()),
        }
    }
}
