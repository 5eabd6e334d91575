//! Venue order books kept current by the public stream.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::adapter::bybit::OrderbookMessage;
use crate::domain::{BookUpdate, OrderBook, Side, UpdateKind};
use crate::error::{Error, Result};

/// One [`OrderBook`] per venue symbol.
///
/// Books are created by their first snapshot and mutated in place after
/// that, so readers holding an `Arc` keep seeing live depth.
#[derive(Debug, Default)]
pub struct BookStore {
    books: DashMap<String, Arc<OrderBook>>,
}

impl BookStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<Arc<OrderBook>> {
        self.books.get(symbol).map(|book| Arc::clone(&book))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.books.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Apply a decoded update.
    ///
    /// # Errors
    ///
    /// A delta for a symbol that has not had a snapshot yet is
    /// [`Error::BookUnavailable`].
    pub fn apply(&self, update: BookUpdate) -> Result<()> {
        match update.kind {
            UpdateKind::Snapshot => {
                let book = self
                    .books
                    .entry(update.symbol.clone())
                    .or_insert_with(|| Arc::new(OrderBook::new(update.symbol.clone())))
                    .clone();
                book.replace(update.bids, update.asks);
                debug!(symbol = %update.symbol, "Book snapshot applied");
            }
            UpdateKind::Delta => {
                let book = self.get(&update.symbol).ok_or_else(|| Error::BookUnavailable {
                    symbol: update.symbol.clone(),
                })?;
                for level in update.bids {
                    book.upsert(Side::Bid, level.price(), level.size());
                }
                for level in update.asks {
                    book.upsert(Side::Ask, level.price(), level.size());
                }
            }
        }
        Ok(())
    }

    /// Decode and apply one raw stream frame.
    pub fn handle_message(&self, raw: &str) -> Result<()> {
        let update = OrderbookMessage::parse(raw)?.into_update()?;
        self.apply(update)
    }
}

/// Feed raw stream frames from `rx` into `store` until the sender closes.
pub async fn run_feed(store: Arc<BookStore>, mut rx: mpsc::Receiver<String>) {
    info!("Book feed started");
    while let Some(raw) = rx.recv().await {
        if let Err(e) = store.handle_message(&raw) {
            warn!(error = %e, "Dropping book message");
        }
    }
    info!(books = store.len(), "Book feed closed");
}
