//! cexarb - Arbitrage between a centralized exchange and an on-chain order book.
//!
//! The engine keeps a live copy of each venue order book, reads the resting
//! orders of the matching on-chain orderbook pool every block, and trades
//! both sides when their prices cross by more than a configured threshold.
//!
//! # Architecture
//!
//! - **`domain`** - Pure, synchronous logic
//!   - `OrderBook` - Mutable venue book with unit conversions
//!   - `OnChainBookView` - Immutable per-block snapshot of resting orders
//!   - `PriceReconciler` - Tick and decimal conversions between the venues
//!   - `ArbitrageDetector` / `FillSizer` - Crossed-price detection and depth walk
//!
//! - **`app`** - Async orchestration
//!   - `Scheduler` - Per-block fan-out over pairs
//!   - `ExecutionCoordinator` - One pair's cycle, from balances to cooldown
//!
//! - **`exchange`** - Traits the venue and chain collaborators implement
//! - **`adapter`** - Venue wire formats
//!
//! # Modules
//!
//! - [`domain`] - Books, prices, detection, sizing, clamping and minimums
//! - [`app`] - Configuration, shared state, scheduling and execution
//! - [`exchange`] - Collaborator traits and the data they exchange
//! - [`adapter`] - Bybit order-book stream decoding
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `testkit` - In-memory venue and chain collaborators for tests
//!
//! # Example
//!
//! ```no_run
//! use cexarb::app::Config;
//!
//! let config = Config::load("config.toml").unwrap();
//! for pair in config.trading_pairs().unwrap() {
//!     println!("{pair} trades as {}", pair.venue_symbol());
//! }
//! ```

pub mod adapter;
pub mod app;
pub mod domain;
pub mod error;
pub mod exchange;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
