//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`venue`] - In-memory [`VenueTrader`](crate::exchange::VenueTrader)
//! - [`chain`] - In-memory [`ChainQuery`](crate::exchange::ChainQuery) and
//!   [`ChainExecutor`](crate::exchange::ChainExecutor)
//! - [`domain`] - Builders for orders, books and tick ids
//! - [`config`] - Canonical test configuration

pub mod chain;
pub mod config;
pub mod domain;
pub mod venue;

pub use chain::MockChain;
pub use venue::MockVenue;
