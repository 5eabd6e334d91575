//! Venue-specific adapters.

pub mod bybit;
