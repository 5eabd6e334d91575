//! Bybit spot venue: wire decoding for the public book stream.

pub mod message;

pub use message::OrderbookMessage;
