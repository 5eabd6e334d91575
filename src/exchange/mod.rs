//! Exchange abstraction layer.
//!
//! Defines the traits the venue and chain collaborators must fulfill,
//! plus the plain data they exchange with the engine.

mod traits;

pub use traits::{
    CanonicalBook, ChainExecutor, ChainQuery, Coin, InstrumentMinimums, MarketOrder, OrderReceipt,
    OrderSide, SwapRequest, SwapSimulation, TxReceipt, VenueTrader,
};
