//! Exchange-agnostic domain logic.
//!
//! Everything here is pure and synchronous: book representations, price
//! reconciliation, detection, sizing and the balance and minimum checks.
//! The async orchestration lives in [`crate::app`].

pub mod book;
pub mod claim;
pub mod clamp;
pub mod detector;
pub mod error;
pub mod fill;
pub mod id;
pub mod minimum;
pub mod money;
pub mod onchain;
pub mod pair;
pub mod reconcile;

pub use book::{BookUpdate, OrderBook, PriceLevel, Side, UpdateKind};
pub use claim::PendingClaim;
pub use detector::{ArbDirection, ArbitrageDetector, Opportunity};
pub use error::DomainError;
pub use fill::{FillPlan, FillSizer};
pub use id::{OrderId, PoolId};
pub use minimum::MinimumFillPolicy;
pub use money::{Price, Volume};
pub use onchain::{OnChainBookView, OnChainOrder, OrderDirection};
pub use pair::{Asset, AssetTable, TradingPair};
pub use reconcile::{tick_to_price, PriceReconciler};
