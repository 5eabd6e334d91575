//! Application layer - orchestration, configuration, and shared state.

pub mod call;
mod config;
pub mod coordinator;
pub mod execution;
pub mod feed;
pub mod profit;
pub mod scheduler;
pub mod state;
pub mod ticks;

pub use config::{
    ArbitrageConfig, AssetConfig, ChainConfig, Config, LoggingConfig, PairConfig,
};
pub use coordinator::{
    ClaimFlush, Collaborators, CycleOutcome, ExecutionCoordinator, ExecutionReport, PairContext,
    SharedStores, SkipReason,
};
pub use execution::{execute_dual_leg, DualLegExecution, DualLegStatus, Leg, LegOutcome};
pub use feed::{run_feed, BookStore};
pub use profit::{PriceSheet, ProfitModel, Profitability};
pub use scheduler::{BlockEvent, BlockReport, PairOutcome, Scheduler};
pub use state::{BlockGuard, BlockPermit, ClaimLedger, CooldownTable};
pub use ticks::{PoolTarget, SnapshotStore, TickRefresher};
