//! Per-block entry point.
//!
//! On every block boundary the scheduler refreshes the on-chain snapshots
//! of touched pools, then runs one [`ExecutionCoordinator`] cycle per pair
//! concurrently and waits for all of them before returning.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::app::config::Config;
use crate::app::coordinator::{
    Collaborators, CycleOutcome, ExecutionCoordinator, PairContext, SharedStores,
};
use crate::app::feed::BookStore;
use crate::app::state::{BlockGuard, CooldownTable};
use crate::app::ticks::{PoolTarget, SnapshotStore, TickRefresher};
use crate::domain::PoolId;
use crate::error::Result;

/// A new block and the pools whose orders changed in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEvent {
    pub height: u64,
    pub updated_pools: HashSet<PoolId>,
}

/// Outcome of one pair's cycle, keyed by the pair's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairOutcome {
    pub pair: String,
    pub outcome: CycleOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReport {
    /// Another block was still being processed.
    Busy { height: u64 },
    Processed {
        height: u64,
        refreshed: Vec<PoolId>,
        /// Sorted by pair.
        outcomes: Vec<PairOutcome>,
    },
}

pub struct Scheduler {
    coordinators: Vec<Arc<ExecutionCoordinator>>,
    refresher: TickRefresher,
    stores: SharedStores,
    guard: BlockGuard,
}

impl Scheduler {
    /// Resolve every configured pair and wire up shared state.
    ///
    /// # Errors
    ///
    /// Fails if a pair cannot be resolved against the venue or the chain.
    pub async fn build(
        config: &Config,
        collaborators: Collaborators,
        books: Arc<BookStore>,
    ) -> Result<Self> {
        let timeout = config.arbitrage.call_timeout();
        let stores = SharedStores {
            books,
            snapshots: Arc::new(SnapshotStore::new()),
            cooldowns: Arc::new(CooldownTable::new()),
        };

        let mut coordinators = Vec::new();
        for pair in config.trading_pairs()? {
            let ctx = PairContext::resolve(pair, &collaborators, timeout).await?;
            coordinators.push(Arc::new(ExecutionCoordinator::new(
                ctx,
                config,
                stores.clone(),
                collaborators.clone(),
            )));
        }

        let refresher = TickRefresher::new(
            Arc::clone(&collaborators.chain_query),
            Arc::clone(&stores.snapshots),
            timeout,
        );
        info!(pairs = coordinators.len(), "Scheduler ready");

        Ok(Self {
            coordinators,
            refresher,
            stores,
            guard: BlockGuard::new(),
        })
    }

    /// Display names of the registered pairs.
    pub fn pairs(&self) -> impl Iterator<Item = &str> {
        self.coordinators.iter().map(|c| c.name())
    }

    /// Whether a block is being processed right now.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    #[must_use]
    pub fn stores(&self) -> &SharedStores {
        &self.stores
    }

    /// Process block `height`.
    ///
    /// Pools in `updated_pools`, and pools with no snapshot yet, are
    /// refreshed before any pair runs. Returns [`BlockReport::Busy`] without
    /// doing anything if a previous call has not returned.
    ///
    /// # Panics
    ///
    /// Re-raises a panic from any pair's cycle.
    pub async fn on_block_boundary(
        &self,
        height: u64,
        updated_pools: &HashSet<PoolId>,
    ) -> BlockReport {
        let Some(_permit) = self.guard.try_enter() else {
            debug!(height, "Previous block still in flight");
            return BlockReport::Busy { height };
        };

        let refreshed = self.refresh_pools(height, updated_pools).await;

        let mut tasks = JoinSet::new();
        for coordinator in &self.coordinators {
            let coordinator = Arc::clone(coordinator);
            tasks.spawn(async move {
                let outcome = coordinator.run_cycle(height).await;
                PairOutcome {
                    pair: coordinator.name().to_string(),
                    outcome,
                }
            });
        }

        let mut outcomes = Vec::with_capacity(self.coordinators.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => warn!(height, error = %e, "Pair cycle cancelled"),
            }
        }
        outcomes.sort_by(|a, b| a.pair.cmp(&b.pair));

        let executed = outcomes
            .iter()
            .filter(|o| matches!(o.outcome, CycleOutcome::Executed(_)))
            .count();
        info!(
            height,
            pairs = outcomes.len(),
            executed,
            refreshed = refreshed.len(),
            "Block processed"
        );

        BlockReport::Processed {
            height,
            refreshed,
            outcomes,
        }
    }

    async fn refresh_pools(&self, height: u64, updated_pools: &HashSet<PoolId>) -> Vec<PoolId> {
        let mut seen = HashSet::new();
        let targets: Vec<PoolTarget> = self
            .coordinators
            .iter()
            .map(|c| c.context().book())
            .filter(|book| {
                updated_pools.contains(&book.pool_id)
                    || !self.stores.snapshots.contains(book.pool_id)
            })
            .filter(|book| seen.insert(book.pool_id))
            .map(|book| PoolTarget {
                pool_id: book.pool_id,
                contract_address: book.contract_address.clone(),
            })
            .collect();

        if targets.is_empty() {
            return Vec::new();
        }
        self.refresher.refresh(height, targets).await
    }

    /// Process block events until the channel closes.
    ///
    /// Each event runs on its own task, so an event arriving while the
    /// previous block is still in flight is rejected by the guard.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<BlockEvent>) {
        let mut inflight = JoinSet::new();
        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { break };
                    let scheduler = Arc::clone(&self);
                    inflight.spawn(async move {
                        let report = scheduler
                            .on_block_boundary(event.height, &event.updated_pools)
                            .await;
                        if let BlockReport::Busy { height } = report {
                            warn!(height, "Block skipped, previous block still processing");
                        }
                    });
                }
                Some(joined) = inflight.join_next(), if !inflight.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            std::panic::resume_unwind(e.into_panic());
                        }
                    }
                }
            }
        }

        while let Some(joined) = inflight.join_next().await {
            if let Err(e) = joined {
                if e.is_panic() {
                    std::panic::resume_unwind(e.into_panic());
                }
            }
        }
        info!("Block stream closed");
    }
}
