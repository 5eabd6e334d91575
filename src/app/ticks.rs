//! On-chain order snapshots, refreshed per block for touched pools.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::future::join_all;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::app::call::with_timeout;
use crate::domain::{OnChainBookView, PoolId};
use crate::error::{ErrorClass, Result};
use crate::exchange::ChainQuery;

/// Latest [`OnChainBookView`] per pool.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    views: DashMap<PoolId, Arc<OnChainBookView>>,
}

impl SnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, pool_id: PoolId) -> Option<Arc<OnChainBookView>> {
        self.views.get(&pool_id).map(|view| Arc::clone(&view))
    }

    #[must_use]
    pub fn contains(&self, pool_id: PoolId) -> bool {
        self.views.contains_key(&pool_id)
    }

    pub fn insert(&self, view: OnChainBookView) {
        self.views.insert(view.pool_id(), Arc::new(view));
    }
}

/// A pool to refresh and the contract that holds its orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolTarget {
    pub pool_id: PoolId,
    pub contract_address: String,
}

/// Reloads resting orders from chain.
pub struct TickRefresher {
    chain: Arc<dyn ChainQuery>,
    snapshots: Arc<SnapshotStore>,
    timeout: Duration,
}

impl TickRefresher {
    pub fn new(chain: Arc<dyn ChainQuery>, snapshots: Arc<SnapshotStore>, timeout: Duration) -> Self {
        Self {
            chain,
            snapshots,
            timeout,
        }
    }

    #[must_use]
    pub fn snapshots(&self) -> &Arc<SnapshotStore> {
        &self.snapshots
    }

    /// Replace the snapshots of `targets`, one task per pool.
    ///
    /// A pool whose tick list cannot be fetched keeps its previous snapshot.
    /// Returns the pools that were refreshed.
    pub async fn refresh(&self, height: u64, targets: Vec<PoolTarget>) -> Vec<PoolId> {
        let mut tasks = JoinSet::new();
        for target in targets {
            let chain = Arc::clone(&self.chain);
            let timeout = self.timeout;
            tasks.spawn(async move {
                let pool_id = target.pool_id;
                (pool_id, load_view(chain, timeout, height, target).await)
            });
        }

        let mut refreshed = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (pool_id, result) = match joined {
                Ok(done) => done,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => {
                    warn!(error = %e, "Tick refresh task cancelled");
                    continue;
                }
            };
            match result {
                Ok(view) => {
                    debug!(pool = %pool_id, orders = view.len(), height, "Pool snapshot refreshed");
                    self.snapshots.insert(view);
                    refreshed.push(pool_id);
                }
                Err(e) if e.class() == ErrorClass::InvalidState => {
                    panic!("pool {pool_id} returned invalid orders: {e}")
                }
                Err(e) => warn!(pool = %pool_id, error = %e, "Pool refresh failed"),
            }
        }
        refreshed.sort();
        refreshed
    }
}

async fn load_view(
    chain: Arc<dyn ChainQuery>,
    timeout: Duration,
    height: u64,
    target: PoolTarget,
) -> Result<OnChainBookView> {
    let ticks = with_timeout(timeout, "active ticks", chain.active_ticks(target.pool_id)).await?;

    let fetches = ticks.iter().map(|&tick| {
        let chain = Arc::clone(&chain);
        let contract = target.contract_address.as_str();
        async move {
            let orders =
                with_timeout(timeout, "resting orders", chain.resting_orders(contract, tick)).await;
            (tick, orders)
        }
    });

    let mut orders = Vec::new();
    for (tick, result) in join_all(fetches).await {
        match result {
            Ok(found) => orders.extend(found),
            Err(e) => warn!(pool = %target.pool_id, tick, error = %e, "Skipping tick"),
        }
    }

    Ok(OnChainBookView::from_orders(target.pool_id, height, orders)?)
}
