//! Loading on-chain snapshots from the chain.

use std::sync::Arc;
use std::time::Duration;

use cexarb::app::{PoolTarget, SnapshotStore, TickRefresher};
use cexarb::domain::PoolId;
use cexarb::testkit::domain::{chain_ask, chain_bid};
use cexarb::testkit::MockChain;
use rust_decimal_macros::dec;

const POOL: PoolId = PoolId::new(7);
const CONTRACT: &str = "osmo1book";

fn target() -> PoolTarget {
    PoolTarget {
        pool_id: POOL,
        contract_address: CONTRACT.into(),
    }
}

fn refresher(chain: &Arc<MockChain>) -> TickRefresher {
    TickRefresher::new(
        chain.clone(),
        Arc::new(SnapshotStore::new()),
        Duration::from_secs(5),
    )
}

#[tokio::test]
async fn refresh_loads_every_active_tick() {
    let chain = Arc::new(MockChain::new());
    chain.set_orders(
        POOL,
        CONTRACT,
        vec![
            chain_bid(100, 3, dec!(10)),
            chain_ask(300, 1, dec!(5)),
            chain_bid(200, 2, dec!(10)),
            chain_bid(200, 1, dec!(10)),
        ],
    );
    let refresher = refresher(&chain);

    assert_eq!(refresher.refresh(42, vec![target()]).await, vec![POOL]);

    let view = refresher.snapshots().get(POOL).unwrap();
    assert_eq!(view.height(), 42);
    let bids: Vec<(i64, i64)> = view
        .bids_descending()
        .iter()
        .map(|o| (o.tick_id, o.order_id))
        .collect();
    assert_eq!(bids, vec![(200, 1), (200, 2), (100, 3)]);
    assert_eq!(view.best_ask().map(|o| o.tick_id), Some(300));
}

#[tokio::test]
async fn failing_tick_is_skipped() {
    let chain = Arc::new(MockChain::new());
    chain.set_orders(
        POOL,
        CONTRACT,
        vec![chain_bid(100, 1, dec!(10)), chain_bid(200, 2, dec!(10))],
    );
    chain.fail_tick(200);
    let refresher = refresher(&chain);

    refresher.refresh(1, vec![target()]).await;

    let view = refresher.snapshots().get(POOL).unwrap();
    assert_eq!(view.len(), 1);
    assert_eq!(view.best_bid().map(|o| o.order_id), Some(1));
}

#[tokio::test]
async fn unreachable_pool_keeps_previous_snapshot() {
    let chain = Arc::new(MockChain::new());
    chain.set_orders(POOL, CONTRACT, vec![chain_bid(100, 1, dec!(10))]);
    let refresher = refresher(&chain);
    refresher.refresh(1, vec![target()]).await;

    chain.set_orders(POOL, CONTRACT, vec![]);
    chain.fail_active_ticks(true);
    assert!(refresher.refresh(2, vec![target()]).await.is_empty());

    let view = refresher.snapshots().get(POOL).unwrap();
    assert_eq!(view.height(), 1);
    assert_eq!(view.len(), 1);
}

#[tokio::test]
async fn pool_without_orders_gets_empty_snapshot() {
    let chain = Arc::new(MockChain::new());
    let refresher = refresher(&chain);

    refresher.refresh(3, vec![target()]).await;

    let view = refresher.snapshots().get(POOL).unwrap();
    assert!(view.is_empty());
    assert!(refresher.snapshots().contains(POOL));
}
