//! Per-block scheduling: pool refresh policy, cooldown, and the block guard.

mod support;

use std::sync::Arc;
use std::time::Duration;

use cexarb::app::{BlockEvent, BlockReport, CycleOutcome};
use cexarb::domain::OnChainOrder;
use cexarb::testkit::domain::btc_usdc_tick;
use rust_decimal_macros::dec;
use tokio::sync::mpsc;

use support::{executed, only_outcome, run_block, touched, Harness, POOL};

#[tokio::test]
async fn cooldown_skips_until_window_ends() {
    let h = Harness::new();
    h.cross_chain_bid_over_venue_ask();
    let scheduler = h.scheduler().await;

    let first = executed(run_block(&scheduler, 100).await);
    assert_eq!(first.cooldown_until, 105);

    for height in 101..105 {
        assert_eq!(
            run_block(&scheduler, height).await,
            CycleOutcome::CoolingDown { blocked_until: 105 },
            "height {height}"
        );
    }
    assert_eq!(h.venue.orders().len(), 1);

    let second = executed(run_block(&scheduler, 105).await);
    assert_eq!(second.cooldown_until, 110);
    assert_eq!(h.venue.orders().len(), 2);
}

#[tokio::test]
async fn only_touched_or_unloaded_pools_are_refreshed() {
    let h = Harness::new();
    h.cross_chain_bid_over_venue_ask();
    let scheduler = h.scheduler().await;

    // no snapshot yet, so the pool loads even though nothing was touched
    let report = scheduler.on_block_boundary(100, &touched(&[])).await;
    assert!(matches!(&report, BlockReport::Processed { refreshed, .. } if refreshed == &vec![POOL]));

    let report = scheduler.on_block_boundary(101, &touched(&[])).await;
    assert!(matches!(&report, BlockReport::Processed { refreshed, .. } if refreshed.is_empty()));

    let report = scheduler.on_block_boundary(102, &touched(&[POOL])).await;
    assert!(matches!(&report, BlockReport::Processed { refreshed, .. } if refreshed == &vec![POOL]));

    assert_eq!(h.chain.tick_queries(), vec![POOL, POOL]);
}

#[tokio::test]
async fn refreshed_snapshot_is_used_for_detection() {
    let h = Harness::new();
    h.set_venue_book(&[(dec!(60000), dec!(1))], &[(dec!(60500), dec!(0.01))]);
    h.set_chain_orders(vec![cexarb::testkit::domain::chain_bid(
        btc_usdc_tick(dec!(60400)),
        1,
        dec!(1000000000),
    )]);
    let scheduler = h.scheduler().await;

    assert!(matches!(
        run_block(&scheduler, 100).await,
        CycleOutcome::Skipped(_)
    ));

    h.set_chain_orders(vec![cexarb::testkit::domain::chain_bid(
        btc_usdc_tick(dec!(61000)),
        2,
        dec!(1000000000),
    )]);
    // pool not reported as touched: the stale snapshot still applies
    assert!(matches!(
        run_block(&scheduler, 101).await,
        CycleOutcome::Skipped(_)
    ));

    let outcome = only_outcome(scheduler.on_block_boundary(102, &touched(&[POOL])).await);
    executed(outcome);
}

#[tokio::test(start_paused = true)]
async fn overlapping_block_is_rejected() {
    let h = Harness::new();
    h.cross_chain_bid_over_venue_ask();
    h.venue.set_balance_latency(Duration::from_secs(1));
    let scheduler = Arc::new(h.scheduler().await);

    let first = tokio::spawn({
        let scheduler = Arc::clone(&scheduler);
        async move { scheduler.on_block_boundary(100, &touched(&[])).await }
    });
    while !scheduler.is_busy() {
        tokio::task::yield_now().await;
    }

    assert_eq!(
        scheduler.on_block_boundary(101, &touched(&[])).await,
        BlockReport::Busy { height: 101 }
    );

    let report = first.await.unwrap();
    assert!(matches!(report, BlockReport::Processed { height: 100, .. }));
    assert!(!scheduler.is_busy());
}

#[tokio::test]
async fn run_processes_block_events() {
    let h = Harness::new();
    h.cross_chain_bid_over_venue_ask();
    let scheduler = Arc::new(h.scheduler().await);

    let (tx, rx) = mpsc::channel(8);
    tx.send(BlockEvent {
        height: 100,
        updated_pools: touched(&[POOL]),
    })
    .await
    .unwrap();
    drop(tx);

    scheduler.run(rx).await;

    assert_eq!(h.venue.orders().len(), 1);
    assert_eq!(h.chain.swaps().len(), 1);
}

#[tokio::test]
#[should_panic(expected = "invalid orders")]
async fn unknown_order_direction_halts() {
    let h = Harness::new();
    h.set_venue_book(&[(dec!(60000), dec!(1))], &[(dec!(60500), dec!(0.01))]);
    let mut order = cexarb::testkit::domain::chain_bid(btc_usdc_tick(dec!(61000)), 1, dec!(1));
    order.order_direction = "sideways".into();
    h.set_chain_orders(vec![order]);
    let scheduler = h.scheduler().await;

    scheduler.on_block_boundary(100, &touched(&[POOL])).await;
}

#[tokio::test]
async fn pair_names_are_listed() {
    let h = Harness::new();
    h.set_chain_orders(Vec::<OnChainOrder>::new());
    let scheduler = h.scheduler().await;

    assert_eq!(scheduler.pairs().collect::<Vec<_>>(), vec!["BTC/USDC"]);
}
