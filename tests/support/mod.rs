#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use cexarb::app::{
    BlockReport, BookStore, Collaborators, Config, CycleOutcome, ExecutionReport, Scheduler,
};
use cexarb::domain::{OnChainOrder, PoolId};
use cexarb::exchange::{Coin, InstrumentMinimums, SwapSimulation};
use cexarb::testkit::config::{self, ACCOUNT, BTC_DENOM, FEE_DENOM, USDC_DENOM};
use cexarb::testkit::domain::{btc_usdc_tick, chain_ask, chain_bid, venue_snapshot};
use cexarb::testkit::{MockChain, MockVenue};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub const POOL: PoolId = PoolId::new(1);
pub const CONTRACT: &str = "osmo1orderbook";
pub const SYMBOL: &str = "BTCUSDC";

/// A BTC/USDC engine wired to in-memory collaborators.
///
/// Defaults: venue holds 1 BTC and 10,000 USDC with a 0.0001 BTC / 1 USDC
/// minimum, the account holds 0.1 BTC and 1,000 USDC on chain, BTC is
/// priced at 60,000 and OSMO at 0.5.
pub struct Harness {
    pub venue: Arc<MockVenue>,
    pub chain: Arc<MockChain>,
    pub books: Arc<BookStore>,
    pub config: Config,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_minimums(InstrumentMinimums {
            min_base_qty: Some(dec!(0.0001)),
            min_quote_qty: Some(dec!(1)),
            base_precision: Some(6),
            quote_precision: Some(2),
        })
    }

    pub fn with_minimums(minimums: InstrumentMinimums) -> Self {
        let venue = MockVenue::new()
            .with_balance("BTC", dec!(1))
            .with_balance("USDC", dec!(10000))
            .with_minimums(SYMBOL, minimums);

        let chain = MockChain::new();
        chain.add_pool(BTC_DENOM, USDC_DENOM, POOL, CONTRACT);
        chain.set_price(BTC_DENOM, USDC_DENOM, dec!(60000));
        chain.set_price(FEE_DENOM, USDC_DENOM, dec!(0.5));
        chain.set_balance(ACCOUNT, Coin::new(BTC_DENOM, dec!(10000000)));
        chain.set_balance(ACCOUNT, Coin::new(USDC_DENOM, dec!(1000000000)));
        chain.set_simulation(SwapSimulation {
            expected_out: dec!(610000000),
            gas_estimate: 200000,
        });

        Self {
            venue: Arc::new(venue),
            chain: Arc::new(chain),
            books: Arc::new(BookStore::new()),
            config: config::btc_usdc(),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            venue: self.venue.clone(),
            chain_query: self.chain.clone(),
            chain_exec: self.chain.clone(),
        }
    }

    pub async fn scheduler(&self) -> Scheduler {
        Scheduler::build(&self.config, self.collaborators(), Arc::clone(&self.books))
            .await
            .unwrap()
    }

    /// Replace the venue book. Prices and sizes are human units.
    pub fn set_venue_book(&self, bids: &[(Decimal, Decimal)], asks: &[(Decimal, Decimal)]) {
        self.books.apply(venue_snapshot(SYMBOL, bids, asks)).unwrap();
    }

    pub fn set_chain_orders(&self, orders: Vec<OnChainOrder>) {
        self.chain.set_orders(POOL, CONTRACT, orders);
    }

    /// Chain bids 1,000 USDC at 61,000 while the venue offers 0.01 BTC at
    /// 60,500: about 82 bps in favor of buying on the venue.
    pub fn cross_chain_bid_over_venue_ask(&self) {
        self.set_venue_book(&[(dec!(60000), dec!(1))], &[(dec!(60500), dec!(0.01))]);
        self.set_chain_orders(vec![
            chain_bid(btc_usdc_tick(dec!(61000)), 1, dec!(1000000000)),
            chain_ask(btc_usdc_tick(dec!(62000)), 2, dec!(100000000)),
        ]);
    }

    /// The venue bids 0.01 BTC at 61,000 while the chain offers 0.005 BTC at
    /// 60,000.
    pub fn cross_venue_bid_over_chain_ask(&self) {
        self.set_venue_book(&[(dec!(61000), dec!(0.01))], &[(dec!(61500), dec!(1))]);
        self.set_chain_orders(vec![
            chain_ask(btc_usdc_tick(dec!(60000)), 7, dec!(500000)),
            chain_bid(btc_usdc_tick(dec!(59000)), 8, dec!(1000000000)),
        ]);
        self.chain.set_simulation(SwapSimulation {
            expected_out: dec!(505000),
            gas_estimate: 200000,
        });
    }
}

pub fn touched(pools: &[PoolId]) -> HashSet<PoolId> {
    pools.iter().copied().collect()
}

/// The single pair's outcome from a processed block.
pub fn only_outcome(report: BlockReport) -> CycleOutcome {
    match report {
        BlockReport::Processed { mut outcomes, .. } => {
            assert_eq!(outcomes.len(), 1, "expected exactly one pair");
            outcomes.remove(0).outcome
        }
        BlockReport::Busy { height } => panic!("block {height} was rejected as busy"),
    }
}

pub fn executed(outcome: CycleOutcome) -> ExecutionReport {
    match outcome {
        CycleOutcome::Executed(report) => *report,
        other => panic!("expected an execution, got {other:?}"),
    }
}

/// Run one block and return the pair's outcome.
pub async fn run_block(scheduler: &Scheduler, height: u64) -> CycleOutcome {
    only_outcome(scheduler.on_block_boundary(height, &HashSet::new()).await)
}
