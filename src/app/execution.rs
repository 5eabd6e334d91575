//! Concurrent submission of the venue and chain legs.

use std::fmt;
use std::time::Duration;

use tracing::{info, warn};

use crate::app::call::with_timeout;
use crate::error::ExecutionError;
use crate::exchange::{ChainExecutor, MarketOrder, SwapRequest, VenueTrader};

/// One side of a dual-leg execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    Venue,
    Chain,
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leg::Venue => write!(f, "venue"),
            Leg::Chain => write!(f, "chain"),
        }
    }
}

/// What happened to a single leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegOutcome {
    /// Accepted. `reference` is the venue order id or the transaction hash.
    Filled { reference: String },
    Failed { error: String },
}

impl LegOutcome {
    #[must_use]
    pub fn is_filled(&self) -> bool {
        matches!(self, LegOutcome::Filled { .. })
    }
}

/// Combined result of both legs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DualLegStatus {
    Success,
    /// One leg went through and the other did not. The position is now
    /// unhedged by the failed leg's amount.
    PartialFill {
        filled_leg: Leg,
        failed_leg: Leg,
        error: String,
    },
    Failed {
        reason: String,
    },
}

/// Both leg outcomes of one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DualLegExecution {
    pub venue: LegOutcome,
    pub chain: LegOutcome,
}

impl DualLegExecution {
    #[must_use]
    pub fn status(&self) -> DualLegStatus {
        match (&self.venue, &self.chain) {
            (LegOutcome::Filled { .. }, LegOutcome::Filled { .. }) => DualLegStatus::Success,
            (LegOutcome::Filled { .. }, LegOutcome::Failed { error }) => {
                DualLegStatus::PartialFill {
                    filled_leg: Leg::Venue,
                    failed_leg: Leg::Chain,
                    error: error.clone(),
                }
            }
            (LegOutcome::Failed { error }, LegOutcome::Filled { .. }) => {
                DualLegStatus::PartialFill {
                    filled_leg: Leg::Chain,
                    failed_leg: Leg::Venue,
                    error: error.clone(),
                }
            }
            (LegOutcome::Failed { error: venue }, LegOutcome::Failed { error: chain }) => {
                DualLegStatus::Failed {
                    reason: format!("venue: {venue}, chain: {chain}"),
                }
            }
        }
    }
}

/// Place the venue order and broadcast the swap at the same time.
///
/// Never fails as a whole; each leg's failure is captured in its
/// [`LegOutcome`].
pub async fn execute_dual_leg(
    venue: &dyn VenueTrader,
    chain: &dyn ChainExecutor,
    order: &MarketOrder,
    swap: &SwapRequest,
    timeout: Duration,
) -> DualLegExecution {
    let (venue_result, chain_result) = tokio::join!(
        with_timeout(timeout, "venue order", venue.place_market_order(order)),
        with_timeout(timeout, "swap", chain.execute_swap(swap)),
    );

    let venue_leg = match venue_result {
        Ok(receipt) => LegOutcome::Filled {
            reference: receipt.order_id.to_string(),
        },
        Err(e) => LegOutcome::Failed {
            error: e.to_string(),
        },
    };
    let chain_leg = match chain_result {
        Ok(receipt) if receipt.is_success() => LegOutcome::Filled {
            reference: receipt.tx_hash,
        },
        Ok(receipt) => LegOutcome::Failed {
            error: ExecutionError::TransactionFailed {
                code: receipt.code,
                log: receipt.raw_log,
            }
            .to_string(),
        },
        Err(e) => LegOutcome::Failed {
            error: e.to_string(),
        },
    };

    let execution = DualLegExecution {
        venue: venue_leg,
        chain: chain_leg,
    };
    match execution.status() {
        DualLegStatus::Success => info!(
            venue = venue.venue_name(),
            symbol = %order.symbol,
            "Both legs executed successfully"
        ),
        DualLegStatus::PartialFill {
            filled_leg,
            failed_leg,
            error,
        } => warn!(
            filled = %filled_leg,
            failed = %failed_leg,
            error = %error,
            "One leg failed, position is unhedged"
        ),
        DualLegStatus::Failed { reason } => warn!(reason = %reason, "Both legs failed"),
    }
    execution
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(r: &str) -> LegOutcome {
        LegOutcome::Filled {
            reference: r.into(),
        }
    }

    fn failed(e: &str) -> LegOutcome {
        LegOutcome::Failed { error: e.into() }
    }

    #[test]
    fn status_reflects_both_legs() {
        let both = DualLegExecution {
            venue: filled("1"),
            chain: filled("ABC"),
        };
        assert_eq!(both.status(), DualLegStatus::Success);

        let partial = DualLegExecution {
            venue: filled("1"),
            chain: failed("out of gas"),
        };
        assert_eq!(
            partial.status(),
            DualLegStatus::PartialFill {
                filled_leg: Leg::Venue,
                failed_leg: Leg::Chain,
                error: "out of gas".into()
            }
        );

        let none = DualLegExecution {
            venue: failed("rejected"),
            chain: failed("timeout"),
        };
        assert!(matches!(none.status(), DualLegStatus::Failed { .. }));
    }
}
