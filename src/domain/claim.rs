//! Claims for on-chain orders consumed by our swaps.
//!
//! Filling a resting order through a swap leaves the maker's proceeds in
//! the contract until someone claims them. The batch message is sent to the
//! orderbook contract verbatim, so its JSON shape must match exactly:
//!
//! ```json
//! {"batch_claim":{"orders":[[tick_id,order_id],...]}}
//! ```

use serde::Serialize;

/// A (tick, order) pair to claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingClaim {
    pub tick_id: i64,
    pub order_id: i64,
}

impl PendingClaim {
    #[must_use]
    pub const fn new(tick_id: i64, order_id: i64) -> Self {
        Self { tick_id, order_id }
    }
}

#[derive(Serialize)]
struct BatchClaimMsg<'a> {
    batch_claim: BatchClaim<'a>,
}

#[derive(Serialize)]
struct BatchClaim<'a> {
    orders: &'a [[i64; 2]],
}

/// Serialize the batch-claim contract message.
///
/// # Errors
///
/// Only fails if `serde_json` does, which it does not for these types.
pub fn batch_claim_msg(claims: &[PendingClaim]) -> serde_json::Result<Vec<u8>> {
    let orders: Vec<[i64; 2]> = claims.iter().map(|c| [c.tick_id, c.order_id]).collect();
    serde_json::to_vec(&BatchClaimMsg {
        batch_claim: BatchClaim { orders: &orders },
    })
}
