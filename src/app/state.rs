//! Shared engine state.
//!
//! - [`BlockGuard`] - at most one block is processed at a time
//! - [`CooldownTable`] - per-pair idle windows after an execution attempt
//! - [`ClaimLedger`] - claims collected by a pair's current cycle

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::domain::PendingClaim;

/// Process-wide flag that rejects overlapping block processing.
#[derive(Debug, Default)]
pub struct BlockGuard {
    busy: AtomicBool,
}

impl BlockGuard {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
        }
    }

    /// Claim the guard, or `None` if a block is already in flight.
    /// The guard is released when the permit drops, including on unwind.
    pub fn try_enter(&self) -> Option<BlockPermit<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BlockPermit { busy: &self.busy })
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Held while a block is being processed.
#[derive(Debug)]
pub struct BlockPermit<'a> {
    busy: &'a AtomicBool,
}

impl Drop for BlockPermit<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Height until which each pair is idle.
///
/// A pair that executed at height `h` with a cooldown of `n` blocks is
/// skipped for `h+1 ..= h+n-1` and considered again at `h+n`.
#[derive(Debug, Default)]
pub struct CooldownTable {
    blocked_until: DashMap<String, u64>,
}

impl CooldownTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `pair` must skip `height`. Returns the blocking height if so.
    #[must_use]
    pub fn blocked_until(&self, pair: &str, height: u64) -> Option<u64> {
        self.blocked_until
            .get(pair)
            .map(|until| *until)
            .filter(|until| height < *until)
    }

    /// Idle `pair` until `height`.
    pub fn block_until(&self, pair: &str, height: u64) {
        self.blocked_until.insert(pair.to_string(), height);
    }
}

/// Claims collected while sizing one pair's current cycle.
#[derive(Debug, Default)]
pub struct ClaimLedger {
    claims: Mutex<Vec<PendingClaim>>,
}

impl ClaimLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, claims: impl IntoIterator<Item = PendingClaim>) {
        self.claims.lock().extend(claims);
    }

    /// Take every pending claim, leaving the ledger empty.
    pub fn drain(&self) -> Vec<PendingClaim> {
        std::mem::take(&mut *self.claims.lock())
    }

    /// Drop the claims of an abandoned cycle.
    pub fn discard(&self) {
        self.claims.lock().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.claims.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.lock().is_empty()
    }
}
