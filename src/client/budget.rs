//! Shared request budget claimed by workers

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Fixed number of request attempts, handed out one unit at a time
///
/// Claiming is a single atomic decrement-if-positive, so no two workers can
/// take the same unit and the total handed out never exceeds `total`.
#[derive(Debug)]
pub struct RequestBudget {
    total: u64,
    remaining: AtomicU64,
    closed: AtomicBool,
}

impl RequestBudget {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            remaining: AtomicU64::new(total),
            closed: AtomicBool::new(false),
        }
    }

    /// Claim one unit; returns its zero-based ticket, or `None` once exhausted
    pub fn try_claim(&self) -> Option<u64> {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |remaining| {
                remaining.checked_sub(1)
            })
            .ok()
            .map(|before| self.total - before)
    }

    /// Stop handing out units; returns how many were abandoned
    pub fn close(&self) -> u64 {
        self.closed.store(true, Ordering::Release);
        self.remaining.swap(0, Ordering::AcqRel)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::Acquire)
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}
