//! Cooperative cancellation (§5): checked once per slice at the top of the
//! Processor's loop, the one suspension-adjacent point that doesn't already
//! have its own bounded timeout. Polling and lock-wait loops are bounded by
//! their own `timeout` settings and are not individually cancellation-aware
//! (see DESIGN.md).

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// A cheap, cloneable handle a caller can use to ask a running [`crate::Processor`]
/// to stop before its next slice.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> CancellationToken {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "cancel_test.rs"]
mod cancel_test;
