// Licensed under the Apache-2.0 license

use core::sync::atomic::{AtomicBool, Ordering};

/// Claim flag for the bus, set while a master transfer is in flight.
///
/// The claim is a test-and-set inside a critical section, so it also holds on
/// cores without compare-and-swap.
#[derive(Debug, Default)]
pub struct BusOwnership {
    busy: AtomicBool,
}

impl BusOwnership {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
        }
    }

    /// Take the bus. Returns `false` if it is already owned.
    pub fn try_claim(&self) -> bool {
        critical_section::with(|_| {
            if self.busy.load(Ordering::Acquire) {
                false
            } else {
                self.busy.store(true, Ordering::Release);
                true
            }
        })
    }

    pub fn release(&self) {
        self.busy.store(false, Ordering::Release);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}
