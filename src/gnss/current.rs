//! The "current fix" register.
//!
//! A single slot, last writer wins.  The position feed replaces it on
//! every update; mergers take a snapshot (an `Arc` clone) and never hold
//! the lock across anything else.

use core::cell::RefCell;
use std::sync::Arc;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use super::PositionFix;

pub struct CurrentFix {
    slot: Mutex<CriticalSectionRawMutex, RefCell<Option<Arc<PositionFix>>>>,
}

impl Default for CurrentFix {
    fn default() -> Self {
        Self::new()
    }
}

impl CurrentFix {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(RefCell::new(None)),
        }
    }

    /// Overwrite the register, returning the fix it held.
    pub fn replace(&self, fix: Arc<PositionFix>) -> Option<Arc<PositionFix>> {
        self.slot.lock(|cell| cell.replace(Some(fix)))
    }

    /// Snapshot of the current fix, `None` if none was ever received.
    pub fn snapshot(&self) -> Option<Arc<PositionFix>> {
        self.slot.lock(|cell| cell.borrow().clone())
    }
}
