//! The process-wide engine slot.
//!
//! The wrapped engine keeps its state in process globals, so at most one
//! live adapter may drive it at a time. An [`EngineSlot`] is a flag that
//! one adapter claims on `register` and releases on `finalize` or drop.

use std::sync::atomic::{AtomicBool, Ordering};

/// A claimable, one-holder-at-a-time slot.
#[derive(Debug, Default)]
pub struct EngineSlot {
    held: AtomicBool,
}

static PROCESS_SLOT: EngineSlot = EngineSlot::new();

impl EngineSlot {
    /// An unclaimed slot.
    pub const fn new() -> Self {
        Self {
            held: AtomicBool::new(false),
        }
    }

    /// The slot shared by every adapter in this process.
    pub fn process() -> &'static EngineSlot {
        &PROCESS_SLOT
    }

    /// A fresh slot for isolated use, e.g. tests that must not contend
    /// for the process slot.
    ///
    /// Leaks one `EngineSlot`; call sparingly.
    pub fn leaked() -> &'static EngineSlot {
        Box::leak(Box::new(EngineSlot::new()))
    }

    /// Claim the slot. `None` if another claim is live.
    pub fn claim(&'static self) -> Option<SlotClaim> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SlotClaim { slot: self })
    }

    /// Whether a claim is currently live.
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Proof of holding an [`EngineSlot`]; releases it on drop.
#[derive(Debug)]
pub struct SlotClaim {
    slot: &'static EngineSlot,
}

impl Drop for SlotClaim {
    fn drop(&mut self) {
        self.slot.held.store(false, Ordering::Release);
    }
}
