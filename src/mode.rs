//! Shared automation mode state.
//!
//! Holds the Auto/Manual flag toggled by the user-facing control surface and
//! the last brightness the scheduler applied. Both fields are single-word
//! atomics: the toggle handler writes, the scheduler loop reads, and momentary
//! staleness of the last-applied value is harmless, so no locking is needed.

use std::sync::atomic::{AtomicI16, AtomicU8, Ordering};

/// Automation mode: whether the scheduler is allowed to drive brightness.
#[derive(Debug, PartialEq, Copy, Clone)]
pub enum Mode {
    /// Scheduler recomputes and applies brightness every tick.
    Auto,
    /// User has taken over; scheduler ticks are no-ops.
    Manual,
}

const MODE_AUTO: u8 = 0;
const MODE_MANUAL: u8 = 1;
const LAST_APPLIED_UNSET: i16 = -1;

/// Process-wide mode state, shared between the scheduler loop and the
/// toggle handler via `Arc<ModeState>`.
#[derive(Debug)]
pub struct ModeState {
    mode: AtomicU8,
    last_applied: AtomicI16,
}

impl ModeState {
    /// Create a new state starting in Auto mode with no applied brightness.
    pub fn new() -> Self {
        Self {
            mode: AtomicU8::new(MODE_AUTO),
            last_applied: AtomicI16::new(LAST_APPLIED_UNSET),
        }
    }

    /// Read the current mode.
    pub fn get(&self) -> Mode {
        match self.mode.load(Ordering::SeqCst) {
            MODE_MANUAL => Mode::Manual,
            _ => Mode::Auto,
        }
    }

    /// Flip Auto <-> Manual and return the mode now in effect.
    pub fn toggle(&self) -> Mode {
        // Single writer (the toggle handler), so a load+store pair is safe
        let next = match self.get() {
            Mode::Auto => MODE_MANUAL,
            Mode::Manual => MODE_AUTO,
        };
        self.mode.store(next, Ordering::SeqCst);
        self.get()
    }

    /// Record the brightness the scheduler last applied.
    pub fn record_applied(&self, percent: u8) {
        self.last_applied
            .store(percent.min(100) as i16, Ordering::SeqCst);
    }

    /// The last brightness the scheduler applied, if any tick has run.
    pub fn last_applied(&self) -> Option<u8> {
        match self.last_applied.load(Ordering::SeqCst) {
            LAST_APPLIED_UNSET => None,
            value => Some(value as u8),
        }
    }
}

impl Default for ModeState {
    fn default() -> Self {
        Self::new()
    }
}
