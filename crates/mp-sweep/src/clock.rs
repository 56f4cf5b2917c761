//! Slot clock
//!
//! Maps monotonic elapsed time onto an index into the configuration
//! table. Both ends run this formula independently; the whole protocol
//! rests on the Responder being able to reconstruct the Initiator's base
//! time from a single received message.

/// Dwell time per configuration slot once synchronized, in milliseconds
pub const RUN_PERIOD_MS: u64 = 3000;

/// Dwell time while a Responder is unsynchronized, in milliseconds
///
/// Historically the unsynchronized Responder swept the table with this
/// 16x dwell so its long listening window would overlap the Initiator's
/// short one. The current design parks the unsynchronized Responder on
/// index 0 instead (see [`SlotClock::index_at`]), which is the limit of
/// that behavior: index 0 is the slot the sweep always visits first.
pub const SYNC_PERIOD_MS: u64 = RUN_PERIOD_MS * 16;

/// Fixed skew subtracted when re-deriving the Initiator's base time
///
/// A heard `Marco` was sent at the *start* of the Initiator's slot and
/// spent some air and processing time in flight. Backdating the derived
/// base by one second makes the Responder switch slots slightly early, so
/// it is already listening on a configuration when the Initiator starts
/// transmitting on it.
pub const RESYNC_SKEW_MS: u64 = 1000;

/// A Responder declares sync lost after this many table sweeps' worth of
/// consecutive silent slot entries
pub const MISS_LIMIT_SWEEPS: u32 = 3;

/// The slot index formula: `floor((now - base) / period) mod count`
///
/// `count >= 1` and `period_ms > 0` are guaranteed by construction
/// ([`mp_protocol::ConfigTable`] rejects empty tables). A `now` before
/// `base` saturates to index 0 rather than underflowing.
pub fn slot_index(now_ms: u64, base_ms: u64, period_ms: u64, count: usize) -> usize {
    debug_assert!(count >= 1);
    debug_assert!(period_ms > 0);
    let elapsed = now_ms.saturating_sub(base_ms);
    ((elapsed / period_ms) % count as u64) as usize
}

/// Per-device slot clock state
///
/// Owns the base time and period; the sweep engine asks it for the
/// active index and rebases it on sync events.
#[derive(Debug, Clone)]
pub struct SlotClock {
    base_ms: u64,
    period_ms: u64,
}

impl SlotClock {
    /// Create a clock with its base at `now_ms` and the standard run period
    pub fn new(now_ms: u64) -> Self {
        Self::with_period(now_ms, RUN_PERIOD_MS)
    }

    /// Create a clock with a custom period (tests use short ones)
    pub fn with_period(now_ms: u64, period_ms: u64) -> Self {
        Self {
            base_ms: now_ms,
            period_ms,
        }
    }

    /// The current base time in milliseconds
    pub fn base_ms(&self) -> u64 {
        self.base_ms
    }

    /// The per-slot dwell time in milliseconds
    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    /// Active index at `now_ms`
    ///
    /// A syncing Responder is parked: the index is forced to 0 until a
    /// message is heard, regardless of the formula.
    pub fn index_at(&self, now_ms: u64, count: usize, syncing: bool) -> usize {
        if syncing {
            0
        } else {
            slot_index(now_ms, self.base_ms, self.period_ms, count)
        }
    }

    /// Restart the sweep timeline from `now_ms`
    pub fn rebase(&mut self, now_ms: u64) {
        self.base_ms = now_ms;
    }

    /// Re-derive the Initiator's base time from a message heard at
    /// `now_ms` while configuration `index` is active
    ///
    /// The Initiator transmitted at the start of its slot `index`, so its
    /// base must be `now - period * index`, backdated by the fixed skew.
    pub fn resync(&mut self, now_ms: u64, index: usize) {
        self.base_ms = now_ms
            .saturating_sub(self.period_ms * index as u64)
            .saturating_sub(RESYNC_SKEW_MS);
    }
}
