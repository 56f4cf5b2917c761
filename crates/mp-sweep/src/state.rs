//! Sweep state
//!
//! One owned value holding everything that changes during a run. It is
//! mutated only from the engine's tick and receive handlers, which the
//! single control loop never interleaves.

use mp_protocol::Role;

/// Mutable per-run sweep state
#[derive(Debug, Clone)]
pub struct SweepState {
    /// Currently active configuration index; `None` before the first tick
    pub active: Option<usize>,
    /// Completed-sweep counter; round 0 is the uncounted warm-up
    pub round: u32,
    /// Responder has not yet locked onto the Initiator's timing
    pub syncing: bool,
    /// Consecutive slot entries without a qualifying receive
    pub misses: u32,
    /// A success has already been recorded for the current slot visit
    pub scored_this_slot: bool,
}

impl SweepState {
    /// Initial state for a role
    ///
    /// The Initiator defines time and is therefore never syncing; a
    /// Responder starts unsynchronized.
    pub fn new(role: Role) -> Self {
        Self {
            active: None,
            round: 0,
            syncing: role == Role::Responder,
            misses: 0,
            scored_this_slot: false,
        }
    }
}
