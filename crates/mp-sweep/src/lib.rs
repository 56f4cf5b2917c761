//! Marco/Polo Sweep Engine
//!
//! This crate is the core of the marcopolo link tester: the time-slotted
//! configuration sweep, the Marco/Polo handshake state machine, and the
//! per-configuration success statistics.
//!
//! # Architecture
//!
//! - [`clock`] maps elapsed wall-clock time to a configuration index
//!   (`floor((now - base)/period) mod count`); the Responder re-derives
//!   the Initiator's base time from received messages alone.
//! - [`engine`] holds the per-role state machine. The Initiator transmits
//!   `Marco` on every slot entry; the Responder parks on index 0 until it
//!   hears one, then answers `Polo`, locks onto the Initiator's timing
//!   and sweeps along with it. Prolonged silence falls back to parking.
//! - [`stats`] counts confirmed round-trips per configuration, at most
//!   once per slot visit.
//! - [`runner`] drives an engine from a single tokio task with a
//!   fixed-tick poll; commands in, [`SweepEvent`]s out.
//!
//! # Example
//!
//! ```rust
//! use mp_protocol::{ConfigTable, Role};
//! use mp_sweep::SweepEngine;
//! use mp_sim::{SimLink, SimLinkConfig};
//!
//! let (mut link, _peer) = SimLink::pair(SimLinkConfig::default());
//! let mut engine = SweepEngine::new(ConfigTable::standard(), Role::Initiator, 0);
//!
//! // One control-loop iteration at t=0: enters slot 0, transmits Marco
//! engine.poll(0, &mut link);
//! assert_eq!(engine.active_index(), Some(0));
//! ```

pub mod clock;
pub mod engine;
pub mod events;
pub mod runner;
pub mod state;
pub mod stats;

pub use clock::{SlotClock, MISS_LIMIT_SWEEPS, RESYNC_SKEW_MS, RUN_PERIOD_MS, SYNC_PERIOD_MS};
pub use engine::SweepEngine;
pub use events::SweepEvent;
pub use runner::{run_sweep, RunnerCommand, SweepSnapshot, POLL_INTERVAL_MS};
pub use state::SweepState;
pub use stats::StatsTracker;
