//! Sweep engine
//!
//! The handshake state machine for one end of the link. It owns the
//! configuration table, the slot clock, the sweep state and the success
//! statistics; everything observable comes out as [`SweepEvent`]s.
//!
//! The engine is runtime-agnostic: callers feed it a monotonic
//! millisecond timestamp and a [`LinkTransport`]. One [`SweepEngine::poll`]
//! call performs slot-transition processing and then at most one receive,
//! so the two are never interleaved mid-step.

use mp_protocol::{ConfigTable, LinkTransport, Received, Role, Token};
use tracing::{debug, info, warn};

use crate::clock::{SlotClock, MISS_LIMIT_SWEEPS};
use crate::events::SweepEvent;
use crate::state::SweepState;
use crate::stats::StatsTracker;

/// Handshake state machine for one device
pub struct SweepEngine {
    table: ConfigTable,
    role: Role,
    clock: SlotClock,
    state: SweepState,
    stats: StatsTracker,
    event_buffer: Vec<SweepEvent>,
}

impl SweepEngine {
    /// Create an engine at `now_ms` with the standard run period
    pub fn new(table: ConfigTable, role: Role, now_ms: u64) -> Self {
        let stats = StatsTracker::new(table.len());
        Self {
            table,
            role,
            clock: SlotClock::new(now_ms),
            state: SweepState::new(role),
            stats,
            event_buffer: Vec::new(),
        }
    }

    /// One control-loop iteration: tick the slot clock, then poll the
    /// link for at most one inbound message
    pub fn poll<L: LinkTransport>(&mut self, now_ms: u64, link: &mut L) {
        self.tick(now_ms, link);

        match link.poll_received() {
            Ok(Some(received)) => self.handle_received(now_ms, &received, link),
            Ok(None) => {}
            Err(e) => {
                warn!("receive poll failed: {}", e);
                self.event_buffer.push(SweepEvent::LinkFault {
                    operation: "poll",
                    message: e.to_string(),
                });
            }
        }
    }

    /// Advance the slot clock and process a slot transition if one is due
    pub fn tick<L: LinkTransport>(&mut self, now_ms: u64, link: &mut L) {
        let count = self.table.len();
        let index = self.clock.index_at(now_ms, count, self.state.syncing);

        if self.state.active == Some(index) {
            return;
        }
        let previous = self.state.active;

        // Round bookkeeping: a wrap from the last entry back to 0 closes
        // one full sweep, but only once we are actually tracking time.
        if previous == Some(count - 1) && index == 0 && !self.state.syncing {
            self.state.round += 1;
            info!(round = self.state.round, "sweep round completed");
            self.event_buffer.push(SweepEvent::RoundCompleted {
                round: self.state.round,
            });
        }

        self.state.active = Some(index);
        self.state.scored_this_slot = false;

        let Some(config) = self.table.get(index) else {
            // Unreachable: index comes from the clock, which is bounded
            // by the table length.
            return;
        };

        debug!(
            from = ?previous,
            to = index,
            config = %config.description,
            "slot transition"
        );
        self.event_buffer.push(SweepEvent::SlotChanged {
            from: previous,
            to: index,
            description: config.description.clone(),
            round: self.state.round,
            slot_count: self.stats.get(index),
        });

        // Retune before any transmit for the new slot. A failure is a
        // dropped message, not a fatal condition.
        if let Err(e) = link.configure(config) {
            warn!("reconfigure for index {} failed: {}", index, e);
            self.event_buffer.push(SweepEvent::LinkFault {
                operation: "configure",
                message: e.to_string(),
            });
        }

        match self.role {
            Role::Initiator => self.send_token(Token::Marco, index, link),
            Role::Responder => {
                // A parked (syncing) Responder sees no transitions, so
                // misses only accumulate while sweeping live.
                if !self.state.syncing {
                    self.state.misses += 1;
                    if self.state.misses > MISS_LIMIT_SWEEPS * count as u32 {
                        info!(
                            misses = self.state.misses,
                            "no traffic heard, falling back to sync search"
                        );
                        self.event_buffer.push(SweepEvent::SyncLost {
                            misses: self.state.misses,
                        });
                        self.state.syncing = true;
                        self.state.misses = 0;
                        self.clock.rebase(now_ms);
                    }
                }
            }
        }
    }

    /// Interpret one inbound message
    pub fn handle_received<L: LinkTransport>(
        &mut self,
        now_ms: u64,
        received: &Received,
        link: &mut L,
    ) {
        let expected = self.role.rx_token();
        let token = Token::parse(&received.bytes);

        let Some(index) = self.state.active else {
            // Traffic before the first tick has no slot to attribute it
            // to; note the activity and move on.
            self.event_buffer.push(SweepEvent::Activity {
                bytes: received.bytes.clone(),
                quality: received.quality,
            });
            return;
        };

        if token != Some(expected) {
            // Noise, a foreign reply, or our own token echoed back.
            // Activity for indicator purposes only.
            debug!(bytes = ?received.bytes, "ignoring non-matching message");
            self.event_buffer.push(SweepEvent::Activity {
                bytes: received.bytes.clone(),
                quality: received.quality,
            });
            return;
        }

        match self.role {
            Role::Initiator => {
                // Round-trip confirmed. Round 0 is the warm-up sweep and
                // stays uncounted.
                if self.state.round > 0 && !self.state.scored_this_slot {
                    self.stats.record(index);
                    self.state.scored_this_slot = true;
                }
                self.state.misses = 0;
            }
            Role::Responder => {
                // Answer first, single transmit, no retry.
                self.send_token(Token::Polo, index, link);

                if !self.state.scored_this_slot {
                    self.stats.record(index);
                    self.state.scored_this_slot = true;
                }

                // The Initiator is transmitting in its own slot `index`
                // right now; re-derive its base time from that.
                self.clock.resync(now_ms, index);
                if self.state.syncing {
                    self.state.syncing = false;
                    info!(index, "acquired sync");
                    self.event_buffer.push(SweepEvent::SyncAcquired { index });
                }
                self.state.misses = 0;
            }
        }

        self.event_buffer.push(SweepEvent::TokenReceived {
            role: self.role,
            index,
            token: expected,
            quality: received.quality,
            slot_count: self.stats.get(index),
        });
    }

    /// Operator reset: zero the statistics and start a fresh counted run
    ///
    /// Timing continuity is preserved; the base time and active index are
    /// untouched so the sweep keeps running through the reset.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
        self.state.round = 1;
        self.state.misses = 0;
        self.state.scored_this_slot = false;
        info!("statistics reset, starting round 1");
        self.event_buffer.push(SweepEvent::StatsReset);
    }

    /// Drain pending events
    pub fn drain_events(&mut self) -> Vec<SweepEvent> {
        std::mem::take(&mut self.event_buffer)
    }

    /// This engine's role
    pub fn role(&self) -> Role {
        self.role
    }

    /// The configuration table being swept
    pub fn table(&self) -> &ConfigTable {
        &self.table
    }

    /// Currently active configuration index
    pub fn active_index(&self) -> Option<usize> {
        self.state.active
    }

    /// Current round counter
    pub fn round(&self) -> u32 {
        self.state.round
    }

    /// Whether a Responder is still searching for the Initiator's timing
    pub fn is_syncing(&self) -> bool {
        self.state.syncing
    }

    /// Consecutive silent slot entries
    pub fn misses(&self) -> u32 {
        self.state.misses
    }

    /// Success statistics
    pub fn stats(&self) -> &StatsTracker {
        &self.stats
    }

    /// Base time of the slot clock, for sync inspection
    pub fn base_ms(&self) -> u64 {
        self.clock.base_ms()
    }

    /// Best-effort token transmit with fault logging
    fn send_token<L: LinkTransport>(&mut self, token: Token, index: usize, link: &mut L) {
        match link.send(token) {
            Ok(()) => {
                self.event_buffer.push(SweepEvent::TokenSent { index, token });
            }
            Err(e) => {
                warn!("transmit of {} failed: {}", token, e);
                self.event_buffer.push(SweepEvent::LinkFault {
                    operation: "send",
                    message: e.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{RESYNC_SKEW_MS, RUN_PERIOD_MS};
    use mp_protocol::{ChannelConfig, LinkError, SignalQuality};
    use std::collections::VecDeque;

    /// Scripted transport that records outbound traffic
    #[derive(Default)]
    struct RecordingLink {
        configured: Vec<String>,
        sent: Vec<Token>,
        inbox: VecDeque<Received>,
        fail_send: bool,
    }

    impl LinkTransport for RecordingLink {
        fn configure(&mut self, config: &ChannelConfig) -> Result<(), LinkError> {
            self.configured.push(config.name.clone());
            Ok(())
        }

        fn send(&mut self, token: Token) -> Result<(), LinkError> {
            if self.fail_send {
                return Err(LinkError::TxFailed("tx blocked".into()));
            }
            self.sent.push(token);
            Ok(())
        }

        fn poll_received(&mut self) -> Result<Option<Received>, LinkError> {
            Ok(self.inbox.pop_front())
        }
    }

    fn quality() -> SignalQuality {
        SignalQuality {
            rssi_dbm: -90,
            snr_db: 5.0,
        }
    }

    fn received(bytes: &[u8]) -> Received {
        Received {
            bytes: bytes.to_vec(),
            quality: quality(),
        }
    }

    fn table4() -> ConfigTable {
        let entries = (0..4u8)
            .map(|i| {
                ChannelConfig::new(format!("c{}", i), format!("cfg {}", i), 868_000_000, 125_000, 7 + i)
            })
            .collect();
        ConfigTable::new(entries, 2).unwrap()
    }

    #[test]
    fn test_initiator_sends_marco_on_every_slot_entry() {
        let mut link = RecordingLink::default();
        let mut engine = SweepEngine::new(table4(), Role::Initiator, 0);

        for t in [0, 3000, 6000, 9000, 12_000] {
            engine.tick(t, &mut link);
        }

        assert_eq!(link.sent, vec![Token::Marco; 5]);
        assert_eq!(link.configured, vec!["c0", "c1", "c2", "c3", "c0"]);
    }

    #[test]
    fn test_no_transition_within_slot() {
        let mut link = RecordingLink::default();
        let mut engine = SweepEngine::new(table4(), Role::Initiator, 0);

        engine.tick(0, &mut link);
        engine.tick(1000, &mut link);
        engine.tick(2999, &mut link);

        assert_eq!(link.sent.len(), 1);
        assert_eq!(engine.active_index(), Some(0));
    }

    #[test]
    fn test_initiator_round_increments_on_wrap() {
        let mut link = RecordingLink::default();
        let mut engine = SweepEngine::new(table4(), Role::Initiator, 0);

        for t in (0..=24_000).step_by(3000) {
            engine.tick(t, &mut link);
        }

        // Wraps at t=12000 and t=24000
        assert_eq!(engine.round(), 2);
        let rounds: Vec<_> = engine
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SweepEvent::RoundCompleted { .. }))
            .collect();
        assert_eq!(rounds.len(), 2);
    }

    #[test]
    fn test_initiator_warmup_round_uncounted() {
        let mut link = RecordingLink::default();
        let mut engine = SweepEngine::new(table4(), Role::Initiator, 0);

        engine.tick(0, &mut link);
        engine.handle_received(100, &received(b"Polo"), &mut link);
        assert_eq!(engine.stats().total(), 0);

        // After the first wrap the round is live and replies count
        for t in (3000..=12_000).step_by(3000) {
            engine.tick(t, &mut link);
        }
        assert_eq!(engine.round(), 1);
        engine.handle_received(12_100, &received(b"Polo"), &mut link);
        assert_eq!(engine.stats().get(0), 1);
    }

    #[test]
    fn test_stats_score_at_most_once_per_slot() {
        let mut link = RecordingLink::default();
        let mut engine = SweepEngine::new(table4(), Role::Responder, 0);

        engine.tick(0, &mut link);
        for _ in 0..10 {
            engine.handle_received(500, &received(b"Marco"), &mut link);
        }
        assert_eq!(engine.stats().get(0), 1);

        // A new slot visit may score again
        engine.tick(engine.base_ms() + RUN_PERIOD_MS, &mut link);
        engine.handle_received(engine.base_ms() + RUN_PERIOD_MS + 1, &received(b"Marco"), &mut link);
        assert_eq!(engine.stats().get(1), 1);
    }

    #[test]
    fn test_responder_replies_polo_and_resyncs() {
        let mut link = RecordingLink::default();
        let mut engine = SweepEngine::new(table4(), Role::Responder, 0);

        engine.tick(0, &mut link);
        assert!(engine.is_syncing());
        assert_eq!(engine.active_index(), Some(0));
        assert!(link.sent.is_empty());

        engine.handle_received(48_000, &received(b"Marco"), &mut link);

        assert_eq!(link.sent, vec![Token::Polo]);
        assert!(!engine.is_syncing());
        assert_eq!(engine.base_ms(), 48_000 - RESYNC_SKEW_MS);
        assert_eq!(engine.stats().get(0), 1);

        let events = engine.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, SweepEvent::SyncAcquired { index: 0 })));
    }

    #[test]
    fn test_responder_ignores_noise() {
        let mut link = RecordingLink::default();
        let mut engine = SweepEngine::new(table4(), Role::Responder, 0);

        engine.tick(0, &mut link);
        let misses_before = engine.misses();
        engine.handle_received(100, &received(b"\xDE\xAD\xBE\xEF"), &mut link);

        assert!(link.sent.is_empty());
        assert_eq!(engine.stats().total(), 0);
        assert_eq!(engine.misses(), misses_before);
        assert!(engine.is_syncing());
        assert!(engine
            .drain_events()
            .iter()
            .any(|e| matches!(e, SweepEvent::Activity { .. })));
    }

    #[test]
    fn test_responder_ignores_foreign_polo() {
        let mut link = RecordingLink::default();
        let mut engine = SweepEngine::new(table4(), Role::Responder, 0);

        engine.tick(0, &mut link);
        engine.handle_received(100, &received(b"Polo "), &mut link);

        // A Polo is not what a Responder answers to
        assert!(link.sent.is_empty());
        assert_eq!(engine.stats().total(), 0);
        assert!(engine.is_syncing());
    }

    #[test]
    fn test_responder_desync_fallback() {
        let mut link = RecordingLink::default();
        let mut engine = SweepEngine::new(table4(), Role::Responder, 0);

        // Lock first
        engine.tick(0, &mut link);
        engine.handle_received(0, &received(b"Marco"), &mut link);
        assert!(!engine.is_syncing());

        // Then nothing but silence: 3 * count transitions are tolerated,
        // the one after that triggers the fallback
        let base = engine.base_ms();
        let mut t = base;
        for _ in 0..13 {
            t += RUN_PERIOD_MS;
            engine.tick(t, &mut link);
        }

        assert!(engine.is_syncing());
        assert_eq!(engine.base_ms(), t);
        let events = engine.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, SweepEvent::SyncLost { misses: 13 })));

        // Next tick parks on index 0
        engine.tick(t + 1, &mut link);
        assert_eq!(engine.active_index(), Some(0));
    }

    #[test]
    fn test_operator_reset() {
        let mut link = RecordingLink::default();
        let mut engine = SweepEngine::new(table4(), Role::Responder, 0);

        engine.tick(0, &mut link);
        engine.handle_received(0, &received(b"Marco"), &mut link);
        let base = engine.base_ms();
        let active = engine.active_index();
        assert!(engine.stats().total() > 0);

        engine.reset_stats();

        assert_eq!(engine.stats().counts(), &[0, 0, 0, 0]);
        assert_eq!(engine.round(), 1);
        assert_eq!(engine.misses(), 0);
        // Timing continuity preserved
        assert_eq!(engine.base_ms(), base);
        assert_eq!(engine.active_index(), active);
        assert!(engine
            .drain_events()
            .iter()
            .any(|e| matches!(e, SweepEvent::StatsReset)));
    }

    #[test]
    fn test_send_fault_is_nonfatal() {
        let mut link = RecordingLink {
            fail_send: true,
            ..Default::default()
        };
        let mut engine = SweepEngine::new(table4(), Role::Initiator, 0);

        engine.tick(0, &mut link);

        let events = engine.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, SweepEvent::LinkFault { operation: "send", .. })));
        // Engine keeps sweeping
        engine.tick(3000, &mut link);
        assert_eq!(engine.active_index(), Some(1));
    }

    #[test]
    fn test_slot_changed_event_contents() {
        let mut link = RecordingLink::default();
        let mut engine = SweepEngine::new(table4(), Role::Initiator, 0);

        engine.tick(0, &mut link);
        engine.tick(3000, &mut link);

        let slots: Vec<_> = engine
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                SweepEvent::SlotChanged { from, to, .. } => Some((from, to)),
                _ => None,
            })
            .collect();
        assert_eq!(slots, vec![(None, 0), (Some(0), 1)]);
    }
}
