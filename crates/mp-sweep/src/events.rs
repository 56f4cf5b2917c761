//! Unified event stream for the sweep engine
//!
//! Everything a display or log sink needs to know comes out of the
//! engine as events: slot transitions, token traffic, sync changes and
//! transport faults. Rendering is entirely the consumer's concern.

use mp_protocol::{Role, SignalQuality, Token};

/// Events emitted by the sweep engine
#[derive(Debug, Clone)]
pub enum SweepEvent {
    /// The active configuration slot changed
    SlotChanged {
        /// Previous index; `None` on the first slot entry of a run
        from: Option<usize>,
        /// Newly active index
        to: usize,
        /// Description of the new configuration
        description: String,
        /// Current round counter
        round: u32,
        /// Success count already recorded for the new index
        slot_count: u64,
    },

    /// A token was transmitted
    TokenSent {
        /// Active index at transmit time
        index: usize,
        /// The token that went out
        token: Token,
    },

    /// A qualifying token was received
    TokenReceived {
        /// Role of the receiving end
        role: Role,
        /// Active index at receive time
        index: usize,
        /// The recognized token
        token: Token,
        /// Signal quality for this reception
        quality: SignalQuality,
        /// Running success count for the active index
        slot_count: u64,
    },

    /// Inbound bytes that did not match the expected token
    ///
    /// Noise, a foreign reply, or our own echo. Indicator activity only:
    /// no reply, no counting, no resync, no miss-counter change.
    Activity {
        /// Raw bytes as received
        bytes: Vec<u8>,
        /// Signal quality for this reception
        quality: SignalQuality,
    },

    /// A Responder locked onto the Initiator's timing
    SyncAcquired {
        /// Index the lock was acquired on
        index: usize,
    },

    /// A Responder gave up on its lock after too many silent slots
    SyncLost {
        /// Silent slot entries accumulated before the fallback
        misses: u32,
    },

    /// The active index wrapped back to 0 outside of syncing
    RoundCompleted {
        /// The round just entered
        round: u32,
    },

    /// Operator reset: counters zeroed, fresh measurement run
    StatsReset,

    /// A transport operation failed and was treated as a dropped message
    LinkFault {
        /// Which operation failed
        operation: &'static str,
        /// Transport's error text
        message: String,
    },
}

impl SweepEvent {
    /// Check if this is a traffic event (something went over the air)
    pub fn is_traffic(&self) -> bool {
        matches!(
            self,
            SweepEvent::TokenSent { .. }
                | SweepEvent::TokenReceived { .. }
                | SweepEvent::Activity { .. }
        )
    }

    /// Check if this is a sync lifecycle event
    pub fn is_sync(&self) -> bool {
        matches!(
            self,
            SweepEvent::SyncAcquired { .. } | SweepEvent::SyncLost { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_classification() {
        let sent = SweepEvent::TokenSent {
            index: 0,
            token: Token::Marco,
        };
        assert!(sent.is_traffic());
        assert!(!sent.is_sync());

        let lost = SweepEvent::SyncLost { misses: 12 };
        assert!(lost.is_sync());
        assert!(!lost.is_traffic());

        let slot = SweepEvent::SlotChanged {
            from: None,
            to: 0,
            description: "SF7 BW125".into(),
            round: 0,
            slot_count: 0,
        };
        assert!(!slot.is_traffic());
        assert!(!slot.is_sync());
    }
}
