//! Link transport interface
//!
//! The sweep engine never talks to a radio directly; it drives whatever
//! implements [`LinkTransport`]. Implementations exist for the in-memory
//! simulated link (the `mp-sim` crate) and can be written for real
//! hardware behind a serial or SPI bridge.

use crate::config::ChannelConfig;
use crate::error::LinkError;
use crate::token::Token;

/// Per-receive signal quality as reported by the radio
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalQuality {
    /// Received signal strength in dBm
    pub rssi_dbm: i16,
    /// Signal-to-noise ratio in dB
    pub snr_db: f32,
}

impl std::fmt::Display for SignalQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}dBm / {:.1}dB SNR", self.rssi_dbm, self.snr_db)
    }
}

/// A raw inbound message with its signal quality
///
/// Bytes are delivered untouched; token recognition is the engine's job
/// so that noise and foreign traffic can be observed, not just dropped.
#[derive(Debug, Clone)]
pub struct Received {
    /// Raw payload bytes as they came off the air
    pub bytes: Vec<u8>,
    /// Signal quality for this reception
    pub quality: SignalQuality,
}

/// A link that can be retuned, transmit a token, and poll for traffic
///
/// Only one configuration is active at a time; `configure` must complete
/// before any `send` for the new slot. All three operations are
/// best-effort from the engine's point of view: an `Err` is logged and
/// treated as a dropped message, never retried.
pub trait LinkTransport: Send {
    /// Retune the link to the given configuration
    fn configure(&mut self, config: &ChannelConfig) -> Result<(), LinkError>;

    /// Transmit a token under the active configuration
    fn send(&mut self, token: Token) -> Result<(), LinkError>;

    /// Poll for one inbound message, if any is waiting
    fn poll_received(&mut self) -> Result<Option<Received>, LinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_quality_display() {
        let q = SignalQuality {
            rssi_dbm: -97,
            snr_db: 6.25,
        };
        assert_eq!(q.to_string(), "-97dBm / 6.2dB SNR");
    }
}
