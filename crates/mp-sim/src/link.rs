//! Simulated link endpoints
//!
//! The air model is deliberately simple and fully deterministic: a
//! transmission reaches the peer exactly when both endpoints are tuned
//! to the same configuration and the configuration's spreading factor is
//! high enough to cover the simulated distance. Everything else is
//! silently lost, which is precisely how the real channel fails.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use mp_protocol::{ChannelConfig, LinkError, LinkTransport, Received, SignalQuality, Token};
use tracing::trace;

/// Behavior of a simulated link pair
#[derive(Debug, Clone)]
pub struct SimLinkConfig {
    /// Minimum spreading factor that still reaches the peer
    ///
    /// Models distance: far apart, only slow high-SF configurations get
    /// through. The default of 0 makes every configuration reachable.
    pub min_spreading_factor: u8,
    /// Signal strength reported for every delivery
    pub rssi_dbm: i16,
    /// Signal-to-noise ratio reported for every delivery
    pub snr_db: f32,
}

impl Default for SimLinkConfig {
    fn default() -> Self {
        Self {
            min_spreading_factor: 0,
            rssi_dbm: -92,
            snr_db: 7.5,
        }
    }
}

/// One endpoint's view of the air
#[derive(Debug, Default)]
struct Endpoint {
    active: Option<ChannelConfig>,
    inbox: VecDeque<Received>,
}

/// Shared state of the air between the two endpoints
#[derive(Debug)]
struct Air {
    config: SimLinkConfig,
    ends: [Endpoint; 2],
}

/// A simulated link endpoint
///
/// Create both ends at once with [`SimLink::pair`]; each implements
/// [`LinkTransport`] and can live on its own task.
#[derive(Debug)]
pub struct SimLink {
    air: Arc<Mutex<Air>>,
    side: usize,
}

impl SimLink {
    /// Create a connected pair of endpoints
    pub fn pair(config: SimLinkConfig) -> (SimLink, SimLink) {
        let air = Arc::new(Mutex::new(Air {
            config,
            ends: [Endpoint::default(), Endpoint::default()],
        }));
        (
            SimLink {
                air: Arc::clone(&air),
                side: 0,
            },
            SimLink { air, side: 1 },
        )
    }

    /// Push raw bytes straight into this endpoint's inbox
    ///
    /// Bypasses the air model; used to simulate noise and foreign
    /// traffic that the protocol must ignore.
    pub fn inject(&self, bytes: &[u8]) {
        let mut air = self.air.lock().expect("air lock");
        let quality = SignalQuality {
            rssi_dbm: air.config.rssi_dbm,
            snr_db: air.config.snr_db,
        };
        air.ends[self.side].inbox.push_back(Received {
            bytes: bytes.to_vec(),
            quality,
        });
    }

    /// Number of messages waiting at this endpoint
    pub fn pending(&self) -> usize {
        self.air.lock().expect("air lock").ends[self.side].inbox.len()
    }
}

impl LinkTransport for SimLink {
    fn configure(&mut self, config: &ChannelConfig) -> Result<(), LinkError> {
        let mut air = self.air.lock().expect("air lock");
        trace!(side = self.side, config = %config.description, "sim retune");
        air.ends[self.side].active = Some(config.clone());
        Ok(())
    }

    fn send(&mut self, token: Token) -> Result<(), LinkError> {
        let mut air = self.air.lock().expect("air lock");
        let peer = 1 - self.side;

        let Some(mine) = air.ends[self.side].active.clone() else {
            return Err(LinkError::NotConfigured);
        };

        // Deliver only when the peer is tuned to the same configuration
        // and the configuration reaches across the simulated distance.
        // A silent drop is correct air behavior, not an error.
        let reaches = mine.spreading_factor >= air.config.min_spreading_factor;
        let peer_matches = air.ends[peer].active.as_ref() == Some(&mine);

        if reaches && peer_matches {
            let quality = SignalQuality {
                rssi_dbm: air.config.rssi_dbm,
                snr_db: air.config.snr_db,
            };
            trace!(side = self.side, %token, "sim delivery");
            air.ends[peer].inbox.push_back(Received {
                bytes: token.encode().to_vec(),
                quality,
            });
        } else {
            trace!(
                side = self.side,
                %token,
                reaches,
                peer_matches,
                "sim drop"
            );
        }
        Ok(())
    }

    fn poll_received(&mut self) -> Result<Option<Received>, LinkError> {
        let mut air = self.air.lock().expect("air lock");
        Ok(air.ends[self.side].inbox.pop_front())
    }
}
