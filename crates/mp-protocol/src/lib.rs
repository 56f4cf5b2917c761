//! Marco/Polo Link Protocol Library
//!
//! This crate provides the shared vocabulary for the marcopolo link sweep
//! tester: the two-token handshake alphabet, the channel configuration
//! table that both ends sweep through, and the [`LinkTransport`] trait
//! that abstracts the physical radio.
//!
//! # Protocol
//!
//! Two devices probe a radio link by walking the same ordered table of
//! channel configurations (frequency/bandwidth/spreading-factor variants).
//! The Initiator transmits `Marco` on every slot entry; a Responder that
//! hears it replies `Polo` on the same configuration. A completed
//! round-trip on a configuration means that configuration reaches both
//! ways at the current distance.
//!
//! Tokens travel as plain ASCII and are matched on a fixed 5-byte prefix,
//! so `"Polo"` and `"Polo "` (the padded form older firmware sends) parse
//! identically.
//!
//! # Example
//!
//! ```rust
//! use mp_protocol::{ConfigTable, Token};
//!
//! let table = ConfigTable::standard();
//! assert!(table.len() >= 1);
//!
//! assert_eq!(Token::parse(b"Marco"), Some(Token::Marco));
//! assert_eq!(Token::parse(b"Polo "), Some(Token::Polo));
//! assert_eq!(Token::parse(b"\x07garbage"), None);
//! ```

pub mod config;
pub mod error;
pub mod link;
pub mod token;

pub use config::{ChannelConfig, ConfigTable};
pub use error::{LinkError, ProtocolError};
pub use link::{LinkTransport, Received, SignalQuality};
pub use token::Token;

/// Which side of the handshake a device plays
///
/// The role is fixed for the lifetime of one run. The Initiator owns the
/// reference time origin and transmits first in every slot; the Responder
/// must recover that timing from received messages alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Role {
    /// Owns the time origin, transmits `Marco` on every slot entry
    Initiator,
    /// Locks onto the Initiator's timing, answers `Polo`
    Responder,
}

impl Role {
    /// Returns a human-readable name for the role
    pub fn name(&self) -> &'static str {
        match self {
            Role::Initiator => "Initiator",
            Role::Responder => "Responder",
        }
    }

    /// The token this role transmits
    pub fn tx_token(&self) -> Token {
        match self {
            Role::Initiator => Token::Marco,
            Role::Responder => Token::Polo,
        }
    }

    /// The token this role expects to receive
    pub fn rx_token(&self) -> Token {
        match self {
            Role::Initiator => Token::Polo,
            Role::Responder => Token::Marco,
        }
    }
}
