//! Marco/Polo Link Simulation Library
//!
//! An in-memory stand-in for the radio link, used to exercise the sweep
//! protocol end to end without hardware. Two [`SimLink`] endpoints share
//! a simulated air interface: a transmission is delivered to the peer
//! only when both ends are tuned to the same channel configuration and
//! that configuration is reachable at the simulated distance.
//!
//! # Example
//!
//! ```rust
//! use mp_protocol::{ConfigTable, LinkTransport, Token};
//! use mp_sim::{SimLink, SimLinkConfig};
//!
//! let (mut a, mut b) = SimLink::pair(SimLinkConfig::default());
//! let table = ConfigTable::standard();
//!
//! a.configure(table.get(0).unwrap()).unwrap();
//! b.configure(table.get(0).unwrap()).unwrap();
//!
//! a.send(Token::Marco).unwrap();
//! let heard = b.poll_received().unwrap().unwrap();
//! assert_eq!(Token::parse(&heard.bytes), Some(Token::Marco));
//! ```

pub mod link;

pub use link::{SimLink, SimLinkConfig};
