//! Error types for configuration and link transports

use thiserror::Error;

/// Errors in protocol-level data (configuration table, indices)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The configuration table has no entries
    ///
    /// Fatal at startup: the slot clock divides by the table length, so
    /// the tester refuses to run with nothing to sweep.
    #[error("configuration table is empty")]
    EmptyConfigTable,

    /// A configuration index outside the table
    #[error("configuration index {index} out of range (table has {count} entries)")]
    InvalidConfigIndex { index: usize, count: usize },
}

/// Errors reported by a link transport
///
/// These are surfaced to callers but treated as dropped traffic by the
/// sweep engine: a failed send is indistinguishable from a message lost
/// over the air, and the protocol already tolerates loss.
#[derive(Debug, Error)]
pub enum LinkError {
    /// No configuration has been applied yet
    #[error("transport has no active configuration")]
    NotConfigured,

    /// The transport could not transmit
    #[error("transmit failed: {0}")]
    TxFailed(String),

    /// The transport could not service a receive poll
    #[error("receive failed: {0}")]
    RxFailed(String),

    /// Underlying I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
