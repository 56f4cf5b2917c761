//! Handshake token vocabulary
//!
//! The link carries exactly two messages: `Marco` (Initiator probe) and
//! `Polo` (Responder answer). They are a closed enumeration rather than
//! free-form strings so that matching is exhaustive and the historical
//! 5-byte truncation lives in exactly one place.

/// Number of bytes a received message is matched on
///
/// Legacy firmware compares `substring(0, 5)` of whatever arrives and pads
/// its `Polo` reply to five characters. Anything past the prefix is
/// ignored on receive.
pub const TOKEN_PREFIX_LEN: usize = 5;

/// The two-token handshake vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Token {
    /// Initiator probe, sent on every slot entry
    Marco,
    /// Responder answer to a heard `Marco`
    Polo,
}

impl Token {
    /// The token's canonical text form
    pub fn as_str(&self) -> &'static str {
        match self {
            Token::Marco => "Marco",
            Token::Polo => "Polo",
        }
    }

    /// Wire encoding of the token
    pub fn encode(&self) -> &'static [u8] {
        self.as_str().as_bytes()
    }

    /// Try to recognize a token in raw received bytes
    ///
    /// Only the first [`TOKEN_PREFIX_LEN`] bytes are considered; trailing
    /// space/NUL padding inside the prefix is ignored. Returns `None` for
    /// anything else, including empty and truncated input.
    pub fn parse(bytes: &[u8]) -> Option<Token> {
        let prefix = &bytes[..bytes.len().min(TOKEN_PREFIX_LEN)];
        let trimmed = trim_padding(prefix);

        match trimmed {
            b"Marco" => Some(Token::Marco),
            b"Polo" => Some(Token::Polo),
            _ => None,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strip trailing space and NUL padding from a prefix slice
fn trim_padding(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map(|p| p + 1)
        .unwrap_or(0);
    &bytes[..end]
}
