//! Late-bound public anchor for winner selection.
//!
//! The original design mixed the revealed seed with the previous block
//! identifier: a value that is public, hard to predict far in advance, and
//! verifiable after the fact by both parties. Outside a chain the anchor
//! must be some equivalently late-bound agreed value (a randomness-beacon
//! round, a published block hash). The trait keeps that choice swappable;
//! it is NOT a secure randomness source and is not meant to become one.

use serde::{Deserialize, Serialize};

/// Supplies the 32-byte public anchor mixed into winner selection.
pub trait EntropySource {
    fn anchor(&self) -> [u8; 32];
}

/// A fixed anchor agreed out of band. Used by tests and the CLI; a
/// production deployment would wrap a beacon lookup instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedEntropy([u8; 32]);

impl FixedEntropy {
    pub fn new(anchor: [u8; 32]) -> Self {
        Self(anchor)
    }

    /// Parse a 64-character hex string into an anchor.
    pub fn from_hex(hex_anchor: &str) -> Option<Self> {
        let bytes = hex::decode(hex_anchor).ok()?;
        let anchor: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(anchor))
    }
}

impl Default for FixedEntropy {
    fn default() -> Self {
        Self([0u8; 32])
    }
}

impl EntropySource for FixedEntropy {
    fn anchor(&self) -> [u8; 32] {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_hex_roundtrip() {
        let source = FixedEntropy::new([0xab; 32]);
        let parsed = FixedEntropy::from_hex(&hex::encode([0xab; 32])).unwrap();
        assert_eq!(source, parsed);
        assert_eq!(parsed.anchor(), [0xab; 32]);
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert!(FixedEntropy::from_hex("abcd").is_none());
        assert!(FixedEntropy::from_hex("not hex at all").is_none());
    }
}
