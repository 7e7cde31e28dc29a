//! Seed commitment and winner-number derivation.
//!
//! The commitment binds the privileged account's identity to a secret seed:
//! `sha256(owner_id || seed)`, published at construction. Closing a draw
//! requires revealing the seed; anyone who knows it can close (and predict
//! the winner). The winner number mixes the revealed seed with a late-bound
//! public anchor supplied by an [`EntropySource`](crate::EntropySource).
//! This is commit-reveal with a documented weakness, not a secure beacon.

use crate::AccountId;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One-way commitment over the owner identity and a secret seed string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedSeed(String);

impl SealedSeed {
    /// Seal `seed` under `owner`, producing the hex digest published with
    /// the draw.
    pub fn seal(owner: AccountId, seed: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(owner.as_bytes());
        hasher.update(seed.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Check a revealed seed against the commitment. The check binds to the
    /// owner identity supplied here, so a commitment sealed under a previous
    /// owner stops verifying if ownership changes.
    pub fn verify(&self, owner: AccountId, seed: &str) -> bool {
        Self::seal(owner, seed) == *self
    }

    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

/// Fresh 32-byte random seed, hex encoded. Convenience for operators; the
/// engine never generates seeds itself.
pub fn generate_seed() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Deterministic winner number: first 8 bytes of
/// `sha256(anchor || revealed_seed)` as a big-endian u64. Predictable by
/// anyone who knows the seed once the anchor is public.
pub fn draw_number(anchor: &[u8; 32], revealed_seed: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(anchor);
    hasher.update(revealed_seed.as_bytes());
    let digest = hasher.finalize();

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}
