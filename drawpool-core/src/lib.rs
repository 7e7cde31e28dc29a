//! Pooled-wagering draw engine.
//!
//! Participants buy a fungible credit, spend it on slots in a draw, and a
//! single winner selected at close time receives the accumulated pool.
//! Closing requires revealing a seed committed at construction; the winner
//! number mixes that seed with a public late-bound anchor, so whoever knows
//! the seed can predict the outcome. That weakness is the documented
//! security model, not an oversight.

pub mod commitment;
pub mod config;
pub mod engine;
pub mod entropy;
pub mod error;
pub mod ledger;
pub mod ownership;

pub use commitment::{draw_number, generate_seed, SealedSeed};
pub use config::DrawConfig;
pub use engine::{DrawEngine, DrawInfo};
pub use entropy::{EntropySource, FixedEntropy};
pub use error::{DrawError, ErrorKind, Result};
pub use ledger::{CreditLedger, InMemoryCreditLedger, LedgerError, LedgerResult};
pub use ownership::OwnershipCapability;

use uuid::Uuid;

/// Identity of a participant, the owner, or the engine's pool account on
/// the credit ledger.
pub type AccountId = Uuid;
