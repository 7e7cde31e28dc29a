use crate::{AccountId, DrawError, Result};
use serde::{Deserialize, Serialize};

/// Identifies the single privileged account and gates operations to it.
/// Composed into the engine at construction rather than inherited.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OwnershipCapability {
    owner: AccountId,
}

impl OwnershipCapability {
    pub fn new(owner: AccountId) -> Self {
        Self { owner }
    }

    pub fn current_owner(&self) -> AccountId {
        self.owner
    }

    pub fn require_owner(&self, caller: AccountId) -> Result<()> {
        if caller != self.owner {
            return Err(DrawError::NotOwner);
        }
        Ok(())
    }
}
