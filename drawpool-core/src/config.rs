use crate::{DrawError, Result};
use serde::{Deserialize, Serialize};

/// Construction-time draw parameters. Immutable for the lifetime of the
/// engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DrawConfig {
    /// Base-currency units paid per credit minted.
    pub credit_ratio: u64,
    /// Credits charged into the prize pool per slot.
    pub bet_price: u64,
    /// Credits charged into the owner pool per slot.
    pub bet_fee: u64,
}

impl DrawConfig {
    /// `credit_ratio` must be nonzero: `purchase_credits` divides by it and
    /// `return_credits` multiplies by it.
    pub fn new(credit_ratio: u64, bet_price: u64, bet_fee: u64) -> Result<Self> {
        if credit_ratio == 0 {
            return Err(DrawError::ZeroPurchaseRatio);
        }

        Ok(Self {
            credit_ratio,
            bet_price,
            bet_fee,
        })
    }

    /// Credits pulled from a bettor per slot (prize share plus fee).
    pub fn slot_cost(&self) -> Option<u64> {
        self.bet_price.checked_add(self.bet_fee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_ratio() {
        let err = DrawConfig::new(0, 10, 1).unwrap_err();
        assert!(matches!(err, DrawError::ZeroPurchaseRatio));
    }

    #[test]
    fn slot_cost_sums_price_and_fee() {
        let config = DrawConfig::new(100, 10, 1).unwrap();
        assert_eq!(config.slot_cost(), Some(11));
    }
}
