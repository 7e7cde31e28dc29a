use crate::ledger::LedgerError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DrawError>;

/// Coarse classification of a [`DrawError`], useful when callers only care
/// which precondition family was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    State,
    Authorization,
    InsufficientFunds,
}

#[derive(Error, Debug)]
pub enum DrawError {
    #[error("closing time must be in the future")]
    ClosingTimeInPast,

    #[error("credit purchase ratio must be greater than zero")]
    ZeroPurchaseRatio,

    #[error("bet count must be greater than zero")]
    ZeroBetCount,

    #[error("amount overflow")]
    AmountOverflow,

    #[error("draw is closed")]
    DrawClosed,

    #[error("draw is not open")]
    DrawNotOpen,

    #[error("draw is already open")]
    DrawAlreadyOpen,

    #[error("closing time has not been reached")]
    ClosingTimeNotReached,

    #[error("caller is not the draw owner")]
    NotOwner,

    #[error("revealed seed does not match the sealed commitment")]
    WrongSeed,

    #[error("insufficient prize balance: need {need}, have {available}")]
    InsufficientPrize { need: u64, available: u64 },

    #[error("insufficient owner pool: need {need}, have {available}")]
    InsufficientOwnerPool { need: u64, available: u64 },

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl DrawError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DrawError::ClosingTimeInPast
            | DrawError::ZeroPurchaseRatio
            | DrawError::ZeroBetCount
            | DrawError::AmountOverflow
            | DrawError::Ledger(LedgerError::BalanceOverflow) => ErrorKind::Validation,

            DrawError::DrawClosed
            | DrawError::DrawNotOpen
            | DrawError::DrawAlreadyOpen
            | DrawError::ClosingTimeNotReached => ErrorKind::State,

            DrawError::NotOwner | DrawError::WrongSeed => ErrorKind::Authorization,

            DrawError::InsufficientPrize { .. }
            | DrawError::InsufficientOwnerPool { .. }
            | DrawError::Ledger(_) => ErrorKind::InsufficientFunds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_errors_classify_by_cause() {
        // An overflow is malformed input, not a funds shortfall.
        assert_eq!(
            DrawError::Ledger(LedgerError::BalanceOverflow).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            DrawError::Ledger(LedgerError::InsufficientBalance { need: 1, available: 0 }).kind(),
            ErrorKind::InsufficientFunds
        );
        assert_eq!(
            DrawError::Ledger(LedgerError::InsufficientAllowance { need: 1, available: 0 }).kind(),
            ErrorKind::InsufficientFunds
        );
    }
}
