//! Credit ledger collaborator.
//!
//! The engine never implements token semantics itself; it calls into a
//! [`CreditLedger`] for every value movement: minting on purchase, pulling
//! a bettor's stake into the pool account, paying out withdrawals, burning
//! on buy-back. Ledger failures propagate to the engine caller unchanged.

use crate::AccountId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("insufficient balance: need {need}, have {available}")]
    InsufficientBalance { need: u64, available: u64 },

    #[error("insufficient allowance: need {need}, have {available}")]
    InsufficientAllowance { need: u64, available: u64 },

    #[error("balance overflow")]
    BalanceOverflow,
}

/// Contract the engine requires from the external credit ledger.
///
/// `pull_transfer` moves pre-authorized funds toward `to` (the spender);
/// `burn_from` destroys pre-authorized funds on behalf of `spender`;
/// `transfer` moves funds the engine already controls and needs no
/// authorization beyond holding the balance.
pub trait CreditLedger {
    fn mint(&mut self, to: AccountId, amount: u64) -> LedgerResult<()>;

    fn transfer(&mut self, from: AccountId, to: AccountId, amount: u64) -> LedgerResult<()>;

    fn pull_transfer(&mut self, from: AccountId, to: AccountId, amount: u64) -> LedgerResult<()>;

    fn burn_from(&mut self, account: AccountId, spender: AccountId, amount: u64)
        -> LedgerResult<()>;

    fn balance_of(&self, account: AccountId) -> u64;
}

/// Reference in-memory ledger for tests and the CLI deployment.
///
/// Allowances are keyed owner -> spender, ERC-20 style, and are consumed as
/// they are spent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryCreditLedger {
    balances: HashMap<AccountId, u64>,
    allowances: HashMap<AccountId, HashMap<AccountId, u64>>,
}

impl InMemoryCreditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authorize `spender` to pull or burn up to `amount` from `owner`.
    /// Overwrites any prior allowance for the pair.
    pub fn approve(&mut self, owner: AccountId, spender: AccountId, amount: u64) {
        self.allowances.entry(owner).or_default().insert(spender, amount);
        tracing::debug!(%owner, %spender, amount, "allowance set");
    }

    pub fn allowance(&self, owner: AccountId, spender: AccountId) -> u64 {
        self.allowances
            .get(&owner)
            .and_then(|per_spender| per_spender.get(&spender))
            .copied()
            .unwrap_or(0)
    }

    fn debit(&mut self, account: AccountId, amount: u64) -> LedgerResult<()> {
        let balance = self.balances.entry(account).or_insert(0);
        if *balance < amount {
            return Err(LedgerError::InsufficientBalance {
                need: amount,
                available: *balance,
            });
        }
        *balance -= amount;
        Ok(())
    }

    fn credit(&mut self, account: AccountId, amount: u64) -> LedgerResult<()> {
        let balance = self.balances.entry(account).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(LedgerError::BalanceOverflow)?;
        Ok(())
    }

    fn ensure_balance(&self, account: AccountId, amount: u64) -> LedgerResult<()> {
        let available = self.balance_of(account);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                need: amount,
                available,
            });
        }
        Ok(())
    }

    fn ensure_can_receive(&self, account: AccountId, amount: u64) -> LedgerResult<()> {
        self.balance_of(account)
            .checked_add(amount)
            .map(|_| ())
            .ok_or(LedgerError::BalanceOverflow)
    }

    fn spend_allowance(
        &mut self,
        owner: AccountId,
        spender: AccountId,
        amount: u64,
    ) -> LedgerResult<()> {
        let available = self.allowance(owner, spender);
        if available < amount {
            return Err(LedgerError::InsufficientAllowance {
                need: amount,
                available,
            });
        }
        self.allowances
            .entry(owner)
            .or_default()
            .insert(spender, available - amount);
        Ok(())
    }
}

impl CreditLedger for InMemoryCreditLedger {
    fn mint(&mut self, to: AccountId, amount: u64) -> LedgerResult<()> {
        self.credit(to, amount)?;
        tracing::debug!(%to, amount, "minted credits");
        Ok(())
    }

    fn transfer(&mut self, from: AccountId, to: AccountId, amount: u64) -> LedgerResult<()> {
        // Both sides validated before either balance moves; a failed
        // transfer must not leave funds debited or destroyed.
        self.ensure_balance(from, amount)?;
        self.ensure_can_receive(to, amount)?;
        self.debit(from, amount)?;
        self.credit(to, amount)?;
        tracing::debug!(%from, %to, amount, "transferred credits");
        Ok(())
    }

    fn pull_transfer(&mut self, from: AccountId, to: AccountId, amount: u64) -> LedgerResult<()> {
        // Balance and headroom checks come first so a failing pull never
        // consumes the owner's allowance.
        self.ensure_balance(from, amount)?;
        self.ensure_can_receive(to, amount)?;
        self.spend_allowance(from, to, amount)?;
        self.transfer(from, to, amount)
    }

    fn burn_from(
        &mut self,
        account: AccountId,
        spender: AccountId,
        amount: u64,
    ) -> LedgerResult<()> {
        self.ensure_balance(account, amount)?;
        self.spend_allowance(account, spender, amount)?;
        self.debit(account, amount)?;
        tracing::debug!(%account, amount, "burned credits");
        Ok(())
    }

    fn balance_of(&self, account: AccountId) -> u64 {
        self.balances.get(&account).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn mint_and_transfer() {
        let mut ledger = InMemoryCreditLedger::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        ledger.mint(alice, 100).unwrap();
        ledger.transfer(alice, bob, 40).unwrap();

        assert_eq!(ledger.balance_of(alice), 60);
        assert_eq!(ledger.balance_of(bob), 40);
    }

    #[test]
    fn transfer_rejects_overdraft() {
        let mut ledger = InMemoryCreditLedger::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        ledger.mint(alice, 10).unwrap();
        let err = ledger.transfer(alice, bob, 11).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientBalance { need: 11, available: 10 }
        ));
        assert_eq!(ledger.balance_of(alice), 10);
    }

    #[test]
    fn pull_transfer_consumes_allowance() {
        let mut ledger = InMemoryCreditLedger::new();
        let alice = Uuid::new_v4();
        let pool = Uuid::new_v4();

        ledger.mint(alice, 100).unwrap();
        ledger.approve(alice, pool, 30);

        ledger.pull_transfer(alice, pool, 20).unwrap();
        assert_eq!(ledger.allowance(alice, pool), 10);
        assert_eq!(ledger.balance_of(pool), 20);

        let err = ledger.pull_transfer(alice, pool, 20).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientAllowance { need: 20, available: 10 }
        ));
    }

    #[test]
    fn pull_transfer_without_allowance_fails() {
        let mut ledger = InMemoryCreditLedger::new();
        let alice = Uuid::new_v4();
        let pool = Uuid::new_v4();

        ledger.mint(alice, 100).unwrap();
        let err = ledger.pull_transfer(alice, pool, 1).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientAllowance { .. }));
    }

    #[test]
    fn failed_pull_leaves_allowance_intact() {
        let mut ledger = InMemoryCreditLedger::new();
        let alice = Uuid::new_v4();
        let pool = Uuid::new_v4();

        ledger.mint(alice, 5).unwrap();
        ledger.approve(alice, pool, 100);

        let err = ledger.pull_transfer(alice, pool, 11).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientBalance { need: 11, available: 5 }
        ));
        assert_eq!(ledger.allowance(alice, pool), 100);
        assert_eq!(ledger.balance_of(alice), 5);
        assert_eq!(ledger.balance_of(pool), 0);
    }

    #[test]
    fn overflowing_transfer_leaves_sender_intact() {
        let mut ledger = InMemoryCreditLedger::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        ledger.mint(alice, 50).unwrap();
        ledger.mint(bob, u64::MAX).unwrap();

        let err = ledger.transfer(alice, bob, 50).unwrap_err();
        assert!(matches!(err, LedgerError::BalanceOverflow));
        assert_eq!(ledger.balance_of(alice), 50);
        assert_eq!(ledger.balance_of(bob), u64::MAX);
    }

    #[test]
    fn failed_burn_leaves_allowance_intact() {
        let mut ledger = InMemoryCreditLedger::new();
        let alice = Uuid::new_v4();
        let pool = Uuid::new_v4();

        ledger.mint(alice, 5).unwrap();
        ledger.approve(alice, pool, 100);

        let err = ledger.burn_from(alice, pool, 6).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(ledger.allowance(alice, pool), 100);
        assert_eq!(ledger.balance_of(alice), 5);
    }

    #[test]
    fn burn_from_requires_allowance_and_balance() {
        let mut ledger = InMemoryCreditLedger::new();
        let alice = Uuid::new_v4();
        let pool = Uuid::new_v4();

        ledger.mint(alice, 50).unwrap();
        ledger.approve(alice, pool, 100);

        ledger.burn_from(alice, pool, 50).unwrap();
        assert_eq!(ledger.balance_of(alice), 0);

        let err = ledger.burn_from(alice, pool, 1).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
    }
}
