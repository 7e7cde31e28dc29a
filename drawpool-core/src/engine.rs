//! The escrow/draw state machine.
//!
//! One aggregate owns everything: lifecycle flag, pool accounting, slot
//! list, withdrawable prize ledger, and the injected credit-ledger
//! collaborator. Operations take `&mut self`, so the borrow checker is the
//! serialization guarantee the original relied on its runtime for; the
//! flip-before-payout ordering in `close_draw` and the effects-before-
//! ledger-call ordering in the withdrawal paths are kept regardless.

use crate::commitment::{draw_number, SealedSeed};
use crate::entropy::EntropySource;
use crate::ledger::CreditLedger;
use crate::ownership::OwnershipCapability;
use crate::{AccountId, DrawConfig, DrawError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawEngine<L> {
    config: DrawConfig,
    ownership: OwnershipCapability,
    sealed_seed: SealedSeed,
    /// The engine's own account on the credit ledger; holds every pulled
    /// credit until it is withdrawn.
    pool_account: AccountId,
    open: bool,
    closing_time: Option<DateTime<Utc>>,
    prize_pool: u64,
    owner_pool: u64,
    slots: Vec<AccountId>,
    withdrawable: HashMap<AccountId, u64>,
    ledger: L,
}

impl<L: CreditLedger> DrawEngine<L> {
    pub fn new(
        config: DrawConfig,
        ownership: OwnershipCapability,
        sealed_seed: SealedSeed,
        ledger: L,
    ) -> Self {
        let pool_account = Uuid::new_v4();
        tracing::info!(%pool_account, "draw engine created");

        Self {
            config,
            ownership,
            sealed_seed,
            pool_account,
            open: false,
            closing_time: None,
            prize_pool: 0,
            owner_pool: 0,
            slots: Vec::new(),
            withdrawable: HashMap::new(),
            ledger,
        }
    }

    pub fn config(&self) -> &DrawConfig {
        &self.config
    }

    pub fn owner(&self) -> AccountId {
        self.ownership.current_owner()
    }

    pub fn sealed_seed(&self) -> &SealedSeed {
        &self.sealed_seed
    }

    pub fn pool_account(&self) -> AccountId {
        self.pool_account
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn closing_time(&self) -> Option<DateTime<Utc>> {
        self.closing_time
    }

    pub fn prize_pool(&self) -> u64 {
        self.prize_pool
    }

    pub fn owner_pool(&self) -> u64 {
        self.owner_pool
    }

    pub fn slots(&self) -> &[AccountId] {
        &self.slots
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn withdrawable(&self, account: AccountId) -> u64 {
        self.withdrawable.get(&account).copied().unwrap_or(0)
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    /// Open a new draw cycle. Privileged; the closing time must be strictly
    /// in the future and the previous cycle must be closed.
    pub fn open_draw(&mut self, caller: AccountId, closing_time: DateTime<Utc>) -> Result<()> {
        self.ownership.require_owner(caller)?;

        if self.open {
            return Err(DrawError::DrawAlreadyOpen);
        }
        if closing_time <= Utc::now() {
            return Err(DrawError::ClosingTimeInPast);
        }

        self.open = true;
        self.closing_time = Some(closing_time);

        tracing::info!(%closing_time, "draw opened");
        Ok(())
    }

    /// Close the current draw by revealing the committed seed.
    ///
    /// Anyone who knows the seed may close; the commitment check binds the
    /// reveal to the current owner identity, not to the caller. Returns the
    /// winner, or `None` when no slot was filled.
    pub fn close_draw(
        &mut self,
        reveal_seed: &str,
        entropy: &dyn EntropySource,
    ) -> Result<Option<AccountId>> {
        if !self.open {
            return Err(DrawError::DrawNotOpen);
        }
        let closing_time = self.closing_time.ok_or(DrawError::DrawNotOpen)?;
        if Utc::now() < closing_time {
            return Err(DrawError::ClosingTimeNotReached);
        }
        if !self.sealed_seed.verify(self.ownership.current_owner(), reveal_seed) {
            tracing::warn!("close attempt with wrong seed");
            return Err(DrawError::WrongSeed);
        }

        // Irreversible from here: the draw is closed before any payout
        // work, so nothing triggered below can observe an open draw.
        self.open = false;

        if self.slots.is_empty() {
            tracing::info!("draw closed with no slots filled");
            return Ok(None);
        }

        let number = draw_number(&entropy.anchor(), reveal_seed);
        let index = (number % self.slots.len() as u64) as usize;
        let winner = self.slots[index];
        let prize = self.prize_pool;

        // Both sides of this move are internal accounting; no ledger call
        // happens inside a close. Saturation is unreachable for credit
        // totals bounded by ledger supply, and the flip above must not be
        // followed by a failure.
        let balance = self.withdrawable.entry(winner).or_insert(0);
        *balance = balance.saturating_add(prize);
        self.prize_pool = 0;
        self.slots.clear();

        tracing::info!(%winner, index, prize, "draw closed with winner");
        Ok(Some(winner))
    }

    /// Mint credits for `payment` base-currency units at the configured
    /// ratio. Integer division; the remainder is forfeited. Returns the
    /// minted amount.
    pub fn purchase_credits(&mut self, caller: AccountId, payment: u64) -> Result<u64> {
        let minted = payment
            .checked_div(self.config.credit_ratio)
            .ok_or(DrawError::ZeroPurchaseRatio)?;

        self.ledger.mint(caller, minted)?;

        tracing::info!(%caller, payment, minted, "credits purchased");
        Ok(minted)
    }

    /// Buy one slot in the open draw.
    pub fn place_bet(&mut self, caller: AccountId) -> Result<()> {
        self.place_bets(caller, 1)
    }

    /// Buy `times` slots with a single pull of the total stake. Equivalent
    /// to `times` sequential single bets.
    pub fn place_bets(&mut self, caller: AccountId, times: u64) -> Result<()> {
        if times == 0 {
            return Err(DrawError::ZeroBetCount);
        }
        self.require_betting_open()?;

        // Every total is computed with checked arithmetic before any state
        // write; overflow rejects the call outright.
        let slot_cost = self.config.slot_cost().ok_or(DrawError::AmountOverflow)?;
        let total_cost = slot_cost.checked_mul(times).ok_or(DrawError::AmountOverflow)?;
        let fee_total = self
            .config
            .bet_fee
            .checked_mul(times)
            .ok_or(DrawError::AmountOverflow)?;
        let price_total = self
            .config
            .bet_price
            .checked_mul(times)
            .ok_or(DrawError::AmountOverflow)?;
        let owner_pool = self
            .owner_pool
            .checked_add(fee_total)
            .ok_or(DrawError::AmountOverflow)?;
        let prize_pool = self
            .prize_pool
            .checked_add(price_total)
            .ok_or(DrawError::AmountOverflow)?;

        self.ledger
            .pull_transfer(caller, self.pool_account, total_cost)?;

        self.owner_pool = owner_pool;
        self.prize_pool = prize_pool;
        self.slots
            .extend(std::iter::repeat(caller).take(times as usize));

        tracing::info!(%caller, times, total_cost, "bets placed");
        Ok(())
    }

    /// Withdraw winnings accumulated in the caller's prize ledger entry.
    pub fn withdraw_prize(&mut self, caller: AccountId, amount: u64) -> Result<()> {
        let available = self.withdrawable(caller);
        if amount > available {
            return Err(DrawError::InsufficientPrize {
                need: amount,
                available,
            });
        }

        // Internal accounting shrinks before the outbound ledger call.
        self.withdrawable.insert(caller, available - amount);
        self.ledger.transfer(self.pool_account, caller, amount)?;

        tracing::info!(%caller, amount, "prize withdrawn");
        Ok(())
    }

    /// Withdraw accumulated fees to the owner. Privileged.
    pub fn withdraw_owner_pool(&mut self, caller: AccountId, amount: u64) -> Result<()> {
        self.ownership.require_owner(caller)?;

        if amount > self.owner_pool {
            return Err(DrawError::InsufficientOwnerPool {
                need: amount,
                available: self.owner_pool,
            });
        }

        self.owner_pool -= amount;
        self.ledger
            .transfer(self.pool_account, self.ownership.current_owner(), amount)?;

        tracing::info!(amount, "owner pool withdrawn");
        Ok(())
    }

    /// Unconditional buy-back: burn `amount` credits from the caller and
    /// return the base-currency refund owed (`amount * credit_ratio`).
    /// Independent of draw state; credits are not bound to a draw.
    pub fn return_credits(&mut self, caller: AccountId, amount: u64) -> Result<u64> {
        let refund = amount
            .checked_mul(self.config.credit_ratio)
            .ok_or(DrawError::AmountOverflow)?;

        self.ledger.burn_from(caller, self.pool_account, amount)?;

        tracing::info!(%caller, amount, refund, "credits returned");
        Ok(refund)
    }

    /// Winner number for a hypothetical reveal. Pure; exposed for
    /// auditability independent of any close.
    pub fn random_number(&self, reveal_seed: &str, entropy: &dyn EntropySource) -> u64 {
        draw_number(&entropy.anchor(), reveal_seed)
    }

    /// Index the given reveal would select over the current slot list, or
    /// `None` when no slots are filled.
    pub fn winning_index(&self, reveal_seed: &str, entropy: &dyn EntropySource) -> Option<usize> {
        if self.slots.is_empty() {
            return None;
        }
        Some((self.random_number(reveal_seed, entropy) % self.slots.len() as u64) as usize)
    }

    pub fn get_info(&self) -> DrawInfo {
        DrawInfo {
            open: self.open,
            closing_time: self.closing_time,
            prize_pool: self.prize_pool,
            owner_pool: self.owner_pool,
            slot_count: self.slots.len(),
            pool_account: self.pool_account,
            sealed_seed: self.sealed_seed.as_hex().to_string(),
        }
    }

    fn require_betting_open(&self) -> Result<()> {
        let closing_time = match self.closing_time {
            Some(t) if self.open => t,
            _ => return Err(DrawError::DrawClosed),
        };
        if Utc::now() >= closing_time {
            return Err(DrawError::DrawClosed);
        }
        Ok(())
    }
}

/// Snapshot of the draw for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawInfo {
    pub open: bool,
    pub closing_time: Option<DateTime<Utc>>,
    pub prize_pool: u64,
    pub owner_pool: u64,
    pub slot_count: usize,
    pub pool_account: AccountId,
    pub sealed_seed: String,
}
