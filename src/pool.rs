use near_sdk::{near, require, store::IterableMap, AccountId};

use crate::utils::{pow10, ppm_of};

/// Withdraw fee kept by the pool, in ppm of the withdrawn slice.
pub const WITHDRAW_FEE_PPM: u128 = 1_000;

/// Prize pool ledger: the JKPT owned by the lottery plus the LP shares
/// minted against it. Shares are denominated in JKPT base units.
#[near(serializers = [borsh])]
pub struct PrizePool {
    jkpt: u128,
    lp_total: u128,
    lp_balances: IterableMap<AccountId, u128>,
}

impl PrizePool {
    pub fn new() -> Self {
        Self {
            jkpt: 0,
            lp_total: 0,
            lp_balances: IterableMap::new(b"l"),
        }
    }

    pub fn jkpt(&self) -> u128 {
        self.jkpt
    }

    pub fn lp_total(&self) -> u128 {
        self.lp_total
    }

    pub fn lp_balance_of(&self, account_id: &AccountId) -> u128 {
        self.lp_balances.get(account_id).copied().unwrap_or(0)
    }

    /// Adds JKPT without minting shares (play inflows, direct top-ups).
    pub fn credit(&mut self, amount: u128) {
        self.jkpt += amount;
    }

    /// Pays a reward out of the pool, capped at the pool balance.
    pub fn debit_reward(&mut self, amount: u128) -> u128 {
        let paid = amount.min(self.jkpt);
        self.jkpt -= paid;
        paid
    }

    /// Deposits JKPT for `account_id` and mints LP shares: one share per
    /// base unit while the pool is empty, pro rata afterwards.
    pub fn deposit(&mut self, account_id: &AccountId, amount: u128) -> u128 {
        require!(amount > 0, "deposit amount must be positive");
        let minted = if self.lp_total == 0 || self.jkpt == 0 {
            amount
        } else {
            self.lp_total * amount / self.jkpt
        };
        self.jkpt += amount;
        self.lp_total += minted;
        let balance = self.lp_balance_of(account_id);
        self.lp_balances.insert(account_id.clone(), balance + minted);
        minted
    }

    /// Burns `lp_amount` shares and returns the JKPT payout after the
    /// withdraw fee. The fee stays in the pool for the remaining holders.
    pub fn withdraw(&mut self, account_id: &AccountId, lp_amount: u128) -> u128 {
        require!(lp_amount > 0, "withdrawal amount must be positive");
        let balance = self.lp_balance_of(account_id);
        require!(balance >= lp_amount, "insufficient LP balance");

        let slice = self.jkpt * lp_amount / self.lp_total;
        let payout = slice - ppm_of(slice, WITHDRAW_FEE_PPM);
        self.jkpt -= payout;
        self.lp_total -= lp_amount;
        self.lp_balances
            .insert(account_id.clone(), balance - lp_amount);
        payout
    }
}

impl Default for PrizePool {
    fn default() -> Self {
        Self::new()
    }
}

/// JKPT base units bought by `usd` at `jkpt_price` (USD per whole JKPT).
pub fn usd_to_jkpt(usd: u128, jkpt_price: u128, jkpt_decimals: u8) -> u128 {
    require!(jkpt_price > 0, "JKPT price not set");
    usd * pow10(jkpt_decimals) / jkpt_price
}

/// Pool size in USD, priced through the per-ticket rate so the rounding
/// matches reward settlement.
pub fn pool_size_in_usd(pool_jkpt: u128, ticket_price: u128, jkpt_ticket: u128) -> u128 {
    if jkpt_ticket == 0 {
        return 0;
    }
    pool_jkpt * ticket_price / jkpt_ticket
}
