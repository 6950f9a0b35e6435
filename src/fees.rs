use near_sdk::{near, require};

use crate::utils::ppm_of;

/// Maintainer share of every play, in ppm of the input amount.
pub const MAINTAINER_FEE_PPM: u128 = 20_000;
/// The band shared between the claimable reward fee and the donation
/// recipient, in ppm of the input amount. A swap's fee ratio takes its cut
/// from this band; the donation gets the complement.
pub const FEE_BAND_PPM: u128 = 80_000;

/// Stablecoin selector. Slot order matches the usdType convention
/// (0 = USDT, 1 = USDC) used by fee arrays and claim records.
#[near(serializers = [json, borsh])]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StableKind {
    Usdt,
    Usdc,
}

impl StableKind {
    pub const COUNT: usize = 2;

    pub fn index(self) -> usize {
        match self {
            StableKind::Usdt => 0,
            StableKind::Usdc => 1,
        }
    }
}

/// How a play's stablecoin input is divided before the remainder reaches
/// the prize pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeSplit {
    pub maintainer: u128,
    pub claimable: u128,
    pub donation: u128,
}

impl FeeSplit {
    /// Splits `amount` for a swap with the given fee ratio. The ratio must
    /// already be validated against [`FEE_BAND_PPM`].
    pub fn of(amount: u128, fee_ratio_ppm: u32) -> Self {
        let maintainer = ppm_of(amount, MAINTAINER_FEE_PPM);
        let claimable = ppm_of(amount, fee_ratio_ppm as u128);
        let donation = ppm_of(amount, FEE_BAND_PPM - fee_ratio_ppm as u128);
        Self {
            maintainer,
            claimable,
            donation,
        }
    }

    pub fn total(&self) -> u128 {
        self.maintainer + self.claimable + self.donation
    }
}

/// Claimable reward-fee balances, one slot per stablecoin, plus the
/// lifetime totals already paid out. Mutated only through [`Self::credit`]
/// and [`Self::claim_all`].
#[near(serializers = [borsh])]
pub struct FeeVault {
    remaining: [u128; StableKind::COUNT],
    total: [u128; StableKind::COUNT],
}

impl FeeVault {
    pub fn new() -> Self {
        Self {
            remaining: [0; StableKind::COUNT],
            total: [0; StableKind::COUNT],
        }
    }

    pub fn credit(&mut self, kind: StableKind, amount: u128) {
        self.remaining[kind.index()] += amount;
    }

    /// Zeroes the remaining balances, moves them into the lifetime totals
    /// and returns the claimed pair. Panics when nothing is claimable in
    /// any slot.
    pub fn claim_all(&mut self) -> [u128; StableKind::COUNT] {
        require!(
            self.remaining.iter().any(|balance| *balance > 0),
            "no remaining reward fees"
        );
        let claimed = self.remaining;
        for slot in 0..StableKind::COUNT {
            self.total[slot] += claimed[slot];
            self.remaining[slot] = 0;
        }
        claimed
    }

    pub fn remaining(&self) -> [u128; StableKind::COUNT] {
        self.remaining
    }

    pub fn total(&self) -> [u128; StableKind::COUNT] {
        self.total
    }
}

impl Default for FeeVault {
    fn default() -> Self {
        Self::new()
    }
}
