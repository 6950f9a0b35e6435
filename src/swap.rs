use near_sdk::{json_types::U128, near, require, AccountId};

use crate::reward;
use crate::utils::MILLION;

/// Most reward tiers a single swap may carry.
pub const MAX_TIERS: usize = 10;
/// Upper bound on a relative tier's reward, in ppm of the prize pool.
pub const MAX_RELATIVE_REWARD_PPM: u128 = 100_000;
/// Upper bound on a swap's claimable fee ratio.
pub const MAX_FEE_RATIO_PPM: u32 = 80_000;

#[near(serializers = [json, borsh])]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TierKind {
    /// Reward is a fixed USD amount.
    Absolute,
    /// Reward is parts-per-million of the current prize pool.
    Relative,
}

/// One reward rule. `expectation` is the expected USD value per 10 USD
/// ticket and fixes the tier's win probability as expectation / reward.
#[near(serializers = [json, borsh])]
#[derive(Clone, Debug)]
pub struct Tier {
    pub kind: TierKind,
    pub expectation: U128,
    pub reward: U128,
}

/// A registered reward table. Immutable once stored; referenced by id on
/// every play.
#[near(serializers = [json, borsh])]
#[derive(Clone)]
pub struct Swap {
    pub id: u64,
    pub owner: AccountId,
    pub name: String,
    pub tiers: Vec<Tier>,
    pub fee_ratio_ppm: u32,
}

/// Registration parameters; id and owner are filled in by the contract.
#[near(serializers = [json, borsh])]
pub struct SwapParams {
    pub name: String,
    pub tiers: Vec<Tier>,
    pub fee_ratio_ppm: u32,
}

impl SwapParams {
    /// Checks a table against the current prize pool. Must pass before the
    /// swap is stored; all USD bounds are in stable base units.
    pub fn validate(&self, ticket_price: u128, pool_usd: u128) {
        require!(!self.tiers.is_empty(), "must have at least one branch");
        require!(self.tiers.len() <= MAX_TIERS, "too many branches (> 10)");

        // 40% of one ticket
        let expectation_cap = ticket_price * 2 / 5;
        // 0.01 USDT against the 10 USDT ticket
        let min_absolute_reward = ticket_price / 1_000;

        let mut probability_sum: u128 = 0;
        for tier in &self.tiers {
            require!(
                tier.expectation.0 <= expectation_cap,
                "expectation too large"
            );
            match tier.kind {
                TierKind::Relative => {
                    require!(tier.reward.0 > 0, "relative reward must be more than 0");
                    require!(
                        tier.reward.0 <= MAX_RELATIVE_REWARD_PPM,
                        "relative reward must be less than 1e5 (10% of pool)"
                    );
                }
                TierKind::Absolute => {
                    require!(
                        tier.reward.0 >= min_absolute_reward,
                        "absolute reward must be more than 0.01 USDT"
                    );
                    require!(
                        tier.reward.0 <= pool_usd / 10,
                        "absolute reward must be less than 10% of pool"
                    );
                }
            }
            probability_sum += reward::probability_ppm(tier, pool_usd);
        }
        require!(probability_sum <= MILLION, "probability sum too large");
        require!(
            self.fee_ratio_ppm <= MAX_FEE_RATIO_PPM,
            "millionth ratio must <= 8e4 (8%)"
        );
    }

    pub fn into_swap(self, id: u64, owner: AccountId) -> Swap {
        Swap {
            id,
            owner,
            name: self.name,
            tiers: self.tiers,
            fee_ratio_ppm: self.fee_ratio_ppm,
        }
    }
}
