//! Tier-draw and payout math.
//!
//! Everything here is pure integer arithmetic over base units; fractions
//! are parts-per-million. The oracle word never enters this module; the
//! caller turns it into per-ticket draws first.

use crate::swap::{Tier, TierKind};
use crate::utils::MILLION;

/// Win probability of a tier in ppm, defined by expectation / reward.
///
/// A relative tier against an empty pool has no finite odds; it reports
/// just above certainty so that table validation rejects it.
pub fn probability_ppm(tier: &Tier, pool_usd: u128) -> u128 {
    let reward_usd = reward_in_usd(tier, pool_usd);
    if reward_usd == 0 {
        return if tier.expectation.0 == 0 {
            0
        } else {
            MILLION + 1
        };
    }
    tier.expectation.0 * MILLION / reward_usd
}

/// USD value of a tier's reward at the given pool size.
pub fn reward_in_usd(tier: &Tier, pool_usd: u128) -> u128 {
    match tier.kind {
        TierKind::Absolute => tier.reward.0,
        TierKind::Relative => tier.reward.0 * pool_usd / MILLION,
    }
}

/// Selects the winning tier for one ticket draw in [0, 1e6).
///
/// Tiers occupy consecutive probability ranges in table order; a draw
/// beyond the last range wins nothing.
pub fn draw_tier(tiers: &[Tier], pool_usd: u128, draw_ppm: u128) -> Option<usize> {
    let mut cursor: u128 = 0;
    for (level, tier) in tiers.iter().enumerate() {
        cursor += probability_ppm(tier, pool_usd);
        if draw_ppm < cursor {
            return Some(level);
        }
    }
    None
}

/// Converts a USD reward into JKPT base units at the per-ticket rate.
pub fn reward_in_jkpt(reward_usd: u128, jkpt_ticket: u128, ticket_price: u128) -> u128 {
    reward_usd * jkpt_ticket / ticket_price
}
