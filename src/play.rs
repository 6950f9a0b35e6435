use near_sdk::serde::{Deserialize, Serialize};
use near_sdk::{env, json_types::U128, near, AccountId};

use crate::fees::StableKind;
use crate::utils::MILLION;

/// Payload of `ft_transfer_call` messages routed to `ft_on_transfer`.
#[derive(Serialize, Deserialize)]
#[serde(crate = "near_sdk::serde", tag = "action", rename_all = "snake_case")]
pub enum PlayMsg {
    /// Stablecoin play against a registered swap.
    Play { swap_id: u64 },
    /// JKPT deposit minting LP shares for the sender.
    Deposit,
    /// JKPT added straight to the prize pool, no shares minted.
    Donate,
}

/// Everything the randomness callback needs to record a play once the
/// oracle has assigned a request id.
#[near(serializers = [json])]
pub struct PendingPlay {
    pub player: AccountId,
    pub swap_id: u64,
    pub usd_in: U128,
    pub usd_type: StableKind,
    pub pool_share: U128,
    pub jkpt_ticket: U128,
    pub quantity: u32,
}

/// Lifecycle record of one play, keyed by the oracle request id. The
/// outcome fields stay zeroed until fulfillment.
#[near(serializers = [json, borsh])]
#[derive(Clone)]
pub struct PlayStatus {
    pub request_id: u64,
    pub player: AccountId,
    pub swap_id: u64,
    pub usd_in: U128,
    pub usd_type: StableKind,
    pub jkpt_ticket: U128,
    pub quantity: u32,
    pub block_height: u64,
    pub fulfilled: bool,
    pub random_word: U128,
    pub outcome_tiers: Vec<Option<u8>>,
    pub jkpt_out: U128,
    pub xexp_out: U128,
}

/// Derives the ppm draw for ticket `index` from the oracle word, so one
/// fulfillment settles every ticket of the play independently.
pub fn derive_draw(random_word: u128, index: u32) -> u128 {
    let mut seed = [0u8; 20];
    seed[..16].copy_from_slice(&random_word.to_le_bytes());
    seed[16..].copy_from_slice(&index.to_le_bytes());
    let hash = env::sha256_array(&seed);
    let mut word = [0u8; 16];
    word.copy_from_slice(&hash[..16]);
    u128::from_le_bytes(word) % MILLION
}
