use near_sdk::json_types::U128;
use near_sdk::store::IterableMap;
use near_sdk::{
    env, ext_contract, near, require, serde_json, AccountId, NearToken, PanicOnDefault, Promise,
    PromiseError, PromiseOrValue,
};

mod fees;
mod play;
mod pool;
mod reward;
mod swap;
mod utils;

pub use fees::{FeeSplit, FeeVault, StableKind};
pub use play::{PendingPlay, PlayMsg, PlayStatus};
pub use pool::PrizePool;
pub use swap::{Swap, SwapParams, Tier, TierKind};

use utils::{log_event, pow10};

/// Whole-USD price of one lottery ticket; every play buys `usd_in / 10`
/// of them.
const TICKET_USD: u128 = 10;
/// Whole XEXP granted per ticket on fulfillment.
const XEXP_PER_TICKET: u128 = 500;
/// Whole-USD amount diverted from a play to the oracle when its prepaid
/// credit runs below the configured threshold.
const ORACLE_TOPUP_USD: u128 = 9;

// External contract interfaces
#[ext_contract(ext_fungible_token)]
pub trait FungibleToken {
    fn ft_transfer(&mut self, receiver_id: AccountId, amount: U128, memo: Option<String>);
}

#[ext_contract(ext_vrf_oracle)]
pub trait VrfOracle {
    fn request_random_words(&mut self, num_words: u32) -> u64;
}

#[ext_contract(ext_self)]
pub trait SelfCallbacks {
    fn on_randomness_requested(&mut self, pending: PendingPlay) -> U128;
}

/// Token contracts the lottery settles against.
#[near(serializers = [json, borsh])]
#[derive(Clone)]
pub struct TokenConfig {
    pub jkpt_id: AccountId,
    pub jkpt_decimals: u8,
    pub usdt_id: AccountId,
    pub usdc_id: AccountId,
    /// Shared by both stablecoins; USD-denominated swap math uses it too.
    pub usd_decimals: u8,
    pub xexp_id: AccountId,
    pub xexp_decimals: u8,
}

/// Randomness oracle wiring. The prepaid request credit is tracked in
/// stable base units on the contract itself.
#[near(serializers = [json, borsh])]
#[derive(Clone)]
pub struct OracleConfig {
    pub account_id: AccountId,
    pub fee_per_request: U128,
    pub credit_threshold: U128,
}

// Breakdown of a play's input before the randomness request goes out.
struct PlayBreakdown {
    split: FeeSplit,
    oracle_topup: u128,
    pool_share: u128,
    quantity: u32,
    jkpt_ticket: u128,
}

// Define the contract structure
#[near(contract_state)]
#[derive(PanicOnDefault)]
pub struct Contract {
    owner_id: AccountId,
    maintainer_id: AccountId,
    donation_id: AccountId,
    price_feed_id: AccountId,
    tokens: TokenConfig,
    oracle: OracleConfig,
    oracle_credit: u128,
    // USD (stable base units) per whole JKPT, pushed by the price feed
    jkpt_price: u128,
    next_swap_id: u64,
    swaps: IterableMap<u64, Swap>,
    swap_ids_by_owner: IterableMap<AccountId, Vec<u64>>,
    requests: IterableMap<u64, PlayStatus>,
    request_ids_by_player: IterableMap<AccountId, Vec<u64>>,
    pool: PrizePool,
    fees: FeeVault,
}

// Implement the contract structure
#[near]
impl Contract {
    #[init]
    pub fn new(
        owner_id: AccountId,
        maintainer_id: AccountId,
        donation_id: AccountId,
        price_feed_id: AccountId,
        tokens: TokenConfig,
        oracle: OracleConfig,
        jkpt_price: U128,
    ) -> Self {
        Self {
            owner_id,
            maintainer_id,
            donation_id,
            price_feed_id,
            tokens,
            oracle,
            oracle_credit: 0,
            jkpt_price: jkpt_price.0,
            next_swap_id: 1,
            swaps: IterableMap::new(b"s"),
            swap_ids_by_owner: IterableMap::new(b"o"),
            requests: IterableMap::new(b"r"),
            request_ids_by_player: IterableMap::new(b"p"),
            pool: PrizePool::new(),
            fees: FeeVault::new(),
        }
    }

    /// Registers an immutable reward table and returns its id.
    pub fn register_swap(&mut self, params: SwapParams) -> u64 {
        params.validate(self.ticket_price(), self.pool_size_usd());

        let id = self.next_swap_id;
        self.next_swap_id += 1;
        let owner = env::predecessor_account_id();
        self.swaps.insert(id, params.into_swap(id, owner.clone()));
        if let Some(ids) = self.swap_ids_by_owner.get_mut(&owner) {
            ids.push(id);
        } else {
            self.swap_ids_by_owner.insert(owner.clone(), vec![id]);
        }

        log_event(
            "SWAP_REGISTERED",
            &[("swapId", id.to_string()), ("owner", owner.to_string())],
        );
        id
    }

    /// NEP-141 receiver: stablecoin transfers play a swap, JKPT transfers
    /// feed the prize pool.
    pub fn ft_on_transfer(
        &mut self,
        sender_id: AccountId,
        amount: U128,
        msg: String,
    ) -> PromiseOrValue<U128> {
        let token_id = env::predecessor_account_id();
        let msg: PlayMsg = serde_json::from_str(&msg).expect("invalid transfer message");

        match msg {
            PlayMsg::Play { swap_id } => self.handle_play(sender_id, token_id, amount.0, swap_id),
            PlayMsg::Deposit => {
                require!(
                    token_id == self.tokens.jkpt_id,
                    "only the JKPT token can enter the pool"
                );
                let minted = self.pool.deposit(&sender_id, amount.0);
                log_event(
                    "TOKEN_DEPOSITED",
                    &[
                        ("user", sender_id.to_string()),
                        ("tokenAmount", amount.0.to_string()),
                        ("lpAmount", minted.to_string()),
                    ],
                );
                PromiseOrValue::Value(U128(0))
            }
            PlayMsg::Donate => {
                require!(
                    token_id == self.tokens.jkpt_id,
                    "only the JKPT token can enter the pool"
                );
                self.pool.credit(amount.0);
                log_event(
                    "POOL_DONATION",
                    &[
                        ("user", sender_id.to_string()),
                        ("tokenAmount", amount.0.to_string()),
                    ],
                );
                PromiseOrValue::Value(U128(0))
            }
        }
    }

    /// Burns LP shares and pays out the caller's pro-rata JKPT slice,
    /// minus the withdraw fee which stays in the pool.
    pub fn withdraw(&mut self, lp_amount: U128) -> Promise {
        let account_id = env::predecessor_account_id();
        let payout = self.pool.withdraw(&account_id, lp_amount.0);
        log_event(
            "TOKEN_WITHDRAWN",
            &[
                ("user", account_id.to_string()),
                ("lpAmount", lp_amount.0.to_string()),
                ("tokenAmount", payout.to_string()),
            ],
        );
        self.transfer_token(self.tokens.jkpt_id.clone(), account_id, payout)
    }

    /// Oracle entry point settling a pending play with its random word.
    pub fn fulfill_random_words(&mut self, request_id: u64, random_words: Vec<U128>) {
        require!(
            env::predecessor_account_id() == self.oracle.account_id,
            "only callable by the oracle"
        );
        require!(!random_words.is_empty(), "no random words supplied");

        let mut status = self
            .requests
            .get(&request_id)
            .cloned()
            .expect("request not found");
        require!(!status.fulfilled, "request already fulfilled");

        let swap = self
            .swaps
            .get(&status.swap_id)
            .cloned()
            .expect("swap not found");

        let ticket_price = self.ticket_price();
        let jkpt_ticket = self.usd_to_jkpt(ticket_price);
        let pool_usd = self.pool_size_usd();
        let word = random_words[0].0;

        let mut jkpt_out: u128 = 0;
        let mut outcome_tiers = Vec::with_capacity(status.quantity as usize);
        for index in 0..status.quantity {
            let draw = play::derive_draw(word, index);
            let level = reward::draw_tier(&swap.tiers, pool_usd, draw);
            if let Some(level) = level {
                let reward_usd = reward::reward_in_usd(&swap.tiers[level], pool_usd);
                jkpt_out += reward::reward_in_jkpt(reward_usd, jkpt_ticket, ticket_price);
            }
            outcome_tiers.push(level.map(|level| level as u8));
        }
        let jkpt_out = self.pool.debit_reward(jkpt_out);
        let xexp_out = status.quantity as u128 * XEXP_PER_TICKET * pow10(self.tokens.xexp_decimals);

        status.fulfilled = true;
        status.random_word = U128(word);
        status.outcome_tiers = outcome_tiers;
        status.jkpt_ticket = U128(jkpt_ticket);
        status.jkpt_out = U128(jkpt_out);
        status.xexp_out = U128(xexp_out);
        self.requests.insert(request_id, status.clone());

        if jkpt_out > 0 {
            self.transfer_token(self.tokens.jkpt_id.clone(), status.player.clone(), jkpt_out);
        }
        if xexp_out > 0 {
            self.transfer_token(self.tokens.xexp_id.clone(), status.player.clone(), xexp_out);
        }

        log_event(
            "LOTTERY_OUTCOME",
            &[
                ("reqId", request_id.to_string()),
                ("player", status.player.to_string()),
                ("swapId", status.swap_id.to_string()),
                ("jkptOut", jkpt_out.to_string()),
                ("xexpOut", xexp_out.to_string()),
            ],
        );
    }

    /// Transfers every accrued reward fee to the caller and zeroes the
    /// claimable balances.
    pub fn claim_remaining_reward_fee(&mut self) -> Vec<U128> {
        self.assert_owner();
        let claimed = self.fees.claim_all();
        let distributor = env::predecessor_account_id();

        if claimed[StableKind::Usdt.index()] > 0 {
            self.transfer_token(
                self.tokens.usdt_id.clone(),
                distributor.clone(),
                claimed[StableKind::Usdt.index()],
            );
        }
        if claimed[StableKind::Usdc.index()] > 0 {
            self.transfer_token(
                self.tokens.usdc_id.clone(),
                distributor.clone(),
                claimed[StableKind::Usdc.index()],
            );
        }

        log_event(
            "REWARD_FEE_CLAIMED",
            &[
                ("distributor", distributor.to_string()),
                ("usdtFee", claimed[0].to_string()),
                ("usdcFee", claimed[1].to_string()),
            ],
        );
        claimed.iter().map(|amount| U128(*amount)).collect()
    }

    // --- MAINTENANCE ---

    pub fn set_maintainer(&mut self, maintainer_id: AccountId) {
        self.assert_owner();
        self.maintainer_id = maintainer_id;
    }

    pub fn set_donation_recipient(&mut self, donation_id: AccountId) {
        self.assert_owner();
        self.donation_id = donation_id;
    }

    pub fn set_oracle_config(&mut self, oracle: OracleConfig) {
        self.assert_owner();
        self.oracle = oracle;
    }

    /// Price push from the feed account: USD (stable base units) per
    /// whole JKPT.
    pub fn set_jkpt_price(&mut self, price: U128) {
        require!(
            env::predecessor_account_id() == self.price_feed_id,
            "only callable by the price feed"
        );
        require!(price.0 > 0, "price must be positive");
        self.jkpt_price = price.0;
    }

    // --- VIEWS ---

    pub fn get_swap(&self, swap_id: u64) -> Swap {
        self.swaps.get(&swap_id).cloned().expect("swap not found")
    }

    pub fn list_swap_ids(&self, owner: AccountId) -> Vec<u64> {
        self.swap_ids_by_owner
            .get(&owner)
            .cloned()
            .unwrap_or_default()
    }

    pub fn list_swaps(&self, owner: AccountId) -> Vec<Swap> {
        self.list_swap_ids(owner)
            .iter()
            .map(|id| self.swaps.get(id).cloned().expect("swap not found"))
            .collect()
    }

    pub fn get_request_status_by_id(&self, request_id: u64) -> PlayStatus {
        self.requests
            .get(&request_id)
            .cloned()
            .expect("request not found")
    }

    pub fn get_request_ids_by_address(&self, player: AccountId) -> Vec<u64> {
        self.request_ids_by_player
            .get(&player)
            .cloned()
            .unwrap_or_default()
    }

    pub fn get_remaining_reward_fee(&self) -> Vec<U128> {
        self.fees.remaining().iter().map(|a| U128(*a)).collect()
    }

    pub fn get_total_reward_fee(&self) -> Vec<U128> {
        self.fees.total().iter().map(|a| U128(*a)).collect()
    }

    pub fn get_prize_pool_size_in_jkpt(&self) -> U128 {
        U128(self.pool.jkpt())
    }

    pub fn get_prize_pool_size_in_usd(&self) -> U128 {
        U128(self.pool_size_usd())
    }

    pub fn estimate_usd_to_jkpt(&self, usd: U128) -> U128 {
        U128(self.usd_to_jkpt(usd.0))
    }

    pub fn lp_balance_of(&self, account_id: AccountId) -> U128 {
        U128(self.pool.lp_balance_of(&account_id))
    }

    pub fn lp_total_supply(&self) -> U128 {
        U128(self.pool.lp_total())
    }

    pub fn get_maintainer(&self) -> AccountId {
        self.maintainer_id.clone()
    }

    pub fn get_oracle_credit(&self) -> U128 {
        U128(self.oracle_credit)
    }

    // --- PRIVATE CALLBACKS ---

    /// Records the play once the oracle has assigned a request id. On a
    /// failed request the pool share flows back to the player through the
    /// token contract's refund path.
    #[private]
    pub fn on_randomness_requested(
        &mut self,
        #[callback_result] result: Result<u64, PromiseError>,
        pending: PendingPlay,
    ) -> U128 {
        let request_id = match result {
            Ok(request_id) => request_id,
            Err(_) => {
                log_event(
                    "RANDOMNESS_REQUEST_FAILED",
                    &[
                        ("player", pending.player.to_string()),
                        ("swapId", pending.swap_id.to_string()),
                        ("refund", pending.pool_share.0.to_string()),
                    ],
                );
                return pending.pool_share;
            }
        };
        require!(
            !self.requests.contains_key(&request_id),
            "request id already in use"
        );

        let jkpt_share = pool::usd_to_jkpt(
            pending.pool_share.0,
            self.jkpt_price,
            self.tokens.jkpt_decimals,
        );
        self.pool.credit(jkpt_share);

        let status = PlayStatus {
            request_id,
            player: pending.player.clone(),
            swap_id: pending.swap_id,
            usd_in: pending.usd_in,
            usd_type: pending.usd_type,
            jkpt_ticket: pending.jkpt_ticket,
            quantity: pending.quantity,
            block_height: env::block_height(),
            fulfilled: false,
            random_word: U128(0),
            outcome_tiers: Vec::new(),
            jkpt_out: U128(0),
            xexp_out: U128(0),
        };
        self.requests.insert(request_id, status);
        if let Some(ids) = self.request_ids_by_player.get_mut(&pending.player) {
            ids.push(request_id);
        } else {
            self.request_ids_by_player
                .insert(pending.player.clone(), vec![request_id]);
        }

        log_event(
            "RANDOMNESS_REQUESTED",
            &[
                ("reqId", request_id.to_string()),
                ("player", pending.player.to_string()),
                ("swapId", pending.swap_id.to_string()),
            ],
        );
        U128(0)
    }
}

// Internal helpers, not exported as contract methods.
impl Contract {
    fn assert_owner(&self) {
        require!(
            env::predecessor_account_id() == self.owner_id,
            "Only callable by owner"
        );
    }

    fn ticket_price(&self) -> u128 {
        TICKET_USD * pow10(self.tokens.usd_decimals)
    }

    fn stable_kind_of(&self, token_id: &AccountId) -> StableKind {
        if *token_id == self.tokens.usdt_id {
            StableKind::Usdt
        } else if *token_id == self.tokens.usdc_id {
            StableKind::Usdc
        } else {
            env::panic_str("usdType must be 0 (USDT) or 1 (USDC)")
        }
    }

    fn usd_to_jkpt(&self, usd: u128) -> u128 {
        pool::usd_to_jkpt(usd, self.jkpt_price, self.tokens.jkpt_decimals)
    }

    fn pool_size_usd(&self) -> u128 {
        let ticket_price = self.ticket_price();
        pool::pool_size_in_usd(self.pool.jkpt(), ticket_price, self.usd_to_jkpt(ticket_price))
    }

    fn play_breakdown(&self, amount: u128, fee_ratio_ppm: u32) -> PlayBreakdown {
        let ticket_price = self.ticket_price();
        let split = FeeSplit::of(amount, fee_ratio_ppm);
        let oracle_topup = if self.oracle_credit < self.oracle.credit_threshold.0 {
            ORACLE_TOPUP_USD * pow10(self.tokens.usd_decimals)
        } else {
            0
        };
        let reserved = split.total() + oracle_topup;
        require!(amount >= reserved, "amount does not cover fees");

        let quantity = (amount / ticket_price) as u32;
        PlayBreakdown {
            split,
            oracle_topup,
            pool_share: amount - reserved,
            quantity,
            jkpt_ticket: self.usd_to_jkpt(amount) / quantity as u128,
        }
    }

    fn handle_play(
        &mut self,
        player: AccountId,
        token_id: AccountId,
        amount: u128,
        swap_id: u64,
    ) -> PromiseOrValue<U128> {
        let usd_type = self.stable_kind_of(&token_id);
        require!(
            amount >= self.ticket_price(),
            "amount must be at least 10 USD"
        );
        let fee_ratio_ppm = self
            .swaps
            .get(&swap_id)
            .expect("swap not found")
            .fee_ratio_ppm;

        let breakdown = self.play_breakdown(amount, fee_ratio_ppm);
        self.fees.credit(usd_type, breakdown.split.claimable);
        if breakdown.oracle_topup > 0 {
            self.oracle_credit += breakdown.oracle_topup;
            self.transfer_token(
                token_id.clone(),
                self.oracle.account_id.clone(),
                breakdown.oracle_topup,
            );
            log_event(
                "ORACLE_FUNDED",
                &[("amount", breakdown.oracle_topup.to_string())],
            );
        }
        if breakdown.split.maintainer > 0 {
            self.transfer_token(
                token_id.clone(),
                self.maintainer_id.clone(),
                breakdown.split.maintainer,
            );
        }
        if breakdown.split.donation > 0 {
            self.transfer_token(
                token_id.clone(),
                self.donation_id.clone(),
                breakdown.split.donation,
            );
        }

        let pending = PendingPlay {
            player,
            swap_id,
            usd_in: U128(amount),
            usd_type,
            pool_share: U128(breakdown.pool_share),
            jkpt_ticket: U128(breakdown.jkpt_ticket),
            quantity: breakdown.quantity,
        };
        self.oracle_credit = self
            .oracle_credit
            .saturating_sub(self.oracle.fee_per_request.0);

        PromiseOrValue::Promise(
            ext_vrf_oracle::ext(self.oracle.account_id.clone())
                .with_static_gas(env::prepaid_gas().saturating_div(4))
                .request_random_words(1)
                .then(
                    ext_self::ext(env::current_account_id())
                        .with_static_gas(env::prepaid_gas().saturating_div(4))
                        .on_randomness_requested(pending),
                ),
        )
    }

    fn transfer_token(&self, token_id: AccountId, receiver_id: AccountId, amount: u128) -> Promise {
        ext_fungible_token::ext(token_id)
            .with_attached_deposit(NearToken::from_yoctonear(1))
            .with_static_gas(env::prepaid_gas().saturating_div(10))
            .ft_transfer(receiver_id, U128(amount), None)
    }
}
