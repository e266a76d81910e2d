#![no_std]

pub mod errors;
pub mod events;
pub mod ledger;
pub mod registry;
pub mod rewards;
pub mod storage;

use soroban_sdk::{contract, contractimpl, log, token, Address, BytesN, Env, Vec};

pub use errors::ContractError;
pub use ledger::UserStake;
pub use registry::TokenSupport;
pub use rewards::{Accrual, RewardRate, RewardSchedule};

/// Logic version of this build. Storage written by any earlier version is
/// read as-is.
pub const CONTRACT_VERSION: u32 = 1;

// ── Contract ─────────────────────────────────────────────────────────────────

#[contract]
pub struct MultiStakingContract;

#[contractimpl]
impl MultiStakingContract {
    // ── Initialisation ──────────────────────────────────────────────────────

    /// Bootstrap the ledger. Runs once per deployment, never on upgrade.
    ///
    /// * `reward_token` – token paid out as reward on unstake.
    /// * `price_oracle` – oracle contract the price feeds belong to.
    /// * `tokens`, `price_feeds` – initial registry, index 0 first.
    /// * `schedule` – accrual policy for every token.
    pub fn initialize(
        env: Env,
        owner: Address,
        reward_token: Address,
        price_oracle: Address,
        tokens: Vec<Address>,
        price_feeds: Vec<Address>,
        schedule: RewardSchedule,
    ) -> Result<(), ContractError> {
        if storage::is_initialized(&env) {
            log!(&env, "initialize: ledger already initialized");
            return Err(ContractError::AlreadyInitialized);
        }
        if tokens.len() != price_feeds.len() {
            return Err(ContractError::LengthMismatch);
        }
        schedule.validate()?;

        storage::write_owner(&env, &owner);
        storage::write_reward_token(&env, &reward_token);
        storage::write_price_oracle(&env, &price_oracle);
        storage::write_schedule(&env, &schedule);

        for (token, price_feed) in tokens.iter().zip(price_feeds.iter()) {
            registry::append(&env, &token, &price_feed)?;
        }

        storage::set_initialized(&env);
        storage::bump_instance(&env);

        events::publish_initialized(
            &env,
            owner,
            reward_token,
            price_oracle,
            registry::count(&env),
            schedule,
        );

        Ok(())
    }

    // ── Token registry ──────────────────────────────────────────────────────

    /// Register `token` for staking and return its registry index.
    pub fn add_token_support(
        env: Env,
        caller: Address,
        token: Address,
        price_feed: Address,
    ) -> Result<u32, ContractError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        Self::require_owner(&env, &caller)?;

        let index = registry::append(&env, &token, &price_feed).map_err(|e| {
            log!(&env, "add_token_support: token already registered", token);
            e
        })?;

        events::publish_token_support_added(&env, index, token, price_feed);

        Ok(index)
    }

    /// Enable or disable new stakes in the token at `index`.
    ///
    /// Existing stakes in a disabled token can still be withdrawn.
    pub fn set_token_supported(
        env: Env,
        caller: Address,
        index: u32,
        supported: bool,
    ) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        Self::require_owner(&env, &caller)?;

        let mut entry = registry::entry(&env, index)?;
        entry.supported = supported;
        registry::write(&env, index, &entry);

        events::publish_token_support_set(&env, index, supported);

        Ok(())
    }

    pub fn supported_tokens(env: Env, index: u32) -> Result<TokenSupport, ContractError> {
        registry::entry(&env, index)
    }

    pub fn is_supported(env: Env, index: u32) -> Result<bool, ContractError> {
        registry::entry(&env, index).map(|entry| entry.supported)
    }

    pub fn token_count(env: Env) -> u32 {
        registry::count(&env)
    }

    /// Registry index of `token`, if registered.
    pub fn token_index(env: Env, token: Address) -> Option<u32> {
        registry::index_of(&env, &token)
    }

    // ── Staking ─────────────────────────────────────────────────────────────

    /// Deposit `amount` of the token at `token_index`.
    ///
    /// The staker must have approved this contract to spend `amount`.
    /// Pending reward is settled on the existing principal before the
    /// deposit is added, so new principal only earns from now on.
    pub fn stake_tokens(
        env: Env,
        staker: Address,
        token_index: u32,
        amount: i128,
    ) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        staker.require_auth();

        if amount <= 0 {
            return Err(ContractError::InvalidAmount);
        }

        let entry = registry::resolve_for_stake(&env, token_index).map_err(|e| {
            log!(&env, "stake_tokens: token not supported", token_index);
            e
        })?;
        let schedule = storage::read_schedule(&env)?;
        let now = env.ledger().timestamp();

        // 1. Settle and grow the record before any external call.
        let mut stake = ledger::load(&env, &staker, token_index);
        ledger::deposit(&env, &schedule, &mut stake, amount, now)?;
        ledger::save(&env, &staker, token_index, &stake);
        ledger::adjust_total(&env, token_index, amount)?;

        // 2. Pull the approved tokens into the ledger.
        let this = env.current_contract_address();
        token::Client::new(&env, &entry.token).transfer_from(&this, &staker, &this, &amount);

        events::publish_staked(&env, staker, token_index, amount, stake.staked_amount);

        Ok(())
    }

    /// Withdraw `amount` of principal and the whole accrued reward.
    ///
    /// Returns the reward paid. Withdrawing the full principal resets the
    /// record; a partial withdrawal starts a new accrual window on the rest.
    pub fn unstake_tokens(
        env: Env,
        staker: Address,
        token_index: u32,
        amount: i128,
    ) -> Result<i128, ContractError> {
        Self::require_initialized(&env)?;
        staker.require_auth();

        if amount <= 0 {
            return Err(ContractError::InvalidAmount);
        }

        let entry = registry::resolve_for_unstake(&env, token_index)?;
        let schedule = storage::read_schedule(&env)?;
        let reward_token = storage::read_reward_token(&env)?;
        let now = env.ledger().timestamp();

        // 1. Settle, shrink the record and take the reward before paying out.
        let mut stake = ledger::load(&env, &staker, token_index);
        let reward = ledger::withdraw(&env, &schedule, &mut stake, amount, now).map_err(|e| {
            log!(&env, "unstake_tokens: amount exceeds stake", amount);
            e
        })?;
        if reward > 0 {
            Self::require_reward_reserve(&env, &reward_token, reward)?;
        }
        ledger::save(&env, &staker, token_index, &stake);
        ledger::adjust_total(&env, token_index, -amount)?;

        // 2. Pay principal and reward.
        let this = env.current_contract_address();
        if entry.token == reward_token {
            let payout = amount
                .checked_add(reward)
                .ok_or(ContractError::ArithmeticOverflow)?;
            token::Client::new(&env, &entry.token).transfer(&this, &staker, &payout);
        } else {
            token::Client::new(&env, &entry.token).transfer(&this, &staker, &amount);
            if reward > 0 {
                token::Client::new(&env, &reward_token).transfer(&this, &staker, &reward);
            }
        }

        events::publish_unstaked(
            &env,
            staker,
            token_index,
            amount,
            reward,
            stake.staked_amount,
        );

        Ok(reward)
    }

    /// Top up the reward reserve with `amount` of the reward token.
    pub fn fund_rewards(env: Env, funder: Address, amount: i128) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        funder.require_auth();

        if amount <= 0 {
            return Err(ContractError::InvalidAmount);
        }

        let reward_token = storage::read_reward_token(&env)?;
        token::Client::new(&env, &reward_token).transfer(
            &funder,
            &env.current_contract_address(),
            &amount,
        );

        events::publish_rewards_funded(&env, funder, amount);

        Ok(())
    }

    // ── View functions ───────────────────────────────────────────────────────

    /// The stake record of `user` in `token_index`; all zero when absent.
    pub fn user_stakes(env: Env, user: Address, token_index: u32) -> UserStake {
        ledger::load(&env, &user, token_index)
    }

    pub fn total_tokens_staked(env: Env, user: Address, token_index: u32) -> i128 {
        ledger::load(&env, &user, token_index).staked_amount
    }

    /// Reward that `unstake_tokens` would pay right now, without mutating state.
    pub fn pending_rewards(env: Env, user: Address, token_index: u32) -> Result<i128, ContractError> {
        let schedule = storage::read_schedule(&env)?;
        let mut stake = ledger::load(&env, &user, token_index);
        ledger::settle(&env, &schedule, &mut stake, env.ledger().timestamp())?;
        Ok(stake.reward_amount)
    }

    /// Sum of all principal staked in `token_index`.
    pub fn total_staked(env: Env, token_index: u32) -> i128 {
        ledger::total_staked(&env, token_index)
    }

    /// Reward-token balance not backing any staked principal.
    pub fn reward_reserve(env: Env) -> Result<i128, ContractError> {
        let reward_token = storage::read_reward_token(&env)?;
        Self::free_reward_reserve(&env, &reward_token)
    }

    pub fn reward_schedule(env: Env) -> Result<RewardSchedule, ContractError> {
        storage::read_schedule(&env)
    }

    pub fn reward_token(env: Env) -> Result<Address, ContractError> {
        storage::read_reward_token(&env)
    }

    pub fn price_oracle(env: Env) -> Result<Address, ContractError> {
        storage::read_price_oracle(&env)
    }

    pub fn is_initialized(env: Env) -> bool {
        storage::is_initialized(&env)
    }

    pub fn version() -> u32 {
        CONTRACT_VERSION
    }

    // ── Upgrade ──────────────────────────────────────────────────────────────

    /// Replace the contract code with the uploaded wasm `new_wasm_hash`.
    ///
    /// Storage is left untouched and `initialize` is not run again; the new
    /// code must read the layout in [`storage`].
    pub fn upgrade(
        env: Env,
        caller: Address,
        new_wasm_hash: BytesN<32>,
    ) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        Self::require_owner(&env, &caller)?;

        env.deployer()
            .update_current_contract_wasm(new_wasm_hash.clone());

        events::publish_upgraded(&env, caller, new_wasm_hash);

        Ok(())
    }

    // ── Ownership (two-step) ─────────────────────────────────────────────────

    pub fn owner(env: Env) -> Result<Address, ContractError> {
        storage::read_owner(&env)
    }

    /// Propose a new owner. Takes effect once `new_owner` calls `accept_owner`.
    pub fn propose_owner(
        env: Env,
        current_owner: Address,
        new_owner: Address,
    ) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        current_owner.require_auth();
        Self::require_owner(&env, &current_owner)?;

        storage::write_pending_owner(&env, &new_owner);

        events::publish_owner_transfer_proposed(&env, current_owner, new_owner);

        Ok(())
    }

    pub fn accept_owner(env: Env, new_owner: Address) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        new_owner.require_auth();

        let pending = storage::read_pending_owner(&env).ok_or(ContractError::NoPendingOwner)?;
        if new_owner != pending {
            return Err(ContractError::Unauthorized);
        }

        let old_owner = storage::read_owner(&env)?;
        storage::write_owner(&env, &new_owner);
        storage::clear_pending_owner(&env);

        events::publish_owner_transfer_accepted(&env, old_owner, new_owner);

        Ok(())
    }

    pub fn cancel_owner_transfer(env: Env, current_owner: Address) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        current_owner.require_auth();
        Self::require_owner(&env, &current_owner)?;

        let pending = storage::read_pending_owner(&env).ok_or(ContractError::NoPendingOwner)?;
        storage::clear_pending_owner(&env);

        events::publish_owner_transfer_cancelled(&env, current_owner, pending);

        Ok(())
    }

    pub fn pending_owner(env: Env) -> Option<Address> {
        storage::read_pending_owner(&env)
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    /// Guard: revert if the ledger is not yet initialized; otherwise keep the
    /// instance entry alive.
    fn require_initialized(env: &Env) -> Result<(), ContractError> {
        if !storage::is_initialized(env) {
            return Err(ContractError::NotInitialized);
        }
        storage::bump_instance(env);
        Ok(())
    }

    /// The ledger's reward-token balance minus principal staked in that token.
    fn free_reward_reserve(env: &Env, reward_token: &Address) -> Result<i128, ContractError> {
        let balance =
            token::Client::new(env, reward_token).balance(&env.current_contract_address());
        let locked = registry::index_of(env, reward_token)
            .map(|index| ledger::total_staked(env, index))
            .unwrap_or(0);
        balance
            .checked_sub(locked)
            .ok_or(ContractError::ArithmeticOverflow)
    }

    /// Guard: rewards are paid only from the free reserve, never from principal.
    fn require_reward_reserve(
        env: &Env,
        reward_token: &Address,
        reward: i128,
    ) -> Result<(), ContractError> {
        if reward > Self::free_reward_reserve(env, reward_token)? {
            log!(env, "unstake_tokens: reward reserve exhausted", reward);
            return Err(ContractError::InsufficientRewardReserve);
        }
        Ok(())
    }

    /// Guard: revert if `caller` is not the stored owner.
    fn require_owner(env: &Env, caller: &Address) -> Result<(), ContractError> {
        let owner = storage::read_owner(env)?;
        if *caller != owner {
            log!(env, "owner check failed", caller.clone());
            return Err(ContractError::Unauthorized);
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
