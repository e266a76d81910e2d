//! Per-user, per-token stake records.

use soroban_sdk::{contracttype, Address, Env, Symbol};

use crate::errors::ContractError;
use crate::rewards::Accrual;
use crate::storage::{bump_persistent, TOTAL_STAKED, USER_STAKE};

/// A user's position in one registered token.
///
/// `last_rewards_update == 0` together with `staked_amount == 0` is the
/// empty record. A record whose principal drops to zero is deleted, so a
/// stored record always has `staked_amount > 0`.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UserStake {
    pub staked_amount: i128,
    /// Accrued and not yet paid out.
    pub reward_amount: i128,
    pub last_rewards_update: u64,
}

impl UserStake {
    pub fn is_empty(&self) -> bool {
        self.staked_amount == 0
    }
}

fn stake_key(user: &Address, token_index: u32) -> (Symbol, Address, u32) {
    (USER_STAKE, user.clone(), token_index)
}

fn total_key(token_index: u32) -> (Symbol, u32) {
    (TOTAL_STAKED, token_index)
}

/// Load the record for `(user, token_index)`; absent records read as empty.
pub fn load(env: &Env, user: &Address, token_index: u32) -> UserStake {
    let key = stake_key(user, token_index);
    bump_persistent(env, &key);
    env.storage().persistent().get(&key).unwrap_or_default()
}

/// Persist `stake`, deleting the entry when the record is empty.
pub fn save(env: &Env, user: &Address, token_index: u32, stake: &UserStake) {
    let key = stake_key(user, token_index);
    if stake.is_empty() {
        env.storage().persistent().remove(&key);
    } else {
        env.storage().persistent().set(&key, stake);
        bump_persistent(env, &key);
    }
}

/// Fold the reward earned since the last update into `stake.reward_amount`.
///
/// Must run before the principal changes so that a deposit never earns for
/// time it was not staked and a withdrawal still earns for the time it was.
pub fn settle<A: Accrual>(
    env: &Env,
    policy: &A,
    stake: &mut UserStake,
    now: u64,
) -> Result<(), ContractError> {
    if stake.staked_amount == 0 {
        return Ok(());
    }
    let elapsed = now.saturating_sub(stake.last_rewards_update);
    let earned = policy.accrue(env, stake.staked_amount, elapsed)?;
    stake.reward_amount = stake
        .reward_amount
        .checked_add(earned)
        .ok_or(ContractError::ArithmeticOverflow)?;
    stake.last_rewards_update = now;
    Ok(())
}

/// Settle and add `amount` of principal.
pub fn deposit<A: Accrual>(
    env: &Env,
    policy: &A,
    stake: &mut UserStake,
    amount: i128,
    now: u64,
) -> Result<(), ContractError> {
    settle(env, policy, stake, now)?;
    stake.staked_amount = stake
        .staked_amount
        .checked_add(amount)
        .ok_or(ContractError::ArithmeticOverflow)?;
    stake.last_rewards_update = now;
    Ok(())
}

/// Settle, remove `amount` of principal and take the whole reward balance.
///
/// Returns the reward to pay out. When no principal remains the record is
/// reset to the empty state.
pub fn withdraw<A: Accrual>(
    env: &Env,
    policy: &A,
    stake: &mut UserStake,
    amount: i128,
    now: u64,
) -> Result<i128, ContractError> {
    if amount > stake.staked_amount {
        return Err(ContractError::InsufficientStake);
    }
    settle(env, policy, stake, now)?;

    let reward = stake.reward_amount;
    stake.staked_amount -= amount;
    if stake.staked_amount == 0 {
        *stake = UserStake::default();
    } else {
        stake.reward_amount = 0;
        stake.last_rewards_update = now;
    }
    Ok(reward)
}

/// Total principal currently staked in `token_index`.
pub fn total_staked(env: &Env, token_index: u32) -> i128 {
    let key = total_key(token_index);
    bump_persistent(env, &key);
    env.storage().persistent().get(&key).unwrap_or(0)
}

/// Apply a signed change to the per-token total.
pub fn adjust_total(env: &Env, token_index: u32, delta: i128) -> Result<i128, ContractError> {
    let key = total_key(token_index);
    let total = total_staked(env, token_index)
        .checked_add(delta)
        .ok_or(ContractError::ArithmeticOverflow)?;
    env.storage().persistent().set(&key, &total);
    bump_persistent(env, &key);
    Ok(total)
}
