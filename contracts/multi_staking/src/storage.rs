//! Storage layout shared by every logic version of the ledger.
//!
//! Code upgrades replace the contract's wasm but leave its storage in place,
//! so the keys below are the compatibility surface between versions. New
//! versions may add keys; existing keys must keep their meaning and value
//! type.

use soroban_sdk::{symbol_short, Address, Env, IntoVal, Symbol, Val};

use crate::errors::ContractError;
use crate::rewards::RewardSchedule;

// ── Instance keys ────────────────────────────────────────────────────────────

pub const INITIALIZED: Symbol = symbol_short!("INIT");
pub const OWNER: Symbol = symbol_short!("OWNER");
pub const PENDING_OWNER: Symbol = symbol_short!("PEND_OWN");
pub const REWARD_TOKEN: Symbol = symbol_short!("RWD_TOK");
pub const PRICE_ORACLE: Symbol = symbol_short!("ORACLE");
pub const SCHEDULE: Symbol = symbol_short!("SCHEDULE");

// ── Persistent keys ──────────────────────────────────────────────────────────
// Tuple keys: (prefix, ...)

pub const TOKEN_COUNT: Symbol = symbol_short!("TOK_CNT");
pub const TOKEN: Symbol = symbol_short!("TOKEN");
pub const TOKEN_INDEX: Symbol = symbol_short!("TOK_IDX");
pub const USER_STAKE: Symbol = symbol_short!("STAKE");
pub const TOTAL_STAKED: Symbol = symbol_short!("TOT_STK");

// ── TTL policy ───────────────────────────────────────────────────────────────

const DAY_IN_LEDGERS: u32 = 17_280;

pub const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
pub const INSTANCE_LIFETIME_THRESHOLD: u32 = INSTANCE_BUMP_AMOUNT - DAY_IN_LEDGERS;

pub const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
pub const PERSISTENT_LIFETIME_THRESHOLD: u32 = PERSISTENT_BUMP_AMOUNT - DAY_IN_LEDGERS;

pub fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

/// Extend a persistent entry's TTL if it exists.
pub fn bump_persistent<K>(env: &Env, key: &K)
where
    K: IntoVal<Env, Val>,
{
    if env.storage().persistent().has(key) {
        env.storage().persistent().extend_ttl(
            key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );
    }
}

// ── Configuration accessors ──────────────────────────────────────────────────

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&INITIALIZED)
}

pub fn set_initialized(env: &Env) {
    env.storage().instance().set(&INITIALIZED, &true);
}

pub fn read_owner(env: &Env) -> Result<Address, ContractError> {
    env.storage()
        .instance()
        .get(&OWNER)
        .ok_or(ContractError::NotInitialized)
}

pub fn write_owner(env: &Env, owner: &Address) {
    env.storage().instance().set(&OWNER, owner);
}

pub fn read_pending_owner(env: &Env) -> Option<Address> {
    env.storage().instance().get(&PENDING_OWNER)
}

pub fn write_pending_owner(env: &Env, pending: &Address) {
    env.storage().instance().set(&PENDING_OWNER, pending);
}

pub fn clear_pending_owner(env: &Env) {
    env.storage().instance().remove(&PENDING_OWNER);
}

pub fn read_reward_token(env: &Env) -> Result<Address, ContractError> {
    env.storage()
        .instance()
        .get(&REWARD_TOKEN)
        .ok_or(ContractError::NotInitialized)
}

pub fn write_reward_token(env: &Env, token: &Address) {
    env.storage().instance().set(&REWARD_TOKEN, token);
}

pub fn read_price_oracle(env: &Env) -> Result<Address, ContractError> {
    env.storage()
        .instance()
        .get(&PRICE_ORACLE)
        .ok_or(ContractError::NotInitialized)
}

pub fn write_price_oracle(env: &Env, oracle: &Address) {
    env.storage().instance().set(&PRICE_ORACLE, oracle);
}

pub fn read_schedule(env: &Env) -> Result<RewardSchedule, ContractError> {
    env.storage()
        .instance()
        .get(&SCHEDULE)
        .ok_or(ContractError::NotInitialized)
}

pub fn write_schedule(env: &Env, schedule: &RewardSchedule) {
    env.storage().instance().set(&SCHEDULE, schedule);
}
