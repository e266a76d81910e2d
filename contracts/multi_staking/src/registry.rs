//! Append-only registry of stakeable tokens.
//!
//! Entries are addressed by their insertion index. Stake records refer to
//! tokens only through that index, so entries are never removed or
//! renumbered; the owner can only flip the `supported` flag.

use soroban_sdk::{contracttype, Address, Env, Symbol};

use crate::errors::ContractError;
use crate::storage::{bump_persistent, TOKEN, TOKEN_COUNT, TOKEN_INDEX};

/// A registered token and its price feed.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenSupport {
    pub token: Address,
    /// Oracle feed for the token; stored for integrators, not used in accrual.
    pub price_feed: Address,
    /// New stakes are accepted only while this is `true`.
    pub supported: bool,
}

fn entry_key(index: u32) -> (Symbol, u32) {
    (TOKEN, index)
}

fn index_key(token: &Address) -> (Symbol, Address) {
    (TOKEN_INDEX, token.clone())
}

/// Number of entries ever registered.
pub fn count(env: &Env) -> u32 {
    bump_persistent(env, &TOKEN_COUNT);
    env.storage().persistent().get(&TOKEN_COUNT).unwrap_or(0)
}

/// Index of `token`, if it has been registered.
pub fn index_of(env: &Env, token: &Address) -> Option<u32> {
    let key = index_key(token);
    bump_persistent(env, &key);
    env.storage().persistent().get(&key)
}

/// Append a new supported entry and return its index.
pub fn append(env: &Env, token: &Address, price_feed: &Address) -> Result<u32, ContractError> {
    if index_of(env, token).is_some() {
        return Err(ContractError::DuplicateToken);
    }

    let index = count(env);
    let next = index.checked_add(1).ok_or(ContractError::ArithmeticOverflow)?;

    let entry = TokenSupport {
        token: token.clone(),
        price_feed: price_feed.clone(),
        supported: true,
    };
    write(env, index, &entry);

    let reverse = index_key(token);
    env.storage().persistent().set(&reverse, &index);
    bump_persistent(env, &reverse);

    env.storage().persistent().set(&TOKEN_COUNT, &next);
    bump_persistent(env, &TOKEN_COUNT);

    Ok(index)
}

/// The entry at `index`, or `IndexOutOfRange`.
pub fn entry(env: &Env, index: u32) -> Result<TokenSupport, ContractError> {
    let key = entry_key(index);
    bump_persistent(env, &key);
    env.storage()
        .persistent()
        .get(&key)
        .ok_or(ContractError::IndexOutOfRange)
}

pub fn write(env: &Env, index: u32, entry: &TokenSupport) {
    let key = entry_key(index);
    env.storage().persistent().set(&key, entry);
    bump_persistent(env, &key);
}

/// Resolve an index for a new stake: the entry must exist and be enabled.
pub fn resolve_for_stake(env: &Env, index: u32) -> Result<TokenSupport, ContractError> {
    match entry(env, index) {
        Ok(entry) if entry.supported => Ok(entry),
        _ => Err(ContractError::TokenNotSupported),
    }
}

/// Resolve an index for a withdrawal: the entry must exist, enabled or not.
pub fn resolve_for_unstake(env: &Env, index: u32) -> Result<TokenSupport, ContractError> {
    entry(env, index).map_err(|_| ContractError::TokenNotSupported)
}
