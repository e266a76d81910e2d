//! Reward accrual policies.
//!
//! Accrual is lazy and per record: nothing is computed while time passes.
//! When a stake record is touched, the reward owed for the window since its
//! last update is computed from the principal that was staked during that
//! window:
//!
//! ```text
//! Linear:  reward = principal × rate_bps × elapsed / (10_000 × period)
//! Stepped: reward = principal × rate_bps × ⌊elapsed / period⌋ / 10_000
//! ```
//!
//! Both round down, so the ledger never pays out more than the schedule
//! allows. Products are formed in 256-bit arithmetic so any `i128` principal
//! is accepted; only a final reward above `i128::MAX` is rejected.

use soroban_sdk::{contracttype, Env, I256};

use crate::errors::ContractError;

/// Basis-point denominator: `rate_bps = 10_000` pays 100 % of principal per period.
pub const BPS_DENOMINATOR: i128 = 10_000;

/// A rate of `rate_bps` basis points of principal per `period` seconds.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardRate {
    pub rate_bps: u32,
    pub period: u64,
}

impl RewardRate {
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.period == 0 {
            return Err(ContractError::InvalidSchedule);
        }
        Ok(())
    }
}

/// The accrual policy chosen at deployment.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RewardSchedule {
    /// Reward grows every second.
    Linear(RewardRate),
    /// Reward is granted only for completed periods.
    Stepped(RewardRate),
}

impl RewardSchedule {
    pub fn rate(&self) -> &RewardRate {
        match self {
            RewardSchedule::Linear(rate) | RewardSchedule::Stepped(rate) => rate,
        }
    }

    pub fn validate(&self) -> Result<(), ContractError> {
        self.rate().validate()
    }
}

/// Computes the reward earned by `principal` over `elapsed` seconds.
///
/// Implementations must return a non-negative amount, be monotonic in both
/// arguments, and return zero when either argument is zero. The ledger only
/// depends on this trait, so a new logic version can bind a different policy
/// to the same stored records.
pub trait Accrual {
    fn accrue(&self, env: &Env, principal: i128, elapsed: u64) -> Result<i128, ContractError>;
}

impl Accrual for RewardSchedule {
    fn accrue(&self, env: &Env, principal: i128, elapsed: u64) -> Result<i128, ContractError> {
        if principal <= 0 || elapsed == 0 {
            return Ok(0);
        }
        let rate = self.rate();
        rate.validate()?;
        let rate_bps = i128::from(rate.rate_bps);

        match self {
            RewardSchedule::Linear(_) => {
                // rate_bps < 2^32 and elapsed < 2^64: both products fit in i128.
                let factor = rate_bps * i128::from(elapsed);
                let denominator = BPS_DENOMINATOR * i128::from(rate.period);
                mul_div_floor(env, principal, factor, denominator)
            }
            RewardSchedule::Stepped(_) => {
                let periods = elapsed / rate.period;
                if periods == 0 {
                    return Ok(0);
                }
                let factor = rate_bps * i128::from(periods);
                mul_div_floor(env, principal, factor, BPS_DENOMINATOR)
            }
        }
    }
}

/// `⌊a × b / denominator⌋` for non-negative operands, with a 256-bit product.
pub fn mul_div_floor(
    env: &Env,
    a: i128,
    b: i128,
    denominator: i128,
) -> Result<i128, ContractError> {
    if a == 0 || b == 0 {
        return Ok(0);
    }
    let product = I256::from_i128(env, a).mul(&I256::from_i128(env, b));
    product
        .div(&I256::from_i128(env, denominator))
        .to_i128()
        .ok_or(ContractError::ArithmeticOverflow)
}

// ── Unit tests ──────────────────────────────────────────────────────────────
