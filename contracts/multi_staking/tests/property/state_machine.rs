#![allow(clippy::unwrap_used, clippy::expect_used, clippy::arithmetic_side_effects)]
//! Property-based state machine tests for the staking ledger.
//!
//! Random sequences of stake, unstake, time travel and registry toggles are
//! applied both to the contract and to a plain model of principal balances.
//! The ledger is exercised with two registries: two ordinary tokens, and the
//! reward token itself staked next to an ordinary token.
//!
//! Invariants tested:
//! - Every call succeeds or fails exactly as the model predicts
//! - Each user's recorded principal equals the model
//! - Per token, `total_staked` equals the sum of user principal, and the
//!   contract holds exactly that principal plus the unpaid reward reserve
//! - Rewards are paid only from the reserve, never from staked principal,
//!   so every staker can always withdraw what they deposited

use multi_staking::{ContractError, UserStake};
use proptest::prelude::*;
use proptest_derive::Arbitrary;
use soroban_sdk::{testutils::Address as _, token::StellarAssetClient, Address};

use crate::common::{
    advance, balance, fund, one_percent_monthly, register_token, setup_test_env, TestContext,
};

const USERS: usize = 3;
const TOKENS: usize = 2;
const WALLET: i128 = 10_000_000;
const RESERVE: i128 = 1_000_000_000_000_000;

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    Stake { user: u8, token: u8, amount: u16 },
    Unstake { user: u8, token: u8, amount: u16 },
    Advance { seconds: u32 },
    Toggle { token: u8, supported: bool },
}

struct Harness {
    ctx: TestContext,
    tokens: Vec<(Address, u32)>,
    users: Vec<Address>,
    /// Slot in `tokens` holding the reward token, if it is staked.
    reward_slot: Option<usize>,
    reserve: i128,
    staked: [[i128; TOKENS]; USERS],
    rewards: [i128; USERS],
    supported: [bool; TOKENS],
}

impl Harness {
    fn new(reward_staked: bool, reserve: i128) -> Self {
        let ctx = setup_test_env(one_percent_monthly(), reserve);

        let mut tokens = Vec::with_capacity(TOKENS);
        if reward_staked {
            let index = ctx.client.add_token_support(
                &ctx.owner,
                &ctx.reward_token,
                &Address::generate(&ctx.env),
            );
            tokens.push((ctx.reward_token.clone(), index));
        }
        while tokens.len() < TOKENS {
            tokens.push(register_token(&ctx));
        }

        let users: Vec<Address> = (0..USERS)
            .map(|_| {
                let user = Address::generate(&ctx.env);
                for (token, _) in &tokens {
                    fund(&ctx, token, &user, WALLET);
                }
                user
            })
            .collect();

        Harness {
            ctx,
            tokens,
            users,
            reward_slot: reward_staked.then_some(0),
            reserve,
            staked: [[0; TOKENS]; USERS],
            rewards: [0; USERS],
            supported: [true; TOKENS],
        }
    }

    fn rewards_paid(&self) -> i128 {
        self.rewards.iter().sum()
    }

    fn apply(&mut self, op: &Op) -> Result<(), TestCaseError> {
        match *op {
            Op::Stake { user, token, amount } => {
                let (u, t) = (user as usize % USERS, token as usize % TOKENS);
                let amount = i128::from(amount);
                let index = self.tokens[t].1;
                let result = self.ctx.client.try_stake_tokens(&self.users[u], &index, &amount);

                if amount == 0 {
                    prop_assert!(
                        matches!(result, Err(Ok(ContractError::InvalidAmount))),
                        "expected InvalidAmount, got {:?}",
                        result
                    );
                } else if !self.supported[t] {
                    prop_assert!(
                        matches!(result, Err(Ok(ContractError::TokenNotSupported))),
                        "expected TokenNotSupported, got {:?}",
                        result
                    );
                } else {
                    prop_assert!(result.is_ok(), "stake failed: {:?}", result);
                    self.staked[u][t] += amount;
                }
            }
            Op::Unstake { user, token, amount } => {
                let (u, t) = (user as usize % USERS, token as usize % TOKENS);
                let amount = i128::from(amount);
                let index = self.tokens[t].1;
                let result = self.ctx.client.try_unstake_tokens(&self.users[u], &index, &amount);

                if amount == 0 {
                    prop_assert!(
                        matches!(result, Err(Ok(ContractError::InvalidAmount))),
                        "expected InvalidAmount, got {:?}",
                        result
                    );
                } else if amount > self.staked[u][t] {
                    prop_assert!(
                        matches!(result, Err(Ok(ContractError::InsufficientStake))),
                        "expected InsufficientStake, got {:?}",
                        result
                    );
                } else {
                    match result {
                        Ok(Ok(reward)) => {
                            prop_assert!(reward >= 0);
                            self.staked[u][t] -= amount;
                            self.rewards[u] += reward;
                        }
                        Err(Ok(ContractError::InsufficientRewardReserve)) => {
                            // Refused only when the owed reward really exceeds the reserve.
                            let owed = self.ctx.client.pending_rewards(&self.users[u], &index);
                            prop_assert!(owed > self.ctx.client.reward_reserve());
                        }
                        other => {
                            return Err(TestCaseError::fail(format!(
                                "unstake failed: {other:?}"
                            )))
                        }
                    }
                }
            }
            Op::Advance { seconds } => advance(&self.ctx, u64::from(seconds)),
            Op::Toggle { token, supported } => {
                let t = token as usize % TOKENS;
                self.ctx
                    .client
                    .set_token_supported(&self.ctx.owner, &self.tokens[t].1, &supported);
                self.supported[t] = supported;
            }
        }
        Ok(())
    }

    fn check_invariants(&self) -> Result<(), TestCaseError> {
        let ctx = &self.ctx;
        let unpaid = self.reserve - self.rewards_paid();
        prop_assert!(unpaid >= 0, "paid {} out of {}", self.rewards_paid(), self.reserve);
        prop_assert_eq!(ctx.client.reward_reserve(), unpaid);

        for (t, (token, index)) in self.tokens.iter().enumerate() {
            let holds_rewards = self.reward_slot == Some(t);
            let mut sum = 0;
            for (u, user) in self.users.iter().enumerate() {
                let record = ctx.client.user_stakes(user, index);
                prop_assert_eq!(record.staked_amount, self.staked[u][t]);
                if record.staked_amount == 0 {
                    prop_assert_eq!(&record, &UserStake::default());
                }

                let received = if holds_rewards { self.rewards[u] } else { 0 };
                prop_assert_eq!(
                    balance(ctx, token, user),
                    WALLET - self.staked[u][t] + received
                );
                sum += record.staked_amount;
            }
            prop_assert_eq!(ctx.client.total_staked(index), sum);

            let reserve_here = if holds_rewards { unpaid } else { 0 };
            prop_assert_eq!(balance(ctx, token, &ctx.contract_id), sum + reserve_here);
        }

        if self.reward_slot.is_none() {
            for (u, user) in self.users.iter().enumerate() {
                prop_assert_eq!(balance(ctx, &ctx.reward_token, user), self.rewards[u]);
            }
            prop_assert_eq!(balance(ctx, &ctx.reward_token, &ctx.contract_id), unpaid);
        }
        Ok(())
    }

    /// Unstake every open position, returning the rewards paid on the way out.
    fn exit_all(&mut self) -> Result<i128, TestCaseError> {
        let mut paid = 0;
        for u in 0..USERS {
            for t in 0..TOKENS {
                let amount = self.staked[u][t];
                if amount > 0 {
                    let index = self.tokens[t].1;
                    let reward = self.ctx.client.unstake_tokens(&self.users[u], &index, &amount);
                    self.staked[u][t] = 0;
                    self.rewards[u] += reward;
                    paid += reward;
                }
            }
        }
        Ok(paid)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any sequence of operations keeps the ledger consistent with the model.
    #[test]
    fn prop_ledger_matches_model(ops in proptest::collection::vec(any::<Op>(), 1..40)) {
        let mut harness = Harness::new(false, RESERVE);
        for op in &ops {
            harness.apply(op)?;
            harness.check_invariants()?;
        }
    }

    /// With the reward token staked and a small reserve, rewards never eat
    /// into principal and a topped-up reserve lets everyone leave whole.
    #[test]
    fn prop_staked_reward_token_keeps_principal_whole(
        reserve in 0i128..=5_000i128,
        ops in proptest::collection::vec(any::<Op>(), 1..40),
    ) {
        let mut harness = Harness::new(true, reserve);
        for op in &ops {
            harness.apply(op)?;
            harness.check_invariants()?;
        }

        let funder = Address::generate(&harness.ctx.env);
        StellarAssetClient::new(&harness.ctx.env, &harness.ctx.reward_token)
            .mint(&funder, &RESERVE);
        harness.ctx.client.fund_rewards(&funder, &RESERVE);
        harness.reserve += RESERVE;

        harness.exit_all()?;
        harness.check_invariants()?;
        for (token, index) in &harness.tokens {
            prop_assert_eq!(harness.ctx.client.total_staked(index), 0);
            for user in &harness.users {
                prop_assert!(balance(&harness.ctx, token, user) >= WALLET);
            }
        }
    }

    /// Staking and then unstaking everything returns every wallet to its
    /// starting balance, whatever happened in between.
    #[test]
    fn prop_full_exit_returns_principal(
        ops in proptest::collection::vec(any::<Op>(), 1..25),
    ) {
        let mut harness = Harness::new(false, RESERVE);
        for op in &ops {
            harness.apply(op)?;
        }
        harness.exit_all()?;

        for (token, index) in &harness.tokens {
            prop_assert_eq!(harness.ctx.client.total_staked(index), 0);
            prop_assert_eq!(balance(&harness.ctx, token, &harness.ctx.contract_id), 0);
            for user in &harness.users {
                prop_assert_eq!(balance(&harness.ctx, token, user), WALLET);
            }
        }
    }
}
