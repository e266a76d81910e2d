#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use multi_staking::{MultiStakingContract, MultiStakingContractClient, RewardRate, RewardSchedule};
use soroban_sdk::{
    testutils::{Address as _, Ledger as _},
    token::{Client as TokenClient, StellarAssetClient},
    vec, Address, Env,
};

const WALLET: i128 = 1_000_000_000_000;

#[derive(Arbitrary, Debug)]
pub enum FuzzAction {
    Stake { user: u8, token: u8, amount: i64 },
    Unstake { user: u8, token: u8, amount: i64 },
    Advance { seconds: u32 },
    Toggle { token: u8, supported: bool },
    PendingRewards { user: u8, token: u8 },
}

#[derive(Arbitrary, Debug)]
pub struct FuzzInput {
    stepped: bool,
    rate_bps: u32,
    period: u64,
    reserve: u32,
    actions: Vec<FuzzAction>,
}

fuzz_target!(|input: FuzzInput| {
    let env = Env::default();
    env.mock_all_auths();

    let owner = Address::generate(&env);
    let reward_token = env
        .register_stellar_asset_contract_v2(owner.clone())
        .address();
    // The reward token is also stakeable, at index 0.
    let tokens = [
        reward_token.clone(),
        env.register_stellar_asset_contract_v2(owner.clone()).address(),
    ];

    let contract_id = env.register(MultiStakingContract, ());
    let client = MultiStakingContractClient::new(&env, &contract_id);

    let rate = RewardRate {
        rate_bps: input.rate_bps,
        period: input.period,
    };
    let schedule = if input.stepped {
        RewardSchedule::Stepped(rate)
    } else {
        RewardSchedule::Linear(rate)
    };
    let feeds = vec![&env, Address::generate(&env), Address::generate(&env)];
    let registry = vec![&env, tokens[0].clone(), tokens[1].clone()];
    if client
        .try_initialize(&owner, &reward_token, &owner, &registry, &feeds, &schedule)
        .is_err()
    {
        // Only a zero period is rejected.
        assert_eq!(input.period, 0);
        return;
    }
    let reserve = i128::from(input.reserve);
    if reserve > 0 {
        StellarAssetClient::new(&env, &reward_token).mint(&contract_id, &reserve);
    }

    let users = [
        Address::generate(&env),
        Address::generate(&env),
        Address::generate(&env),
    ];
    for user in &users {
        for token in &tokens {
            StellarAssetClient::new(&env, token).mint(user, &WALLET);
            TokenClient::new(&env, token).approve(
                user,
                &contract_id,
                &WALLET,
                &(env.ledger().sequence() + 1_000),
            );
        }
    }

    // Look for panics and for any drift between the books and the balances.
    for action in input.actions {
        match action {
            FuzzAction::Stake { user, token, amount } => {
                let _ = client.try_stake_tokens(
                    &users[user as usize % users.len()],
                    &(token as u32 % 2),
                    &i128::from(amount),
                );
            }
            FuzzAction::Unstake { user, token, amount } => {
                let _ = client.try_unstake_tokens(
                    &users[user as usize % users.len()],
                    &(token as u32 % 2),
                    &i128::from(amount),
                );
            }
            FuzzAction::Advance { seconds } => {
                let now = env.ledger().timestamp();
                env.ledger().set_timestamp(now.saturating_add(u64::from(seconds)));
            }
            FuzzAction::Toggle { token, supported } => {
                let _ = client.try_set_token_supported(&owner, &(token as u32 % 2), &supported);
            }
            FuzzAction::PendingRewards { user, token } => {
                let _ = client.try_pending_rewards(&users[user as usize % users.len()], &(token as u32 % 2));
            }
        }

        for (index, token) in tokens.iter().enumerate() {
            let index = index as u32;
            let sum: i128 = users
                .iter()
                .map(|user| client.user_stakes(user, &index).staked_amount)
                .sum();
            assert_eq!(client.total_staked(&index), sum);

            // Principal is never used to pay rewards.
            let held = TokenClient::new(&env, token).balance(&contract_id);
            if *token == reward_token {
                assert_eq!(client.reward_reserve(), held - sum);
                assert!(held >= sum);
            } else {
                assert_eq!(held, sum);
            }
        }
    }
});
