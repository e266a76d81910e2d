use soroban_sdk::contracterror;

/// Failure reasons surfaced by every ledger entry point.
///
/// Discriminants are part of the public interface and must stay stable
/// across logic upgrades.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ContractError {
    /// A call other than `initialize` arrived before the ledger was set up.
    NotInitialized = 1,
    /// `initialize` was invoked a second time.
    AlreadyInitialized = 2,
    /// The caller is not the owner, or not the pending owner on acceptance.
    Unauthorized = 3,
    /// Stake, unstake and funding amounts must be strictly positive.
    InvalidAmount = 4,
    /// The token already has a registry entry.
    DuplicateToken = 5,
    /// The index has no registry entry, or staking into it is disabled.
    TokenNotSupported = 6,
    /// Unstake amount exceeds the caller's principal.
    InsufficientStake = 7,
    /// Registry lookup past the last entry.
    IndexOutOfRange = 8,
    /// Reward schedule with a zero-length period.
    InvalidSchedule = 9,
    /// `initialize` got a different number of tokens and price feeds.
    LengthMismatch = 10,
    /// A reward or balance would not fit in `i128`.
    ArithmeticOverflow = 11,
    /// No ownership transfer is pending.
    NoPendingOwner = 12,
    /// The reward exceeds the reward-token balance not backing principal.
    InsufficientRewardReserve = 13,
}
