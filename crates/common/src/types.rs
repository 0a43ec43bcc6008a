//! Core Types for the Pool Allocator
//!
//! Requests carry the readings the caller fetched from chain; plans carry the
//! resulting split. Nothing here is mutated after construction.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::{fingerprint, pool::POOL_COUNT};

/// Token amount in the chain's smallest unit
pub type Amount = u128;

/// Index of a pool within its pair (0 or 1)
pub type PoolIndex = usize;

/// Per-pool values, indexed by [`PoolIndex`]
pub type PoolPair<T> = [T; POOL_COUNT];

/// Deterministic request identifier (SHA-256)
pub type RequestId = [u8; 32];

fn hash_fields(tag: &[u8], fields: &[Amount]) -> RequestId {
    let mut hasher = Sha256::new();
    hasher.update(tag);
    for field in fields {
        hasher.update(field.to_le_bytes());
    }
    let result = hasher.finalize();
    let mut id = [0u8; 32];
    id.copy_from_slice(&result);
    id
}

/// Returns the other pool of the pair
pub fn other_pool(index: PoolIndex) -> PoolIndex {
    1 - index
}

// ============ Requests ============

/// Request to spread a stake across both pools
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct StakeRequest {
    /// Amount to distribute
    pub amount: Amount,
    /// Network-wide minimum participation stake
    pub minimum_participation_stake: Amount,
    /// Current total balance of each pool
    pub current_balances: PoolPair<Amount>,
    /// Smallest non-zero stake each pool accepts
    pub min_pool_stakes: PoolPair<Amount>,
}

impl StakeRequest {
    /// Deterministic fingerprint used to tag events
    pub fn fingerprint(&self) -> RequestId {
        hash_fields(
            fingerprint::STAKE_TAG,
            &[
                self.amount,
                self.minimum_participation_stake,
                self.current_balances[0],
                self.current_balances[1],
                self.min_pool_stakes[0],
                self.min_pool_stakes[1],
            ],
        )
    }
}

/// Request to withdraw from both pools, bounded by plain per-pool limits
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct UnstakeRequest {
    /// Amount to withdraw
    pub amount: Amount,
    /// Network-wide minimum participation stake
    pub minimum_participation_stake: Amount,
    /// Current total balance of each pool
    pub current_balances: PoolPair<Amount>,
    /// Most the user may withdraw from each pool
    pub user_max_unstake_amounts: PoolPair<Amount>,
}

impl UnstakeRequest {
    /// Deterministic fingerprint used to tag events
    pub fn fingerprint(&self) -> RequestId {
        hash_fields(
            fingerprint::UNSTAKE_TAG,
            &[
                self.amount,
                self.minimum_participation_stake,
                self.current_balances[0],
                self.current_balances[1],
                self.user_max_unstake_amounts[0],
                self.user_max_unstake_amounts[1],
            ],
        )
    }
}

/// A user's position in one pool, including amounts still in flight
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct UnstakePosition {
    /// Stake currently working in the pool
    pub staked: Amount,
    /// Deposit queued for the next round (withdrawable immediately)
    pub pending_deposit: Amount,
    /// Withdrawal already requested and not yet paid out
    pub pending_withdrawal: Amount,
}

impl UnstakePosition {
    /// Position with only active stake
    pub fn from_stake(staked: Amount) -> Self {
        Self {
            staked,
            ..Self::default()
        }
    }

    /// Most that can still be withdrawn from this position
    pub fn withdrawable(&self) -> Amount {
        self.staked
            .saturating_add(self.pending_deposit)
            .saturating_sub(self.pending_withdrawal)
    }
}

/// Request to withdraw from both pools given full user positions
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct PendingUnstakeRequest {
    /// Amount to withdraw
    pub amount: Amount,
    /// Network-wide minimum participation stake
    pub minimum_participation_stake: Amount,
    /// Current total balance of each pool
    pub current_balances: PoolPair<Amount>,
    /// User position in each pool
    pub positions: PoolPair<UnstakePosition>,
    /// Smallest position a user may leave behind in a pool (0 = no limit)
    pub min_remaining_stake: Amount,
}

impl PendingUnstakeRequest {
    /// Deterministic fingerprint used to tag events
    pub fn fingerprint(&self) -> RequestId {
        let [p0, p1] = self.positions;
        hash_fields(
            fingerprint::UNSTAKE_TAG,
            &[
                self.amount,
                self.minimum_participation_stake,
                self.current_balances[0],
                self.current_balances[1],
                p0.staked,
                p0.pending_deposit,
                p0.pending_withdrawal,
                p1.staked,
                p1.pending_deposit,
                p1.pending_withdrawal,
                self.min_remaining_stake,
            ],
        )
    }
}

/// Request to pick a single pool
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct SelectPoolRequest {
    /// Network-wide minimum participation stake
    pub minimum_participation_stake: Amount,
    /// Current total balance of each pool
    pub current_balances: PoolPair<Amount>,
    /// Pools at or above this balance are never selected
    pub max_stake: Option<Amount>,
}

impl SelectPoolRequest {
    /// Deterministic fingerprint used to tag events
    pub fn fingerprint(&self) -> RequestId {
        hash_fields(
            fingerprint::SELECT_TAG,
            &[
                self.minimum_participation_stake,
                self.current_balances[0],
                self.current_balances[1],
                self.max_stake.unwrap_or(Amount::MAX),
            ],
        )
    }
}

// ============ Plans ============

/// Which rule produced a stake split
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum StakeStrategy {
    /// Both active; amount fits in the gap, all to the lower pool
    NarrowGap = 0x01,
    /// Both active; gap closed and remainder split evenly
    Equalize = 0x02,
    /// Both active; remainder too small to split, all to the lower pool
    EqualizeIntoLower = 0x03,
    /// Both active; gap closed in the lower pool, remainder to the higher one
    EqualizeIntoHigher = 0x04,
    /// One inactive; filled to threshold and remainder split evenly
    ActivateOne = 0x10,
    /// One inactive and out of reach; amount split evenly
    SplitWithoutActivation = 0x11,
    /// Both inactive; both filled to threshold and remainder split evenly
    ActivateBoth = 0x20,
    /// Both inactive; larger deficit filled and remainder split evenly
    ActivateLargerDeficit = 0x21,
    /// Both inactive and out of reach; all to the higher-balance pool
    ConsolidateHigher = 0x22,
    /// Branch result broke a pool floor; amount split evenly
    EvenFallback = 0x30,
    /// Even split also broke a floor; all to the selected pool
    SinglePoolFallback = 0x31,
}

/// One outbound leg of a split
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct PoolLeg {
    /// Target pool
    pub pool: PoolIndex,
    /// Amount for that pool
    pub amount: Amount,
}

fn non_zero_legs(amounts: &PoolPair<Amount>) -> impl Iterator<Item = PoolLeg> + '_ {
    amounts
        .iter()
        .enumerate()
        .filter(|(_, amount)| **amount > 0)
        .map(|(pool, amount)| PoolLeg { pool, amount: *amount })
}

/// Result of a stake allocation
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct StakePlan {
    /// Amount for pool 0 and pool 1
    pub amounts: PoolPair<Amount>,
    /// Rule that produced the split
    pub strategy: StakeStrategy,
}

impl StakePlan {
    /// Non-zero legs, one per pool that receives stake
    pub fn legs(&self) -> impl Iterator<Item = PoolLeg> + '_ {
        non_zero_legs(&self.amounts)
    }
}

/// Result of an unstake allocation
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct UnstakePlan {
    /// Amount withdrawn from pool 0 and pool 1
    pub amounts: PoolPair<Amount>,
    /// Pools that drop below the participation threshold because of this withdrawal
    pub deactivated: PoolPair<bool>,
}

impl UnstakePlan {
    /// Non-zero legs, one per pool that is withdrawn from
    pub fn legs(&self) -> impl Iterator<Item = PoolLeg> + '_ {
        non_zero_legs(&self.amounts)
    }

    /// True if any pool is deactivated by this plan
    pub fn deactivates_any(&self) -> bool {
        self.deactivated.iter().any(|d| *d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stake_request() -> StakeRequest {
        StakeRequest {
            amount: 1000,
            minimum_participation_stake: 1000,
            current_balances: [500, 1500],
            min_pool_stakes: [1, 1],
        }
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = stake_request();
        let b = stake_request();
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_separates_fields_and_kinds() {
        let a = stake_request();
        let mut b = a;
        b.current_balances = [1500, 500];
        assert_ne!(a.fingerprint(), b.fingerprint());

        // Same numbers, different request kind
        let unstake = UnstakeRequest {
            amount: 1000,
            minimum_participation_stake: 1000,
            current_balances: [500, 1500],
            user_max_unstake_amounts: [1, 1],
        };
        assert_ne!(a.fingerprint(), unstake.fingerprint());
    }

    #[test]
    fn test_withdrawable_accounts_for_pending() {
        let position = UnstakePosition {
            staked: 100,
            pending_deposit: 30,
            pending_withdrawal: 50,
        };
        assert_eq!(position.withdrawable(), 80);

        let drained = UnstakePosition {
            staked: 10,
            pending_deposit: 0,
            pending_withdrawal: 25,
        };
        assert_eq!(drained.withdrawable(), 0);

        let huge = UnstakePosition {
            staked: Amount::MAX,
            pending_deposit: 1,
            pending_withdrawal: 0,
        };
        assert_eq!(huge.withdrawable(), Amount::MAX);
    }

    #[test]
    fn test_legs_skip_zero_amounts() {
        let plan = StakePlan {
            amounts: [0, 42],
            strategy: StakeStrategy::NarrowGap,
        };
        let legs: Vec<_> = plan.legs().collect();
        assert_eq!(legs, vec![PoolLeg { pool: 1, amount: 42 }]);

        let plan = UnstakePlan {
            amounts: [10, 5],
            deactivated: [false, false],
        };
        assert_eq!(plan.legs().count(), 2);
        assert!(!plan.deactivates_any());
    }

    #[test]
    fn test_other_pool() {
        assert_eq!(other_pool(0), 1);
        assert_eq!(other_pool(1), 0);
    }
}
