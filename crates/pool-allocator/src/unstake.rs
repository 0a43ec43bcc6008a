//! Unstake Allocation
//!
//! Withdrawals drain the higher-balance pool first, as far as the user's
//! ceiling allows without dropping the pool below the participation
//! threshold, and only then move to the other pool. A pool is deactivated
//! only when the request cannot be met otherwise.
//!
//! The extended variant also accounts for deposits and withdrawals still in
//! flight and can forbid leaving dust positions behind, which makes some
//! amounts unreachable.

use dualstake_common::{
    ensure_split, other_pool, pair_total, AllocatorError, AllocatorResult, Amount,
    PendingUnstakeRequest, PoolIndex, PoolPair, UnstakePlan, UnstakePosition, UnstakeRequest, Vec,
};
use tracing::debug;

/// Split a withdrawal of `amount` across the pool pair.
///
/// `user_max_unstake_amounts` bounds what can be taken from each pool.
pub fn calculate_unstake_pool_amount(
    amount: Amount,
    minimum_participation_stake: Amount,
    current_balances: PoolPair<Amount>,
    user_max_unstake_amounts: PoolPair<Amount>,
) -> AllocatorResult<PoolPair<Amount>> {
    let request = UnstakeRequest {
        amount,
        minimum_participation_stake,
        current_balances,
        user_max_unstake_amounts,
    };
    plan_unstake(&request).map(|plan| plan.amounts)
}

/// Split a withdrawal given full user positions, including pending amounts.
pub fn calculate_unstake_pool_amount_with_pending(
    amount: Amount,
    minimum_participation_stake: Amount,
    current_balances: PoolPair<Amount>,
    positions: PoolPair<UnstakePosition>,
    min_remaining_stake: Amount,
) -> AllocatorResult<PoolPair<Amount>> {
    let request = PendingUnstakeRequest {
        amount,
        minimum_participation_stake,
        current_balances,
        positions,
        min_remaining_stake,
    };
    plan_unstake_with_pending(&request).map(|plan| plan.amounts)
}

/// Plan a withdrawal bounded by plain per-pool limits.
///
/// # Errors
/// * `InvalidAmount` - amount is zero
/// * `InsufficientStake` - amount exceeds the summed limits
pub fn plan_unstake(request: &UnstakeRequest) -> AllocatorResult<UnstakePlan> {
    Withdrawal {
        amount: request.amount,
        threshold: request.minimum_participation_stake,
        balances: request.current_balances,
        ceilings: request.user_max_unstake_amounts,
        min_remaining: 0,
    }
    .plan()
}

/// Plan a withdrawal from full positions.
///
/// Pending deposits can be withdrawn straight away; pending withdrawals are
/// already spoken for and also come off the pool balance.
///
/// # Errors
/// * `InvalidAmount` - amount is zero
/// * `InsufficientStake` - amount exceeds what is withdrawable
/// * `NoValidAllocation` - every split reaching the amount leaves a dust position
pub fn plan_unstake_with_pending(request: &PendingUnstakeRequest) -> AllocatorResult<UnstakePlan> {
    let [p0, p1] = request.positions;
    let [b0, b1] = request.current_balances;

    Withdrawal {
        amount: request.amount,
        threshold: request.minimum_participation_stake,
        balances: [
            b0.saturating_sub(p0.pending_withdrawal),
            b1.saturating_sub(p1.pending_withdrawal),
        ],
        ceilings: [p0.withdrawable(), p1.withdrawable()],
        min_remaining: request.min_remaining_stake,
    }
    .plan()
}

/// Pools kept active, then amount taken from the higher-balance pool
type Score = (usize, Amount);

/// Normalized withdrawal problem shared by both variants
struct Withdrawal {
    amount: Amount,
    threshold: Amount,
    /// Pool balances the activity check runs against
    balances: PoolPair<Amount>,
    /// Most the user may take from each pool
    ceilings: PoolPair<Amount>,
    /// Smallest position the user may leave behind (0 = any)
    min_remaining: Amount,
}

impl Withdrawal {
    fn plan(&self) -> AllocatorResult<UnstakePlan> {
        if self.amount == 0 {
            return Err(AllocatorError::InvalidAmount {
                amount: 0,
                minimum: 1,
            });
        }

        // A ceiling sum past Amount::MAX covers any request
        if let Ok(available) = pair_total(&self.ceilings) {
            if self.amount > available {
                return Err(AllocatorError::InsufficientStake {
                    available,
                    requested: self.amount,
                });
            }
        }

        // Descending balance order; ties keep pool 0 first
        let first = if self.balances[0] >= self.balances[1] { 0 } else { 1 };
        let second = other_pool(first);

        let mut best: Option<(Score, PoolPair<Amount>)> = None;
        for taken_first in self.candidates(first, second) {
            let Some(taken_second) = self.amount.checked_sub(taken_first) else {
                continue;
            };
            if !self.admissible(first, taken_first) || !self.admissible(second, taken_second) {
                continue;
            }

            let mut split = [0; 2];
            split[first] = taken_first;
            split[second] = taken_second;

            // Keep as many pools active as possible, then drain the bigger pool first
            let score = (self.active_after(&split), taken_first);
            if best.as_ref().map_or(true, |(best_score, _)| score > *best_score) {
                best = Some((score, split));
            }
        }

        let Some((_, amounts)) = best else {
            debug!(amount = self.amount, "no admissible unstake split");
            return Err(AllocatorError::NoValidAllocation {
                requested: self.amount,
            });
        };

        ensure_split(&amounts, self.amount)?;

        let deactivated = [self.deactivates(0, amounts[0]), self.deactivates(1, amounts[1])];
        debug!(
            amount = self.amount,
            pool0 = amounts[0],
            pool1 = amounts[1],
            ?deactivated,
            "unstake allocated"
        );

        Ok(UnstakePlan {
            amounts,
            deactivated,
        })
    }

    /// Largest withdrawal that keeps the pool active (unbounded if already inactive)
    fn safe_capacity(&self, pool: PoolIndex) -> Amount {
        let balance = self.balances[pool];
        if balance < self.threshold {
            return self.ceilings[pool];
        }
        self.ceilings[pool].min(balance - self.threshold)
    }

    /// Top of the contiguous range of withdrawals that leave no dust
    fn partial_capacity(&self, pool: PoolIndex) -> Amount {
        self.ceilings[pool].saturating_sub(self.min_remaining)
    }

    /// A withdrawal must leave nothing, or at least `min_remaining`
    fn admissible(&self, pool: PoolIndex, taken: Amount) -> bool {
        let ceiling = self.ceilings[pool];
        taken == 0 || taken == ceiling || (taken < ceiling && ceiling - taken >= self.min_remaining)
    }

    fn deactivates(&self, pool: PoolIndex, taken: Amount) -> bool {
        let balance = self.balances[pool];
        balance >= self.threshold && balance.saturating_sub(taken) < self.threshold
    }

    fn active_after(&self, split: &PoolPair<Amount>) -> usize {
        (0..2)
            .filter(|&pool| {
                let balance = self.balances[pool];
                balance >= self.threshold && balance.saturating_sub(split[pool]) >= self.threshold
            })
            .count()
    }

    /// Withdrawals from `first` worth scoring.
    ///
    /// The admissible set per pool is `[0, partial] ∪ {ceiling}`, so the best
    /// split always sits on one of these bounds, seen from either pool.
    fn candidates(&self, first: PoolIndex, second: PoolIndex) -> Vec<Amount> {
        let own = [
            0,
            self.ceilings[first],
            self.partial_capacity(first),
            self.safe_capacity(first),
            self.amount,
        ];
        let mirrored = [
            self.ceilings[second],
            self.partial_capacity(second),
            self.safe_capacity(second),
        ];

        let mut candidates: Vec<Amount> = own.iter().map(|c| (*c).min(self.amount)).collect();
        candidates.extend(mirrored.iter().filter_map(|c| self.amount.checked_sub(*c)));
        candidates.sort_unstable();
        candidates.dedup();
        candidates
    }
}
