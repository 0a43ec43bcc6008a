//! Stake Allocation
//!
//! Splits a stake across the pool pair. The rules, in priority order:
//!
//! 1. **Both active**: close the balance gap first, then split what is left
//!    so the pools end up level.
//! 2. **One inactive**: fill it to the participation threshold if the amount
//!    reaches, then split the rest. Otherwise split evenly.
//! 3. **Both inactive**: activate both, else the larger deficit, else pile
//!    everything on the pool closest to the threshold.
//! 4. **Fallback**: a split that leaves dust below a pool floor is replaced by
//!    an even split, or by a single-pool stake if even that leaves dust.

use dualstake_common::{
    ensure_split, other_pool, respects_floor, respects_floors, safe_add, safe_sub, split_evenly,
    AllocatorError, AllocatorResult, Amount, PoolIndex, PoolPair, StakePlan, StakeRequest,
    StakeStrategy,
};
use tracing::debug;

use crate::select::select_pool;

/// Split `amount` across the pool pair.
///
/// Returns the amounts for pool 0 and pool 1. See [`plan_stake`] for the
/// variant that also reports which rule was applied.
pub fn calculate_stake_pool_amount(
    amount: Amount,
    minimum_participation_stake: Amount,
    current_balances: PoolPair<Amount>,
    min_pool_stakes: PoolPair<Amount>,
) -> AllocatorResult<PoolPair<Amount>> {
    let request = StakeRequest {
        amount,
        minimum_participation_stake,
        current_balances,
        min_pool_stakes,
    };
    plan_stake(&request).map(|plan| plan.amounts)
}

/// Split a stake request and report the rule that produced the split.
///
/// # Errors
/// * `InvalidAmount` - amount is zero or below either pool floor
/// * `InvariantViolation` - the split does not sum to the amount (allocator bug)
pub fn plan_stake(request: &StakeRequest) -> AllocatorResult<StakePlan> {
    let StakeRequest {
        amount,
        minimum_participation_stake: threshold,
        current_balances: balances,
        min_pool_stakes: floors,
    } = *request;

    let required = floors[0].max(floors[1]).max(1);
    if amount < required {
        return Err(AllocatorError::InvalidAmount {
            amount,
            minimum: required,
        });
    }

    let active = [balances[0] >= threshold, balances[1] >= threshold];
    let candidate = match active {
        [true, true] => equalize(amount, balances, floors)?,
        [false, true] => activate_one(amount, threshold, balances, 0)?,
        [true, false] => activate_one(amount, threshold, balances, 1)?,
        [false, false] => activate_both(amount, threshold, balances)?,
    };

    let plan = if respects_floors(&candidate.amounts, &floors) {
        candidate
    } else {
        debug!(
            rejected = ?candidate.strategy,
            "stake split leaves dust below a pool floor, falling back"
        );
        fallback(amount, threshold, balances, floors)
    };

    ensure_split(&plan.amounts, amount)?;

    debug!(
        amount,
        pool0 = plan.amounts[0],
        pool1 = plan.amounts[1],
        strategy = ?plan.strategy,
        "stake allocated"
    );
    Ok(plan)
}

/// Build a pair with `first_amount` at `first` and `second_amount` on the other pool
fn place(first: PoolIndex, first_amount: Amount, second_amount: Amount) -> PoolPair<Amount> {
    let mut split = [0; 2];
    split[first] = first_amount;
    split[other_pool(first)] = second_amount;
    split
}

fn plan(amounts: PoolPair<Amount>, strategy: StakeStrategy) -> StakePlan {
    StakePlan { amounts, strategy }
}

/// Both pools active: level them out.
fn equalize(
    amount: Amount,
    balances: PoolPair<Amount>,
    floors: PoolPair<Amount>,
) -> AllocatorResult<StakePlan> {
    // Ties resolve to pool 0 as the lower pool
    let lower = if balances[0] <= balances[1] { 0 } else { 1 };
    let higher = other_pool(lower);
    let delta = safe_sub(balances[higher], balances[lower])?;

    if amount <= delta {
        return Ok(plan(place(lower, amount, 0), StakeStrategy::NarrowGap));
    }

    let remainder = safe_sub(amount, delta)?;
    if remainder < floors[0] || remainder < floors[1] {
        return Ok(plan(place(lower, amount, 0), StakeStrategy::EqualizeIntoLower));
    }

    let (lower_half, higher_half) = split_evenly(remainder);
    let lower_amount = safe_add(delta, lower_half)?;

    if !respects_floor(higher_half, floors[higher]) {
        return Ok(plan(place(lower, amount, 0), StakeStrategy::EqualizeIntoLower));
    }

    if !respects_floor(lower_amount, floors[lower]) {
        let shifted = place(lower, delta, remainder);
        if respects_floors(&shifted, &floors) {
            return Ok(plan(shifted, StakeStrategy::EqualizeIntoHigher));
        }
        return Ok(plan(place(lower, amount, 0), StakeStrategy::EqualizeIntoLower));
    }

    Ok(plan(place(lower, lower_amount, higher_half), StakeStrategy::Equalize))
}

/// One pool below the threshold: try to activate it.
fn activate_one(
    amount: Amount,
    threshold: Amount,
    balances: PoolPair<Amount>,
    below: PoolIndex,
) -> AllocatorResult<StakePlan> {
    let needed = safe_sub(threshold, balances[below])?;

    if amount >= needed {
        let (below_half, other_half) = split_evenly(amount - needed);
        let below_amount = safe_add(needed, below_half)?;
        return Ok(plan(place(below, below_amount, other_half), StakeStrategy::ActivateOne));
    }

    let (first, second) = split_evenly(amount);
    Ok(plan([first, second], StakeStrategy::SplitWithoutActivation))
}

/// Both pools below the threshold.
fn activate_both(
    amount: Amount,
    threshold: Amount,
    balances: PoolPair<Amount>,
) -> AllocatorResult<StakePlan> {
    let needed = [
        safe_sub(threshold, balances[0])?,
        safe_sub(threshold, balances[1])?,
    ];

    // Deficits near Amount::MAX must not be summed
    if amount >= needed[0] && amount - needed[0] >= needed[1] {
        let (first, second) = split_evenly(amount - needed[0] - needed[1]);
        let amounts = [safe_add(needed[0], first)?, safe_add(needed[1], second)?];
        return Ok(plan(amounts, StakeStrategy::ActivateBoth));
    }

    let larger = if needed[0] >= needed[1] { 0 } else { 1 };
    if amount >= needed[larger] {
        let (larger_half, other_half) = split_evenly(amount - needed[larger]);
        let larger_amount = safe_add(needed[larger], larger_half)?;
        return Ok(plan(
            place(larger, larger_amount, other_half),
            StakeStrategy::ActivateLargerDeficit,
        ));
    }

    // Neither pool can be activated; back the one closest to the threshold
    let higher = if balances[0] >= balances[1] { 0 } else { 1 };
    Ok(plan(place(higher, amount, 0), StakeStrategy::ConsolidateHigher))
}

fn fallback(
    amount: Amount,
    threshold: Amount,
    balances: PoolPair<Amount>,
    floors: PoolPair<Amount>,
) -> StakePlan {
    let (first, second) = split_evenly(amount);
    let even = [first, second];
    if respects_floors(&even, &floors) {
        return plan(even, StakeStrategy::EvenFallback);
    }

    // amount >= both floors, so a single leg always fits
    let pool = select_pool(threshold, balances);
    plan(place(pool, amount, 0), StakeStrategy::SinglePoolFallback)
}
