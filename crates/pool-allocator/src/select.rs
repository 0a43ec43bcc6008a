//! Pool Selection
//!
//! Picks a single pool for single-pool strategies and tie-breaking.

use dualstake_common::{
    AllocatorError, AllocatorResult, Amount, PoolIndex, PoolPair, SelectPoolRequest,
};

/// Pick one pool of the pair.
///
/// - one pool below the threshold: that pool (get it to viability)
/// - both below: the higher-balance pool (closest to viability)
/// - both at or above: the lower-balance pool (load balancing)
///
/// Ties resolve to pool 0.
pub fn select_pool(
    minimum_participation_stake: Amount,
    current_balances: PoolPair<Amount>,
) -> PoolIndex {
    let [b0, b1] = current_balances;
    match (b0 < minimum_participation_stake, b1 < minimum_participation_stake) {
        (true, false) => 0,
        (false, true) => 1,
        (true, true) => {
            if b0 >= b1 {
                0
            } else {
                1
            }
        }
        (false, false) => {
            if b0 <= b1 {
                0
            } else {
                1
            }
        }
    }
}

/// Pick one pool, skipping pools whose balance has reached `max_stake`.
///
/// # Errors
/// * `PoolsSaturated` - both pools are at or above `max_stake`
pub fn select_pool_with_max_stake(
    minimum_participation_stake: Amount,
    max_stake: Amount,
    current_balances: PoolPair<Amount>,
) -> AllocatorResult<PoolIndex> {
    let saturated = [current_balances[0] >= max_stake, current_balances[1] >= max_stake];
    match saturated {
        [true, true] => Err(AllocatorError::PoolsSaturated { max_stake }),
        [true, false] => Ok(1),
        [false, true] => Ok(0),
        [false, false] => Ok(select_pool(minimum_participation_stake, current_balances)),
    }
}

/// Resolve a selection request, honoring the max stake when present
pub fn plan_selection(request: &SelectPoolRequest) -> AllocatorResult<PoolIndex> {
    let pool = match request.max_stake {
        Some(max_stake) => select_pool_with_max_stake(
            request.minimum_participation_stake,
            max_stake,
            request.current_balances,
        )?,
        None => select_pool(request.minimum_participation_stake, request.current_balances),
    };
    tracing::debug!(pool, "pool selected");
    Ok(pool)
}
