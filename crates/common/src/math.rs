//! Mathematical Utilities for the Pool Allocator
//!
//! Checked integer math and the split helpers shared by every allocation rule.

use crate::errors::{AllocatorError, AllocatorResult};
use crate::types::{Amount, PoolPair};

/// Safe addition with overflow check
pub fn safe_add(a: Amount, b: Amount) -> AllocatorResult<Amount> {
    a.checked_add(b).ok_or(AllocatorError::Overflow)
}

/// Safe subtraction with underflow check
pub fn safe_sub(a: Amount, b: Amount) -> AllocatorResult<Amount> {
    a.checked_sub(b).ok_or(AllocatorError::Underflow)
}

/// Sum of both sides of a pair
pub fn pair_total(pair: &PoolPair<Amount>) -> AllocatorResult<Amount> {
    safe_add(pair[0], pair[1])
}

/// Split an amount in two halves
///
/// The first half takes the odd unit: `(x - x / 2, x / 2)`.
pub fn split_evenly(amount: Amount) -> (Amount, Amount) {
    let half = amount / 2;
    (amount - half, half)
}

/// Check a stake against a pool floor
///
/// Zero is always acceptable (the pool simply gets no leg).
pub fn respects_floor(amount: Amount, floor: Amount) -> bool {
    amount == 0 || amount >= floor
}

/// Check both legs of a split against their pool floors
pub fn respects_floors(split: &PoolPair<Amount>, floors: &PoolPair<Amount>) -> bool {
    respects_floor(split[0], floors[0]) && respects_floor(split[1], floors[1])
}

/// Verify that a split adds up to the requested amount.
///
/// Unsigned amounts cannot go negative, so the sum is the only thing left
/// to check. Any mismatch is a bug in the allocator.
pub fn ensure_split(split: &PoolPair<Amount>, expected: Amount) -> AllocatorResult<()> {
    let actual = match split[0].checked_add(split[1]) {
        Some(total) => total,
        None => {
            tracing::error!(expected, "allocation split overflows");
            return Err(AllocatorError::InvariantViolation {
                expected,
                actual: Amount::MAX,
            });
        }
    };

    if actual != expected {
        tracing::error!(expected, actual, "allocation split does not match requested amount");
        return Err(AllocatorError::InvariantViolation { expected, actual });
    }

    Ok(())
}
