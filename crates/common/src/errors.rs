//! Error Types for the Pool Allocator
//!
//! Every failure is raised synchronously and never recovered internally.
//! Callers surface these as validation failures before touching the chain.

use core::fmt;

use crate::types::Amount;

/// Result type alias for allocator operations
pub type AllocatorResult<T> = Result<T, AllocatorError>;

/// Main error enum for all allocator errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocatorError {
    // ============ Request Errors ============
    /// Requested amount is smaller than a required floor
    InvalidAmount { amount: Amount, minimum: Amount },

    /// Requested unstake exceeds the user's stake across both pools
    InsufficientStake { available: Amount, requested: Amount },

    /// No combination of per-pool ceilings reaches the exact amount
    NoValidAllocation { requested: Amount },

    /// Both pools have reached the configured maximum stake
    PoolsSaturated { max_stake: Amount },

    // ============ Internal Errors ============
    /// Computed split does not add up to the requested amount.
    ///
    /// Indicates a bug in the allocator itself.
    InvariantViolation { expected: Amount, actual: Amount },

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    Overflow,

    /// Arithmetic underflow occurred
    Underflow,

    // ============ Config Errors ============
    /// Allocator configuration is unusable
    InvalidConfig { reason: &'static str },
}

impl AllocatorError {
    /// Returns a stable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "E010_INVALID_AMOUNT",
            Self::InsufficientStake { .. } => "E011_INSUFFICIENT_STAKE",
            Self::NoValidAllocation { .. } => "E012_NO_VALID_ALLOCATION",
            Self::PoolsSaturated { .. } => "E013_POOLS_SATURATED",
            Self::InvariantViolation { .. } => "E020_INVARIANT_VIOLATION",
            Self::Overflow => "E080_OVERFLOW",
            Self::Underflow => "E081_UNDERFLOW",
            Self::InvalidConfig { .. } => "E090_INVALID_CONFIG",
        }
    }

    /// Returns true if the caller can fix the request and retry
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidAmount { .. } => true,     // Increase amount
            Self::InsufficientStake { .. } => true, // Request less
            Self::NoValidAllocation { .. } => true, // Pick another amount
            Self::PoolsSaturated { .. } => true,    // Wait for capacity
            Self::InvalidConfig { .. } => true,     // Fix config
            _ => false,
        }
    }
}

impl fmt::Display for AllocatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAmount { amount, minimum } => write!(
                f,
                "amount is less than the minimum required to stake: {amount} < {minimum}"
            ),
            Self::InsufficientStake { available, requested } => write!(
                f,
                "requested withdrawal amount exceeds available user stakes: {requested} > {available}"
            ),
            Self::NoValidAllocation { requested } => write!(
                f,
                "No valid combination to unstake requested amount: {requested}"
            ),
            Self::PoolsSaturated { max_stake } => {
                write!(f, "both pools have reached the maximum stake of {max_stake}")
            }
            Self::InvariantViolation { expected, actual } => write!(
                f,
                "allocation invariant violated: split sums to {actual}, expected {expected}"
            ),
            Self::Overflow => f.write_str("arithmetic overflow"),
            Self::Underflow => f.write_str("arithmetic underflow"),
            Self::InvalidConfig { reason } => write!(f, "invalid allocator config: {reason}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AllocatorError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_error_codes_unique() {
        let errors = [
            AllocatorError::InvalidAmount { amount: 1, minimum: 2 },
            AllocatorError::InsufficientStake { available: 20, requested: 21 },
            AllocatorError::NoValidAllocation { requested: 5 },
            AllocatorError::PoolsSaturated { max_stake: 100 },
            AllocatorError::InvariantViolation { expected: 10, actual: 9 },
            AllocatorError::Overflow,
            AllocatorError::Underflow,
            AllocatorError::InvalidConfig { reason: "zero threshold" },
        ];

        let codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        let unique: BTreeSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len(), "Error codes must be unique");
    }

    #[test]
    fn test_invariant_violation_is_fatal() {
        let err = AllocatorError::InvariantViolation { expected: 10, actual: 9 };
        assert!(!err.is_recoverable());
        assert!(AllocatorError::InsufficientStake { available: 1, requested: 2 }.is_recoverable());
    }

    #[test]
    fn test_display_messages() {
        let err = AllocatorError::InsufficientStake { available: 20, requested: 21 };
        assert!(err
            .to_string()
            .starts_with("requested withdrawal amount exceeds available user stakes"));

        let err = AllocatorError::NoValidAllocation { requested: 7 };
        assert_eq!(err.to_string(), "No valid combination to unstake requested amount: 7");
    }
}
