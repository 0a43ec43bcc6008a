//! Dual-Pool Staking Allocator
//!
//! Decides how a stake or unstake is split across the two pools of a
//! delegation pair.
//!
//! ## Pure Calculator (No Chain Access)
//!
//! Every function here is a pure function of its inputs:
//! - Callers read pool balances, the participation threshold and the user's
//!   positions from chain *before* calling in
//! - The allocator returns per-pool amounts, nothing else
//! - Each non-zero amount becomes one outbound message, built and signed by
//!   the caller
//!
//! The standalone functions ([`calculate_stake_pool_amount`],
//! [`calculate_unstake_pool_amount`], [`select_pool`], ...) take raw
//! readings. [`allocate`] runs the same rules from an [`AllocatorConfig`]
//! and records an event for every call.

#![cfg_attr(not(feature = "std"), no_std)]

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use dualstake_common::{
    constants::pool::{MIN_PARTICIPATION_STAKE, MIN_POOL_STAKE},
    AllocationEvent, AllocatorError, AllocatorResult, Amount, EventLog, PendingUnstakeRequest,
    PoolIndex, PoolPair, RequestId, SelectPoolRequest, StakePlan, StakeRequest, UnstakePlan,
    UnstakePosition, UnstakeRequest, Vec,
};

pub mod select;
pub mod stake;
pub mod unstake;


pub use select::{plan_selection, select_pool, select_pool_with_max_stake};
pub use stake::{calculate_stake_pool_amount, plan_stake};
pub use unstake::{
    calculate_unstake_pool_amount, calculate_unstake_pool_amount_with_pending, plan_unstake,
    plan_unstake_with_pending,
};

// ============ Allocator Config ============

/// Network parameters shared by every allocation on a pool pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AllocatorConfig {
    /// Balance a pool needs to participate
    pub minimum_participation_stake: Amount,
    /// Smallest non-zero stake each pool accepts
    pub min_pool_stakes: PoolPair<Amount>,
    /// Pools at or above this balance are skipped by selection
    pub max_pool_stake: Option<Amount>,
    /// Smallest position a user may leave behind when unstaking (0 = any)
    pub min_remaining_stake: Amount,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            minimum_participation_stake: MIN_PARTICIPATION_STAKE,
            min_pool_stakes: [MIN_POOL_STAKE, MIN_POOL_STAKE],
            max_pool_stake: None,
            min_remaining_stake: 0,
        }
    }
}

impl AllocatorConfig {
    /// Reject configurations no allocation could satisfy
    pub fn validate(&self) -> AllocatorResult<()> {
        if self.minimum_participation_stake == 0 {
            return Err(AllocatorError::InvalidConfig {
                reason: "participation threshold must be non-zero",
            });
        }

        if let Some(max_stake) = self.max_pool_stake {
            if max_stake <= self.minimum_participation_stake {
                return Err(AllocatorError::InvalidConfig {
                    reason: "max pool stake must exceed the participation threshold",
                });
            }
        }

        Ok(())
    }
}

// ============ Actions ============

/// Allocation requested by the transaction-building layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum AllocationAction {
    /// Spread a stake across the pair
    Stake {
        amount: Amount,
        current_balances: PoolPair<Amount>,
    },
    /// Withdraw within plain per-pool limits
    Unstake {
        amount: Amount,
        current_balances: PoolPair<Amount>,
        user_max_unstake_amounts: PoolPair<Amount>,
    },
    /// Withdraw given full positions, pending amounts included
    UnstakeWithPending {
        amount: Amount,
        current_balances: PoolPair<Amount>,
        positions: PoolPair<UnstakePosition>,
    },
    /// Pick a single pool
    SelectPool { current_balances: PoolPair<Amount> },
}

/// Result of an [`AllocationAction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationOutcome {
    Stake(StakePlan),
    Unstake(UnstakePlan),
    Pool(PoolIndex),
}

// ============ Allocation Context ============

/// Config plus the event log filled by [`allocate`]
#[derive(Debug, Clone, Default)]
pub struct AllocationContext {
    /// Network parameters
    pub config: AllocatorConfig,
    /// Event log
    pub events: EventLog,
}

impl AllocationContext {
    /// Create a context with an empty event log
    pub fn new(config: AllocatorConfig) -> Self {
        Self {
            config,
            events: EventLog::new(),
        }
    }

    /// Hand over the recorded events, leaving the log empty
    pub fn take_events(&mut self) -> Vec<AllocationEvent> {
        core::mem::take(&mut self.events).into_events()
    }
}

/// Main allocation entry point
///
/// Runs `action` against the context's config and records exactly one event,
/// `AllocationRejected` on failure.
pub fn allocate(
    ctx: &mut AllocationContext,
    action: &AllocationAction,
) -> AllocatorResult<AllocationOutcome> {
    let config = &ctx.config;
    let (request_id, result) = match *action {
        AllocationAction::Stake {
            amount,
            current_balances,
        } => {
            let request = StakeRequest {
                amount,
                minimum_participation_stake: config.minimum_participation_stake,
                current_balances,
                min_pool_stakes: config.min_pool_stakes,
            };
            let result = config
                .validate()
                .and_then(|_| plan_stake(&request))
                .map(AllocationOutcome::Stake);
            (request.fingerprint(), result)
        }
        AllocationAction::Unstake {
            amount,
            current_balances,
            user_max_unstake_amounts,
        } => {
            let request = UnstakeRequest {
                amount,
                minimum_participation_stake: config.minimum_participation_stake,
                current_balances,
                user_max_unstake_amounts,
            };
            let result = config
                .validate()
                .and_then(|_| plan_unstake(&request))
                .map(AllocationOutcome::Unstake);
            (request.fingerprint(), result)
        }
        AllocationAction::UnstakeWithPending {
            amount,
            current_balances,
            positions,
        } => {
            let request = PendingUnstakeRequest {
                amount,
                minimum_participation_stake: config.minimum_participation_stake,
                current_balances,
                positions,
                min_remaining_stake: config.min_remaining_stake,
            };
            let result = config
                .validate()
                .and_then(|_| plan_unstake_with_pending(&request))
                .map(AllocationOutcome::Unstake);
            (request.fingerprint(), result)
        }
        AllocationAction::SelectPool { current_balances } => {
            let request = SelectPoolRequest {
                minimum_participation_stake: config.minimum_participation_stake,
                current_balances,
                max_stake: config.max_pool_stake,
            };
            let result = config
                .validate()
                .and_then(|_| plan_selection(&request))
                .map(AllocationOutcome::Pool);
            (request.fingerprint(), result)
        }
    };

    match &result {
        Ok(outcome) => ctx.events.emit(outcome_event(request_id, action, outcome)),
        Err(err) => {
            tracing::warn!(code = err.code(), %err, "allocation rejected");
            ctx.events.emit(AllocationEvent::AllocationRejected {
                request_id,
                code: err.code().into(),
            });
        }
    }

    result
}

fn outcome_event(
    request_id: RequestId,
    action: &AllocationAction,
    outcome: &AllocationOutcome,
) -> AllocationEvent {
    let amount = match *action {
        AllocationAction::Stake { amount, .. }
        | AllocationAction::Unstake { amount, .. }
        | AllocationAction::UnstakeWithPending { amount, .. } => amount,
        AllocationAction::SelectPool { .. } => 0,
    };

    match *outcome {
        AllocationOutcome::Stake(plan) => AllocationEvent::StakeAllocated {
            request_id,
            amount,
            amounts: plan.amounts,
            strategy: plan.strategy,
        },
        AllocationOutcome::Unstake(plan) => AllocationEvent::UnstakeAllocated {
            request_id,
            amount,
            amounts: plan.amounts,
            deactivated: plan.deactivated,
        },
        AllocationOutcome::Pool(pool) => AllocationEvent::PoolSelected { request_id, pool },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualstake_common::{EventType, StakeStrategy};

    fn test_config() -> AllocatorConfig {
        AllocatorConfig {
            minimum_participation_stake: 1000,
            min_pool_stakes: [1, 1],
            max_pool_stake: None,
            min_remaining_stake: 0,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(AllocatorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_rejects_low_max_stake() {
        let config = AllocatorConfig {
            max_pool_stake: Some(1000),
            ..test_config()
        };
        assert!(matches!(config.validate(), Err(AllocatorError::InvalidConfig { .. })));
    }

    #[test]
    fn test_config_rejects_zero_threshold() {
        let config = AllocatorConfig {
            minimum_participation_stake: 0,
            ..test_config()
        };
        assert!(matches!(config.validate(), Err(AllocatorError::InvalidConfig { .. })));
    }

    #[test]
    fn test_stake_action_records_event() {
        let mut ctx = AllocationContext::new(test_config());
        let action = AllocationAction::Stake {
            amount: 1000,
            current_balances: [500, 1500],
        };

        let outcome = allocate(&mut ctx, &action).unwrap();
        let AllocationOutcome::Stake(plan) = outcome else {
            panic!("expected a stake plan, got {outcome:?}");
        };
        assert_eq!(plan.amounts, [750, 250]);
        assert_eq!(plan.strategy, StakeStrategy::ActivateOne);

        assert_eq!(ctx.events.len(), 1);
        match &ctx.events.events()[0] {
            AllocationEvent::StakeAllocated { amount, amounts, .. } => {
                assert_eq!(*amount, 1000);
                assert_eq!(*amounts, [750, 250]);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_rejected_action_records_error_code() {
        let mut ctx = AllocationContext::new(test_config());
        let action = AllocationAction::Unstake {
            amount: 21,
            current_balances: [2000, 2000],
            user_max_unstake_amounts: [10, 10],
        };

        let result = allocate(&mut ctx, &action);
        assert_eq!(
            result,
            Err(AllocatorError::InsufficientStake { available: 20, requested: 21 })
        );

        let rejected = ctx.events.filter_by_type(EventType::AllocationRejected);
        assert_eq!(rejected.len(), 1);
        match rejected[0] {
            AllocationEvent::AllocationRejected { code, .. } => {
                assert_eq!(code, "E011_INSUFFICIENT_STAKE");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_select_action_honors_max_stake() {
        let config = AllocatorConfig {
            max_pool_stake: Some(1200),
            ..test_config()
        };
        let mut ctx = AllocationContext::new(config);

        // Both pools at or above the max stake
        let outcome = allocate(
            &mut ctx,
            &AllocationAction::SelectPool {
                current_balances: [1250, 1300],
            },
        );
        assert_eq!(
            outcome,
            Err(AllocatorError::PoolsSaturated { max_stake: 1200 })
        );

        let outcome = allocate(
            &mut ctx,
            &AllocationAction::SelectPool {
                current_balances: [1250, 1100],
            },
        );
        assert_eq!(outcome, Ok(AllocationOutcome::Pool(1)));

        let events = ctx.take_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type(), EventType::AllocationRejected);
        assert_eq!(events[1].event_type(), EventType::PoolSelected);
        assert!(ctx.events.is_empty());
    }

    #[test]
    fn test_invalid_config_rejects_every_action() {
        let config = AllocatorConfig {
            max_pool_stake: Some(10),
            ..test_config()
        };
        let mut ctx = AllocationContext::new(config);
        let result = allocate(
            &mut ctx,
            &AllocationAction::Stake {
                amount: 1000,
                current_balances: [500, 1500],
            },
        );
        assert!(matches!(result, Err(AllocatorError::InvalidConfig { .. })));
        assert_eq!(ctx.events.filter_by_type(EventType::AllocationRejected).len(), 1);
    }

    #[test]
    fn test_pending_unstake_uses_config_dust_limit() {
        let config = AllocatorConfig {
            minimum_participation_stake: 10,
            min_pool_stakes: [1, 1],
            max_pool_stake: None,
            min_remaining_stake: 5,
        };
        let mut ctx = AllocationContext::new(config);
        let result = allocate(
            &mut ctx,
            &AllocationAction::UnstakeWithPending {
                amount: 17,
                current_balances: [100, 100],
                positions: [UnstakePosition::from_stake(10), UnstakePosition::from_stake(10)],
            },
        );
        assert_eq!(result, Err(AllocatorError::NoValidAllocation { requested: 17 }));
    }
}
