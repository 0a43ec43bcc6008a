//! Allocation Events
//!
//! Every allocation call records one event so that callers can index
//! decisions off-chain next to the transactions they produced.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::types::{Amount, PoolIndex, PoolPair, RequestId, StakeStrategy};
use crate::{String, Vec};

/// Event types for indexing and filtering
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    StakeAllocated = 0x01,
    UnstakeAllocated = 0x02,
    PoolSelected = 0x03,
    AllocationRejected = 0x10,
}

/// Main event enum containing all allocation events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum AllocationEvent {
    /// Emitted when a stake is split across the pair
    StakeAllocated {
        request_id: RequestId,
        amount: Amount,
        amounts: PoolPair<Amount>,
        strategy: StakeStrategy,
    },

    /// Emitted when an unstake is split across the pair
    UnstakeAllocated {
        request_id: RequestId,
        amount: Amount,
        amounts: PoolPair<Amount>,
        deactivated: PoolPair<bool>,
    },

    /// Emitted when a single pool is picked
    PoolSelected {
        request_id: RequestId,
        pool: PoolIndex,
    },

    /// Emitted when a request fails
    AllocationRejected {
        request_id: RequestId,
        code: String,
    },
}

impl AllocationEvent {
    /// Get the event type
    pub fn event_type(&self) -> EventType {
        match self {
            Self::StakeAllocated { .. } => EventType::StakeAllocated,
            Self::UnstakeAllocated { .. } => EventType::UnstakeAllocated,
            Self::PoolSelected { .. } => EventType::PoolSelected,
            Self::AllocationRejected { .. } => EventType::AllocationRejected,
        }
    }

    /// Fingerprint of the request this event belongs to
    pub fn request_id(&self) -> &RequestId {
        match self {
            Self::StakeAllocated { request_id, .. }
            | Self::UnstakeAllocated { request_id, .. }
            | Self::PoolSelected { request_id, .. }
            | Self::AllocationRejected { request_id, .. } => request_id,
        }
    }
}

/// Event log for collecting events during allocation
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<AllocationEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: AllocationEvent) {
        tracing::debug!(event_type = ?event.event_type(), "allocation event");
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[AllocationEvent] {
        &self.events
    }

    /// Take ownership of all events
    pub fn into_events(self) -> Vec<AllocationEvent> {
        self.events
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&AllocationEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log() {
        let mut log = EventLog::new();

        log.emit(AllocationEvent::StakeAllocated {
            request_id: [1u8; 32],
            amount: 1000,
            amounts: [750, 250],
            strategy: StakeStrategy::ActivateOne,
        });

        log.emit(AllocationEvent::AllocationRejected {
            request_id: [2u8; 32],
            code: "E011_INSUFFICIENT_STAKE".into(),
        });

        assert_eq!(log.len(), 2);
        assert!(!log.is_empty());

        let stakes = log.filter_by_type(EventType::StakeAllocated);
        assert_eq!(stakes.len(), 1);
        assert_eq!(stakes[0].request_id(), &[1u8; 32]);

        let events = log.into_events();
        assert_eq!(events[1].event_type(), EventType::AllocationRejected);
    }

    #[test]
    fn test_event_borsh_encoding() {
        let event = AllocationEvent::UnstakeAllocated {
            request_id: [7u8; 32],
            amount: 15,
            amounts: [10, 5],
            deactivated: [false, false],
        };

        let bytes = borsh::to_vec(&event).unwrap();
        let decoded: AllocationEvent = borsh::from_slice(&bytes).unwrap();
        assert_eq!(decoded, event);
    }
}
