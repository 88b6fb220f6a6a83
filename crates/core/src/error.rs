use crate::types::{Count, Timestamp};

/// Caller contract violations detected at the engine boundary.
///
/// Well-formed input never produces a `CoreError` from an allocator; these
/// are raised by the constructors and `validate` helpers that sit in front.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Hard allocation failures. Fatal to the current booking attempt; the
/// message carries what the operator needs to see.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AllocationError {
    #[error("No laser room available for {participants} participants at {start}")]
    NoLaserRoom {
        participants: Count,
        start: Timestamp,
        end: Timestamp,
    },

    #[error(
        "Not enough vests for {participants} participants at {start}: \
         {total_with_new} needed, {ceiling} available including spares"
    )]
    VestCapacityExceeded {
        participants: Count,
        start: Timestamp,
        total_with_new: Count,
        ceiling: Count,
    },

    #[error("No event room available for {participants} participants at {start}")]
    NoEventRoom {
        participants: Count,
        start: Timestamp,
        end: Timestamp,
    },
}
