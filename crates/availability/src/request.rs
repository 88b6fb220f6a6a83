//! Booking requests and the decisions returned for them.
//!
//! Human confirmation is modelled as data: a decision may carry
//! [`AuthorizationPrompt`]s, and the operator answers by resubmitting the
//! same request with the matching [`Authorizations`] flags set.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use venue_core::error::{AllocationError, CoreError};
use venue_core::laser::AllocationMode;
use venue_core::overbooking::OverbookingReport;
use venue_core::plan::BookingPlan;
use venue_core::snapshot::{BookingKind, GameArea, GameSession};
use venue_core::types::{Count, EntityId};
use venue_core::vests::{SpareVestAuthorization, VestCheck};
use venue_core::window::TimeWindow;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Operator confirmations attached to one submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Authorizations {
    pub overbooking: bool,
    pub spare_vests: bool,
    pub under_capacity_room: bool,
}

impl Authorizations {
    pub fn all() -> Self {
        Self {
            overbooking: true,
            spare_vests: true,
            under_capacity_room: true,
        }
    }

    pub fn spare_vest_authorization(&self) -> SpareVestAuthorization {
        if self.spare_vests {
            SpareVestAuthorization::Granted
        } else {
            SpareVestAuthorization::NotGranted
        }
    }
}

/// A new booking, or an edit of `exclude_booking_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub branch_id: EntityId,
    pub participants: Count,
    pub plan: BookingPlan,
    #[serde(default)]
    pub exclude_booking_id: Option<EntityId>,
    #[serde(default)]
    pub laser_mode: AllocationMode,
    #[serde(default)]
    pub authorizations: Authorizations,
}

impl BookingRequest {
    pub fn new(branch_id: EntityId, participants: Count, plan: BookingPlan) -> Self {
        Self {
            branch_id,
            participants,
            plan,
            exclude_booking_id: None,
            laser_mode: AllocationMode::Auto,
            authorizations: Authorizations::default(),
        }
    }

    pub fn editing(mut self, booking_id: EntityId) -> Self {
        self.exclude_booking_id = Some(booking_id);
        self
    }

    pub fn with_laser_mode(mut self, mode: AllocationMode) -> Self {
        self.laser_mode = mode;
        self
    }

    pub fn authorized(mut self, authorizations: Authorizations) -> Self {
        self.authorizations = authorizations;
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.participants == 0 {
            return Err(CoreError::Validation(
                "Participant count must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// One session the caller should persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedSession {
    pub area: GameArea,
    pub window: TimeWindow,
    pub laser_room_id: Option<EntityId>,
    pub session_order: u32,
}

impl From<GameSession> for ProposedSession {
    fn from(session: GameSession) -> Self {
        Self {
            area: session.area,
            window: session.window,
            laser_room_id: session.laser_room_id,
            session_order: session.session_order,
        }
    }
}

/// Proposed assignment for the booking. Advisory until the caller commits
/// it under its own serialization guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingProposal {
    pub kind: BookingKind,
    pub participants: Count,
    pub window: TimeWindow,
    pub sessions: Vec<ProposedSession>,
    pub event_room_id: Option<EntityId>,
}

/// Something an operator must confirm before the booking is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "prompt", rename_all = "snake_case")]
pub enum AuthorizationPrompt {
    Overbooking { report: OverbookingReport },
    SpareVests { session_order: u32, window: TimeWindow, check: VestCheck },
    UnderCapacityRoom { room_id: EntityId, capacity: Count, participants: Count },
}

/// Why a request cannot be booked at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rejection", rename_all = "snake_case")]
pub enum Rejection {
    Closed { date: NaiveDate },
    OutsideOperatingHours { operating_window: TimeWindow },
    Allocation { error: AllocationError },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AvailabilityDecision {
    Confirmed {
        proposal: BookingProposal,
    },
    NeedsAuthorization {
        prompts: Vec<AuthorizationPrompt>,
        proposal: BookingProposal,
    },
    Rejected {
        rejection: Rejection,
    },
}

impl AvailabilityDecision {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }

    pub fn proposal(&self) -> Option<&BookingProposal> {
        match self {
            Self::Confirmed { proposal } | Self::NeedsAuthorization { proposal, .. } => Some(proposal),
            Self::Rejected { .. } => None,
        }
    }
}

impl From<AllocationError> for AvailabilityDecision {
    fn from(error: AllocationError) -> Self {
        Self::Rejected {
            rejection: Rejection::Allocation { error },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use venue_core::plan::{GamePlan, PlanArea};

    fn plan() -> BookingPlan {
        BookingPlan::Game {
            start: chrono::Utc.with_ymd_and_hms(2025, 3, 14, 10, 0, 0).unwrap(),
            games: GamePlan {
                area: PlanArea::Active,
                number_of_games: 1,
            },
        }
    }

    #[test]
    fn zero_participants_fail_fast() {
        let request = BookingRequest::new(EntityId::new_v4(), 0, plan());
        assert!(request.validate().is_err());
    }

    #[test]
    fn authorizations_default_to_withheld() {
        let request = BookingRequest::new(EntityId::new_v4(), 4, plan());
        assert_eq!(request.authorizations, Authorizations::default());
        assert_eq!(
            request.authorizations.spare_vest_authorization(),
            SpareVestAuthorization::NotGranted
        );
    }

    #[test]
    fn granted_spares_map_to_core_flag() {
        assert_eq!(
            Authorizations::all().spare_vest_authorization(),
            SpareVestAuthorization::Granted
        );
    }
}
