//! Overbooking detection for a proposed booking.
//!
//! Advisory only: a violated slice never blocks on its own. The report holds
//! what an operator needs to see to authorize (or refuse) the booking.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::capacity::BranchCapacityConfig;
use crate::error::CoreError;
use crate::slices::slice_load;
use crate::snapshot::BranchSnapshot;
use crate::types::{Count, EntityId, Timestamp};
use crate::window::TimeWindow;

// ---------------------------------------------------------------------------
// Request / report
// ---------------------------------------------------------------------------

/// Generic load a new or edited booking would add.
///
/// `active_windows` holds the booking's ACTIVE sub-sessions only. An event
/// plan is decomposed before it gets here; LASER sub-sessions never appear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedLoad {
    pub participants: Count,
    pub active_windows: Vec<TimeWindow>,
    pub exclude_booking_id: Option<EntityId>,
}

impl ProposedLoad {
    /// A single ACTIVE window, the common GAME case.
    pub fn single(
        participants: Count,
        window: TimeWindow,
        exclude_booking_id: Option<EntityId>,
    ) -> Result<Self, CoreError> {
        if participants == 0 {
            return Err(CoreError::Validation(
                "Participant count must be positive".to_string(),
            ));
        }
        Ok(Self {
            participants,
            active_windows: vec![window],
            exclude_booking_id,
        })
    }
}

/// One 15-minute slice where generic capacity would be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceViolation {
    pub time: Timestamp,
    pub overbooked_count: Count,
    pub overbooked_slots: Count,
    pub total_participants: Count,
    pub capacity: Count,
}

/// Every violated slice plus the worst one as the headline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverbookingReport {
    pub violations: Vec<SliceViolation>,
    pub worst: Option<SliceViolation>,
}

impl OverbookingReport {
    pub fn is_overbooked(&self) -> bool {
        !self.violations.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Check every slice touched by the proposal against total capacity.
///
/// The worst slice is the one with the largest overbooked count; the
/// earliest wins a tie.
pub fn detect_overbooking(snapshot: &BranchSnapshot, proposal: &ProposedLoad) -> OverbookingReport {
    let config = &snapshot.config;

    let touched: BTreeSet<TimeWindow> = proposal
        .active_windows
        .iter()
        .flat_map(TimeWindow::slices)
        .collect();

    let mut report = OverbookingReport::default();
    for slice in touched {
        let existing = slice_load(
            snapshot.other_bookings(proposal.exclude_booking_id),
            config,
            &slice,
            None,
        );
        let total_participants = existing.total_participants.saturating_add(proposal.participants);
        if let Some(violation) = violation_at(config, slice.start(), total_participants) {
            if report
                .worst
                .map_or(true, |w| violation.overbooked_count > w.overbooked_count)
            {
                report.worst = Some(violation);
            }
            report.violations.push(violation);
        }
    }

    if let Some(worst) = &report.worst {
        tracing::info!(
            participants = proposal.participants,
            slices = report.violations.len(),
            worst_time = %worst.time,
            overbooked_count = worst.overbooked_count,
            "Proposed booking overbooks generic capacity"
        );
    }
    report
}

fn violation_at(
    config: &BranchCapacityConfig,
    time: Timestamp,
    total_participants: Count,
) -> Option<SliceViolation> {
    let capacity = config.total_capacity();
    if total_participants <= capacity {
        return None;
    }
    let overbooked_count = total_participants - capacity;
    Some(SliceViolation {
        time,
        overbooked_count,
        overbooked_slots: config.slots_for(overbooked_count),
        total_participants,
        capacity,
    })
}
