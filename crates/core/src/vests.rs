//! Vest inventory check for LASER sessions.
//!
//! Exceeding the primary inventory is soft: an operator may authorize the
//! spare vests, after which the same request is resubmitted with
//! [`SpareVestAuthorization::Granted`]. Exceeding primary plus spare is hard.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::AllocationError;
use crate::snapshot::BranchSnapshot;
use crate::types::{Count, EntityId};
use crate::window::TimeWindow;

/// Operator decision on spare-vest use, valid for one submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpareVestAuthorization {
    #[default]
    NotGranted,
    Granted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VestStatus {
    /// Within primary inventory, or spares already authorized.
    Available,
    /// Over primary inventory but within spares; needs an operator.
    SpareRequired,
    /// Over primary plus spare. Reject.
    Exceeded,
}

/// Vest usage for one LASER sub-session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestCheck {
    pub current_usage: Count,
    pub total_with_new: Count,
    pub total_vests: Count,
    pub spare_vests: Count,
    pub status: VestStatus,
}

impl VestCheck {
    pub fn needs_authorization(&self) -> bool {
        self.status == VestStatus::SpareRequired
    }

    /// Turn a hard violation into the operator-facing failure.
    pub fn into_result(
        self,
        participants: Count,
        window: &TimeWindow,
    ) -> Result<VestCheck, AllocationError> {
        if self.status == VestStatus::Exceeded {
            return Err(AllocationError::VestCapacityExceeded {
                participants,
                start: window.start(),
                total_with_new: self.total_with_new,
                ceiling: self.total_vests.saturating_add(self.spare_vests),
            });
        }
        Ok(self)
    }
}

/// Vests worn by other bookings during `window`.
///
/// A booking counts once even when one game spans several rooms.
pub fn current_vest_usage(
    snapshot: &BranchSnapshot,
    window: &TimeWindow,
    exclude_booking_id: Option<EntityId>,
) -> Count {
    let mut seen: HashSet<EntityId> = HashSet::new();
    snapshot
        .other_bookings(exclude_booking_id)
        .filter(|b| b.laser_sessions_during(window).next().is_some())
        .filter(|b| seen.insert(b.id))
        .map(|b| b.participants_count)
        .sum()
}

/// Classify vest usage for `participants` more players during `window`.
pub fn check_vests(
    snapshot: &BranchSnapshot,
    window: &TimeWindow,
    participants: Count,
    exclude_booking_id: Option<EntityId>,
    authorization: SpareVestAuthorization,
) -> VestCheck {
    let config = &snapshot.config;
    let current_usage = current_vest_usage(snapshot, window, exclude_booking_id);
    let total_with_new = current_usage.saturating_add(participants);

    let status = if total_with_new > config.vest_ceiling() {
        VestStatus::Exceeded
    } else if total_with_new > config.laser_total_vests
        && authorization == SpareVestAuthorization::NotGranted
    {
        VestStatus::SpareRequired
    } else {
        VestStatus::Available
    };

    tracing::debug!(
        current_usage,
        total_with_new,
        total_vests = config.laser_total_vests,
        spare_vests = config.laser_spare_vests,
        ?status,
        "Checked vest inventory"
    );

    VestCheck {
        current_usage,
        total_with_new,
        total_vests: config.laser_total_vests,
        spare_vests: config.laser_spare_vests,
        status,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::capacity::BranchCapacityConfig;
    use crate::snapshot::fixtures::*;

    fn config() -> BranchCapacityConfig {
        BranchCapacityConfig {
            laser_total_vests: 20,
            laser_spare_vests: 5,
            ..Default::default()
        }
    }

    fn busy_snapshot() -> BranchSnapshot {
        snapshot(
            config(),
            vec![
                laser_booking(1, 8, window(10, 0, 10, 30), &[id(100)]),
                laser_booking(2, 10, window(10, 15, 10, 45), &[id(101)]),
                active_booking(3, 40, window(10, 0, 11, 0)),
            ],
        )
    }

    #[test]
    fn within_primary_inventory() {
        let check = check_vests(&busy_snapshot(), &window(10, 0, 10, 30), 2, None, Default::default());
        assert_eq!(check.current_usage, 18);
        assert_eq!(check.total_with_new, 20);
        assert_eq!(check.status, VestStatus::Available);
    }

    #[test]
    fn spare_vests_need_authorization() {
        let check = check_vests(&busy_snapshot(), &window(10, 0, 10, 30), 4, None, Default::default());
        assert_eq!(check.total_with_new, 22);
        assert_eq!(check.status, VestStatus::SpareRequired);
        assert!(check.needs_authorization());
    }

    #[test]
    fn authorization_clears_soft_violation() {
        let check = check_vests(
            &busy_snapshot(),
            &window(10, 0, 10, 30),
            4,
            None,
            SpareVestAuthorization::Granted,
        );
        assert_eq!(check.status, VestStatus::Available);
    }

    #[test]
    fn authorization_never_clears_hard_violation() {
        let w = window(10, 0, 10, 30);
        let check = check_vests(&busy_snapshot(), &w, 8, None, SpareVestAuthorization::Granted);
        assert_eq!(check.status, VestStatus::Exceeded);
        assert_matches!(
            check.into_result(8, &w),
            Err(AllocationError::VestCapacityExceeded { total_with_new: 26, ceiling: 25, .. })
        );
    }

    #[test]
    fn status_is_monotonic_in_participants() {
        let snap = busy_snapshot();
        let w = window(10, 0, 10, 30);
        let rank = |s: VestStatus| match s {
            VestStatus::Available => 0,
            VestStatus::SpareRequired => 1,
            VestStatus::Exceeded => 2,
        };
        let mut last_total = 0;
        let mut last_rank = 0;
        for participants in 1..=20 {
            let check = check_vests(&snap, &w, participants, None, Default::default());
            assert!(check.total_with_new >= last_total);
            assert!(rank(check.status) >= last_rank);
            last_total = check.total_with_new;
            last_rank = rank(check.status);
        }
        assert_eq!(last_rank, 2);
    }

    #[test]
    fn maxi_booking_counts_once() {
        let snap = snapshot(
            config(),
            vec![laser_booking(1, 18, window(10, 0, 10, 30), &[id(100), id(101)])],
        );
        assert_eq!(current_vest_usage(&snap, &window(10, 0, 10, 30), None), 18);
    }

    #[test]
    fn laser_session_without_room_still_wears_vests() {
        let mut booking = laser_booking(1, 6, window(10, 0, 10, 30), &[id(100)]);
        booking.sessions[0].laser_room_id = None;
        let snap = snapshot(config(), vec![booking]);
        assert_eq!(current_vest_usage(&snap, &window(10, 0, 10, 30), None), 6);
    }

    #[test]
    fn edited_booking_is_excluded() {
        let usage = current_vest_usage(&busy_snapshot(), &window(10, 0, 10, 30), Some(id(2)));
        assert_eq!(usage, 8);
    }

    #[test]
    fn active_sessions_use_no_vests() {
        let usage = current_vest_usage(&busy_snapshot(), &window(10, 45, 11, 0), None);
        assert_eq!(usage, 0);
    }
}
