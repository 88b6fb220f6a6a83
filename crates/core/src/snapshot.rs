//! Read-only view of a branch's bookings, passed into every allocator call.
//!
//! The engine never reads ambient state: everything it knows about existing
//! bookings and rooms arrives in a [`BranchSnapshot`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::capacity::{BranchCapacityConfig, EventRoom, LaserRoom};
use crate::error::CoreError;
use crate::types::{Count, EntityId, Timestamp};
use crate::window::TimeWindow;

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Which capacity pool a game session draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameArea {
    Active,
    Laser,
}

/// One timed game. Sessions sharing a `session_order` in the same booking
/// are the same logical game spread over several laser rooms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    pub area: GameArea,
    pub window: TimeWindow,
    /// A LASER session stored without a room still wears vests but holds
    /// no specific room.
    pub laser_room_id: Option<EntityId>,
    /// 1-based.
    pub session_order: u32,
}

// ---------------------------------------------------------------------------
// Bookings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingKind {
    Game,
    Event,
}

/// An existing booking as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: EntityId,
    pub branch_id: EntityId,
    pub kind: BookingKind,
    pub participants_count: Count,
    /// Overall start/end. For events this is the room window.
    pub window: TimeWindow,
    #[serde(default)]
    pub sessions: Vec<GameSession>,
    pub event_room_id: Option<EntityId>,
    /// Stable tie-break for slot packing order.
    pub created_at: Timestamp,
}

impl Booking {
    /// Windows during which this booking draws on generic (ACTIVE) capacity.
    ///
    /// Legacy game bookings stored without sessions count as ACTIVE over
    /// their whole window.
    pub fn active_windows(&self) -> Vec<TimeWindow> {
        if self.sessions.is_empty() && self.kind == BookingKind::Game {
            return vec![self.window];
        }
        self.sessions
            .iter()
            .filter(|s| s.area == GameArea::Active)
            .map(|s| s.window)
            .collect()
    }

    /// Whether any ACTIVE window overlaps `window`.
    pub fn is_active_during(&self, window: &TimeWindow) -> bool {
        self.active_windows().iter().any(|w| w.overlaps(window))
    }

    /// LASER sessions overlapping `window`.
    pub fn laser_sessions_during<'a>(
        &'a self,
        window: &'a TimeWindow,
    ) -> impl Iterator<Item = &'a GameSession> + 'a {
        self.sessions
            .iter()
            .filter(move |s| s.area == GameArea::Laser && s.window.overlaps(window))
    }

    /// Reject bookings the engine cannot reason about.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.participants_count == 0 {
            return Err(CoreError::Validation(format!(
                "Booking {} has no participants",
                self.id
            )));
        }

        let mut by_order: HashMap<u32, TimeWindow> = HashMap::new();
        for session in &self.sessions {
            if session.session_order == 0 {
                return Err(CoreError::Validation(format!(
                    "Booking {} has a session with order 0",
                    self.id
                )));
            }
            match by_order.get(&session.session_order) {
                Some(existing) if *existing != session.window => {
                    return Err(CoreError::Validation(format!(
                        "Booking {} has sessions with order {} at different times",
                        self.id, session.session_order
                    )));
                }
                Some(_) => {}
                None => {
                    by_order.insert(session.session_order, session.window);
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Branch snapshot
// ---------------------------------------------------------------------------

/// Everything one allocator call needs to know about a branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchSnapshot {
    pub branch_id: EntityId,
    pub config: BranchCapacityConfig,
    pub laser_rooms: Vec<LaserRoom>,
    pub event_rooms: Vec<EventRoom>,
    pub bookings: Vec<Booking>,
}

impl BranchSnapshot {
    /// Bookings of this branch other than `exclude` (the booking being edited).
    pub fn other_bookings(&self, exclude: Option<EntityId>) -> impl Iterator<Item = &Booking> {
        let branch_id = self.branch_id;
        self.bookings
            .iter()
            .filter(move |b| b.branch_id == branch_id && Some(b.id) != exclude)
    }

    /// Validate every booking in the snapshot.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.bookings.iter().try_for_each(Booking::validate)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn legacy_game_booking_counts_as_active() {
        let mut booking = active_booking(1, 10, window(10, 0, 11, 0));
        booking.sessions.clear();
        assert_eq!(booking.active_windows(), vec![window(10, 0, 11, 0)]);
    }

    #[test]
    fn event_without_sessions_draws_no_active_capacity() {
        let booking = event_booking(1, 20, window(10, 0, 12, 0), id(100));
        assert!(booking.active_windows().is_empty());
    }

    #[test]
    fn laser_sessions_are_not_active() {
        let booking = laser_booking(1, 8, window(10, 0, 10, 30), &[id(100)]);
        assert!(!booking.is_active_during(&window(10, 0, 10, 30)));
        assert_eq!(booking.laser_sessions_during(&window(10, 15, 10, 45)).count(), 1);
    }

    #[test]
    fn zero_participants_is_rejected() {
        let booking = active_booking(1, 0, window(10, 0, 11, 0));
        assert!(booking.validate().is_err());
    }

    #[test]
    fn laser_session_without_room_is_accepted() {
        let mut booking = laser_booking(1, 4, window(18, 0, 18, 30), &[id(100)]);
        booking.sessions[0].laser_room_id = None;
        assert!(booking.validate().is_ok());
        assert_eq!(booking.laser_sessions_during(&window(18, 0, 18, 30)).count(), 1);
    }

    #[test]
    fn mismatched_session_order_windows_are_rejected() {
        let mut booking = laser_booking(1, 25, window(10, 0, 10, 30), &[id(100), id(101)]);
        booking.sessions[1].window = window(10, 30, 11, 0);
        assert!(booking.validate().is_err());
    }

    #[test]
    fn other_bookings_skips_excluded_and_foreign_branches() {
        let mut foreign = active_booking(3, 4, window(10, 0, 11, 0));
        foreign.branch_id = id(0xff);
        let snap = snapshot(
            BranchCapacityConfig::default(),
            vec![
                active_booking(1, 4, window(10, 0, 11, 0)),
                active_booking(2, 4, window(10, 0, 11, 0)),
                foreign,
            ],
        );
        let ids: Vec<_> = snap.other_bookings(Some(id(1))).map(|b| b.id).collect();
        assert_eq!(ids, vec![id(2)]);
    }
}
