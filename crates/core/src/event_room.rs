//! Best-fit event room allocation with a degraded fallback.
//!
//! The smallest free room that seats everyone wins. Failing that, the
//! largest free room is offered as an under-capacity suggestion that an
//! operator must confirm.

use serde::{Deserialize, Serialize};

use crate::capacity::{active_event_rooms_ascending, EventRoom};
use crate::error::{AllocationError, CoreError};
use crate::snapshot::{BookingKind, BranchSnapshot};
use crate::types::{Count, EntityId};
use crate::window::TimeWindow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRoomRequest {
    pub participants: Count,
    /// The room window, not the game sessions inside it.
    pub window: TimeWindow,
    pub exclude_booking_id: Option<EntityId>,
}

impl EventRoomRequest {
    pub fn new(
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
            window,
            exclude_booking_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EventRoomOutcome {
    /// A free room seats everyone.
    Best { room_id: EntityId },
    /// Only smaller rooms are free; this is the largest of them.
    LowerCapacity {
        room_id: EntityId,
        capacity: Count,
        participants: Count,
    },
    /// Every active room is taken.
    NoneAvailable,
}

impl EventRoomOutcome {
    pub fn has_any_available_room(&self) -> bool {
        !matches!(self, Self::NoneAvailable)
    }

    pub fn room_id(&self) -> Option<EntityId> {
        match self {
            Self::Best { room_id } | Self::LowerCapacity { room_id, .. } => Some(*room_id),
            Self::NoneAvailable => None,
        }
    }

    /// Map [`NoneAvailable`](Self::NoneAvailable) to the hard failure.
    pub fn require_room(self, request: &EventRoomRequest) -> Result<Self, AllocationError> {
        match self {
            Self::NoneAvailable => Err(AllocationError::NoEventRoom {
                participants: request.participants,
                start: request.window.start(),
                end: request.window.end(),
            }),
            outcome => Ok(outcome),
        }
    }
}

/// Whether no other event holds `room` during `window`.
fn is_free(snapshot: &BranchSnapshot, room: &EventRoom, request: &EventRoomRequest) -> bool {
    !snapshot
        .other_bookings(request.exclude_booking_id)
        .any(|b| {
            b.kind == BookingKind::Event
                && b.event_room_id == Some(room.id)
                && b.window.overlaps(&request.window)
        })
}

/// Pick a room for an event.
pub fn allocate_event_room(snapshot: &BranchSnapshot, request: &EventRoomRequest) -> EventRoomOutcome {
    let ascending = active_event_rooms_ascending(&snapshot.event_rooms);
    let free: Vec<&EventRoom> = ascending
        .into_iter()
        .filter(|room| is_free(snapshot, room, request))
        .collect();

    let outcome = if let Some(room) = free.iter().find(|r| r.capacity >= request.participants) {
        EventRoomOutcome::Best { room_id: room.id }
    } else if let Some(room) = free
        .iter()
        .max_by(|a, b| a.capacity.cmp(&b.capacity).then(b.sort_order.cmp(&a.sort_order)))
    {
        EventRoomOutcome::LowerCapacity {
            room_id: room.id,
            capacity: room.capacity,
            participants: request.participants,
        }
    } else {
        EventRoomOutcome::NoneAvailable
    };

    match &outcome {
        EventRoomOutcome::Best { room_id } => {
            tracing::debug!(participants = request.participants, %room_id, "Allocated event room");
        }
        EventRoomOutcome::LowerCapacity { room_id, capacity, .. } => {
            tracing::info!(
                participants = request.participants,
                %room_id,
                capacity,
                "Only an under-capacity event room is free"
            );
        }
        EventRoomOutcome::NoneAvailable => {
            tracing::warn!(
                participants = request.participants,
                window = %request.window,
                "No event room available"
            );
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::capacity::BranchCapacityConfig;
    use crate::snapshot::fixtures::*;
    use crate::snapshot::Booking;

    const ROOM_30: u128 = 200;
    const ROOM_50: u128 = 201;
    const ROOM_20: u128 = 202;

    fn event_snapshot(bookings: Vec<Booking>) -> BranchSnapshot {
        let mut snap = snapshot(BranchCapacityConfig::default(), bookings);
        snap.event_rooms = vec![
            event_room(ROOM_50, 50, 1),
            event_room(ROOM_30, 30, 2),
            event_room(ROOM_20, 20, 3),
        ];
        snap
    }

    fn request(participants: Count) -> EventRoomRequest {
        EventRoomRequest::new(participants, window(14, 0, 16, 0), None).unwrap()
    }

    #[test]
    fn smallest_sufficient_room_wins() {
        let outcome = allocate_event_room(&event_snapshot(vec![]), &request(25));
        assert_eq!(outcome, EventRoomOutcome::Best { room_id: id(ROOM_30) });
    }

    #[test]
    fn occupied_rooms_are_skipped() {
        let snap = event_snapshot(vec![event_booking(1, 25, window(15, 0, 17, 0), id(ROOM_30))]);
        let outcome = allocate_event_room(&snap, &request(25));
        assert_eq!(outcome, EventRoomOutcome::Best { room_id: id(ROOM_50) });
    }

    #[test]
    fn touching_events_do_not_conflict() {
        let snap = event_snapshot(vec![event_booking(1, 25, window(16, 0, 18, 0), id(ROOM_30))]);
        let outcome = allocate_event_room(&snap, &request(25));
        assert_eq!(outcome, EventRoomOutcome::Best { room_id: id(ROOM_30) });
    }

    #[test]
    fn falls_back_to_largest_free_room() {
        let snap = event_snapshot(vec![event_booking(1, 45, window(14, 0, 16, 0), id(ROOM_50))]);
        let outcome = allocate_event_room(&snap, &request(40));
        assert_eq!(
            outcome,
            EventRoomOutcome::LowerCapacity {
                room_id: id(ROOM_30),
                capacity: 30,
                participants: 40,
            }
        );
        assert!(outcome.has_any_available_room());
    }

    #[test]
    fn nothing_free_is_a_hard_failure() {
        let mut snap = event_snapshot(vec![
            event_booking(1, 25, window(13, 0, 15, 0), id(ROOM_30)),
            event_booking(2, 45, window(15, 0, 17, 0), id(ROOM_50)),
        ]);
        snap.event_rooms.retain(|r| r.id != id(ROOM_20));
        let req = request(40);
        let outcome = allocate_event_room(&snap, &req);
        assert!(!outcome.has_any_available_room());
        assert_matches!(
            outcome.require_room(&req),
            Err(AllocationError::NoEventRoom { participants: 40, .. })
        );
    }

    #[test]
    fn edited_event_keeps_its_room() {
        let snap = event_snapshot(vec![event_booking(1, 25, window(14, 0, 16, 0), id(ROOM_30))]);
        let req = EventRoomRequest::new(25, window(14, 0, 16, 0), Some(id(1))).unwrap();
        assert_eq!(allocate_event_room(&snap, &req).room_id(), Some(id(ROOM_30)));
    }

    #[test]
    fn game_bookings_do_not_hold_event_rooms() {
        let mut game = active_booking(1, 25, window(14, 0, 16, 0));
        game.event_room_id = Some(id(ROOM_30));
        let snap = event_snapshot(vec![game]);
        assert_eq!(allocate_event_room(&snap, &request(25)).room_id(), Some(id(ROOM_30)));
    }

    #[test]
    fn inactive_rooms_are_ignored() {
        let mut snap = event_snapshot(vec![]);
        snap.event_rooms.iter_mut().for_each(|r| r.is_active = r.capacity < 30);
        let outcome = allocate_event_room(&snap, &request(25));
        assert_eq!(
            outcome,
            EventRoomOutcome::LowerCapacity {
                room_id: id(ROOM_20),
                capacity: 20,
                participants: 25,
            }
        );
    }
}
