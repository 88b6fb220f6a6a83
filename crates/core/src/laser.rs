//! Laser room allocation.
//!
//! Remaining capacity per room is computed fresh for every call:
//!
//! 1. Any other booking playing one game across several rooms at an
//!    overlapping time ("maxi") blocks the whole laser area.
//! 2. A room hosting a group of at least `laser_exclusive_threshold` is full.
//! 3. Otherwise a room has `capacity - Σ participants` already placed in it.
//!
//! Overlap is exact half-open interval overlap, not slice-quantized.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::capacity::active_laser_rooms_ascending;
use crate::error::{AllocationError, CoreError};
use crate::snapshot::{Booking, BranchSnapshot, GameArea, GameSession};
use crate::types::{Count, EntityId};
use crate::window::TimeWindow;

// ---------------------------------------------------------------------------
// Request / result
// ---------------------------------------------------------------------------

/// How rooms are picked. Forced modes skip the search and only check that
/// the targeted rooms have enough remaining capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMode {
    #[default]
    Auto,
    /// The smallest active room.
    SmallForced,
    /// The largest active room.
    LargeForced,
    /// Every active room at once.
    MaxiForced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaserRequest {
    pub participants: Count,
    pub window: TimeWindow,
    pub exclude_booking_id: Option<EntityId>,
    #[serde(default)]
    pub mode: AllocationMode,
}

impl LaserRequest {
    pub fn new(participants: Count, window: TimeWindow) -> Result<Self, CoreError> {
        if participants == 0 {
            return Err(CoreError::Validation(
                "Participant count must be positive".to_string(),
            ));
        }
        Ok(Self {
            participants,
            window,
            exclude_booking_id: None,
            mode: AllocationMode::Auto,
        })
    }

    pub fn excluding(mut self, booking_id: Option<EntityId>) -> Self {
        self.exclude_booking_id = booking_id;
        self
    }

    pub fn with_mode(mut self, mode: AllocationMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Rooms assigned to one logical game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaserAllocation {
    pub room_ids: Vec<EntityId>,
    pub requires_two_rooms: bool,
}

impl LaserAllocation {
    fn new(room_ids: Vec<EntityId>) -> Self {
        let requires_two_rooms = room_ids.len() > 1;
        Self {
            room_ids,
            requires_two_rooms,
        }
    }

    /// One session per allocated room, all sharing `session_order`.
    pub fn sessions(&self, window: TimeWindow, session_order: u32) -> Vec<GameSession> {
        self.room_ids
            .iter()
            .map(|room_id| GameSession {
                area: GameArea::Laser,
                window,
                laser_room_id: Some(*room_id),
                session_order,
            })
            .collect()
    }
}

/// Remaining capacity of one active room for a given window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomAvailability {
    pub room_id: EntityId,
    pub capacity: Count,
    pub remaining: Count,
    /// Someone else plays in this room during the window.
    pub occupied: bool,
}

// ---------------------------------------------------------------------------
// Remaining capacity
// ---------------------------------------------------------------------------

/// Whether `booking` plays a single game across several rooms during `window`.
fn uses_several_rooms(booking: &Booking, window: &TimeWindow) -> bool {
    let mut rooms_by_game: HashMap<u32, HashSet<EntityId>> = HashMap::new();
    for session in booking.laser_sessions_during(window) {
        if let Some(room_id) = session.laser_room_id {
            rooms_by_game
                .entry(session.session_order)
                .or_default()
                .insert(room_id);
        }
    }
    rooms_by_game.values().any(|rooms| rooms.len() > 1)
}

fn plays_in_room(booking: &Booking, window: &TimeWindow, room_id: EntityId) -> bool {
    booking
        .laser_sessions_during(window)
        .any(|s| s.laser_room_id == Some(room_id))
}

/// Remaining capacity of every active laser room, smallest room first.
pub fn room_availability(
    snapshot: &BranchSnapshot,
    window: &TimeWindow,
    exclude_booking_id: Option<EntityId>,
) -> Vec<RoomAvailability> {
    let threshold = snapshot.config.laser_exclusive_threshold;
    let overlapping: Vec<&Booking> = snapshot
        .other_bookings(exclude_booking_id)
        .filter(|b| b.laser_sessions_during(window).next().is_some())
        .collect();
    let maxi_in_progress = overlapping.iter().any(|b| uses_several_rooms(b, window));

    active_laser_rooms_ascending(&snapshot.laser_rooms)
        .into_iter()
        .map(|room| {
            let occupants: Vec<&&Booking> = overlapping
                .iter()
                .filter(|b| plays_in_room(b, window, room.id))
                .collect();
            let exclusive = occupants
                .iter()
                .any(|b| b.participants_count >= threshold);
            let remaining = if maxi_in_progress || exclusive {
                0
            } else {
                let placed: Count = occupants.iter().map(|b| b.participants_count).sum();
                room.capacity.saturating_sub(placed)
            };
            RoomAvailability {
                room_id: room.id,
                capacity: room.capacity,
                remaining,
                occupied: maxi_in_progress || !occupants.is_empty(),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

/// Assign one or more laser rooms, or fail with [`AllocationError::NoLaserRoom`].
pub fn allocate_laser_rooms(
    snapshot: &BranchSnapshot,
    request: &LaserRequest,
) -> Result<LaserAllocation, AllocationError> {
    let rooms = room_availability(snapshot, &request.window, request.exclude_booking_id);
    let participants = request.participants;
    let threshold = snapshot.config.laser_exclusive_threshold;

    let allocation = match request.mode {
        AllocationMode::Auto => allocate_auto(&rooms, participants, threshold),
        AllocationMode::SmallForced => rooms.first().and_then(|r| single_room(r, participants)),
        AllocationMode::LargeForced => rooms.last().and_then(|r| single_room(r, participants)),
        AllocationMode::MaxiForced => every_room(&rooms, participants),
    };

    match allocation {
        Some(allocation) => {
            tracing::debug!(
                participants,
                window = %request.window,
                mode = ?request.mode,
                rooms = ?allocation.room_ids,
                "Allocated laser rooms"
            );
            Ok(allocation)
        }
        None => {
            tracing::warn!(
                participants,
                window = %request.window,
                mode = ?request.mode,
                "No laser room available"
            );
            Err(AllocationError::NoLaserRoom {
                participants,
                start: request.window.start(),
                end: request.window.end(),
            })
        }
    }
}

fn allocate_auto(
    rooms: &[RoomAvailability],
    participants: Count,
    threshold: Count,
) -> Option<LaserAllocation> {
    let largest = rooms.iter().map(|r| r.capacity).max()?;

    if participants > largest {
        return combined_rooms(rooms, participants);
    }

    if participants >= threshold {
        // Prefer playing alone; fall back to sharing.
        return rooms
            .iter()
            .find(|r| !r.occupied && r.remaining >= participants)
            .or_else(|| rooms.iter().find(|r| r.remaining >= participants))
            .map(|r| LaserAllocation::new(vec![r.room_id]));
    }

    rooms
        .iter()
        .find(|r| r.remaining >= participants)
        .map(|r| LaserAllocation::new(vec![r.room_id]))
}

fn single_room(room: &RoomAvailability, participants: Count) -> Option<LaserAllocation> {
    (room.remaining >= participants).then(|| LaserAllocation::new(vec![room.room_id]))
}

/// Spread an oversized group over every room that still has space.
///
/// Rooms with nothing left (blocked by an exclusive group) are left out so a
/// combined allocation never intrudes on an exclusive room.
fn combined_rooms(rooms: &[RoomAvailability], participants: Count) -> Option<LaserAllocation> {
    let usable: Vec<&RoomAvailability> = rooms.iter().filter(|r| r.remaining > 0).collect();
    let total: Count = usable.iter().map(|r| r.remaining).sum();
    if usable.is_empty() || total < participants {
        return None;
    }
    Some(LaserAllocation::new(
        usable.into_iter().map(|r| r.room_id).collect(),
    ))
}

/// Take every active room at once. Fails if any of them is unusable, so a
/// forced maxi never silently shrinks to fewer rooms.
fn every_room(rooms: &[RoomAvailability], participants: Count) -> Option<LaserAllocation> {
    if rooms.is_empty() || rooms.iter().any(|r| r.remaining == 0) {
        return None;
    }
    let total: Count = rooms.iter().map(|r| r.remaining).sum();
    (total >= participants).then(|| LaserAllocation::new(rooms.iter().map(|r| r.room_id).collect()))
}
