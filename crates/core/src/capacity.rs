//! Branch capacity model: generic slots, laser rooms, vests and event rooms.
//!
//! Branch settings arrive loosely typed ([`BranchSettings`], every field
//! optional). [`BranchCapacityConfig::resolve`] validates them and applies
//! the defaults exactly once; nothing downstream falls back on its own.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::{Count, EntityId};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Participants that fit in one generic slot.
pub const DEFAULT_MAX_PARTICIPANTS_PER_SLOT: Count = 6;

/// Generic slots per branch.
pub const DEFAULT_TOTAL_SLOTS: Count = 14;

/// Group size from which a laser group plays alone in its room.
pub const DEFAULT_LASER_EXCLUSIVE_THRESHOLD: Count = 10;

/// Primary vest inventory.
pub const DEFAULT_LASER_TOTAL_VESTS: Count = 30;

/// Spare vests, usable only with operator authorization.
pub const DEFAULT_LASER_SPARE_VESTS: Count = 0;

/// Length of one game, in minutes.
pub const DEFAULT_GAME_DURATION_MINUTES: u32 = 30;

/// Break between two consecutive laser games, in minutes.
pub const DEFAULT_LASER_PAUSE_MINUTES: u32 = 30;

/// How long an event reserves its room, in minutes.
pub const DEFAULT_EVENT_ROOM_MINUTES: u32 = 120;

// ---------------------------------------------------------------------------
// Raw settings
// ---------------------------------------------------------------------------

/// Branch settings as stored by the surrounding application.
///
/// Missing fields take the `DEFAULT_*` values above.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct BranchSettings {
    #[validate(range(min = 1, max = 1000))]
    pub max_participants_per_slot: Option<Count>,
    #[validate(range(min = 1, max = 1000))]
    pub total_slots: Option<Count>,
    #[validate(range(min = 1))]
    pub laser_exclusive_threshold: Option<Count>,
    pub laser_total_vests: Option<Count>,
    pub laser_spare_vests: Option<Count>,
    #[validate(range(min = 5, max = 480))]
    pub game_duration_minutes: Option<u32>,
    #[validate(range(max = 240))]
    pub laser_pause_minutes: Option<u32>,
    #[validate(range(min = 15, max = 1440))]
    pub event_room_minutes: Option<u32>,
}

impl BranchSettings {
    /// Parse settings from their JSON representation.
    pub fn from_json(value: serde_json::Value) -> Result<Self, CoreError> {
        serde_json::from_value(value)
            .map_err(|e| CoreError::Validation(format!("Invalid branch settings: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Validated, fully-defaulted capacity configuration for one branch.
///
/// Immutable for the duration of one allocation call; loaded fresh per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchCapacityConfig {
    pub max_participants_per_slot: Count,
    pub total_slots: Count,
    pub laser_exclusive_threshold: Count,
    pub laser_total_vests: Count,
    pub laser_spare_vests: Count,
    pub game_duration_minutes: u32,
    pub laser_pause_minutes: u32,
    pub event_room_minutes: u32,
}

impl Default for BranchCapacityConfig {
    fn default() -> Self {
        Self {
            max_participants_per_slot: DEFAULT_MAX_PARTICIPANTS_PER_SLOT,
            total_slots: DEFAULT_TOTAL_SLOTS,
            laser_exclusive_threshold: DEFAULT_LASER_EXCLUSIVE_THRESHOLD,
            laser_total_vests: DEFAULT_LASER_TOTAL_VESTS,
            laser_spare_vests: DEFAULT_LASER_SPARE_VESTS,
            game_duration_minutes: DEFAULT_GAME_DURATION_MINUTES,
            laser_pause_minutes: DEFAULT_LASER_PAUSE_MINUTES,
            event_room_minutes: DEFAULT_EVENT_ROOM_MINUTES,
        }
    }
}

impl BranchCapacityConfig {
    /// Validate raw settings and fill in defaults.
    pub fn resolve(settings: &BranchSettings) -> Result<Self, CoreError> {
        settings
            .validate()
            .map_err(|e| CoreError::Validation(format!("Invalid branch settings: {e}")))?;

        let defaults = Self::default();
        Ok(Self {
            max_participants_per_slot: settings
                .max_participants_per_slot
                .unwrap_or(defaults.max_participants_per_slot),
            total_slots: settings.total_slots.unwrap_or(defaults.total_slots),
            laser_exclusive_threshold: settings
                .laser_exclusive_threshold
                .unwrap_or(defaults.laser_exclusive_threshold),
            laser_total_vests: settings
                .laser_total_vests
                .unwrap_or(defaults.laser_total_vests),
            laser_spare_vests: settings
                .laser_spare_vests
                .unwrap_or(defaults.laser_spare_vests),
            game_duration_minutes: settings
                .game_duration_minutes
                .unwrap_or(defaults.game_duration_minutes),
            laser_pause_minutes: settings
                .laser_pause_minutes
                .unwrap_or(defaults.laser_pause_minutes),
            event_room_minutes: settings
                .event_room_minutes
                .unwrap_or(defaults.event_room_minutes),
        })
    }

    /// `max_participants_per_slot × total_slots`.
    pub fn total_capacity(&self) -> Count {
        self.max_participants_per_slot
            .saturating_mul(self.total_slots)
    }

    /// Slots a group of `participants` occupies. Slots are never shared
    /// between bookings, so this rounds up.
    pub fn slots_for(&self, participants: Count) -> Count {
        participants.div_ceil(self.max_participants_per_slot.max(1))
    }

    /// Vest ceiling including spares.
    pub fn vest_ceiling(&self) -> Count {
        self.laser_total_vests
            .saturating_add(self.laser_spare_vests)
    }
}

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

/// An interchangeable laser arena. A booking may use one or several at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaserRoom {
    pub id: EntityId,
    pub name: String,
    pub capacity: Count,
    pub is_active: bool,
    pub sort_order: i32,
}

/// A physical room reserved by one event for its whole room window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRoom {
    pub id: EntityId,
    pub name: String,
    pub capacity: Count,
    pub is_active: bool,
    pub sort_order: i32,
}

/// Active laser rooms, smallest capacity first, ties by `sort_order`.
pub fn active_laser_rooms_ascending(rooms: &[LaserRoom]) -> Vec<&LaserRoom> {
    let mut active: Vec<&LaserRoom> = rooms.iter().filter(|r| r.is_active).collect();
    active.sort_by_key(|r| (r.capacity, r.sort_order));
    active
}

/// Active event rooms, smallest capacity first, ties by `sort_order`.
pub fn active_event_rooms_ascending(rooms: &[EventRoom]) -> Vec<&EventRoom> {
    let mut active: Vec<&EventRoom> = rooms.iter().filter(|r| r.is_active).collect();
    active.sort_by_key(|r| (r.capacity, r.sort_order));
    active
}
