//! Time-slice aggregation of generic (ACTIVE) capacity.
//!
//! Pure and recomputed per request; a branch/day rarely holds more than a
//! hundred bookings. Laser and event-room capacity are tracked elsewhere.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::capacity::BranchCapacityConfig;
use crate::snapshot::Booking;
use crate::types::{Count, EntityId, Timestamp};
use crate::window::TimeWindow;

/// Committed generic load in one 15-minute slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SliceLoad {
    pub total_participants: Count,
    pub total_slots_used: Count,
    pub capacity: Count,
}

impl SliceLoad {
    pub fn is_over_capacity(&self) -> bool {
        self.total_participants > self.capacity
    }
}

/// Committed load of `bookings` inside one slice, skipping `exclude`.
///
/// A booking counts once per slice even when several of its ACTIVE
/// sessions touch it.
pub fn slice_load<'a>(
    bookings: impl IntoIterator<Item = &'a Booking>,
    config: &BranchCapacityConfig,
    slice: &TimeWindow,
    exclude: Option<EntityId>,
) -> SliceLoad {
    let mut load = SliceLoad {
        capacity: config.total_capacity(),
        ..Default::default()
    };
    for booking in bookings {
        if Some(booking.id) == exclude || !booking.is_active_during(slice) {
            continue;
        }
        load.total_participants = load
            .total_participants
            .saturating_add(booking.participants_count);
        load.total_slots_used = load
            .total_slots_used
            .saturating_add(config.slots_for(booking.participants_count));
    }
    load
}

/// Load of every slice in `operating_window`, keyed by slice start.
pub fn aggregate(
    bookings: &[Booking],
    config: &BranchCapacityConfig,
    operating_window: &TimeWindow,
) -> BTreeMap<Timestamp, SliceLoad> {
    operating_window
        .slices()
        .map(|slice| (slice.start(), slice_load(bookings, config, &slice, None)))
        .collect()
}
