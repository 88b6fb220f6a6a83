//! Deterministic packing of ACTIVE bookings into generic slots.
//!
//! Bookings are ordered by `created_at`, then id, and laid out left to right
//! from slot 0. A booking's range depends only on the bookings ordered before
//! it, so adding or removing a later booking never moves an earlier one.

use std::collections::BTreeMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::capacity::BranchCapacityConfig;
use crate::snapshot::Booking;
use crate::types::{Count, EntityId, Timestamp};
use crate::window::TimeWindow;

/// Slot range of one booking within one slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAssignment {
    pub booking_id: EntityId,
    /// Clamped to `0..total_slots`.
    pub slots: Range<Count>,
    /// Slots the booking needs, before clamping.
    pub requested_slots: Count,
}

impl SlotAssignment {
    /// Whether part of the booking did not fit inside `total_slots`.
    pub fn is_clamped(&self) -> bool {
        self.slots.end - self.slots.start < self.requested_slots
    }
}

/// Pack every booking ACTIVE during `slice`.
pub fn pack_slice<'a>(
    bookings: impl IntoIterator<Item = &'a Booking>,
    config: &BranchCapacityConfig,
    slice: &TimeWindow,
) -> Vec<SlotAssignment> {
    let mut contributing: Vec<&Booking> = bookings
        .into_iter()
        .filter(|b| b.is_active_during(slice))
        .collect();
    contributing.sort_by_key(|b| (b.created_at, b.id));

    let total = config.total_slots;
    let mut cursor: Count = 0;
    contributing
        .into_iter()
        .map(|booking| {
            let requested_slots = config.slots_for(booking.participants_count);
            let start = cursor.min(total);
            let end = cursor.saturating_add(requested_slots).min(total);
            cursor = cursor.saturating_add(requested_slots);
            SlotAssignment {
                booking_id: booking.id,
                slots: start..end,
                requested_slots,
            }
        })
        .collect()
}

/// Pack every slice of `operating_window`, keyed by slice start.
pub fn pack_window(
    bookings: &[Booking],
    config: &BranchCapacityConfig,
    operating_window: &TimeWindow,
) -> BTreeMap<Timestamp, Vec<SlotAssignment>> {
    operating_window
        .slices()
        .map(|slice| (slice.start(), pack_slice(bookings, config, &slice)))
        .collect()
}

/// Slot range of `booking_id` in `slice`, if it is ACTIVE there.
pub fn slot_range_for(
    bookings: &[Booking],
    config: &BranchCapacityConfig,
    slice: &TimeWindow,
    booking_id: EntityId,
) -> Option<Range<Count>> {
    pack_slice(bookings, config, slice)
        .into_iter()
        .find(|a| a.booking_id == booking_id)
        .map(|a| a.slots)
}
