//! Shared fixtures for the availability integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc, Weekday};
use venue_availability::{AvailabilityService, BranchRecord, InMemoryStore, OpeningHours};
use venue_core::capacity::{BranchSettings, EventRoom, LaserRoom};
use venue_core::plan::{BookingPlan, GamePlan, PlanArea};
use venue_core::snapshot::{Booking, BookingKind, GameArea, GameSession};
use venue_core::types::{Count, EntityId, Timestamp};
use venue_core::window::TimeWindow;

pub const SMALL_LASER: u128 = 0x100;
pub const LARGE_LASER: u128 = 0x101;
pub const ROOM_30: u128 = 0x200;
pub const ROOM_50: u128 = 0x201;

/// 2025-03-14, a Friday.
pub fn friday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
}

pub fn at(h: u32, m: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2025, 3, 14, h, m, 0).unwrap()
}

pub fn window(sh: u32, sm: u32, eh: u32, em: u32) -> TimeWindow {
    TimeWindow::new(at(sh, sm), at(eh, em)).unwrap()
}

pub fn id(n: u128) -> EntityId {
    EntityId::from_u128(n)
}

pub fn branch() -> EntityId {
    id(0xb0)
}

// ---------------------------------------------------------------------------
// Branch setup
// ---------------------------------------------------------------------------

/// Open 10:00 to 22:00 every day except Sunday.
pub fn opening_hours() -> std::collections::HashMap<Weekday, OpeningHours> {
    let hours = OpeningHours {
        open: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        close: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
    };
    [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ]
    .into_iter()
    .map(|day| (day, hours))
    .collect()
}

pub fn laser_room(n: u128, capacity: Count, sort_order: i32) -> LaserRoom {
    LaserRoom {
        id: id(n),
        name: format!("Laser {sort_order}"),
        capacity,
        is_active: true,
        sort_order,
    }
}

pub fn event_room(n: u128, capacity: Count, sort_order: i32) -> EventRoom {
    EventRoom {
        id: id(n),
        name: format!("Room {sort_order}"),
        capacity,
        is_active: true,
        sort_order,
    }
}

/// Two laser rooms (15 and 20) and two event rooms (30 and 50).
pub fn branch_record(settings: BranchSettings) -> BranchRecord {
    BranchRecord {
        settings,
        laser_rooms: vec![laser_room(LARGE_LASER, 20, 1), laser_room(SMALL_LASER, 15, 2)],
        event_rooms: vec![event_room(ROOM_50, 50, 1), event_room(ROOM_30, 30, 2)],
        opening_hours: opening_hours(),
    }
}

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub service: AvailabilityService,
}

pub async fn harness(settings: BranchSettings) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    store.upsert_branch(branch(), branch_record(settings)).await;
    let service = AvailabilityService::new(store.clone(), store.clone());
    Harness { store, service }
}

// ---------------------------------------------------------------------------
// Stored bookings
// ---------------------------------------------------------------------------

fn created(n: u128) -> Timestamp {
    at(8, 0) + TimeDelta::seconds(n as i64)
}

pub fn active_booking(n: u128, participants: Count, w: TimeWindow) -> Booking {
    Booking {
        id: id(n),
        branch_id: branch(),
        kind: BookingKind::Game,
        participants_count: participants,
        window: w,
        sessions: vec![GameSession {
            area: GameArea::Active,
            window: w,
            laser_room_id: None,
            session_order: 1,
        }],
        event_room_id: None,
        created_at: created(n),
    }
}

pub fn laser_booking(n: u128, participants: Count, w: TimeWindow, rooms: &[u128]) -> Booking {
    Booking {
        id: id(n),
        branch_id: branch(),
        kind: BookingKind::Game,
        participants_count: participants,
        window: w,
        sessions: rooms
            .iter()
            .map(|room| GameSession {
                area: GameArea::Laser,
                window: w,
                laser_room_id: Some(id(*room)),
                session_order: 1,
            })
            .collect(),
        event_room_id: None,
        created_at: created(n),
    }
}

pub fn event_booking(n: u128, participants: Count, w: TimeWindow, room: u128) -> Booking {
    Booking {
        id: id(n),
        branch_id: branch(),
        kind: BookingKind::Event,
        participants_count: participants,
        window: w,
        sessions: Vec::new(),
        event_room_id: Some(id(room)),
        created_at: created(n),
    }
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

pub fn game_plan(start: Timestamp, area: PlanArea, number_of_games: u32) -> BookingPlan {
    BookingPlan::Game {
        start,
        games: GamePlan {
            area,
            number_of_games,
        },
    }
}

pub fn event_plan(start: Timestamp, games: Option<GamePlan>) -> BookingPlan {
    BookingPlan::Event {
        start,
        games,
        games_offset_minutes: 0,
    }
}
