//! External collaborators: where bookings and branch settings come from.
//!
//! The engine only ever reads through these traits. Implementations must be
//! `Send + Sync` so one service can be shared across request handlers.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use venue_core::capacity::{BranchSettings, EventRoom, LaserRoom};
use venue_core::snapshot::Booking;
use venue_core::types::EntityId;
use venue_core::window::TimeWindow;

use crate::error::RepositoryError;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Read-only access to stored bookings.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Every non-cancelled booking of `branch_id` overlapping `window`.
    async fn bookings_overlapping(
        &self,
        branch_id: EntityId,
        window: TimeWindow,
    ) -> Result<Vec<Booking>, RepositoryError>;
}

/// Branch configuration: capacity settings, rooms and opening hours.
#[async_trait]
pub trait BranchSettingsProvider: Send + Sync {
    async fn settings(&self, branch_id: EntityId) -> Result<BranchSettings, RepositoryError>;

    async fn laser_rooms(&self, branch_id: EntityId) -> Result<Vec<LaserRoom>, RepositoryError>;

    async fn event_rooms(&self, branch_id: EntityId) -> Result<Vec<EventRoom>, RepositoryError>;

    /// Opening to closing time on `date`, or `None` when closed.
    async fn operating_window(
        &self,
        branch_id: EntityId,
        date: NaiveDate,
    ) -> Result<Option<TimeWindow>, RepositoryError>;
}

// ---------------------------------------------------------------------------
// Opening hours
// ---------------------------------------------------------------------------

/// Daily opening hours, in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl OpeningHours {
    /// The concrete window on `date`. Hours closing before they open yield
    /// `None`.
    pub fn window_on(&self, date: NaiveDate) -> Option<TimeWindow> {
        TimeWindow::new(
            date.and_time(self.open).and_utc(),
            date.and_time(self.close).and_utc(),
        )
        .ok()
    }
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

/// Everything stored about one branch.
#[derive(Debug, Clone, Default)]
pub struct BranchRecord {
    pub settings: BranchSettings,
    pub laser_rooms: Vec<LaserRoom>,
    pub event_rooms: Vec<EventRoom>,
    pub opening_hours: HashMap<Weekday, OpeningHours>,
}

#[derive(Debug, Default)]
struct StoreState {
    branches: HashMap<EntityId, BranchRecord>,
    bookings: HashMap<EntityId, Booking>,
}

/// Process-local store implementing both collaborator traits.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a branch.
    pub async fn upsert_branch(&self, branch_id: EntityId, record: BranchRecord) {
        self.state.write().await.branches.insert(branch_id, record);
    }

    /// Insert or replace a booking.
    pub async fn save_booking(&self, booking: Booking) {
        self.state.write().await.bookings.insert(booking.id, booking);
    }

    /// Remove a booking. Returns whether it existed.
    pub async fn remove_booking(&self, booking_id: EntityId) -> bool {
        self.state.write().await.bookings.remove(&booking_id).is_some()
    }

    async fn with_branch<T>(
        &self,
        branch_id: EntityId,
        f: impl FnOnce(&BranchRecord) -> T + Send,
    ) -> Result<T, RepositoryError> {
        let state = self.state.read().await;
        state
            .branches
            .get(&branch_id)
            .map(f)
            .ok_or(RepositoryError::BranchNotFound(branch_id))
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn bookings_overlapping(
        &self,
        branch_id: EntityId,
        window: TimeWindow,
    ) -> Result<Vec<Booking>, RepositoryError> {
        let state = self.state.read().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.branch_id == branch_id && b.window.overlaps(&window))
            .cloned()
            .collect();
        // Stable order keeps slot packing reproducible across calls.
        bookings.sort_by_key(|b| (b.created_at, b.id));
        Ok(bookings)
    }
}

#[async_trait]
impl BranchSettingsProvider for InMemoryStore {
    async fn settings(&self, branch_id: EntityId) -> Result<BranchSettings, RepositoryError> {
        self.with_branch(branch_id, |b| b.settings.clone()).await
    }

    async fn laser_rooms(&self, branch_id: EntityId) -> Result<Vec<LaserRoom>, RepositoryError> {
        self.with_branch(branch_id, |b| b.laser_rooms.clone()).await
    }

    async fn event_rooms(&self, branch_id: EntityId) -> Result<Vec<EventRoom>, RepositoryError> {
        self.with_branch(branch_id, |b| b.event_rooms.clone()).await
    }

    async fn operating_window(
        &self,
        branch_id: EntityId,
        date: NaiveDate,
    ) -> Result<Option<TimeWindow>, RepositoryError> {
        self.with_branch(branch_id, |b| {
            b.opening_hours
                .get(&date.weekday())
                .and_then(|hours| hours.window_on(date))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours(open: u32, close: u32) -> OpeningHours {
        OpeningHours {
            open: NaiveTime::from_hms_opt(open, 0, 0).unwrap(),
            close: NaiveTime::from_hms_opt(close, 0, 0).unwrap(),
        }
    }

    #[test]
    fn opening_hours_become_a_window() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let window = hours(10, 22).window_on(date).unwrap();
        assert_eq!(window.duration(), chrono::TimeDelta::hours(12));
    }

    #[test]
    fn inverted_opening_hours_mean_closed() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert!(hours(22, 10).window_on(date).is_none());
    }

    #[tokio::test]
    async fn unknown_branch_is_an_error() {
        let store = InMemoryStore::new();
        let result = store.settings(EntityId::new_v4()).await;
        assert!(matches!(result, Err(RepositoryError::BranchNotFound(_))));
    }

    #[tokio::test]
    async fn closed_weekday_has_no_window() {
        let store = InMemoryStore::new();
        let branch_id = EntityId::new_v4();
        let mut record = BranchRecord::default();
        record.opening_hours.insert(Weekday::Fri, hours(10, 22));
        store.upsert_branch(branch_id, record).await;

        let friday = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert!(store.operating_window(branch_id, friday).await.unwrap().is_some());
        assert!(store.operating_window(branch_id, saturday).await.unwrap().is_none());
    }
}
