/// Every booking, session and room is keyed by a UUID.
pub type EntityId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Participant counts, slot counts and capacities.
pub type Count = u32;
