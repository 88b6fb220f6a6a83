//! Booking-workflow boundary around the `venue-core` allocators.
//!
//! - [`repository`]: the booking repository and branch settings provider
//!   traits, plus an in-memory implementation.
//! - [`request`]: booking requests, operator authorizations and decisions.
//! - [`service`]: [`AvailabilityService`], which loads one snapshot per call
//!   and chains the overbooking, laser, vest and event room checks.

pub mod error;
pub mod repository;
pub mod request;
pub mod service;

pub use error::{AvailabilityError, RepositoryError};
pub use repository::{BookingRepository, BranchRecord, BranchSettingsProvider, InMemoryStore, OpeningHours};
pub use request::{
    AuthorizationPrompt, Authorizations, AvailabilityDecision, BookingProposal, BookingRequest,
    ProposedSession, Rejection,
};
pub use service::{Alternatives, AvailabilityService, DayOverview, SliceOverview};
