//! Resource allocation and conflict detection for a multi-activity venue.
//!
//! Every entry point is a pure function of a [`snapshot::BranchSnapshot`] and
//! a request record. Nothing here reads ambient state or mutates anything;
//! the caller persists the returned assignment under its own guard.
//!
//! - [`slices`]: committed generic load per 15-minute slice.
//! - [`packing`]: stable slot ranges per booking.
//! - [`overbooking`]: advisory capacity overruns for a proposed booking.
//! - [`laser`]: laser room assignment, with exclusivity and "maxi" rules.
//! - [`vests`]: vest inventory ceiling with the spare-vest override.
//! - [`event_room`]: best-fit event room with an under-capacity fallback.
//! - [`plan`]: expansion of a booking request into concrete sessions.

pub mod capacity;
pub mod error;
pub mod event_room;
pub mod laser;
pub mod overbooking;
pub mod packing;
pub mod plan;
pub mod slices;
pub mod snapshot;
pub mod types;
pub mod vests;
pub mod window;
