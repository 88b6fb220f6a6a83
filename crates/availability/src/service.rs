//! End-to-end availability check for one booking request.
//!
//! Each call loads one [`BranchSnapshot`] and runs the allocators against
//! it in a fixed order: overbooking on ACTIVE sub-sessions, laser rooms and
//! vests per LASER sub-session, then the event room. Nothing is written;
//! the caller persists the returned proposal under its own guard.

use std::sync::Arc;

use chrono::{DurationRound, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use venue_core::capacity::{BranchCapacityConfig, BranchSettings};
use venue_core::error::CoreError;
use venue_core::event_room::{allocate_event_room, EventRoomOutcome, EventRoomRequest};
use venue_core::laser::{allocate_laser_rooms, LaserRequest};
use venue_core::overbooking::{detect_overbooking, ProposedLoad};
use venue_core::packing::{pack_window, SlotAssignment};
use venue_core::plan::{build_plan, PlannedSession, SessionPlan};
use venue_core::slices::{aggregate, SliceLoad};
use venue_core::snapshot::{BookingKind, BranchSnapshot, GameArea};
use venue_core::types::{EntityId, Timestamp};
use venue_core::vests::check_vests;
use venue_core::window::{slice_floor, slice_length, TimeWindow};

use crate::error::AvailabilityError;
use crate::repository::{BookingRepository, BranchSettingsProvider};
use crate::request::{
    AuthorizationPrompt, Authorizations, AvailabilityDecision, BookingProposal, BookingRequest,
    ProposedSession, Rejection,
};

/// Step between earlier candidate starts, which sit on the hour or half hour.
const EARLIER_STEP_MINUTES: i64 = 30;

/// Step between later candidate starts.
const LATER_STEP_MINUTES: i64 = 15;

/// Days after the requested date searched for the same start time.
const OTHER_DAYS: i64 = 6;

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Nearest bookable starts for a request that could not be confirmed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternatives {
    pub before: Option<Timestamp>,
    pub after: Option<Timestamp>,
    /// Other days of the coming week where the same time is free.
    pub same_time_other_days: Vec<NaiveDate>,
}

impl Alternatives {
    pub fn is_empty(&self) -> bool {
        self.before.is_none() && self.after.is_none() && self.same_time_other_days.is_empty()
    }
}

/// Generic load and slot layout of one slice of the agenda grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceOverview {
    pub start: Timestamp,
    pub load: SliceLoad,
    pub assignments: Vec<SlotAssignment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOverview {
    pub date: NaiveDate,
    pub operating_window: TimeWindow,
    pub slices: Vec<SliceOverview>,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AvailabilityService {
    bookings: Arc<dyn BookingRepository>,
    branches: Arc<dyn BranchSettingsProvider>,
}

impl AvailabilityService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        branches: Arc<dyn BranchSettingsProvider>,
    ) -> Self {
        Self { bookings, branches }
    }

    /// Resolved capacity settings for a branch.
    pub async fn load_config(&self, branch_id: EntityId) -> Result<BranchCapacityConfig, AvailabilityError> {
        let settings: BranchSettings = self.branches.settings(branch_id).await?;
        Ok(BranchCapacityConfig::resolve(&settings)?)
    }

    /// Rooms plus every booking that could touch `window`, validated.
    pub async fn load_snapshot(
        &self,
        branch_id: EntityId,
        config: BranchCapacityConfig,
        window: TimeWindow,
    ) -> Result<BranchSnapshot, AvailabilityError> {
        let lookup = slice_aligned(&window)?;
        let (laser_rooms, event_rooms, bookings) = tokio::try_join!(
            self.branches.laser_rooms(branch_id),
            self.branches.event_rooms(branch_id),
            self.bookings.bookings_overlapping(branch_id, lookup),
        )?;
        let snapshot = BranchSnapshot {
            branch_id,
            config,
            laser_rooms,
            event_rooms,
            bookings,
        };
        snapshot.validate()?;
        tracing::debug!(
            %branch_id,
            window = %lookup,
            bookings = snapshot.bookings.len(),
            "Loaded branch snapshot"
        );
        Ok(snapshot)
    }

    /// Decide whether `request` can be booked as submitted.
    #[instrument(
        skip(self, request),
        fields(branch_id = %request.branch_id, participants = request.participants)
    )]
    pub async fn check(&self, request: &BookingRequest) -> Result<AvailabilityDecision, AvailabilityError> {
        request.validate()?;
        let config = self.load_config(request.branch_id).await?;
        let plan = build_plan(&request.plan, &config)?;

        let date = plan.window.start().date_naive();
        let Some(operating) = self.branches.operating_window(request.branch_id, date).await? else {
            tracing::info!(%date, "Branch is closed");
            return Ok(AvailabilityDecision::Rejected {
                rejection: Rejection::Closed { date },
            });
        };
        if !operating.contains(plan.window.start()) {
            tracing::info!(window = %plan.window, operating = %operating, "Start outside operating hours");
            return Ok(AvailabilityDecision::Rejected {
                rejection: Rejection::OutsideOperatingHours {
                    operating_window: operating,
                },
            });
        }

        let snapshot = self.load_snapshot(request.branch_id, config, plan.window).await?;
        let decision = evaluate(&snapshot, request, &plan)?;
        match &decision {
            AvailabilityDecision::Confirmed { .. } => tracing::info!("Booking confirmed"),
            AvailabilityDecision::NeedsAuthorization { prompts, .. } => {
                tracing::info!(prompts = prompts.len(), "Booking needs operator authorization");
            }
            AvailabilityDecision::Rejected { rejection } => {
                tracing::warn!(?rejection, "Booking rejected");
            }
        }
        Ok(decision)
    }

    /// Nearest starts where `request` would be confirmed without any
    /// authorization.
    #[instrument(
        skip(self, request),
        fields(branch_id = %request.branch_id, participants = request.participants)
    )]
    pub async fn find_alternatives(&self, request: &BookingRequest) -> Result<Alternatives, AvailabilityError> {
        request.validate()?;
        let config = self.load_config(request.branch_id).await?;
        let withheld = BookingRequest {
            authorizations: Authorizations::default(),
            ..request.clone()
        };
        let start = request.plan.start();
        let mut alternatives = Alternatives::default();

        if let Some(operating) = self
            .branches
            .operating_window(request.branch_id, start.date_naive())
            .await?
        {
            let earlier = TimeDelta::minutes(EARLIER_STEP_MINUTES);
            let later = TimeDelta::minutes(LATER_STEP_MINUTES);
            let first_before = latest_step_before(start, earlier);
            let before: Vec<Timestamp> = std::iter::successors(Some(first_before), |t| Some(*t - earlier))
                .take_while(|t| *t >= operating.start())
                .collect();
            let after: Vec<Timestamp> = std::iter::successors(Some(start + later), |t| Some(*t + later))
                .take_while(|t| operating.contains(*t))
                .collect();

            alternatives.before = self.first_confirmed(&withheld, config, &operating, &before).await?;
            alternatives.after = self.first_confirmed(&withheld, config, &operating, &after).await?;
        }

        for offset in 1..=OTHER_DAYS {
            let moved = start + TimeDelta::days(offset);
            let date = moved.date_naive();
            let Some(operating) = self.branches.operating_window(request.branch_id, date).await? else {
                continue;
            };
            if self
                .first_confirmed(&withheld, config, &operating, &[moved])
                .await?
                .is_some()
            {
                alternatives.same_time_other_days.push(date);
            }
        }

        tracing::debug!(?alternatives, "Searched alternative starts");
        Ok(alternatives)
    }

    /// Agenda grid for one day, or `None` when the branch is closed.
    #[instrument(skip(self))]
    pub async fn day_overview(
        &self,
        branch_id: EntityId,
        date: NaiveDate,
    ) -> Result<Option<DayOverview>, AvailabilityError> {
        let Some(operating) = self.branches.operating_window(branch_id, date).await? else {
            return Ok(None);
        };
        let config = self.load_config(branch_id).await?;
        let snapshot = self.load_snapshot(branch_id, config, operating).await?;

        let loads = aggregate(&snapshot.bookings, &config, &operating);
        let mut packed = pack_window(&snapshot.bookings, &config, &operating);
        let slices = loads
            .into_iter()
            .map(|(start, load)| SliceOverview {
                start,
                load,
                assignments: packed.remove(&start).unwrap_or_default(),
            })
            .collect();

        Ok(Some(DayOverview {
            date,
            operating_window: operating,
            slices,
        }))
    }

    /// First of `starts` (in order) confirmed against one shared snapshot.
    async fn first_confirmed(
        &self,
        request: &BookingRequest,
        config: BranchCapacityConfig,
        operating: &TimeWindow,
        starts: &[Timestamp],
    ) -> Result<Option<Timestamp>, AvailabilityError> {
        let candidates = starts
            .iter()
            .filter(|start| operating.contains(**start))
            .map(|start| {
                let moved = BookingRequest {
                    plan: request.plan.moved_to(*start),
                    ..request.clone()
                };
                let plan = build_plan(&moved.plan, &config)?;
                Ok((*start, moved, plan))
            })
            .collect::<Result<Vec<_>, CoreError>>()?;

        let Some(lookup) = candidates
            .iter()
            .map(|(_, _, plan)| plan.window)
            .reduce(|acc, w| acc.hull(&w))
        else {
            return Ok(None);
        };

        let snapshot = self.load_snapshot(request.branch_id, config, lookup).await?;
        for (start, moved, plan) in &candidates {
            if evaluate(&snapshot, moved, plan)?.is_confirmed() {
                return Ok(Some(*start));
            }
        }
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Run every allocator for `plan` against `snapshot`.
///
/// Hard failures reject immediately. Advisories the request has not
/// authorized are collected as prompts.
pub fn evaluate(
    snapshot: &BranchSnapshot,
    request: &BookingRequest,
    plan: &SessionPlan,
) -> Result<AvailabilityDecision, CoreError> {
    let participants = request.participants;
    let exclude = request.exclude_booking_id;
    let authorizations = request.authorizations;
    let mut prompts = Vec::new();

    let active_windows = plan.active_windows();
    if !active_windows.is_empty() {
        let load = ProposedLoad {
            participants,
            active_windows,
            exclude_booking_id: exclude,
        };
        let report = detect_overbooking(snapshot, &load);
        if report.is_overbooked() && !authorizations.overbooking {
            prompts.push(AuthorizationPrompt::Overbooking { report });
        }
    }

    let mut sessions: Vec<ProposedSession> = plan
        .sessions
        .iter()
        .filter(|s| s.area == GameArea::Active)
        .map(active_session)
        .collect();

    for game in plan.laser_sessions() {
        let laser = LaserRequest::new(participants, game.window)?
            .excluding(exclude)
            .with_mode(request.laser_mode);
        let allocation = match allocate_laser_rooms(snapshot, &laser) {
            Ok(allocation) => allocation,
            Err(error) => return Ok(error.into()),
        };

        let check = check_vests(
            snapshot,
            &game.window,
            participants,
            exclude,
            authorizations.spare_vest_authorization(),
        );
        let check = match check.into_result(participants, &game.window) {
            Ok(check) => check,
            Err(error) => return Ok(error.into()),
        };
        if check.needs_authorization() {
            prompts.push(AuthorizationPrompt::SpareVests {
                session_order: game.session_order,
                window: game.window,
                check,
            });
        }

        sessions.extend(
            allocation
                .sessions(game.window, game.session_order)
                .into_iter()
                .map(ProposedSession::from),
        );
    }
    sessions.sort_by_key(|s| (s.session_order, s.laser_room_id));

    let event_room_id = match plan.kind {
        BookingKind::Game => None,
        BookingKind::Event => {
            let room_request = EventRoomRequest::new(participants, plan.window, exclude)?;
            match allocate_event_room(snapshot, &room_request).require_room(&room_request) {
                Err(error) => return Ok(error.into()),
                Ok(EventRoomOutcome::LowerCapacity {
                    room_id,
                    capacity,
                    participants,
                }) => {
                    if !authorizations.under_capacity_room {
                        prompts.push(AuthorizationPrompt::UnderCapacityRoom {
                            room_id,
                            capacity,
                            participants,
                        });
                    }
                    Some(room_id)
                }
                Ok(outcome) => outcome.room_id(),
            }
        }
    };

    let proposal = BookingProposal {
        kind: plan.kind,
        participants,
        window: plan.window,
        sessions,
        event_room_id,
    };
    if prompts.is_empty() {
        Ok(AvailabilityDecision::Confirmed { proposal })
    } else {
        Ok(AvailabilityDecision::NeedsAuthorization { prompts, proposal })
    }
}

fn active_session(session: &PlannedSession) -> ProposedSession {
    ProposedSession {
        area: GameArea::Active,
        window: session.window,
        laser_room_id: None,
        session_order: session.session_order,
    }
}

/// Latest multiple of `step` strictly before `start`.
fn latest_step_before(start: Timestamp, step: TimeDelta) -> Timestamp {
    match start.duration_trunc(step) {
        Ok(floor) if floor < start => floor,
        Ok(floor) => floor - step,
        Err(_) => start - step,
    }
}

/// `window` widened to whole slices, so bookings sharing a slice with it
/// are loaded too.
fn slice_aligned(window: &TimeWindow) -> Result<TimeWindow, CoreError> {
    let end = slice_floor(window.end() - TimeDelta::nanoseconds(1)) + slice_length();
    TimeWindow::new(slice_floor(window.start()), end)
}
