//! Session plans: the concrete game windows a booking request turns into.
//!
//! Plans are built before allocation so every allocator sees the same
//! sub-sessions. LASER games are separated by `laser_pause_minutes`; ACTIVE
//! and MIX games run back to back. A MIX plan never inserts the laser pause,
//! even around its LASER games, so `n` MIX games last `n × game_duration`.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::capacity::BranchCapacityConfig;
use crate::error::CoreError;
use crate::snapshot::{BookingKind, GameArea};
use crate::types::Timestamp;
use crate::window::TimeWindow;

/// Upper bound on games in one booking.
pub const MAX_GAMES_PER_BOOKING: u32 = 12;

// ---------------------------------------------------------------------------
// Plan inputs
// ---------------------------------------------------------------------------

/// Game mix requested by the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanArea {
    Active,
    Laser,
    /// Alternating ACTIVE and LASER games, ACTIVE first.
    Mix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamePlan {
    pub area: PlanArea,
    pub number_of_games: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingPlan {
    Game {
        start: Timestamp,
        games: GamePlan,
    },
    Event {
        start: Timestamp,
        /// Games played during the event, if any.
        games: Option<GamePlan>,
        /// Minutes between the room opening and the first game.
        #[serde(default)]
        games_offset_minutes: u32,
    },
}

impl BookingPlan {
    pub fn start(&self) -> Timestamp {
        match self {
            Self::Game { start, .. } | Self::Event { start, .. } => *start,
        }
    }

    pub fn kind(&self) -> BookingKind {
        match self {
            Self::Game { .. } => BookingKind::Game,
            Self::Event { .. } => BookingKind::Event,
        }
    }

    /// Same plan starting at `start`.
    pub fn moved_to(&self, start: Timestamp) -> Self {
        let mut moved = *self;
        match &mut moved {
            Self::Game { start: s, .. } | Self::Event { start: s, .. } => *s = start,
        }
        moved
    }
}

// ---------------------------------------------------------------------------
// Plan output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedSession {
    pub area: GameArea,
    pub window: TimeWindow,
    pub session_order: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPlan {
    pub kind: BookingKind,
    /// Overall booking window. For events, the room window.
    pub window: TimeWindow,
    pub sessions: Vec<PlannedSession>,
}

impl SessionPlan {
    /// ACTIVE sub-session windows, as fed to the overbooking detector.
    pub fn active_windows(&self) -> Vec<TimeWindow> {
        self.sessions
            .iter()
            .filter(|s| s.area == GameArea::Active)
            .map(|s| s.window)
            .collect()
    }

    pub fn laser_sessions(&self) -> impl Iterator<Item = &PlannedSession> {
        self.sessions.iter().filter(|s| s.area == GameArea::Laser)
    }
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

/// Expand a request into concrete session windows.
pub fn build_plan(plan: &BookingPlan, config: &BranchCapacityConfig) -> Result<SessionPlan, CoreError> {
    match *plan {
        BookingPlan::Game { start, games } => {
            let sessions = build_games(start, &games, config)?;
            let window = hull(&sessions).ok_or_else(|| {
                CoreError::Validation("A game booking needs at least one game".to_string())
            })?;
            Ok(SessionPlan {
                kind: BookingKind::Game,
                window,
                sessions,
            })
        }
        BookingPlan::Event {
            start,
            games,
            games_offset_minutes,
        } => {
            let room_window = TimeWindow::starting_at(start, i64::from(config.event_room_minutes))?;
            let sessions = match games {
                Some(games) => {
                    let first_game = start + TimeDelta::minutes(i64::from(games_offset_minutes));
                    build_games(first_game, &games, config)?
                }
                None => Vec::new(),
            };
            if let Some(outside) = sessions.iter().find(|s| !room_window.covers(&s.window)) {
                return Err(CoreError::Validation(format!(
                    "Game {} ({}) does not fit inside the event room window ({room_window})",
                    outside.session_order, outside.window
                )));
            }
            Ok(SessionPlan {
                kind: BookingKind::Event,
                window: room_window,
                sessions,
            })
        }
    }
}

fn build_games(
    start: Timestamp,
    games: &GamePlan,
    config: &BranchCapacityConfig,
) -> Result<Vec<PlannedSession>, CoreError> {
    if games.number_of_games == 0 || games.number_of_games > MAX_GAMES_PER_BOOKING {
        return Err(CoreError::Validation(format!(
            "Number of games must be between 1 and {MAX_GAMES_PER_BOOKING}"
        )));
    }

    let game = i64::from(config.game_duration_minutes);
    let pause = TimeDelta::minutes(i64::from(config.laser_pause_minutes));

    let mut sessions = Vec::with_capacity(games.number_of_games as usize);
    let mut next_start = start;
    for index in 0..games.number_of_games {
        let area = match games.area {
            PlanArea::Active => GameArea::Active,
            PlanArea::Laser => GameArea::Laser,
            PlanArea::Mix if index % 2 == 0 => GameArea::Active,
            PlanArea::Mix => GameArea::Laser,
        };
        let window = TimeWindow::starting_at(next_start, game)?;
        sessions.push(PlannedSession {
            area,
            window,
            session_order: index + 1,
        });
        next_start = match games.area {
            PlanArea::Laser => window.end() + pause,
            PlanArea::Active | PlanArea::Mix => window.end(),
        };
    }
    Ok(sessions)
}

fn hull(sessions: &[PlannedSession]) -> Option<TimeWindow> {
    let first = sessions.first()?.window;
    Some(sessions.iter().fold(first, |acc, s| acc.hull(&s.window)))
}
