// Live event wire protocol and the notifications published downstream.
//
// Events arrive as JSON text frames:
//
//   {"team_id": "t1", "timestamp": "2025-11-02T18:04:00Z",
//    "event": {"kind": "score_update", "payload": {...}}}
//
// The `kind` tag selects a fixed set of variants, so every consumer handles
// them exhaustively.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{InjuryStatus, WeatherSnapshot};

// ---------------------------------------------------------------------------
// Inbound events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum EventPayload {
    ScoreUpdate {
        week: u32,
        points: f64,
        opponent_points: f64,
        #[serde(default)]
        starters_remaining: Option<u32>,
        #[serde(default)]
        opponent_starters_remaining: Option<u32>,
    },
    PlayerInjury {
        player_id: String,
        status: InjuryStatus,
        #[serde(default)]
        expected_return_week: Option<u32>,
    },
    WeatherChange {
        week: u32,
        weather: WeatherSnapshot,
    },
    GameStart {
        week: u32,
    },
    GameEnd {
        week: u32,
        points: f64,
        opponent_points: f64,
    },
}

/// Discriminant of [`EventPayload`], used for logging and scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ScoreUpdate,
    PlayerInjury,
    WeatherChange,
    GameStart,
    GameEnd,
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::ScoreUpdate => "score_update",
            EventKind::PlayerInjury => "player_injury",
            EventKind::WeatherChange => "weather_change",
            EventKind::GameStart => "game_start",
            EventKind::GameEnd => "game_end",
        }
    }

    /// Injury and game-end events skip the debounce window.
    pub fn is_immediate(&self) -> bool {
        matches!(self, EventKind::PlayerInjury | EventKind::GameEnd)
    }
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::ScoreUpdate { .. } => EventKind::ScoreUpdate,
            EventPayload::PlayerInjury { .. } => EventKind::PlayerInjury,
            EventPayload::WeatherChange { .. } => EventKind::WeatherChange,
            EventPayload::GameStart { .. } => EventKind::GameStart,
            EventPayload::GameEnd { .. } => EventKind::GameEnd,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveEvent {
    pub team_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: EventPayload,
}

impl LiveEvent {
    pub fn new(team_id: impl Into<String>, event: EventPayload) -> Self {
        LiveEvent {
            team_id: team_id.into(),
            timestamp: Utc::now(),
            event,
        }
    }

    pub fn parse(json: &str) -> Result<LiveEvent, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }
}

// ---------------------------------------------------------------------------
// Outbound notifications
// ---------------------------------------------------------------------------

/// Published when a recomputation moves a team's championship probability by
/// more than the configured threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityUpdate {
    pub team_id: String,
    pub previous_probability: f64,
    pub new_probability: f64,
    /// `new_probability - previous_probability`.
    pub delta: f64,
    pub reasons: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// State of the live-event connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connected,
    Reconnecting {
        attempt: u32,
    },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
