// Individual player representation: position, projection, injury status.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Fantasy football positions. Serialized with the usual abbreviations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "QB")]
    Quarterback,
    #[serde(rename = "RB")]
    RunningBack,
    #[serde(rename = "WR")]
    WideReceiver,
    #[serde(rename = "TE")]
    TightEnd,
    #[serde(rename = "K")]
    Kicker,
    #[serde(rename = "DEF")]
    Defense,
}

impl Position {
    /// Every position, in lineup display order.
    pub const ALL: [Position; 6] = [
        Position::Quarterback,
        Position::RunningBack,
        Position::WideReceiver,
        Position::TightEnd,
        Position::Kicker,
        Position::Defense,
    ];

    /// Parse a position string into a Position enum.
    ///
    /// Accepts the common platform spellings ("D/ST", "DST", "PK").
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "QB" => Some(Position::Quarterback),
            "RB" => Some(Position::RunningBack),
            "WR" => Some(Position::WideReceiver),
            "TE" => Some(Position::TightEnd),
            "K" | "PK" => Some(Position::Kicker),
            "DEF" | "DST" | "D/ST" => Some(Position::Defense),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Quarterback => "QB",
            Position::RunningBack => "RB",
            Position::WideReceiver => "WR",
            Position::TightEnd => "TE",
            Position::Kicker => "K",
            Position::Defense => "DEF",
        }
    }

    /// Whether a player at this position may fill the FLEX slot.
    pub fn is_flex_eligible(&self) -> bool {
        matches!(
            self,
            Position::RunningBack | Position::WideReceiver | Position::TightEnd
        )
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Injury status
// ---------------------------------------------------------------------------

/// Reported injury designation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjuryStatus {
    #[default]
    Healthy,
    Questionable,
    Doubtful,
    Out,
    #[serde(rename = "ir")]
    InjuredReserve,
}

impl InjuryStatus {
    /// Expected fraction of production lost to the designation.
    pub fn severity(&self) -> f64 {
        match self {
            InjuryStatus::Healthy => 0.0,
            InjuryStatus::Questionable => 0.25,
            InjuryStatus::Doubtful => 0.75,
            InjuryStatus::Out | InjuryStatus::InjuredReserve => 1.0,
        }
    }

    /// Whether the player is ruled out of the current week.
    pub fn is_inactive(&self) -> bool {
        matches!(self, InjuryStatus::Out | InjuryStatus::InjuredReserve)
    }

    pub fn is_injured(&self) -> bool {
        !matches!(self, InjuryStatus::Healthy)
    }

    pub fn label(&self) -> &'static str {
        match self {
            InjuryStatus::Healthy => "healthy",
            InjuryStatus::Questionable => "questionable",
            InjuryStatus::Doubtful => "doubtful",
            InjuryStatus::Out => "out",
            InjuryStatus::InjuredReserve => "IR",
        }
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

fn default_consistency() -> f64 {
    0.5
}

/// A rostered player.
///
/// Injury status and recent performances are the only fields that change
/// outside a simulation; both are driven by live events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub position: Position,
    /// Projected fantasy points for a typical week.
    pub projected_points: f64,
    /// Most recent actual weekly scores, oldest first.
    #[serde(default)]
    pub recent_performances: Vec<f64>,
    #[serde(default)]
    pub injury_status: InjuryStatus,
    /// Week-to-week reliability in [0, 1].
    #[serde(default = "default_consistency")]
    pub consistency: f64,
    /// Week the player is expected back from injury, if known.
    #[serde(default)]
    pub expected_return_week: Option<u32>,
}

impl Player {
    /// Number of recent performances kept in the rolling window.
    pub const RECENT_WINDOW: usize = 5;

    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        position: Position,
        projected_points: f64,
    ) -> Self {
        Player {
            id: id.into(),
            name: name.into(),
            position,
            projected_points,
            recent_performances: Vec::new(),
            injury_status: InjuryStatus::Healthy,
            consistency: default_consistency(),
            expected_return_week: None,
        }
    }

    /// Append a weekly score, evicting the oldest once the window is full.
    pub fn record_performance(&mut self, points: f64) {
        self.recent_performances.push(points);
        if self.recent_performances.len() > Self::RECENT_WINDOW {
            let excess = self.recent_performances.len() - Self::RECENT_WINDOW;
            self.recent_performances.drain(..excess);
        }
    }

    /// Mean of the rolling window, or `None` before any game was played.
    pub fn recent_average(&self) -> Option<f64> {
        if self.recent_performances.is_empty() {
            return None;
        }
        let sum: f64 = self.recent_performances.iter().sum();
        Some(sum / self.recent_performances.len() as f64)
    }

    /// Projection discounted by the injury designation.
    pub fn effective_projection(&self) -> f64 {
        self.projected_points * (1.0 - self.injury_status.severity())
    }

    pub fn is_available(&self) -> bool {
        !self.injury_status.is_inactive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
