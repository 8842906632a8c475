// A single scheduled game from one team's point of view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::team::GameOutcome;

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precipitation {
    #[default]
    Clear,
    Light,
    Moderate,
    Heavy,
    Snow,
}

/// Forecast or observed conditions at the stadium.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature_f: f64,
    pub wind_mph: f64,
    #[serde(default)]
    pub precipitation: Precipitation,
    #[serde(default)]
    pub dome: bool,
}

impl WeatherSnapshot {
    /// Climate-controlled conditions.
    pub fn dome() -> Self {
        WeatherSnapshot {
            temperature_f: 70.0,
            wind_mph: 0.0,
            precipitation: Precipitation::Clear,
            dome: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// Final score of a completed game, from the owning team's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameScore {
    pub points: f64,
    pub opponent_points: f64,
}

impl GameScore {
    pub fn outcome(&self) -> GameOutcome {
        if self.points > self.opponent_points {
            GameOutcome::Win
        } else if self.points < self.opponent_points {
            GameOutcome::Loss
        } else {
            GameOutcome::Tie
        }
    }

    /// The same score seen from the other side.
    pub fn flipped(&self) -> GameScore {
        GameScore {
            points: self.opponent_points,
            opponent_points: self.points,
        }
    }
}

/// In-progress scoreboard for a live game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveScore {
    pub points: f64,
    pub opponent_points: f64,
    /// Starters who have not played yet.
    pub starters_remaining: u32,
    pub opponent_starters_remaining: u32,
    pub updated_at: DateTime<Utc>,
}

impl LiveScore {
    pub fn flipped(&self) -> LiveScore {
        LiveScore {
            points: self.opponent_points,
            opponent_points: self.points,
            starters_remaining: self.opponent_starters_remaining,
            opponent_starters_remaining: self.starters_remaining,
            updated_at: self.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Matchup
// ---------------------------------------------------------------------------

/// Returned when trying to change a game that already has a final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchupLocked {
    pub week: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    pub week: u32,
    pub opponent_id: String,
    pub is_home: bool,
    #[serde(default)]
    pub projected_score: Option<f64>,
    /// Present only once the game has been played. Immutable afterwards.
    #[serde(default)]
    pub actual_score: Option<GameScore>,
    #[serde(default)]
    pub weather: Option<WeatherSnapshot>,
    #[serde(default)]
    pub kickoff: Option<DateTime<Utc>>,
    #[serde(default)]
    pub live: Option<LiveScore>,
}

impl Matchup {
    pub fn new(week: u32, opponent_id: impl Into<String>, is_home: bool) -> Self {
        Matchup {
            week,
            opponent_id: opponent_id.into(),
            is_home,
            projected_score: None,
            actual_score: None,
            weather: None,
            kickoff: None,
            live: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.actual_score.is_some()
    }

    pub fn is_dome(&self) -> bool {
        self.weather.map(|w| w.dome).unwrap_or(false)
    }

    /// Record the final score. Fails if a final score was already recorded.
    pub fn record_final(&mut self, score: GameScore) -> Result<(), MatchupLocked> {
        if self.actual_score.is_some() {
            return Err(MatchupLocked { week: self.week });
        }
        self.actual_score = Some(score);
        self.live = None;
        Ok(())
    }

    /// Replace the live scoreboard. Ignored once the game is final.
    pub fn update_live(&mut self, live: LiveScore) -> Result<(), MatchupLocked> {
        if self.actual_score.is_some() {
            return Err(MatchupLocked { week: self.week });
        }
        self.live = Some(live);
        Ok(())
    }

    pub fn set_weather(&mut self, weather: WeatherSnapshot) -> Result<(), MatchupLocked> {
        if self.actual_score.is_some() {
            return Err(MatchupLocked { week: self.week });
        }
        self.weather = Some(weather);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_outcomes() {
        let win = GameScore { points: 110.0, opponent_points: 95.5 };
        assert_eq!(win.outcome(), GameOutcome::Win);
        assert_eq!(win.flipped().outcome(), GameOutcome::Loss);
        let tie = GameScore { points: 90.0, opponent_points: 90.0 };
        assert_eq!(tie.outcome(), GameOutcome::Tie);
    }

    #[test]
    fn final_score_is_immutable() {
        let mut m = Matchup::new(3, "t2", true);
        m.record_final(GameScore { points: 100.0, opponent_points: 80.0 })
            .unwrap();
        let err = m
            .record_final(GameScore { points: 1.0, opponent_points: 2.0 })
            .unwrap_err();
        assert_eq!(err.week, 3);
        assert_eq!(m.actual_score.unwrap().points, 100.0);
        assert!(m.set_weather(WeatherSnapshot::dome()).is_err());
    }

    #[test]
    fn recording_final_clears_live_scoreboard() {
        let mut m = Matchup::new(5, "t2", false);
        m.update_live(LiveScore {
            points: 40.0,
            opponent_points: 30.0,
            starters_remaining: 4,
            opponent_starters_remaining: 5,
            updated_at: Utc::now(),
        })
        .unwrap();
        assert!(m.live.is_some());
        m.record_final(GameScore { points: 101.0, opponent_points: 99.0 })
            .unwrap();
        assert!(m.live.is_none());
        assert!(m.is_complete());
    }

    #[test]
    fn dome_detection() {
        let mut m = Matchup::new(1, "t2", true);
        assert!(!m.is_dome());
        m.weather = Some(WeatherSnapshot::dome());
        assert!(m.is_dome());
    }
}
