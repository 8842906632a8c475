// League snapshot: the full set of teams the engine computes over.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::model::roster::projected_lineup_points;
use crate::model::team::Team;
use crate::validation::{validate_league, ValidationError};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read league snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse league snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid league snapshot: {0}")]
    Invalid(#[from] ValidationError),
}

// ---------------------------------------------------------------------------
// League
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub name: String,
    /// The week currently being played (or about to be).
    pub current_week: u32,
    pub regular_season_weeks: u32,
    pub teams: Vec<Team>,
}

impl League {
    /// Parse and validate a JSON snapshot.
    pub fn from_json_str(json: &str) -> Result<League, SnapshotError> {
        let league: League = serde_json::from_str(json)?;
        validate_league(&league)?;
        Ok(league)
    }

    pub fn team(&self, id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    pub fn team_mut(&mut self, id: &str) -> Option<&mut Team> {
        self.teams.iter_mut().find(|t| t.id == id)
    }

    pub fn team_index(&self, id: &str) -> Option<usize> {
        self.teams.iter().position(|t| t.id == id)
    }

    /// Distinct division identifiers, sorted.
    pub fn divisions(&self) -> Vec<&str> {
        let mut divisions: Vec<&str> = self.teams.iter().map(|t| t.division.as_str()).collect();
        divisions.sort_unstable();
        divisions.dedup();
        divisions
    }

    pub fn division_members<'a>(&'a self, division: &'a str) -> impl Iterator<Item = &'a Team> {
        self.teams.iter().filter(move |t| t.division == division)
    }

    /// Mean projected lineup points across the league (zero for an empty league).
    pub fn average_lineup_projection(&self) -> f64 {
        if self.teams.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .teams
            .iter()
            .map(|t| projected_lineup_points(&t.roster))
            .sum();
        total / self.teams.len() as f64
    }

    /// Mean points per game across every game played, or `None` before week 1.
    pub fn average_points_per_game(&self) -> Option<f64> {
        let games: u32 = self.teams.iter().map(|t| t.games_played()).sum();
        if games == 0 {
            return None;
        }
        let points: f64 = self.teams.iter().map(|t| t.points_for).sum();
        Some(points / games as f64)
    }

    /// Teams ordered by win percentage, then points-for, then input order.
    pub fn standings(&self) -> Vec<&Team> {
        let mut order: Vec<&Team> = self.teams.iter().collect();
        order.sort_by(|a, b| {
            b.record
                .win_pct()
                .partial_cmp(&a.record.win_pct())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    b.points_for
                        .partial_cmp(&a.points_for)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
        });
        order
    }
}

/// Load a league snapshot from a JSON file.
pub fn load_snapshot(path: &Path) -> Result<League, SnapshotError> {
    let text = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let league = League::from_json_str(&text)?;
    info!(
        "Loaded league snapshot '{}' ({} teams, week {})",
        league.name,
        league.teams.len(),
        league.current_week
    );
    Ok(league)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "name": "Sunday League",
        "current_week": 10,
        "regular_season_weeks": 14,
        "teams": [
            {
                "id": "a", "name": "Alpha", "division": "East",
                "record": {"wins": 7, "losses": 2},
                "points_for": 1050.0, "points_against": 900.0,
                "roster": [
                    {"id": "a1", "name": "Passer", "position": "QB", "projected_points": 21.0}
                ],
                "schedule": [
                    {"week": 10, "opponent_id": "b", "is_home": true}
                ]
            },
            {
                "id": "b", "name": "Bravo", "division": "West",
                "record": {"wins": 7, "losses": 2},
                "points_for": 1100.0, "points_against": 950.0,
                "schedule": [
                    {"week": 10, "opponent_id": "a", "is_home": false,
                     "weather": {"temperature_f": 28.0, "wind_mph": 18.0, "precipitation": "snow"}}
                ]
            }
        ]
    }"#;

    #[test]
    fn parses_snapshot_with_defaults() {
        let league = League::from_json_str(SNAPSHOT).unwrap();
        assert_eq!(league.teams.len(), 2);
        assert_eq!(league.divisions(), vec!["East", "West"]);
        let b = league.team("b").unwrap();
        assert!(b.roster.is_empty());
        assert_eq!(b.record.ties, 0);
        assert!(b.schedule[0].weather.is_some());
    }

    #[test]
    fn standings_break_ties_on_points_for() {
        let league = League::from_json_str(SNAPSHOT).unwrap();
        let order: Vec<&str> = league.standings().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn invalid_snapshot_is_rejected_whole() {
        let broken = SNAPSHOT.replace("\"opponent_id\": \"b\"", "\"opponent_id\": \"nobody\"");
        match League::from_json_str(&broken) {
            Err(SnapshotError::Invalid(err)) => {
                assert!(err.has_path("teams[0].schedule[0].opponent_id"));
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(
            League::from_json_str("{ not json"),
            Err(SnapshotError::Parse(_))
        ));
    }

    #[test]
    fn league_averages() {
        let league = League::from_json_str(SNAPSHOT).unwrap();
        let ppg = league.average_points_per_game().unwrap();
        assert!((ppg - 2150.0 / 18.0).abs() < 1e-9);
        assert!((league.average_lineup_projection() - 10.5).abs() < 1e-9);
    }

    #[test]
    fn load_snapshot_reports_missing_file() {
        let err = load_snapshot(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, SnapshotError::Io { .. }));
    }
}
