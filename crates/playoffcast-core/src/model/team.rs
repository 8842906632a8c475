// Team representation: record, scoring totals, roster, and schedule.

use serde::{Deserialize, Serialize};

use crate::model::matchup::{GameScore, Matchup};
use crate::model::player::Player;

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOutcome {
    Win,
    Loss,
    Tie,
}

/// Win/loss/tie record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Record {
    pub wins: u32,
    pub losses: u32,
    #[serde(default)]
    pub ties: u32,
}

impl Record {
    pub fn new(wins: u32, losses: u32, ties: u32) -> Self {
        Record { wins, losses, ties }
    }

    pub fn games(&self) -> u32 {
        self.wins + self.losses + self.ties
    }

    /// Win percentage with ties counted as half a win. A team with no games
    /// played is treated as neutral (0.5).
    pub fn win_pct(&self) -> f64 {
        let games = self.games();
        if games == 0 {
            return 0.5;
        }
        (self.wins as f64 + 0.5 * self.ties as f64) / games as f64
    }

    pub fn apply(&mut self, outcome: GameOutcome) {
        match outcome {
            GameOutcome::Win => self.wins += 1,
            GameOutcome::Loss => self.losses += 1,
            GameOutcome::Tie => self.ties += 1,
        }
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.ties > 0 {
            write!(f, "{}-{}-{}", self.wins, self.losses, self.ties)
        } else {
            write!(f, "{}-{}", self.wins, self.losses)
        }
    }
}

// ---------------------------------------------------------------------------
// Offensive style
// ---------------------------------------------------------------------------

/// How a roster generates its points; drives weather sensitivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffensiveStyle {
    PassHeavy,
    RunHeavy,
    Balanced,
    Defensive,
}

impl OffensiveStyle {
    pub fn label(&self) -> &'static str {
        match self {
            OffensiveStyle::PassHeavy => "pass-heavy",
            OffensiveStyle::RunHeavy => "run-heavy",
            OffensiveStyle::Balanced => "balanced",
            OffensiveStyle::Defensive => "defensive",
        }
    }
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub division: String,
    pub record: Record,
    pub points_for: f64,
    pub points_against: f64,
    /// Current league rank (1 = best). Zero when unknown.
    #[serde(default)]
    pub rank: u32,
    /// Declared offensive style; inferred from the roster when absent.
    #[serde(default)]
    pub style: Option<OffensiveStyle>,
    #[serde(default)]
    pub roster: Vec<Player>,
    /// Full season schedule ordered by week; completed games carry a score.
    #[serde(default)]
    pub schedule: Vec<Matchup>,
}

impl Team {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        division: impl Into<String>,
    ) -> Self {
        Team {
            id: id.into(),
            name: name.into(),
            division: division.into(),
            record: Record::default(),
            points_for: 0.0,
            points_against: 0.0,
            rank: 0,
            style: None,
            roster: Vec::new(),
            schedule: Vec::new(),
        }
    }

    pub fn games_played(&self) -> u32 {
        self.record.games()
    }

    pub fn points_per_game(&self) -> Option<f64> {
        let games = self.games_played();
        (games > 0).then(|| self.points_for / games as f64)
    }

    /// Average scoring margin per game; zero before any game was played.
    pub fn point_differential_per_game(&self) -> f64 {
        let games = self.games_played();
        if games == 0 {
            return 0.0;
        }
        (self.points_for - self.points_against) / games as f64
    }

    /// Games without a final score, in week order.
    pub fn remaining_schedule(&self) -> impl Iterator<Item = &Matchup> {
        self.schedule.iter().filter(|m| !m.is_complete())
    }

    pub fn remaining_games(&self) -> usize {
        self.remaining_schedule().count()
    }

    /// Completed games in week order.
    pub fn completed_matchups(&self) -> Vec<&Matchup> {
        let mut done: Vec<&Matchup> = self.schedule.iter().filter(|m| m.is_complete()).collect();
        done.sort_by_key(|m| m.week);
        done
    }

    pub fn matchup_for_week(&self, week: u32) -> Option<&Matchup> {
        self.schedule.iter().find(|m| m.week == week)
    }

    pub fn matchup_for_week_mut(&mut self, week: u32) -> Option<&mut Matchup> {
        self.schedule.iter_mut().find(|m| m.week == week)
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.roster.iter().find(|p| p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.roster.iter_mut().find(|p| p.id == player_id)
    }

    /// Points scored in the last `n` completed games, oldest first.
    pub fn recent_scores(&self, n: usize) -> Vec<f64> {
        let done = self.completed_matchups();
        let skip = done.len().saturating_sub(n);
        done.iter()
            .skip(skip)
            .filter_map(|m| m.actual_score.map(|s| s.points))
            .collect()
    }

    /// Outcomes of the last `n` completed games, oldest first.
    pub fn recent_results(&self, n: usize) -> Vec<GameOutcome> {
        let done = self.completed_matchups();
        let skip = done.len().saturating_sub(n);
        done.iter()
            .skip(skip)
            .filter_map(|m| m.actual_score.map(|s| s.outcome()))
            .collect()
    }

    /// Current streak: positive for consecutive wins, negative for losses,
    /// zero after a tie or before any game.
    pub fn current_streak(&self) -> i32 {
        let results = self.recent_results(usize::MAX);
        let Some(&last) = results.last() else {
            return 0;
        };
        let run = results.iter().rev().take_while(|&&r| r == last).count() as i32;
        match last {
            GameOutcome::Win => run,
            GameOutcome::Loss => -run,
            GameOutcome::Tie => 0,
        }
    }

    /// Apply a final score to the record and scoring totals.
    pub fn apply_final(&mut self, score: GameScore) {
        self.record.apply(score.outcome());
        self.points_for += score.points;
        self.points_against += score.opponent_points;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
