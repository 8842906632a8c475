// Boundary validation for league snapshots and probability records.
//
// Validation collects every violation in one pass and reports them together;
// callers never apply partially valid input.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use crate::model::{ChampionshipProbability, League, Matchup, Player, Team};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A single problem found in the input, located by a dotted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Debug, Clone, Error)]
#[error("{} validation violation(s): {}", .violations.len(), join_violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    /// Whether any violation is reported at the given path.
    pub fn has_path(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ---------------------------------------------------------------------------
// Collector
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Collector {
    violations: Vec<Violation>,
}

impl Collector {
    fn check(&mut self, ok: bool, path: impl Into<String>, message: impl Into<String>) {
        if !ok {
            self.violations.push(Violation {
                path: path.into(),
                message: message.into(),
            });
        }
    }

    fn finite_non_negative(&mut self, value: f64, path: String) {
        self.check(
            value.is_finite() && value >= 0.0,
            path,
            format!("must be a finite non-negative number, got {value}"),
        );
    }

    fn probability(&mut self, value: f64, path: String) {
        self.check(
            value.is_finite() && (0.0..=1.0).contains(&value),
            path,
            format!("must be within [0, 1], got {value}"),
        );
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                violations: self.violations,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// League validation
// ---------------------------------------------------------------------------

/// Validate a whole league snapshot.
///
/// Checks identity uniqueness, numeric ranges, roster sanity, and schedule
/// references (every opponent must exist, no self games, one game per week).
pub fn validate_league(league: &League) -> Result<(), ValidationError> {
    let mut c = Collector::default();

    c.check(!league.teams.is_empty(), "teams", "league must contain at least one team");
    c.check(
        league.regular_season_weeks > 0,
        "regular_season_weeks",
        "must be greater than 0",
    );

    let mut seen = HashSet::new();
    let ids: HashSet<&str> = league.teams.iter().map(|t| t.id.as_str()).collect();

    for (i, team) in league.teams.iter().enumerate() {
        let base = format!("teams[{i}]");
        c.check(!team.id.trim().is_empty(), format!("{base}.id"), "must not be empty");
        c.check(
            seen.insert(team.id.as_str()),
            format!("{base}.id"),
            format!("duplicate team id `{}`", team.id),
        );
        validate_team(&mut c, &base, team, &ids, league.regular_season_weeks);
    }

    c.finish()
}

fn validate_team(
    c: &mut Collector,
    base: &str,
    team: &Team,
    ids: &HashSet<&str>,
    season_weeks: u32,
) {
    c.check(
        !team.division.trim().is_empty(),
        format!("{base}.division"),
        "must not be empty",
    );
    c.finite_non_negative(team.points_for, format!("{base}.points_for"));
    c.finite_non_negative(team.points_against, format!("{base}.points_against"));

    let mut player_ids = HashSet::new();
    for (j, player) in team.roster.iter().enumerate() {
        let path = format!("{base}.roster[{j}]");
        c.check(
            player_ids.insert(player.id.as_str()),
            format!("{path}.id"),
            format!("duplicate player id `{}`", player.id),
        );
        validate_player(c, &path, player);
    }

    let mut weeks = HashSet::new();
    for (k, matchup) in team.schedule.iter().enumerate() {
        let path = format!("{base}.schedule[{k}]");
        c.check(
            weeks.insert(matchup.week),
            format!("{path}.week"),
            format!("more than one game scheduled in week {}", matchup.week),
        );
        validate_matchup(c, &path, team, matchup, ids, season_weeks);
    }
}

fn validate_player(c: &mut Collector, path: &str, player: &Player) {
    c.check(!player.id.trim().is_empty(), format!("{path}.id"), "must not be empty");
    c.finite_non_negative(player.projected_points, format!("{path}.projected_points"));
    c.probability(player.consistency, format!("{path}.consistency"));
    for (n, pts) in player.recent_performances.iter().enumerate() {
        c.check(
            pts.is_finite(),
            format!("{path}.recent_performances[{n}]"),
            "must be finite",
        );
    }
}

fn validate_matchup(
    c: &mut Collector,
    path: &str,
    team: &Team,
    matchup: &Matchup,
    ids: &HashSet<&str>,
    season_weeks: u32,
) {
    c.check(
        (1..=season_weeks).contains(&matchup.week),
        format!("{path}.week"),
        format!("must be within 1..={season_weeks}, got {}", matchup.week),
    );
    c.check(
        matchup.opponent_id != team.id,
        format!("{path}.opponent_id"),
        "team cannot play itself",
    );
    c.check(
        ids.contains(matchup.opponent_id.as_str()),
        format!("{path}.opponent_id"),
        format!("unknown opponent `{}`", matchup.opponent_id),
    );
    if let Some(projected) = matchup.projected_score {
        c.finite_non_negative(projected, format!("{path}.projected_score"));
    }
    if let Some(score) = matchup.actual_score {
        c.finite_non_negative(score.points, format!("{path}.actual_score.points"));
        c.finite_non_negative(
            score.opponent_points,
            format!("{path}.actual_score.opponent_points"),
        );
    }
    if let Some(weather) = matchup.weather {
        c.check(
            weather.temperature_f.is_finite(),
            format!("{path}.weather.temperature_f"),
            "must be finite",
        );
        c.finite_non_negative(weather.wind_mph, format!("{path}.weather.wind_mph"));
    }
}

// ---------------------------------------------------------------------------
// Probability record validation
// ---------------------------------------------------------------------------

/// Validate a probability record supplied from outside the engine.
pub fn validate_probability(record: &ChampionshipProbability) -> Result<(), ValidationError> {
    let mut c = Collector::default();
    c.check(!record.team_id.trim().is_empty(), "team_id", "must not be empty");
    for (name, value) in record.probability_fields() {
        c.probability(value, name.to_string());
    }
    c.check(
        record.playoff_probability + 1e-12 >= record.championship_probability,
        "championship_probability",
        "must not exceed playoff_probability",
    );
    c.finite_non_negative(record.expected_seed, "expected_seed".to_string());
    c.finish()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
