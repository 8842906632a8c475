// Factor analyzers.
//
// Each analyzer is stateless per call: it reads team, roster, and schedule
// data and returns a bounded impact plus human-readable justification. None
// of them depends on another.

pub mod historical;
pub mod injury;
pub mod momentum;
pub mod schedule;
pub mod weather;

pub use historical::{HistoricalPatternAnalyzer, PatternKind, PatternMatch, PatternReport};
pub use injury::{InjuryImpactAnalyzer, InjuryReport, PositionDepth, Vulnerability};
pub use momentum::{MomentumAnalyzer, MomentumReport, MomentumTrend, MomentumTrigger, TriggerKind};
pub use schedule::{ScheduleReport, ScheduleStrengthAnalyzer, ScheduleStretch};
pub use weather::{WeatherAnalyzer, WeatherReport};

use playoffcast_core::model::roster::projected_lineup_points;
use playoffcast_core::model::{League, Player, Position, Team};

// ---------------------------------------------------------------------------
// Position importance
// ---------------------------------------------------------------------------

/// Relative weight of a position's production in a fantasy lineup.
pub fn position_importance(position: Position) -> f64 {
    match position {
        Position::Quarterback => 1.0,
        Position::RunningBack => 0.85,
        Position::WideReceiver => 0.8,
        Position::TightEnd => 0.6,
        Position::Defense => 0.5,
        Position::Kicker => 0.3,
    }
}

// ---------------------------------------------------------------------------
// Team rating
// ---------------------------------------------------------------------------

/// Overall team quality in [0, 1]: 60% win percentage, 40% scoring relative
/// to the league. Before any games are played, scoring falls back to the
/// projected lineup relative to the league average.
pub fn team_rating(team: &Team, league: &League) -> f64 {
    let scoring = match (team.points_per_game(), league.average_points_per_game()) {
        (Some(ppg), Some(avg)) if avg > 0.0 => relative_index(ppg, avg),
        _ => relative_index(
            projected_lineup_points(&team.roster),
            league.average_lineup_projection(),
        ),
    };
    (0.6 * team.record.win_pct() + 0.4 * scoring).clamp(0.0, 1.0)
}

/// Map `value` relative to `average` onto [0, 1], 0.5 meaning average.
pub(crate) fn relative_index(value: f64, average: f64) -> f64 {
    if average <= 0.0 || !value.is_finite() {
        return 0.5;
    }
    0.5 + 0.5 * ((value - average) / (0.15 * average)).tanh()
}

/// Points per game, or the projected lineup when no games were played.
pub(crate) fn scoring_rate(team: &Team) -> f64 {
    team.points_per_game()
        .unwrap_or_else(|| projected_lineup_points(&team.roster))
}

// ---------------------------------------------------------------------------
// Statistics helpers
// ---------------------------------------------------------------------------

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation.
pub(crate) fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Standard deviation over mean; `None` for fewer than two values or a
/// non-positive mean.
pub(crate) fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    if m <= 0.0 {
        return None;
    }
    Some(std_dev(values)? / m)
}

/// Least-squares slope of `values` against their index.
pub(crate) fn regression_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let n_f = n as f64;
    let x_mean = (n_f - 1.0) / 2.0;
    let y_mean = mean(values)?;
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }
    (den > 0.0).then(|| num / den)
}

/// Players who would start at full health and are currently hurt.
pub(crate) fn injured_starters(team: &Team) -> Vec<&Player> {
    playoffcast_core::model::roster::intended_starters(&team.roster)
        .into_iter()
        .map(|s| s.player)
        .filter(|p| p.injury_status.is_injured())
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixtures shared by the analyzer tests.

    use playoffcast_core::model::{
        GameScore, League, Matchup, Player, Position, Record, Team,
    };

    pub fn roster(prefix: &str, scale: f64) -> Vec<Player> {
        let table: [(&str, Position, f64); 13] = [
            ("qb1", Position::Quarterback, 21.0),
            ("qb2", Position::Quarterback, 13.0),
            ("rb1", Position::RunningBack, 16.0),
            ("rb2", Position::RunningBack, 12.0),
            ("rb3", Position::RunningBack, 8.0),
            ("wr1", Position::WideReceiver, 15.0),
            ("wr2", Position::WideReceiver, 12.0),
            ("wr3", Position::WideReceiver, 11.0),
            ("wr4", Position::WideReceiver, 7.0),
            ("te1", Position::TightEnd, 9.0),
            ("te2", Position::TightEnd, 5.0),
            ("k1", Position::Kicker, 8.0),
            ("def1", Position::Defense, 7.0),
        ];
        table.iter()
            .map(|(id, pos, pts)| {
                Player::new(
                    format!("{prefix}-{id}"),
                    format!("{prefix} {id}"),
                    *pos,
                    pts * scale,
                )
            })
            .collect()
    }

    /// Team with `results` already played (true = win) scoring `points[i]`.
    pub fn team_with_history(id: &str, division: &str, results: &[(bool, f64)]) -> Team {
        let mut team = Team::new(id, format!("Team {id}"), division);
        team.roster = roster(id, 1.0);
        for (i, (won, pts)) in results.iter().enumerate() {
            let opp_pts = if *won { pts - 10.0 } else { pts + 10.0 };
            let mut m = Matchup::new(i as u32 + 1, "other", i % 2 == 0);
            let score = GameScore {
                points: *pts,
                opponent_points: opp_pts,
            };
            m.actual_score = Some(score);
            team.apply_final(score);
            team.schedule.push(m);
        }
        team
    }

    pub fn league(teams: Vec<Team>, current_week: u32) -> League {
        League {
            name: "Fixture League".into(),
            current_week,
            regular_season_weeks: 14,
            teams,
        }
    }

    pub fn record_team(id: &str, wins: u32, losses: u32, pf: f64) -> Team {
        let mut team = Team::new(id, format!("Team {id}"), "East");
        team.record = Record::new(wins, losses, 0);
        team.points_for = pf;
        team.points_against = pf * 0.95;
        team.roster = roster(id, 1.0);
        team
    }
}
