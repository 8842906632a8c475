// Single-game win probability.
//
//   p = 0.5
//     + 0.30 * (strength(team) - strength(opponent))
//     + 0.03 if the team is at home
//     + 0.20 * (injury(team) - injury(opponent))
//     + 0.10 * (weather(team) - weather(opponent))   outdoor games only
//     + 0.15 * (momentum(team) - momentum(opponent))
//     + 0.10 * head-to-head edge
//
// clamped to [0, 1]. The record-independent terms are computed once per
// pairing (`MatchupFactors`) so the simulation can re-evaluate strength as
// simulated records change without re-running the analyzers.

use std::sync::Arc;

use serde::Serialize;

use playoffcast_core::history::HistoricalDataProvider;
use playoffcast_core::model::roster::{projected_lineup_points, LINEUP_SIZE};
use playoffcast_core::model::{League, LiveScore, Matchup, Team};

use crate::analysis::{
    HistoricalPatternAnalyzer, InjuryImpactAnalyzer, MomentumAnalyzer, WeatherAnalyzer,
};

pub const BASE_PROBABILITY: f64 = 0.5;
pub const STRENGTH_WEIGHT: f64 = 0.3;
pub const HOME_FIELD_BONUS: f64 = 0.03;
pub const INJURY_WEIGHT: f64 = 0.2;
pub const WEATHER_WEIGHT: f64 = 0.1;
pub const MOMENTUM_WEIGHT: f64 = 0.15;
pub const HEAD_TO_HEAD_WEIGHT: f64 = 0.1;

// ---------------------------------------------------------------------------
// Strength
// ---------------------------------------------------------------------------

/// Inputs to the strength rating that change as games are simulated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrengthInputs {
    pub win_pct: f64,
    pub point_diff_per_game: f64,
    pub lineup_projection: f64,
}

impl StrengthInputs {
    pub fn of(team: &Team) -> Self {
        StrengthInputs {
            win_pct: team.record.win_pct(),
            point_diff_per_game: team.point_differential_per_game(),
            lineup_projection: projected_lineup_points(&team.roster),
        }
    }
}

/// Team strength in [0, 1]: 40% win percentage, 30% scoring margin, 30%
/// projected lineup against the league average.
pub fn strength(inputs: &StrengthInputs, league_average_projection: f64) -> f64 {
    let margin = 0.5 + 0.5 * (inputs.point_diff_per_game / 25.0).tanh();
    let roster = crate::analysis::relative_index(inputs.lineup_projection, league_average_projection);
    (0.4 * inputs.win_pct + 0.3 * margin + 0.3 * roster).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Factors
// ---------------------------------------------------------------------------

/// Per-team analyzer outputs that do not depend on the opponent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TeamFactors {
    pub injury: f64,
    pub momentum: f64,
}

/// Record-independent contributions for one pairing, already weighted.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MatchupFactors {
    pub home_field: f64,
    pub injury: f64,
    pub weather: f64,
    pub momentum: f64,
    pub head_to_head: f64,
}

impl MatchupFactors {
    pub fn sum(&self) -> f64 {
        self.home_field + self.injury + self.weather + self.momentum + self.head_to_head
    }

    /// The same pairing seen from the opponent's side. Home field does not
    /// transfer: a neutral pairing stays neutral.
    pub fn reversed(&self) -> MatchupFactors {
        MatchupFactors {
            home_field: 0.0,
            injury: -self.injury,
            weather: -self.weather,
            momentum: -self.momentum,
            head_to_head: -self.head_to_head,
        }
    }
}

/// Combine a strength differential with precomputed factors.
pub fn combine(strength_diff: f64, factors: &MatchupFactors) -> f64 {
    (BASE_PROBABILITY + STRENGTH_WEIGHT * strength_diff + factors.sum()).clamp(0.0, 1.0)
}

/// Every contribution to one game's probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WinProbabilityBreakdown {
    pub base: f64,
    pub strength: f64,
    pub home_field: f64,
    pub injury: f64,
    pub weather: f64,
    pub momentum: f64,
    pub head_to_head: f64,
    /// Shift applied by an in-progress live score.
    pub live: f64,
    pub probability: f64,
}

impl WinProbabilityBreakdown {
    pub fn contributions(&self) -> [(&'static str, f64); 7] {
        [
            ("Team strength", self.strength),
            ("Home field", self.home_field),
            ("Injuries", self.injury),
            ("Weather", self.weather),
            ("Momentum", self.momentum),
            ("Head-to-head", self.head_to_head),
            ("Live scoreboard", self.live),
        ]
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// Win probability model. Owns the analyzers it consults.
#[derive(Debug, Clone, Default)]
pub struct WinProbabilityModel {
    injury: InjuryImpactAnalyzer,
    weather: WeatherAnalyzer,
    momentum: MomentumAnalyzer,
    history: HistoricalPatternAnalyzer,
}

impl WinProbabilityModel {
    pub fn new(
        injury: InjuryImpactAnalyzer,
        weather: WeatherAnalyzer,
        momentum: MomentumAnalyzer,
        history: HistoricalPatternAnalyzer,
    ) -> Self {
        WinProbabilityModel {
            injury,
            weather,
            momentum,
            history,
        }
    }

    /// Default analyzers with head-to-head data from `provider`.
    pub fn with_history(provider: Arc<dyn HistoricalDataProvider>) -> Self {
        Self::new(
            InjuryImpactAnalyzer::new(),
            WeatherAnalyzer::new(),
            MomentumAnalyzer::new(),
            HistoricalPatternAnalyzer::new(provider),
        )
    }

    pub fn injury_analyzer(&self) -> &InjuryImpactAnalyzer {
        &self.injury
    }

    pub fn weather_analyzer(&self) -> &WeatherAnalyzer {
        &self.weather
    }

    pub fn momentum_analyzer(&self) -> &MomentumAnalyzer {
        &self.momentum
    }

    pub fn history_analyzer(&self) -> &HistoricalPatternAnalyzer {
        &self.history
    }

    pub fn team_factors(&self, team: &Team, league: &League) -> TeamFactors {
        TeamFactors {
            injury: self.injury.analyze(team).impact,
            momentum: self.momentum.analyze(team, league).score,
        }
    }

    /// Record-independent contributions for `team` against `opponent`.
    /// `matchup` is the game from `team`'s perspective; `None` means a
    /// neutral-site game with no weather.
    pub fn matchup_factors(
        &self,
        team: &Team,
        team_factors: &TeamFactors,
        opponent: &Team,
        opponent_factors: &TeamFactors,
        matchup: Option<&Matchup>,
    ) -> MatchupFactors {
        let home_field = match matchup {
            Some(m) if m.is_home => HOME_FIELD_BONUS,
            _ => 0.0,
        };
        let weather = match matchup.and_then(|m| m.weather.as_ref()) {
            Some(w) if !w.dome => {
                let ours = self.weather.analyze(team, Some(w)).impact;
                let theirs = self.weather.analyze(opponent, Some(w)).impact;
                WEATHER_WEIGHT * (ours - theirs)
            }
            _ => 0.0,
        };
        MatchupFactors {
            home_field,
            injury: INJURY_WEIGHT * (team_factors.injury - opponent_factors.injury),
            weather,
            momentum: MOMENTUM_WEIGHT * (team_factors.momentum - opponent_factors.momentum),
            head_to_head: HEAD_TO_HEAD_WEIGHT
                * self.history.head_to_head_edge(&team.id, &opponent.id),
        }
    }

    /// Full breakdown for one game using current records.
    pub fn breakdown(
        &self,
        team: &Team,
        opponent: &Team,
        matchup: Option<&Matchup>,
        league: &League,
    ) -> WinProbabilityBreakdown {
        let average = league.average_lineup_projection();
        let team_factors = self.team_factors(team, league);
        let opponent_factors = self.team_factors(opponent, league);
        let factors =
            self.matchup_factors(team, &team_factors, opponent, &opponent_factors, matchup);
        let strength_diff = strength(&StrengthInputs::of(team), average)
            - strength(&StrengthInputs::of(opponent), average);
        let model = combine(strength_diff, &factors);

        let probability = match matchup.and_then(|m| m.live.as_ref()) {
            Some(live) => apply_live(
                model,
                live,
                projected_lineup_points(&team.roster),
                projected_lineup_points(&opponent.roster),
            ),
            None => model,
        };

        WinProbabilityBreakdown {
            base: BASE_PROBABILITY,
            strength: STRENGTH_WEIGHT * strength_diff,
            home_field: factors.home_field,
            injury: factors.injury,
            weather: factors.weather,
            momentum: factors.momentum,
            head_to_head: factors.head_to_head,
            live: probability - model,
            probability,
        }
    }

    pub fn win_probability(
        &self,
        team: &Team,
        opponent: &Team,
        matchup: Option<&Matchup>,
        league: &League,
    ) -> f64 {
        self.breakdown(team, opponent, matchup, league).probability
    }
}

// ---------------------------------------------------------------------------
// Live games
// ---------------------------------------------------------------------------

/// Fraction of both lineups that has finished playing.
pub fn game_progress(live: &LiveScore) -> f64 {
    let remaining = live.starters_remaining as f64 + live.opponent_starters_remaining as f64;
    (1.0 - remaining / (2.0 * LINEUP_SIZE as f64)).clamp(0.0, 1.0)
}

/// Blend a pre-game probability with the live scoreboard, weighted by how
/// much of the game has been played.
pub fn apply_live(model: f64, live: &LiveScore, team_projection: f64, opponent_projection: f64) -> f64 {
    let progress = game_progress(live);
    if progress <= 0.0 {
        return model;
    }
    let per_starter = LINEUP_SIZE as f64;
    let team_final =
        live.points + team_projection * live.starters_remaining as f64 / per_starter;
    let opponent_final = live.opponent_points
        + opponent_projection * live.opponent_starters_remaining as f64 / per_starter;
    let spread = 10.0 + 30.0 * (1.0 - progress);
    let scoreboard = 0.5 + 0.5 * ((team_final - opponent_final) / spread).tanh();
    (progress * scoreboard + (1.0 - progress) * model).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{league, record_team};
    use chrono::Utc;
    use playoffcast_core::history::CsvHistory;
    use playoffcast_core::model::{InjuryStatus, Precipitation, WeatherSnapshot};

    fn pair() -> (Team, Team) {
        (record_team("a", 5, 5, 1000.0), record_team("b", 5, 5, 1000.0))
    }

    #[test]
    fn equal_teams_on_neutral_field_are_even() {
        let (a, b) = pair();
        let lg = league(vec![a.clone(), b.clone()], 11);
        let p = WinProbabilityModel::default().win_probability(&a, &b, None, &lg);
        assert!((p - 0.5).abs() < 1e-9);
    }

    #[test]
    fn home_field_adds_three_points() {
        let (a, b) = pair();
        let lg = league(vec![a.clone(), b.clone()], 11);
        let model = WinProbabilityModel::default();
        let home = Matchup::new(11, "b", true);
        let away = Matchup::new(11, "b", false);
        let ph = model.win_probability(&a, &b, Some(&home), &lg);
        let pa = model.win_probability(&a, &b, Some(&away), &lg);
        assert!((ph - 0.53).abs() < 1e-9);
        assert!((pa - 0.5).abs() < 1e-9);
    }

    #[test]
    fn probabilities_are_complementary_on_neutral_field() {
        let a = record_team("a", 8, 2, 1200.0);
        let b = record_team("b", 3, 7, 950.0);
        let lg = league(vec![a.clone(), b.clone()], 11);
        let model = WinProbabilityModel::default();
        let pab = model.win_probability(&a, &b, None, &lg);
        let pba = model.win_probability(&b, &a, None, &lg);
        assert!(pab > 0.5);
        assert!((pab + pba - 1.0).abs() < 1e-9);
    }

    #[test]
    fn stronger_team_is_favoured_but_bounded() {
        let a = record_team("a", 10, 0, 1500.0);
        let b = record_team("b", 0, 10, 700.0);
        let lg = league(vec![a.clone(), b.clone()], 11);
        let p = WinProbabilityModel::default().win_probability(&a, &b, None, &lg);
        assert!(p > 0.6);
        assert!(p <= 1.0);
    }

    #[test]
    fn dome_weather_contributes_nothing() {
        let (mut a, b) = pair();
        a.style = Some(playoffcast_core::model::OffensiveStyle::PassHeavy);
        let lg = league(vec![a.clone(), b.clone()], 11);
        let mut m = Matchup::new(11, "b", false);
        m.weather = Some(WeatherSnapshot {
            temperature_f: 5.0,
            wind_mph: 35.0,
            precipitation: Precipitation::Heavy,
            dome: true,
        });
        let breakdown = WinProbabilityModel::default().breakdown(&a, &b, Some(&m), &lg);
        assert_eq!(breakdown.weather, 0.0);

        m.weather.as_mut().unwrap().dome = false;
        let outdoor = WinProbabilityModel::default().breakdown(&a, &b, Some(&m), &lg);
        assert!(outdoor.weather < 0.0);
    }

    #[test]
    fn injured_starter_lowers_probability() {
        let (a, b) = pair();
        let lg = league(vec![a.clone(), b.clone()], 11);
        let model = WinProbabilityModel::default();
        let before = model.win_probability(&a, &b, None, &lg);

        let mut hurt = a.clone();
        hurt.player_mut("a-qb1").unwrap().injury_status = InjuryStatus::Out;
        let lg2 = league(vec![hurt.clone(), b.clone()], 11);
        let after = model.win_probability(&hurt, &b, None, &lg2);
        assert!(after < before);
        let breakdown = model.breakdown(&hurt, &b, None, &lg2);
        assert!(breakdown.injury < 0.0);
    }

    #[test]
    fn head_to_head_edge_from_provider() {
        let (a, b) = pair();
        let lg = league(vec![a.clone(), b.clone()], 11);
        let csv = "team_id,opponent_id,wins,losses,avg_margin\na,b,9,1,14.0\n";
        let provider = Arc::new(CsvHistory::from_reader(csv.as_bytes()).unwrap());
        let model = WinProbabilityModel::with_history(provider);
        let breakdown = model.breakdown(&a, &b, None, &lg);
        assert!(breakdown.head_to_head > 0.0);
        assert!(breakdown.head_to_head <= HEAD_TO_HEAD_WEIGHT);
    }

    #[test]
    fn combine_clamps() {
        let huge = MatchupFactors {
            home_field: 0.03,
            injury: 0.2,
            weather: 0.1,
            momentum: 0.15,
            head_to_head: 0.1,
        };
        assert_eq!(combine(1.0, &huge), 1.0);
        assert_eq!(combine(-1.0, &huge.reversed()), 0.0);
    }

    #[test]
    fn live_score_dominates_late_in_game() {
        let nearly_done = LiveScore {
            points: 120.0,
            opponent_points: 80.0,
            starters_remaining: 0,
            opponent_starters_remaining: 1,
            updated_at: Utc::now(),
        };
        let p = apply_live(0.3, &nearly_done, 110.0, 110.0);
        assert!(p > 0.85);

        let not_started = LiveScore {
            points: 0.0,
            opponent_points: 0.0,
            starters_remaining: LINEUP_SIZE as u32,
            opponent_starters_remaining: LINEUP_SIZE as u32,
            updated_at: Utc::now(),
        };
        assert_eq!(apply_live(0.3, &not_started, 110.0, 110.0), 0.3);
    }

    #[test]
    fn progress_tolerates_oversized_starter_counts() {
        let garbled = LiveScore {
            points: 10.0,
            opponent_points: 5.0,
            starters_remaining: u32::MAX,
            opponent_starters_remaining: 1,
            updated_at: Utc::now(),
        };
        assert_eq!(game_progress(&garbled), 0.0);
        assert_eq!(apply_live(0.4, &garbled, 110.0, 110.0), 0.4);
    }
}
