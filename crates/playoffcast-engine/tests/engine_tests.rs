// Integration tests for the probability engine.
//
// These build a realistic twelve-team league through the public model API
// and drive it through the facade: validation, simulation, factor analysis,
// and path optimization.

use playoffcast_core::model::{InjuryStatus, League, Matchup, Player, Position, Record, Team};
use playoffcast_engine::optimizer::{ScenarioKind, StrategyCategory};
use playoffcast_engine::simulation::SimulationConfig;
use playoffcast_engine::win_prob::WinProbabilityModel;
use playoffcast_engine::{EngineError, ProbabilityEngine};

// ===========================================================================
// Test helpers
// ===========================================================================

fn roster(prefix: &str, scale: f64) -> Vec<Player> {
    [
        ("qb1", Position::Quarterback, 21.0),
        ("qb2", Position::Quarterback, 13.0),
        ("rb1", Position::RunningBack, 16.0),
        ("rb2", Position::RunningBack, 12.0),
        ("rb3", Position::RunningBack, 8.0),
        ("wr1", Position::WideReceiver, 15.0),
        ("wr2", Position::WideReceiver, 12.0),
        ("wr3", Position::WideReceiver, 11.0),
        ("te1", Position::TightEnd, 9.0),
        ("te2", Position::TightEnd, 5.0),
        ("k1", Position::Kicker, 8.0),
        ("def1", Position::Defense, 7.0),
    ]
    .into_iter()
    .map(|(id, pos, pts)| Player::new(format!("{prefix}-{id}"), format!("{prefix} {id}"), pos, pts * scale))
    .collect()
}

/// Records after twelve weeks, best first.
const RECORDS: [(u32, u32); 12] = [
    (10, 2),
    (9, 3),
    (8, 4),
    (7, 5),
    (7, 5),
    (6, 6),
    (6, 6),
    (5, 7),
    (5, 7),
    (4, 8),
    (3, 9),
    (2, 10),
];

/// Remaining pairings for weeks 13 and 14, home side first. The leader
/// closes at home against the two weakest teams.
const WEEK_13: [(usize, usize); 6] = [(0, 11), (1, 2), (3, 4), (5, 6), (7, 8), (9, 10)];
const WEEK_14: [(usize, usize); 6] = [(0, 10), (1, 3), (2, 4), (5, 7), (6, 8), (9, 11)];

fn twelve_team_league() -> League {
    let mut teams: Vec<Team> = RECORDS
        .iter()
        .enumerate()
        .map(|(i, &(wins, losses))| {
            let mut team = Team::new(
                format!("t{i}"),
                format!("Team {i}"),
                if i % 2 == 0 { "East" } else { "West" },
            );
            team.record = Record::new(wins, losses, 0);
            team.points_for = 1500.0 - 25.0 * i as f64;
            team.points_against = 1300.0 + 10.0 * i as f64;
            team.roster = roster(&team.id, 1.1 - 0.02 * i as f64);
            team
        })
        .collect();

    for (week, pairs) in [(13, WEEK_13), (14, WEEK_14)] {
        for (home, away) in pairs {
            let home_id = teams[home].id.clone();
            let away_id = teams[away].id.clone();
            teams[home].schedule.push(Matchup::new(week, away_id, true));
            teams[away].schedule.push(Matchup::new(week, home_id, false));
        }
    }

    League {
        name: "Integration League".into(),
        current_week: 13,
        regular_season_weeks: 14,
        teams,
    }
}

fn engine(trials: u32, seed: u64) -> ProbabilityEngine {
    ProbabilityEngine::new(
        WinProbabilityModel::default(),
        SimulationConfig::default().with_trials(trials).with_seed(seed),
    )
}

// ===========================================================================
// Simulation
// ===========================================================================

#[test]
fn ten_win_leader_with_easiest_schedule_is_nearly_locked_in() {
    let league = twelve_team_league();
    let engine = engine(10_000, 2024);

    let leader_schedule = engine
        .factor_snapshot(&league, "t0")
        .unwrap()
        .schedule
        .remaining_strength;
    for contender in ["t1", "t2", "t3", "t4", "t5"] {
        let other = engine
            .factor_snapshot(&league, contender)
            .unwrap()
            .schedule
            .remaining_strength;
        assert!(leader_schedule < other, "t0 {leader_schedule} vs {contender} {other}");
    }

    let p = engine.team_probability(&league, "t0").unwrap();
    assert!(p.playoff_probability > 0.9, "playoff {}", p.playoff_probability);
    assert!(p.expected_seed >= 1.0 && p.expected_seed <= 2.0, "seed {}", p.expected_seed);
    assert!(p.championship_probability > 0.0);
    assert!(p.championship_probability <= p.playoff_probability);
    assert_eq!(p.trials, 10_000);
}

#[test]
fn full_league_probabilities_are_consistent() {
    let league = twelve_team_league();
    let outcome = engine(3_000, 8).championship_probabilities(&league).unwrap();
    assert_eq!(outcome.probabilities.len(), 12);

    let champions: f64 = outcome.probabilities.iter().map(|p| p.championship_probability).sum();
    let playoff_teams: f64 = outcome.probabilities.iter().map(|p| p.playoff_probability).sum();
    assert!((champions - 1.0).abs() < 1e-9);
    assert!((playoff_teams - 6.0).abs() < 1e-9);

    let first = outcome.get("t0").unwrap();
    let last = outcome.get("t11").unwrap();
    assert!(first.championship_probability > last.championship_probability);
    assert_eq!(last.playoff_probability, 0.0);
}

#[test]
fn invalid_snapshot_is_rejected_before_simulating() {
    let mut league = twelve_team_league();
    league.teams[3].schedule.push(Matchup::new(14, "nobody", true));
    let err = engine(100, 1).championship_probabilities(&league).unwrap_err();
    match err {
        EngineError::Invalid(v) => assert!(!v.violations.is_empty()),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn unknown_team_is_an_error() {
    let league = twelve_team_league();
    assert!(matches!(
        engine(100, 1).team_probability(&league, "ghost"),
        Err(EngineError::UnknownTeam(id)) if id == "ghost"
    ));
    assert!(matches!(
        engine(100, 1).factor_snapshot(&league, "ghost"),
        Err(EngineError::UnknownTeam(_))
    ));
}

// ===========================================================================
// Factors and optimization
// ===========================================================================

#[test]
fn factor_snapshot_projects_each_remaining_game() {
    let league = twelve_team_league();
    let factors = engine(100, 1).factor_snapshot(&league, "t0").unwrap();
    assert_eq!(factors.regular_season_weeks, 14);
    let weeks: Vec<u32> = factors.outlook.iter().map(|g| g.week).collect();
    assert_eq!(weeks, vec![13, 14]);
    assert_eq!(factors.outlook[0].opponent_id, "t11");
    assert!(factors.outlook[0].is_home);
    for game in &factors.outlook {
        assert!((0.0..=1.0).contains(&game.win_probability));
        assert!(game.win_probability > 0.5);
        assert_eq!(game.weather_impact, 0.0);
    }
    assert_eq!(factors.injury.impact, 0.0);
}

#[test]
fn optimization_report_is_bounded() {
    let league = twelve_team_league();
    let report = engine(2_000, 5).optimization_report(&league, "t5").unwrap();

    assert_eq!(report.team_id, "t5");
    assert!(report.optimized_probability >= report.current_probability);
    assert!(report.optimized_probability <= 1.0);
    assert!(report.strategies.len() <= 8);

    let kinds: Vec<ScenarioKind> = report.scenarios.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![ScenarioKind::BestCase, ScenarioKind::LikelyCase, ScenarioKind::WorstCase]);
    for s in &report.scenarios {
        assert!(s.championship_probability <= s.playoff_probability);
        assert_eq!(s.projected_record.games(), 14);
    }
    let best = &report.scenarios[0];
    let worst = &report.scenarios[2];
    assert!(best.projected_record.wins >= worst.projected_record.wins);

    assert_eq!(report.timeline.len(), 2);
    assert!(report.rivals.len() <= 3);
    assert!(report.rivals.iter().all(|r| r.team_id != "t5"));
    assert!(report
        .rivals
        .windows(2)
        .all(|w| w[0].threat_score >= w[1].threat_score));
}

#[test]
fn questionable_starter_suggests_a_fallback() {
    let mut league = twelve_team_league();
    league
        .team_mut("t4")
        .unwrap()
        .player_mut("t4-qb1")
        .unwrap()
        .injury_status = InjuryStatus::Questionable;

    let report = engine(500, 3).optimization_report(&league, "t4").unwrap();
    assert!(report
        .strategies
        .iter()
        .any(|s| s.category == StrategyCategory::Health && s.title.contains("t4 qb1")));
}
