// Integration tests for the playoffcast service.
//
// These exercise the shipped defaults and demo data end-to-end through the
// library crate's public API: config loading, snapshot and history loading,
// the probability engine, live event application, and the updater.

use std::path::PathBuf;
use std::sync::Arc;

use playoffcast_app::config::{ensure_config_files, load_config_from};
use playoffcast_app::live::{apply_event, Urgency};
use playoffcast_app::store::ProbabilityStore;
use playoffcast_app::updater::{Updater, UpdaterState};
use playoffcast_core::feed::FeedEvent;
use playoffcast_core::history::CsvHistory;
use playoffcast_core::model::{load_snapshot, InjuryStatus, League};
use playoffcast_core::protocol::{EventPayload, LiveEvent};
use playoffcast_engine::simulation::SimulationConfig;
use playoffcast_engine::win_prob::WinProbabilityModel;
use playoffcast_engine::ProbabilityEngine;

use tokio::sync::mpsc;

// ===========================================================================
// Test helpers
// ===========================================================================

fn crate_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

fn demo_league() -> League {
    load_snapshot(&crate_dir().join("data/league.json")).expect("demo snapshot should load")
}

fn engine(trials: u32, seed: u64) -> ProbabilityEngine {
    ProbabilityEngine::new(
        WinProbabilityModel::default(),
        SimulationConfig::default().with_trials(trials).with_seed(seed),
    )
}

/// Home and away ids of every game scheduled in `week`.
fn pairings(league: &League, week: u32) -> Vec<(String, String)> {
    league
        .teams
        .iter()
        .filter_map(|t| {
            t.matchup_for_week(week)
                .filter(|m| m.is_home)
                .map(|m| (t.id.clone(), m.opponent_id.clone()))
        })
        .collect()
}

// ===========================================================================
// Config and data files
// ===========================================================================

#[test]
fn shipped_defaults_load_and_reference_real_files() {
    let tmp = std::env::temp_dir().join("playoffcast_integration_defaults");
    let _ = std::fs::remove_dir_all(&tmp);
    std::fs::create_dir_all(tmp.join("defaults")).unwrap();
    for name in ["league.toml", "engine.toml"] {
        std::fs::copy(crate_dir().join("defaults").join(name), tmp.join("defaults").join(name))
            .unwrap();
    }

    let copied = ensure_config_files(&tmp).unwrap();
    assert_eq!(copied.len(), 2);
    let config = load_config_from(&tmp).unwrap();

    let league = load_snapshot(&crate_dir().join(&config.league.snapshot_path)).unwrap();
    assert_eq!(league.teams.len(), 8);

    let history_path = config.league.history_path.as_deref().unwrap();
    let history = CsvHistory::load(&crate_dir().join(history_path)).unwrap();
    assert!(!history.is_empty());
}

// ===========================================================================
// Engine over the demo league
// ===========================================================================

#[test]
fn demo_league_probabilities_are_consistent() {
    let league = demo_league();
    let outcome = engine(4_000, 11).championship_probabilities(&league).unwrap();
    assert_eq!(outcome.probabilities.len(), 8);

    let champions: f64 = outcome.probabilities.iter().map(|p| p.championship_probability).sum();
    let playoff_teams: f64 = outcome.probabilities.iter().map(|p| p.playoff_probability).sum();
    assert!((champions - 1.0).abs() < 1e-9);
    assert!((playoff_teams - 6.0).abs() < 1e-9);

    let leader = outcome.get("t1").unwrap();
    let cellar = outcome.get("t7").unwrap();
    assert!(leader.playoff_probability > cellar.playoff_probability);
    assert!(leader.championship_probability > cellar.championship_probability);
    for p in &outcome.probabilities {
        assert!(p.division_probability <= 1.0);
        assert!(p.championship_probability <= p.playoff_probability + 1e-12);
    }
}

#[test]
fn history_is_usable_by_the_model() {
    let league = demo_league();
    let history = CsvHistory::load(&crate_dir().join("data/head_to_head.csv")).unwrap();
    let engine = ProbabilityEngine::new(
        WinProbabilityModel::with_history(Arc::new(history)),
        SimulationConfig::default().with_trials(1_000).with_seed(3),
    );
    let p = engine.team_probability(&league, "t5").unwrap();
    assert!((0.0..=1.0).contains(&p.championship_probability));
}

#[test]
fn demo_report_covers_remaining_weeks() {
    let league = demo_league();
    let report = engine(1_500, 4).optimization_report(&league, "t6").unwrap();
    assert_eq!(report.team_name, league.team("t6").unwrap().name);
    assert_eq!(report.timeline.len(), 3);
    assert!(report.optimized_probability >= report.current_probability);
    assert!(report.optimized_probability <= 1.0);
}

// ===========================================================================
// Live events
// ===========================================================================

#[test]
fn finishing_a_week_advances_the_league() {
    let mut league = demo_league();
    let games = pairings(&league, 12);
    assert_eq!(games.len(), 4);

    for (i, (home, _)) in games.iter().enumerate() {
        let event = LiveEvent::new(
            home.clone(),
            EventPayload::GameEnd {
                week: 12,
                points: 110.0 + i as f64,
                opponent_points: 100.0,
            },
        );
        let applied = apply_event(&mut league, &event).unwrap();
        assert_eq!(applied.urgency, Urgency::Immediate);
        assert_eq!(applied.affected.len(), 2);
    }

    assert_eq!(league.current_week, 13);
    let outcome = engine(1_000, 9).championship_probabilities(&league).unwrap();
    assert_eq!(outcome.probabilities.len(), 8);
}

#[tokio::test(start_paused = true)]
async fn updater_tracks_the_demo_league() {
    let league = demo_league();
    let (home, away) = pairings(&league, 12).remove(0);
    let home_wins = league.team(&home).unwrap().record.wins;

    let store = Arc::new(ProbabilityStore::new());
    let (updater, mut handle) = Updater::new(
        Arc::new(engine(500, 21)),
        league,
        Arc::clone(&store),
        Default::default(),
    );
    let (tx, rx) = mpsc::channel(16);
    let task = tokio::spawn(updater.run(rx));

    tx.send(FeedEvent::Connected {
        endpoint: "ws://test".into(),
    })
    .await
    .unwrap();
    handle
        .state
        .wait_for(|s| *s == UpdaterState::Active)
        .await
        .unwrap();
    handle.stats.wait_for(|s| s.records_updated >= 8).await.unwrap();
    assert_eq!(store.len(), 8);

    let send = |payload: EventPayload, team: &str| {
        FeedEvent::Message(serde_json::to_string(&LiveEvent::new(team, payload)).unwrap())
    };
    tx.send(send(
        EventPayload::PlayerInjury {
            player_id: format!("{away}-qb1"),
            status: InjuryStatus::Doubtful,
            expected_return_week: None,
        },
        &away,
    ))
    .await
    .unwrap();
    tx.send(send(
        EventPayload::GameEnd {
            week: 12,
            points: 131.5,
            opponent_points: 97.25,
        },
        &home,
    ))
    .await
    .unwrap();

    handle
        .stats
        .wait_for(|s| s.events_applied == 2 && s.targeted_recomputes == 2)
        .await
        .unwrap();
    handle.stats.wait_for(|s| s.records_updated >= 8 + 3).await.unwrap();

    drop(tx);
    let league = task.await.unwrap();
    assert_eq!(handle.state(), UpdaterState::Stopped);
    assert_eq!(league.team(&home).unwrap().record.wins, home_wins + 1);
    assert_eq!(
        league.team(&away).unwrap().player(&format!("{away}-qb1")).unwrap().injury_status,
        InjuryStatus::Doubtful
    );
    assert!(store.sequence(&home).unwrap() > 1);
}

#[test]
fn weather_frame_updates_both_sides() {
    let raw = r#"{"team_id":"t2","timestamp":"2025-11-23T18:30:00Z",
        "event":{"kind":"weather_change","payload":{"week":12,
        "weather":{"temperature_f":35.0,"wind_mph":18.0,"precipitation":"moderate"}}}}"#;
    let event = LiveEvent::parse(raw).unwrap();
    let mut league = demo_league();
    let applied = apply_event(&mut league, &event).unwrap();
    assert_eq!(applied.urgency, Urgency::Batched);
    let game = league.team("t2").unwrap().matchup_for_week(12).unwrap();
    assert_eq!(game.weather.unwrap().wind_mph, 18.0);
    let opponent = league.team(&game.opponent_id).unwrap();
    assert_eq!(opponent.matchup_for_week(12).unwrap().weather, game.weather);
}
