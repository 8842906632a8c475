// Playoffcast entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, stdout carries updates)
// 2. Load config
// 3. Load the league snapshot and optional head-to-head history
// 4. Compute initial probabilities and seed the store
// 5. Spawn the live feed task
// 6. Spawn the updater task
// 7. Print probability updates until Ctrl+C
// 8. Cleanup on exit

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};

use playoffcast_app::config;
use playoffcast_app::store::ProbabilityStore;
use playoffcast_app::updater::Updater;
use playoffcast_core::feed::{self, TungsteniteConnector};
use playoffcast_core::history::CsvHistory;
use playoffcast_core::model::load_snapshot;
use playoffcast_engine::win_prob::WinProbabilityModel;
use playoffcast_engine::ProbabilityEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Playoffcast starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, {} trials, field of {}",
        config.league.name, config.simulation.trials, config.simulation.playoff_field_size
    );

    // 3. Load the league snapshot and history
    let league = load_snapshot(Path::new(&config.league.snapshot_path))
        .context("failed to load league snapshot")?;
    info!(
        "Loaded {} ({} teams, week {} of {})",
        league.name,
        league.teams.len(),
        league.current_week,
        league.regular_season_weeks
    );

    let model = match &config.league.history_path {
        Some(path) => {
            let history = CsvHistory::load(Path::new(path))
                .context("failed to load head-to-head history")?;
            WinProbabilityModel::with_history(Arc::new(history))
        }
        None => WinProbabilityModel::default(),
    };
    let engine = Arc::new(ProbabilityEngine::with_optimizer(
        model,
        config.simulation.clone(),
        config.optimizer.clone(),
    ));

    // 4. Initial probabilities
    let initial = {
        let engine = Arc::clone(&engine);
        let league = league.clone();
        tokio::task::spawn_blocking(move || engine.championship_probabilities(&league))
            .await
            .context("initial simulation task failed")?
            .context("failed to compute initial probabilities")?
    };
    info!(
        "Initial simulation: {} trials in {:?} (seed {})",
        initial.trials, initial.elapsed, initial.seed
    );
    for record in &initial.probabilities {
        println!("{}", serde_json::to_string(record)?);
    }
    let store = Arc::new(ProbabilityStore::new());
    store
        .seed(0, initial.probabilities)
        .context("initial probabilities failed validation")?;

    // 5. Spawn the live feed task
    let (feed_tx, feed_rx) = mpsc::channel(config.updater.event_queue_capacity);
    let connector = TungsteniteConnector::new(config.feed.url.clone());
    let backoff = config.feed.backoff();
    let feed_handle = tokio::spawn(async move {
        feed::run(&connector, backoff, feed_tx).await;
    });

    // 6. Spawn the updater task
    let (updater, handle) = Updater::new(
        Arc::clone(&engine),
        league,
        Arc::clone(&store),
        config.updater.clone(),
    );
    let mut updates = handle.subscribe();
    let updater_handle = tokio::spawn(updater.run(feed_rx));
    info!("Listening for live events on {}", config.feed.url);

    // 7. Print updates until Ctrl+C
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(update) => println!("{}", serde_json::to_string(&update)?),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Output fell behind; skipped {n} update(s)");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    error!("Failed to listen for Ctrl+C: {e}");
                }
                info!("Shutdown requested");
                break;
            }
        }
    }

    // 8. Cleanup: stop the updater (with timeout), then the feed loop
    handle.stop();
    match tokio::time::timeout(std::time::Duration::from_secs(5), updater_handle).await {
        Ok(Ok(league)) => info!("Updater finished at week {}", league.current_week),
        Ok(Err(e)) => error!("Updater task failed: {e}"),
        Err(_) => warn!("Updater did not stop within 5s"),
    }
    feed_handle.abort();

    let stats = handle.stats();
    info!(
        "Playoffcast shut down: {} events applied, {} dropped, {} notifications",
        stats.events_applied, stats.events_dropped, stats.notifications
    );
    Ok(())
}

/// Initialize tracing to log to a file so stdout stays machine-readable.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("playoffcast.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("playoffcast=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
