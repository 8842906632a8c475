// Real-time probability updater.
//
// A single task consumes feed events in order, applies them to the canonical
// league, and schedules recomputations:
//
//   - injury and game-end events recompute the affected teams at once
//     (folding in any batch that is waiting),
//   - every other event joins a batch that is flushed when the debounce
//     window opened by its first event closes,
//   - while Active, the whole league is recomputed on a fixed interval.
//
// Recomputations run on the blocking pool behind a semaphore and report
// back over a channel. Each carries a sequence number; the store discards
// results older than what it already holds. A notification is published
// whenever a team's championship probability moves by more than the
// configured threshold.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch, Semaphore};
use tokio::task::JoinError;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use playoffcast_core::feed::FeedEvent;
use playoffcast_core::model::roster::{inactive_starter_count, projected_lineup_points, LINEUP_SIZE};
use playoffcast_core::model::{League, Team};
use playoffcast_core::protocol::{ConnectionStatus, LiveEvent, ProbabilityUpdate};
use playoffcast_engine::simulation::SimulationOutcome;
use playoffcast_engine::{EngineError, ProbabilityEngine};

use crate::config::UpdaterConfig;
use crate::live::{apply_event, Urgency};
use crate::store::{ProbabilityStore, StoreOutcome};

// ---------------------------------------------------------------------------
// Status surfaces
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdaterState {
    #[default]
    Stopped,
    Starting,
    Active,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdaterStats {
    pub events_applied: u64,
    /// Unparseable frames and events that referenced unknown data.
    pub events_dropped: u64,
    pub targeted_recomputes: u64,
    pub full_recomputes: u64,
    pub failed_recomputes: u64,
    pub records_updated: u64,
    /// Results discarded because a newer record was already stored.
    pub stale_records: u64,
    pub notifications: u64,
}

/// Caller side of a running updater.
#[derive(Debug)]
pub struct UpdaterHandle {
    pub state: watch::Receiver<UpdaterState>,
    pub connection: watch::Receiver<ConnectionStatus>,
    pub stats: watch::Receiver<UpdaterStats>,
    updates: broadcast::Sender<ProbabilityUpdate>,
    stop: watch::Sender<bool>,
}

impl UpdaterHandle {
    /// Stream of significant probability changes.
    pub fn subscribe(&self) -> broadcast::Receiver<ProbabilityUpdate> {
        self.updates.subscribe()
    }

    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    pub fn state(&self) -> UpdaterState {
        *self.state.borrow()
    }

    pub fn stats(&self) -> UpdaterStats {
        self.stats.borrow().clone()
    }
}

// ---------------------------------------------------------------------------
// Recompute plumbing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Scope {
    Full,
    Teams(Vec<String>),
}

#[derive(Debug, Error)]
enum RecomputeError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("recompute task failed: {0}")]
    Join(#[from] JoinError),
}

struct Recomputed {
    sequence: u64,
    scope: Scope,
    reasons: BTreeMap<String, Vec<String>>,
    outcome: Result<SimulationOutcome, RecomputeError>,
}

/// Events waiting for the debounce window to close.
#[derive(Debug, Default)]
struct Batch {
    teams: BTreeSet<String>,
    reasons: BTreeMap<String, Vec<String>>,
    deadline: Option<Instant>,
}

impl Batch {
    fn add(&mut self, teams: &[String], reasons: &[String]) {
        for team in teams {
            self.teams.insert(team.clone());
            self.reasons
                .entry(team.clone())
                .or_default()
                .extend(reasons.iter().cloned());
        }
    }

    fn take(&mut self) -> (Vec<String>, BTreeMap<String, Vec<String>>) {
        self.deadline = None;
        (
            std::mem::take(&mut self.teams).into_iter().collect(),
            std::mem::take(&mut self.reasons),
        )
    }
}

// ---------------------------------------------------------------------------
// Updater
// ---------------------------------------------------------------------------

pub struct Updater {
    engine: Arc<ProbabilityEngine>,
    league: League,
    store: Arc<ProbabilityStore>,
    config: UpdaterConfig,
    sequence: u64,
    full_in_flight: bool,
    state_tx: watch::Sender<UpdaterState>,
    connection_tx: watch::Sender<ConnectionStatus>,
    stats_tx: watch::Sender<UpdaterStats>,
    updates_tx: broadcast::Sender<ProbabilityUpdate>,
    stop_rx: watch::Receiver<bool>,
}

impl Updater {
    pub fn new(
        engine: Arc<ProbabilityEngine>,
        league: League,
        store: Arc<ProbabilityStore>,
        config: UpdaterConfig,
    ) -> (Updater, UpdaterHandle) {
        let (state_tx, state_rx) = watch::channel(UpdaterState::Stopped);
        let (connection_tx, connection_rx) = watch::channel(ConnectionStatus::Disconnected);
        let (stats_tx, stats_rx) = watch::channel(UpdaterStats::default());
        let (updates_tx, _) = broadcast::channel(config.event_queue_capacity.max(1));
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = UpdaterHandle {
            state: state_rx,
            connection: connection_rx,
            stats: stats_rx,
            updates: updates_tx.clone(),
            stop: stop_tx,
        };
        let updater = Updater {
            engine,
            league,
            store,
            config,
            sequence: 0,
            full_in_flight: false,
            state_tx,
            connection_tx,
            stats_tx,
            updates_tx,
            stop_rx,
        };
        (updater, handle)
    }

    /// Run until stopped or until the feed channel closes. Returns the
    /// league as last updated.
    pub async fn run(mut self, mut feed_rx: mpsc::Receiver<FeedEvent>) -> League {
        info!("Updater starting");
        self.state_tx.send_replace(UpdaterState::Starting);

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_recomputes.max(1)));
        let (result_tx, mut result_rx) = mpsc::channel::<Recomputed>(64);
        let mut batch = Batch::default();
        let mut stop_open = true;

        let mut full_interval = tokio::time::interval(self.config.full_update_interval());
        full_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the baseline below covers it.
        full_interval.tick().await;

        self.dispatch(Scope::Full, BTreeMap::new(), &semaphore, &result_tx);

        loop {
            tokio::select! {
                changed = self.stop_rx.changed(), if stop_open => {
                    match changed {
                        Ok(()) if *self.stop_rx.borrow() => {
                            info!("Updater stop requested");
                            break;
                        }
                        Ok(()) => {}
                        // Handle dropped: no stop signal can arrive any more.
                        Err(_) => stop_open = false,
                    }
                }

                feed_event = feed_rx.recv() => {
                    match feed_event {
                        Some(FeedEvent::Connected { endpoint }) => {
                            info!("Live feed connected ({endpoint})");
                            self.connection_tx.send_replace(ConnectionStatus::Connected);
                            self.state_tx.send_replace(UpdaterState::Active);
                        }
                        Some(FeedEvent::Disconnected) => {
                            warn!("Live feed disconnected");
                            self.connection_tx.send_replace(ConnectionStatus::Disconnected);
                        }
                        Some(FeedEvent::Reconnecting { attempt, delay }) => {
                            debug!("Live feed reconnect attempt {attempt} in {delay:?}");
                            self.connection_tx
                                .send_replace(ConnectionStatus::Reconnecting { attempt });
                        }
                        Some(FeedEvent::Message(text)) => {
                            self.handle_message(&text, &mut batch, &semaphore, &result_tx);
                        }
                        None => {
                            error!("Live feed channel closed, stopping updater");
                            break;
                        }
                    }
                }

                Some(result) = result_rx.recv() => {
                    self.apply_result(result);
                }

                _ = tokio::time::sleep_until(batch.deadline.unwrap_or_else(Instant::now)),
                    if batch.deadline.is_some() => {
                    let (teams, reasons) = batch.take();
                    debug!("Debounce window closed: recomputing {} team(s)", teams.len());
                    self.dispatch(Scope::Teams(teams), reasons, &semaphore, &result_tx);
                }

                _ = full_interval.tick(), if *self.state_tx.borrow() == UpdaterState::Active => {
                    if self.full_in_flight {
                        debug!("Skipping periodic recompute; previous one still running");
                    } else {
                        self.dispatch(Scope::Full, BTreeMap::new(), &semaphore, &result_tx);
                    }
                }
            }
        }

        self.state_tx.send_replace(UpdaterState::Stopped);
        self.connection_tx.send_replace(ConnectionStatus::Disconnected);
        info!("Updater stopped");
        self.league
    }

    fn handle_message(
        &mut self,
        text: &str,
        batch: &mut Batch,
        semaphore: &Arc<Semaphore>,
        result_tx: &mpsc::Sender<Recomputed>,
    ) {
        let event = match LiveEvent::parse(text) {
            Ok(event) => event,
            Err(e) => {
                warn!("Dropping malformed live event: {e}");
                self.bump(|s| s.events_dropped += 1);
                return;
            }
        };

        let applied = match apply_event(&mut self.league, &event) {
            Ok(applied) => applied,
            Err(e) => {
                warn!("Dropping {} event for {}: {e}", event.kind().label(), event.team_id);
                self.bump(|s| s.events_dropped += 1);
                return;
            }
        };
        debug!(
            "Applied {} event for {} ({:?})",
            applied.kind.label(),
            event.team_id,
            applied.urgency
        );
        self.bump(|s| s.events_applied += 1);

        batch.add(&applied.affected, &applied.reasons);
        match applied.urgency {
            Urgency::Immediate => {
                let (teams, reasons) = batch.take();
                self.dispatch(Scope::Teams(teams), reasons, semaphore, result_tx);
            }
            Urgency::Batched => {
                if batch.deadline.is_none() {
                    batch.deadline = Some(Instant::now() + self.config.debounce());
                }
            }
        }
    }

    fn dispatch(
        &mut self,
        scope: Scope,
        reasons: BTreeMap<String, Vec<String>>,
        semaphore: &Arc<Semaphore>,
        result_tx: &mpsc::Sender<Recomputed>,
    ) {
        if let Scope::Teams(teams) = &scope {
            if teams.is_empty() {
                return;
            }
        }
        self.sequence += 1;
        let sequence = self.sequence;
        match &scope {
            Scope::Full => {
                self.full_in_flight = true;
                self.bump(|s| s.full_recomputes += 1);
            }
            Scope::Teams(_) => self.bump(|s| s.targeted_recomputes += 1),
        }

        let engine = Arc::clone(&self.engine);
        let league = self.league.clone();
        let semaphore = Arc::clone(semaphore);
        let result_tx = result_tx.clone();
        tokio::spawn(async move {
            // The semaphore is never closed.
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };
            let job_scope = scope.clone();
            let joined = tokio::task::spawn_blocking(move || match &job_scope {
                Scope::Full => engine.championship_probabilities(&league),
                Scope::Teams(ids) => {
                    let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
                    engine.team_probabilities(&league, &ids)
                }
            })
            .await;
            let outcome = match joined {
                Ok(result) => result.map_err(RecomputeError::from),
                Err(e) => Err(RecomputeError::from(e)),
            };
            let _ = result_tx
                .send(Recomputed {
                    sequence,
                    scope,
                    reasons,
                    outcome,
                })
                .await;
        });
    }

    fn apply_result(&mut self, result: Recomputed) {
        if result.scope == Scope::Full {
            self.full_in_flight = false;
        }
        let outcome = match result.outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Recompute #{} failed: {e}", result.sequence);
                self.bump(|s| s.failed_recomputes += 1);
                return;
            }
        };
        debug!(
            "Recompute #{} finished in {:?} ({} team(s))",
            result.sequence,
            outcome.elapsed,
            outcome.probabilities.len()
        );

        let mut reasons = result.reasons;
        for record in outcome.probabilities {
            let team_id = record.team_id.clone();
            let new_probability = record.championship_probability;
            match self.store.apply(result.sequence, record) {
                StoreOutcome::Applied { previous } => {
                    self.bump(|s| s.records_updated += 1);
                    let Some(previous) = previous else {
                        continue;
                    };
                    let delta = new_probability - previous.championship_probability;
                    if delta.abs() > self.config.significant_change {
                        let event_reasons = reasons.remove(&team_id).unwrap_or_default();
                        self.notify(&team_id, previous.championship_probability, new_probability, event_reasons);
                    }
                }
                StoreOutcome::Stale { current_sequence } => {
                    debug!(
                        "Discarding stale result #{} for {team_id} (holding #{current_sequence})",
                        result.sequence
                    );
                    self.bump(|s| s.stale_records += 1);
                }
            }
        }
    }

    fn notify(&mut self, team_id: &str, previous: f64, new: f64, mut reasons: Vec<String>) {
        if let Some(team) = self.league.team(team_id) {
            for reason in explain(team, self.league.current_week) {
                if !reasons.contains(&reason) {
                    reasons.push(reason);
                }
            }
        }
        if reasons.is_empty() {
            reasons.push("Periodic full recompute".into());
        }
        let update = ProbabilityUpdate {
            team_id: team_id.to_string(),
            previous_probability: previous,
            new_probability: new,
            delta: new - previous,
            reasons,
            timestamp: Utc::now(),
        };
        info!(
            "Championship probability for {team_id}: {:.1}% -> {:.1}%",
            previous * 100.0,
            new * 100.0
        );
        // No subscribers is fine.
        let _ = self.updates_tx.send(update);
        self.bump(|s| s.notifications += 1);
    }

    fn bump(&self, f: impl FnOnce(&mut UpdaterStats)) {
        self.stats_tx.send_modify(f);
    }
}

/// Best-effort explanation from the live scoreboard and roster availability.
fn explain(team: &Team, week: u32) -> Vec<String> {
    let mut reasons = Vec::new();
    if let Some((score, projected)) = team
        .matchup_for_week(week)
        .and_then(|m| m.live.map(|live| (live, m.projected_score)))
    {
        let projection = projected.unwrap_or_else(|| projected_lineup_points(&team.roster));
        let played = 1.0 - score.starters_remaining as f64 / LINEUP_SIZE as f64;
        let expected = projection * played;
        if played > 0.0 {
            reasons.push(format!(
                "Live: {:.1} points vs {:.1} expected so far ({} starter(s) left)",
                score.points, expected, score.starters_remaining
            ));
        }
    }
    let inactive = inactive_starter_count(&team.roster);
    if inactive > 0 {
        reasons.push(format!(
            "{} of {} projected starters unavailable",
            inactive, LINEUP_SIZE
        ));
    }
    reasons
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
