// Monte Carlo season simulation.
//
// Every trial plays out the remaining regular season game by game, seeds the
// playoff field from the simulated standings (win percentage, then
// points-for), and runs the bracket. Trials are split into a fixed number of
// chunks; each chunk owns a ChaCha8 generator seeded from the run seed and
// its chunk index, so results are reproducible for a given seed no matter
// how rayon schedules the chunks. Chunk tallies are merged in chunk order
// once every chunk has finished.
//
// Each trial consumes exactly one random draw per regular-season game and
// one per playoff game, so two runs with the same seed see the same draws
// even when the league state differs slightly.

mod bracket;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::Utc;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Deserialize;
use tracing::{debug, info};

use playoffcast_core::model::roster::projected_lineup_points;
use playoffcast_core::model::{
    ChampionshipProbability, KeyFactor, League, LiveScore, Matchup, PlayoffPath,
    SimulationResult, Team,
};

use crate::analysis::ScheduleStrengthAnalyzer;
use crate::win_prob::{
    apply_live, combine, strength, MatchupFactors, StrengthInputs, TeamFactors,
    WinProbabilityModel, STRENGTH_WEIGHT,
};
use crate::EngineError;
use bracket::BracketGame;

pub const DEFAULT_TRIALS: u32 = 10_000;
pub const DEFAULT_PLAYOFF_FIELD: usize = 6;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub trials: u32,
    pub playoff_field_size: usize,
    /// Fixed seed for reproducible runs; random when absent.
    pub seed: Option<u64>,
    /// Number of independently seeded chunks the trials are split into.
    pub chunks: usize,
    /// Per-team trial records kept for inspection.
    pub sample_trials: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            trials: DEFAULT_TRIALS,
            playoff_field_size: DEFAULT_PLAYOFF_FIELD,
            seed: None,
            chunks: 8,
            sample_trials: 20,
        }
    }
}

impl SimulationConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_trials(mut self, trials: u32) -> Self {
        self.trials = trials;
        self
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub seed: u64,
    pub trials: u32,
    pub elapsed: Duration,
    pub probabilities: Vec<ChampionshipProbability>,
}

impl SimulationOutcome {
    pub fn get(&self, team_id: &str) -> Option<&ChampionshipProbability> {
        self.probabilities.iter().find(|p| p.team_id == team_id)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SimulationEngine {
    model: WinProbabilityModel,
    schedule: ScheduleStrengthAnalyzer,
    config: SimulationConfig,
}

impl SimulationEngine {
    pub fn new(model: WinProbabilityModel, config: SimulationConfig) -> Self {
        let schedule = ScheduleStrengthAnalyzer::new(config.playoff_field_size);
        SimulationEngine {
            model,
            schedule,
            config,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn model(&self) -> &WinProbabilityModel {
        &self.model
    }

    pub fn schedule_analyzer(&self) -> &ScheduleStrengthAnalyzer {
        &self.schedule
    }

    /// Simulate the season and report on every team.
    pub fn simulate(&self, league: &League) -> SimulationOutcome {
        let targets: Vec<usize> = (0..league.teams.len()).collect();
        self.run(league, &targets)
    }

    /// Simulate the whole league but report only on `team_ids`.
    pub fn simulate_teams(
        &self,
        league: &League,
        team_ids: &[&str],
    ) -> Result<SimulationOutcome, EngineError> {
        let targets = team_ids
            .iter()
            .map(|id| {
                league
                    .team_index(id)
                    .ok_or_else(|| EngineError::UnknownTeam(id.to_string()))
            })
            .collect::<Result<Vec<usize>, EngineError>>()?;
        Ok(self.run(league, &targets))
    }

    fn run(&self, league: &League, targets: &[usize]) -> SimulationOutcome {
        let started = Instant::now();
        let seed = self.config.seed.unwrap_or_else(rand::random::<u64>);
        let trials = self.config.trials.max(1);
        let prepared = Prepared::new(&self.model, league, self.config.playoff_field_size);
        let plans = chunk_plans(trials, self.config.chunks);
        let sample_limit = self.config.sample_trials;

        let chunks: Vec<ChunkOutcome> = plans
            .par_iter()
            .map(|plan| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(plan.index as u64));
                prepared.run_chunk(plan, targets, sample_limit, &mut rng)
            })
            .collect();

        let mut merged = ChunkOutcome::empty(prepared.n, targets.len());
        for chunk in chunks {
            merged.absorb(chunk, sample_limit);
        }

        let probabilities = targets
            .iter()
            .enumerate()
            .map(|(slot, &team)| self.summarize(league, &prepared, &merged, slot, team, trials))
            .collect();

        let elapsed = started.elapsed();
        info!(
            "Simulated {} trials across {} teams in {:?} (seed {})",
            trials,
            prepared.n,
            elapsed,
            seed
        );

        SimulationOutcome {
            seed,
            trials,
            elapsed,
            probabilities,
        }
    }

    fn summarize(
        &self,
        league: &League,
        prepared: &Prepared,
        merged: &ChunkOutcome,
        slot: usize,
        team: usize,
        trials: u32,
    ) -> ChampionshipProbability {
        let tally = &merged.tallies[team];
        let ratio = |count: u32| count as f64 / trials as f64;
        let expected_seed = if tally.playoffs > 0 {
            tally.seed_sum as f64 / tally.playoffs as f64
        } else {
            0.0
        };

        let optimal_path = best_path(&merged.paths[slot]).map(|((seed, opponents), count)| {
            PlayoffPath {
                seed: *seed,
                opponents: opponents
                    .iter()
                    .map(|&o| prepared.ids[o].clone())
                    .collect(),
                frequency: *count as f64 / tally.championships.max(1) as f64,
            }
        });

        let team_ref = &league.teams[team];
        ChampionshipProbability {
            team_id: team_ref.id.clone(),
            playoff_probability: ratio(tally.playoffs),
            division_probability: ratio(tally.divisions),
            championship_probability: ratio(tally.championships),
            expected_seed,
            schedule_strength: self.schedule.analyze(team_ref, league).remaining_strength,
            momentum_score: prepared.team_factors[team].momentum,
            key_factors: prepared.key_factors(team),
            optimal_path,
            sample_trials: merged.samples[slot].clone(),
            trials,
            computed_at: Utc::now(),
        }
    }
}

/// Most frequent championship path; ties go to the smallest key.
fn best_path(paths: &BTreeMap<PathKey, u32>) -> Option<(&PathKey, &u32)> {
    let mut best: Option<(&PathKey, &u32)> = None;
    for entry in paths {
        if best.map_or(true, |(_, count)| entry.1 > count) {
            best = Some(entry);
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Chunking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChunkPlan {
    index: usize,
    start: u32,
    len: u32,
}

fn chunk_plans(trials: u32, chunks: usize) -> Vec<ChunkPlan> {
    let chunks = chunks.clamp(1, trials.max(1) as usize) as u32;
    let base = trials / chunks;
    let extra = trials % chunks;
    let mut start = 0;
    (0..chunks)
        .map(|i| {
            let len = base + u32::from(i < extra);
            let plan = ChunkPlan {
                index: i as usize,
                start,
                len,
            };
            start += len;
            plan
        })
        .collect()
}

/// (seed, opponent indices in playoff order)
type PathKey = (u32, Vec<usize>);

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    playoffs: u32,
    divisions: u32,
    championships: u32,
    seed_sum: u64,
}

struct ChunkOutcome {
    tallies: Vec<Tally>,
    paths: Vec<BTreeMap<PathKey, u32>>,
    samples: Vec<Vec<SimulationResult>>,
}

impl ChunkOutcome {
    fn empty(teams: usize, targets: usize) -> Self {
        ChunkOutcome {
            tallies: vec![Tally::default(); teams],
            paths: vec![BTreeMap::new(); targets],
            samples: vec![Vec::new(); targets],
        }
    }

    fn absorb(&mut self, other: ChunkOutcome, sample_limit: usize) {
        for (mine, theirs) in self.tallies.iter_mut().zip(other.tallies) {
            mine.playoffs += theirs.playoffs;
            mine.divisions += theirs.divisions;
            mine.championships += theirs.championships;
            mine.seed_sum += theirs.seed_sum;
        }
        for (mine, theirs) in self.paths.iter_mut().zip(other.paths) {
            for (key, count) in theirs {
                *mine.entry(key).or_insert(0) += count;
            }
        }
        for (mine, theirs) in self.samples.iter_mut().zip(other.samples) {
            let room = sample_limit.saturating_sub(mine.len());
            mine.extend(theirs.into_iter().take(room));
        }
    }
}

// ---------------------------------------------------------------------------
// Prepared league
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
struct SimRecord {
    wins: u32,
    losses: u32,
    ties: u32,
    points_for: f64,
    points_against: f64,
}

impl SimRecord {
    fn of(team: &Team) -> Self {
        SimRecord {
            wins: team.record.wins,
            losses: team.record.losses,
            ties: team.record.ties,
            points_for: team.points_for,
            points_against: team.points_against,
        }
    }

    fn games(&self) -> u32 {
        self.wins + self.losses + self.ties
    }

    fn win_pct(&self) -> f64 {
        let games = self.games();
        if games == 0 {
            return 0.5;
        }
        (self.wins as f64 + 0.5 * self.ties as f64) / games as f64
    }

    fn strength_inputs(&self, lineup_projection: f64) -> StrengthInputs {
        let games = self.games();
        StrengthInputs {
            win_pct: self.win_pct(),
            point_diff_per_game: if games == 0 {
                0.0
            } else {
                (self.points_for - self.points_against) / games as f64
            },
            lineup_projection,
        }
    }

    fn record_game(&mut self, won: bool, points: f64, allowed: f64) {
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        self.points_for += points;
        self.points_against += allowed;
    }
}

/// A remaining regular-season game, evaluated from `first`'s perspective.
#[derive(Debug, Clone)]
struct SimGame {
    week: u32,
    first: usize,
    second: usize,
    /// Whether the result is applied to each side's record; false when the
    /// game only appears in the other team's schedule.
    first_counts: bool,
    second_counts: bool,
    factors: MatchupFactors,
    first_points: f64,
    second_points: f64,
    live: Option<LiveScore>,
}

/// League state flattened for fast repeated trials.
struct Prepared {
    n: usize,
    ids: Vec<String>,
    names: Vec<String>,
    base: Vec<SimRecord>,
    projections: Vec<f64>,
    average_projection: f64,
    division: Vec<usize>,
    division_count: usize,
    team_factors: Vec<TeamFactors>,
    games: Vec<SimGame>,
    /// Neutral-site factors for every ordered pair, row-major.
    neutral: Vec<MatchupFactors>,
    field_size: usize,
}

impl Prepared {
    fn new(model: &WinProbabilityModel, league: &League, field_size: usize) -> Self {
        let teams = &league.teams;
        let n = teams.len();
        let divisions = league.divisions();
        let division = teams
            .iter()
            .map(|t| {
                divisions
                    .iter()
                    .position(|d| *d == t.division)
                    .unwrap_or(0)
            })
            .collect();
        let team_factors: Vec<TeamFactors> =
            teams.iter().map(|t| model.team_factors(t, league)).collect();
        let projections: Vec<f64> = teams
            .iter()
            .map(|t| projected_lineup_points(&t.roster))
            .collect();

        let mut neutral = vec![MatchupFactors::default(); n * n];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    neutral[i * n + j] = model.matchup_factors(
                        &teams[i],
                        &team_factors[i],
                        &teams[j],
                        &team_factors[j],
                        None,
                    );
                }
            }
        }

        let mut games = Vec::new();
        for (i, team) in teams.iter().enumerate() {
            for m in team.remaining_schedule() {
                let Some(j) = league.team_index(&m.opponent_id) else {
                    continue;
                };
                let reciprocal = teams[j]
                    .matchup_for_week(m.week)
                    .filter(|r| r.opponent_id == team.id && !r.is_complete());
                let second_counts = reciprocal.is_some();
                if let Some(r) = reciprocal {
                    // Evaluate each pairing once, from the home side when known.
                    let take = if m.is_home != r.is_home { m.is_home } else { i < j };
                    if !take {
                        continue;
                    }
                }
                let mut perspective: Matchup = m.clone();
                if perspective.weather.is_none() {
                    perspective.weather = reciprocal.and_then(|r| r.weather);
                }
                let factors = model.matchup_factors(
                    team,
                    &team_factors[i],
                    &teams[j],
                    &team_factors[j],
                    Some(&perspective),
                );
                games.push(SimGame {
                    week: m.week,
                    first: i,
                    second: j,
                    first_counts: true,
                    second_counts,
                    factors,
                    first_points: m.projected_score.unwrap_or(projections[i]),
                    second_points: reciprocal
                        .and_then(|r| r.projected_score)
                        .unwrap_or(projections[j]),
                    live: m.live,
                });
            }
        }
        games.sort_by_key(|g| (g.week, g.first, g.second));

        Prepared {
            n,
            ids: teams.iter().map(|t| t.id.clone()).collect(),
            names: teams.iter().map(|t| t.name.clone()).collect(),
            base: teams.iter().map(SimRecord::of).collect(),
            average_projection: league.average_lineup_projection(),
            projections,
            division,
            division_count: divisions.len(),
            team_factors,
            games,
            neutral,
            field_size,
        }
    }

    fn strength_of(&self, team: usize, records: &[SimRecord]) -> f64 {
        strength(
            &records[team].strength_inputs(self.projections[team]),
            self.average_projection,
        )
    }

    fn game_probability(&self, game: &SimGame, records: &[SimRecord]) -> f64 {
        let diff = self.strength_of(game.first, records) - self.strength_of(game.second, records);
        let p = combine(diff, &game.factors);
        match &game.live {
            Some(live) => apply_live(
                p,
                live,
                self.projections[game.first],
                self.projections[game.second],
            ),
            None => p,
        }
    }

    fn playoff_probability(&self, a: usize, b: usize, records: &[SimRecord]) -> f64 {
        let diff = self.strength_of(a, records) - self.strength_of(b, records);
        combine(diff, &self.neutral[a * self.n + b])
    }

    /// Average contribution of each factor across `team`'s remaining games,
    /// using current records. Largest magnitude first.
    fn key_factors(&self, team: usize) -> Vec<KeyFactor> {
        let mut totals = [0.0f64; 7];
        let mut count = 0usize;
        let mut home_games = 0usize;
        for g in &self.games {
            let (opponent, factors, ours_first) = if g.first == team {
                (g.second, g.factors, true)
            } else if g.second == team && g.second_counts {
                (g.first, g.factors.reversed(), false)
            } else {
                continue;
            };
            let diff = self.strength_of(team, &self.base) - self.strength_of(opponent, &self.base);
            let model = combine(diff, &factors);
            let live = match &g.live {
                Some(live) => {
                    let oriented = if ours_first { *live } else { live.flipped() };
                    apply_live(
                        model,
                        &oriented,
                        self.projections[team],
                        self.projections[opponent],
                    ) - model
                }
                None => 0.0,
            };
            if factors.home_field > 0.0 {
                home_games += 1;
            }
            let parts = [
                STRENGTH_WEIGHT * diff,
                factors.home_field,
                factors.injury,
                factors.weather,
                factors.momentum,
                factors.head_to_head,
                live,
            ];
            for (total, part) in totals.iter_mut().zip(parts) {
                *total += part;
            }
            count += 1;
        }
        if count == 0 {
            return Vec::new();
        }

        let tf = &self.team_factors[team];
        let descriptions = [
            "Rating edge over remaining opponents".to_string(),
            format!("{home_games} of {count} remaining games at home"),
            format!("Own injury impact {:+.2}", tf.injury),
            "Forecast conditions in outdoor games".to_string(),
            format!("Momentum score {:+.2}", tf.momentum),
            "Historical results against remaining opponents".to_string(),
            "Games currently in progress".to_string(),
        ];
        let names = [
            "Team strength",
            "Home field",
            "Injuries",
            "Weather",
            "Momentum",
            "Head-to-head",
            "Live scoreboard",
        ];

        let mut factors: Vec<KeyFactor> = names
            .iter()
            .zip(descriptions)
            .zip(totals)
            .filter(|((name, _), total)| **name == "Team strength" || total.abs() > 1e-9)
            .map(|((name, description), total)| KeyFactor {
                name: name.to_string(),
                impact: total / count as f64,
                description,
            })
            .collect();
        factors.sort_by(|a, b| {
            b.impact
                .abs()
                .partial_cmp(&a.impact.abs())
                .unwrap_or(Ordering::Equal)
        });
        factors
    }

    fn run_chunk<R: Rng>(
        &self,
        plan: &ChunkPlan,
        targets: &[usize],
        sample_limit: usize,
        rng: &mut R,
    ) -> ChunkOutcome {
        let mut out = ChunkOutcome::empty(self.n, targets.len());
        let mut scratch = TrialScratch::new(self.n, self.division_count);

        for offset in 0..plan.len {
            let trial = plan.start + offset;
            let champion = self.play_trial(rng, &mut scratch);

            for team in 0..self.n {
                let tally = &mut out.tallies[team];
                if let Some(seed) = scratch.seed[team] {
                    tally.playoffs += 1;
                    tally.seed_sum += seed as u64 + 1;
                }
                if scratch.division_winner[team] {
                    tally.divisions += 1;
                }
                if champion == Some(team) {
                    tally.championships += 1;
                }
            }

            for (slot, &team) in targets.iter().enumerate() {
                if champion == Some(team) {
                    if let Some(seed) = scratch.seed[team] {
                        let opponents = scratch.games[team].iter().map(|g| g.opponent).collect();
                        *out.paths[slot].entry((seed as u32 + 1, opponents)).or_insert(0) += 1;
                    }
                }
                if (trial as usize) < sample_limit {
                    out.samples[slot].push(self.sample(team, trial, &scratch, champion));
                }
            }
        }

        debug!(
            "Chunk {} finished trials {}..{}",
            plan.index,
            plan.start,
            plan.start + plan.len
        );
        out
    }

    /// Play one season and bracket. Returns the champion.
    fn play_trial<R: Rng>(&self, rng: &mut R, s: &mut TrialScratch) -> Option<usize> {
        s.reset(&self.base);

        for g in &self.games {
            let p = self.game_probability(g, &s.records);
            let first_wins = rng.gen::<f64>() < p;
            if g.first_counts {
                s.records[g.first].record_game(first_wins, g.first_points, g.second_points);
            }
            if g.second_counts {
                s.records[g.second].record_game(!first_wins, g.second_points, g.first_points);
            }
        }

        let records = &s.records;
        s.order.sort_by(|&a, &b| standings_order(records, a, b));

        for (pos, &team) in s.order.iter().enumerate() {
            s.rank[team] = pos;
            let d = self.division[team];
            if !s.division_seen[d] {
                s.division_seen[d] = true;
                s.division_winner[team] = true;
            }
        }

        let field = self.field_size.min(self.n);
        for (i, &team) in s.order[..field].iter().enumerate() {
            s.seed[team] = Some(i);
        }

        let games = &mut s.games;
        bracket::play(
            &s.order[..field],
            |a, b| rng.gen::<f64>() < self.playoff_probability(a, b, records),
            |team, game| games[team].push(game),
        )
    }

    fn sample(
        &self,
        team: usize,
        trial: u32,
        s: &TrialScratch,
        champion: Option<usize>,
    ) -> SimulationResult {
        let games: &[BracketGame] = &s.games[team];
        let path = match s.seed[team] {
            None => "Missed playoffs".to_string(),
            Some(seed) => {
                let mut parts = vec![format!("Seed {}", seed + 1)];
                parts.extend(games.iter().map(|g| {
                    format!(
                        "{} {} vs {}",
                        g.round,
                        if g.won { "W" } else { "L" },
                        self.names[g.opponent]
                    )
                }));
                parts.join(", ")
            }
        };
        SimulationResult {
            team_id: self.ids[team].clone(),
            trial,
            seed: s.seed[team].map(|seed| seed as u32 + 1),
            made_playoffs: s.seed[team].is_some(),
            won_division: s.division_winner[team],
            playoff_wins: games.iter().filter(|g| g.won).count() as u32,
            won_championship: champion == Some(team),
            final_rank: s.rank[team] as u32 + 1,
            path,
        }
    }
}

/// Win percentage, then points-for, then input order.
fn standings_order(records: &[SimRecord], a: usize, b: usize) -> Ordering {
    records[b]
        .win_pct()
        .partial_cmp(&records[a].win_pct())
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
            records[b]
                .points_for
                .partial_cmp(&records[a].points_for)
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.cmp(&b))
}

/// Buffers reused across trials within a chunk.
struct TrialScratch {
    records: Vec<SimRecord>,
    order: Vec<usize>,
    rank: Vec<usize>,
    seed: Vec<Option<usize>>,
    division_winner: Vec<bool>,
    division_seen: Vec<bool>,
    games: Vec<Vec<BracketGame>>,
}

impl TrialScratch {
    fn new(teams: usize, divisions: usize) -> Self {
        TrialScratch {
            records: Vec::with_capacity(teams),
            order: Vec::with_capacity(teams),
            rank: vec![0; teams],
            seed: vec![None; teams],
            division_winner: vec![false; teams],
            division_seen: vec![false; divisions],
            games: vec![Vec::new(); teams],
        }
    }

    fn reset(&mut self, base: &[SimRecord]) {
        self.records.clear();
        self.records.extend_from_slice(base);
        self.order.clear();
        self.order.extend(0..base.len());
        self.seed.fill(None);
        self.division_winner.fill(false);
        self.division_seen.fill(false);
        for g in &mut self.games {
            g.clear();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{league, record_team};
    use playoffcast_core::model::InjuryStatus;

    fn engine(trials: u32, seed: u64) -> SimulationEngine {
        SimulationEngine::new(
            WinProbabilityModel::default(),
            SimulationConfig::default().with_trials(trials).with_seed(seed),
        )
    }

    /// Circle-method round robin over `weeks` starting at `first_week`.
    /// Requires an even number of teams.
    fn add_schedule(lg: &mut League, first_week: u32, weeks: u32) {
        let n = lg.teams.len();
        let ids: Vec<String> = lg.teams.iter().map(|t| t.id.clone()).collect();
        let mut ring: Vec<usize> = (1..n).collect();
        for w in 0..weeks {
            let week = first_week + w;
            let mut slots = vec![0];
            slots.extend(&ring);
            for k in 0..n / 2 {
                let (home, away) = (slots[k], slots[n - 1 - k]);
                lg.teams[home]
                    .schedule
                    .push(Matchup::new(week, ids[away].clone(), true));
                lg.teams[away]
                    .schedule
                    .push(Matchup::new(week, ids[home].clone(), false));
            }
            ring.rotate_right(1);
        }
    }

    fn eight_team_league() -> League {
        let teams = (0..8)
            .map(|i| record_team(&format!("t{i}"), 9 - i, 1 + i, 1300.0 - 40.0 * i as f64))
            .collect();
        let mut lg = league(teams, 11);
        add_schedule(&mut lg, 11, 3);
        lg
    }

    #[test]
    fn chunk_plans_cover_every_trial() {
        let plans = chunk_plans(10, 4);
        assert_eq!(plans.iter().map(|p| p.len).sum::<u32>(), 10);
        assert_eq!(plans[0], ChunkPlan { index: 0, start: 0, len: 3 });
        assert_eq!(plans[3].start, 8);
        assert_eq!(chunk_plans(3, 8).len(), 3);
    }

    #[test]
    fn single_team_league_is_certain() {
        let lg = league(vec![record_team("solo", 5, 5, 1000.0)], 11);
        let outcome = engine(100, 1).simulate(&lg);
        let p = &outcome.probabilities[0];
        assert_eq!(p.playoff_probability, 1.0);
        assert_eq!(p.division_probability, 1.0);
        assert_eq!(p.championship_probability, 1.0);
        assert_eq!(p.expected_seed, 1.0);
    }

    #[test]
    fn probabilities_are_bounded_and_ordered() {
        let lg = eight_team_league();
        let outcome = engine(2_000, 7).simulate(&lg);
        let total: f64 = outcome
            .probabilities
            .iter()
            .map(|p| p.championship_probability)
            .sum();
        assert!((total - 1.0).abs() < 1e-9);
        for p in &outcome.probabilities {
            for (_, v) in p.probability_fields() {
                assert!((0.0..=1.0).contains(&v));
            }
            assert!(p.playoff_probability >= p.championship_probability);
            if p.playoff_probability == 0.0 {
                assert_eq!(p.expected_seed, 0.0);
            } else {
                assert!(p.expected_seed >= 1.0 && p.expected_seed <= 6.0);
            }
        }
        let playoff_total: f64 = outcome
            .probabilities
            .iter()
            .map(|p| p.playoff_probability)
            .sum();
        assert!((playoff_total - 6.0).abs() < 1e-9);
    }

    #[test]
    fn same_seed_is_deterministic() {
        let lg = eight_team_league();
        let a = engine(1_000, 42).simulate(&lg);
        let b = engine(1_000, 42).simulate(&lg);
        for (x, y) in a.probabilities.iter().zip(&b.probabilities) {
            assert_eq!(x.probability_fields(), y.probability_fields());
            assert_eq!(x.expected_seed, y.expected_seed);
            assert_eq!(x.optimal_path, y.optimal_path);
        }
    }

    #[test]
    fn leader_is_favoured() {
        let lg = eight_team_league();
        let outcome = engine(2_000, 3).simulate(&lg);
        let leader = outcome.get("t0").unwrap();
        let trailer = outcome.get("t7").unwrap();
        assert!(leader.championship_probability > trailer.championship_probability);
        assert!(leader.playoff_probability > 0.95);
        assert!(leader.optimal_path.is_some());
    }

    #[test]
    fn targeted_run_matches_full_run() {
        let lg = eight_team_league();
        let full = engine(1_000, 9).simulate(&lg);
        let targeted = engine(1_000, 9).simulate_teams(&lg, &["t3"]).unwrap();
        assert_eq!(targeted.probabilities.len(), 1);
        assert_eq!(
            targeted.probabilities[0].probability_fields(),
            full.get("t3").unwrap().probability_fields()
        );
        assert!(matches!(
            engine(10, 1).simulate_teams(&lg, &["ghost"]),
            Err(EngineError::UnknownTeam(_))
        ));
    }

    #[test]
    fn starter_injury_lowers_championship_odds() {
        let lg = eight_team_league();
        let before = engine(4_000, 11).simulate(&lg);

        let mut hurt = lg.clone();
        let t2 = hurt.team_mut("t2").unwrap();
        for id in ["t2-qb1", "t2-rb1", "t2-wr1"] {
            t2.player_mut(id).unwrap().injury_status = InjuryStatus::Out;
        }
        let after = engine(4_000, 11).simulate(&hurt);
        assert!(
            after.get("t2").unwrap().championship_probability
                < before.get("t2").unwrap().championship_probability
        );
    }

    #[test]
    fn samples_are_capped() {
        let lg = eight_team_league();
        let outcome = engine(500, 5).simulate(&lg);
        for p in &outcome.probabilities {
            assert_eq!(p.sample_trials.len(), 20);
            assert_eq!(p.sample_trials[0].trial, 0);
        }
    }
}
