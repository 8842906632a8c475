// Probability engine: factor analyzers, the per-game win probability model,
// Monte Carlo season simulation, and path optimization.
//
// `ProbabilityEngine` is the entry point the service uses. It validates a
// league snapshot once, then hands it to the simulation or the optimizer.

pub mod analysis;
pub mod optimizer;
pub mod simulation;
pub mod win_prob;

use thiserror::Error;
use tracing::debug;

use playoffcast_core::model::{ChampionshipProbability, League};
use playoffcast_core::validation::{validate_league, ValidationError};

use crate::optimizer::{FactorSnapshot, OptimizationReport, OptimizerConfig, PathOptimizer, WeeklyOutlook};
use crate::simulation::{SimulationConfig, SimulationEngine, SimulationOutcome};
use crate::win_prob::WinProbabilityModel;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid league snapshot: {0}")]
    Invalid(#[from] ValidationError),

    #[error("unknown team: {0}")]
    UnknownTeam(String),
}

// ---------------------------------------------------------------------------
// Facade
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ProbabilityEngine {
    simulation: SimulationEngine,
    optimizer: PathOptimizer,
}

impl ProbabilityEngine {
    pub fn new(model: WinProbabilityModel, config: SimulationConfig) -> Self {
        Self::with_optimizer(model, config, OptimizerConfig::default())
    }

    pub fn with_optimizer(
        model: WinProbabilityModel,
        config: SimulationConfig,
        optimizer: OptimizerConfig,
    ) -> Self {
        ProbabilityEngine {
            simulation: SimulationEngine::new(model, config),
            optimizer: PathOptimizer::new(optimizer),
        }
    }

    pub fn simulation(&self) -> &SimulationEngine {
        &self.simulation
    }

    pub fn model(&self) -> &WinProbabilityModel {
        self.simulation.model()
    }

    /// Championship probabilities for every team in the league.
    pub fn championship_probabilities(&self, league: &League) -> Result<SimulationOutcome, EngineError> {
        validate_league(league)?;
        Ok(self.simulation.simulate(league))
    }

    /// Simulate the league, reporting only on `team_ids`.
    pub fn team_probabilities(
        &self,
        league: &League,
        team_ids: &[&str],
    ) -> Result<SimulationOutcome, EngineError> {
        validate_league(league)?;
        self.simulation.simulate_teams(league, team_ids)
    }

    pub fn team_probability(
        &self,
        league: &League,
        team_id: &str,
    ) -> Result<ChampionshipProbability, EngineError> {
        let outcome = self.team_probabilities(league, &[team_id])?;
        outcome
            .probabilities
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::UnknownTeam(team_id.to_string()))
    }

    /// Run every analyzer for one team and project each remaining game.
    pub fn factor_snapshot(&self, league: &League, team_id: &str) -> Result<FactorSnapshot, EngineError> {
        let team = league
            .team(team_id)
            .ok_or_else(|| EngineError::UnknownTeam(team_id.to_string()))?;
        let model = self.model();
        let schedule = self.simulation.schedule_analyzer().analyze(team, league);

        let mut remaining: Vec<_> = team.remaining_schedule().collect();
        remaining.sort_by_key(|m| m.week);
        let mut previous_kickoff = team.completed_matchups().last().and_then(|m| m.kickoff);
        let mut outlook = Vec::with_capacity(remaining.len());
        for matchup in remaining {
            let Some(opponent) = league.team(&matchup.opponent_id) else {
                continue;
            };
            let breakdown = model.breakdown(team, opponent, Some(matchup), league);
            let difficulty = self
                .simulation
                .schedule_analyzer()
                .matchup_difficulty(team, matchup, previous_kickoff, league)
                .map_or(0.5, |d| d.difficulty);
            let weather = matchup.weather.as_ref();
            outlook.push(WeeklyOutlook {
                week: matchup.week,
                opponent_id: opponent.id.clone(),
                opponent_name: opponent.name.clone(),
                is_home: matchup.is_home,
                win_probability: breakdown.probability,
                difficulty,
                weather_impact: model.weather_analyzer().analyze(team, weather).impact,
                opponent_weather_impact: model.weather_analyzer().analyze(opponent, weather).impact,
            });
            previous_kickoff = matchup.kickoff.or(previous_kickoff);
        }

        Ok(FactorSnapshot {
            regular_season_weeks: league.regular_season_weeks,
            injury: model.injury_analyzer().analyze(team),
            momentum: model.momentum_analyzer().analyze(team, league),
            schedule,
            patterns: model.history_analyzer().analyze(team, league),
            outlook,
        })
    }

    /// Simulate the team's current odds, then optimize its path.
    pub fn optimization_report(&self, league: &League, team_id: &str) -> Result<OptimizationReport, EngineError> {
        let current = self.team_probability(league, team_id)?;
        self.optimization_report_from(league, &current)
    }

    /// Optimize from an already computed probability record.
    pub fn optimization_report_from(
        &self,
        league: &League,
        current: &ChampionshipProbability,
    ) -> Result<OptimizationReport, EngineError> {
        let team = league
            .team(&current.team_id)
            .ok_or_else(|| EngineError::UnknownTeam(current.team_id.clone()))?;
        let factors = self.factor_snapshot(league, &team.id)?;
        let report = self.optimizer.optimize(team, league, current, &factors);
        debug!(
            "Optimized {}: {:.3} -> {:.3} ({} strategies)",
            team.id,
            report.current_probability,
            report.optimized_probability,
            report.strategies.len()
        );
        Ok(report)
    }
}
