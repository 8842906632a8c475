// Path optimization.
//
// Turns a team's simulated probabilities and factor analyses into ranked
// strategies, an optimized championship probability, scenario projections,
// a week-by-week action timeline, and the rivals most likely to stand in
// the way.

pub mod rivals;
pub mod scenarios;
pub mod strategies;

pub use rivals::{RivalAssessment, ThreatLevel};
pub use scenarios::{Scenario, ScenarioEvent, ScenarioKind};
pub use strategies::{Difficulty, OptimizationStrategy, Priority, StrategyCategory};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use playoffcast_core::model::{ChampionshipProbability, League, Team};

use crate::analysis::{InjuryReport, MomentumReport, PatternReport, ScheduleReport};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// One remaining game as seen by the optimizer.
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyOutlook {
    pub week: u32,
    pub opponent_id: String,
    pub opponent_name: String,
    pub is_home: bool,
    pub win_probability: f64,
    pub difficulty: f64,
    pub weather_impact: f64,
    pub opponent_weather_impact: f64,
}

/// Every analyzer output for one team, gathered once per optimization.
#[derive(Debug, Clone, Serialize)]
pub struct FactorSnapshot {
    pub regular_season_weeks: u32,
    pub injury: InjuryReport,
    pub momentum: MomentumReport,
    pub schedule: ScheduleReport,
    pub patterns: PatternReport,
    pub outlook: Vec<WeeklyOutlook>,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    pub week: u32,
    pub focus: String,
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizationReport {
    pub team_id: String,
    pub team_name: String,
    pub current_probability: f64,
    pub optimized_probability: f64,
    pub strategies: Vec<OptimizationStrategy>,
    pub scenarios: Vec<Scenario>,
    pub timeline: Vec<TimelineEntry>,
    pub rivals: Vec<RivalAssessment>,
    pub pattern_evidence: f64,
    pub generated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Optimizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Strategies kept in the report.
    pub max_strategies: usize,
    /// Top strategies whose confidence-weighted impacts are combined.
    pub combine_top: usize,
    pub rival_count: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            max_strategies: 8,
            combine_top: 3,
            rival_count: 3,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PathOptimizer {
    config: OptimizerConfig,
}

impl PathOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        PathOptimizer { config }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn optimize(
        &self,
        team: &Team,
        league: &League,
        current: &ChampionshipProbability,
        factors: &FactorSnapshot,
    ) -> OptimizationReport {
        let mut ranked = strategies::generate(current, factors);
        ranked.truncate(self.config.max_strategies);

        let optimized_probability = optimized(current.championship_probability, &ranked, self.config.combine_top);
        let scenarios = scenarios::build(team, current, factors, optimized_probability);
        let timeline = timeline(&factors.outlook, &ranked);
        let rivals = rivals::assess(team, league, self.config.rival_count);

        OptimizationReport {
            team_id: team.id.clone(),
            team_name: team.name.clone(),
            current_probability: current.championship_probability,
            optimized_probability,
            strategies: ranked,
            scenarios,
            timeline,
            rivals,
            pattern_evidence: factors.patterns.evidence_score,
            generated_at: Utc::now(),
        }
    }
}

/// Current probability plus the confidence-weighted impact of the top
/// `top` strategies, never below current and never above 1.
pub fn optimized(current: f64, ranked: &[OptimizationStrategy], top: usize) -> f64 {
    let gain: f64 = ranked.iter().take(top).map(|s| s.score()).sum();
    (current + gain).clamp(current, 1.0)
}

fn timeline(outlook: &[WeeklyOutlook], ranked: &[OptimizationStrategy]) -> Vec<TimelineEntry> {
    let first_week = outlook.first().map(|g| g.week);
    outlook
        .iter()
        .map(|game| {
            let mut actions: Vec<String> = ranked
                .iter()
                .filter(|s| {
                    s.weeks.contains(&game.week)
                        || (s.weeks.is_empty() && Some(game.week) == first_week)
                })
                .map(|s| s.title.clone())
                .collect();
            if actions.is_empty() {
                actions.push("Set the best projected lineup".into());
            }
            TimelineEntry {
                week: game.week,
                focus: format!(
                    "{} {} ({:.0}% to win)",
                    if game.is_home { "vs" } else { "at" },
                    game.opponent_name,
                    game.win_probability * 100.0
                ),
                actions,
            }
        })
        .collect()
}
