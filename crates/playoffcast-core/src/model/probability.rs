// Derived probability records produced by the simulation engine.
//
// A `ChampionshipProbability` has no lifecycle of its own: it is rebuilt from
// scratch on every recomputation for a team and replaces the previous record
// wholesale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One named contribution to a team's win probability, averaged over its
/// remaining games. `impact` is in probability points (e.g. 0.03 = +3%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFactor {
    pub name: String,
    pub impact: f64,
    pub description: String,
}

/// The most common route to a title across championship trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayoffPath {
    pub seed: u32,
    /// Team ids of defeated opponents, in round order.
    pub opponents: Vec<String>,
    /// Share of championship trials that followed this exact path.
    pub frequency: f64,
}

/// Outcome of a single Monte Carlo trial for one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub team_id: String,
    pub trial: u32,
    /// Playoff seed, if the team qualified.
    pub seed: Option<u32>,
    pub made_playoffs: bool,
    pub won_division: bool,
    pub playoff_wins: u32,
    pub won_championship: bool,
    /// Final regular-season rank (1 = best).
    pub final_rank: u32,
    /// Human-readable list of opponents beaten in the playoffs.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampionshipProbability {
    pub team_id: String,
    pub playoff_probability: f64,
    pub division_probability: f64,
    pub championship_probability: f64,
    /// Mean seed over trials in which the team qualified; 0.0 if it never did.
    pub expected_seed: f64,
    pub schedule_strength: f64,
    pub momentum_score: f64,
    /// Win-probability contributions ranked by magnitude.
    pub key_factors: Vec<KeyFactor>,
    pub optimal_path: Option<PlayoffPath>,
    /// Bounded sample of raw trials for inspection.
    pub sample_trials: Vec<SimulationResult>,
    pub trials: u32,
    pub computed_at: DateTime<Utc>,
}

impl ChampionshipProbability {
    /// Probability-valued fields with their names, for validation and display.
    pub fn probability_fields(&self) -> [(&'static str, f64); 3] {
        [
            ("playoff_probability", self.playoff_probability),
            ("division_probability", self.division_probability),
            ("championship_probability", self.championship_probability),
        ]
    }
}
