// Historical pattern analysis.
//
// Teams are matched against a fixed catalog of championship profiles, each
// carrying a prior confidence and the share of past champions that fit it.
// Head-to-head records come from a pluggable `HistoricalDataProvider`.

use std::sync::Arc;

use serde::Serialize;

use playoffcast_core::history::{HeadToHead, HistoricalDataProvider, NoHistory};
use playoffcast_core::model::roster::intended_starters;
use playoffcast_core::model::{GameOutcome, League, Position, Team};

use super::{coefficient_of_variation, injured_starters, mean, scoring_rate};

/// Strength at or above which a pattern counts as matched.
pub const MATCH_THRESHOLD: f64 = 0.5;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    LateSeasonSurge,
    TopThreeScoring,
    BalancedRoster,
    TimedInjuryRecovery,
    MomentumIntoPlayoffs,
    ConsistencyOverCeiling,
}

#[derive(Debug, Clone, Copy)]
pub struct ChampionshipPattern {
    pub kind: PatternKind,
    pub name: &'static str,
    pub description: &'static str,
    pub prior_confidence: f64,
    /// Share of past champions that fit the pattern.
    pub success_rate: f64,
}

const CATALOG: [ChampionshipPattern; 6] = [
    ChampionshipPattern {
        kind: PatternKind::LateSeasonSurge,
        name: "Late-season surge",
        description: "Winning more down the stretch than early in the season",
        prior_confidence: 0.70,
        success_rate: 0.31,
    },
    ChampionshipPattern {
        kind: PatternKind::TopThreeScoring,
        name: "Top-three offense",
        description: "Among the league's three highest-scoring teams",
        prior_confidence: 0.85,
        success_rate: 0.42,
    },
    ChampionshipPattern {
        kind: PatternKind::BalancedRoster,
        name: "Balanced roster",
        description: "Production spread evenly across the starting lineup",
        prior_confidence: 0.60,
        success_rate: 0.24,
    },
    ChampionshipPattern {
        kind: PatternKind::TimedInjuryRecovery,
        name: "Timed injury recovery",
        description: "Injured starters due back before the playoffs",
        prior_confidence: 0.55,
        success_rate: 0.22,
    },
    ChampionshipPattern {
        kind: PatternKind::MomentumIntoPlayoffs,
        name: "Momentum into the playoffs",
        description: "Winning the final regular-season games",
        prior_confidence: 0.75,
        success_rate: 0.35,
    },
    ChampionshipPattern {
        kind: PatternKind::ConsistencyOverCeiling,
        name: "Consistency over ceiling",
        description: "Low week-to-week scoring variance",
        prior_confidence: 0.65,
        success_rate: 0.28,
    },
];

pub fn pattern_catalog() -> &'static [ChampionshipPattern] {
    &CATALOG
}

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PatternMatch {
    pub kind: PatternKind,
    pub name: String,
    /// How closely the team fits, in [0, 1].
    pub strength: f64,
    pub confidence: f64,
    pub success_rate: f64,
    pub evidence: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternReport {
    pub team_id: String,
    /// Patterns with strength at or above [`MATCH_THRESHOLD`], strongest first.
    pub matches: Vec<PatternMatch>,
    /// Catalog-weighted fit in [0, 1].
    pub evidence_score: f64,
    pub details: Vec<String>,
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct HistoricalPatternAnalyzer {
    provider: Arc<dyn HistoricalDataProvider>,
}

impl Default for HistoricalPatternAnalyzer {
    fn default() -> Self {
        Self::new(Arc::new(NoHistory))
    }
}

impl std::fmt::Debug for HistoricalPatternAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoricalPatternAnalyzer").finish_non_exhaustive()
    }
}

impl HistoricalPatternAnalyzer {
    pub fn new(provider: Arc<dyn HistoricalDataProvider>) -> Self {
        HistoricalPatternAnalyzer { provider }
    }

    pub fn head_to_head(&self, team_id: &str, opponent_id: &str) -> Option<HeadToHead> {
        self.provider.head_to_head(team_id, opponent_id)
    }

    /// Head-to-head edge in [-1, 1]; zero without data.
    pub fn head_to_head_edge(&self, team_id: &str, opponent_id: &str) -> f64 {
        self.head_to_head(team_id, opponent_id)
            .map(|h| h.edge())
            .unwrap_or(0.0)
    }

    pub fn analyze(&self, team: &Team, league: &League) -> PatternReport {
        let mut scored: Vec<(ChampionshipPattern, f64, String)> = CATALOG
            .iter()
            .map(|pattern| {
                let (strength, evidence) = match pattern.kind {
                    PatternKind::LateSeasonSurge => late_season_surge(team),
                    PatternKind::TopThreeScoring => top_three_scoring(team, league),
                    PatternKind::BalancedRoster => balanced_roster(team),
                    PatternKind::TimedInjuryRecovery => timed_recovery(team, league),
                    PatternKind::MomentumIntoPlayoffs => momentum_into_playoffs(team),
                    PatternKind::ConsistencyOverCeiling => consistency_over_ceiling(team),
                };
                (*pattern, strength.clamp(0.0, 1.0), evidence)
            })
            .collect();

        let denominator: f64 = CATALOG
            .iter()
            .map(|p| p.prior_confidence * p.success_rate)
            .sum();
        let numerator: f64 = scored
            .iter()
            .map(|(p, s, _)| s * p.prior_confidence * p.success_rate)
            .sum();
        let evidence_score = if denominator > 0.0 {
            (numerator / denominator).clamp(0.0, 1.0)
        } else {
            0.0
        };

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let matches: Vec<PatternMatch> = scored
            .into_iter()
            .filter(|(_, s, _)| *s >= MATCH_THRESHOLD)
            .map(|(p, strength, evidence)| PatternMatch {
                kind: p.kind,
                name: p.name.to_string(),
                strength,
                confidence: p.prior_confidence * strength,
                success_rate: p.success_rate,
                evidence,
            })
            .collect();

        let details = if matches.is_empty() {
            vec!["No championship patterns matched".to_string()]
        } else {
            matches
                .iter()
                .map(|m| format!("{}: {}", m.name, m.evidence))
                .collect()
        };

        PatternReport {
            team_id: team.id.clone(),
            matches,
            evidence_score,
            details,
        }
    }
}

// ---------------------------------------------------------------------------
// Pattern detectors: each returns (strength, evidence)
// ---------------------------------------------------------------------------

fn win_share(results: &[GameOutcome]) -> Option<f64> {
    if results.is_empty() {
        return None;
    }
    let pts: f64 = results
        .iter()
        .map(|r| match r {
            GameOutcome::Win => 1.0,
            GameOutcome::Tie => 0.5,
            GameOutcome::Loss => 0.0,
        })
        .sum();
    Some(pts / results.len() as f64)
}

fn late_season_surge(team: &Team) -> (f64, String) {
    let all = team.recent_results(usize::MAX);
    if all.len() < 3 {
        return (0.0, "Too few games played".into());
    }
    let split = all.len().saturating_sub(4);
    let recent = win_share(&all[split..]).unwrap_or(0.0);
    let early = win_share(&all[..split]).unwrap_or(recent);
    if recent <= 0.5 {
        return (0.0, format!("Won {:.0}% of recent games", recent * 100.0));
    }
    let base = (recent - 0.5) * 2.0;
    let strength = if recent > early { base } else { base * 0.5 };
    (
        strength,
        format!(
            "Won {:.0}% of recent games after {:.0}% earlier",
            recent * 100.0,
            early * 100.0
        ),
    )
}

fn top_three_scoring(team: &Team, league: &League) -> (f64, String) {
    let mut rates: Vec<(&str, f64)> = league
        .teams
        .iter()
        .map(|t| (t.id.as_str(), scoring_rate(t)))
        .collect();
    rates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let rank = rates
        .iter()
        .position(|(id, _)| *id == team.id)
        .map(|i| i + 1)
        .unwrap_or(rates.len() + 1);
    let strength = match rank {
        1 => 1.0,
        2 => 0.9,
        3 => 0.8,
        4 => 0.3,
        _ => 0.0,
    };
    (strength, format!("Ranks #{rank} in scoring"))
}

fn balanced_roster(team: &Team) -> (f64, String) {
    let points: Vec<f64> = intended_starters(&team.roster)
        .iter()
        .filter(|s| s.player.position.is_flex_eligible() || s.player.position == Position::Quarterback)
        .map(|s| s.player.effective_projection())
        .collect();
    match coefficient_of_variation(&points) {
        Some(cv) => (
            1.0 - cv / 0.6,
            format!("Starter projection spread (CV) of {cv:.2}"),
        ),
        None => (0.0, "Lineup too thin to judge balance".into()),
    }
}

fn timed_recovery(team: &Team, league: &League) -> (f64, String) {
    let returning: Vec<&str> = injured_starters(team)
        .into_iter()
        .filter(|p| {
            p.expected_return_week
                .is_some_and(|w| w >= league.current_week && w <= league.regular_season_weeks)
        })
        .map(|p| p.name.as_str())
        .collect();
    if returning.is_empty() {
        return (0.0, "No starters returning before the playoffs".into());
    }
    let strength = (0.5 + 0.25 * returning.len() as f64).min(1.0);
    (
        strength,
        format!("{} due back before the playoffs", returning.join(", ")),
    )
}

fn momentum_into_playoffs(team: &Team) -> (f64, String) {
    let last3 = team.recent_results(3);
    if last3.len() < 3 {
        return (0.0, "Too few games played".into());
    }
    let wins = last3.iter().filter(|r| **r == GameOutcome::Win).count();
    let mut strength = match wins {
        3 => 1.0,
        2 => 0.5,
        _ => 0.0,
    };
    let recent_avg = mean(&team.recent_scores(3));
    if let (Some(recent), Some(season)) = (recent_avg, team.points_per_game()) {
        if recent > season {
            strength += 0.2;
        }
    }
    (strength, format!("Won {wins} of the last 3"))
}

fn consistency_over_ceiling(team: &Team) -> (f64, String) {
    let scores = team.recent_scores(usize::MAX);
    if scores.len() < 4 {
        return (0.0, "Too few games played".into());
    }
    match coefficient_of_variation(&scores) {
        Some(cv) => {
            let strength = if cv <= 0.10 {
                1.0
            } else {
                ((0.25 - cv) / 0.15).max(0.0)
            };
            (strength, format!("Scoring variation (CV) of {cv:.2}"))
        }
        None => (0.0, "No scoring data".into()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
