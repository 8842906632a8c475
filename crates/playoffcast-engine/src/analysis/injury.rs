// Injury impact analysis.
//
// Each injured player contributes severity x position importance x
// starter multiplier x replacement drop-off x positional scarcity. The
// contributions compound: team impact is -(1 - e^-sum), which stays in
// [-1, 0] and saturates rather than adding linearly.

use serde::Serialize;

use playoffcast_core::model::roster::{intended_starters, required_starters};
use playoffcast_core::model::{InjuryStatus, Player, Position, Team};

use super::position_importance;

/// Bench injuries still matter a little: depth is thinner.
const BENCH_MULTIPLIER: f64 = 0.2;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Vulnerability {
    Low,
    Moderate,
    High,
    Critical,
}

impl Vulnerability {
    pub fn label(&self) -> &'static str {
        match self {
            Vulnerability::Low => "low",
            Vulnerability::Moderate => "moderate",
            Vulnerability::High => "high",
            Vulnerability::Critical => "critical",
        }
    }
}

/// Healthy depth at one position relative to the starting requirement.
#[derive(Debug, Clone, Serialize)]
pub struct PositionDepth {
    pub position: Position,
    pub required_starters: usize,
    pub healthy: usize,
    pub injured: usize,
    /// Healthy players over (required + 1), capped at 1.
    pub depth_score: f64,
    pub vulnerability: Vulnerability,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerInjuryImpact {
    pub player_id: String,
    pub name: String,
    pub position: Position,
    pub status: InjuryStatus,
    pub is_starter: bool,
    pub replacement_id: Option<String>,
    /// Projected points lost by swapping in the replacement.
    pub dropoff_points: f64,
    /// Unbounded contribution before team-level compounding.
    pub impact: f64,
    pub expected_return_week: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InjuryReport {
    pub team_id: String,
    /// Team-level impact in [-1, 0].
    pub impact: f64,
    pub injured_players: Vec<PlayerInjuryImpact>,
    pub depth: Vec<PositionDepth>,
    pub details: Vec<String>,
}

impl InjuryReport {
    /// Worst depth entry, preferring more important positions on ties.
    pub fn most_vulnerable(&self) -> Option<&PositionDepth> {
        self.depth.iter().max_by(|a, b| {
            a.vulnerability.cmp(&b.vulnerability).then_with(|| {
                position_importance(a.position)
                    .partial_cmp(&position_importance(b.position))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
        })
    }

    pub fn injured_starters(&self) -> impl Iterator<Item = &PlayerInjuryImpact> {
        self.injured_players.iter().filter(|p| p.is_starter)
    }
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct InjuryImpactAnalyzer;

impl InjuryImpactAnalyzer {
    pub fn new() -> Self {
        InjuryImpactAnalyzer
    }

    pub fn analyze(&self, team: &Team) -> InjuryReport {
        let starters = intended_starters(&team.roster);
        let starter_ids: Vec<&str> = starters.iter().map(|s| s.player.id.as_str()).collect();

        let mut injured_players = Vec::new();
        let mut total = 0.0;
        let mut details = Vec::new();

        for player in team.roster.iter().filter(|p| p.injury_status.is_injured()) {
            let is_starter = starter_ids.contains(&player.id.as_str());
            let replacement = best_replacement(team, player, &starter_ids);
            let dropoff_points = match replacement {
                Some(r) => (player.projected_points - r.projected_points).max(0.0),
                None => player.projected_points.max(0.0),
            };
            let dropoff_ratio = if player.projected_points > 0.0 {
                (dropoff_points / player.projected_points).clamp(0.0, 1.0)
            } else {
                0.0
            };

            let impact = player.injury_status.severity()
                * position_importance(player.position)
                * if is_starter { 1.0 } else { BENCH_MULTIPLIER }
                * (0.4 + 0.6 * dropoff_ratio)
                * (0.7 + 0.3 * scarcity(team, player.position));
            total += impact;

            if is_starter {
                details.push(match replacement {
                    Some(r) => format!(
                        "{} ({}) is {}; {} fills in at {:.1} fewer projected points",
                        player.name,
                        player.position,
                        player.injury_status.label(),
                        r.name,
                        dropoff_points
                    ),
                    None => format!(
                        "{} ({}) is {} with no healthy backup",
                        player.name,
                        player.position,
                        player.injury_status.label()
                    ),
                });
            }

            injured_players.push(PlayerInjuryImpact {
                player_id: player.id.clone(),
                name: player.name.clone(),
                position: player.position,
                status: player.injury_status,
                is_starter,
                replacement_id: replacement.map(|r| r.id.clone()),
                dropoff_points,
                impact,
                expected_return_week: player.expected_return_week,
            });
        }

        let depth = self.depth_map(team);
        for d in depth.iter().filter(|d| d.vulnerability >= Vulnerability::High) {
            details.push(format!(
                "{} depth is {} ({} healthy for {} starting spots)",
                d.position,
                d.vulnerability.label(),
                d.healthy,
                d.required_starters
            ));
        }

        InjuryReport {
            team_id: team.id.clone(),
            impact: -(1.0 - (-total).exp()),
            injured_players,
            depth,
            details,
        }
    }

    /// Depth and vulnerability at every position.
    pub fn depth_map(&self, team: &Team) -> Vec<PositionDepth> {
        Position::ALL
            .iter()
            .map(|&position| {
                let at_position = team.roster.iter().filter(|p| p.position == position);
                let healthy = at_position.clone().filter(|p| p.is_available()).count();
                let injured = at_position.filter(|p| p.injury_status.is_injured()).count();
                let required = required_starters(position);
                PositionDepth {
                    position,
                    required_starters: required,
                    healthy,
                    injured,
                    depth_score: (healthy as f64 / (required as f64 + 1.0)).min(1.0),
                    vulnerability: vulnerability(position, healthy, required),
                }
            })
            .collect()
    }
}

/// Best healthy same-position teammate not already in the lineup.
fn best_replacement<'a>(team: &'a Team, injured: &Player, starter_ids: &[&str]) -> Option<&'a Player> {
    team.roster
        .iter()
        .filter(|p| {
            p.id != injured.id
                && p.position == injured.position
                && p.injury_status == InjuryStatus::Healthy
                && !starter_ids.contains(&p.id.as_str())
        })
        .max_by(|a, b| {
            a.projected_points
                .partial_cmp(&b.projected_points)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

/// 1.0 when every healthy player at the position is needed to start,
/// shrinking as surplus depth grows.
fn scarcity(team: &Team, position: Position) -> f64 {
    let healthy = team
        .roster
        .iter()
        .filter(|p| p.position == position && p.injury_status == InjuryStatus::Healthy)
        .count();
    let surplus = healthy.saturating_sub(required_starters(position));
    1.0 / (1.0 + surplus as f64)
}

fn vulnerability(position: Position, healthy: usize, required: usize) -> Vulnerability {
    let important = position_importance(position) >= 0.6;
    if healthy < required {
        Vulnerability::Critical
    } else if healthy == required {
        if important {
            Vulnerability::High
        } else {
            Vulnerability::Low
        }
    } else if healthy == required + 1 && important {
        Vulnerability::Moderate
    } else {
        Vulnerability::Low
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
