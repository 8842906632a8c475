// Momentum analysis.
//
// Six sub-signals, each in [-1, 1], are combined into a single score:
//
//   record trend      0.25   recent results and the current streak
//   scoring trend     0.20   regression slope of recent points
//   player trend      0.20   starters' recent form against projection
//   consistency       0.10   low week-to-week scoring variance
//   injury trend      0.10   starters returning versus starters lost
//   schedule ease     0.15   strength of the next three opponents
//
// The score decays by 0.85 per week when projected forward, and discrete
// triggers (a star returning, a hot streak) are surfaced separately.

use serde::Serialize;

use playoffcast_core::model::roster::{active_starters, intended_starters};
use playoffcast_core::model::{GameOutcome, League, Team};

use super::{coefficient_of_variation, mean, position_importance, regression_slope, team_rating};

const RECENT_GAMES: usize = 4;
const SCORING_WINDOW: usize = 5;
const PROJECTION_WEEKS: u32 = 4;
const DECAY: f64 = 0.85;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentumTrend {
    Surging,
    Rising,
    Steady,
    Falling,
    Collapsing,
}

impl MomentumTrend {
    pub fn from_score(score: f64) -> Self {
        if score > 0.5 {
            MomentumTrend::Surging
        } else if score > 0.15 {
            MomentumTrend::Rising
        } else if score >= -0.15 {
            MomentumTrend::Steady
        } else if score >= -0.5 {
            MomentumTrend::Falling
        } else {
            MomentumTrend::Collapsing
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MomentumTrend::Surging => "surging",
            MomentumTrend::Rising => "rising",
            MomentumTrend::Steady => "steady",
            MomentumTrend::Falling => "falling",
            MomentumTrend::Collapsing => "collapsing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MomentumComponents {
    pub record_trend: f64,
    pub scoring_trend: f64,
    pub player_trend: f64,
    pub consistency: f64,
    pub injury_trend: f64,
    pub schedule_ease: f64,
}

/// Weights applied to [`MomentumComponents`]; they sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentumWeights {
    pub record_trend: f64,
    pub scoring_trend: f64,
    pub player_trend: f64,
    pub consistency: f64,
    pub injury_trend: f64,
    pub schedule_ease: f64,
}

impl Default for MomentumWeights {
    fn default() -> Self {
        MomentumWeights {
            record_trend: 0.25,
            scoring_trend: 0.20,
            player_trend: 0.20,
            consistency: 0.10,
            injury_trend: 0.10,
            schedule_ease: 0.15,
        }
    }
}

impl MomentumWeights {
    fn apply(&self, c: &MomentumComponents) -> f64 {
        self.record_trend * c.record_trend
            + self.scoring_trend * c.scoring_trend
            + self.player_trend * c.player_trend
            + self.consistency * c.consistency
            + self.injury_trend * c.injury_trend
            + self.schedule_ease * c.schedule_ease
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    StarReturn,
    HotStreak,
    ColdStreak,
    HotPlayer,
    ColdPlayer,
    EasyStretch,
    ToughStretch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MomentumTrigger {
    pub kind: TriggerKind,
    /// Week the trigger takes effect; `None` for ongoing conditions.
    pub week: Option<u32>,
    pub player_id: Option<String>,
    pub description: String,
    pub effect: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeeklyMomentum {
    pub week: u32,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MomentumReport {
    pub team_id: String,
    /// Combined score in [-1, 1].
    pub score: f64,
    pub trend: MomentumTrend,
    pub components: MomentumComponents,
    pub projection: Vec<WeeklyMomentum>,
    pub triggers: Vec<MomentumTrigger>,
    pub details: Vec<String>,
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MomentumAnalyzer {
    weights: MomentumWeights,
}

impl MomentumAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: MomentumWeights) -> Self {
        MomentumAnalyzer { weights }
    }

    pub fn analyze(&self, team: &Team, league: &League) -> MomentumReport {
        let components = MomentumComponents {
            record_trend: record_trend(team),
            scoring_trend: scoring_trend(team),
            player_trend: player_trend(team),
            consistency: consistency(team),
            injury_trend: injury_trend(team, league.current_week),
            schedule_ease: schedule_ease(team, league),
        };
        let score = self.weights.apply(&components).clamp(-1.0, 1.0);
        let trend = MomentumTrend::from_score(score);
        let triggers = triggers(team, league.current_week, &components);
        let projection = project(score, league.current_week, &triggers);

        let mut details = vec![format!(
            "Momentum is {} ({:+.2})",
            trend.label(),
            score
        )];
        details.extend(triggers.iter().map(|t| t.description.clone()));

        MomentumReport {
            team_id: team.id.clone(),
            score,
            trend,
            components,
            projection,
            triggers,
            details,
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

fn record_trend(team: &Team) -> f64 {
    let recent = team.recent_results(RECENT_GAMES);
    if recent.is_empty() {
        return 0.0;
    }
    let points: f64 = recent
        .iter()
        .map(|r| match r {
            GameOutcome::Win => 1.0,
            GameOutcome::Tie => 0.5,
            GameOutcome::Loss => 0.0,
        })
        .sum();
    let recent_pct = points / recent.len() as f64;
    let streak = (team.current_streak() as f64 / 4.0).clamp(-1.0, 1.0);
    (0.6 * (2.0 * recent_pct - 1.0) + 0.4 * streak).clamp(-1.0, 1.0)
}

fn scoring_trend(team: &Team) -> f64 {
    let scores = team.recent_scores(SCORING_WINDOW);
    match (regression_slope(&scores), mean(&scores)) {
        (Some(slope), Some(avg)) if avg > 0.0 => (slope / (0.05 * avg)).tanh(),
        _ => 0.0,
    }
}

/// Importance-weighted recent form of active starters against projection.
fn player_trend(team: &Team) -> f64 {
    let mut weighted = 0.0;
    let mut weight = 0.0;
    for starter in active_starters(&team.roster) {
        let p = starter.player;
        if p.recent_performances.len() < 2 || p.projected_points <= 0.0 {
            continue;
        }
        let Some(avg) = p.recent_average() else {
            continue;
        };
        let w = position_importance(p.position);
        weighted += w * ((avg - p.projected_points) / (0.3 * p.projected_points)).tanh();
        weight += w;
    }
    if weight > 0.0 {
        weighted / weight
    } else {
        0.0
    }
}

fn consistency(team: &Team) -> f64 {
    coefficient_of_variation(&team.recent_scores(SCORING_WINDOW))
        .map(|cv| (1.0 - cv / 0.15).clamp(-1.0, 1.0))
        .unwrap_or(0.0)
}

/// Starters due back soon count for the team, starters with no return date
/// count against it.
fn injury_trend(team: &Team, current_week: u32) -> f64 {
    let mut balance = 0.0;
    for starter in intended_starters(&team.roster) {
        let p = starter.player;
        if !p.injury_status.is_injured() {
            continue;
        }
        let w = position_importance(p.position) * p.injury_status.severity();
        match p.expected_return_week {
            Some(week) if week <= current_week + 3 => balance += w,
            _ => balance -= w,
        }
    }
    (balance * 0.5).clamp(-1.0, 1.0)
}

/// Positive when the next three opponents are weaker than average.
fn schedule_ease(team: &Team, league: &League) -> f64 {
    let ratings: Vec<f64> = team
        .remaining_schedule()
        .take(3)
        .filter_map(|m| league.team(&m.opponent_id))
        .map(|opp| team_rating(opp, league))
        .collect();
    mean(&ratings)
        .map(|avg| ((0.5 - avg) * 2.0).clamp(-1.0, 1.0))
        .unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Triggers and projection
// ---------------------------------------------------------------------------

fn triggers(team: &Team, current_week: u32, components: &MomentumComponents) -> Vec<MomentumTrigger> {
    let mut out = Vec::new();
    let starters = intended_starters(&team.roster);
    let avg_starter = mean(
        &starters
            .iter()
            .map(|s| s.player.projected_points)
            .collect::<Vec<_>>(),
    )
    .unwrap_or(0.0);

    for starter in &starters {
        let p = starter.player;
        if let (true, Some(week)) = (p.injury_status.is_injured(), p.expected_return_week) {
            if week >= current_week && week <= current_week + 3 {
                let relative = if avg_starter > 0.0 {
                    p.projected_points / avg_starter
                } else {
                    1.0
                };
                out.push(MomentumTrigger {
                    kind: TriggerKind::StarReturn,
                    week: Some(week),
                    player_id: Some(p.id.clone()),
                    description: format!("{} expected back in week {}", p.name, week),
                    effect: (0.1 * position_importance(p.position) * relative).clamp(0.03, 0.2),
                });
            }
        }

        if p.recent_performances.len() >= 3 && p.projected_points > 0.0 {
            if let Some(avg) = p.recent_average() {
                if avg >= 1.25 * p.projected_points {
                    out.push(MomentumTrigger {
                        kind: TriggerKind::HotPlayer,
                        week: None,
                        player_id: Some(p.id.clone()),
                        description: format!(
                            "{} averaging {:.1} against a {:.1} projection",
                            p.name, avg, p.projected_points
                        ),
                        effect: 0.02,
                    });
                } else if avg <= 0.75 * p.projected_points {
                    out.push(MomentumTrigger {
                        kind: TriggerKind::ColdPlayer,
                        week: None,
                        player_id: Some(p.id.clone()),
                        description: format!(
                            "{} averaging {:.1} against a {:.1} projection",
                            p.name, avg, p.projected_points
                        ),
                        effect: -0.02,
                    });
                }
            }
        }
    }

    let streak = team.current_streak();
    if streak >= 3 {
        out.push(MomentumTrigger {
            kind: TriggerKind::HotStreak,
            week: None,
            player_id: None,
            description: format!("{streak}-game winning streak"),
            effect: 0.05,
        });
    } else if streak <= -3 {
        out.push(MomentumTrigger {
            kind: TriggerKind::ColdStreak,
            week: None,
            player_id: None,
            description: format!("{}-game losing streak", -streak),
            effect: -0.05,
        });
    }

    if components.schedule_ease >= 0.3 {
        out.push(MomentumTrigger {
            kind: TriggerKind::EasyStretch,
            week: Some(current_week),
            player_id: None,
            description: "Soft schedule over the next three weeks".into(),
            effect: 0.03,
        });
    } else if components.schedule_ease <= -0.3 {
        out.push(MomentumTrigger {
            kind: TriggerKind::ToughStretch,
            week: Some(current_week),
            player_id: None,
            description: "Difficult schedule over the next three weeks".into(),
            effect: -0.03,
        });
    }

    out
}

/// Decay the current score forward, adding star returns from their week on.
fn project(score: f64, current_week: u32, triggers: &[MomentumTrigger]) -> Vec<WeeklyMomentum> {
    (0..PROJECTION_WEEKS)
        .map(|k| {
            let week = current_week + k;
            let returns: f64 = triggers
                .iter()
                .filter(|t| t.kind == TriggerKind::StarReturn)
                .filter(|t| t.week.is_some_and(|w| w <= week))
                .map(|t| t.effect)
                .sum();
            WeeklyMomentum {
                week,
                score: (score * DECAY.powi(k as i32 + 1) + returns).clamp(-1.0, 1.0),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
