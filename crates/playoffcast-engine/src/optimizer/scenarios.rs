// Best, likely, and worst case projections over the remaining schedule.

use serde::Serialize;

use playoffcast_core::model::{ChampionshipProbability, Record, Team};

use crate::analysis::{TriggerKind, Vulnerability};

use super::{FactorSnapshot, WeeklyOutlook};

/// Win-probability cut-offs: a game counts as won in the scenario when the
/// team's chance is at least this high.
const BEST_CASE_CUTOFF: f64 = 0.35;
const LIKELY_CASE_CUTOFF: f64 = 0.5;
const WORST_CASE_CUTOFF: f64 = 0.7;

/// Shift in playoff probability per win above or below expectation.
const PLAYOFF_PER_WIN: f64 = 0.08;
const CHAMPIONSHIP_PER_WIN: f64 = 0.03;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    BestCase,
    LikelyCase,
    WorstCase,
}

impl ScenarioKind {
    pub fn label(&self) -> &'static str {
        match self {
            ScenarioKind::BestCase => "Best case",
            ScenarioKind::LikelyCase => "Likely case",
            ScenarioKind::WorstCase => "Worst case",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioEvent {
    pub week: u32,
    pub description: String,
    pub impact: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Scenario {
    pub kind: ScenarioKind,
    pub label: String,
    pub projected_record: Record,
    pub playoff_probability: f64,
    pub championship_probability: f64,
    /// Chance the remaining win total lands in this scenario's band.
    pub likelihood: f64,
    pub events: Vec<ScenarioEvent>,
}

/// Probability of each exact win total, index = wins.
pub fn win_distribution(outlook: &[WeeklyOutlook]) -> Vec<f64> {
    let mut dist = vec![1.0];
    for game in outlook {
        let p = game.win_probability.clamp(0.0, 1.0);
        let mut next = vec![0.0; dist.len() + 1];
        for (wins, prob) in dist.iter().enumerate() {
            next[wins] += prob * (1.0 - p);
            next[wins + 1] += prob * p;
        }
        dist = next;
    }
    dist
}

pub fn build(
    team: &Team,
    current: &ChampionshipProbability,
    factors: &FactorSnapshot,
    optimized: f64,
) -> Vec<Scenario> {
    let outlook = &factors.outlook;
    let dist = win_distribution(outlook);
    let expected: f64 = outlook.iter().map(|g| g.win_probability).sum();
    let likely_wins = wins_at(outlook, LIKELY_CASE_CUTOFF);
    let above: f64 = dist.iter().skip(likely_wins + 1).sum();
    let at = dist.get(likely_wins).copied().unwrap_or(0.0);
    let below: f64 = dist.iter().take(likely_wins).sum();
    let gain = (optimized - current.championship_probability).max(0.0);
    let injury_drag = factors.injury.impact.abs() * 0.05;

    [
        (ScenarioKind::BestCase, BEST_CASE_CUTOFF, above, gain),
        (ScenarioKind::LikelyCase, LIKELY_CASE_CUTOFF, at, gain * 0.5),
        (ScenarioKind::WorstCase, WORST_CASE_CUTOFF, below, -injury_drag),
    ]
    .into_iter()
    .map(|(kind, cutoff, likelihood, adjustment)| {
        let wins = wins_at(outlook, cutoff);
        let surplus = wins as f64 - expected;
        let playoff = (current.playoff_probability + surplus * PLAYOFF_PER_WIN).clamp(0.0, 1.0);
        let championship = (current.championship_probability
            + surplus * CHAMPIONSHIP_PER_WIN
            + adjustment)
            .clamp(0.0, playoff);

        let mut record = team.record;
        record.wins += wins as u32;
        record.losses += (outlook.len() - wins) as u32;

        Scenario {
            kind,
            label: kind.label().to_string(),
            projected_record: record,
            playoff_probability: playoff,
            championship_probability: championship,
            likelihood: likelihood.clamp(0.0, 1.0),
            events: events(kind, cutoff, factors),
        }
    })
    .collect()
}

fn wins_at(outlook: &[WeeklyOutlook], cutoff: f64) -> usize {
    outlook
        .iter()
        .filter(|g| g.win_probability >= cutoff)
        .count()
}

fn events(kind: ScenarioKind, cutoff: f64, factors: &FactorSnapshot) -> Vec<ScenarioEvent> {
    let mut events: Vec<ScenarioEvent> = factors
        .outlook
        .iter()
        .map(|g| {
            let won = g.win_probability >= cutoff;
            ScenarioEvent {
                week: g.week,
                description: format!(
                    "{} vs {} ({:.0}% to win)",
                    if won { "Win" } else { "Loss" },
                    g.opponent_name,
                    g.win_probability * 100.0
                ),
                impact: if won {
                    CHAMPIONSHIP_PER_WIN * (1.0 - g.win_probability)
                } else {
                    -CHAMPIONSHIP_PER_WIN * g.win_probability
                },
            }
        })
        .collect();

    match kind {
        ScenarioKind::BestCase => {
            for t in &factors.momentum.triggers {
                if let (TriggerKind::StarReturn, Some(week)) = (t.kind, t.week) {
                    events.push(ScenarioEvent {
                        week,
                        description: t.description.clone(),
                        impact: t.effect * 0.1,
                    });
                }
            }
        }
        ScenarioKind::WorstCase => {
            if let Some(depth) = factors.injury.most_vulnerable() {
                if depth.vulnerability >= Vulnerability::High {
                    let week = factors.outlook.first().map(|g| g.week).unwrap_or(0);
                    events.push(ScenarioEvent {
                        week,
                        description: format!(
                            "Another {} injury with no healthy replacement",
                            depth.position
                        ),
                        impact: -0.02,
                    });
                }
            }
        }
        ScenarioKind::LikelyCase => {}
    }

    events.sort_by_key(|e| e.week);
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(week: u32, p: f64) -> WeeklyOutlook {
        WeeklyOutlook {
            week,
            opponent_id: format!("o{week}"),
            opponent_name: format!("Opp {week}"),
            is_home: true,
            win_probability: p,
            difficulty: 0.5,
            weather_impact: 0.0,
            opponent_weather_impact: 0.0,
        }
    }

    #[test]
    fn distribution_sums_to_one() {
        let dist = win_distribution(&[game(1, 0.5), game(2, 0.5)]);
        assert_eq!(dist.len(), 3);
        assert!((dist[0] - 0.25).abs() < 1e-12);
        assert!((dist[1] - 0.5).abs() < 1e-12);
        assert!((dist.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn no_games_is_certain() {
        assert_eq!(win_distribution(&[]), vec![1.0]);
    }

    #[test]
    fn cutoffs_order_win_totals() {
        let outlook = [game(1, 0.8), game(2, 0.6), game(3, 0.4), game(4, 0.2)];
        assert_eq!(wins_at(&outlook, BEST_CASE_CUTOFF), 3);
        assert_eq!(wins_at(&outlook, LIKELY_CASE_CUTOFF), 2);
        assert_eq!(wins_at(&outlook, WORST_CASE_CUTOFF), 1);
    }
}
