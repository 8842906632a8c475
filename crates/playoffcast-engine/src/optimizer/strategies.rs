// Strategy generation.
//
// Each rule inspects one slice of the factor snapshot and proposes concrete
// actions. Expected impacts are in championship-probability points and are
// scaled by the headroom left above the current probability, so a team at
// 90% cannot be promised another 20%.

use serde::Serialize;

use playoffcast_core::model::ChampionshipProbability;

use crate::analysis::momentum::{MomentumTrend, TriggerKind};
use crate::analysis::{position_importance, Vulnerability};

use super::FactorSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyCategory {
    Roster,
    Health,
    Momentum,
    Schedule,
    MatchupExploitation,
    RiskPosture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Moderate,
    Hard,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizationStrategy {
    pub category: StrategyCategory,
    pub title: String,
    pub description: String,
    pub actions: Vec<String>,
    /// Expected gain in championship probability.
    pub expected_impact: f64,
    /// Confidence in the estimate, in [0, 1].
    pub confidence: f64,
    pub difficulty: Difficulty,
    pub priority: Priority,
    /// Weeks the strategy targets; empty means "now".
    pub weeks: Vec<u32>,
}

impl OptimizationStrategy {
    /// Ranking score: impact discounted by confidence.
    pub fn score(&self) -> f64 {
        self.expected_impact * self.confidence
    }
}

/// Build and rank every applicable strategy, best first.
pub fn generate(
    current: &ChampionshipProbability,
    factors: &FactorSnapshot,
) -> Vec<OptimizationStrategy> {
    let headroom = (1.0 - current.championship_probability).max(0.0);
    let mut out = Vec::new();
    roster_strategies(factors, &mut out);
    health_strategies(factors, &mut out);
    momentum_strategies(factors, &mut out);
    schedule_strategies(factors, &mut out);
    matchup_strategies(factors, &mut out);
    risk_strategies(current, &mut out);

    for s in &mut out {
        s.expected_impact = (s.expected_impact * headroom).max(0.0);
        s.confidence = s.confidence.clamp(0.0, 1.0);
    }
    out.sort_by(|a, b| {
        b.score()
            .partial_cmp(&a.score())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.priority.cmp(&a.priority))
            .then_with(|| a.title.cmp(&b.title))
    });
    out
}

fn roster_strategies(f: &FactorSnapshot, out: &mut Vec<OptimizationStrategy>) {
    for depth in &f.injury.depth {
        if depth.vulnerability < Vulnerability::High {
            continue;
        }
        let critical = depth.vulnerability == Vulnerability::Critical;
        out.push(OptimizationStrategy {
            category: StrategyCategory::Roster,
            title: format!("Add depth at {}", depth.position),
            description: format!(
                "Only {} healthy {} for {} starting spot(s)",
                depth.healthy, depth.position, depth.required_starters
            ),
            actions: vec![
                format!("Claim the best available {} off waivers", depth.position),
                "Drop the lowest-projected bench player to make room".into(),
            ],
            expected_impact: position_importance(depth.position)
                * if critical { 0.05 } else { 0.025 },
            confidence: 0.7,
            difficulty: Difficulty::Moderate,
            priority: if critical {
                Priority::Critical
            } else {
                Priority::High
            },
            weeks: Vec::new(),
        });
    }

    for injured in f.injury.injured_starters() {
        if !injured.status.is_inactive() || injured.dropoff_points < 5.0 {
            continue;
        }
        let long_term = injured
            .expected_return_week
            .map_or(true, |w| w > f.regular_season_weeks);
        if !long_term {
            continue;
        }
        out.push(OptimizationStrategy {
            category: StrategyCategory::Roster,
            title: format!("Trade for a {} to replace {}", injured.position, injured.name),
            description: format!(
                "{} is out past the regular season; the lineup loses {:.1} points a week",
                injured.name, injured.dropoff_points
            ),
            actions: vec![
                format!("Target a starting-calibre {}", injured.position),
                "Offer surplus depth from a deep position".into(),
            ],
            expected_impact: 0.004 * injured.dropoff_points.min(15.0),
            confidence: 0.55,
            difficulty: Difficulty::Hard,
            priority: Priority::High,
            weeks: Vec::new(),
        });
    }
}

fn health_strategies(f: &FactorSnapshot, out: &mut Vec<OptimizationStrategy>) {
    for injured in f.injury.injured_starters() {
        if injured.status.is_inactive() {
            if let Some(week) = injured.expected_return_week {
                if week <= f.regular_season_weeks {
                    out.push(OptimizationStrategy {
                        category: StrategyCategory::Health,
                        title: format!("Stash {} until week {}", injured.name, week),
                        description: format!(
                            "{} is expected back before the playoffs",
                            injured.name
                        ),
                        actions: vec![
                            format!("Keep {} rostered (use an IR slot if open)", injured.name),
                            format!("Plan the lineup around {}'s return in week {}", injured.name, week),
                        ],
                        expected_impact: 0.02,
                        confidence: 0.65,
                        difficulty: Difficulty::Easy,
                        priority: Priority::Medium,
                        weeks: vec![week],
                    });
                }
            }
        } else {
            out.push(OptimizationStrategy {
                category: StrategyCategory::Health,
                title: format!("Secure a fallback for {}", injured.name),
                description: format!(
                    "{} is {}; a late scratch would leave a hole",
                    injured.name,
                    injured.status.label()
                ),
                actions: vec![
                    format!("Roster a {} with a late kickoff as insurance", injured.position),
                    format!("Check {}'s status before lineup lock", injured.name),
                ],
                expected_impact: 0.015,
                confidence: 0.8,
                difficulty: Difficulty::Easy,
                priority: Priority::Medium,
                weeks: Vec::new(),
            });
        }
    }
}

fn momentum_strategies(f: &FactorSnapshot, out: &mut Vec<OptimizationStrategy>) {
    for trigger in &f.momentum.triggers {
        match trigger.kind {
            TriggerKind::HotPlayer => out.push(OptimizationStrategy {
                category: StrategyCategory::Momentum,
                title: "Ride the hot hand".into(),
                description: trigger.description.clone(),
                actions: vec!["Lock the player into the starting lineup".into()],
                expected_impact: 0.01,
                confidence: 0.6,
                difficulty: Difficulty::Easy,
                priority: Priority::Low,
                weeks: Vec::new(),
            }),
            TriggerKind::ColdPlayer => out.push(OptimizationStrategy {
                category: StrategyCategory::Momentum,
                title: "Bench or sell a cold starter".into(),
                description: trigger.description.clone(),
                actions: vec![
                    "Compare against the best bench option each week".into(),
                    "Shop the player while the projection still holds value".into(),
                ],
                expected_impact: 0.015,
                confidence: 0.5,
                difficulty: Difficulty::Moderate,
                priority: Priority::Medium,
                weeks: Vec::new(),
            }),
            _ => {}
        }
    }

    if matches!(
        f.momentum.trend,
        MomentumTrend::Falling | MomentumTrend::Collapsing
    ) {
        out.push(OptimizationStrategy {
            category: StrategyCategory::Momentum,
            title: "Stop the slide".into(),
            description: format!(
                "Momentum is {} ({:+.2})",
                f.momentum.trend.label(),
                f.momentum.score
            ),
            actions: vec![
                "Audit every lineup slot against recent production".into(),
                "Stream the kicker and defense by matchup".into(),
            ],
            expected_impact: 0.03,
            confidence: 0.5,
            difficulty: Difficulty::Moderate,
            priority: Priority::High,
            weeks: Vec::new(),
        });
    }
}

fn schedule_strategies(f: &FactorSnapshot, out: &mut Vec<OptimizationStrategy>) {
    if let Some(stretch) = &f.schedule.toughest_stretch {
        if stretch.average_difficulty >= 0.55 {
            out.push(OptimizationStrategy {
                category: StrategyCategory::Schedule,
                title: format!(
                    "Prepare for weeks {}-{}",
                    stretch.start_week, stretch.end_week
                ),
                description: format!(
                    "Toughest stretch ahead ({:.2}) against {}",
                    stretch.average_difficulty,
                    stretch.opponents.join(", ")
                ),
                actions: vec!["Make roster upgrades before the stretch begins".into()],
                expected_impact: 0.03 * stretch.average_difficulty,
                confidence: 0.6,
                difficulty: Difficulty::Moderate,
                priority: Priority::Medium,
                weeks: (stretch.start_week..=stretch.end_week).collect(),
            });
        }
    }
    if let Some(stretch) = &f.schedule.easiest_stretch {
        if stretch.average_difficulty <= 0.45 {
            out.push(OptimizationStrategy {
                category: StrategyCategory::Schedule,
                title: format!(
                    "Bank wins in weeks {}-{}",
                    stretch.start_week, stretch.end_week
                ),
                description: format!(
                    "Softest stretch ahead ({:.2})",
                    stretch.average_difficulty
                ),
                actions: vec!["Start high-floor players to avoid upsets".into()],
                expected_impact: 0.015,
                confidence: 0.7,
                difficulty: Difficulty::Easy,
                priority: Priority::Low,
                weeks: (stretch.start_week..=stretch.end_week).collect(),
            });
        }
    }
}

fn matchup_strategies(f: &FactorSnapshot, out: &mut Vec<OptimizationStrategy>) {
    for game in &f.outlook {
        let closeness = 1.0 - (game.win_probability - 0.5).abs() * 10.0;
        if closeness > 0.0 {
            out.push(OptimizationStrategy {
                category: StrategyCategory::MatchupExploitation,
                title: format!("Swing game: week {} vs {}", game.week, game.opponent_name),
                description: format!(
                    "Projected as a toss-up ({:.0}% to win)",
                    game.win_probability * 100.0
                ),
                actions: vec![
                    "Optimize every slot for this week's matchups".into(),
                    format!("Scout {}'s injury report before lock", game.opponent_name),
                ],
                expected_impact: 0.02 * closeness,
                confidence: 0.6,
                difficulty: Difficulty::Moderate,
                priority: Priority::Medium,
                weeks: vec![game.week],
            });
        }
        if game.weather_impact < -0.2 && game.weather_impact < game.opponent_weather_impact {
            out.push(OptimizationStrategy {
                category: StrategyCategory::MatchupExploitation,
                title: format!("Weather hedge for week {}", game.week),
                description: format!(
                    "Forecast hurts this roster more than {}'s ({:+.2} vs {:+.2})",
                    game.opponent_name, game.weather_impact, game.opponent_weather_impact
                ),
                actions: vec![
                    "Favour running backs and defense over passing-game players".into(),
                    "Consider a dome kicker".into(),
                ],
                expected_impact: 0.1 * (game.opponent_weather_impact - game.weather_impact),
                confidence: 0.55,
                difficulty: Difficulty::Easy,
                priority: Priority::Medium,
                weeks: vec![game.week],
            });
        }
    }
}

fn risk_strategies(current: &ChampionshipProbability, out: &mut Vec<OptimizationStrategy>) {
    if current.championship_probability < 0.15 && current.playoff_probability < 0.5 {
        out.push(OptimizationStrategy {
            category: StrategyCategory::RiskPosture,
            title: "Increase variance".into(),
            description: "Long odds reward boom-or-bust lineups".into(),
            actions: vec![
                "Start high-ceiling players over safe floors".into(),
                "Pursue lopsided trades for elite talent".into(),
            ],
            expected_impact: 0.03,
            confidence: 0.45,
            difficulty: Difficulty::Moderate,
            priority: Priority::Medium,
            weeks: Vec::new(),
        });
    } else if current.championship_probability >= 0.25 {
        out.push(OptimizationStrategy {
            category: StrategyCategory::RiskPosture,
            title: "Protect the floor".into(),
            description: "A favourite gains most by avoiding bad weeks".into(),
            actions: vec!["Prefer consistent starters over volatile upside".into()],
            expected_impact: 0.015,
            confidence: 0.7,
            difficulty: Difficulty::Easy,
            priority: Priority::Low,
            weeks: Vec::new(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;
    use playoffcast_core::history::NoHistory;
    use playoffcast_core::model::{InjuryStatus, League, Player, Position, Team};

    use crate::analysis::{
        HistoricalPatternAnalyzer, InjuryImpactAnalyzer, MomentumAnalyzer,
        ScheduleStrengthAnalyzer,
    };
    use crate::optimizer::WeeklyOutlook;

    fn team() -> Team {
        let mut team = Team::new("a", "Alpha", "East");
        team.roster = [
            ("qb1", Position::Quarterback, 21.0),
            ("qb2", Position::Quarterback, 12.0),
            ("rb1", Position::RunningBack, 16.0),
            ("rb2", Position::RunningBack, 12.0),
            ("rb3", Position::RunningBack, 8.0),
            ("wr1", Position::WideReceiver, 15.0),
            ("wr2", Position::WideReceiver, 12.0),
            ("wr3", Position::WideReceiver, 10.0),
            ("te1", Position::TightEnd, 9.0),
            ("k1", Position::Kicker, 8.0),
            ("def1", Position::Defense, 7.0),
        ]
        .into_iter()
        .map(|(id, pos, pts)| Player::new(format!("a-{id}"), format!("a {id}"), pos, pts))
        .collect();
        team
    }

    fn snapshot(team: &Team, outlook: Vec<WeeklyOutlook>) -> FactorSnapshot {
        let league = League {
            name: "Strategies".into(),
            current_week: 12,
            regular_season_weeks: 14,
            teams: vec![team.clone(), Team::new("b", "Beta", "East")],
        };
        FactorSnapshot {
            regular_season_weeks: league.regular_season_weeks,
            injury: InjuryImpactAnalyzer::new().analyze(team),
            momentum: MomentumAnalyzer::new().analyze(team, &league),
            schedule: ScheduleStrengthAnalyzer::new(6).analyze(team, &league),
            patterns: HistoricalPatternAnalyzer::new(Arc::new(NoHistory)).analyze(team, &league),
            outlook,
        }
    }

    fn current(championship: f64, playoff: f64) -> ChampionshipProbability {
        ChampionshipProbability {
            team_id: "a".into(),
            playoff_probability: playoff,
            division_probability: playoff / 2.0,
            championship_probability: championship,
            expected_seed: 4.0,
            schedule_strength: 0.5,
            momentum_score: 0.0,
            key_factors: Vec::new(),
            optimal_path: None,
            sample_trials: Vec::new(),
            trials: 1_000,
            computed_at: Utc::now(),
        }
    }

    fn toss_up(week: u32) -> WeeklyOutlook {
        WeeklyOutlook {
            week,
            opponent_id: "b".into(),
            opponent_name: "Beta".into(),
            is_home: false,
            win_probability: 0.5,
            difficulty: 0.5,
            weather_impact: 0.0,
            opponent_weather_impact: 0.0,
        }
    }

    #[test]
    fn returning_starter_is_stashed_for_his_week() {
        let mut team = team();
        let rb = team.player_mut("a-rb1").unwrap();
        rb.injury_status = InjuryStatus::Out;
        rb.expected_return_week = Some(13);

        let ranked = generate(&current(0.2, 0.6), &snapshot(&team, Vec::new()));
        let stash = ranked
            .iter()
            .find(|s| s.category == StrategyCategory::Health)
            .expect("health strategy");
        assert_eq!(stash.title, "Stash a rb1 until week 13");
        assert_eq!(stash.weeks, vec![13]);
    }

    #[test]
    fn toss_up_games_are_flagged_and_ranked() {
        let team = team();
        let ranked = generate(&current(0.2, 0.6), &snapshot(&team, vec![toss_up(13)]));
        assert!(ranked
            .iter()
            .any(|s| s.category == StrategyCategory::MatchupExploitation && s.weeks == vec![13]));
        assert!(ranked.windows(2).all(|w| w[0].score() >= w[1].score()));
    }

    #[test]
    fn certain_champion_gains_nothing() {
        let team = team();
        let ranked = generate(&current(1.0, 1.0), &snapshot(&team, vec![toss_up(13)]));
        assert!(!ranked.is_empty());
        assert!(ranked.iter().all(|s| s.expected_impact == 0.0));
    }

    #[test]
    fn risk_posture_follows_the_odds() {
        let team = team();
        let long_shot = generate(&current(0.05, 0.3), &snapshot(&team, Vec::new()));
        assert!(long_shot.iter().any(|s| s.title == "Increase variance"));

        let favourite = generate(&current(0.4, 0.95), &snapshot(&team, Vec::new()));
        assert!(favourite.iter().any(|s| s.title == "Protect the floor"));
        assert!(!favourite.iter().any(|s| s.title == "Increase variance"));
    }
}
