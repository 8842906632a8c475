// Schedule strength analysis.
//
// Opponent difficulty starts from the opponent's team rating and is adjusted
// for venue, division rivalry, and rest. The report covers completed games,
// the remaining schedule, the likely playoff field, and the hardest and
// easiest three-week stretches ahead.

use serde::Serialize;

use playoffcast_core::model::{League, Matchup, Team};

use super::{mean, team_rating};

const HOME_ADJUSTMENT: f64 = 0.04;
const DIVISION_ADJUSTMENT: f64 = 0.04;
const REST_ADJUSTMENT: f64 = 0.03;
const STRETCH_WEEKS: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct MatchupDifficulty {
    pub week: u32,
    pub opponent_id: String,
    pub opponent_name: String,
    /// Opponent rating in [0, 1] before adjustments.
    pub opponent_strength: f64,
    pub is_home: bool,
    pub division_rival: bool,
    /// Days since the previous kickoff, when both kickoffs are known.
    pub rest_days: Option<i64>,
    /// Adjusted difficulty in [0, 1].
    pub difficulty: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleStretch {
    pub start_week: u32,
    pub end_week: u32,
    pub average_difficulty: f64,
    pub opponents: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleReport {
    pub team_id: String,
    /// Mean opponent rating across completed games (0.5 if none).
    pub past_strength: f64,
    /// Mean adjusted difficulty of remaining games (0.5 if none).
    pub remaining_strength: f64,
    /// Mean rating of the other teams currently in playoff position.
    pub playoff_strength: f64,
    pub matchups: Vec<MatchupDifficulty>,
    pub toughest_stretch: Option<ScheduleStretch>,
    pub easiest_stretch: Option<ScheduleStretch>,
    pub details: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ScheduleStrengthAnalyzer {
    playoff_field_size: usize,
}

impl Default for ScheduleStrengthAnalyzer {
    fn default() -> Self {
        Self::new(6)
    }
}

impl ScheduleStrengthAnalyzer {
    pub fn new(playoff_field_size: usize) -> Self {
        ScheduleStrengthAnalyzer { playoff_field_size }
    }

    pub fn analyze(&self, team: &Team, league: &League) -> ScheduleReport {
        let past: Vec<f64> = team
            .completed_matchups()
            .iter()
            .filter_map(|m| league.team(&m.opponent_id))
            .map(|opp| team_rating(opp, league))
            .collect();
        let past_strength = mean(&past).unwrap_or(0.5);

        let mut remaining: Vec<&Matchup> = team.remaining_schedule().collect();
        remaining.sort_by_key(|m| m.week);
        let mut matchups = Vec::with_capacity(remaining.len());
        let mut previous_kickoff = team
            .completed_matchups()
            .last()
            .and_then(|m| m.kickoff);
        for m in remaining {
            if let Some(d) = self.matchup_difficulty(team, m, previous_kickoff, league) {
                matchups.push(d);
            }
            previous_kickoff = m.kickoff;
        }
        let remaining_strength =
            mean(&matchups.iter().map(|m| m.difficulty).collect::<Vec<_>>()).unwrap_or(0.5);

        let field: Vec<f64> = league
            .standings()
            .into_iter()
            .take(self.playoff_field_size)
            .filter(|t| t.id != team.id)
            .map(|t| team_rating(t, league))
            .collect();
        let playoff_strength = mean(&field).unwrap_or(0.5);

        let stretches = stretches(&matchups);
        let toughest_stretch = stretches
            .iter()
            .max_by(|a, b| cmp_f64(a.average_difficulty, b.average_difficulty))
            .cloned();
        let easiest_stretch = stretches
            .iter()
            .min_by(|a, b| cmp_f64(a.average_difficulty, b.average_difficulty))
            .cloned();

        let mut details = vec![format!(
            "Remaining schedule difficulty {:.2} (past {:.2})",
            remaining_strength, past_strength
        )];
        if let Some(s) = &toughest_stretch {
            details.push(format!(
                "Toughest stretch: weeks {}-{} ({:.2})",
                s.start_week, s.end_week, s.average_difficulty
            ));
        }
        if let Some(hardest) = matchups
            .iter()
            .max_by(|a, b| cmp_f64(a.difficulty, b.difficulty))
        {
            details.push(format!(
                "Hardest game: week {} vs {}",
                hardest.week, hardest.opponent_name
            ));
        }

        ScheduleReport {
            team_id: team.id.clone(),
            past_strength,
            remaining_strength,
            playoff_strength,
            matchups,
            toughest_stretch,
            easiest_stretch,
            details,
        }
    }

    /// Difficulty of one game. `None` if the opponent is not in the league.
    pub fn matchup_difficulty(
        &self,
        team: &Team,
        matchup: &Matchup,
        previous_kickoff: Option<chrono::DateTime<chrono::Utc>>,
        league: &League,
    ) -> Option<MatchupDifficulty> {
        let opponent = league.team(&matchup.opponent_id)?;
        let opponent_strength = team_rating(opponent, league);
        let division_rival = opponent.division == team.division;
        let rest_days = match (previous_kickoff, matchup.kickoff) {
            (Some(prev), Some(next)) => Some((next - prev).num_days()),
            _ => None,
        };

        let mut difficulty = opponent_strength;
        difficulty += if matchup.is_home {
            -HOME_ADJUSTMENT
        } else {
            HOME_ADJUSTMENT
        };
        if division_rival {
            difficulty += DIVISION_ADJUSTMENT;
        }
        match rest_days {
            Some(days) if days < 6 => difficulty += REST_ADJUSTMENT,
            Some(days) if days > 8 => difficulty -= REST_ADJUSTMENT,
            _ => {}
        }

        Some(MatchupDifficulty {
            week: matchup.week,
            opponent_id: opponent.id.clone(),
            opponent_name: opponent.name.clone(),
            opponent_strength,
            is_home: matchup.is_home,
            division_rival,
            rest_days,
            difficulty: difficulty.clamp(0.0, 1.0),
        })
    }
}

/// Every consecutive window of up to three games.
fn stretches(matchups: &[MatchupDifficulty]) -> Vec<ScheduleStretch> {
    if matchups.is_empty() {
        return Vec::new();
    }
    let size = STRETCH_WEEKS.min(matchups.len());
    matchups
        .windows(size)
        .map(|w| ScheduleStretch {
            start_week: w[0].week,
            end_week: w[w.len() - 1].week,
            average_difficulty: w.iter().map(|m| m.difficulty).sum::<f64>() / w.len() as f64,
            opponents: w.iter().map(|m| m.opponent_name.clone()).collect(),
        })
        .collect()
}

fn cmp_f64(a: f64, b: f64) -> std::cmp::Ordering {
    a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{league, record_team};
    use chrono::{TimeZone, Utc};

    fn fixture() -> League {
        let mut me = record_team("me", 5, 5, 1000.0);
        let strong = record_team("strong", 9, 1, 1300.0);
        let mut weak = record_team("weak", 1, 9, 800.0);
        weak.division = "West".into();
        let mid = record_team("mid", 5, 5, 1000.0);
        me.schedule = vec![
            Matchup::new(11, "strong", false),
            Matchup::new(12, "weak", true),
            Matchup::new(13, "mid", true),
            Matchup::new(14, "weak", false),
        ];
        league(vec![me, strong, weak, mid], 11)
    }

    #[test]
    fn difficulty_tracks_opponent_strength() {
        let lg = fixture();
        let report = ScheduleStrengthAnalyzer::default().analyze(lg.team("me").unwrap(), &lg);
        assert_eq!(report.matchups.len(), 4);
        let strong = &report.matchups[0];
        let weak = &report.matchups[1];
        assert!(strong.difficulty > weak.difficulty);
        assert!(strong.division_rival);
        assert!(!weak.division_rival);
        assert!(report.remaining_strength > 0.0 && report.remaining_strength < 1.0);
    }

    #[test]
    fn stretches_find_hardest_window() {
        let lg = fixture();
        let report = ScheduleStrengthAnalyzer::default().analyze(lg.team("me").unwrap(), &lg);
        let toughest = report.toughest_stretch.unwrap();
        let easiest = report.easiest_stretch.unwrap();
        assert_eq!((toughest.start_week, toughest.end_week), (11, 13));
        assert_eq!((easiest.start_week, easiest.end_week), (12, 14));
    }

    #[test]
    fn short_rest_raises_difficulty() {
        let lg = fixture();
        let analyzer = ScheduleStrengthAnalyzer::default();
        let me = lg.team("me").unwrap();
        let mut m = Matchup::new(12, "mid", true);
        m.kickoff = Some(Utc.with_ymd_and_hms(2025, 11, 20, 20, 0, 0).unwrap());
        let normal_prev = Utc.with_ymd_and_hms(2025, 11, 13, 20, 0, 0).unwrap();
        let short_prev = Utc.with_ymd_and_hms(2025, 11, 16, 20, 0, 0).unwrap();

        let normal = analyzer.matchup_difficulty(me, &m, Some(normal_prev), &lg).unwrap();
        let short = analyzer.matchup_difficulty(me, &m, Some(short_prev), &lg).unwrap();
        assert_eq!(normal.rest_days, Some(7));
        assert_eq!(short.rest_days, Some(4));
        assert!((short.difficulty - normal.difficulty - REST_ADJUSTMENT).abs() < 1e-9);
    }

    #[test]
    fn empty_schedule_is_neutral() {
        let lg = league(vec![record_team("solo", 3, 3, 600.0)], 7);
        let report = ScheduleStrengthAnalyzer::default().analyze(&lg.teams[0], &lg);
        assert_eq!(report.remaining_strength, 0.5);
        assert_eq!(report.past_strength, 0.5);
        assert!(report.toughest_stretch.is_none());
    }
}
