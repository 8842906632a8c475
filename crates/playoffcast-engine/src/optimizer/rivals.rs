// Rival identification.
//
// Threat = 0.6 * standings component + 0.4 * scoring component, where the
// standings component is 1.0 for the league leader falling linearly to 0.0
// for last place, and the scoring component is a logistic of the points per
// game gap over 20 points.

use serde::Serialize;

use playoffcast_core::model::{League, Record, Team};

use crate::analysis::scoring_rate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatLevel {
    Low,
    Moderate,
    High,
    Severe,
}

impl ThreatLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.75 {
            ThreatLevel::Severe
        } else if score >= 0.55 {
            ThreatLevel::High
        } else if score >= 0.35 {
            ThreatLevel::Moderate
        } else {
            ThreatLevel::Low
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RivalAssessment {
    pub team_id: String,
    pub name: String,
    /// Current standings position, 1-based.
    pub rank: u32,
    pub record: Record,
    pub points_per_game: f64,
    /// Rival's points per game minus ours.
    pub scoring_gap: f64,
    pub threat_score: f64,
    pub threat_level: ThreatLevel,
    /// Week of a remaining head-to-head game, if any.
    pub remaining_meeting: Option<u32>,
}

/// The `count` most threatening other teams, highest threat first.
pub fn assess(team: &Team, league: &League, count: usize) -> Vec<RivalAssessment> {
    let standings = league.standings();
    let last = standings.len().saturating_sub(1).max(1) as f64;
    let our_rate = scoring_rate(team);

    let mut rivals: Vec<RivalAssessment> = standings
        .iter()
        .enumerate()
        .filter(|(_, t)| t.id != team.id)
        .map(|(pos, rival)| {
            let rate = scoring_rate(rival);
            let gap = rate - our_rate;
            let standing = 1.0 - pos as f64 / last;
            let scoring = 1.0 / (1.0 + (-gap / 20.0).exp());
            let threat = (0.6 * standing + 0.4 * scoring).clamp(0.0, 1.0);
            RivalAssessment {
                team_id: rival.id.clone(),
                name: rival.name.clone(),
                rank: pos as u32 + 1,
                record: rival.record,
                points_per_game: rate,
                scoring_gap: gap,
                threat_score: threat,
                threat_level: ThreatLevel::from_score(threat),
                remaining_meeting: team
                    .remaining_schedule()
                    .find(|m| m.opponent_id == rival.id)
                    .map(|m| m.week),
            }
        })
        .collect();

    rivals.sort_by(|a, b| {
        b.threat_score
            .partial_cmp(&a.threat_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.rank.cmp(&b.rank))
    });
    rivals.truncate(count);
    rivals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{league, record_team};
    use playoffcast_core::model::Matchup;

    #[test]
    fn leader_with_better_offense_is_top_threat() {
        let mut me = record_team("me", 6, 4, 1100.0);
        me.schedule.push(Matchup::new(12, "top", true));
        let top = record_team("top", 9, 1, 1300.0);
        let mid = record_team("mid", 5, 5, 1000.0);
        let low = record_team("low", 1, 9, 800.0);
        let lg = league(vec![me.clone(), top, mid, low], 11);

        let rivals = assess(&me, &lg, 3);
        assert_eq!(rivals.len(), 3);
        assert_eq!(rivals[0].team_id, "top");
        assert_eq!(rivals[0].rank, 1);
        assert_eq!(rivals[0].remaining_meeting, Some(12));
        assert!(rivals[0].threat_level >= ThreatLevel::High);
        assert_eq!(rivals[2].team_id, "low");
        assert!(rivals.iter().all(|r| r.team_id != "me"));
    }

    #[test]
    fn count_limits_results() {
        let me = record_team("me", 6, 4, 1100.0);
        let other = record_team("other", 4, 6, 900.0);
        let lg = league(vec![me.clone(), other], 11);
        assert_eq!(assess(&me, &lg, 5).len(), 1);
        assert!(assess(&me, &lg, 0).is_empty());
    }
}
