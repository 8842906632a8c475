// Starting lineup selection.
//
// Leagues start QB, 2 RB, 2 WR, TE, FLEX (RB/WR/TE), K, and DEF. Starters are
// chosen greedily by projection: dedicated slots first, then the best
// remaining flex-eligible player.

use serde::{Deserialize, Serialize};

use crate::model::player::{Player, Position};

// ---------------------------------------------------------------------------
// Lineup slots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineupSlot {
    Quarterback,
    RunningBack,
    WideReceiver,
    TightEnd,
    Flex,
    Kicker,
    Defense,
}

/// Dedicated slots and how many of each a lineup holds. FLEX is filled last.
const DEDICATED_SLOTS: &[(LineupSlot, Position, usize)] = &[
    (LineupSlot::Quarterback, Position::Quarterback, 1),
    (LineupSlot::RunningBack, Position::RunningBack, 2),
    (LineupSlot::WideReceiver, Position::WideReceiver, 2),
    (LineupSlot::TightEnd, Position::TightEnd, 1),
    (LineupSlot::Kicker, Position::Kicker, 1),
    (LineupSlot::Defense, Position::Defense, 1),
];

const FLEX_SLOTS: usize = 1;

/// Total starters in a full lineup.
pub const LINEUP_SIZE: usize = 9;

/// Number of dedicated starting slots for a position (FLEX excluded).
pub fn required_starters(position: Position) -> usize {
    DEDICATED_SLOTS
        .iter()
        .find(|(_, pos, _)| *pos == position)
        .map(|(_, _, n)| *n)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct Starter<'a> {
    pub slot: LineupSlot,
    pub player: &'a Player,
}

/// Who would start if everyone were healthy: ranked by raw projection.
pub fn intended_starters(roster: &[Player]) -> Vec<Starter<'_>> {
    select(roster, |_| true, |p| p.projected_points)
}

/// Who can actually start this week: inactive players are skipped and
/// questionable/doubtful players are ranked by their discounted projection.
pub fn active_starters(roster: &[Player]) -> Vec<Starter<'_>> {
    select(roster, Player::is_available, Player::effective_projection)
}

/// Sum of discounted projections across the active lineup.
pub fn projected_lineup_points(roster: &[Player]) -> f64 {
    active_starters(roster)
        .iter()
        .map(|s| s.player.effective_projection())
        .sum()
}

/// Count of intended starters currently ruled out.
pub fn inactive_starter_count(roster: &[Player]) -> usize {
    intended_starters(roster)
        .iter()
        .filter(|s| s.player.injury_status.is_inactive())
        .count()
}

fn select<'a>(
    roster: &'a [Player],
    eligible: impl Fn(&Player) -> bool,
    key: impl Fn(&Player) -> f64,
) -> Vec<Starter<'a>> {
    let mut ranked: Vec<&Player> = roster.iter().filter(|p| eligible(*p)).collect();
    ranked.sort_by(|a, b| {
        key(*b)
            .partial_cmp(&key(*a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut used = vec![false; ranked.len()];
    let mut starters = Vec::with_capacity(LINEUP_SIZE);

    for &(slot, position, count) in DEDICATED_SLOTS {
        let mut filled = 0;
        for (i, &player) in ranked.iter().enumerate() {
            if filled == count {
                break;
            }
            if !used[i] && player.position == position {
                used[i] = true;
                filled += 1;
                starters.push(Starter { slot, player });
            }
        }
    }

    let mut flex_filled = 0;
    for (i, &player) in ranked.iter().enumerate() {
        if flex_filled == FLEX_SLOTS {
            break;
        }
        if !used[i] && player.position.is_flex_eligible() {
            used[i] = true;
            flex_filled += 1;
            starters.push(Starter {
                slot: LineupSlot::Flex,
                player,
            });
        }
    }

    starters
}

/// Whether the player is among the intended starters.
pub fn is_starter(roster: &[Player], player_id: &str) -> bool {
    intended_starters(roster)
        .iter()
        .any(|s| s.player.id == player_id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::player::InjuryStatus;

    fn full_roster() -> Vec<Player> {
        vec![
            Player::new("qb1", "QB One", Position::Quarterback, 22.0),
            Player::new("qb2", "QB Two", Position::Quarterback, 15.0),
            Player::new("rb1", "RB One", Position::RunningBack, 17.0),
            Player::new("rb2", "RB Two", Position::RunningBack, 13.0),
            Player::new("rb3", "RB Three", Position::RunningBack, 9.0),
            Player::new("wr1", "WR One", Position::WideReceiver, 16.0),
            Player::new("wr2", "WR Two", Position::WideReceiver, 12.0),
            Player::new("wr3", "WR Three", Position::WideReceiver, 10.0),
            Player::new("te1", "TE One", Position::TightEnd, 9.0),
            Player::new("k1", "Kicker", Position::Kicker, 8.0),
            Player::new("d1", "Defense", Position::Defense, 7.0),
        ]
    }

    #[test]
    fn full_lineup_has_nine_starters() {
        let roster = full_roster();
        let starters = intended_starters(&roster);
        assert_eq!(starters.len(), LINEUP_SIZE);
        let flex: Vec<&str> = starters
            .iter()
            .filter(|s| s.slot == LineupSlot::Flex)
            .map(|s| s.player.id.as_str())
            .collect();
        assert_eq!(flex, vec!["wr3"]);
        assert!(!is_starter(&roster, "qb2"));
    }

    #[test]
    fn inactive_starter_is_replaced_in_active_lineup() {
        let mut roster = full_roster();
        roster[0].injury_status = InjuryStatus::Out;
        let active = active_starters(&roster);
        let qb = active
            .iter()
            .find(|s| s.slot == LineupSlot::Quarterback)
            .unwrap();
        assert_eq!(qb.player.id, "qb2");
        assert_eq!(inactive_starter_count(&roster), 1);
    }

    #[test]
    fn injury_lowers_projected_points() {
        let mut roster = full_roster();
        let healthy = projected_lineup_points(&roster);
        roster[0].injury_status = InjuryStatus::Out;
        let injured = projected_lineup_points(&roster);
        assert!((healthy - injured - 7.0).abs() < 1e-9);
    }

    #[test]
    fn short_roster_fills_what_it_can() {
        let roster = vec![Player::new("qb1", "QB", Position::Quarterback, 20.0)];
        assert_eq!(intended_starters(&roster).len(), 1);
        assert_eq!(required_starters(Position::RunningBack), 2);
    }
}
