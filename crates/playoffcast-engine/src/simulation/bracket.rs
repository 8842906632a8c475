// Single-elimination playoff bracket with byes and reseeding.
//
// For a field of K seeds the bracket rounds up to the next power of two; the
// top `next_pow2(K) - K` seeds get first-round byes. Every round pairs the
// best remaining seed with the worst, so a six-team field plays 3v6 and 4v5,
// then 1 and 2 meet the lowest surviving seeds, then the final.

/// One game a team played on its way through the bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BracketGame {
    pub opponent: usize,
    pub round: &'static str,
    pub won: bool,
}

pub(crate) fn round_label(teams_in_round: usize) -> &'static str {
    match teams_in_round {
        0..=2 => "Championship",
        3..=4 => "Semifinal",
        5..=8 => "Quarterfinal",
        _ => "Wild Card",
    }
}

/// Number of first-round byes for a field of `field` teams.
pub(crate) fn byes(field: usize) -> usize {
    if field == 0 {
        return 0;
    }
    field.next_power_of_two() - field
}

/// Play out the bracket for `seeds` (team indices, best seed first).
///
/// `decide(a, b)` returns true when `a` (the better seed) beats `b`. It is
/// called exactly `seeds.len() - 1` times. `on_game(team, game)` is invoked
/// for both participants of every game. Returns the champion.
pub(crate) fn play<D, G>(seeds: &[usize], mut decide: D, mut on_game: G) -> Option<usize>
where
    D: FnMut(usize, usize) -> bool,
    G: FnMut(usize, BracketGame),
{
    if seeds.is_empty() {
        return None;
    }
    // (seed number, team index)
    let mut alive: Vec<(usize, usize)> = seeds.iter().copied().enumerate().collect();
    let mut round_size = alive.len().next_power_of_two();
    let mut first_round = true;

    while alive.len() > 1 {
        alive.sort_by_key(|&(seed, _)| seed);
        let label = round_label(round_size);
        let skip = if first_round { byes(alive.len()) } else { 0 };
        let (advancing, playing) = alive.split_at(skip);

        let mut next: Vec<(usize, usize)> = advancing.to_vec();
        let n = playing.len();
        for i in 0..n / 2 {
            let high = playing[i];
            let low = playing[n - 1 - i];
            let high_wins = decide(high.1, low.1);
            on_game(
                high.1,
                BracketGame {
                    opponent: low.1,
                    round: label,
                    won: high_wins,
                },
            );
            on_game(
                low.1,
                BracketGame {
                    opponent: high.1,
                    round: label,
                    won: !high_wins,
                },
            );
            next.push(if high_wins { high } else { low });
        }

        alive = next;
        round_size /= 2;
        first_round = false;
    }

    alive.first().map(|&(_, team)| team)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byes_round_up_to_power_of_two() {
        assert_eq!(byes(1), 0);
        assert_eq!(byes(2), 0);
        assert_eq!(byes(3), 1);
        assert_eq!(byes(6), 2);
        assert_eq!(byes(8), 0);
        assert_eq!(byes(12), 4);
    }

    #[test]
    fn six_team_field_pairs_and_reseeds() {
        // Teams are identified by seed - 1 for readability.
        let seeds = [0, 1, 2, 3, 4, 5];
        let mut games = Vec::new();
        // Lower seed (higher index) always wins the first round, favourite after.
        let champion = play(
            &seeds,
            |a, b| {
                games.push((a, b));
                !(a >= 2 && b >= 2)
            },
            |_, _| {},
        );
        // Round 1: 3v6 and 4v5 -> 6 and 5 advance.
        assert_eq!(games[0], (2, 5));
        assert_eq!(games[1], (3, 4));
        // Reseeded semis: 1 plays the lowest remaining (6), 2 plays 5.
        assert_eq!(games[2], (0, 5));
        assert_eq!(games[3], (1, 4));
        assert_eq!(games[4], (0, 1));
        assert_eq!(games.len(), 5);
        assert_eq!(champion, Some(0));
    }

    #[test]
    fn upset_winner_is_reseeded() {
        // 6 upsets 3, 4 beats 5; semis must be 1v6 and 2v4.
        let seeds = [10, 11, 12, 13, 14, 15];
        let mut games = Vec::new();
        play(
            &seeds,
            |a, b| {
                games.push((a, b));
                !(a == 12 && b == 15)
            },
            |_, _| {},
        );
        assert_eq!(games[2], (10, 15));
        assert_eq!(games[3], (11, 13));
    }

    #[test]
    fn single_team_is_champion_without_games() {
        let mut calls = 0;
        let champion = play(&[7], |_, _| {
            calls += 1;
            true
        }, |_, _| {});
        assert_eq!(champion, Some(7));
        assert_eq!(calls, 0);
        assert_eq!(play(&[], |_, _| true, |_, _| {}), None);
    }

    #[test]
    fn games_are_reported_for_both_sides() {
        let mut log: Vec<(usize, BracketGame)> = Vec::new();
        play(&[0, 1], |_, _| false, |team, game| log.push((team, game)));
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].1.round, "Championship");
        assert!(!log[0].1.won);
        assert!(log[1].1.won);
        assert_eq!(log[1].0, 1);
    }
}
