// Applying live events to the canonical league snapshot.
//
// Each event is resolved (team, player, week) before anything is written, so
// an event either lands completely or not at all. Events against a game that
// already has a final score are rejected; finals are immutable.

use thiserror::Error;

use playoffcast_core::model::roster::{is_starter, projected_lineup_points, LINEUP_SIZE};
use playoffcast_core::model::{
    GameOutcome, GameScore, League, LiveScore, Matchup, Player, WeatherSnapshot,
};
use playoffcast_core::protocol::{EventKind, EventPayload, LiveEvent};

#[derive(Debug, Error, PartialEq)]
pub enum LiveError {
    #[error("unknown team `{0}`")]
    UnknownTeam(String),

    #[error("team `{team_id}` has no player `{player_id}`")]
    UnknownPlayer { team_id: String, player_id: String },

    #[error("team `{team_id}` has no game in week {week}")]
    UnknownWeek { team_id: String, week: u32 },

    #[error("week {week} game for `{team_id}` is already final")]
    AlreadyFinal { team_id: String, week: u32 },

    #[error("invalid {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// How soon the updater should react to an applied event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    /// Recompute right away.
    Immediate,
    /// Fold into the next debounced batch.
    Batched,
}

impl From<EventKind> for Urgency {
    fn from(kind: EventKind) -> Self {
        if kind.is_immediate() {
            Urgency::Immediate
        } else {
            Urgency::Batched
        }
    }
}

/// What an event changed.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedEvent {
    pub kind: EventKind,
    pub urgency: Urgency,
    /// The event's team first, then its opponent when the game is shared.
    pub affected: Vec<String>,
    pub reasons: Vec<String>,
}

/// Apply one event to `league`. On error the league is untouched.
pub fn apply_event(league: &mut League, event: &LiveEvent) -> Result<AppliedEvent, LiveError> {
    let team_idx = league
        .team_index(&event.team_id)
        .ok_or_else(|| LiveError::UnknownTeam(event.team_id.clone()))?;

    let (affected, reasons) = match &event.event {
        EventPayload::ScoreUpdate {
            week,
            points,
            opponent_points,
            starters_remaining,
            opponent_starters_remaining,
        } => {
            non_negative("points", *points)?;
            non_negative("opponent_points", *opponent_points)?;
            within_lineup("starters_remaining", *starters_remaining)?;
            within_lineup("opponent_starters_remaining", *opponent_starters_remaining)?;
            let game = locate_game(league, team_idx, *week)?;
            let team = &league.teams[team_idx];
            let team_projection = projection(Some(team_game(league, game)), &team.roster);
            let opponent_projection = game
                .opponent
                .map(|o| projection(opponent_game(league, game), &league.teams[o].roster))
                .unwrap_or(team_projection);

            let live = LiveScore {
                points: *points,
                opponent_points: *opponent_points,
                starters_remaining: starters_remaining
                    .unwrap_or_else(|| estimate_remaining(*points, team_projection)),
                opponent_starters_remaining: opponent_starters_remaining
                    .unwrap_or_else(|| estimate_remaining(*opponent_points, opponent_projection)),
                updated_at: event.timestamp,
            };
            let reasons = score_reasons(&team.name, &live, team_projection);
            write_game(league, game, |m| m.update_live(live), |m| m.update_live(live.flipped()))?;
            (game.affected(league), reasons)
        }

        EventPayload::PlayerInjury {
            player_id,
            status,
            expected_return_week,
        } => {
            let team = &mut league.teams[team_idx];
            let starter = is_starter(&team.roster, player_id);
            let player = team.player_mut(player_id).ok_or_else(|| LiveError::UnknownPlayer {
                team_id: event.team_id.clone(),
                player_id: player_id.clone(),
            })?;
            let before = player.injury_status;
            player.injury_status = *status;
            player.expected_return_week = *expected_return_week;
            let mut reason = format!(
                "{} ({}) {} -> {}",
                player.name,
                player.position,
                before.label(),
                status.label()
            );
            if starter {
                reason.push_str(", projected starter");
            }
            if let Some(week) = expected_return_week {
                reason.push_str(&format!(", expected back week {week}"));
            }
            (vec![event.team_id.clone()], vec![reason])
        }

        EventPayload::WeatherChange { week, weather } => {
            if !weather.temperature_f.is_finite() {
                return Err(LiveError::InvalidValue {
                    field: "temperature_f",
                    message: "must be finite".into(),
                });
            }
            non_negative("wind_mph", weather.wind_mph)?;
            let game = locate_game(league, team_idx, *week)?;
            let weather: WeatherSnapshot = *weather;
            write_game(league, game, |m| m.set_weather(weather), |m| m.set_weather(weather))?;
            let reason = if weather.dome {
                format!("Week {week} game moved indoors")
            } else {
                format!(
                    "Week {week} forecast: {:.0}F, wind {:.0} mph, {:?}",
                    weather.temperature_f, weather.wind_mph, weather.precipitation
                )
            };
            (game.affected(league), vec![reason])
        }

        EventPayload::GameStart { week } => {
            let game = locate_game(league, team_idx, *week)?;
            let kickoff = LiveScore {
                points: 0.0,
                opponent_points: 0.0,
                starters_remaining: LINEUP_SIZE as u32,
                opponent_starters_remaining: LINEUP_SIZE as u32,
                updated_at: event.timestamp,
            };
            let has_live = team_game(league, game).live.is_some();
            if !has_live {
                write_game(
                    league,
                    game,
                    |m| m.update_live(kickoff),
                    |m| m.update_live(kickoff.flipped()),
                )?;
            }
            (game.affected(league), vec![format!("Week {week} game started")])
        }

        EventPayload::GameEnd {
            week,
            points,
            opponent_points,
        } => {
            non_negative("points", *points)?;
            non_negative("opponent_points", *opponent_points)?;
            let game = locate_game(league, team_idx, *week)?;
            let score = GameScore {
                points: *points,
                opponent_points: *opponent_points,
            };
            write_game(
                league,
                game,
                |m| m.record_final(score),
                |m| m.record_final(score.flipped()),
            )?;
            league.teams[game.team].apply_final(score);
            if let (Some(o), Some(_)) = (game.opponent, game.opponent_slot) {
                league.teams[o].apply_final(score.flipped());
            }
            let name = &league.teams[game.team].name;
            let result = match score.outcome() {
                GameOutcome::Win => "win",
                GameOutcome::Loss => "loss",
                GameOutcome::Tie => "tie",
            };
            let reason = format!("Final: {name} {points:.1} - {opponent_points:.1} ({result})");
            advance_week(league);
            (game.affected(league), vec![reason])
        }
    };

    Ok(AppliedEvent {
        kind: event.kind(),
        urgency: event.kind().into(),
        affected,
        reasons,
    })
}

// ---------------------------------------------------------------------------
// Game lookup
// ---------------------------------------------------------------------------

/// A located game: the event team's matchup and, when the opponent lists the
/// same game, the opponent's reciprocal matchup.
#[derive(Debug, Clone, Copy)]
struct GameRef {
    team: usize,
    slot: usize,
    opponent: Option<usize>,
    opponent_slot: Option<usize>,
}

impl GameRef {
    fn affected(&self, league: &League) -> Vec<String> {
        let mut ids = vec![league.teams[self.team].id.clone()];
        if let Some(o) = self.opponent {
            ids.push(league.teams[o].id.clone());
        }
        ids
    }
}

fn locate_game(league: &League, team: usize, week: u32) -> Result<GameRef, LiveError> {
    let owner = &league.teams[team];
    let slot = owner
        .schedule
        .iter()
        .position(|m| m.week == week)
        .ok_or_else(|| LiveError::UnknownWeek {
            team_id: owner.id.clone(),
            week,
        })?;
    let matchup = &owner.schedule[slot];
    if matchup.is_complete() {
        return Err(LiveError::AlreadyFinal {
            team_id: owner.id.clone(),
            week,
        });
    }

    let opponent = league.team_index(&matchup.opponent_id);
    let opponent_slot = opponent.and_then(|o| {
        league.teams[o]
            .schedule
            .iter()
            .position(|m| m.week == week && m.opponent_id == owner.id)
    });
    if let (Some(o), Some(s)) = (opponent, opponent_slot) {
        if league.teams[o].schedule[s].is_complete() {
            return Err(LiveError::AlreadyFinal {
                team_id: league.teams[o].id.clone(),
                week,
            });
        }
    }

    Ok(GameRef {
        team,
        slot,
        opponent,
        opponent_slot,
    })
}

fn team_game<'a>(league: &'a League, game: GameRef) -> &'a Matchup {
    &league.teams[game.team].schedule[game.slot]
}

fn opponent_game(league: &League, game: GameRef) -> Option<&Matchup> {
    match (game.opponent, game.opponent_slot) {
        (Some(o), Some(s)) => Some(&league.teams[o].schedule[s]),
        _ => None,
    }
}

/// Write both sides of a located game. Both sides were checked for finality
/// by `locate_game`, so neither write can fail halfway.
fn write_game<E>(
    league: &mut League,
    game: GameRef,
    ours: impl FnOnce(&mut Matchup) -> Result<(), E>,
    theirs: impl FnOnce(&mut Matchup) -> Result<(), E>,
) -> Result<(), LiveError> {
    let team_id = league.teams[game.team].id.clone();
    let week = league.teams[game.team].schedule[game.slot].week;
    let locked = || LiveError::AlreadyFinal {
        team_id: team_id.clone(),
        week,
    };
    ours(&mut league.teams[game.team].schedule[game.slot]).map_err(|_| locked())?;
    if let (Some(o), Some(s)) = (game.opponent, game.opponent_slot) {
        theirs(&mut league.teams[o].schedule[s]).map_err(|_| locked())?;
    }
    Ok(())
}

/// Move `current_week` forward once every game in it is final.
fn advance_week(league: &mut League) {
    let week = league.current_week;
    let pending = league
        .teams
        .iter()
        .filter_map(|t| t.matchup_for_week(week))
        .any(|m| !m.is_complete());
    if !pending && week <= league.regular_season_weeks {
        league.current_week = week + 1;
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn non_negative(field: &'static str, value: f64) -> Result<(), LiveError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(LiveError::InvalidValue {
            field,
            message: format!("must be a finite non-negative number, got {value}"),
        })
    }
}

fn within_lineup(field: &'static str, count: Option<u32>) -> Result<(), LiveError> {
    match count {
        Some(n) if n as usize > LINEUP_SIZE => Err(LiveError::InvalidValue {
            field,
            message: format!("must be at most {LINEUP_SIZE}, got {n}"),
        }),
        _ => Ok(()),
    }
}

fn projection(matchup: Option<&Matchup>, roster: &[Player]) -> f64 {
    matchup
        .and_then(|m| m.projected_score)
        .unwrap_or_else(|| projected_lineup_points(roster))
}

/// Starters still to play when the feed does not say: assume points accrue
/// evenly across the lineup.
pub fn estimate_remaining(points: f64, projection: f64) -> u32 {
    if projection <= 0.0 {
        return LINEUP_SIZE as u32;
    }
    let played = (points / projection).clamp(0.0, 1.0);
    ((1.0 - played) * LINEUP_SIZE as f64).round() as u32
}

fn score_reasons(team_name: &str, live: &LiveScore, projection: f64) -> Vec<String> {
    let margin = live.points - live.opponent_points;
    let mut reasons = vec![format!(
        "{} {} by {:.1} with {} starter(s) left (opponent {})",
        team_name,
        if margin >= 0.0 { "leads" } else { "trails" },
        margin.abs(),
        live.starters_remaining,
        live.opponent_starters_remaining
    )];

    // Pace: what the lineup should have scored by now given who has played.
    let played_share = 1.0 - live.starters_remaining as f64 / LINEUP_SIZE as f64;
    let expected = projection * played_share;
    if played_share > 0.0 && expected > 0.0 {
        let pace = live.points - expected;
        if pace.abs() >= 0.1 * expected {
            reasons.push(format!(
                "Scoring {:.1} {} projection pace",
                pace.abs(),
                if pace > 0.0 { "above" } else { "below" }
            ));
        }
    }
    reasons
}
