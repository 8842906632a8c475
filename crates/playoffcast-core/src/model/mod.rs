// League data model: teams, rosters, schedules, and derived probability records.

pub mod league;
pub mod matchup;
pub mod player;
pub mod probability;
pub mod roster;
pub mod team;

pub use league::{load_snapshot, League, SnapshotError};
pub use matchup::{GameScore, LiveScore, Matchup, Precipitation, WeatherSnapshot};
pub use player::{InjuryStatus, Player, Position};
pub use probability::{ChampionshipProbability, KeyFactor, PlayoffPath, SimulationResult};
pub use roster::{LineupSlot, Starter};
pub use team::{GameOutcome, OffensiveStyle, Record, Team};
