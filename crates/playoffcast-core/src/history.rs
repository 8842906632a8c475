// Historical head-to-head data.
//
// The engine asks a provider for past results between two teams. The default
// provider knows nothing (every edge is neutral); `CsvHistory` loads records
// from a file with the columns `team_id,opponent_id,wins,losses,avg_margin`.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to open history file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read history CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid history row {row}: {message}")]
    Invalid { row: usize, message: String },
}

/// Past results of `team` against `opponent`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadToHead {
    pub wins: u32,
    pub losses: u32,
    /// Mean scoring margin from `team`'s perspective.
    pub avg_margin: f64,
}

impl HeadToHead {
    pub fn games(&self) -> u32 {
        self.wins + self.losses
    }

    /// Bounded edge in [-1, 1]: the win/loss balance shrunk toward zero when
    /// only a few games have been played.
    pub fn edge(&self) -> f64 {
        let games = self.games();
        if games == 0 {
            return 0.0;
        }
        let balance = (self.wins as f64 - self.losses as f64) / games as f64;
        let reliability = games as f64 / (games as f64 + 3.0);
        (balance * reliability).clamp(-1.0, 1.0)
    }

    pub fn reversed(&self) -> HeadToHead {
        HeadToHead {
            wins: self.losses,
            losses: self.wins,
            avg_margin: -self.avg_margin,
        }
    }
}

/// Source of historical matchup data.
pub trait HistoricalDataProvider: Send + Sync {
    fn head_to_head(&self, team_id: &str, opponent_id: &str) -> Option<HeadToHead>;
}

/// Provider with no data; every lookup is neutral.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHistory;

impl HistoricalDataProvider for NoHistory {
    fn head_to_head(&self, _team_id: &str, _opponent_id: &str) -> Option<HeadToHead> {
        None
    }
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    team_id: String,
    opponent_id: String,
    wins: u32,
    losses: u32,
    avg_margin: f64,
}

/// Head-to-head records loaded from CSV.
#[derive(Debug, Clone, Default)]
pub struct CsvHistory {
    records: HashMap<(String, String), HeadToHead>,
}

impl CsvHistory {
    pub fn load(path: &Path) -> Result<Self, HistoryError> {
        let file = std::fs::File::open(path).map_err(|source| HistoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let history = Self::from_reader(file)?;
        info!(
            "Loaded {} head-to-head records from {}",
            history.len(),
            path.display()
        );
        Ok(history)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, HistoryError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut records = HashMap::new();
        for (i, row) in rdr.deserialize::<HistoryRow>().enumerate() {
            let row = row?;
            if !row.avg_margin.is_finite() {
                return Err(HistoryError::Invalid {
                    row: i + 1,
                    message: "avg_margin must be finite".into(),
                });
            }
            if row.team_id == row.opponent_id {
                return Err(HistoryError::Invalid {
                    row: i + 1,
                    message: format!("team `{}` cannot face itself", row.team_id),
                });
            }
            records.insert(
                (row.team_id, row.opponent_id),
                HeadToHead {
                    wins: row.wins,
                    losses: row.losses,
                    avg_margin: row.avg_margin,
                },
            );
        }
        Ok(CsvHistory { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl HistoricalDataProvider for CsvHistory {
    fn head_to_head(&self, team_id: &str, opponent_id: &str) -> Option<HeadToHead> {
        let key = (team_id.to_string(), opponent_id.to_string());
        if let Some(h2h) = self.records.get(&key) {
            return Some(*h2h);
        }
        let reverse = (opponent_id.to_string(), team_id.to_string());
        self.records.get(&reverse).map(HeadToHead::reversed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "team_id,opponent_id,wins,losses,avg_margin\n\
                       a, b, 4, 1, 12.5\n\
                       c,a,2,2,0.0\n";

    #[test]
    fn loads_and_looks_up_both_directions() {
        let history = CsvHistory::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(history.len(), 2);

        let ab = history.head_to_head("a", "b").unwrap();
        assert_eq!((ab.wins, ab.losses), (4, 1));

        let ba = history.head_to_head("b", "a").unwrap();
        assert_eq!((ba.wins, ba.losses), (1, 4));
        assert_eq!(ba.avg_margin, -12.5);

        assert!(history.head_to_head("b", "c").is_none());
    }

    #[test]
    fn edge_is_shrunk_for_small_samples() {
        let small = HeadToHead { wins: 1, losses: 0, avg_margin: 5.0 };
        let large = HeadToHead { wins: 10, losses: 0, avg_margin: 5.0 };
        assert!(small.edge() < large.edge());
        assert!(large.edge() <= 1.0);
        assert_eq!(HeadToHead { wins: 0, losses: 0, avg_margin: 0.0 }.edge(), 0.0);
        assert!((small.edge() + small.reversed().edge()).abs() < 1e-12);
    }

    #[test]
    fn rejects_self_matchups() {
        let bad = "team_id,opponent_id,wins,losses,avg_margin\na,a,1,0,3.0\n";
        match CsvHistory::from_reader(bad.as_bytes()) {
            Err(HistoryError::Invalid { row, .. }) => assert_eq!(row, 1),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn malformed_numbers_are_csv_errors() {
        let bad = "team_id,opponent_id,wins,losses,avg_margin\na,b,lots,0,3.0\n";
        assert!(matches!(
            CsvHistory::from_reader(bad.as_bytes()),
            Err(HistoryError::Csv(_))
        ));
    }

    #[test]
    fn no_history_is_neutral() {
        assert!(NoHistory.head_to_head("a", "b").is_none());
    }
}
