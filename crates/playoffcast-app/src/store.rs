// Per-team probability records shared between the updater and readers.
//
// Every write carries the sequence number of the recomputation that produced
// it. A write older than the stored record is discarded, so a slow full
// recompute can never overwrite a newer targeted result. Each team's record
// is replaced whole.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use playoffcast_core::model::ChampionshipProbability;
use playoffcast_core::validation::{validate_probability, ValidationError};

#[derive(Debug, Clone, PartialEq)]
pub enum StoreOutcome {
    /// The record was stored. `previous` is the record it replaced.
    Applied {
        previous: Option<ChampionshipProbability>,
    },
    /// A newer record is already stored; the write was dropped.
    Stale { current_sequence: u64 },
}

#[derive(Debug, Clone)]
struct Entry {
    sequence: u64,
    record: ChampionshipProbability,
}

#[derive(Debug, Default)]
pub struct ProbabilityStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl ProbabilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `record` if `sequence` is not older than what is held.
    pub fn apply(&self, sequence: u64, record: ChampionshipProbability) -> StoreOutcome {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = entries.get(&record.team_id) {
            if sequence < existing.sequence {
                return StoreOutcome::Stale {
                    current_sequence: existing.sequence,
                };
            }
        }
        let previous = entries
            .insert(record.team_id.clone(), Entry { sequence, record })
            .map(|e| e.record);
        StoreOutcome::Applied { previous }
    }

    /// Validate every record from an external source, then store them all.
    /// Nothing is stored if any record is invalid.
    pub fn seed(
        &self,
        sequence: u64,
        records: Vec<ChampionshipProbability>,
    ) -> Result<usize, ValidationError> {
        let mut violations = Vec::new();
        for record in &records {
            if let Err(e) = validate_probability(record) {
                violations.extend(e.violations.into_iter().map(|mut v| {
                    v.path = format!("{}.{}", record.team_id, v.path);
                    v
                }));
            }
        }
        if !violations.is_empty() {
            return Err(ValidationError { violations });
        }
        let count = records.len();
        for record in records {
            self.apply(sequence, record);
        }
        Ok(count)
    }

    pub fn get(&self, team_id: &str) -> Option<ChampionshipProbability> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(team_id).map(|e| e.record.clone())
    }

    pub fn sequence(&self, team_id: &str) -> Option<u64> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(team_id).map(|e| e.sequence)
    }

    /// All records, ordered by team id.
    pub fn snapshot(&self) -> Vec<ChampionshipProbability> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut records: Vec<ChampionshipProbability> =
            entries.values().map(|e| e.record.clone()).collect();
        records.sort_by(|a, b| a.team_id.cmp(&b.team_id));
        records
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(team_id: &str, championship: f64) -> ChampionshipProbability {
        ChampionshipProbability {
            team_id: team_id.into(),
            playoff_probability: (championship * 3.0).min(1.0),
            division_probability: championship * 2.0,
            championship_probability: championship,
            expected_seed: 3.0,
            schedule_strength: 0.5,
            momentum_score: 0.0,
            key_factors: Vec::new(),
            optimal_path: None,
            sample_trials: Vec::new(),
            trials: 1_000,
            computed_at: Utc::now(),
        }
    }

    #[test]
    fn newer_sequence_replaces_record() {
        let store = ProbabilityStore::new();
        assert_eq!(
            store.apply(1, record("a", 0.1)),
            StoreOutcome::Applied { previous: None }
        );
        match store.apply(2, record("a", 0.2)) {
            StoreOutcome::Applied { previous: Some(prev) } => {
                assert_eq!(prev.championship_probability, 0.1)
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(store.get("a").unwrap().championship_probability, 0.2);
        assert_eq!(store.sequence("a"), Some(2));
    }

    #[test]
    fn older_sequence_is_discarded() {
        let store = ProbabilityStore::new();
        store.apply(5, record("a", 0.3));
        assert_eq!(
            store.apply(4, record("a", 0.9)),
            StoreOutcome::Stale { current_sequence: 5 }
        );
        assert_eq!(store.get("a").unwrap().championship_probability, 0.3);
    }

    #[test]
    fn equal_sequence_is_applied() {
        let store = ProbabilityStore::new();
        store.apply(3, record("a", 0.3));
        assert!(matches!(
            store.apply(3, record("a", 0.4)),
            StoreOutcome::Applied { .. }
        ));
    }

    #[test]
    fn teams_are_independent() {
        let store = ProbabilityStore::new();
        store.apply(9, record("a", 0.3));
        assert!(matches!(
            store.apply(1, record("b", 0.2)),
            StoreOutcome::Applied { previous: None }
        ));
        let ids: Vec<String> = store.snapshot().into_iter().map(|r| r.team_id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn seed_is_all_or_nothing() {
        let store = ProbabilityStore::new();
        let mut bad = record("b", 0.2);
        bad.championship_probability = 1.5;
        let err = store.seed(1, vec![record("a", 0.1), bad]).unwrap_err();
        assert!(!err.violations.is_empty());
        assert!(err.violations.iter().all(|v| v.path.starts_with("b.")));
        assert!(store.is_empty());

        assert_eq!(store.seed(1, vec![record("a", 0.1), record("b", 0.2)]).unwrap(), 2);
        assert_eq!(store.len(), 2);
    }
}
