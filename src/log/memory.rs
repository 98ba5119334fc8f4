//! In-memory transition log.

use super::{LogError, TransitionLog};
use crate::core::{Payload, RunId, TransitionRecord};
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory sink for tests and embedding.
///
/// Durable only for the lifetime of the process.
pub struct MemoryTransitionLog<P: Payload> {
    runs: RwLock<HashMap<RunId, Vec<TransitionRecord<P>>>>,
}

impl<P: Payload> MemoryTransitionLog<P> {
    pub fn new() -> Self {
        Self {
            runs: RwLock::new(HashMap::new()),
        }
    }

    /// Ids of every run with at least one record.
    pub fn run_ids(&self) -> Vec<RunId> {
        self.runs.read().keys().copied().collect()
    }

    /// Total number of records across all runs.
    pub fn total_records(&self) -> usize {
        self.runs.read().values().map(Vec::len).sum()
    }

    pub fn clear(&self) {
        self.runs.write().clear();
    }
}

impl<P: Payload> Default for MemoryTransitionLog<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Payload> TransitionLog<P> for MemoryTransitionLog<P> {
    fn append(&self, record: &TransitionRecord<P>) -> Result<(), LogError> {
        self.runs
            .write()
            .entry(record.run_id)
            .or_default()
            .push(record.clone());
        Ok(())
    }

    fn read(&self, run_id: RunId) -> Result<Vec<TransitionRecord<P>>, LogError> {
        Ok(self.runs.read().get(&run_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StateName;
    use chrono::Utc;
    use uuid::Uuid;

    fn record(run_id: RunId, sequence: u64) -> TransitionRecord<String> {
        TransitionRecord {
            run_id,
            sequence,
            from: StateName::from("Producer"),
            to: StateName::from("Retailer"),
            payload: "widget".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn append_preserves_order_per_run() {
        let log = MemoryTransitionLog::new();
        let run_a = Uuid::new_v4();
        let run_b = Uuid::new_v4();

        log.append(&record(run_a, 0)).unwrap();
        log.append(&record(run_b, 0)).unwrap();
        log.append(&record(run_a, 1)).unwrap();

        let a = log.read(run_a).unwrap();
        assert_eq!(a.iter().map(|r| r.sequence).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(log.read(run_b).unwrap().len(), 1);
        assert_eq!(log.total_records(), 3);
    }

    #[test]
    fn unknown_run_reads_empty() {
        let log: MemoryTransitionLog<String> = MemoryTransitionLog::new();
        assert!(log.read(Uuid::new_v4()).unwrap().is_empty());
    }

    #[test]
    fn clear_drops_all_runs() {
        let log = MemoryTransitionLog::new();
        log.append(&record(Uuid::new_v4(), 0)).unwrap();
        log.clear();
        assert!(log.run_ids().is_empty());
    }
}
