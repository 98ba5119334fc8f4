//! Transition records and per-run history.

use super::state::{Payload, StateName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Identifier of one workflow run.
pub type RunId = Uuid;

/// Record of a single state transition.
///
/// Records are immutable once written. `sequence` starts at zero and is
/// strictly increasing within a run.
///
/// # Example
///
/// ```rust
/// use statewright::core::{StateName, TransitionRecord};
/// use chrono::Utc;
/// use uuid::Uuid;
///
/// let record = TransitionRecord {
///     run_id: Uuid::new_v4(),
///     sequence: 0,
///     from: StateName::from("Producer"),
///     to: StateName::from("Retailer"),
///     payload: "widget".to_string(),
///     timestamp: Utc::now(),
/// };
///
/// assert_eq!(record.to_string(), "Producer -> Retailer: widget");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct TransitionRecord<P: Payload> {
    /// Run this transition belongs to
    pub run_id: RunId,
    /// Position within the run, starting at zero
    pub sequence: u64,
    /// The state being transitioned from
    pub from: StateName,
    /// The state being transitioned to
    pub to: StateName,
    /// The work item, unchanged from the run's input
    pub payload: P,
    /// When the transition was recorded
    pub timestamp: DateTime<Utc>,
}

impl<P: Payload> fmt::Display for TransitionRecord<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}: {}", self.from, self.to, self.payload)
    }
}

/// Ways a history can break the ordering invariant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HistoryViolation {
    #[error("record {index} has sequence {sequence}, expected {index}")]
    SequenceGap { index: usize, sequence: u64 },

    #[error("record {index} starts at '{found}' but the previous state was '{expected}'")]
    Discontinuity {
        index: usize,
        expected: StateName,
        found: StateName,
    },

    #[error("record {index} belongs to run {found}, expected {expected}")]
    MixedRuns {
        index: usize,
        expected: RunId,
        found: RunId,
    },
}

/// Ordered history of the transitions of one run.
///
/// # Example
///
/// ```rust
/// use statewright::core::{RunHistory, StateName, TransitionRecord};
/// use chrono::Utc;
/// use uuid::Uuid;
///
/// let run_id = Uuid::new_v4();
/// let hop = |sequence, from: &str, to: &str| TransitionRecord {
///     run_id,
///     sequence,
///     from: StateName::from(from),
///     to: StateName::from(to),
///     payload: "widget".to_string(),
///     timestamp: Utc::now(),
/// };
///
/// let history = RunHistory::new()
///     .record(hop(0, "Producer", "Retailer"))
///     .record(hop(1, "Retailer", "Consumer"));
///
/// let path = history.get_path();
/// assert_eq!(path, vec!["Producer", "Retailer", "Consumer"]);
/// assert!(history.verify(&StateName::from("Producer")).is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct RunHistory<P: Payload> {
    records: Vec<TransitionRecord<P>>,
}

impl<P: Payload> Default for RunHistory<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Payload> From<Vec<TransitionRecord<P>>> for RunHistory<P> {
    fn from(records: Vec<TransitionRecord<P>>) -> Self {
        Self { records }
    }
}

impl<P: Payload> RunHistory<P> {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Record a transition, returning a new history.
    ///
    /// The existing history is left unchanged.
    pub fn record(&self, record: TransitionRecord<P>) -> Self {
        let mut records = self.records.clone();
        records.push(record);
        Self { records }
    }

    pub(crate) fn push(&mut self, record: TransitionRecord<P>) {
        self.records.push(record);
    }

    /// Get all records in order.
    pub fn records(&self) -> &[TransitionRecord<P>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&TransitionRecord<P>> {
        self.records.last()
    }

    /// Get the path of states traversed.
    ///
    /// Returns the first record's `from` followed by the `to` of every
    /// record. Empty when nothing was recorded.
    pub fn get_path(&self) -> Vec<&StateName> {
        let mut path = Vec::with_capacity(self.records.len() + 1);
        if let Some(first) = self.records.first() {
            path.push(&first.from);
        }
        for record in &self.records {
            path.push(&record.to);
        }
        path
    }

    /// Time elapsed between the first and last record.
    ///
    /// Returns `None` if there are no records.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.records.first(), self.records.last()) {
            last.timestamp
                .signed_duration_since(first.timestamp)
                .to_std()
                .ok()
        } else {
            None
        }
    }

    /// Check the ordering invariant against the run's initial state.
    ///
    /// Every record must have `sequence == index`, start where the previous
    /// record ended (or at `initial` for the first one), and belong to the
    /// same run as the first record.
    pub fn verify(&self, initial: &StateName) -> Result<(), HistoryViolation> {
        let mut expected_from = initial;
        let run_id = self.records.first().map(|r| r.run_id);

        for (index, record) in self.records.iter().enumerate() {
            if record.sequence != index as u64 {
                return Err(HistoryViolation::SequenceGap {
                    index,
                    sequence: record.sequence,
                });
            }
            if let Some(expected) = run_id {
                if record.run_id != expected {
                    return Err(HistoryViolation::MixedRuns {
                        index,
                        expected,
                        found: record.run_id,
                    });
                }
            }
            if &record.from != expected_from {
                return Err(HistoryViolation::Discontinuity {
                    index,
                    expected: expected_from.clone(),
                    found: record.from.clone(),
                });
            }
            expected_from = &record.to;
        }

        Ok(())
    }
}

impl<'a, P: Payload> IntoIterator for &'a RunHistory<P> {
    type Item = &'a TransitionRecord<P>;
    type IntoIter = std::slice::Iter<'a, TransitionRecord<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
