//! Append-only sinks for transition records.
//!
//! A sink must persist a record before `append` returns and must never
//! reorder or drop records of the same run. Appends from different runs may
//! arrive concurrently.

pub mod error;
mod file;
mod memory;

pub use error::LogError;
pub use file::{plain_journal_line, FileLogConfig, FileTransitionLog, JournalFormat, JOURNAL_FILE};
pub use memory::MemoryTransitionLog;

use crate::core::{Payload, RunId, TransitionRecord};
use std::sync::Arc;

/// Durable, ordered destination for transition records.
pub trait TransitionLog<P: Payload>: Send + Sync {
    /// Persist one record. Returns only once the record is durable.
    fn append(&self, record: &TransitionRecord<P>) -> Result<(), LogError>;

    /// Everything appended so far for `run_id`, in append order.
    ///
    /// Unknown runs yield an empty sequence.
    fn read(&self, run_id: RunId) -> Result<Vec<TransitionRecord<P>>, LogError>;
}

impl<P: Payload, L: TransitionLog<P> + ?Sized> TransitionLog<P> for Arc<L> {
    fn append(&self, record: &TransitionRecord<P>) -> Result<(), LogError> {
        (**self).append(record)
    }

    fn read(&self, run_id: RunId) -> Result<Vec<TransitionRecord<P>>, LogError> {
        (**self).read(run_id)
    }
}
