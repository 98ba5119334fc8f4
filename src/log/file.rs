//! File-backed transition log.
//!
//! Layout inside the log directory:
//! - `<run_id>.jsonl`: one JSON record per line, the replayable form
//! - `journal.log`: one human-readable line per transition, all runs
//!
//! Run files are opened for each append and closed straight after, so the
//! number of descriptors held does not grow with the number of runs.

use super::{LogError, TransitionLog};
use crate::core::{Payload, RunId, StateName, TransitionRecord};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

/// Name of the human-readable journal inside the log directory.
pub const JOURNAL_FILE: &str = "journal.log";

const RUN_EXTENSION: &str = "jsonl";

/// Renders one journal line from a transition's `from`, `to` and payload.
pub type JournalFormat = Arc<dyn Fn(&StateName, &StateName, &dyn Display) -> String + Send + Sync>;

/// Settings for [`FileTransitionLog`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLogConfig {
    /// Directory holding run files and the journal
    pub dir: PathBuf,

    /// Call `sync_data` before an append returns
    pub sync_on_append: bool,

    /// Journal location; `<dir>/journal.log` when unset
    pub journal_path: Option<PathBuf>,
}

impl Default for FileLogConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("transitions"),
            sync_on_append: true,
            journal_path: None,
        }
    }
}

impl FileLogConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    pub fn journal_path(&self) -> PathBuf {
        self.journal_path
            .clone()
            .unwrap_or_else(|| self.dir.join(JOURNAL_FILE))
    }
}

/// The default journal line, `from -> to: payload`.
pub fn plain_journal_line(from: &StateName, to: &StateName, payload: &dyn Display) -> String {
    format!("{} -> {}: {}", from, to, payload)
}

/// Append-only JSON-lines log, one file per run.
///
/// Appends to the same run are serialized by a per-run lock that lives only
/// while an append for that run is in flight. Different runs write to
/// different files and only meet at the journal.
///
/// An append either lands in both the run file and the journal or in
/// neither: a failed write truncates what it wrote.
pub struct FileTransitionLog {
    config: FileLogConfig,
    runs: Mutex<HashMap<RunId, Arc<Mutex<()>>>>,
    journal: Mutex<File>,
    journal_format: JournalFormat,
}

impl FileTransitionLog {
    /// Open (or create) a log directory.
    ///
    /// Existing run files are left untouched and stay readable.
    pub fn open(config: FileLogConfig) -> Result<Self, LogError> {
        fs::create_dir_all(&config.dir).map_err(|e| open_error(&config.dir, e))?;

        let journal_path = config.journal_path();
        let journal = append_handle(&journal_path).map_err(|e| open_error(&journal_path, e))?;

        debug!(dir = %config.dir.display(), "Opened file transition log");

        Ok(Self {
            config,
            runs: Mutex::new(HashMap::new()),
            journal: Mutex::new(journal),
            journal_format: Arc::new(plain_journal_line),
        })
    }

    /// Open a log directory with default settings.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, LogError> {
        Self::open(FileLogConfig::new(dir))
    }

    /// Replace how journal lines are rendered.
    pub fn with_journal_format<F>(mut self, format: F) -> Self
    where
        F: Fn(&StateName, &StateName, &dyn Display) -> String + Send + Sync + 'static,
    {
        self.journal_format = Arc::new(format);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    pub fn config(&self) -> &FileLogConfig {
        &self.config
    }

    /// Path of the structured record file for `run_id`.
    pub fn run_path(&self, run_id: RunId) -> PathBuf {
        self.config
            .dir
            .join(format!("{}.{}", run_id, RUN_EXTENSION))
    }

    pub fn journal_path(&self) -> PathBuf {
        self.config.journal_path()
    }

    /// Number of runs with an append currently in flight.
    pub fn active_runs(&self) -> usize {
        self.runs.lock().len()
    }

    /// Ids of every run that has a record file in the directory.
    pub fn run_ids(&self) -> Result<Vec<RunId>, LogError> {
        let entries =
            fs::read_dir(&self.config.dir).map_err(|e| open_error(&self.config.dir, e))?;

        let mut ids: Vec<RunId> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == RUN_EXTENSION))
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .and_then(|stem| Uuid::parse_str(stem).ok())
            })
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn acquire_run(&self, run_id: RunId) -> Arc<Mutex<()>> {
        Arc::clone(self.runs.lock().entry(run_id).or_default())
    }

    /// Drop the run's lock once no other append holds it.
    fn release_run(&self, run_id: RunId, lock: Arc<Mutex<()>>) {
        let mut runs = self.runs.lock();
        // The map and `lock` are the only owners left.
        if Arc::strong_count(&lock) == 2 {
            runs.remove(&run_id);
        }
    }

    fn append_lines(&self, run_id: RunId, record_line: &str, journal_line: &str) -> io::Result<()> {
        let run_path = self.run_path(run_id);
        let mut file = append_handle(&run_path)?;
        let run_len = file.metadata()?.len();

        if let Err(e) = self.write_line(&mut file, record_line) {
            error!(run_id = %run_id, error = %e, "Failed to append transition record");
            truncate(&file, run_len, &run_path);
            return Err(e);
        }

        let mut journal = self.journal.lock();
        let journal_len = journal
            .metadata()
            .ok()
            .filter(|meta| meta.is_file())
            .map(|meta| meta.len());

        if let Err(e) = self.write_line(&mut journal, journal_line) {
            error!(
                run_id = %run_id,
                error = %e,
                "Failed to append journal line, rolling back transition record"
            );
            truncate(&file, run_len, &run_path);
            if let Some(len) = journal_len {
                truncate(&journal, len, &self.journal_path());
            }
            return Err(e);
        }

        Ok(())
    }

    fn write_line(&self, file: &mut File, line: &str) -> io::Result<()> {
        file.write_all(line.as_bytes())?;
        file.flush()?;
        if self.config.sync_on_append {
            file.sync_data()?;
        }
        Ok(())
    }
}

impl fmt::Debug for FileTransitionLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileTransitionLog")
            .field("config", &self.config)
            .field("active_runs", &self.active_runs())
            .finish_non_exhaustive()
    }
}

impl<P: Payload> TransitionLog<P> for FileTransitionLog {
    fn append(&self, record: &TransitionRecord<P>) -> Result<(), LogError> {
        let run_id = record.run_id;
        let write_error = |message: String| LogError::Write { run_id, message };

        let mut record_line =
            serde_json::to_string(record).map_err(|e| write_error(e.to_string()))?;
        record_line.push('\n');

        let payload: &dyn Display = &record.payload;
        let mut journal_line = (self.journal_format)(&record.from, &record.to, payload);
        journal_line.push('\n');

        let lock = self.acquire_run(run_id);
        let result = {
            let _guard = lock.lock();
            self.append_lines(run_id, &record_line, &journal_line)
        };
        self.release_run(run_id, lock);

        result.map_err(|e| write_error(e.to_string()))
    }

    fn read(&self, run_id: RunId) -> Result<Vec<TransitionRecord<P>>, LogError> {
        let path = self.run_path(run_id);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(LogError::Read {
                    run_id,
                    message: e.to_string(),
                })
            }
        };

        let mut records = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| LogError::Read {
                run_id,
                message: e.to_string(),
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|e| LogError::Corrupt {
                run_id,
                line: index + 1,
                message: e.to_string(),
            })?;
            records.push(record);
        }

        Ok(records)
    }
}

fn append_handle(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Cut a partially written file back to `len`.
fn truncate(file: &File, len: u64, path: &Path) {
    if let Err(e) = file.set_len(len) {
        error!(path = %path.display(), error = %e, "Failed to roll back partial write");
    }
}

fn open_error(path: &Path, e: io::Error) -> LogError {
    LogError::Open {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}
