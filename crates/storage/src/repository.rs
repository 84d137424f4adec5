use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use quiz_core::model::Repository;
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Non-fatal conditions noticed while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LoadWarning {
    /// The backing file existed but could not be read as a question bank.
    /// An empty bank was substituted; the original file was moved to
    /// `backup` when that was possible.
    CorruptStore {
        path: PathBuf,
        backup: Option<PathBuf>,
        reason: String,
    },

    /// A legacy wrong-set entry matched no question in its unit and was dropped.
    DroppedWrongEntry { unit: String, question: String },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::CorruptStore {
                path,
                backup,
                reason,
            } => {
                write!(f, "{} could not be read ({reason}); starting empty", path.display())?;
                if let Some(backup) = backup {
                    write!(f, ", original kept at {}", backup.display())?;
                }
                Ok(())
            }
            LoadWarning::DroppedWrongEntry { unit, question } => {
                write!(f, "dropped wrong-set entry {question:?} in {unit}: not in the unit")
            }
        }
    }
}

/// What `RepositoryStore::load` produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOutcome {
    pub repository: Repository,
    pub warnings: Vec<LoadWarning>,
}

impl LoadOutcome {
    #[must_use]
    pub fn clean(repository: Repository) -> Self {
        Self {
            repository,
            warnings: Vec::new(),
        }
    }
}

/// Whole-bank persistence contract: load everything once, save everything
/// after each mutation.
pub trait RepositoryStore: Send + Sync {
    /// Load the full bank.
    ///
    /// A missing backing store yields an empty bank. An unreadable one also
    /// yields an empty bank, with a `LoadWarning::CorruptStore`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only for failures that are neither "absent"
    /// nor "corrupt", e.g. permission errors.
    fn load(&self) -> Result<LoadOutcome, StorageError>;

    /// Overwrite the backing store with `repository`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bank cannot be written.
    fn save(&self, repository: &Repository) -> Result<(), StorageError>;
}

/// In-memory store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    saved: Mutex<Option<Repository>>,
    fail_saves: AtomicBool,
    save_count: AtomicUsize,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already populated bank.
    #[must_use]
    pub fn with_repository(repository: Repository) -> Self {
        Self {
            saved: Mutex::new(Some(repository)),
            ..Self::default()
        }
    }

    /// Make every subsequent `save` fail.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    /// Last saved bank, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if the inner lock is poisoned.
    pub fn snapshot(&self) -> Result<Option<Repository>, StorageError> {
        let guard = self
            .saved
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(guard.clone())
    }
}

impl RepositoryStore for InMemoryStore {
    fn load(&self) -> Result<LoadOutcome, StorageError> {
        Ok(LoadOutcome::clean(self.snapshot()?.unwrap_or_default()))
    }

    fn save(&self, repository: &Repository) -> Result<(), StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("saves disabled".into()));
        }
        let mut guard = self
            .saved
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        *guard = Some(repository.clone());
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
