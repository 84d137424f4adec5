use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use quiz_core::model::Repository;

use crate::repository::{LoadOutcome, LoadWarning, RepositoryStore, StorageError};

mod mapping;
mod ordered;

/// Default backing file name when none is configured.
pub const DEFAULT_STORE_FILE: &str = "quiz_bank.json";

/// Numbered backups tried after `<file>.corrupt` is taken.
const MAX_BACKUPS: usize = 99;

/// Single-file JSON store for the whole bank.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name: OsString = self
            .path
            .file_name()
            .map_or_else(|| OsString::from(DEFAULT_STORE_FILE), std::ffi::OsStr::to_os_string);
        name.push(suffix);
        self.path.with_file_name(name)
    }

    /// Where an unreadable file is moved before starting over.
    ///
    /// This is the first choice; when it is taken, [`JsonFileStore::load`]
    /// falls back to `.corrupt.1`, `.corrupt.2` and so on.
    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        self.sibling(".corrupt")
    }

    /// First backup name not already present on disk.
    fn free_backup_path(&self) -> Option<PathBuf> {
        std::iter::once(self.backup_path())
            .chain((1..=MAX_BACKUPS).map(|n| self.sibling(&format!(".corrupt.{n}"))))
            .find(|candidate| !candidate.exists())
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Set the unreadable file aside and hand back an empty bank.
    ///
    /// Earlier backups are never overwritten.
    fn quarantine(&self, reason: String) -> Result<LoadOutcome, StorageError> {
        let Some(target) = self.free_backup_path() else {
            return Err(StorageError::Unavailable(format!(
                "{} is unreadable ({reason}) and every backup name is taken",
                self.path.display()
            )));
        };
        let backup = match fs::rename(&self.path, &target) {
            Ok(()) => Some(target),
            Err(err) => {
                tracing::error!(
                    path = %self.path.display(),
                    error = %err,
                    "could not move corrupt store aside"
                );
                None
            }
        };
        tracing::debug!(path = %self.path.display(), ?backup, "corrupt store set aside");
        Ok(Self::start_over(LoadWarning::CorruptStore {
            path: self.path.clone(),
            backup,
            reason,
        }))
    }

    fn start_over(warning: LoadWarning) -> LoadOutcome {
        LoadOutcome {
            repository: Repository::new(),
            warnings: vec![warning],
        }
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_FILE)
    }
}

/// Decode file contents into a bank.
fn decode(bytes: &[u8]) -> Result<(Repository, Vec<LoadWarning>), String> {
    let record: mapping::StoreRecord = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
    mapping::hydrate(record).map_err(|e| e.to_string())
}

impl RepositoryStore for JsonFileStore {
    fn load(&self) -> Result<LoadOutcome, StorageError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no store file yet, starting empty");
                return Ok(LoadOutcome::default());
            }
            Err(err) => return Err(self.io_error(err)),
        };

        // Nothing worth keeping, so the file stays where it is.
        if bytes.iter().all(u8::is_ascii_whitespace) {
            tracing::debug!(path = %self.path.display(), "store file is blank");
            return Ok(Self::start_over(LoadWarning::CorruptStore {
                path: self.path.clone(),
                backup: None,
                reason: "file is empty".into(),
            }));
        }

        match decode(&bytes) {
            Ok((repository, warnings)) => {
                tracing::info!(
                    path = %self.path.display(),
                    subjects = repository.subjects().len(),
                    questions = repository.question_count(),
                    "loaded question bank"
                );
                Ok(LoadOutcome {
                    repository,
                    warnings,
                })
            }
            Err(reason) => self.quarantine(reason),
        }
    }

    fn save(&self, repository: &Repository) -> Result<(), StorageError> {
        let record = mapping::store_record(repository);
        let bytes = serde_json::to_vec_pretty(&record)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let staging = self.sibling(".tmp");
        fs::write(&staging, bytes).map_err(|e| self.io_error(e))?;
        fs::rename(&staging, &self.path).map_err(|e| self.io_error(e))?;
        tracing::debug!(path = %self.path.display(), "saved question bank");
        Ok(())
    }
}
