#![forbid(unsafe_code)]

pub mod json;
pub mod repository;

pub use json::{DEFAULT_STORE_FILE, JsonFileStore};
pub use repository::{InMemoryStore, LoadOutcome, LoadWarning, RepositoryStore, StorageError};
