//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{AnswerError, QuestionError, RepositoryError};
use storage::StorageError;

/// Errors emitted by `QuestionBank`.
///
/// `Persist` means the change is applied in memory but the store rejected
/// the write; the bank stays authoritative until the next successful save.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("draft #{index} is not a valid question: {source}")]
    InvalidDraft {
        index: usize,
        #[source]
        source: QuestionError,
    },

    #[error("failed to load question bank: {0}")]
    Load(#[source] StorageError),

    #[error("change kept in memory but not saved: {0}")]
    Persist(#[source] StorageError),
}

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    EmptyScope,
    #[error("session already finished")]
    Finished,
    #[error("current question has not been answered yet")]
    NotAnswered,
    #[error("current question was already answered")]
    AlreadyAnswered,
    #[error(transparent)]
    InvalidAnswer(#[from] AnswerError),
    #[error("answer recorded but wrong-set not saved: {0}")]
    Persist(#[source] StorageError),
}

/// Errors emitted by a `QuestionExtractor`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExtractionError {
    #[error("{kind} input is not supported by this extractor")]
    Unsupported { kind: &'static str },

    #[error("block {block}: {reason}")]
    Malformed { block: usize, reason: String },

    #[error("extraction service failed: {0}")]
    Service(String),
}

/// Errors emitted by `IngestService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IngestError {
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
