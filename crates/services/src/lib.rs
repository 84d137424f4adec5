#![forbid(unsafe_code)]

pub mod bank_service;
pub mod error;
pub mod ingest;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use bank_service::QuestionBank;
pub use error::{BankError, ExtractionError, IngestError, SessionError};
pub use ingest::{
    ExtractionInput, ExtractionPayload, IngestReport, IngestService, InputOutcome, InputReport,
    MANUAL_SOURCE_TAG, QuestionExtractor, TemplateExtractor,
};
pub use sessions::{
    AnswerFeedback, QuizSession, SessionLoopService, SessionMode, SessionProgress, SessionState,
    SessionSummary, WrongSetChange,
};
