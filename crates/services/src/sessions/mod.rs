mod plan;
mod progress;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::{SessionMode, shuffle};
pub use progress::{SessionProgress, SessionSummary};
pub use service::{AnswerFeedback, QuizSession, SessionState, WrongSetChange};
pub use workflow::SessionLoopService;
