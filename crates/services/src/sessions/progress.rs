use chrono::{DateTime, Utc};

use super::plan::SessionMode;

/// Aggregated view of session progress, useful for a front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

/// End-of-session tally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub mode: SessionMode,
    pub total: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SessionSummary {
    /// Share of answered questions that were correct, in `0.0..=1.0`.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let answered = self.correct + self.incorrect;
        if answered == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.correct as f64 / answered as f64;
        ratio
    }
}
