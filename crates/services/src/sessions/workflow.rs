use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use quiz_core::Scope;

use crate::Clock;
use crate::bank_service::QuestionBank;
use crate::error::SessionError;
use super::plan::SessionMode;
use super::service::{AnswerFeedback, QuizSession, SessionState};

/// Orchestrates session start and persisted answering.
///
/// Owns the random source used for every shuffle it performs.
pub struct SessionLoopService {
    clock: Clock,
    rng: StdRng,
}

impl SessionLoopService {
    /// Entropy-seeded service.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic service; the same seed yields the same question orders.
    #[must_use]
    pub fn with_seed(clock: Clock, seed: u64) -> Self {
        Self {
            clock,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Start a session over `scope`: `all` for quiz, `wrong` for review.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyScope` if the chosen list is empty.
    pub fn start(
        &mut self,
        bank: &QuestionBank,
        scope: &Scope,
        mode: SessionMode,
    ) -> Result<QuizSession, SessionError> {
        let resolved = bank.resolve(scope);
        let questions = match mode {
            SessionMode::Quiz => resolved.all,
            SessionMode::Review => resolved.wrong,
        };
        QuizSession::start(questions, mode, &mut self.rng, self.clock.now())
    }

    /// Grade the current question and save the bank if its wrong-set moved.
    ///
    /// # Errors
    ///
    /// Returns the grading errors of [`QuizSession::answer`]. Returns
    /// `SessionError::Persist` when the save fails; the answer is still
    /// recorded and available from [`QuizSession::current_feedback`].
    pub fn answer(
        &self,
        bank: &mut QuestionBank,
        session: &mut QuizSession,
        raw: &str,
    ) -> Result<AnswerFeedback, SessionError> {
        let feedback = session.answer(bank.repository_mut(), raw)?.clone();
        if feedback.wrong_set.is_mutation() {
            bank.persist().map_err(SessionError::Persist)?;
        }
        Ok(feedback)
    }

    /// Advance past the answered question, stamping the finish time.
    ///
    /// # Errors
    ///
    /// See [`QuizSession::next`].
    pub fn next(&self, session: &mut QuizSession) -> Result<SessionState, SessionError> {
        let state = session.next(self.clock.now())?;
        if state == SessionState::Finished {
            let summary = session.summary();
            info!(
                mode = %summary.mode,
                correct = summary.correct,
                incorrect = summary.incorrect,
                "session complete"
            );
        }
        Ok(state)
    }
}
