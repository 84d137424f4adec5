use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::debug;

use quiz_core::model::{AnswerLetter, OwnerList, Question, QuestionId, Repository, UnitPath};

use super::plan::{SessionMode, shuffle};
use super::progress::{SessionProgress, SessionSummary};
use crate::error::SessionError;

//
// ─── ANSWER FEEDBACK ───────────────────────────────────────────────────────────
//

/// What grading an answer did to the owning unit's wrong-set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WrongSetChange {
    Unchanged,
    Added(UnitPath),
    Removed(UnitPath),
    /// The question no longer exists in the bank; nothing was touched.
    Unresolved,
}

impl WrongSetChange {
    /// True when the bank was mutated and needs saving.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Added(_) | Self::Removed(_))
    }
}

/// Result of grading the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub question_id: QuestionId,
    pub correct: bool,
    pub chosen: AnswerLetter,
    pub correct_answer: AnswerLetter,
    pub explanation: String,
    pub wrong_set: WrongSetChange,
}

//
// ─── SESSION STATE ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active { index: usize, answered: bool },
    Finished,
}

/// One pass over a shuffled snapshot of questions.
///
/// The session holds its own copies; grading mutates the wrong-sets of the
/// repository passed to [`QuizSession::answer`], located by question id.
#[derive(Debug, Clone)]
pub struct QuizSession {
    mode: SessionMode,
    questions: Vec<Question>,
    current: usize,
    feedback: Option<AnswerFeedback>,
    results: Vec<AnswerFeedback>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Shuffle `questions` and start at the first one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyScope` if no questions are provided.
    pub fn start<R>(
        questions: Vec<Question>,
        mode: SessionMode,
        rng: &mut R,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError>
    where
        R: Rng + ?Sized,
    {
        if questions.is_empty() {
            return Err(SessionError::EmptyScope);
        }
        let questions = shuffle(questions, rng);
        debug!(%mode, total = questions.len(), "session started");
        Ok(Self {
            mode,
            questions,
            current: 0,
            feedback: None,
            results: Vec::new(),
            started_at,
            finished_at: None,
        })
    }

    #[must_use]
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Questions in presentation order.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn results(&self) -> &[AnswerFeedback] {
        &self.results
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.current < self.questions.len() {
            SessionState::Active {
                index: self.current,
                answered: self.feedback.is_some(),
            }
        } else {
            SessionState::Finished
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state() == SessionState::Finished
    }

    #[must_use]
    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    /// Feedback for the current question once it has been answered.
    #[must_use]
    pub fn current_feedback(&self) -> Option<&AnswerFeedback> {
        self.feedback.as_ref()
    }

    /// Grade `raw` against the current question and apply the wrong-set rule.
    ///
    /// # Errors
    ///
    /// - `SessionError::Finished` when there is no current question.
    /// - `SessionError::AlreadyAnswered` when the current question was graded.
    /// - `SessionError::InvalidAnswer` when `raw` is not one of A-D; nothing
    ///   is graded in that case.
    pub fn answer(
        &mut self,
        repo: &mut Repository,
        raw: &str,
    ) -> Result<&AnswerFeedback, SessionError> {
        let question = self.current().ok_or(SessionError::Finished)?;
        if self.feedback.is_some() {
            return Err(SessionError::AlreadyAnswered);
        }
        let chosen = AnswerLetter::parse(raw)?;
        let correct = question.is_correct(chosen);
        let question_id = question.id();
        let feedback = AnswerFeedback {
            question_id,
            correct,
            chosen,
            correct_answer: question.correct_answer(),
            explanation: question.explanation().to_owned(),
            wrong_set: apply_wrong_set_rule(repo, self.mode, question_id, correct),
        };
        debug!(
            index = self.current,
            correct,
            change = ?feedback.wrong_set,
            "question answered"
        );

        self.results.push(feedback.clone());
        Ok(self.feedback.insert(feedback))
    }

    /// Move past the answered current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finished` if nothing is left, or
    /// `SessionError::NotAnswered` if the current question is still open.
    pub fn next(&mut self, at: DateTime<Utc>) -> Result<SessionState, SessionError> {
        if self.is_finished() {
            return Err(SessionError::Finished);
        }
        if self.feedback.take().is_none() {
            return Err(SessionError::NotAnswered);
        }
        self.current += 1;
        if self.current >= self.questions.len() {
            self.finished_at = Some(at);
            debug!(answered = self.results.len(), "session finished");
        }
        Ok(self.state())
    }

    /// Drop the remaining questions. Wrong-set changes already made stay.
    pub fn reset(&mut self) {
        self.questions.clear();
        self.current = 0;
        self.feedback = None;
        debug!("session reset");
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.questions.len(),
            answered: self.results.len(),
            remaining: self.questions.len().saturating_sub(self.current),
            is_complete: self.is_finished(),
        }
    }

    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        let correct = self.results.iter().filter(|r| r.correct).count();
        SessionSummary {
            mode: self.mode,
            total: self.results.len().max(self.questions.len()),
            correct,
            incorrect: self.results.len() - correct,
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

/// Quiz misses join the owner's wrong-set; review hits leave it.
fn apply_wrong_set_rule(
    repo: &mut Repository,
    mode: SessionMode,
    id: QuestionId,
    correct: bool,
) -> WrongSetChange {
    let wanted = match (mode, correct) {
        (SessionMode::Quiz, false) => OwnerList::All,
        (SessionMode::Review, true) => OwnerList::Wrong,
        _ => return WrongSetChange::Unchanged,
    };
    let Some(location) = repo.locate_owner(id) else {
        return WrongSetChange::Unresolved;
    };
    if location.list != wanted {
        return WrongSetChange::Unchanged;
    }
    match mode {
        SessionMode::Quiz if repo.mark_wrong(id) => WrongSetChange::Added(location.path),
        SessionMode::Review if repo.clear_wrong(id) => WrongSetChange::Removed(location.path),
        _ => WrongSetChange::Unchanged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionDraft;
    use quiz_core::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn question(text: &str, answer: &str) -> Question {
        Question::from_draft(
            QuestionId::generate(),
            QuestionDraft {
                text: text.into(),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_answer: answer.into(),
                explanation: format!("because {text}"),
                source_tag: "Manual_Input".into(),
            },
        )
        .unwrap()
    }

    fn bank_with(questions: &[Question]) -> (Repository, UnitPath) {
        let mut repo = Repository::new();
        repo.create_subject("Math").unwrap();
        repo.create_category("Math", "Algebra").unwrap();
        repo.create_unit("Math", "Algebra", "U1").unwrap();
        let path = UnitPath::new("Math", "Algebra", "U1");
        repo.append_questions(&path, questions.to_vec()).unwrap();
        (repo, path)
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(1)
    }

    fn start(questions: Vec<Question>, mode: SessionMode) -> QuizSession {
        QuizSession::start(questions, mode, &mut rng(), fixed_now()).unwrap()
    }

    #[test]
    fn empty_start_is_rejected() {
        let err = QuizSession::start(Vec::new(), SessionMode::Quiz, &mut rng(), fixed_now())
            .unwrap_err();
        assert!(matches!(err, SessionError::EmptyScope));
    }

    #[test]
    fn quiz_miss_adds_to_wrong_set_once() {
        let q = question("1+1", "B");
        let (mut repo, path) = bank_with(std::slice::from_ref(&q));
        let mut session = start(vec![q.clone()], SessionMode::Quiz);

        let feedback = session.answer(&mut repo, "a").unwrap();
        assert!(!feedback.correct);
        assert_eq!(feedback.correct_answer, AnswerLetter::B);
        assert_eq!(feedback.explanation, "because 1+1");
        assert_eq!(feedback.wrong_set, WrongSetChange::Added(path.clone()));
        assert!(repo.unit(&path).unwrap().is_wrong(q.id()));

        let mut again = start(vec![q.clone()], SessionMode::Quiz);
        let feedback = again.answer(&mut repo, "C").unwrap();
        assert_eq!(feedback.wrong_set, WrongSetChange::Unchanged);
        assert_eq!(repo.unit(&path).unwrap().wrong_count(), 1);
    }

    #[test]
    fn quiz_hit_and_review_miss_leave_bank_alone() {
        let q = question("2+2", "D");
        let (mut repo, _) = bank_with(std::slice::from_ref(&q));
        let before = repo.clone();

        let mut quiz = start(vec![q.clone()], SessionMode::Quiz);
        assert!(quiz.answer(&mut repo, "d").unwrap().correct);
        assert_eq!(repo, before);

        let mut review = start(vec![q], SessionMode::Review);
        assert_eq!(review.answer(&mut repo, "A").unwrap().wrong_set, WrongSetChange::Unchanged);
        assert_eq!(repo, before);
    }

    #[test]
    fn review_hit_removes_from_wrong_set() {
        let q = question("3+3", "A");
        let (mut repo, path) = bank_with(std::slice::from_ref(&q));
        assert!(repo.mark_wrong(q.id()));

        let mut review = start(vec![q.clone()], SessionMode::Review);
        let feedback = review.answer(&mut repo, " a ").unwrap();

        assert_eq!(feedback.wrong_set, WrongSetChange::Removed(path.clone()));
        assert_eq!(repo.unit(&path).unwrap().wrong_count(), 0);
        assert_eq!(repo.unit(&path).unwrap().question_count(), 1);
    }

    #[test]
    fn missing_owner_is_skipped() {
        let q = question("orphan", "A");
        let mut repo = Repository::new();
        let mut session = start(vec![q], SessionMode::Quiz);

        let feedback = session.answer(&mut repo, "B").unwrap();
        assert_eq!(feedback.wrong_set, WrongSetChange::Unresolved);
        assert!(repo.is_empty());
    }

    #[test]
    fn invalid_letter_is_not_graded() {
        let q = question("x", "A");
        let (mut repo, _) = bank_with(std::slice::from_ref(&q));
        let mut session = start(vec![q], SessionMode::Quiz);

        let err = session.answer(&mut repo, "E").unwrap_err();
        assert!(matches!(err, SessionError::InvalidAnswer(_)));
        assert!(session.current_feedback().is_none());
        assert!(session.results().is_empty());
        assert_eq!(repo.wrong_count(), 0);
    }

    #[test]
    fn state_machine_transitions() {
        let qs = vec![question("a", "A"), question("b", "B")];
        let (mut repo, _) = bank_with(&qs);
        let mut session = start(qs, SessionMode::Quiz);

        assert_eq!(session.state(), SessionState::Active { index: 0, answered: false });
        assert!(matches!(session.next(fixed_now()), Err(SessionError::NotAnswered)));

        session.answer(&mut repo, "A").unwrap();
        assert!(matches!(session.answer(&mut repo, "A"), Err(SessionError::AlreadyAnswered)));
        assert_eq!(session.state(), SessionState::Active { index: 0, answered: true });
        assert_eq!(
            session.next(fixed_now()).unwrap(),
            SessionState::Active { index: 1, answered: false }
        );

        session.answer(&mut repo, "B").unwrap();
        assert_eq!(session.next(fixed_now()).unwrap(), SessionState::Finished);
        assert_eq!(session.finished_at(), Some(fixed_now()));
        assert!(matches!(session.answer(&mut repo, "A"), Err(SessionError::Finished)));
        assert!(matches!(session.next(fixed_now()), Err(SessionError::Finished)));

        let summary = session.summary();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.correct + summary.incorrect, 2);
        assert_eq!(
            session.progress(),
            SessionProgress { total: 2, answered: 2, remaining: 0, is_complete: true }
        );
    }

    #[test]
    fn reset_finishes_but_keeps_wrong_set() {
        let qs = vec![question("a", "A"), question("b", "A")];
        let (mut repo, _) = bank_with(&qs);
        let mut session = start(qs, SessionMode::Quiz);

        session.answer(&mut repo, "C").unwrap();
        session.reset();

        assert!(session.is_finished());
        assert!(session.current().is_none());
        assert!(session.questions().is_empty());
        assert_eq!(repo.wrong_count(), 1);
    }

    #[test]
    fn every_question_is_visited_once() {
        let qs: Vec<Question> = (0..10).map(|i| question(&format!("q{i}"), "A")).collect();
        let (mut repo, _) = bank_with(&qs);
        let mut session = start(qs.clone(), SessionMode::Quiz);

        let mut seen = Vec::new();
        while let Some(q) = session.current() {
            seen.push(q.id());
            session.answer(&mut repo, "A").unwrap();
            session.next(fixed_now()).unwrap();
        }

        let mut expected: Vec<QuestionId> = qs.iter().map(Question::id).collect();
        seen.sort_unstable();
        expected.sort_unstable();
        assert_eq!(seen, expected);
    }
}
