use std::sync::Arc;

use tracing::{error, info};

use quiz_core::model::{Question, QuestionDraft, QuestionId, Repository, UnitPath};
use quiz_core::{ResolvedScope, Scope};
use storage::{LoadWarning, RepositoryStore, StorageError};

use crate::error::BankError;

/// The in-memory question bank paired with the store that backs it.
///
/// Every successful mutation is followed by a full save. A failed save keeps
/// the mutation in memory and surfaces as `BankError::Persist`.
pub struct QuestionBank {
    repository: Repository,
    store: Arc<dyn RepositoryStore>,
}

impl QuestionBank {
    /// Load the bank from `store`.
    ///
    /// Returns the warnings raised while loading (corrupt file, dropped legacy
    /// entries) so the caller can show them once.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Load` when the store cannot be read at all.
    pub fn open(store: Arc<dyn RepositoryStore>) -> Result<(Self, Vec<LoadWarning>), BankError> {
        let outcome = store.load().map_err(BankError::Load)?;
        info!(
            subjects = outcome.repository.subjects().len(),
            questions = outcome.repository.question_count(),
            warnings = outcome.warnings.len(),
            "question bank loaded"
        );
        Ok((
            Self {
                repository: outcome.repository,
                store,
            },
            outcome.warnings,
        ))
    }

    /// Wrap an existing repository without touching the store.
    #[must_use]
    pub fn new(repository: Repository, store: Arc<dyn RepositoryStore>) -> Self {
        Self { repository, store }
    }

    #[must_use]
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub(crate) fn repository_mut(&mut self) -> &mut Repository {
        &mut self.repository
    }

    #[must_use]
    pub fn resolve(&self, scope: &Scope) -> ResolvedScope {
        self.repository.resolve(scope)
    }

    /// Write the whole bank to the store.
    ///
    /// # Errors
    ///
    /// Returns the store's `StorageError`; the in-memory bank is unchanged.
    pub fn persist(&self) -> Result<(), StorageError> {
        self.store.save(&self.repository).inspect_err(|err| {
            error!(error = %err, "failed to save question bank");
        })
    }

    fn persist_change(&self) -> Result<(), BankError> {
        self.persist().map_err(BankError::Persist)
    }

    //
    // ─── STRUCTURE ─────────────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// Returns `BankError::Repository` on an invalid or duplicate name, or
    /// `BankError::Persist` when the save fails.
    pub fn create_subject(&mut self, name: &str) -> Result<(), BankError> {
        self.repository.create_subject(name)?;
        info!(subject = name.trim(), "subject created");
        self.persist_change()
    }

    /// # Errors
    ///
    /// Returns `BankError::Repository` on a missing parent, invalid or
    /// duplicate name, or `BankError::Persist` when the save fails.
    pub fn create_category(&mut self, subject: &str, name: &str) -> Result<(), BankError> {
        self.repository.create_category(subject, name)?;
        info!(subject, category = name.trim(), "category created");
        self.persist_change()
    }

    /// # Errors
    ///
    /// Returns `BankError::Repository` on a missing parent, invalid or
    /// duplicate name, or `BankError::Persist` when the save fails.
    pub fn create_unit(
        &mut self,
        subject: &str,
        category: &str,
        name: &str,
    ) -> Result<(), BankError> {
        self.repository.create_unit(subject, category, name)?;
        info!(subject, category, unit = name.trim(), "unit created");
        self.persist_change()
    }

    //
    // ─── QUESTIONS ─────────────────────────────────────────────────────────────
    //

    /// Append already validated questions to a unit and save once.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Repository` when the unit is missing or an id
    /// repeats, or `BankError::Persist` when the save fails.
    pub fn append_questions(
        &mut self,
        path: &UnitPath,
        questions: Vec<Question>,
    ) -> Result<Vec<QuestionId>, BankError> {
        if questions.is_empty() {
            self.repository.unit(path)?;
            return Ok(Vec::new());
        }
        let ids = self.repository.append_questions(path, questions)?;
        info!(unit = %path, added = ids.len(), "questions appended");
        self.persist_change()?;
        Ok(ids)
    }

    /// Validate drafts, assign fresh ids and append them.
    ///
    /// The batch is all-or-nothing: one invalid draft rejects every draft.
    ///
    /// # Errors
    ///
    /// Returns `BankError::InvalidDraft` for the first invalid draft, plus the
    /// errors of [`QuestionBank::append_questions`].
    pub fn add_drafts(
        &mut self,
        path: &UnitPath,
        drafts: Vec<QuestionDraft>,
    ) -> Result<Vec<QuestionId>, BankError> {
        let questions = drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| {
                Question::from_draft(QuestionId::generate(), draft)
                    .map_err(|source| BankError::InvalidDraft { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.append_questions(path, questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::RepositoryError;
    use storage::InMemoryStore;

    fn draft(text: &str) -> QuestionDraft {
        QuestionDraft {
            text: text.into(),
            options: vec!["1".into(), "2".into(), "3".into(), "4".into()],
            correct_answer: "B".into(),
            explanation: String::new(),
            source_tag: "Manual_Input".into(),
        }
    }

    fn open_bank() -> (QuestionBank, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let (bank, warnings) = QuestionBank::open(store.clone()).unwrap();
        assert!(warnings.is_empty());
        (bank, store)
    }

    #[test]
    fn every_create_is_saved() {
        let (mut bank, store) = open_bank();
        bank.create_subject("Math").unwrap();
        bank.create_category("Math", "Algebra").unwrap();
        bank.create_unit("Math", "Algebra", "U1").unwrap();

        assert_eq!(store.save_count(), 3);
        assert_eq!(store.snapshot().unwrap().as_ref(), Some(bank.repository()));
    }

    #[test]
    fn open_picks_up_stored_bank() {
        let mut stored = Repository::new();
        stored.create_subject("History").unwrap();
        let store = Arc::new(InMemoryStore::with_repository(stored.clone()));

        let (mut bank, warnings) = QuestionBank::open(store.clone()).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(bank.repository(), &stored);

        bank.create_category("History", "Modern").unwrap();
        let saved = store.snapshot().unwrap().unwrap();
        assert!(saved.subject("History").unwrap().category("Modern").is_some());
    }

    #[test]
    fn rejected_create_does_not_save() {
        let (mut bank, store) = open_bank();
        bank.create_subject("Math").unwrap();
        let err = bank.create_subject("Math").unwrap_err();

        assert!(matches!(
            err,
            BankError::Repository(RepositoryError::DuplicateName { .. })
        ));
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn failed_save_keeps_change_in_memory() {
        let (mut bank, store) = open_bank();
        store.fail_saves(true);

        let err = bank.create_subject("Math").unwrap_err();

        assert!(matches!(err, BankError::Persist(_)));
        assert!(bank.repository().subject("Math").is_some());
        assert_eq!(store.snapshot().unwrap(), None);
    }

    #[test]
    fn invalid_draft_rejects_whole_batch() {
        let (mut bank, store) = open_bank();
        bank.create_subject("Math").unwrap();
        bank.create_category("Math", "Algebra").unwrap();
        bank.create_unit("Math", "Algebra", "U1").unwrap();
        let path = UnitPath::new("Math", "Algebra", "U1");

        let mut bad = draft("bad");
        bad.options.pop();
        let err = bank.add_drafts(&path, vec![draft("ok"), bad]).unwrap_err();

        assert!(matches!(err, BankError::InvalidDraft { index: 1, .. }));
        assert_eq!(bank.repository().question_count(), 0);
        assert_eq!(store.save_count(), 3);
    }

    #[test]
    fn drafts_get_distinct_ids() {
        let (mut bank, _store) = open_bank();
        bank.create_subject("Math").unwrap();
        bank.create_category("Math", "Algebra").unwrap();
        bank.create_unit("Math", "Algebra", "U1").unwrap();
        let path = UnitPath::new("Math", "Algebra", "U1");

        let ids = bank.add_drafts(&path, vec![draft("same"), draft("same")]).unwrap();

        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        assert_eq!(bank.repository().unit(&path).unwrap().question_count(), 2);
    }

    #[test]
    fn appending_nothing_still_checks_the_unit() {
        let (mut bank, store) = open_bank();
        let path = UnitPath::new("Math", "Algebra", "U1");

        let err = bank.append_questions(&path, Vec::new()).unwrap_err();

        assert!(matches!(
            err,
            BankError::Repository(RepositoryError::UnitNotFound(_))
        ));
        assert_eq!(store.save_count(), 0);
    }
}
