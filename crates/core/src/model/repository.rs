use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::name::{NameError, NodeName};
use crate::model::question::Question;
use crate::model::subject::{Category, Subject, first_duplicate};
use crate::model::unit::{Unit, UnitPartsError};

//
// ─── ADDRESSING ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Subject,
    Category,
    Unit,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Subject => "subject",
            NodeKind::Category => "category",
            NodeKind::Unit => "unit",
        })
    }
}

/// Full address of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitPath {
    pub subject: String,
    pub category: String,
    pub unit: String,
}

impl UnitPath {
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        category: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            category: category.into(),
            unit: unit.into(),
        }
    }
}

impl fmt::Display for UnitPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.subject, self.category, self.unit)
    }
}

/// Which of a unit's lists currently holds a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerList {
    /// Only in `all`.
    All,
    /// In `all` and currently in the wrong-set.
    Wrong,
}

/// Result of a reverse lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionLocation {
    pub path: UnitPath,
    pub list: OwnerList,
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RepositoryError {
    #[error("invalid {kind} name: {source}")]
    InvalidName {
        kind: NodeKind,
        #[source]
        source: NameError,
    },

    #[error("{kind} {name:?} already exists")]
    DuplicateName { kind: NodeKind, name: String },

    #[error("subject {0:?} not found")]
    SubjectNotFound(String),

    #[error("category {category:?} not found in subject {subject:?}")]
    CategoryNotFound { subject: String, category: String },

    #[error("unit not found: {0}")]
    UnitNotFound(UnitPath),

    #[error("question {0} is already stored")]
    DuplicateQuestionId(QuestionId),

    #[error("wrong-set of {path} references unknown question {id}")]
    WrongNotInAll { path: UnitPath, id: QuestionId },

    #[error("wrong-set of {path} lists question {id} twice")]
    DuplicateWrongEntry { path: UnitPath, id: QuestionId },
}

impl RepositoryError {
    pub fn from_unit_parts(path: UnitPath, err: UnitPartsError) -> Self {
        match err {
            UnitPartsError::WrongNotInAll(id) => Self::WrongNotInAll { path, id },
            UnitPartsError::DuplicateWrong(id) => Self::DuplicateWrongEntry { path, id },
            UnitPartsError::DuplicateQuestion(id) => Self::DuplicateQuestionId(id),
        }
    }
}

fn parse_name(kind: NodeKind, raw: &str) -> Result<NodeName, RepositoryError> {
    NodeName::parse(raw).map_err(|source| RepositoryError::InvalidName { kind, source })
}

//
// ─── REPOSITORY ────────────────────────────────────────────────────────────────
//

/// In-memory question bank: subjects → categories → units → questions.
///
/// Every level keeps creation order, and that order drives resolution and
/// reverse lookups.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Repository {
    subjects: Vec<Subject>,
}

impl Repository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository from fully assembled subjects, checking invariants.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DuplicateName` for repeated subject names and
    /// `RepositoryError::DuplicateQuestionId` when an id appears in more than
    /// one place.
    pub fn from_subjects(subjects: Vec<Subject>) -> Result<Self, RepositoryError> {
        if let Some(dup) = first_duplicate(subjects.iter().map(Subject::name)) {
            return Err(RepositoryError::DuplicateName {
                kind: NodeKind::Subject,
                name: dup.to_string(),
            });
        }

        let mut seen = HashSet::new();
        for subject in &subjects {
            for category in subject.categories() {
                for unit in category.units() {
                    for q in unit.questions() {
                        if !seen.insert(q.id()) {
                            return Err(RepositoryError::DuplicateQuestionId(q.id()));
                        }
                    }
                }
            }
        }

        Ok(Self { subjects })
    }

    #[must_use]
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// Lookup by name; surrounding whitespace is ignored, as on creation.
    #[must_use]
    pub fn subject(&self, name: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| *s.name() == name.trim())
    }

    fn subject_mut(&mut self, name: &str) -> Option<&mut Subject> {
        self.subjects.iter_mut().find(|s| *s.name() == name.trim())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::UnitNotFound` if any level of the path is missing.
    pub fn unit(&self, path: &UnitPath) -> Result<&Unit, RepositoryError> {
        self.subject(&path.subject)
            .and_then(|s| s.category(&path.category))
            .and_then(|c| c.unit(&path.unit))
            .ok_or_else(|| RepositoryError::UnitNotFound(path.clone()))
    }

    fn unit_mut(&mut self, path: &UnitPath) -> Result<&mut Unit, RepositoryError> {
        self.subject_mut(&path.subject)
            .and_then(|s| s.category_mut(&path.category))
            .and_then(|c| c.unit_mut(&path.unit))
            .ok_or_else(|| RepositoryError::UnitNotFound(path.clone()))
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.subjects.iter().map(Subject::question_count).sum()
    }

    #[must_use]
    pub fn wrong_count(&self) -> usize {
        self.subjects.iter().map(Subject::wrong_count).sum()
    }

    // ─── Creation ──────────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `RepositoryError::DuplicateName` if the subject exists, or
    /// `RepositoryError::InvalidName` for a blank name.
    pub fn create_subject(&mut self, name: &str) -> Result<(), RepositoryError> {
        let name = parse_name(NodeKind::Subject, name)?;
        if self.subject(name.as_str()).is_some() {
            return Err(RepositoryError::DuplicateName {
                kind: NodeKind::Subject,
                name: name.into(),
            });
        }
        self.subjects.push(Subject::new(name));
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::SubjectNotFound` for an unknown parent or
    /// `RepositoryError::DuplicateName` if the category exists.
    pub fn create_category(&mut self, subject: &str, name: &str) -> Result<(), RepositoryError> {
        let name = parse_name(NodeKind::Category, name)?;
        let parent = self
            .subject_mut(subject)
            .ok_or_else(|| RepositoryError::SubjectNotFound(subject.to_owned()))?;
        if !parent.add_category(name.clone()) {
            return Err(RepositoryError::DuplicateName {
                kind: NodeKind::Category,
                name: name.into(),
            });
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::SubjectNotFound` / `CategoryNotFound` for an
    /// unknown parent or `RepositoryError::DuplicateName` if the unit exists.
    pub fn create_unit(
        &mut self,
        subject: &str,
        category: &str,
        name: &str,
    ) -> Result<(), RepositoryError> {
        let name = parse_name(NodeKind::Unit, name)?;
        let parent_subject = self
            .subject_mut(subject)
            .ok_or_else(|| RepositoryError::SubjectNotFound(subject.to_owned()))?;
        let parent = parent_subject.category_mut(category).ok_or_else(|| {
            RepositoryError::CategoryNotFound {
                subject: subject.to_owned(),
                category: category.to_owned(),
            }
        })?;
        if !parent.add_unit(name.clone()) {
            return Err(RepositoryError::DuplicateName {
                kind: NodeKind::Unit,
                name: name.into(),
            });
        }
        Ok(())
    }

    /// Append questions to a unit's `all` list, keeping arrival order.
    ///
    /// Questions with identical content are accepted; a question whose id is
    /// already stored rejects the whole batch.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::UnitNotFound` or
    /// `RepositoryError::DuplicateQuestionId`.
    pub fn append_questions(
        &mut self,
        path: &UnitPath,
        questions: Vec<Question>,
    ) -> Result<Vec<QuestionId>, RepositoryError> {
        self.unit(path)?;
        let mut batch = HashSet::new();
        for q in &questions {
            if !batch.insert(q.id()) || self.locate_owner(q.id()).is_some() {
                return Err(RepositoryError::DuplicateQuestionId(q.id()));
            }
        }
        let ids = questions.iter().map(Question::id).collect();
        self.unit_mut(path)?.append(questions);
        Ok(ids)
    }

    // ─── Reverse lookup ────────────────────────────────────────────────────────

    fn owner_position(&self, id: QuestionId) -> Option<(usize, usize, usize)> {
        for (si, subject) in self.subjects.iter().enumerate() {
            for (ci, category) in subject.categories().iter().enumerate() {
                for (ui, unit) in category.units().iter().enumerate() {
                    if unit.contains(id) {
                        return Some((si, ci, ui));
                    }
                }
            }
        }
        None
    }

    fn location_at(&self, (si, ci, ui): (usize, usize, usize), id: QuestionId) -> QuestionLocation {
        let subject = &self.subjects[si];
        let category = &subject.categories()[ci];
        let unit = &category.units()[ui];
        QuestionLocation {
            path: UnitPath::new(
                subject.name().as_str(),
                category.name().as_str(),
                unit.name().as_str(),
            ),
            list: if unit.is_wrong(id) {
                OwnerList::Wrong
            } else {
                OwnerList::All
            },
        }
    }

    fn owning_unit_mut(&mut self, id: QuestionId) -> Option<&mut Unit> {
        let (si, ci, ui) = self.owner_position(id)?;
        self.subjects[si]
            .categories_mut()
            .get_mut(ci)?
            .units_mut()
            .get_mut(ui)
    }

    /// Find the unit that owns `id`, and whether it is currently in that
    /// unit's wrong-set.
    #[must_use]
    pub fn locate_owner(&self, id: QuestionId) -> Option<QuestionLocation> {
        self.owner_position(id).map(|pos| self.location_at(pos, id))
    }

    /// Content-equality lookup: the first unit, in subject/category/unit
    /// creation order, holding a question with this text and source tag.
    #[must_use]
    pub fn locate_by_content(&self, text: &str, source_tag: &str) -> Option<QuestionLocation> {
        self.subjects
            .iter()
            .flat_map(Subject::categories)
            .flat_map(Category::units)
            .flat_map(Unit::questions)
            .find(|q| q.matches_content(text, source_tag))
            .and_then(|q| self.locate_owner(q.id()))
    }

    // ─── Wrong-set ─────────────────────────────────────────────────────────────

    /// Add `id` to its owning unit's wrong-set. Returns false when the id is
    /// unknown or already marked.
    pub fn mark_wrong(&mut self, id: QuestionId) -> bool {
        self.owning_unit_mut(id).is_some_and(|unit| unit.mark_wrong(id))
    }

    /// Remove `id` from its owning unit's wrong-set. Returns false when the
    /// id is unknown or not marked.
    pub fn clear_wrong(&mut self, id: QuestionId) -> bool {
        self.owning_unit_mut(id).is_some_and(|unit| unit.clear_wrong(id))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::QuestionDraft;

    fn question(text: &str, source: &str) -> Question {
        Question::from_draft(
            QuestionId::generate(),
            QuestionDraft {
                text: text.into(),
                options: vec!["1".into(), "2".into(), "3".into(), "4".into()],
                correct_answer: "A".into(),
                explanation: String::new(),
                source_tag: source.into(),
            },
        )
        .unwrap()
    }

    fn math() -> Repository {
        let mut repo = Repository::new();
        repo.create_subject("Math").unwrap();
        repo.create_category("Math", "Algebra").unwrap();
        repo.create_unit("Math", "Algebra", "U1").unwrap();
        repo.create_unit("Math", "Algebra", "U2").unwrap();
        repo
    }

    #[test]
    fn duplicate_subject_is_rejected_without_change() {
        let mut repo = math();
        let before = repo.clone();
        let err = repo.create_subject("Math").unwrap_err();
        assert_eq!(
            err,
            RepositoryError::DuplicateName {
                kind: NodeKind::Subject,
                name: "Math".into()
            }
        );
        assert_eq!(repo, before);
    }

    #[test]
    fn duplicate_detection_uses_trimmed_names() {
        let mut repo = math();
        assert!(matches!(
            repo.create_category("Math", " Algebra "),
            Err(RepositoryError::DuplicateName { kind: NodeKind::Category, .. })
        ));
    }

    #[test]
    fn parent_lookups_ignore_surrounding_whitespace() {
        let mut repo = math();
        repo.create_category(" Math ", "Geometry").unwrap();
        repo.create_unit("Math\t", " Geometry", "Circles").unwrap();

        let padded = UnitPath::new(" Math", "Geometry ", " Circles ");
        let ids = repo.append_questions(&padded, vec![question("q", "src")]).unwrap();

        assert!(repo.unit(&padded).is_ok());
        assert_eq!(repo.subject(" Math ").map(|s| s.categories().len()), Some(2));
        assert!(repo.mark_wrong(ids[0]));
        assert_eq!(
            repo.resolve(&crate::Scope::subject(" Math ").with_unit("Circles ")).wrong.len(),
            1
        );
    }

    #[test]
    fn same_name_under_different_parents_is_fine() {
        let mut repo = math();
        repo.create_category("Math", "Geometry").unwrap();
        repo.create_unit("Math", "Geometry", "U1").unwrap();
        assert!(repo.unit(&UnitPath::new("Math", "Geometry", "U1")).is_ok());
    }

    #[test]
    fn create_under_missing_parent_fails() {
        let mut repo = Repository::new();
        assert_eq!(
            repo.create_category("Physics", "Optics").unwrap_err(),
            RepositoryError::SubjectNotFound("Physics".into())
        );
        repo.create_subject("Physics").unwrap();
        assert!(matches!(
            repo.create_unit("Physics", "Optics", "Lenses").unwrap_err(),
            RepositoryError::CategoryNotFound { .. }
        ));
    }

    #[test]
    fn blank_names_are_invalid() {
        let mut repo = Repository::new();
        assert!(matches!(
            repo.create_subject("  "),
            Err(RepositoryError::InvalidName { kind: NodeKind::Subject, .. })
        ));
        assert!(repo.is_empty());
    }

    #[test]
    fn append_keeps_order_and_allows_content_duplicates() {
        let mut repo = math();
        let path = UnitPath::new("Math", "Algebra", "U1");
        let ids = repo
            .append_questions(&path, vec![question("Q1", "s"), question("Q1", "s")])
            .unwrap();
        assert_eq!(ids.len(), 2);
        let unit = repo.unit(&path).unwrap();
        assert_eq!(unit.question_count(), 2);
        assert_eq!(unit.questions()[0].id(), ids[0]);
    }

    #[test]
    fn append_rejects_reused_id() {
        let mut repo = math();
        let q = question("Q1", "s");
        let path = UnitPath::new("Math", "Algebra", "U1");
        repo.append_questions(&path, vec![q.clone()]).unwrap();

        let other = UnitPath::new("Math", "Algebra", "U2");
        let err = repo.append_questions(&other, vec![q.clone()]).unwrap_err();
        assert_eq!(err, RepositoryError::DuplicateQuestionId(q.id()));
        assert_eq!(repo.unit(&other).unwrap().question_count(), 0);
    }

    #[test]
    fn append_to_missing_unit_fails() {
        let mut repo = math();
        let path = UnitPath::new("Math", "Algebra", "U9");
        assert!(matches!(
            repo.append_questions(&path, vec![question("Q", "s")]),
            Err(RepositoryError::UnitNotFound(_))
        ));
    }

    #[test]
    fn locate_owner_reports_list() {
        let mut repo = math();
        let path = UnitPath::new("Math", "Algebra", "U2");
        let q = question("Q", "s");
        let id = q.id();
        repo.append_questions(&path, vec![q]).unwrap();

        let loc = repo.locate_owner(id).unwrap();
        assert_eq!(loc.path, path);
        assert_eq!(loc.list, OwnerList::All);

        assert!(repo.mark_wrong(id));
        assert_eq!(repo.locate_owner(id).unwrap().list, OwnerList::Wrong);

        assert!(repo.clear_wrong(id));
        assert_eq!(repo.locate_owner(id).unwrap().list, OwnerList::All);
        assert!(repo.locate_owner(QuestionId::generate()).is_none());
    }

    #[test]
    fn locate_by_content_returns_first_in_creation_order() {
        let mut repo = math();
        let u1 = UnitPath::new("Math", "Algebra", "U1");
        let u2 = UnitPath::new("Math", "Algebra", "U2");
        repo.append_questions(&u2, vec![question("Same", "img")]).unwrap();
        repo.append_questions(&u1, vec![question("Same", "img")]).unwrap();

        for _ in 0..5 {
            assert_eq!(repo.locate_by_content("Same", "img").unwrap().path, u1);
        }
        assert!(repo.locate_by_content("Same", "other").is_none());
    }

    #[test]
    fn from_subjects_rejects_duplicate_ids_across_units() {
        let q = question("Q", "s");
        let u1 = Unit::from_parts(NodeName::parse("U1").unwrap(), vec![q.clone()], vec![]).unwrap();
        let u2 = Unit::from_parts(NodeName::parse("U2").unwrap(), vec![q.clone()], vec![]).unwrap();
        let cat = Category::from_units(NodeName::parse("C").unwrap(), vec![u1, u2]).unwrap();
        let subject = Subject::from_categories(NodeName::parse("S").unwrap(), vec![cat]).unwrap();

        assert_eq!(
            Repository::from_subjects(vec![subject]).unwrap_err(),
            RepositoryError::DuplicateQuestionId(q.id())
        );
    }

    #[test]
    fn counts_roll_up() {
        let mut repo = math();
        let path = UnitPath::new("Math", "Algebra", "U1");
        let ids = repo
            .append_questions(&path, vec![question("Q1", "s"), question("Q2", "s")])
            .unwrap();
        repo.mark_wrong(ids[1]);
        assert_eq!(repo.question_count(), 2);
        assert_eq!(repo.wrong_count(), 1);
        let subject = repo.subject("Math").unwrap();
        assert_eq!(subject.question_count(), 2);
        assert_eq!(subject.category("Algebra").unwrap().wrong_count(), 1);
    }
}
