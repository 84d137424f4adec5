use crate::model::ids::QuestionId;
use crate::model::name::NodeName;
use crate::model::question::Question;

/// Leaf of the hierarchy: the questions themselves plus the wrong-set.
///
/// The wrong-set stores ids, never copies, so it can only ever point at
/// questions that live in `all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    name: NodeName,
    all: Vec<Question>,
    wrong: Vec<QuestionId>,
}

/// Why `Unit::from_parts` refused its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitPartsError {
    WrongNotInAll(QuestionId),
    DuplicateWrong(QuestionId),
    DuplicateQuestion(QuestionId),
}

impl Unit {
    #[must_use]
    pub fn new(name: NodeName) -> Self {
        Self {
            name,
            all: Vec::new(),
            wrong: Vec::new(),
        }
    }

    /// Rebuild a unit from persisted parts.
    ///
    /// # Errors
    ///
    /// Fails if an id in `wrong` is missing from `all`, or if any id repeats.
    pub fn from_parts(
        name: NodeName,
        all: Vec<Question>,
        wrong: Vec<QuestionId>,
    ) -> Result<Self, UnitPartsError> {
        for (i, q) in all.iter().enumerate() {
            if all[..i].iter().any(|other| other.id() == q.id()) {
                return Err(UnitPartsError::DuplicateQuestion(q.id()));
            }
        }
        for (i, id) in wrong.iter().enumerate() {
            if !all.iter().any(|q| q.id() == *id) {
                return Err(UnitPartsError::WrongNotInAll(*id));
            }
            if wrong[..i].contains(id) {
                return Err(UnitPartsError::DuplicateWrong(*id));
            }
        }
        Ok(Self { name, all, wrong })
    }

    #[must_use]
    pub fn name(&self) -> &NodeName {
        &self.name
    }

    /// Every question in arrival order.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.all
    }

    #[must_use]
    pub fn wrong_ids(&self) -> &[QuestionId] {
        &self.wrong
    }

    /// Wrong-set questions in the order they were marked.
    pub fn wrong_questions(&self) -> impl Iterator<Item = &Question> + '_ {
        self.wrong.iter().filter_map(|id| self.question(*id))
    }

    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.all.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.question(id).is_some()
    }

    #[must_use]
    pub fn is_wrong(&self, id: QuestionId) -> bool {
        self.wrong.contains(&id)
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.all.len()
    }

    #[must_use]
    pub fn wrong_count(&self) -> usize {
        self.wrong.len()
    }

    pub(crate) fn append(&mut self, questions: impl IntoIterator<Item = Question>) {
        self.all.extend(questions);
    }

    /// Returns true if the id was added.
    pub(crate) fn mark_wrong(&mut self, id: QuestionId) -> bool {
        if !self.contains(id) || self.is_wrong(id) {
            return false;
        }
        self.wrong.push(id);
        true
    }

    /// Returns true if the id was removed.
    pub(crate) fn clear_wrong(&mut self, id: QuestionId) -> bool {
        match self.wrong.iter().position(|w| *w == id) {
            Some(pos) => {
                self.wrong.remove(pos);
                true
            }
            None => false,
        }
    }
}
