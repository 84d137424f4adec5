//! Persisted shapes for the JSON store and their conversion to and from the
//! domain model.
//!
//! The file layout is `{subject: {category: {unit: {"all": [...], "wrong": [...]}}}}`
//! with questions stored in full in both lists. The `id` field is optional so
//! files written before ids existed still load.

use quiz_core::model::{
    Category, NodeKind, NodeName, Question, QuestionDraft, QuestionError, QuestionId, Repository,
    RepositoryError, Subject, Unit, UnitPath,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ordered::OrderedMap;
use crate::repository::LoadWarning;

#[derive(Debug, Error)]
pub(crate) enum RecordError {
    #[error("invalid {kind} name {raw:?}")]
    Name { kind: NodeKind, raw: String },

    #[error("{kind} {name:?} appears twice")]
    DuplicateName { kind: NodeKind, name: String },

    #[error("question #{index} in {path}: {source}")]
    Question {
        path: UnitPath,
        index: usize,
        #[source]
        source: QuestionError,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct QuestionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<QuestionId>,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub source_image: String,
}

impl QuestionRecord {
    pub(crate) fn from_question(question: &Question) -> Self {
        let draft = question.to_draft();
        Self {
            id: Some(question.id()),
            question: draft.text,
            options: draft.options,
            correct_answer: draft.correct_answer,
            explanation: draft.explanation,
            source_image: draft.source_tag,
        }
    }

    fn into_draft(self) -> QuestionDraft {
        QuestionDraft {
            text: self.question,
            options: self.options,
            correct_answer: self.correct_answer,
            explanation: self.explanation,
            source_tag: self.source_image,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub(crate) struct UnitRecord {
    #[serde(default)]
    pub all: Vec<QuestionRecord>,
    #[serde(default)]
    pub wrong: Vec<QuestionRecord>,
}

pub(crate) type CategoryRecord = OrderedMap<UnitRecord>;
pub(crate) type SubjectRecord = OrderedMap<CategoryRecord>;
pub(crate) type StoreRecord = OrderedMap<SubjectRecord>;

//
// ─── DOMAIN → RECORD ───────────────────────────────────────────────────────────
//

fn unit_record(unit: &Unit) -> UnitRecord {
    UnitRecord {
        all: unit
            .questions()
            .iter()
            .map(QuestionRecord::from_question)
            .collect(),
        wrong: unit
            .wrong_questions()
            .map(QuestionRecord::from_question)
            .collect(),
    }
}

pub(crate) fn store_record(repository: &Repository) -> StoreRecord {
    OrderedMap(
        repository
            .subjects()
            .iter()
            .map(|subject| {
                let categories = subject
                    .categories()
                    .iter()
                    .map(|category| {
                        let units = category
                            .units()
                            .iter()
                            .map(|unit| (unit.name().to_string(), unit_record(unit)))
                            .collect();
                        (category.name().to_string(), OrderedMap(units))
                    })
                    .collect();
                (subject.name().to_string(), OrderedMap(categories))
            })
            .collect(),
    )
}

//
// ─── RECORD → DOMAIN ───────────────────────────────────────────────────────────
//

fn node_name(kind: NodeKind, raw: String) -> Result<NodeName, RecordError> {
    NodeName::parse(raw.as_str()).map_err(|_| RecordError::Name { kind, raw })
}

/// Rebuild one unit. Wrong-set entries are matched by id first, then by
/// content against questions not yet marked; anything left over is dropped
/// and reported.
fn hydrate_unit(
    path: &UnitPath,
    name: NodeName,
    record: UnitRecord,
    warnings: &mut Vec<LoadWarning>,
) -> Result<Unit, RecordError> {
    let mut all = Vec::with_capacity(record.all.len());
    for (index, rec) in record.all.into_iter().enumerate() {
        let id = rec.id.unwrap_or_else(QuestionId::generate);
        let question = Question::from_draft(id, rec.into_draft()).map_err(|source| {
            RecordError::Question {
                path: path.clone(),
                index,
                source,
            }
        })?;
        all.push(question);
    }

    let mut wrong: Vec<QuestionId> = Vec::with_capacity(record.wrong.len());
    for rec in record.wrong {
        let by_id = rec
            .id
            .filter(|id| !wrong.contains(id) && all.iter().any(|q| q.id() == *id));
        let matched = by_id.or_else(|| {
            all.iter()
                .find(|q| {
                    q.matches_content(&rec.question, &rec.source_image) && !wrong.contains(&q.id())
                })
                .map(Question::id)
        });
        match matched {
            Some(id) => wrong.push(id),
            None => {
                tracing::debug!(
                    unit = %path,
                    question = %rec.question,
                    "dropping unmatched wrong-set entry"
                );
                warnings.push(LoadWarning::DroppedWrongEntry {
                    unit: path.to_string(),
                    question: rec.question,
                });
            }
        }
    }

    Unit::from_parts(name, all, wrong)
        .map_err(|err| RepositoryError::from_unit_parts(path.clone(), err).into())
}

pub(crate) fn hydrate(
    store: StoreRecord,
) -> Result<(Repository, Vec<LoadWarning>), RecordError> {
    let mut warnings = Vec::new();
    let mut subjects = Vec::with_capacity(store.0.len());

    for (subject_raw, categories_rec) in store.0 {
        let subject_name = node_name(NodeKind::Subject, subject_raw)?;
        let mut categories = Vec::with_capacity(categories_rec.0.len());

        for (category_raw, units_rec) in categories_rec.0 {
            let category_name = node_name(NodeKind::Category, category_raw)?;
            let mut units = Vec::with_capacity(units_rec.0.len());

            for (unit_raw, unit_rec) in units_rec.0 {
                let unit_name = node_name(NodeKind::Unit, unit_raw)?;
                let path = UnitPath::new(
                    subject_name.as_str(),
                    category_name.as_str(),
                    unit_name.as_str(),
                );
                units.push(hydrate_unit(&path, unit_name, unit_rec, &mut warnings)?);
            }

            let category = Category::from_units(category_name, units).map_err(|dup| {
                RecordError::DuplicateName {
                    kind: NodeKind::Unit,
                    name: dup.into(),
                }
            })?;
            categories.push(category);
        }

        let subject = Subject::from_categories(subject_name, categories).map_err(|dup| {
            RecordError::DuplicateName {
                kind: NodeKind::Category,
                name: dup.into(),
            }
        })?;
        subjects.push(subject);
    }

    Ok((Repository::from_subjects(subjects)?, warnings))
}
