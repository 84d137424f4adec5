//! Turning raw material into questions.
//!
//! Extraction is a collaborator behind [`QuestionExtractor`]; the
//! [`IngestService`] validates what it yields and appends it to a unit.

mod template;

use tracing::{debug, info};

use quiz_core::model::{Question, QuestionDraft, QuestionError, QuestionId, UnitPath};

use crate::bank_service::QuestionBank;
use crate::error::{ExtractionError, IngestError};

pub use template::TemplateExtractor;

/// Provenance tag used for typed-in text.
pub const MANUAL_SOURCE_TAG: &str = "Manual_Input";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionPayload {
    Text(String),
    Image(Vec<u8>),
}

/// One unit of raw material plus the name its questions are tagged with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionInput {
    pub source_tag: String,
    pub payload: ExtractionPayload,
}

impl ExtractionInput {
    #[must_use]
    pub fn text(source_tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source_tag: source_tag.into(),
            payload: ExtractionPayload::Text(text.into()),
        }
    }

    /// Typed-in text tagged [`MANUAL_SOURCE_TAG`].
    #[must_use]
    pub fn manual(text: impl Into<String>) -> Self {
        Self::text(MANUAL_SOURCE_TAG, text)
    }

    #[must_use]
    pub fn image(source_tag: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            source_tag: source_tag.into(),
            payload: ExtractionPayload::Image(bytes),
        }
    }
}

/// Produces question drafts from one input.
///
/// Implementations may call out to an external service. An input that holds
/// no recognizable question yields `Ok(vec![])`.
pub trait QuestionExtractor {
    /// # Errors
    ///
    /// Returns `ExtractionError` when the input cannot be processed.
    fn extract(&self, input: &ExtractionInput) -> Result<Vec<QuestionDraft>, ExtractionError>;
}

//
// ─── REPORT ────────────────────────────────────────────────────────────────────
//

/// What happened to one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    Extracted {
        accepted: usize,
        rejected: Vec<(usize, QuestionError)>,
    },
    Failed(ExtractionError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputReport {
    pub source_tag: String,
    pub outcome: InputOutcome,
}

impl InputReport {
    #[must_use]
    pub fn accepted(&self) -> usize {
        match &self.outcome {
            InputOutcome::Extracted { accepted, .. } => *accepted,
            InputOutcome::Failed(_) => 0,
        }
    }
}

/// Per-input outcomes plus the ids of every appended question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub inputs: Vec<InputReport>,
    pub added: Vec<QuestionId>,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Runs an extractor over a batch of inputs and files the results under one unit.
pub struct IngestService<E> {
    extractor: E,
}

impl<E: QuestionExtractor> IngestService<E> {
    #[must_use]
    pub fn new(extractor: E) -> Self {
        Self { extractor }
    }

    /// Extract every input, keep the valid drafts and append them in input
    /// order with a single save.
    ///
    /// A failing input or an invalid draft is reported and skipped; the rest
    /// of the batch continues. Every draft is re-tagged with its input's
    /// `source_tag`.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::Repository` if `path` does not name a unit (no
    /// extraction is attempted), or `IngestError::Bank` if the append or its
    /// save fails.
    pub fn ingest(
        &self,
        bank: &mut QuestionBank,
        path: &UnitPath,
        inputs: &[ExtractionInput],
    ) -> Result<IngestReport, IngestError> {
        bank.repository().unit(path)?;

        let mut report = IngestReport::default();
        let mut questions = Vec::new();
        for input in inputs {
            let outcome = match self.extractor.extract(input) {
                Ok(drafts) => {
                    let (accepted, rejected) = validate(drafts, &input.source_tag, &mut questions);
                    if accepted == 0 {
                        debug!(source = %input.source_tag, "no questions extracted");
                    }
                    InputOutcome::Extracted { accepted, rejected }
                }
                Err(err) => {
                    debug!(source = %input.source_tag, error = %err, "extraction failed");
                    InputOutcome::Failed(err)
                }
            };
            report.inputs.push(InputReport {
                source_tag: input.source_tag.clone(),
                outcome,
            });
        }

        report.added = bank.append_questions(path, questions)?;
        info!(unit = %path, inputs = inputs.len(), added = report.added.len(), "ingest finished");
        Ok(report)
    }
}

fn validate(
    drafts: Vec<QuestionDraft>,
    source_tag: &str,
    out: &mut Vec<Question>,
) -> (usize, Vec<(usize, QuestionError)>) {
    let mut accepted = 0;
    let mut rejected = Vec::new();
    for (index, mut draft) in drafts.into_iter().enumerate() {
        draft.source_tag = source_tag.to_owned();
        match Question::from_draft(QuestionId::generate(), draft) {
            Ok(question) => {
                out.push(question);
                accepted += 1;
            }
            Err(err) => rejected.push((index, err)),
        }
    }
    (accepted, rejected)
}
