use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

/// Number of options every question carries.
pub const OPTION_COUNT: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnswerError {
    #[error("answer must be one of A, B, C or D, got {0:?}")]
    Invalid(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("expected {OPTION_COUNT} options, got {0}")]
    OptionCount(usize),

    #[error("invalid correct answer: {0}")]
    CorrectAnswer(#[source] AnswerError),
}

//
// ─── ANSWER LETTER ─────────────────────────────────────────────────────────────
//

/// One of the four option labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnswerLetter {
    A,
    B,
    C,
    D,
}

impl AnswerLetter {
    pub const ALL: [AnswerLetter; OPTION_COUNT] = [Self::A, Self::B, Self::C, Self::D];

    /// Parses user or extractor input into a letter.
    ///
    /// Case-insensitive and whitespace-tolerant. A label with trailing text
    /// such as `"b."` or `"C. forty-two"` yields the letter before the dot.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::Invalid` when no single letter A-D can be read.
    pub fn parse(raw: &str) -> Result<Self, AnswerError> {
        let head = raw.split('.').next().unwrap_or_default().trim();
        let mut chars = head.chars();
        let letter = match (chars.next(), chars.next()) {
            (Some(c), None) => c.to_ascii_uppercase(),
            _ => return Err(AnswerError::Invalid(raw.to_owned())),
        };
        match letter {
            'A' => Ok(Self::A),
            'B' => Ok(Self::B),
            'C' => Ok(Self::C),
            'D' => Ok(Self::D),
            _ => Err(AnswerError::Invalid(raw.to_owned())),
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
            Self::D => 3,
        }
    }

    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
        }
    }
}

impl fmt::Display for AnswerLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for AnswerLetter {
    type Err = AnswerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// Unvalidated question as produced by an extractor or typed in by hand.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestionDraft {
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
    pub source_tag: String,
}

/// A validated multiple-choice question owned by exactly one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    text: String,
    options: [String; OPTION_COUNT],
    correct_answer: AnswerLetter,
    explanation: String,
    source_tag: String,
}

impl Question {
    /// Validate a draft and bind it to `id`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is blank, the option count is not
    /// four, or the correct answer is not a letter A-D.
    pub fn from_draft(id: QuestionId, draft: QuestionDraft) -> Result<Self, QuestionError> {
        if draft.text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        let count = draft.options.len();
        let options: [String; OPTION_COUNT] = draft
            .options
            .try_into()
            .map_err(|_| QuestionError::OptionCount(count))?;
        let correct_answer =
            AnswerLetter::parse(&draft.correct_answer).map_err(QuestionError::CorrectAnswer)?;

        Ok(Self {
            id,
            text: draft.text,
            options,
            correct_answer,
            explanation: draft.explanation,
            source_tag: draft.source_tag,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> AnswerLetter {
        self.correct_answer
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn source_tag(&self) -> &str {
        &self.source_tag
    }

    /// Content equality: same text and same source tag, ids ignored.
    #[must_use]
    pub fn same_content(&self, other: &Question) -> bool {
        self.matches_content(&other.text, &other.source_tag)
    }

    #[must_use]
    pub fn matches_content(&self, text: &str, source_tag: &str) -> bool {
        self.text == text && self.source_tag == source_tag
    }

    #[must_use]
    pub fn is_correct(&self, chosen: AnswerLetter) -> bool {
        self.correct_answer == chosen
    }

    /// Options re-labelled `A. …` through `D. …`.
    ///
    /// Extracted options often already carry their own label; it is stripped
    /// first so it does not appear twice.
    #[must_use]
    pub fn labeled_options(&self) -> [String; OPTION_COUNT] {
        std::array::from_fn(|i| {
            format!(
                "{}. {}",
                AnswerLetter::ALL[i],
                strip_option_label(&self.options[i])
            )
        })
    }

    /// Back to the id-less shape used for persistence and export.
    #[must_use]
    pub fn to_draft(&self) -> QuestionDraft {
        QuestionDraft {
            text: self.text.clone(),
            options: self.options.to_vec(),
            correct_answer: self.correct_answer.to_string(),
            explanation: self.explanation.clone(),
            source_tag: self.source_tag.clone(),
        }
    }
}

/// Strip a leading `A.` / `b)` / `C、` style label from option text.
#[must_use]
pub fn strip_option_label(option: &str) -> &str {
    let trimmed = option.trim_start();
    let mut chars = trimmed.char_indices();
    let Some((_, first)) = chars.next() else {
        return trimmed;
    };
    if !matches!(first.to_ascii_uppercase(), 'A'..='D') {
        return trimmed;
    }
    match chars.next() {
        Some((i, sep)) if matches!(sep, '.' | ')' | '、' | '．' | ':' | '：') => {
            trimmed[i + sep.len_utf8()..].trim_start()
        }
        _ => trimmed,
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
