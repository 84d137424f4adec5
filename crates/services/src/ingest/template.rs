use std::fmt;

use quiz_core::model::{AnswerLetter, OPTION_COUNT, QuestionDraft, strip_option_label};

use super::{ExtractionInput, ExtractionPayload, QuestionExtractor};
use crate::error::ExtractionError;

/// Offline extractor for the plain-text question template:
///
/// ```text
/// 題目1: What is 1 + 1?
/// 選項A: 1
/// 選項B: 2
/// 選項C: 3
/// 選項D: 4
/// 答案: B
/// 解析: Basic addition.
/// ---
/// 題目2: ...
/// ```
///
/// Keys accept an ASCII or full-width colon. Lines without a key continue
/// the previous field. Any malformed block fails the whole input.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateExtractor;

impl QuestionExtractor for TemplateExtractor {
    fn extract(&self, input: &ExtractionInput) -> Result<Vec<QuestionDraft>, ExtractionError> {
        let ExtractionPayload::Text(text) = &input.payload else {
            return Err(ExtractionError::Unsupported { kind: "image" });
        };
        split_blocks(text)
            .into_iter()
            .filter(|lines| lines.iter().any(|l| !l.trim().is_empty()))
            .enumerate()
            .map(|(i, lines)| parse_block(i + 1, &lines, &input.source_tag))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Text,
    Option(AnswerLetter),
    Answer,
    Explanation,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("題目"),
            Self::Option(letter) => write!(f, "選項{letter}"),
            Self::Answer => f.write_str("答案"),
            Self::Explanation => f.write_str("解析"),
        }
    }
}

#[derive(Debug, Default)]
struct BlockFields {
    text: Option<String>,
    options: [Option<String>; OPTION_COUNT],
    answer: Option<String>,
    explanation: Option<String>,
}

impl BlockFields {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Text => &mut self.text,
            Field::Option(letter) => &mut self.options[letter.index()],
            Field::Answer => &mut self.answer,
            Field::Explanation => &mut self.explanation,
        }
    }

    fn into_draft(self, block: usize, source_tag: &str) -> Result<QuestionDraft, ExtractionError> {
        let required = |value: Option<String>, field: Field| {
            value
                .filter(|v| !v.is_empty())
                .ok_or_else(|| malformed(block, format!("missing {field}")))
        };
        let mut options = Vec::with_capacity(OPTION_COUNT);
        for (letter, value) in AnswerLetter::ALL.into_iter().zip(self.options) {
            let value = required(value, Field::Option(letter))?;
            options.push(strip_option_label(&value).to_owned());
        }
        Ok(QuestionDraft {
            text: required(self.text, Field::Text)?,
            options,
            correct_answer: required(self.answer, Field::Answer)?,
            explanation: self.explanation.unwrap_or_default(),
            source_tag: source_tag.to_owned(),
        })
    }
}

fn malformed(block: usize, reason: impl Into<String>) -> ExtractionError {
    ExtractionError::Malformed {
        block,
        reason: reason.into(),
    }
}

fn is_separator(line: &str) -> bool {
    let line = line.trim();
    line.len() >= 3 && line.chars().all(|c| c == '-')
}

fn split_blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = vec![Vec::new()];
    for line in text.lines() {
        if is_separator(line) {
            blocks.push(Vec::new());
        } else if let Some(block) = blocks.last_mut() {
            block.push(line);
        }
    }
    blocks
}

/// `題目12: foo` -> `(Text, "foo")`.
fn parse_key(line: &str) -> Option<(Field, &str)> {
    let line = line.trim_start();
    let (field, rest) = if let Some(rest) = line.strip_prefix("題目") {
        (Field::Text, rest.trim_start_matches(|c: char| c.is_ascii_digit() || c.is_whitespace()))
    } else if let Some(rest) = line.strip_prefix("選項") {
        let rest = rest.trim_start();
        let head = rest.chars().next()?;
        let letter = AnswerLetter::parse(&head.to_string()).ok()?;
        (Field::Option(letter), &rest[head.len_utf8()..])
    } else if let Some(rest) = line.strip_prefix("答案") {
        (Field::Answer, rest)
    } else if let Some(rest) = line.strip_prefix("解析") {
        (Field::Explanation, rest)
    } else {
        return None;
    };
    let rest = rest.trim_start();
    let value = rest.strip_prefix(':').or_else(|| rest.strip_prefix('：'))?;
    Some((field, value.trim()))
}

fn parse_block(
    block: usize,
    lines: &[&str],
    source_tag: &str,
) -> Result<QuestionDraft, ExtractionError> {
    let mut fields = BlockFields::default();
    let mut current = None;
    for line in lines {
        if let Some((field, value)) = parse_key(line) {
            let slot = fields.slot(field);
            if slot.is_some() {
                return Err(malformed(block, format!("{field} given twice")));
            }
            *slot = Some(value.to_owned());
            current = Some(field);
            continue;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some(field) = current else {
            return Err(malformed(block, format!("unexpected line before any key: {line}")));
        };
        if let Some(value) = fields.slot(field) {
            if !value.is_empty() {
                value.push('\n');
            }
            value.push_str(line);
        }
    }
    fields.into_draft(block, source_tag)
}
