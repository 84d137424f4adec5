use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::ArgAction;
use quiz_core::Scope;
use quiz_core::model::{Repository, UnitPath};
use services::{
    Clock, ExtractionInput, IngestService, InputOutcome, QuestionBank, SessionError,
    SessionLoopService, SessionMode, TemplateExtractor,
};
use storage::{DEFAULT_STORE_FILE, JsonFileStore};
use tracing::instrument;

mod quiz;

#[derive(Debug, clap::Parser)]
#[command(version, about = "Personal multiple-choice question bank")]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The JSON file holding the question bank
    #[arg(long, env = "QUIZBANK_STORE", default_value = DEFAULT_STORE_FILE, global = true)]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let mut bank = open_bank(&self.store, &mut io::stderr())?;
        let stdout = io::stdout();
        self.command.run(&mut bank, &mut stdout.lock())
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

/// Load warnings are reported here only; storage logs them at debug level.
fn open_bank(path: &Path, notes: &mut impl Write) -> anyhow::Result<QuestionBank> {
    let (bank, warnings) = QuestionBank::open(Arc::new(JsonFileStore::new(path)))
        .with_context(|| format!("failed to open {}", path.display()))?;
    for warning in warnings {
        writeln!(notes, "note: {warning}")?;
    }
    Ok(bank)
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// List subjects, categories and units with question counts
    Subjects,

    /// Create a subject
    AddSubject { name: String },

    /// Create a category under a subject
    AddCategory { subject: String, name: String },

    /// Create a unit under a category
    AddUnit {
        subject: String,
        category: String,
        name: String,
    },

    /// Import questions written in the text template into a unit
    ///
    /// Blocks are separated by a line of dashes and use the keys
    /// 題目, 選項A-選項D, 答案 and 解析.
    Import(Import),

    /// Run an interactive quiz or wrong-set review on stdin
    Quiz(Quiz),
}

impl Command {
    fn run(self, bank: &mut QuestionBank, out: &mut impl Write) -> anyhow::Result<()> {
        match self {
            Self::Subjects => print_tree(bank.repository(), out)?,
            Self::AddSubject { name } => {
                bank.create_subject(&name)?;
                writeln!(out, "created subject {}", name.trim())?;
            }
            Self::AddCategory { subject, name } => {
                bank.create_category(&subject, &name)?;
                writeln!(out, "created category {} / {}", subject, name.trim())?;
            }
            Self::AddUnit {
                subject,
                category,
                name,
            } => {
                bank.create_unit(&subject, &category, &name)?;
                writeln!(out, "created unit {subject} / {category} / {}", name.trim())?;
            }
            Self::Import(command) => command.run(bank, out)?,
            Self::Quiz(command) => command.run(bank, out)?,
        }
        Ok(())
    }
}

fn print_tree(repo: &Repository, out: &mut impl Write) -> io::Result<()> {
    if repo.is_empty() {
        return writeln!(out, "no subjects yet; start with `add-subject`");
    }
    for subject in repo.subjects() {
        writeln!(
            out,
            "{} ({} questions, {} wrong)",
            subject.name(),
            subject.question_count(),
            subject.wrong_count()
        )?;
        for category in subject.categories() {
            writeln!(
                out,
                "  {} ({} questions, {} wrong)",
                category.name(),
                category.question_count(),
                category.wrong_count()
            )?;
            for unit in category.units() {
                writeln!(
                    out,
                    "    {} ({} questions, {} wrong)",
                    unit.name(),
                    unit.question_count(),
                    unit.wrong_count()
                )?;
            }
        }
    }
    Ok(())
}

#[derive(Debug, clap::Parser)]
pub struct Import {
    subject: String,
    category: String,
    unit: String,

    /// Text file in the question template
    file: PathBuf,

    /// Provenance tag stored on each question (defaults to the file name)
    #[arg(long)]
    source: Option<String>,
}

impl Import {
    #[instrument(skip_all, fields(file = %self.file.display()))]
    fn run(self, bank: &mut QuestionBank, out: &mut impl Write) -> anyhow::Result<()> {
        let text = std::fs::read_to_string(&self.file)
            .with_context(|| format!("failed to read {}", self.file.display()))?;
        let source = self.source.unwrap_or_else(|| {
            self.file.file_name().map_or_else(
                || self.file.display().to_string(),
                |n| n.to_string_lossy().into_owned(),
            )
        });
        let path = UnitPath::new(self.subject, self.category, self.unit);

        let report = IngestService::new(TemplateExtractor).ingest(
            bank,
            &path,
            &[ExtractionInput::text(source, text)],
        )?;

        for input in &report.inputs {
            match &input.outcome {
                InputOutcome::Extracted { accepted, rejected } => {
                    writeln!(out, "{}: {accepted} question(s) extracted", input.source_tag)?;
                    for (index, err) in rejected {
                        writeln!(out, "  skipped question #{}: {err}", index + 1)?;
                    }
                }
                InputOutcome::Failed(err) => {
                    writeln!(out, "{}: nothing extracted ({err})", input.source_tag)?;
                }
            }
        }
        let total = bank.repository().unit(&path)?.question_count();
        writeln!(out, "added {} to {path}, {total} in unit", report.added.len())?;
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Quiz {
    subject: Option<String>,
    category: Option<String>,
    unit: Option<String>,

    /// Review the wrong-set instead of quizzing every question
    #[arg(long)]
    review: bool,

    /// Seed for a reproducible question order
    #[arg(long)]
    seed: Option<u64>,
}

impl Quiz {
    fn scope(&self) -> Scope {
        Scope {
            subject: self.subject.clone(),
            category: self.category.clone(),
            unit: self.unit.clone(),
        }
    }

    fn run(self, bank: &mut QuestionBank, out: &mut impl Write) -> anyhow::Result<()> {
        let mode = if self.review {
            SessionMode::Review
        } else {
            SessionMode::Quiz
        };
        let mut svc = match self.seed {
            Some(seed) => SessionLoopService::with_seed(Clock::default(), seed),
            None => SessionLoopService::new(Clock::default()),
        };

        let session = match svc.start(bank, &self.scope(), mode) {
            Ok(session) => session,
            Err(SessionError::EmptyScope) => {
                writeln!(out, "no questions in this scope for {mode}")?;
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let stdin = io::stdin();
        quiz::run(&svc, bank, session, &mut stdin.lock(), out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn corrupt_store_is_reported_once() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("bank.json");
        std::fs::write(&file, "{ not json").unwrap();
        let mut notes = Vec::new();

        let bank = open_bank(&file, &mut notes).unwrap();

        let notes = String::from_utf8(notes).unwrap();
        assert!(bank.repository().is_empty());
        assert_eq!(notes.lines().count(), 1);
        assert!(notes.starts_with("note: "));
        assert!(notes.contains("bank.json.corrupt"));
    }

    #[test]
    fn subjects_listing_shows_counts() {
        let mut repo = Repository::new();
        repo.create_subject("Math").unwrap();
        repo.create_category("Math", "Algebra").unwrap();
        repo.create_unit("Math", "Algebra", "U1").unwrap();
        let mut out = Vec::new();

        print_tree(&repo, &mut out).unwrap();

        let listing = String::from_utf8(out).unwrap();
        assert_eq!(
            listing.lines().collect::<Vec<_>>(),
            vec![
                "Math (0 questions, 0 wrong)",
                "  Algebra (0 questions, 0 wrong)",
                "    U1 (0 questions, 0 wrong)",
            ]
        );
    }
}
