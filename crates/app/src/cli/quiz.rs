use std::io::{BufRead, Write};

use anyhow::Context;
use services::{
    AnswerFeedback, QuestionBank, QuizSession, SessionError, SessionLoopService, WrongSetChange,
};

/// Drive `session` from line-based input until it finishes or the user quits.
///
/// `q` or end of input abandons the session; wrong-set changes already made
/// stay saved.
pub(super) fn run(
    svc: &SessionLoopService,
    bank: &mut QuestionBank,
    mut session: QuizSession,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let total = session.questions().len();
    writeln!(out, "{} session, {total} question(s)", session.mode())?;

    let mut line = String::new();
    while let Some(question) = session.current() {
        let position = total - session.progress().remaining + 1;
        writeln!(out)?;
        writeln!(out, "[{position}/{total}] {}", question.text())?;
        for option in question.labeled_options() {
            writeln!(out, "  {option}")?;
        }
        write!(out, "answer (A-D, q to quit): ")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 || line.trim().eq_ignore_ascii_case("q") {
            session.reset();
            writeln!(out)?;
            writeln!(out, "session abandoned")?;
            break;
        }

        let feedback = match svc.answer(bank, &mut session, &line) {
            Ok(feedback) => feedback,
            Err(SessionError::InvalidAnswer(_)) => {
                writeln!(out, "please answer with A, B, C or D")?;
                continue;
            }
            Err(SessionError::Persist(err)) => {
                writeln!(out, "warning: {err}")?;
                session
                    .current_feedback()
                    .cloned()
                    .context("answer was not recorded")?
            }
            Err(err) => return Err(err.into()),
        };
        print_feedback(&feedback, out)?;
        svc.next(&mut session)?;
    }

    let summary = session.summary();
    writeln!(out)?;
    writeln!(
        out,
        "score: {}/{} correct ({:.0}%)",
        summary.correct,
        summary.correct + summary.incorrect,
        summary.accuracy() * 100.0
    )?;
    Ok(())
}

fn print_feedback(feedback: &AnswerFeedback, out: &mut impl Write) -> std::io::Result<()> {
    if feedback.correct {
        writeln!(out, "correct")?;
    } else {
        writeln!(
            out,
            "wrong: you chose {}, the answer is {}",
            feedback.chosen, feedback.correct_answer
        )?;
    }
    if !feedback.explanation.is_empty() {
        writeln!(out, "explanation: {}", feedback.explanation)?;
    }
    match &feedback.wrong_set {
        WrongSetChange::Added(path) => writeln!(out, "added to wrong-set of {path}"),
        WrongSetChange::Removed(path) => writeln!(out, "removed from wrong-set of {path}"),
        WrongSetChange::Unchanged | WrongSetChange::Unresolved => Ok(()),
    }
}
