use std::collections::HashSet;

use proptest::prelude::*;
use quiz_core::model::{Question, QuestionDraft, QuestionId, Repository, UnitPath};
use quiz_core::{ResolvedScope, Scope};

#[derive(Debug, Clone)]
enum Op {
    Subject(usize),
    Category(usize, usize),
    Unit(usize, usize, usize),
    Add(usize, usize, usize, bool),
}

const NAMES: [&str; 4] = ["Alpha", "Beta", " Alpha ", "Gamma"];

fn name(i: usize) -> &'static str {
    NAMES[i % NAMES.len()]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..4usize).prop_map(Op::Subject),
        (0..4usize, 0..4usize).prop_map(|(s, c)| Op::Category(s, c)),
        (0..4usize, 0..4usize, 0..4usize).prop_map(|(s, c, u)| Op::Unit(s, c, u)),
        (0..4usize, 0..4usize, 0..4usize, any::<bool>())
            .prop_map(|(s, c, u, w)| Op::Add(s, c, u, w)),
    ]
}

fn question(text: &str) -> Question {
    Question::from_draft(
        QuestionId::generate(),
        QuestionDraft {
            text: text.into(),
            options: vec!["1".into(), "2".into(), "3".into(), "4".into()],
            correct_answer: "A".into(),
            explanation: String::new(),
            source_tag: "Manual_Input".into(),
        },
    )
    .unwrap()
}

/// Apply ops, ignoring the ones the repository rejects.
fn build(ops: &[Op]) -> Repository {
    let mut repo = Repository::new();
    for (step, op) in ops.iter().enumerate() {
        match *op {
            Op::Subject(s) => {
                let _ = repo.create_subject(name(s));
            }
            Op::Category(s, c) => {
                let _ = repo.create_category(name(s).trim(), name(c));
            }
            Op::Unit(s, c, u) => {
                let _ = repo.create_unit(name(s).trim(), name(c).trim(), name(u));
            }
            Op::Add(s, c, u, wrong) => {
                let path = UnitPath::new(name(s).trim(), name(c).trim(), name(u).trim());
                let q = question(&format!("q{step}"));
                let id = q.id();
                if repo.append_questions(&path, vec![q]).is_ok() && wrong {
                    repo.mark_wrong(id);
                }
            }
        }
    }
    repo
}

fn assert_unique<'a>(names: impl Iterator<Item = &'a str>) -> Result<(), TestCaseError> {
    let mut seen = HashSet::new();
    for n in names {
        prop_assert!(seen.insert(n), "duplicate sibling name {n}");
    }
    Ok(())
}

proptest! {
    #[test]
    fn sibling_names_stay_unique(ops in prop::collection::vec(op(), 0..40)) {
        let repo = build(&ops);
        assert_unique(repo.subjects().iter().map(|s| s.name().as_str()))?;
        for subject in repo.subjects() {
            assert_unique(subject.categories().iter().map(|c| c.name().as_str()))?;
            for category in subject.categories() {
                assert_unique(category.units().iter().map(|u| u.name().as_str()))?;
            }
        }
    }

    #[test]
    fn category_scope_is_concatenation_of_its_units(ops in prop::collection::vec(op(), 0..60)) {
        let repo = build(&ops);
        for subject in repo.subjects() {
            for category in subject.categories() {
                let scope = Scope::subject(subject.name().as_str())
                    .with_category(category.name().as_str());
                let whole = repo.resolve(&scope);

                let mut pieces = ResolvedScope::default();
                for unit in category.units() {
                    let part = repo.resolve(&scope.clone().with_unit(unit.name().as_str()));
                    pieces.all.extend(part.all);
                    pieces.wrong.extend(part.wrong);
                }
                prop_assert_eq!(whole, pieces);
            }
        }
    }

    #[test]
    fn wrong_ids_always_resolve_to_owned_questions(ops in prop::collection::vec(op(), 0..60)) {
        let repo = build(&ops);
        let everything = repo.resolve(&Scope::everything());
        prop_assert_eq!(everything.all.len(), repo.question_count());
        prop_assert_eq!(everything.wrong.len(), repo.wrong_count());
        for q in &everything.wrong {
            prop_assert!(everything.all.iter().any(|a| a.id() == q.id()));
        }
    }
}
