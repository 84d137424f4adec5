//! Scope resolution: turning a (subject, category, unit) selector into the
//! concrete question lists a session will run over.

use crate::model::{Category, Question, Repository, Subject, Unit, UnitPath};

/// Selector over the hierarchy. Every `Some` field must match; `None` matches
/// anything at that level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub subject: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
}

impl Scope {
    /// Matches the whole store.
    #[must_use]
    pub fn everything() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn subject(name: impl Into<String>) -> Self {
        Self {
            subject: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_category(mut self, name: impl Into<String>) -> Self {
        self.category = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_unit(mut self, name: impl Into<String>) -> Self {
        self.unit = Some(name.into());
        self
    }

    fn admits(selector: Option<&String>, name: &str) -> bool {
        selector.is_none_or(|s| s.trim() == name)
    }

    fn matches_subject(&self, subject: &Subject) -> bool {
        Self::admits(self.subject.as_ref(), subject.name().as_str())
    }

    fn matches_category(&self, category: &Category) -> bool {
        Self::admits(self.category.as_ref(), category.name().as_str())
    }

    fn matches_unit(&self, unit: &Unit) -> bool {
        Self::admits(self.unit.as_ref(), unit.name().as_str())
    }
}

impl From<&UnitPath> for Scope {
    fn from(path: &UnitPath) -> Self {
        Scope::subject(path.subject.clone())
            .with_category(path.category.clone())
            .with_unit(path.unit.clone())
    }
}

/// Snapshot of the questions a scope covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedScope {
    pub all: Vec<Question>,
    pub wrong: Vec<Question>,
}

impl ResolvedScope {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

impl Repository {
    /// Units matching `scope`, in subject, category, unit creation order.
    pub fn units_in<'a>(&'a self, scope: &'a Scope) -> impl Iterator<Item = &'a Unit> + 'a {
        self.subjects()
            .iter()
            .filter(move |s| scope.matches_subject(s))
            .flat_map(move |s| {
                s.categories()
                    .iter()
                    .filter(move |c| scope.matches_category(c))
            })
            .flat_map(move |c| c.units().iter().filter(move |u| scope.matches_unit(u)))
    }

    /// Concatenate `all` and `wrong` of every unit the scope matches.
    ///
    /// Unknown names simply match nothing.
    #[must_use]
    pub fn resolve(&self, scope: &Scope) -> ResolvedScope {
        let mut resolved = ResolvedScope::default();
        for unit in self.units_in(scope) {
            resolved.all.extend(unit.questions().iter().cloned());
            resolved.wrong.extend(unit.wrong_questions().cloned());
        }
        resolved
    }
}
