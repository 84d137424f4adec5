use crate::model::name::NodeName;
use crate::model::unit::Unit;

/// A named group of units inside a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: NodeName,
    units: Vec<Unit>,
}

impl Category {
    #[must_use]
    pub fn new(name: NodeName) -> Self {
        Self {
            name,
            units: Vec::new(),
        }
    }

    /// # Errors
    ///
    /// Returns the first repeated unit name.
    pub fn from_units(name: NodeName, units: Vec<Unit>) -> Result<Self, NodeName> {
        if let Some(dup) = first_duplicate(units.iter().map(Unit::name)) {
            return Err(dup.clone());
        }
        Ok(Self { name, units })
    }

    #[must_use]
    pub fn name(&self) -> &NodeName {
        &self.name
    }

    /// Units in creation order.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    #[must_use]
    pub fn unit(&self, name: &str) -> Option<&Unit> {
        self.units.iter().find(|u| *u.name() == name.trim())
    }

    pub(crate) fn unit_mut(&mut self, name: &str) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| *u.name() == name.trim())
    }

    pub(crate) fn units_mut(&mut self) -> &mut [Unit] {
        &mut self.units
    }

    /// Returns false when a unit with that name already exists.
    pub(crate) fn add_unit(&mut self, name: NodeName) -> bool {
        if self.unit(name.as_str()).is_some() {
            return false;
        }
        self.units.push(Unit::new(name));
        true
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.units.iter().map(Unit::question_count).sum()
    }

    #[must_use]
    pub fn wrong_count(&self) -> usize {
        self.units.iter().map(Unit::wrong_count).sum()
    }
}

/// Top level of the hierarchy, e.g. an exam or a school subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    name: NodeName,
    categories: Vec<Category>,
}

impl Subject {
    #[must_use]
    pub fn new(name: NodeName) -> Self {
        Self {
            name,
            categories: Vec::new(),
        }
    }

    /// # Errors
    ///
    /// Returns the first repeated category name.
    pub fn from_categories(name: NodeName, categories: Vec<Category>) -> Result<Self, NodeName> {
        if let Some(dup) = first_duplicate(categories.iter().map(Category::name)) {
            return Err(dup.clone());
        }
        Ok(Self { name, categories })
    }

    #[must_use]
    pub fn name(&self) -> &NodeName {
        &self.name
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    #[must_use]
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| *c.name() == name.trim())
    }

    pub(crate) fn category_mut(&mut self, name: &str) -> Option<&mut Category> {
        self.categories.iter_mut().find(|c| *c.name() == name.trim())
    }

    pub(crate) fn categories_mut(&mut self) -> &mut [Category] {
        &mut self.categories
    }

    pub(crate) fn add_category(&mut self, name: NodeName) -> bool {
        if self.category(name.as_str()).is_some() {
            return false;
        }
        self.categories.push(Category::new(name));
        true
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.categories.iter().map(Category::question_count).sum()
    }

    #[must_use]
    pub fn wrong_count(&self) -> usize {
        self.categories.iter().map(Category::wrong_count).sum()
    }
}

pub(crate) fn first_duplicate<'a>(
    names: impl Iterator<Item = &'a NodeName>,
) -> Option<&'a NodeName> {
    let mut seen: Vec<&NodeName> = Vec::new();
    for name in names {
        if seen.contains(&name) {
            return Some(name);
        }
        seen.push(name);
    }
    None
}
