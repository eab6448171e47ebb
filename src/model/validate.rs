use crate::{
    error::{AT_LEAST_TWO_BRANCHES, Error, ONLY_ONE_START_EVENT, Result},
    model::{Element, Process},
};
use std::collections::HashSet;

impl Process {
    /// Check the whole tree against the schema rules. Fails on the first
    /// violation with an error naming the offending element or branch; the
    /// process is never mutated.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for id in self.all_ids() {
            if !seen.insert(id.clone()) {
                return Err(Error::DuplicateId(id));
            }
        }

        let starts = self
            .elements
            .iter()
            .filter(|element| matches!(element, Element::StartEvent { .. }))
            .count();
        if starts != 1 {
            return Err(Error::Schema(ONLY_ONE_START_EVENT.into()));
        }

        for element in &self.elements {
            check(element, false)?;
        }
        check_next_refs(&self.elements, &seen)
    }
}

/// Schema-check a single element, recursing into its branches. Cross-tree
/// rules (id uniqueness, `next` targets) are the whole-tree validator's job.
pub fn validate_element(element: &Element) -> Result<()> {
    check(element, false)
}

fn check(element: &Element, nested: bool) -> Result<()> {
    if element.id().trim().is_empty() {
        return Err(Error::Schema(format!(
            "{} is missing an id",
            element.type_name()
        )));
    }
    match element {
        Element::Task { label, .. }
        | Element::UserTask { label, .. }
        | Element::ServiceTask { label, .. } => {
            if label.trim().is_empty() {
                return Err(Error::Schema(format!("{element} has an empty label")));
            }
        }
        Element::StartEvent { .. } if nested => {
            return Err(Error::Schema(ONLY_ONE_START_EVENT.into()));
        }
        Element::StartEvent { .. } | Element::EndEvent { .. } => {}
        Element::ExclusiveGateway {
            label, branches, ..
        } => {
            if label.trim().is_empty() {
                return Err(Error::Schema(format!("{element} has an empty label")));
            }
            if branches.len() < 2 {
                return Err(Error::Schema(format!("{element}: {AT_LEAST_TWO_BRANCHES}")));
            }
            for branch in branches {
                if branch.condition.trim().is_empty() {
                    return Err(Error::Schema(format!(
                        "{element} has a branch with an empty condition"
                    )));
                }
                for inner in &branch.path {
                    check(inner, true)?;
                }
            }
        }
        Element::ParallelGateway { branches, .. } => {
            if branches.len() < 2 {
                return Err(Error::Schema(format!("{element}: {AT_LEAST_TWO_BRANCHES}")));
            }
            for branch in branches {
                for inner in &branch.0 {
                    check(inner, true)?;
                }
            }
        }
    }
    Ok(())
}

fn check_next_refs(list: &[Element], ids: &HashSet<String>) -> Result<()> {
    for element in list {
        match element {
            Element::ExclusiveGateway { branches, .. } => {
                for branch in branches {
                    if let Some(next) = &branch.next
                        && !ids.contains(next.as_str())
                    {
                        return Err(Error::MissingElement(next.clone()));
                    }
                    check_next_refs(&branch.path, ids)?;
                }
            }
            Element::ParallelGateway { branches, .. } => {
                for branch in branches {
                    check_next_refs(&branch.0, ids)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}
