//! Structural edit operations.
//!
//! Every operation clones the process and mutates the clone, so callers keep
//! an untouched original. Elements are addressed by id and branches by their
//! exact condition text, wherever they sit in the tree.

mod prompt;
pub(crate) mod proposal;
pub(crate) mod session;

use crate::{
    error::{Error, Result},
    model::{Element, Process, path},
};

impl Process {
    /// Remove the element from its containing list. Nested elements of a
    /// removed gateway go with it; other branches are untouched.
    pub fn delete_element(&self, element_id: &str) -> Result<Process> {
        let (list_path, index) = path::find_position(self, Some(element_id), None)?;
        let mut edited = self.clone();
        list_path.resolve_mut(&mut edited.elements)?.remove(index);
        Ok(edited)
    }

    /// Point the first branch whose condition matches exactly at `next_id`.
    /// The target id is not checked here; callers validate the result.
    pub fn redirect_branch(&self, branch_condition: &str, next_id: &str) -> Result<Process> {
        let position = path::find_branch_position(self, branch_condition)?;
        let mut edited = self.clone();
        position.resolve_mut(&mut edited.elements)?.next = Some(next_id.into());
        Ok(edited)
    }

    /// Insert `element` next to the anchor, in the anchor's own list.
    /// Exactly one of `before_id` and `after_id` must be given.
    pub fn add_element(
        &self,
        element: Element,
        before_id: Option<&str>,
        after_id: Option<&str>,
    ) -> Result<Process> {
        if self.all_ids().iter().any(|id| id == element.id()) {
            return Err(Error::DuplicateId(element.id().into()));
        }
        let (list_path, index) = path::find_position(self, before_id, after_id)?;
        let mut edited = self.clone();
        list_path
            .resolve_mut(&mut edited.elements)?
            .insert(index, element);
        Ok(edited)
    }

    /// Delete the element, then re-insert the removed value next to the
    /// anchor. The anchor is located after the deletion.
    pub fn move_element(
        &self,
        element_id: &str,
        before_id: Option<&str>,
        after_id: Option<&str>,
    ) -> Result<Process> {
        let (list_path, index) = path::find_position(self, Some(element_id), None)?;
        let mut edited = self.clone();
        let element = list_path.resolve_mut(&mut edited.elements)?.remove(index);

        let (list_path, index) = path::find_position(&edited, before_id, after_id)?;
        list_path
            .resolve_mut(&mut edited.elements)?
            .insert(index, element);
        Ok(edited)
    }

    /// Replace the element carrying the same id. Gateways are refused;
    /// reshaping branches goes through add and delete instead.
    pub fn update_element(&self, new_element: Element) -> Result<Process> {
        if new_element.is_gateway() {
            return Err(Error::Proposal(format!(
                "update_element cannot replace {}; use add_element and delete_element",
                new_element.type_name()
            )));
        }
        let (list_path, index) = path::find_position(self, Some(new_element.id()), None)?;
        let mut edited = self.clone();
        list_path.resolve_mut(&mut edited.elements)?[index] = new_element;
        Ok(edited)
    }
}
