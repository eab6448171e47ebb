//! Structural addressing inside the nested tree.
//!
//! A [`ListPath`] names one element list: the top level, an exclusive
//! branch's path, or a parallel branch. Each hop is a (gateway index, branch
//! index) pair relative to the list above it. Paths are computed against one
//! process value and resolved against a clone of it, so the hops stay valid.

use crate::{
    error::{BEFORE_XOR_AFTER, Error, Result},
    model::{Element, ExclusiveBranch, Process},
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct ListPath(Vec<(usize, usize)>);

impl ListPath {
    pub(crate) fn resolve_mut<'a>(
        &self,
        mut list: &'a mut Vec<Element>,
    ) -> Result<&'a mut Vec<Element>> {
        for (element, branch) in &self.0 {
            list = match list.get_mut(*element) {
                Some(Element::ExclusiveGateway { branches, .. }) => branches
                    .get_mut(*branch)
                    .map(|b| &mut b.path)
                    .ok_or_else(stale_path)?,
                Some(Element::ParallelGateway { branches, .. }) => branches
                    .get_mut(*branch)
                    .map(|b| &mut b.0)
                    .ok_or_else(stale_path)?,
                _ => return Err(stale_path()),
            };
        }
        Ok(list)
    }
}

/// Address of one exclusive branch: the list holding the gateway, the
/// gateway's index in it, and the branch's index on the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BranchPosition {
    pub(crate) list: ListPath,
    pub(crate) element: usize,
    pub(crate) branch: usize,
}

impl BranchPosition {
    pub(crate) fn resolve_mut<'a>(
        &self,
        root: &'a mut Vec<Element>,
    ) -> Result<&'a mut ExclusiveBranch> {
        match self.list.resolve_mut(root)?.get_mut(self.element) {
            Some(Element::ExclusiveGateway { branches, .. }) => {
                branches.get_mut(self.branch).ok_or_else(stale_path)
            }
            _ => Err(stale_path()),
        }
    }
}

fn stale_path() -> Error {
    Error::Structure("path no longer addresses a gateway branch".into())
}

/// Every element id in the tree, in walk order.
pub(crate) fn all_ids(list: &[Element]) -> Vec<String> {
    let mut ids = Vec::new();
    collect_ids(list, &mut ids);
    ids
}

fn collect_ids(list: &[Element], ids: &mut Vec<String>) {
    for element in list {
        ids.push(element.id().to_string());
        match element {
            Element::ExclusiveGateway { branches, .. } => {
                for branch in branches {
                    collect_ids(&branch.path, ids);
                }
            }
            Element::ParallelGateway { branches, .. } => {
                for branch in branches {
                    collect_ids(&branch.0, ids);
                }
            }
            _ => {}
        }
    }
}

/// Locate the insertion slot next to an anchor element. Exactly one of the
/// two ids must be given; `before` yields the anchor's own index, `after` the
/// index past it.
pub(crate) fn find_position(
    process: &Process,
    before_id: Option<&str>,
    after_id: Option<&str>,
) -> Result<(ListPath, usize)> {
    let (anchor, offset) = match (before_id, after_id) {
        (Some(id), None) => (id, 0),
        (None, Some(id)) => (id, 1),
        _ => return Err(Error::Proposal(BEFORE_XOR_AFTER.into())),
    };
    find_in_list(&process.elements, anchor, &mut Vec::new())
        .map(|(path, index)| (path, index + offset))
        .ok_or_else(|| Error::MissingElement(anchor.into()))
}

fn find_in_list(
    list: &[Element],
    anchor: &str,
    trail: &mut Vec<(usize, usize)>,
) -> Option<(ListPath, usize)> {
    for (i, element) in list.iter().enumerate() {
        if element.id() == anchor {
            return Some((ListPath(trail.clone()), i));
        }
        match element {
            Element::ExclusiveGateway { branches, .. } => {
                for (j, branch) in branches.iter().enumerate() {
                    trail.push((i, j));
                    if let Some(found) = find_in_list(&branch.path, anchor, trail) {
                        return Some(found);
                    }
                    trail.pop();
                }
            }
            Element::ParallelGateway { branches, .. } => {
                for (j, branch) in branches.iter().enumerate() {
                    trail.push((i, j));
                    if let Some(found) = find_in_list(&branch.0, anchor, trail) {
                        return Some(found);
                    }
                    trail.pop();
                }
            }
            _ => {}
        }
    }
    None
}

/// First branch whose condition matches exactly, searching nested gateways
/// depth-first in top-level-index order.
pub(crate) fn find_branch_position(process: &Process, condition: &str) -> Result<BranchPosition> {
    find_branch_in_list(&process.elements, condition, &mut Vec::new())
        .ok_or_else(|| Error::MissingBranch(condition.into()))
}

fn find_branch_in_list(
    list: &[Element],
    condition: &str,
    trail: &mut Vec<(usize, usize)>,
) -> Option<BranchPosition> {
    for (i, element) in list.iter().enumerate() {
        match element {
            Element::ExclusiveGateway { branches, .. } => {
                for (j, branch) in branches.iter().enumerate() {
                    if branch.condition == condition {
                        return Some(BranchPosition {
                            list: ListPath(trail.clone()),
                            element: i,
                            branch: j,
                        });
                    }
                }
                for (j, branch) in branches.iter().enumerate() {
                    trail.push((i, j));
                    if let Some(found) = find_branch_in_list(&branch.path, condition, trail) {
                        return Some(found);
                    }
                    trail.pop();
                }
            }
            Element::ParallelGateway { branches, .. } => {
                for (j, branch) in branches.iter().enumerate() {
                    trail.push((i, j));
                    if let Some(found) = find_branch_in_list(&branch.0, condition, trail) {
                        return Some(found);
                    }
                    trail.pop();
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested() -> Process {
        Process::from_json(
            r#"{"process":[
                {"type":"startEvent","id":"s1"},
                {"type":"exclusiveGateway","id":"g1","label":"OK?","has_join":true,"branches":[
                    {"condition":"yes","path":[
                        {"type":"task","id":"a","label":"A"},
                        {"type":"exclusiveGateway","id":"g2","label":"Deep?","has_join":false,"branches":[
                            {"condition":"left","path":[{"type":"task","id":"b","label":"B"}]},
                            {"condition":"right","path":[]}
                        ]}
                    ]},
                    {"condition":"no","path":[]}
                ]},
                {"type":"endEvent","id":"e1"}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn all_ids_walks_every_branch() {
        assert_eq!(nested().all_ids(), ["s1", "g1", "a", "g2", "b", "e1"]);
    }

    #[test]
    fn find_position_addresses_nested_lists() {
        let process = nested();

        let (path, index) = find_position(&process, Some("e1"), None).unwrap();
        assert_eq!(path, ListPath::default());
        assert_eq!(index, 2);

        let (path, index) = find_position(&process, None, Some("b")).unwrap();
        assert_eq!(path, ListPath(vec![(1, 0), (1, 0)]));
        assert_eq!(index, 1);

        let mut clone = process.clone();
        let list = path.resolve_mut(&mut clone.elements).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id(), "b");
    }

    #[test]
    fn find_position_requires_exactly_one_anchor() {
        let process = nested();
        assert!(matches!(
            find_position(&process, None, None),
            Err(Error::Proposal(_))
        ));
        assert!(matches!(
            find_position(&process, Some("a"), Some("b")),
            Err(Error::Proposal(_))
        ));
        assert!(matches!(
            find_position(&process, Some("ghost"), None),
            Err(Error::MissingElement(_))
        ));
    }

    #[test]
    fn find_branch_prefers_shallow_matches_in_order() {
        let process = nested();

        let position = find_branch_position(&process, "no").unwrap();
        assert_eq!(position.list, ListPath::default());
        assert_eq!((position.element, position.branch), (1, 1));

        let position = find_branch_position(&process, "left").unwrap();
        assert_eq!(position.list, ListPath(vec![(1, 0)]));
        assert_eq!((position.element, position.branch), (1, 0));

        let mut clone = process.clone();
        let branch = position.resolve_mut(&mut clone.elements).unwrap();
        assert_eq!(branch.condition, "left");

        assert!(matches!(
            find_branch_position(&process, "maybe"),
            Err(Error::MissingBranch(_))
        ));
    }
}
