//! Flat graph → nested tree.
//!
//! The walk starts at the start event and follows outgoing flows. At a
//! gateway it finds where the branches reconverge (the common branch
//! endpoint), rebuilds each branch bounded by that point, and folds a
//! trailing join gateway back into the fork that opened it. Only the flat
//! graph can be cyclic, so every walk terminates on the visited set.

use crate::{
    diagram::{ElementType, FlatElement, SequenceFlow},
    error::{Error, ONLY_ONE_START_EVENT, PARALLEL_WITHOUT_JOIN, Result},
    model::{Element, ExclusiveBranch, ParallelBranch, Process},
};
use log::{debug, warn};
use std::collections::{HashMap, HashSet, VecDeque};

pub(super) fn rebuild(elements: &[FlatElement], flows: &[SequenceFlow]) -> Result<Process> {
    let mut starts = elements
        .iter()
        .filter(|element| element.element_type == ElementType::StartEvent);
    let start = starts
        .next()
        .ok_or_else(|| Error::Structure(ONLY_ONE_START_EVENT.into()))?;
    if starts.next().is_some() {
        return Err(Error::Structure(ONLY_ONE_START_EVENT.into()));
    }

    let mut builder = TreeBuilder::new(elements, flows);
    let (list, _) = builder.walk(&start.id, None)?;
    Ok(Process::new(list))
}

struct TreeBuilder<'a> {
    elements: HashMap<&'a str, &'a FlatElement>,
    // Outgoing flows per element, in document order.
    outgoing: HashMap<&'a str, Vec<&'a SequenceFlow>>,
    visited: HashSet<String>,
}

impl<'a> TreeBuilder<'a> {
    fn new(elements: &'a [FlatElement], flows: &'a [SequenceFlow]) -> Self {
        let mut outgoing: HashMap<&'a str, Vec<&'a SequenceFlow>> = HashMap::new();
        for flow in flows {
            outgoing
                .entry(flow.source_ref.as_str())
                .or_default()
                .push(flow);
        }
        Self {
            elements: elements
                .iter()
                .map(|element| (element.id.as_str(), element))
                .collect(),
            outgoing,
            visited: HashSet::new(),
        }
    }

    // Walk forward from `start` until `stop`, the end of the path, or an
    // already-built node. In the last case the node's id is returned so the
    // caller can record the loop-back as a branch `next`.
    fn walk(&mut self, start: &str, stop: Option<&str>) -> Result<(Vec<Element>, Option<String>)> {
        let mut list = Vec::new();
        let mut current = Some(start.to_string());
        while let Some(id) = current.take() {
            if stop.is_some_and(|stop| stop == id) {
                break;
            }
            if !self.visited.insert(id.clone()) {
                return Ok((list, Some(id)));
            }
            let flat = self.element(&id)?;
            debug!("{} ({})", flat.element_type, flat.id);

            current = match flat.element_type {
                ElementType::Task => {
                    list.push(Element::Task {
                        id: id.clone(),
                        label: flat.label.clone().unwrap_or_default(),
                    });
                    self.single_target(&id)?
                }
                ElementType::UserTask => {
                    list.push(Element::UserTask {
                        id: id.clone(),
                        label: flat.label.clone().unwrap_or_default(),
                    });
                    self.single_target(&id)?
                }
                ElementType::ServiceTask => {
                    list.push(Element::ServiceTask {
                        id: id.clone(),
                        label: flat.label.clone().unwrap_or_default(),
                    });
                    self.single_target(&id)?
                }
                ElementType::StartEvent => {
                    list.push(Element::StartEvent {
                        id: id.clone(),
                        label: flat.label.clone(),
                    });
                    self.single_target(&id)?
                }
                ElementType::EndEvent => {
                    list.push(Element::EndEvent {
                        id: id.clone(),
                        label: flat.label.clone(),
                    });
                    self.single_target(&id)?
                }
                ElementType::ExclusiveGateway => {
                    let flows = self.branch_flows(&id)?;
                    let endpoint = self.common_endpoint(&flows);

                    // A reconverging exclusive gateway with at most one
                    // outgoing flow is the fork's own join; fold it back in.
                    // Zero outgoing flows means the join ends the process.
                    let (has_join, successor) = match endpoint.as_deref() {
                        Some(join) if self.is_join(join, ElementType::ExclusiveGateway) => {
                            self.visited.insert(join.to_string());
                            (true, self.single_target(join)?)
                        }
                        other => (false, other.map(str::to_string)),
                    };

                    let mut branches = Vec::new();
                    for (target, condition) in &flows {
                        let (path, next) = self.walk(target, endpoint.as_deref())?;
                        branches.push(ExclusiveBranch {
                            condition: condition.clone().unwrap_or_default(),
                            path,
                            next,
                        });
                    }
                    list.push(Element::ExclusiveGateway {
                        id: id.clone(),
                        label: flat.label.clone().unwrap_or_default(),
                        has_join,
                        branches,
                    });
                    successor
                }
                ElementType::ParallelGateway => {
                    let flows = self.branch_flows(&id)?;
                    let join = self
                        .common_endpoint(&flows)
                        .filter(|join| self.is_join(join, ElementType::ParallelGateway))
                        .ok_or_else(|| Error::Structure(PARALLEL_WITHOUT_JOIN.into()))?;
                    self.visited.insert(join.clone());
                    let successor = self.single_target(&join)?;

                    let mut branches = Vec::new();
                    for (target, _) in &flows {
                        let (path, dangling) = self.walk(target, Some(join.as_str()))?;
                        if let Some(dangling) = dangling {
                            // Parallel branches have no `next`; a loop-back
                            // here cannot be represented and is dropped.
                            warn!("parallel branch of {id} left dangling at {dangling}");
                        }
                        branches.push(ParallelBranch(path));
                    }
                    list.push(Element::ParallelGateway {
                        id: id.clone(),
                        branches,
                    });
                    successor
                }
            };
        }
        Ok((list, None))
    }

    fn element(&self, id: &str) -> Result<&'a FlatElement> {
        self.elements
            .get(id)
            .copied()
            .ok_or_else(|| Error::Structure(format!("flow references unknown element {id}")))
    }

    fn single_target(&self, id: &str) -> Result<Option<String>> {
        match self.outgoing.get(id).map(Vec::as_slice).unwrap_or_default() {
            [] => Ok(None),
            [flow] => Ok(Some(flow.target_ref.clone())),
            _ => Err(Error::Structure(format!(
                "{id} has more than one outgoing flow"
            ))),
        }
    }

    fn branch_flows(&self, id: &str) -> Result<Vec<(String, Option<String>)>> {
        let flows: Vec<_> = self
            .outgoing
            .get(id)
            .map(|flows| {
                flows
                    .iter()
                    .map(|flow| (flow.target_ref.clone(), flow.condition.clone()))
                    .collect()
            })
            .unwrap_or_default();
        if flows.len() < 2 {
            return Err(Error::Structure(format!(
                "gateway {id} has fewer than two outgoing flows"
            )));
        }
        Ok(flows)
    }

    // A join has at most one outgoing flow: one towards the gateway's
    // continuation, or none when the process ends on the join.
    fn is_join(&self, id: &str, gateway_type: ElementType) -> bool {
        self.elements
            .get(id)
            .is_some_and(|element| element.element_type == gateway_type)
            && self.outgoing.get(id).map_or(0, Vec::len) <= 1
    }

    // First id, in the breadth-first walk from the first branch, that every
    // other branch's walk also reaches. Each walk records a node once, so a
    // back-edge ends it without looping.
    fn common_endpoint(&self, flows: &[(String, Option<String>)]) -> Option<String> {
        let walks: Vec<Vec<String>> = flows
            .iter()
            .map(|(target, _)| self.breadth_first(target))
            .collect();
        let (first, rest) = walks.split_first()?;
        first
            .iter()
            .find(|id| rest.iter().all(|walk| walk.contains(*id)))
            .cloned()
    }

    fn breadth_first(&self, start: &str) -> Vec<String> {
        let mut order = Vec::new();
        let mut seen = HashSet::from([start.to_string()]);
        let mut queue = VecDeque::from([start.to_string()]);
        while let Some(id) = queue.pop_front() {
            if let Some(flows) = self.outgoing.get(id.as_str()) {
                for flow in flows {
                    if seen.insert(flow.target_ref.clone()) {
                        queue.push_back(flow.target_ref.clone());
                    }
                }
            }
            order.push(id);
        }
        order
    }
}
