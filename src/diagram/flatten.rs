//! Hierarchical → flat. Gateways unfold into synthetic `-join` elements and
//! condition-labelled flows; everything else becomes one element plus the
//! flow to its successor.

use crate::{
    diagram::{ElementType, FlatElement, SequenceFlow, wire_flows},
    model::{Element, Process},
};

/// Flatten the tree into elements and sequence flows suitable for XML
/// emission. Deterministic: the same process always yields identical lists.
pub fn flatten(process: &Process) -> (Vec<FlatElement>, Vec<SequenceFlow>) {
    let mut flattener = Flattener::default();
    flattener.walk(&process.elements, None);
    let Flattener {
        mut elements,
        flows,
    } = flattener;
    wire_flows(&mut elements, &flows);
    (elements, flows)
}

#[derive(Default)]
struct Flattener {
    elements: Vec<FlatElement>,
    flows: Vec<SequenceFlow>,
}

impl Flattener {
    // parent_next_id is the id the last element of the list flows into.
    fn walk(&mut self, list: &[Element], parent_next_id: Option<&str>) {
        for (i, element) in list.iter().enumerate() {
            let next_in_list = list.get(i + 1).map(Element::id).or(parent_next_id);
            match element {
                Element::Task { id, label } => {
                    self.leaf(id, ElementType::Task, Some(label.clone()), next_in_list);
                }
                Element::UserTask { id, label } => {
                    self.leaf(id, ElementType::UserTask, Some(label.clone()), next_in_list);
                }
                Element::ServiceTask { id, label } => {
                    self.leaf(id, ElementType::ServiceTask, Some(label.clone()), next_in_list);
                }
                Element::StartEvent { id, label } => {
                    self.leaf(id, ElementType::StartEvent, label.clone(), next_in_list);
                }
                Element::EndEvent { id, label } => {
                    // End events terminate their path: no outgoing flow.
                    self.elements.push(FlatElement::new(
                        id.as_str(),
                        ElementType::EndEvent,
                        label.clone(),
                    ));
                }
                Element::ExclusiveGateway {
                    id,
                    label,
                    has_join,
                    branches,
                } => {
                    self.elements.push(FlatElement::new(
                        id.as_str(),
                        ElementType::ExclusiveGateway,
                        Some(label.clone()),
                    ));
                    let join_id = has_join.then(|| format!("{id}-join"));
                    if let Some(join) = &join_id {
                        self.elements.push(FlatElement::new(
                            join.as_str(),
                            ElementType::ExclusiveGateway,
                            None,
                        ));
                    }
                    for branch in branches {
                        let branch_target = branch
                            .next
                            .as_deref()
                            .or(join_id.as_deref())
                            .or(next_in_list);
                        if branch.path.is_empty() {
                            if let Some(target) = branch_target {
                                self.push_flow(id, target, Some(branch.condition.as_str()));
                            }
                        } else {
                            let mut sub = Flattener::default();
                            sub.walk(&branch.path, branch_target);
                            self.splice(sub);
                            self.push_flow(
                                id,
                                branch.path[0].id(),
                                Some(branch.condition.as_str()),
                            );
                        }
                    }
                    if let Some(join) = &join_id
                        && let Some(next) = next_in_list
                    {
                        self.push_flow(join, next, None);
                    }
                }
                Element::ParallelGateway { id, branches } => {
                    self.elements.push(FlatElement::new(
                        id.as_str(),
                        ElementType::ParallelGateway,
                        None,
                    ));
                    let join_id = format!("{id}-join");
                    self.elements.push(FlatElement::new(
                        join_id.as_str(),
                        ElementType::ParallelGateway,
                        None,
                    ));
                    for branch in branches {
                        let mut sub = Flattener::default();
                        sub.walk(&branch.0, Some(join_id.as_str()));
                        self.splice(sub);
                        match branch.0.first() {
                            Some(first) => self.push_flow(id, first.id(), None),
                            // Degenerate empty branch: fork straight into the join.
                            None => self.push_flow(id, &join_id, None),
                        }
                    }
                    if let Some(next) = next_in_list {
                        self.push_flow(&join_id, next, None);
                    }
                }
            }
        }
    }

    fn leaf(
        &mut self,
        id: &str,
        element_type: ElementType,
        label: Option<String>,
        next_in_list: Option<&str>,
    ) {
        self.elements
            .push(FlatElement::new(id, element_type, label));
        if let Some(next) = next_in_list {
            self.push_flow(id, next, None);
        }
    }

    // One flow per (source, target) pair; the first emission wins. The flow
    // id is always "<source>-<target>".
    fn push_flow(&mut self, source: &str, target: &str, condition: Option<&str>) {
        if self.has_flow(source, target) {
            return;
        }
        self.flows.push(SequenceFlow {
            id: format!("{source}-{target}"),
            source_ref: source.into(),
            target_ref: target.into(),
            condition: condition.map(Into::into),
        });
    }

    fn has_flow(&self, source: &str, target: &str) -> bool {
        self.flows
            .iter()
            .any(|flow| flow.source_ref == source && flow.target_ref == target)
    }

    // Branches flatten in a fresh state, then merge into the parent. Flow
    // dedup is re-checked here so parent and child emissions compose.
    fn splice(&mut self, sub: Flattener) {
        self.elements.extend(sub.elements);
        for flow in sub.flows {
            if !self.has_flow(&flow.source_ref, &flow.target_ref) {
                self.flows.push(flow);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Process;

    fn flow_pairs(flows: &[SequenceFlow]) -> Vec<(&str, &str)> {
        flows
            .iter()
            .map(|flow| (flow.source_ref.as_str(), flow.target_ref.as_str()))
            .collect()
    }

    #[test]
    fn minimal_linear_process() {
        let process = Process::from_json(
            r#"{"process":[
                {"type":"startEvent","id":"s1"},
                {"type":"task","id":"t1","label":"Do it"},
                {"type":"endEvent","id":"e1"}
            ]}"#,
        )
        .unwrap();
        let (elements, flows) = flatten(&process);

        let ids: Vec<_> = elements.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["s1", "t1", "e1"]);
        assert_eq!(flow_pairs(&flows), [("s1", "t1"), ("t1", "e1")]);
        assert_eq!(flows[0].id, "s1-t1");
        assert_eq!(flows[1].id, "t1-e1");

        assert_eq!(elements[1].incoming, ["s1-t1"]);
        assert_eq!(elements[1].outgoing, ["t1-e1"]);
        assert!(elements[2].outgoing.is_empty());
    }

    #[test]
    fn exclusive_gateway_with_join() {
        let process = Process::from_json(
            r#"{"process":[
                {"type":"startEvent","id":"s1"},
                {"type":"exclusiveGateway","id":"g1","label":"OK?","has_join":true,"branches":[
                    {"condition":"yes","path":[{"type":"task","id":"a","label":"A"}]},
                    {"condition":"no","path":[{"type":"task","id":"b","label":"B"}]}
                ]},
                {"type":"endEvent","id":"e1"}
            ]}"#,
        )
        .unwrap();
        let (elements, flows) = flatten(&process);

        let join = elements.iter().find(|e| e.id == "g1-join").unwrap();
        assert_eq!(join.element_type, ElementType::ExclusiveGateway);
        assert!(join.label.is_none());

        let pairs = flow_pairs(&flows);
        for expected in [
            ("s1", "g1"),
            ("g1", "a"),
            ("g1", "b"),
            ("a", "g1-join"),
            ("b", "g1-join"),
            ("g1-join", "e1"),
        ] {
            assert!(pairs.contains(&expected), "missing flow {expected:?}");
        }
        assert_eq!(flows.len(), 6);

        let to_a = flows.iter().find(|f| f.target_ref == "a").unwrap();
        assert_eq!(to_a.condition.as_deref(), Some("yes"));
        let to_b = flows.iter().find(|f| f.target_ref == "b").unwrap();
        assert_eq!(to_b.condition.as_deref(), Some("no"));
    }

    #[test]
    fn branch_ending_early_has_no_outgoing() {
        let process = Process::from_json(
            r#"{"process":[
                {"type":"startEvent","id":"s1"},
                {"type":"exclusiveGateway","id":"g1","label":"Continue?","has_join":false,"branches":[
                    {"condition":"cancel","path":[{"type":"endEvent","id":"e2"}]},
                    {"condition":"go","path":[{"type":"task","id":"t1","label":"Go"}]}
                ]},
                {"type":"endEvent","id":"e1"}
            ]}"#,
        )
        .unwrap();
        let (elements, flows) = flatten(&process);

        assert!(!elements.iter().any(|e| e.id.ends_with("-join")));
        let e2 = elements.iter().find(|e| e.id == "e2").unwrap();
        assert!(e2.outgoing.is_empty());
        assert!(flow_pairs(&flows).contains(&("t1", "e1")));
    }

    #[test]
    fn parallel_gateway_always_joins() {
        let process = Process::from_json(
            r#"{"process":[
                {"type":"startEvent","id":"s1"},
                {"type":"parallelGateway","id":"p1","branches":[
                    [{"type":"task","id":"ta","label":"A"}],
                    [{"type":"task","id":"tb","label":"B"}]
                ]},
                {"type":"endEvent","id":"e1"}
            ]}"#,
        )
        .unwrap();
        let (elements, flows) = flatten(&process);

        let join = elements.iter().find(|e| e.id == "p1-join").unwrap();
        assert_eq!(join.element_type, ElementType::ParallelGateway);

        let pairs = flow_pairs(&flows);
        for expected in [
            ("p1", "ta"),
            ("p1", "tb"),
            ("ta", "p1-join"),
            ("tb", "p1-join"),
            ("p1-join", "e1"),
        ] {
            assert!(pairs.contains(&expected), "missing flow {expected:?}");
        }
    }

    #[test]
    fn duplicate_flows_keep_first_occurrence() {
        let process = Process::from_json(
            r#"{"process":[
                {"type":"startEvent","id":"s1"},
                {"type":"task","id":"t1","label":"Loop target"},
                {"type":"exclusiveGateway","id":"g1","label":"Retry?","has_join":false,"branches":[
                    {"condition":"yes","path":[],"next":"t1"},
                    {"condition":"no","path":[],"next":"t1"}
                ]},
                {"type":"endEvent","id":"e1"}
            ]}"#,
        )
        .unwrap();
        let (_, flows) = flatten(&process);

        let to_t1: Vec<_> = flows
            .iter()
            .filter(|f| f.source_ref == "g1" && f.target_ref == "t1")
            .collect();
        assert_eq!(to_t1.len(), 1);
        assert_eq!(to_t1[0].condition.as_deref(), Some("yes"));
    }

    #[test]
    fn flattening_is_deterministic() {
        let process = Process::from_json(
            r#"{"process":[
                {"type":"startEvent","id":"s1"},
                {"type":"parallelGateway","id":"p1","branches":[
                    [{"type":"task","id":"ta","label":"A"}],
                    [{"type":"userTask","id":"tb","label":"B"},{"type":"serviceTask","id":"tc","label":"C"}]
                ]},
                {"type":"endEvent","id":"e1"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(flatten(&process), flatten(&process));
    }
}
