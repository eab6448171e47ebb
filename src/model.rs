pub(crate) mod path;
mod validate;

pub use validate::validate_element;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// One node in the hierarchical process tree.
///
/// The tag is closed: anything outside this set fails validation. Gateways
/// own their branches, so the tree is acyclic by construction; loop-backs are
/// expressed with [`ExclusiveBranch::next`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Element {
    Task {
        id: String,
        label: String,
    },
    UserTask {
        id: String,
        label: String,
    },
    ServiceTask {
        id: String,
        label: String,
    },
    StartEvent {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    EndEvent {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    ExclusiveGateway {
        id: String,
        label: String,
        has_join: bool,
        branches: Vec<ExclusiveBranch>,
    },
    ParallelGateway {
        id: String,
        branches: Vec<ParallelBranch>,
    },
}

/// One conditional branch of an exclusive gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusiveBranch {
    pub condition: String,
    #[serde(default)]
    pub path: Vec<Element>,
    /// Loop-back or jump: id of an element elsewhere in the tree that the
    /// branch flows into instead of the gateway's own continuation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// One branch of a parallel gateway. All branches run and re-merge on the
/// synthetic join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParallelBranch(pub Vec<Element>);

impl Element {
    pub fn id(&self) -> &str {
        match self {
            Element::Task { id, .. }
            | Element::UserTask { id, .. }
            | Element::ServiceTask { id, .. }
            | Element::StartEvent { id, .. }
            | Element::EndEvent { id, .. }
            | Element::ExclusiveGateway { id, .. }
            | Element::ParallelGateway { id, .. } => id,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Element::Task { label, .. }
            | Element::UserTask { label, .. }
            | Element::ServiceTask { label, .. }
            | Element::ExclusiveGateway { label, .. } => Some(label),
            Element::StartEvent { label, .. } | Element::EndEvent { label, .. } => label.as_deref(),
            Element::ParallelGateway { .. } => None,
        }
    }

    /// BPMN tag name of the element.
    pub fn type_name(&self) -> &'static str {
        match self {
            Element::Task { .. } => "task",
            Element::UserTask { .. } => "userTask",
            Element::ServiceTask { .. } => "serviceTask",
            Element::StartEvent { .. } => "startEvent",
            Element::EndEvent { .. } => "endEvent",
            Element::ExclusiveGateway { .. } => "exclusiveGateway",
            Element::ParallelGateway { .. } => "parallelGateway",
        }
    }

    pub fn is_gateway(&self) -> bool {
        matches!(
            self,
            Element::ExclusiveGateway { .. } | Element::ParallelGateway { .. }
        )
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.label() {
            Some(label) => write!(f, r#"{} "{}" ({})"#, self.type_name(), label, self.id()),
            None => write!(f, "{} ({})", self.type_name(), self.id()),
        }
    }
}

/// An ordered list of elements, root of the hierarchical form.
///
/// This is the shape exchanged with the LLM as JSON and the input to
/// flattening. A process value is owned by one request at a time; edits
/// return a new process and never mutate their input.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Process {
    #[serde(rename = "process")]
    pub elements: Vec<Element>,
}

impl Process {
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    /// Parse the hierarchical wire form `{"process":[…]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Rebuild the hierarchical form from BPMN 2.0 XML.
    pub fn from_xml(xml: &str) -> Result<Self> {
        crate::diagram::reader::read_bpmn(xml)
    }

    /// Flatten and serialise to BPMN 2.0 XML with placeholder diagram
    /// interchange geometry.
    pub fn to_xml(&self) -> Result<String> {
        let (elements, flows) = crate::diagram::flatten::flatten(self);
        crate::diagram::writer::write_bpmn(&elements, &flows)
    }

    /// Every element id in the tree, in walk order.
    pub fn all_ids(&self) -> Vec<String> {
        path::all_ids(&self.elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip_keeps_tags_and_keys() -> Result<()> {
        let json = r#"{"process":[
            {"type":"startEvent","id":"s1"},
            {"type":"task","id":"t1","label":"Do it"},
            {"type":"exclusiveGateway","id":"g1","label":"OK?","has_join":true,"branches":[
                {"condition":"yes","path":[{"type":"userTask","id":"a","label":"A"}]},
                {"condition":"no","path":[],"next":"t1"}
            ]},
            {"type":"endEvent","id":"e1"}
        ]}"#;
        let process = Process::from_json(json)?;
        assert_eq!(process.elements.len(), 4);

        let out = process.to_json()?;
        assert!(out.contains(r#""type":"exclusiveGateway""#));
        assert!(out.contains(r#""has_join":true"#));
        assert!(out.contains(r#""next":"t1""#));
        // Absent labels stay absent.
        assert!(!out.contains(r#""label":null"#));

        assert_eq!(Process::from_json(&out)?, process);
        Ok(())
    }

    #[test]
    fn parallel_branches_are_plain_lists() -> Result<()> {
        let json = r#"{"process":[
            {"type":"parallelGateway","id":"p1","branches":[
                [{"type":"task","id":"ta","label":"A"}],
                [{"type":"task","id":"tb","label":"B"}]
            ]}
        ]}"#;
        let process = Process::from_json(json)?;
        let Element::ParallelGateway { branches, .. } = &process.elements[0] else {
            panic!("expected a parallel gateway");
        };
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0].0[0].id(), "ta");
        Ok(())
    }

    #[test]
    fn unknown_type_tag_is_rejected() {
        let json = r#"{"process":[{"type":"subProcess","id":"x"}]}"#;
        assert!(Process::from_json(json).is_err());
    }
}
