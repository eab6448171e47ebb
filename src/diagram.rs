pub(crate) mod flatten;
pub(crate) mod reader;
pub(crate) mod writer;

pub use flatten::flatten;

use crate::error::Error;
use std::fmt::Display;

/// BPMN tag of a flat element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Task,
    UserTask,
    ServiceTask,
    StartEvent,
    EndEvent,
    ExclusiveGateway,
    ParallelGateway,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Task => "task",
            ElementType::UserTask => "userTask",
            ElementType::ServiceTask => "serviceTask",
            ElementType::StartEvent => "startEvent",
            ElementType::EndEvent => "endEvent",
            ElementType::ExclusiveGateway => "exclusiveGateway",
            ElementType::ParallelGateway => "parallelGateway",
        }
    }
}

impl Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ElementType {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Ok(match value {
            "task" => ElementType::Task,
            "userTask" => ElementType::UserTask,
            "serviceTask" => ElementType::ServiceTask,
            "startEvent" => ElementType::StartEvent,
            "endEvent" => ElementType::EndEvent,
            "exclusiveGateway" => ElementType::ExclusiveGateway,
            "parallelGateway" => ElementType::ParallelGateway,
            other => return Err(Error::UnsupportedType(other.into())),
        })
    }
}

/// One node of the flat form: the shape of a BPMN XML child element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatElement {
    pub id: String,
    pub element_type: ElementType,
    pub label: Option<String>,
    pub incoming: Vec<String>,
    pub outgoing: Vec<String>,
}

impl FlatElement {
    pub(crate) fn new(
        id: impl Into<String>,
        element_type: ElementType,
        label: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            element_type,
            // Empty labels canonicalise to absent.
            label: label.filter(|l| !l.is_empty()),
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }
}

/// Directed edge between two flat elements. The condition is carried as the
/// `name` attribute on the XML flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceFlow {
    pub id: String,
    pub source_ref: String,
    pub target_ref: String,
    pub condition: Option<String>,
}

/// Populate each element's incoming/outgoing lists by scanning the flow list
/// in insertion order.
pub(crate) fn wire_flows(elements: &mut [FlatElement], flows: &[SequenceFlow]) {
    for flow in flows {
        for element in elements.iter_mut() {
            if element.id == flow.source_ref {
                element.outgoing.push(flow.id.clone());
            }
            if element.id == flow.target_ref {
                element.incoming.push(flow.id.clone());
            }
        }
    }
}
