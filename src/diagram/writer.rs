//! BPMN 2.0 XML emission.
//!
//! The diagram interchange block at the end carries placeholder geometry
//! only; downstream layout tooling relocates every shape and waypoint.

use crate::{
    diagram::{ElementType, FlatElement, SequenceFlow},
    error::Result,
};
use std::fmt::Write;

const PROCESS_ID: &str = "Process_1";

pub(crate) fn write_bpmn(elements: &[FlatElement], flows: &[SequenceFlow]) -> Result<String> {
    let mut xml = String::new();

    writeln!(xml, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        xml,
        r#"<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL""#
    )?;
    writeln!(
        xml,
        r#"                  xmlns:bpmndi="http://www.omg.org/spec/BPMN/20100524/DI""#
    )?;
    writeln!(
        xml,
        r#"                  xmlns:dc="http://www.omg.org/spec/DD/20100524/DC""#
    )?;
    writeln!(
        xml,
        r#"                  xmlns:di="http://www.omg.org/spec/DD/20100524/DI""#
    )?;
    writeln!(
        xml,
        r#"                  id="Definitions_1" targetNamespace="http://bpmn.io/schema/bpmn">"#
    )?;
    writeln!(
        xml,
        r#"  <bpmn:process id="{PROCESS_ID}" isExecutable="false">"#
    )?;

    for element in elements {
        let name_attr = element
            .label
            .as_deref()
            .filter(|label| !label.is_empty())
            .map(|label| format!(r#" name="{}""#, escape(label)))
            .unwrap_or_default();
        writeln!(
            xml,
            r#"    <bpmn:{} id="{}"{}>"#,
            element.element_type,
            escape(&element.id),
            name_attr
        )?;
        for flow_id in &element.incoming {
            writeln!(xml, "      <bpmn:incoming>{}</bpmn:incoming>", escape(flow_id))?;
        }
        for flow_id in &element.outgoing {
            writeln!(xml, "      <bpmn:outgoing>{}</bpmn:outgoing>", escape(flow_id))?;
        }
        writeln!(xml, "    </bpmn:{}>", element.element_type)?;
    }

    for flow in flows {
        let name_attr = flow
            .condition
            .as_deref()
            .map(|condition| format!(r#" name="{}""#, escape(condition)))
            .unwrap_or_default();
        writeln!(
            xml,
            r#"    <bpmn:sequenceFlow id="{}" sourceRef="{}" targetRef="{}"{} />"#,
            escape(&flow.id),
            escape(&flow.source_ref),
            escape(&flow.target_ref),
            name_attr
        )?;
    }

    writeln!(xml, "  </bpmn:process>")?;
    write_diagram_interchange(&mut xml, elements, flows)?;
    writeln!(xml, "</bpmn:definitions>")?;

    Ok(xml)
}

// Shapes tiled on a 150-px grid, edges collapsed to two zero waypoints.
fn write_diagram_interchange(
    xml: &mut String,
    elements: &[FlatElement],
    flows: &[SequenceFlow],
) -> Result<()> {
    writeln!(xml, r#"  <bpmndi:BPMNDiagram id="BPMNDiagram_1">"#)?;
    writeln!(
        xml,
        r#"    <bpmndi:BPMNPlane id="BPMNPlane_1" bpmnElement="{PROCESS_ID}">"#
    )?;

    for (i, element) in elements.iter().enumerate() {
        let x = (i % 8) * 150;
        let y = (i / 8) * 150;
        let (width, height) = shape_size(element.element_type);
        writeln!(
            xml,
            r#"      <bpmndi:BPMNShape id="{id}_di" bpmnElement="{id}">"#,
            id = escape(&element.id)
        )?;
        writeln!(
            xml,
            r#"        <dc:Bounds x="{x}" y="{y}" width="{width}" height="{height}" />"#
        )?;
        writeln!(xml, "      </bpmndi:BPMNShape>")?;
    }

    for flow in flows {
        writeln!(
            xml,
            r#"      <bpmndi:BPMNEdge id="{id}_di" bpmnElement="{id}">"#,
            id = escape(&flow.id)
        )?;
        writeln!(xml, r#"        <di:waypoint x="0" y="0" />"#)?;
        writeln!(xml, r#"        <di:waypoint x="0" y="0" />"#)?;
        writeln!(xml, "      </bpmndi:BPMNEdge>")?;
    }

    writeln!(xml, "    </bpmndi:BPMNPlane>")?;
    writeln!(xml, "  </bpmndi:BPMNDiagram>")?;
    Ok(())
}

fn shape_size(element_type: ElementType) -> (u32, u32) {
    match element_type {
        ElementType::StartEvent | ElementType::EndEvent => (36, 36),
        ElementType::ExclusiveGateway | ElementType::ParallelGateway => (50, 50),
        _ => (100, 80),
    }
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{diagram::flatten, model::Process};

    #[test]
    fn linear_process_emits_flows_and_no_join() {
        let process = Process::from_json(
            r#"{"process":[
                {"type":"startEvent","id":"s1"},
                {"type":"task","id":"t1","label":"Do it"},
                {"type":"endEvent","id":"e1"}
            ]}"#,
        )
        .unwrap();
        let (elements, flows) = flatten(&process);
        let xml = write_bpmn(&elements, &flows).unwrap();

        assert!(xml.contains(r#"<bpmn:process id="Process_1" isExecutable="false">"#));
        assert!(xml.contains(r#"<bpmn:task id="t1" name="Do it">"#));
        assert!(xml.contains(r#"<bpmn:sequenceFlow id="s1-t1" sourceRef="s1" targetRef="t1" />"#));
        assert!(xml.contains(r#"<bpmn:sequenceFlow id="t1-e1" sourceRef="t1" targetRef="e1" />"#));
        assert!(!xml.contains("-join"));
        assert!(xml.contains("<bpmn:incoming>s1-t1</bpmn:incoming>"));
        assert!(xml.contains("<bpmn:outgoing>s1-t1</bpmn:outgoing>"));
    }

    #[test]
    fn conditions_become_flow_names() {
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
        let xml = write_bpmn(&elements, &flows).unwrap();

        assert!(xml.contains(r#"<bpmn:exclusiveGateway id="g1-join">"#));
        assert!(
            xml.contains(r#"<bpmn:sequenceFlow id="g1-a" sourceRef="g1" targetRef="a" name="yes" />"#)
        );
    }

    #[test]
    fn attribute_values_are_escaped() {
        let elements = vec![FlatElement::new(
            "t1",
            ElementType::Task,
            Some(r#"Fetch <a> & "b" or 'c'"#.into()),
        )];
        let xml = write_bpmn(&elements, &[]).unwrap();
        assert!(xml.contains(r#"name="Fetch &lt;a&gt; &amp; &quot;b&quot; or &apos;c&apos;""#));
    }

    #[test]
    fn placeholder_geometry_covers_every_element_and_flow() {
        let process = Process::from_json(
            r#"{"process":[
                {"type":"startEvent","id":"s1"},
                {"type":"task","id":"t1","label":"Do it"},
                {"type":"endEvent","id":"e1"}
            ]}"#,
        )
        .unwrap();
        let (elements, flows) = flatten(&process);
        let xml = write_bpmn(&elements, &flows).unwrap();

        assert_eq!(xml.matches("<bpmndi:BPMNShape").count(), elements.len());
        assert_eq!(xml.matches("<bpmndi:BPMNEdge").count(), flows.len());
        assert_eq!(
            xml.matches(r#"<di:waypoint x="0" y="0" />"#).count(),
            flows.len() * 2
        );
    }
}
