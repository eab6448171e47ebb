mod builder;

use crate::{
    diagram::{ElementType, FlatElement, SequenceFlow},
    error::{Error, MISSING_PROCESS_ELEMENT, Result},
    model::Process,
};
use quick_xml::events::{BytesStart, Event};

/// Parse BPMN 2.0 XML and rebuild the hierarchical form.
///
/// Tags are matched on their local name, so prefixed (`bpmn:task`) and
/// unprefixed documents both work. Only the direct children of the first
/// `process` element are read; everything else, diagram interchange
/// included, is skipped.
pub(crate) fn read_bpmn(xml: &str) -> Result<Process> {
    let (elements, flows) = scan(xml)?;
    builder::rebuild(&elements, &flows)
}

fn scan(xml: &str) -> Result<(Vec<FlatElement>, Vec<SequenceFlow>)> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut elements = Vec::new();
    let mut flows = Vec::new();

    let mut in_process = false;
    let mut saw_process = false;
    let mut depth = 0usize;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                if in_process {
                    if depth == 0 {
                        record(&e, &mut elements, &mut flows)?;
                    }
                    depth += 1;
                } else if local_name(std::str::from_utf8(e.name().as_ref())?) == "process" {
                    in_process = true;
                    saw_process = true;
                }
            }
            Event::Empty(e) => {
                if in_process && depth == 0 {
                    record(&e, &mut elements, &mut flows)?;
                }
            }
            Event::End(_) if in_process => {
                if depth > 0 {
                    depth -= 1;
                } else {
                    // First process element closed; the rest of the document
                    // holds nothing we read.
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_process {
        return Err(Error::Structure(MISSING_PROCESS_ELEMENT.into()));
    }
    Ok((elements, flows))
}

fn record(
    e: &BytesStart,
    elements: &mut Vec<FlatElement>,
    flows: &mut Vec<SequenceFlow>,
) -> Result<()> {
    let name = e.name();
    let local = local_name(std::str::from_utf8(name.as_ref())?);

    if local == "sequenceFlow" {
        let source = attr(e, "sourceRef")
            .ok_or_else(|| Error::Structure("sequenceFlow missing sourceRef".into()))?;
        let target = attr(e, "targetRef")
            .ok_or_else(|| Error::Structure("sequenceFlow missing targetRef".into()))?;
        let id = attr(e, "id").unwrap_or_else(|| format!("{source}-{target}"));
        flows.push(SequenceFlow {
            id,
            source_ref: source,
            target_ref: target,
            condition: attr(e, "name").filter(|name| !name.is_empty()),
        });
    } else if let Ok(element_type) = ElementType::try_from(local) {
        let id = attr(e, "id").ok_or_else(|| Error::Structure(format!("{local} missing id")))?;
        let label = match element_type {
            // Parallel gateways carry no label in the hierarchical form.
            ElementType::ParallelGateway => None,
            _ => attr(e, "name"),
        };
        elements.push(FlatElement::new(id, element_type, label));
    }
    // Unsupported children are skipped, not rejected; third-party documents
    // carry extension elements the engine has no use for.
    Ok(())
}

fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

fn attr(e: &BytesStart, name: &str) -> Option<String> {
    e.attributes().flatten().find_map(|attribute| {
        (local_name(std::str::from_utf8(attribute.key.as_ref()).ok()?) == name)
            .then(|| attribute.unescape_value().ok())
            .flatten()
            .map(|value| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Element;

    #[test]
    fn reads_prefixed_and_unprefixed_documents() {
        let unprefixed = r#"<?xml version="1.0"?>
            <definitions>
              <process id="Process_1">
                <startEvent id="s1" />
                <task id="t1" name="Do it" />
                <endEvent id="e1" />
                <sequenceFlow id="s1-t1" sourceRef="s1" targetRef="t1" />
                <sequenceFlow id="t1-e1" sourceRef="t1" targetRef="e1" />
              </process>
            </definitions>"#;
        let process = read_bpmn(unprefixed).unwrap();
        let ids: Vec<_> = process.elements.iter().map(Element::id).collect();
        assert_eq!(ids, ["s1", "t1", "e1"]);
        assert_eq!(
            process.elements[1],
            Element::Task {
                id: "t1".into(),
                label: "Do it".into()
            }
        );
    }

    #[test]
    fn ignores_unsupported_children_and_later_processes() {
        let xml = r#"<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL">
              <bpmn:process id="Process_1">
                <bpmn:startEvent id="s1">
                  <bpmn:outgoing>s1-e1</bpmn:outgoing>
                </bpmn:startEvent>
                <bpmn:subProcess id="sub1" />
                <bpmn:endEvent id="e1" />
                <bpmn:sequenceFlow id="s1-e1" sourceRef="s1" targetRef="e1" />
              </bpmn:process>
              <bpmn:process id="Process_2">
                <bpmn:startEvent id="other" />
              </bpmn:process>
            </bpmn:definitions>"#;
        let process = read_bpmn(xml).unwrap();
        let ids: Vec<_> = process.elements.iter().map(Element::id).collect();
        assert_eq!(ids, ["s1", "e1"]);
    }

    #[test]
    fn requires_a_process_element() {
        assert!(matches!(
            read_bpmn("<definitions></definitions>"),
            Err(Error::Structure(_))
        ));
    }

    #[test]
    fn requires_exactly_one_start_event() {
        let none = r#"<process id="p"><task id="t1" name="T" /></process>"#;
        assert!(matches!(read_bpmn(none), Err(Error::Structure(_))));

        let two = r#"<process id="p">
            <startEvent id="s1" />
            <startEvent id="s2" />
          </process>"#;
        assert!(matches!(read_bpmn(two), Err(Error::Structure(_))));
    }

    #[test]
    fn unescapes_attribute_values() {
        let xml = r#"<process id="p">
            <startEvent id="s1" />
            <task id="t1" name="Fetch &lt;a&gt; &amp; &quot;b&quot;" />
            <sequenceFlow id="f1" sourceRef="s1" targetRef="t1" />
          </process>"#;
        let process = read_bpmn(xml).unwrap();
        assert_eq!(
            process.elements[1].label(),
            Some(r#"Fetch <a> & "b""#)
        );
    }
}
