//! Prompt text for the generation and editing rounds. Kept apart from the
//! session loop so the exact strings sent to the model stay testable.

pub(super) const GENERATION_SYSTEM: &str = r#"You design business processes as BPMN 2.0 diagrams.
Reply with a single JSON object {"process":[...]} and nothing else.

Supported elements:
- {"type":"task"|"userTask"|"serviceTask","id":"...","label":"..."}
- {"type":"startEvent"|"endEvent","id":"...","label":"..."} (label optional)
- {"type":"exclusiveGateway","id":"...","label":"...","has_join":bool,"branches":[{"condition":"...","path":[...],"next":"id"}]} (next optional)
- {"type":"parallelGateway","id":"...","branches":[[...],[...]]}

Rules: exactly one startEvent at the top level, unique ids everywhere, every
gateway has at least two branches, every exclusive branch has a condition."#;

pub(super) const EDIT_SYSTEM: &str = r#"You revise a BPMN process one change at a time.
Reply with a single JSON object and nothing else, choosing one of:

{"function":"delete_element","arguments":{"element_id":"X"}}
{"function":"redirect_branch","arguments":{"branch_condition":"...","next_id":"X"}}
{"function":"add_element","arguments":{"element":{...},"before_id":"X"}}   (or after_id)
{"function":"move_element","arguments":{"element_id":"X","after_id":"Y"}}  (or before_id)
{"function":"update_element","arguments":{"new_element":{...}}}
{"stop":true}

Argument keys must match exactly. update_element cannot change gateways.
Send {"stop":true} only once the change request is fully applied."#;

pub(super) fn generation(description: &str, prior_error: Option<&str>) -> String {
    let mut prompt = format!("Create a process for the following request.\n\n{description}\n");
    if let Some(error) = prior_error {
        prompt.push_str(&format!(
            "\nYour previous reply was rejected: {error}\nFix it and reply again.\n"
        ));
    }
    prompt
}

pub(super) fn edit(
    process_json: &str,
    change_request: &str,
    prior_error: Option<&str>,
    allow_stop: bool,
) -> String {
    let mut prompt = format!(
        "Current process:\n{process_json}\n\nChange request:\n{change_request}\n"
    );
    if let Some(error) = prior_error {
        prompt.push_str(&format!(
            "\nYour previous proposal was rejected: {error}\nReply with a corrected proposal.\n"
        ));
    }
    prompt.push_str(if allow_stop {
        "\nReply with the next function call, or {\"stop\":true} when done.\n"
    } else {
        "\nReply with the first function call. A stop is not accepted yet.\n"
    });
    prompt
}
