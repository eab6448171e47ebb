//! Edit proposals arrive from the LLM as free-form JSON. This module is the
//! only place that narrows those bags into typed arguments; everything past
//! it works with [`EditProposal`] values.

use crate::{
    error::{BEFORE_XOR_AFTER, Error, Result},
    model::{Element, Process, validate_element},
};
use serde_json::{Map, Value};

/// One atomic change requested by the LLM, or the signal that it is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditProposal {
    Stop,
    DeleteElement {
        element_id: String,
    },
    RedirectBranch {
        branch_condition: String,
        next_id: String,
    },
    AddElement {
        element: Element,
        before_id: Option<String>,
        after_id: Option<String>,
    },
    MoveElement {
        element_id: String,
        before_id: Option<String>,
        after_id: Option<String>,
    },
    UpdateElement {
        new_element: Element,
    },
}

impl EditProposal {
    /// Narrow a raw reply into a proposal. Argument keys must match the
    /// function exactly, with no extras and no omissions. `first` marks the
    /// opening proposal of a session, where a stop is not acceptable.
    pub fn from_value(value: &Value, first: bool) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::Proposal("expected a JSON object".into()))?;

        if object.contains_key("stop") {
            if object.len() != 1 || object.get("stop") != Some(&Value::Bool(true)) {
                return Err(Error::Proposal(r#"a stop is exactly {"stop":true}"#.into()));
            }
            if first {
                return Err(Error::Proposal(
                    "the first proposal must be an edit, not a stop".into(),
                ));
            }
            return Ok(EditProposal::Stop);
        }

        let function = object
            .get("function")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Proposal("missing function name".into()))?;
        let arguments = object
            .get("arguments")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::Proposal("missing arguments object".into()))?;
        if object.len() != 2 {
            return Err(Error::Proposal(
                "only function and arguments are allowed at the top level".into(),
            ));
        }

        match function {
            "delete_element" => {
                expect_keys(arguments, &["element_id"])?;
                Ok(EditProposal::DeleteElement {
                    element_id: required_str(arguments, "element_id")?,
                })
            }
            "redirect_branch" => {
                expect_keys(arguments, &["branch_condition", "next_id"])?;
                Ok(EditProposal::RedirectBranch {
                    branch_condition: required_str(arguments, "branch_condition")?,
                    next_id: required_str(arguments, "next_id")?,
                })
            }
            "add_element" => {
                let (before_id, after_id) = anchor(arguments, &["element"])?;
                Ok(EditProposal::AddElement {
                    element: embedded_element(arguments, "element")?,
                    before_id,
                    after_id,
                })
            }
            "move_element" => {
                let (before_id, after_id) = anchor(arguments, &["element_id"])?;
                Ok(EditProposal::MoveElement {
                    element_id: required_str(arguments, "element_id")?,
                    before_id,
                    after_id,
                })
            }
            "update_element" => {
                expect_keys(arguments, &["new_element"])?;
                Ok(EditProposal::UpdateElement {
                    new_element: embedded_element(arguments, "new_element")?,
                })
            }
            other => Err(Error::Proposal(format!("unknown function {other}"))),
        }
    }

    /// Apply the proposal to a process, returning the edited copy. A stop
    /// leaves the process as it is.
    pub fn apply(&self, process: &Process) -> Result<Process> {
        match self {
            EditProposal::Stop => Ok(process.clone()),
            EditProposal::DeleteElement { element_id } => process.delete_element(element_id),
            EditProposal::RedirectBranch {
                branch_condition,
                next_id,
            } => process.redirect_branch(branch_condition, next_id),
            EditProposal::AddElement {
                element,
                before_id,
                after_id,
            } => process.add_element(element.clone(), before_id.as_deref(), after_id.as_deref()),
            EditProposal::MoveElement {
                element_id,
                before_id,
                after_id,
            } => process.move_element(element_id, before_id.as_deref(), after_id.as_deref()),
            EditProposal::UpdateElement { new_element } => {
                process.update_element(new_element.clone())
            }
        }
    }
}

fn expect_keys(arguments: &Map<String, Value>, expected: &[&str]) -> Result<()> {
    for key in expected {
        if !arguments.contains_key(*key) {
            return Err(Error::Proposal(format!("missing argument {key}")));
        }
    }
    if arguments.len() != expected.len() {
        let extra: Vec<&str> = arguments
            .keys()
            .map(String::as_str)
            .filter(|key| !expected.contains(key))
            .collect();
        return Err(Error::Proposal(format!(
            "unexpected arguments: {}",
            extra.join(", ")
        )));
    }
    Ok(())
}

// Exactly one of before_id/after_id, next to the function's base keys.
fn anchor(
    arguments: &Map<String, Value>,
    base: &[&str],
) -> Result<(Option<String>, Option<String>)> {
    let before = arguments.contains_key("before_id");
    let after = arguments.contains_key("after_id");
    if before == after {
        return Err(Error::Proposal(BEFORE_XOR_AFTER.into()));
    }
    let mut expected: Vec<&str> = base.to_vec();
    expected.push(if before { "before_id" } else { "after_id" });
    expect_keys(arguments, &expected)?;
    let key = if before { "before_id" } else { "after_id" };
    let value = required_str(arguments, key)?;
    Ok(if before {
        (Some(value), None)
    } else {
        (None, Some(value))
    })
}

fn required_str(arguments: &Map<String, Value>, key: &str) -> Result<String> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::Proposal(format!("{key} must be a string")))
}

fn embedded_element(arguments: &Map<String, Value>, key: &str) -> Result<Element> {
    let element: Element = serde_json::from_value(arguments[key].clone())
        .map_err(|error| Error::Proposal(format!("{key} is not a valid element: {error}")))?;
    validate_element(&element)?;
    Ok(element)
}
