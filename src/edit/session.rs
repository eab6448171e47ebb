//! Conversation loops against the LLM collaborator.
//!
//! A session alternates prompt, proposal, apply. Rejected replies are fed
//! back verbatim as the next prompt's error context; every loop carries a
//! hard budget so a confused model cannot spin forever. Each round works on
//! the process value the previous round returned, never on shared state, so
//! cancelling between rounds discards nothing but the round in flight.

use crate::{
    edit::{prompt, proposal::EditProposal},
    error::{Error, Result},
    llm::LlmClient,
    model::Process,
};
use log::{debug, info, warn};

const MAX_ATTEMPTS: u32 = 4;
const MAX_ITERATIONS: u32 = 15;

pub struct EditSession<C> {
    client: C,
}

impl<C: LlmClient> EditSession<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// One-shot generation: a description becomes a validated process.
    pub async fn generate(&self, description: &str) -> Result<Process> {
        let mut prior_error: Option<String> = None;
        for attempt in 1..=MAX_ATTEMPTS {
            let user_prompt = prompt::generation(description, prior_error.as_deref());
            let reply = self
                .client
                .complete(prompt::GENERATION_SYSTEM, &user_prompt)
                .await?;
            match parse_process(&reply) {
                Ok(process) => {
                    info!("generated {} elements", process.elements.len());
                    return Ok(process);
                }
                Err(error) => {
                    warn!("generation attempt {attempt} rejected: {error}");
                    prior_error = Some(error.to_string());
                }
            }
        }
        Err(Error::EditExhausted(format!(
            "generation failed {MAX_ATTEMPTS} times"
        )))
    }

    /// Apply a change request: an opening edit, then follow-up rounds until
    /// the model stops. The input process is never touched.
    pub async fn edit(&self, process: &Process, change_request: &str) -> Result<Process> {
        let Some(mut current) = self.round(process, change_request, true).await? else {
            // The opening round refuses stops, so this cannot happen; keep
            // the input unchanged rather than panic.
            return Ok(process.clone());
        };

        for iteration in 1..=MAX_ITERATIONS {
            debug!("edit iteration {iteration}");
            match self.round(&current, change_request, false).await? {
                Some(next) => current = next,
                None => return Ok(current),
            }
        }
        Err(Error::EditExhausted(format!(
            "no stop within {MAX_ITERATIONS} iterations"
        )))
    }

    // One proposal round under the retry budget. Ok(None) means the model
    // stopped.
    async fn round(
        &self,
        process: &Process,
        change_request: &str,
        first: bool,
    ) -> Result<Option<Process>> {
        let process_json = process.to_json()?;
        let mut prior_error: Option<String> = None;
        for attempt in 1..=MAX_ATTEMPTS {
            let user_prompt = prompt::edit(
                &process_json,
                change_request,
                prior_error.as_deref(),
                !first,
            );
            let reply = self.client.complete(prompt::EDIT_SYSTEM, &user_prompt).await?;
            match apply_reply(&reply, process, first) {
                Ok(result) => return Ok(result),
                Err(error) => {
                    warn!("proposal attempt {attempt} rejected: {error}");
                    prior_error = Some(error.to_string());
                }
            }
        }
        Err(Error::EditExhausted(format!(
            "no usable proposal after {MAX_ATTEMPTS} attempts"
        )))
    }
}

fn parse_process(reply: &str) -> Result<Process> {
    let value: serde_json::Value = serde_json::from_str(reply)
        .map_err(|error| Error::Transport(format!("reply is not JSON: {error}")))?;
    let process: Process = serde_json::from_value(value)?;
    process.validate()?;
    Ok(process)
}

fn apply_reply(reply: &str, process: &Process, first: bool) -> Result<Option<Process>> {
    let value: serde_json::Value = serde_json::from_str(reply)
        .map_err(|error| Error::Transport(format!("reply is not JSON: {error}")))?;
    let proposal = EditProposal::from_value(&value, first)?;
    if proposal == EditProposal::Stop {
        info!("model stopped editing");
        return Ok(None);
    }
    info!("applying {proposal:?}");
    proposal.apply(process).map(Some)
}
