use super::task::{DraftState, Review};
use super::{emit, parse_json_reply, Agent, AgentError, AgentRole, EventSender, WorkflowEvent};
use crate::llm::{ChatCompletion, ChatMessage, ChatRequest, ResponseFormat};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You are an expert writer. \
Your goal is to revise drafts based on reviewer notes.";

/// Revised draft plus a note on what changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionOutput {
    pub draft: String,
    #[serde(default)]
    pub revision_notes: Option<String>,
}

/// Reviser agent - rewrites a draft to address reviewer feedback
pub struct ReviserAgent {
    llm: Arc<dyn ChatCompletion>,
    events: Option<EventSender>,
}

impl ReviserAgent {
    pub fn new(llm: Arc<dyn ChatCompletion>) -> Self {
        Self { llm, events: None }
    }

    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Revise `state.draft` according to `feedback`
    ///
    /// The model is asked for `{"draft": ..., "revision_notes": ...}`. A reply
    /// that is not that object is taken as the new draft with no notes.
    pub async fn revise_draft(
        &self,
        state: &DraftState,
        feedback: &str,
    ) -> Result<RevisionOutput, AgentError> {
        let request = ChatRequest::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_prompt(&state.draft, feedback)),
        ])
        .with_model(&state.task.model)
        .with_response_format(ResponseFormat::Json);

        let reply = self.llm.complete(request).await?;

        let output = match parse_json_reply::<RevisionOutput>(&reply, "revision") {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(error = %e, "reviser reply was not JSON, using it as the draft");
                RevisionOutput {
                    draft: reply,
                    revision_notes: None,
                }
            }
        };

        if state.task.verbose {
            let notes = output.revision_notes.as_deref().unwrap_or("(none)");
            emit(
                self.events.as_ref(),
                WorkflowEvent::Progress {
                    role: AgentRole::Reviser,
                    message: format!("Revision notes: {notes}"),
                },
            );
        }

        Ok(output)
    }
}

#[async_trait::async_trait]
impl Agent for ReviserAgent {
    fn role(&self) -> AgentRole {
        AgentRole::Reviser
    }

    async fn advance(&self, state: &mut DraftState) -> Result<(), AgentError> {
        let feedback = match &state.review {
            Some(Review::RevisionRequested(feedback)) => feedback.clone(),
            _ => return Ok(()),
        };

        tracing::info!(topic = %state.topic, "revising draft");
        let output = self.revise_draft(state, &feedback).await?;
        state.draft = output.draft;
        state.revision_notes = output.revision_notes;
        state.review = None;
        Ok(())
    }
}

fn build_prompt(draft: &str, feedback: &str) -> String {
    format!(
        "Draft:\n{draft}\n\n\
         Reviewer's notes:\n{feedback}\n\n\
         You have been tasked by your reviewer with revising the following draft, \
         which was written by a non-expert.\n\
         Address the notes and keep everything that was already sound.\n\
         Please respond in JSON with two keys: \"draft\" holding the full revised text, \
         and \"revision_notes\" briefly describing the changes you made.\n"
    )
}
