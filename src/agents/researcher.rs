use super::task::DraftState;
use super::{emit, Agent, AgentError, AgentRole, EventSender, WorkflowEvent};
use crate::llm::{ChatCompletion, ChatMessage, ChatRequest};
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You are a meticulous research assistant. \
You write factual, well-sourced Markdown that a reviewer can check against guidelines.";

/// Research agent - writes the first draft of a section
pub struct ResearchAgent {
    llm: Arc<dyn ChatCompletion>,
    events: Option<EventSender>,
}

impl ResearchAgent {
    pub fn new(llm: Arc<dyn ChatCompletion>) -> Self {
        Self { llm, events: None }
    }

    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Research `topic` in the context of the overall `parent_query`
    pub async fn research(
        &self,
        topic: &str,
        parent_query: &str,
        model: &str,
    ) -> Result<String, AgentError> {
        let prompt = if topic == parent_query {
            format!(
                "Conduct research on the following query and summarise the findings:\n\n{topic}\n"
            )
        } else {
            format!(
                "Conduct in-depth research on the subtopic \"{topic}\" as part of a wider \
                 report on \"{parent_query}\". Stay on the subtopic and summarise the findings.\n"
            )
        };

        let request = ChatRequest::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ])
        .with_model(model);

        Ok(self.llm.complete(request).await?)
    }
}

#[async_trait::async_trait]
impl Agent for ResearchAgent {
    fn role(&self) -> AgentRole {
        AgentRole::Research
    }

    async fn advance(&self, state: &mut DraftState) -> Result<(), AgentError> {
        if state.task.verbose {
            emit(
                self.events.as_ref(),
                WorkflowEvent::Progress {
                    role: AgentRole::Research,
                    message: format!("Running in depth research on: {}", state.topic),
                },
            );
        }

        let draft = self
            .research(&state.topic, &state.task.query, &state.task.model)
            .await?;
        tracing::debug!(topic = %state.topic, draft_len = draft.len(), "research draft ready");

        state.draft = draft;
        state.revision_notes = None;
        state.review = None;
        Ok(())
    }
}
