use super::task::{DraftState, Review};
use super::{emit, Agent, AgentError, AgentRole, EventSender, WorkflowEvent};
use crate::llm::{ChatCompletion, ChatMessage, ChatRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You are an expert research article reviewer. \
Your goal is to review research drafts and provide feedback to the reviser only based on specific guidelines.";

/// What `ReviewerAgent::run` hands back to the workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewerOutput {
    /// `None` accepts the draft; otherwise the revision feedback
    pub review: Option<String>,
}

/// Reviewer agent - decides whether a draft meets the task guidelines
pub struct ReviewerAgent {
    llm: Arc<dyn ChatCompletion>,
    events: Option<EventSender>,
}

impl ReviewerAgent {
    pub fn new(llm: Arc<dyn ChatCompletion>) -> Self {
        Self { llm, events: None }
    }

    /// Report progress on `events` when the task is verbose
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Review the draft against the task guidelines
    ///
    /// Makes no model call when the task does not follow guidelines.
    pub async fn review_draft(&self, state: &DraftState) -> Result<Review, AgentError> {
        let task = &state.task;
        if !task.follow_guidelines {
            return Ok(Review::Accepted);
        }

        let request = ChatRequest::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_prompt(state)),
        ])
        .with_model(&task.model);

        let reply = self.llm.complete(request).await?;
        let review = Review::from_reply(&reply);

        tracing::debug!(
            topic = %state.topic,
            accepted = review.is_accepted(),
            reply_len = reply.len(),
            "review decision"
        );

        if task.verbose {
            let message = match review.feedback() {
                None => "Review feedback is: None".to_string(),
                Some(feedback) => format!("Review feedback is: {feedback}..."),
            };
            emit(
                self.events.as_ref(),
                WorkflowEvent::Progress {
                    role: AgentRole::Reviewer,
                    message,
                },
            );
        }

        Ok(review)
    }

    /// Review the draft and report the decision as an optional string
    pub async fn run(&self, state: &DraftState) -> Result<ReviewerOutput, AgentError> {
        tracing::info!(topic = %state.topic, "reviewing draft");

        if state.task.verbose {
            emit(
                self.events.as_ref(),
                WorkflowEvent::Progress {
                    role: AgentRole::Reviewer,
                    message: "Reviewing draft...".to_string(),
                },
            );
        }

        let review = self.review_draft(state).await?;
        Ok(ReviewerOutput {
            review: review.into(),
        })
    }
}

#[async_trait::async_trait]
impl Agent for ReviewerAgent {
    fn role(&self) -> AgentRole {
        AgentRole::Reviewer
    }

    async fn advance(&self, state: &mut DraftState) -> Result<(), AgentError> {
        let output = self.run(state).await?;
        state.review = Some(Review::from(output.review));
        Ok(())
    }
}

fn build_prompt(state: &DraftState) -> String {
    let revision_context = match state.revision_notes.as_deref() {
        Some(notes) => format!(
            "The reviser has already revised the draft based on your previous review notes \
             with the following feedback:\n{notes}\n\n\
             Please provide additional feedback ONLY if critical since the reviser has already \
             made changes based on your previous feedback.\n\
             If you think the article is sufficient or that non critical revisions are required, \
             please aim to return None.\n"
        ),
        None => String::new(),
    };

    let guidelines = state
        .task
        .guidelines
        .iter()
        .map(|g| format!("- {g}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You have been tasked with reviewing the draft which was written by a non-expert \
         based on specific guidelines.\n\
         Please accept the draft if it is ready for publication, or send it for revision, \
         along with your notes to guide the revision.\n\
         If not all of the guideline criteria are met, you should send appropriate revision notes.\n\
         If the draft satisfies every guideline, please return None.\n\
         {revision_context}\n\
         Guidelines:\n{guidelines}\n\n\
         Draft:\n{draft}\n",
        draft = state.draft,
    )
}
