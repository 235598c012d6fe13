//! Editor / researcher / reviewer / reviser agents.
//!
//! Each agent is one LLM call wrapped around a [`DraftState`]. The
//! [`workflow::Workflow`] drives them through the accept-or-revise loop.

pub mod editor;
pub mod researcher;
pub mod reviewer;
pub mod reviser;
pub mod task;
pub mod workflow;

pub use editor::EditorAgent;
pub use researcher::ResearchAgent;
pub use reviewer::{ReviewerAgent, ReviewerOutput};
pub use reviser::{ReviserAgent, RevisionOutput};
pub use task::{DraftState, ResearchPlan, ResearchState, Review, Task};
pub use workflow::{SectionDraft, Workflow, WorkflowReport};

use crate::llm::LlmError;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::OnceLock;
use tokio::sync::mpsc;

/// Roles an agent can play in the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgentRole {
    Editor,
    Research,
    Reviewer,
    Reviser,
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentRole::Editor => write!(f, "editor"),
            AgentRole::Research => write!(f, "research"),
            AgentRole::Reviewer => write!(f, "reviewer"),
            AgentRole::Reviser => write!(f, "reviser"),
        }
    }
}

/// Errors that can occur while an agent works
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Could not parse {what} from model reply: {reason}")]
    InvalidReply { what: &'static str, reason: String },

    #[error("No {0} agent registered")]
    MissingAgent(AgentRole),
}

/// Progress reported while a workflow runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    /// Free-form progress line from an agent
    Progress { role: AgentRole, message: String },
    /// Reviewer accepted the section draft
    Accepted { topic: String, revisions: usize },
    /// Revision budget ran out; the last draft is kept
    RevisionLimitReached { topic: String, revisions: usize },
}

pub type EventSender = mpsc::UnboundedSender<WorkflowEvent>;

/// A workflow participant that advances a draft state by one step
#[async_trait::async_trait]
pub trait Agent: Send + Sync {
    fn role(&self) -> AgentRole;

    async fn advance(&self, state: &mut DraftState) -> Result<(), AgentError>;
}

pub(crate) fn emit(events: Option<&EventSender>, event: WorkflowEvent) {
    if let Some(tx) = events {
        // Nobody listening is fine.
        let _ = tx.send(event);
    }
}

/// Parse a JSON object out of a model reply, tolerating Markdown code fences
pub(crate) fn parse_json_reply<T: DeserializeOwned>(
    reply: &str,
    what: &'static str,
) -> Result<T, AgentError> {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("fence pattern is valid")
    });

    let body = fence
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or_else(|| reply.trim());

    serde_json::from_str(body).map_err(|e| AgentError::InvalidReply {
        what,
        reason: e.to_string(),
    })
}
