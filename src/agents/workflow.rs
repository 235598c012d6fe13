use super::editor::EditorAgent;
use super::task::{DraftState, ResearchPlan, ResearchState, Review, Task};
use super::{emit, Agent, AgentError, AgentRole, EventSender, WorkflowEvent};
use crate::llm::ChatCompletion;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Final state of one section after the review loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionDraft {
    pub topic: String,
    pub draft: String,
    /// Revision rounds that ran
    pub revisions: usize,
    /// Whether the reviewer accepted the last draft
    pub accepted: bool,
}

/// Planned report with every section drafted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowReport {
    pub plan: ResearchPlan,
    pub sections: Vec<SectionDraft>,
}

/// Drives research -> review -> (revise -> review)* for each planned section
pub struct Workflow {
    editor: EditorAgent,
    agents: HashMap<AgentRole, Arc<dyn Agent>>,
    events: Option<EventSender>,
}

impl Workflow {
    pub fn new(llm: Arc<dyn ChatCompletion>) -> Self {
        let editor = EditorAgent::new(llm);
        let agents = editor.initialize_agents();
        Self {
            editor,
            agents,
            events: None,
        }
    }

    pub fn with_events(llm: Arc<dyn ChatCompletion>, events: EventSender) -> Self {
        let editor = EditorAgent::new(llm).with_events(events.clone());
        let agents = editor.initialize_agents();
        Self {
            editor,
            agents,
            events: Some(events),
        }
    }

    /// Swap in a different agent for `role`
    pub fn with_agent(mut self, agent: Arc<dyn Agent>) -> Self {
        self.agents.insert(agent.role(), agent);
        self
    }

    fn agent(&self, role: AgentRole) -> Result<&Arc<dyn Agent>, AgentError> {
        self.agents.get(&role).ok_or(AgentError::MissingAgent(role))
    }

    /// Draft one section until the reviewer accepts it or the revision budget runs out
    pub async fn run_section(&self, task: &Task, topic: &str) -> Result<SectionDraft, AgentError> {
        let mut state = DraftState::for_topic(task.clone(), topic);
        self.agent(AgentRole::Research)?.advance(&mut state).await?;

        let reviewer = self.agent(AgentRole::Reviewer)?;
        let reviser = self.agent(AgentRole::Reviser)?;
        let mut revisions = 0;

        loop {
            reviewer.advance(&mut state).await?;

            if matches!(state.review, Some(Review::Accepted)) {
                tracing::info!(topic, revisions, "section accepted");
                emit(
                    self.events.as_ref(),
                    WorkflowEvent::Accepted {
                        topic: topic.to_string(),
                        revisions,
                    },
                );
                return Ok(self.finish(state, revisions, true));
            }

            if revisions >= task.max_revisions {
                tracing::warn!(topic, revisions, "revision limit reached, keeping last draft");
                emit(
                    self.events.as_ref(),
                    WorkflowEvent::RevisionLimitReached {
                        topic: topic.to_string(),
                        revisions,
                    },
                );
                return Ok(self.finish(state, revisions, false));
            }

            reviser.advance(&mut state).await?;
            revisions += 1;
        }
    }

    fn finish(&self, state: DraftState, revisions: usize, accepted: bool) -> SectionDraft {
        SectionDraft {
            topic: state.topic,
            draft: state.draft,
            revisions,
            accepted,
        }
    }

    /// Plan the report and draft every section in order
    pub async fn run(&self, task: &Task, initial_research: &str) -> Result<WorkflowReport, AgentError> {
        let plan = self
            .editor
            .plan_research(&ResearchState {
                task: task.clone(),
                initial_research: initial_research.to_string(),
            })
            .await?;

        tracing::info!(title = %plan.title, sections = plan.sections.len(), "research planned");

        let mut sections = Vec::with_capacity(plan.sections.len());
        for topic in &plan.sections {
            sections.push(self.run_section(task, topic).await?);
        }

        Ok(WorkflowReport { plan, sections })
    }
}
