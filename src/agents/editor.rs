use super::researcher::ResearchAgent;
use super::reviewer::ReviewerAgent;
use super::reviser::ReviserAgent;
use super::task::{ResearchPlan, ResearchState};
use super::{emit, parse_json_reply, Agent, AgentError, AgentRole, EventSender, WorkflowEvent};
use crate::llm::{ChatCompletion, ChatMessage, ChatRequest, ResponseFormat};
use chrono::Local;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You are a research editor. \
Your goal is to oversee the research project from inception to completion. \
Your main task is to plan the article section layout based on an initial research summary.";

#[derive(Debug, Deserialize)]
struct PlanReply {
    title: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    sections: Vec<String>,
}

/// Editor agent - plans sections and owns the other agents
pub struct EditorAgent {
    llm: Arc<dyn ChatCompletion>,
    events: Option<EventSender>,
}

impl EditorAgent {
    pub fn new(llm: Arc<dyn ChatCompletion>) -> Self {
        Self { llm, events: None }
    }

    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Build the agents a section workflow needs, keyed by role
    pub fn initialize_agents(&self) -> HashMap<AgentRole, Arc<dyn Agent>> {
        let mut research = ResearchAgent::new(self.llm.clone());
        let mut reviewer = ReviewerAgent::new(self.llm.clone());
        let mut reviser = ReviserAgent::new(self.llm.clone());
        if let Some(tx) = &self.events {
            research = research.with_events(tx.clone());
            reviewer = reviewer.with_events(tx.clone());
            reviser = reviser.with_events(tx.clone());
        }

        let mut agents: HashMap<AgentRole, Arc<dyn Agent>> = HashMap::new();
        agents.insert(AgentRole::Research, Arc::new(research));
        agents.insert(AgentRole::Reviewer, Arc::new(reviewer));
        agents.insert(AgentRole::Reviser, Arc::new(reviser));
        agents
    }

    /// Plan the report layout from the initial research
    ///
    /// Never returns more than `task.max_sections` sections. A plan without a
    /// date gets today's.
    pub async fn plan_research(&self, state: &ResearchState) -> Result<ResearchPlan, AgentError> {
        let task = &state.task;

        if task.verbose {
            emit(
                self.events.as_ref(),
                WorkflowEvent::Progress {
                    role: AgentRole::Editor,
                    message: "Planning an outline layout based on initial research...".to_string(),
                },
            );
        }

        let prompt = format!(
            "Today's date is {today}\n\
             Research summary report: '{initial}'\n\n\
             Your task is to generate an outline of sections headers for the research project \
             based on the research summary report above.\n\
             You must generate a maximum of {max} section headers.\n\
             You must focus ONLY on related research topics for subheaders and do NOT include \
             introduction, conclusion and references.\n\
             You must return nothing but a JSON with the fields 'title' (str), 'date' (str) and \
             'sections' (list of str).\n",
            today = Local::now().format("%d/%m/%Y"),
            initial = state.initial_research,
            max = task.max_sections,
        );

        let request = ChatRequest::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ])
        .with_model(&task.model)
        .with_response_format(ResponseFormat::Json);

        let reply = self.llm.complete(request).await?;
        let plan: PlanReply = parse_json_reply(&reply, "research plan")?;

        let mut sections = plan.sections;
        if sections.len() > task.max_sections {
            tracing::debug!(
                planned = sections.len(),
                max = task.max_sections,
                "truncating planned sections"
            );
            sections.truncate(task.max_sections);
        }

        Ok(ResearchPlan {
            title: plan.title,
            date: plan
                .date
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| Local::now().format("%d/%m/%Y").to_string()),
            sections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::task::Task;
    use crate::llm::mock::MockLlm;

    fn research_state(max_sections: usize) -> ResearchState {
        ResearchState {
            task: Task::new("Integration test query").with_max_sections(max_sections),
            initial_research: "Mock initial research data".to_string(),
        }
    }

    #[test]
    fn test_initialize_agents_has_every_worker_role() {
        let editor = EditorAgent::new(Arc::new(MockLlm::new()));
        let agents = editor.initialize_agents();

        assert_eq!(agents.len(), 3);
        for role in [AgentRole::Research, AgentRole::Reviewer, AgentRole::Reviser] {
            assert_eq!(agents[&role].role(), role);
        }
    }

    #[tokio::test]
    async fn test_plan_is_truncated_to_max_sections() {
        let mock = Arc::new(MockLlm::new());
        mock.push_response(
            r#"{"title": "T", "date": "2025-09-10", "sections": ["A", "B", "C", "D"]}"#,
        );
        let editor = EditorAgent::new(mock.clone());

        let plan = editor.plan_research(&research_state(2)).await.unwrap();

        assert_eq!(plan.title, "T");
        assert_eq!(plan.date, "2025-09-10");
        assert_eq!(plan.sections, vec!["A", "B"]);
        assert_eq!(
            mock.last_call().unwrap().response_format,
            Some(ResponseFormat::Json)
        );
    }

    #[tokio::test]
    async fn test_missing_date_is_filled() {
        let mock = Arc::new(MockLlm::new());
        mock.push_response("```json\n{\"title\": \"T\", \"sections\": [\"A\"]}\n```");
        let editor = EditorAgent::new(mock);

        let plan = editor.plan_research(&research_state(3)).await.unwrap();
        assert_eq!(plan.date, Local::now().format("%d/%m/%Y").to_string());
    }

    #[tokio::test]
    async fn test_unparseable_plan_is_an_error() {
        let mock = Arc::new(MockLlm::new());
        mock.push_response("I could not come up with a plan");
        let editor = EditorAgent::new(mock);

        let err = editor.plan_research(&research_state(3)).await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidReply { .. }));
    }
}
