//! Integration tests for the multi-agent workflow

use gptr::agents::{
    Agent, AgentError, AgentRole, DraftState, EditorAgent, ResearchState, ReviewerAgent, Task,
    Workflow, WorkflowEvent,
};
use gptr::llm::mock::MockLlm;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn task() -> Task {
    Task::new("Integration test query")
        .with_model("gpt-4")
        .with_guidelines(["Be accurate", "Be comprehensive"])
        .with_max_sections(2)
}

#[test]
fn test_workflow_agent_initialization() {
    let editor = EditorAgent::new(Arc::new(MockLlm::new()));
    let agents = editor.initialize_agents();

    assert!(agents.contains_key(&AgentRole::Research));
    assert!(agents.contains_key(&AgentRole::Reviewer));
    assert!(agents.contains_key(&AgentRole::Reviser));
    assert_eq!(AgentRole::Research.to_string(), "research");
}

#[tokio::test]
async fn test_research_planning_workflow() {
    let mock = Arc::new(MockLlm::new());
    mock.push_response(
        r#"{"title": "Integration Test Research", "date": "2025-09-10", "sections": ["Introduction", "Analysis", "Outlook"]}"#,
    );
    let editor = EditorAgent::new(mock);

    let plan = editor
        .plan_research(&ResearchState {
            task: task(),
            initial_research: "Mock initial research data".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(plan.title, "Integration Test Research");
    assert_eq!(plan.sections, vec!["Introduction", "Analysis"]);
    assert!(plan.sections.len() <= task().max_sections);
}

#[tokio::test]
async fn test_reviewer_workflow_integration() {
    let mock = Arc::new(MockLlm::new());
    mock.push_response("The draft needs improvement in accuracy section.");
    let reviewer = ReviewerAgent::new(mock);

    let state = DraftState::new(task(), "Mock draft content for review");
    let result = reviewer.run(&state).await.unwrap();

    let review = result.review.expect("feedback expected");
    assert!(review.contains("improvement"));
}

#[tokio::test]
async fn test_workflow_decision_logic() {
    let mock = Arc::new(MockLlm::new());
    mock.push_response("None");
    let reviewer = ReviewerAgent::new(mock);

    let state = DraftState::new(
        task(),
        "This is a good enough draft that meets all guidelines",
    );
    let result = reviewer.run(&state).await.unwrap();

    assert_eq!(result.review, None);
    assert_eq!(serde_json::to_value(&result).unwrap()["review"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_full_workflow_with_revision_round() {
    let mock = Arc::new(MockLlm::new());
    mock.push_response(r#"{"title": "Report", "sections": ["Only section"]}"#)
        .push_response("first draft")
        .push_response("Cite your sources")
        .push_response(r#"{"draft": "second draft", "revision_notes": "added citations"}"#)
        .push_response("None");
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let workflow = Workflow::with_events(mock.clone(), tx);

    let report = workflow.run(&task(), "initial research").await.unwrap();

    assert_eq!(report.sections.len(), 1);
    let section = &report.sections[0];
    assert_eq!(section.draft, "second draft");
    assert_eq!(section.revisions, 1);
    assert!(section.accepted);
    assert_eq!(mock.call_count(), 5);

    let mut accepted = None;
    while let Ok(event) = rx.try_recv() {
        if let WorkflowEvent::Accepted { topic, revisions } = event {
            accepted = Some((topic, revisions));
        }
    }
    assert_eq!(accepted, Some(("Only section".to_string(), 1)));
}

struct FailingResearcher {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl Agent for FailingResearcher {
    fn role(&self) -> AgentRole {
        AgentRole::Research
    }

    async fn advance(&self, _state: &mut DraftState) -> Result<(), AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AgentError::InvalidReply {
            what: "research",
            reason: "no sources".to_string(),
        })
    }
}

#[tokio::test]
async fn test_agent_failure_stops_the_section() {
    let researcher = Arc::new(FailingResearcher {
        calls: AtomicUsize::new(0),
    });
    let mock = Arc::new(MockLlm::new());
    let workflow = Workflow::new(mock.clone()).with_agent(researcher.clone());

    let err = workflow.run_section(&task(), "Topic").await.unwrap_err();

    assert!(matches!(err, AgentError::InvalidReply { .. }));
    assert_eq!(researcher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(mock.call_count(), 0);
}
