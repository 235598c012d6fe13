use super::{ReportRequest, ReportType, ResearchBackend, ResearchError};
use crate::agents::{ResearchAgent, Task, Workflow, WorkflowReport};
use crate::config::KernelConfig;
use crate::llm::openai::{OpenAiClient, OpenAiSettings};
use crate::llm::{ChatCompletion, ChatMessage, ChatRequest, ModelRouting, TemperatureGuard};
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You are an AI critical thinker research assistant. \
Your sole purpose is to write well written, critically acclaimed, objective and structured reports on given text.";

/// Guidelines every section of a detailed report is reviewed against
pub const DEFAULT_GUIDELINES: [&str; 3] = [
    "Each section must stay focused on the research query",
    "Each section must cite supporting sources with inline Markdown links",
    "Claims must be factual and stated without speculation",
];

/// Research backend that writes reports with a chat-completion model
pub struct LlmResearcher {
    llm: Arc<dyn ChatCompletion>,
    smart_model: String,
    fast_model: String,
    temperature: Option<f32>,
    guidelines: Vec<String>,
}

impl LlmResearcher {
    pub fn new(llm: Arc<dyn ChatCompletion>, smart_model: impl Into<String>) -> Self {
        let smart_model = smart_model.into();
        Self {
            llm,
            fast_model: smart_model.clone(),
            smart_model,
            temperature: None,
            guidelines: DEFAULT_GUIDELINES.iter().map(|g| g.to_string()).collect(),
        }
    }

    pub fn with_fast_model(mut self, model: impl Into<String>) -> Self {
        self.fast_model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Replace the guidelines detailed-report sections are reviewed against
    pub fn with_guidelines<I, S>(mut self, guidelines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.guidelines = guidelines.into_iter().map(Into::into).collect();
        self
    }

    /// Wire an OpenAI client behind the temperature guard, routed per `config`
    pub fn from_config<F>(config: &KernelConfig, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let routing = ModelRouting::resolve(config, &lookup);
        let default_model = routing.default_model(config);
        let settings = OpenAiSettings::from_lookup(default_model.clone(), &lookup);
        let client = TemperatureGuard::new(OpenAiClient::new(settings), default_model);

        Self::new(Arc::new(client), routing.smart_model(config))
            .with_fast_model(routing.fast_model(config))
            .with_temperature(routing.request_temperature())
    }

    async fn single_report(&self, request: &ReportRequest) -> Result<String, ResearchError> {
        let sources = if request.domains.is_empty() {
            String::new()
        } else {
            format!(
                "Only use sources from the following domains: {}.\n",
                request.domains.join(", ")
            )
        };

        let prompt = format!(
            "Research the following query and write {instructions}.\n\n\
             Query: \"{query}\"\n\
             {sources}\
             You must write the report with the following tone: {tone}.\n\
             Use Markdown syntax and cite sources with inline links where possible.\n",
            instructions = request.report_type.instructions(),
            query = request.query,
            tone = request.tone.describe(),
        );

        let mut chat = ChatRequest::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ])
        .with_model(&self.smart_model);
        if let Some(t) = self.temperature {
            chat = chat.with_temperature(t);
        }

        Ok(self.llm.complete(chat).await?)
    }

    async fn detailed_report(&self, request: &ReportRequest) -> Result<String, ResearchError> {
        let initial = ResearchAgent::new(self.llm.clone())
            .research(&request.query, &request.query, &self.fast_model)
            .await?;

        let task = Task::new(&request.query)
            .with_model(&self.smart_model)
            .with_guidelines(self.guidelines.iter().cloned());
        let report = Workflow::new(self.llm.clone()).run(&task, &initial).await?;

        Ok(render_workflow_report(&report))
    }
}

/// Assemble planned sections into one Markdown document
pub fn render_workflow_report(report: &WorkflowReport) -> String {
    let mut out = format!("# {}\n\n*{}*\n", report.plan.title, report.plan.date);
    for section in &report.sections {
        out.push_str(&format!("\n## {}\n\n{}\n", section.topic, section.draft.trim()));
    }
    out
}

#[async_trait::async_trait]
impl ResearchBackend for LlmResearcher {
    async fn write_report(&self, request: &ReportRequest) -> Result<String, ResearchError> {
        tracing::info!(
            query = %request.query,
            report_type = %request.report_type,
            model = %self.smart_model,
            "writing report"
        );

        let report = match request.report_type {
            ReportType::DetailedReport => self.detailed_report(request).await?,
            _ => self.single_report(request).await?,
        };

        if report.trim().is_empty() {
            return Err(ResearchError::EmptyReport);
        }
        Ok(report)
    }
}
