//! Research requests, report types and the backend that writes reports.

pub mod llm;
pub mod report;

pub use llm::LlmResearcher;
pub use report::{ConfigUsed, ResearchMode, ResearchOutcome};

use crate::agents::AgentError;
use crate::llm::LlmError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Report flavours the research command accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    #[default]
    #[value(name = "research_report")]
    ResearchReport,
    #[value(name = "detailed_report")]
    DetailedReport,
    #[value(name = "resource_report")]
    ResourceReport,
    #[value(name = "outline_report")]
    OutlineReport,
    #[value(name = "custom_report")]
    CustomReport,
    #[value(name = "subtopic_report")]
    SubtopicReport,
}

impl ReportType {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportType::ResearchReport => "research_report",
            ReportType::DetailedReport => "detailed_report",
            ReportType::ResourceReport => "resource_report",
            ReportType::OutlineReport => "outline_report",
            ReportType::CustomReport => "custom_report",
            ReportType::SubtopicReport => "subtopic_report",
        }
    }

    /// What the report should look like, phrased for a writing prompt
    pub fn instructions(self) -> &'static str {
        match self {
            ReportType::ResearchReport | ReportType::DetailedReport | ReportType::CustomReport => {
                "a detailed, well-structured research report in Markdown with an introduction, \
                 findings organised under headings, a conclusion and a list of references"
            }
            ReportType::ResourceReport => {
                "a bibliography-style resource report in Markdown that lists the most relevant \
                 sources and summarises what each contributes"
            }
            ReportType::OutlineReport => {
                "a Markdown outline of a research report: headings and bullet points only, no prose"
            }
            ReportType::SubtopicReport => {
                "a focused Markdown report on this single subtopic, without an introduction \
                 or conclusion"
            }
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Writing tone for a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Objective,
    Formal,
    Analytical,
    Persuasive,
    Informative,
    Explanatory,
    Descriptive,
    Critical,
    Comparative,
    Speculative,
    Reflective,
    Narrative,
    Humorous,
    Optimistic,
    Pessimistic,
}

impl Tone {
    /// Look a tone up by name; anything unrecognised is objective
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "formal" => Tone::Formal,
            "analytical" => Tone::Analytical,
            "persuasive" => Tone::Persuasive,
            "informative" => Tone::Informative,
            "explanatory" => Tone::Explanatory,
            "descriptive" => Tone::Descriptive,
            "critical" => Tone::Critical,
            "comparative" => Tone::Comparative,
            "speculative" => Tone::Speculative,
            "reflective" => Tone::Reflective,
            "narrative" => Tone::Narrative,
            "humorous" => Tone::Humorous,
            "optimistic" => Tone::Optimistic,
            "pessimistic" => Tone::Pessimistic,
            _ => Tone::Objective,
        }
    }

    /// Prompt phrasing for the tone
    pub fn describe(self) -> &'static str {
        match self {
            Tone::Objective => "Objective (impartial and unbiased presentation of facts and findings)",
            Tone::Formal => "Formal (adheres to academic standards with sophisticated language and structure)",
            Tone::Analytical => "Analytical (critical evaluation and detailed examination of data and theories)",
            Tone::Persuasive => "Persuasive (convincing the audience of a particular viewpoint or argument)",
            Tone::Informative => "Informative (providing clear and comprehensive information on a topic)",
            Tone::Explanatory => "Explanatory (clarifying complex concepts and processes)",
            Tone::Descriptive => "Descriptive (detailed depiction of phenomena, experiments, or case studies)",
            Tone::Critical => "Critical (judging the validity and relevance of the research and its conclusions)",
            Tone::Comparative => "Comparative (juxtaposing different theories, data, or methods to highlight differences and similarities)",
            Tone::Speculative => "Speculative (exploring hypotheses and potential implications or future research directions)",
            Tone::Reflective => "Reflective (considering the research process and personal insights or experiences)",
            Tone::Narrative => "Narrative (telling a story to illustrate research findings or methodologies)",
            Tone::Humorous => "Humorous (light-hearted and engaging, usually to make the content more relatable)",
            Tone::Optimistic => "Optimistic (highlighting positive findings and potential benefits)",
            Tone::Pessimistic => "Pessimistic (focusing on limitations, challenges, or negative outcomes)",
        }
    }
}

/// Arguments of the `research` command as they travel in the plugin message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchArgs {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub report_type: ReportType,
    #[serde(default = "default_tone")]
    pub tone: String,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub dry_run: bool,
}

fn default_tone() -> String {
    "objective".to_string()
}

impl ResearchArgs {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            report_type: ReportType::default(),
            tone: default_tone(),
            domains: Vec::new(),
            dry_run: false,
        }
    }
}

/// What a backend is asked to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub query: String,
    pub report_type: ReportType,
    pub tone: Tone,
    /// Restrict sources to these domains; empty means all
    pub domains: Vec<String>,
}

impl From<&ResearchArgs> for ReportRequest {
    fn from(args: &ResearchArgs) -> Self {
        Self {
            query: args.query.clone(),
            report_type: args.report_type,
            tone: Tone::from_name(&args.tone),
            domains: args.domains.clone(),
        }
    }
}

/// Research errors
#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    #[error("Invalid research arguments: {0}")]
    InvalidArgs(String),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("Failed to save report: {0}")]
    Io(#[from] std::io::Error),

    #[error("The model returned an empty report")]
    EmptyReport,
}

/// Something that turns a research request into Markdown
#[async_trait::async_trait]
pub trait ResearchBackend: Send + Sync {
    async fn write_report(&self, request: &ReportRequest) -> Result<String, ResearchError>;
}
