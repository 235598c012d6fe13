use super::ResearchArgs;
use crate::config::KernelConfig;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Whether a report came from the backend or was simulated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchMode {
    Live,
    DryRun,
}

/// The slice of config a result reports back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUsed {
    pub llm_provider: String,
    pub llm_model: String,
    pub data_source: String,
}

impl From<&KernelConfig> for ConfigUsed {
    fn from(config: &KernelConfig) -> Self {
        Self {
            llm_provider: config.llm_provider.clone(),
            llm_model: config.llm_model.clone(),
            data_source: config.data_source.clone(),
        }
    }
}

/// Successful research result as printed by the plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchOutcome {
    pub status: String,
    pub mode: ResearchMode,
    pub output_path: PathBuf,
    /// Report length in characters
    pub report_length: usize,
    pub message: String,
    pub config_used: ConfigUsed,
}

impl ResearchOutcome {
    pub fn new(mode: ResearchMode, output_path: PathBuf, report: &str, config: &KernelConfig) -> Self {
        let message = match mode {
            ResearchMode::Live => "Research completed successfully",
            ResearchMode::DryRun => "Dry run completed successfully",
        };
        Self {
            status: "success".to_string(),
            mode,
            output_path,
            report_length: report.chars().count(),
            message: message.to_string(),
            config_used: ConfigUsed::from(config),
        }
    }
}

/// Canned report used by dry runs
pub fn render_dry_run(args: &ResearchArgs, config: &KernelConfig, now: DateTime<Local>) -> String {
    let query = &args.query;
    let domains = if args.domains.is_empty() {
        "all".to_string()
    } else {
        args.domains.join(", ")
    };

    format!(
        r#"# Research Report: {query}

## Executive Summary
This is a DRY RUN simulation of a research report on "{query}".

## Configuration
- Report Type: {report_type}
- Tone: {tone}
- Domains: {domains}
- LLM Provider: {provider}
- LLM Model: {model}

## Key Findings
1. **Finding 1**: In a real run, this would contain actual research findings
2. **Finding 2**: The system would search multiple sources and synthesize information
3. **Finding 3**: Results would be formatted according to the specified tone

## Sources
- Source 1: https://example.com/article1
- Source 2: https://example.com/article2
- Source 3: https://example.com/article3

## Conclusion
This dry run demonstrates the research report structure without making actual API calls.

---
*Generated: {generated}*
*Mode: DRY RUN*
"#,
        report_type = args.report_type,
        tone = args.tone,
        provider = config.llm_provider,
        model = config.llm_model,
        generated = now.to_rfc3339(),
    )
}

/// Write `content` to `<output_dir>/<prefix><uuid>.md`, creating the directory
pub async fn save_report(output_dir: &Path, prefix: &str, content: &str) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(output_dir).await?;

    let output_path = output_dir.join(format!("{}{}.md", prefix, Uuid::new_v4()));
    tokio::fs::write(&output_path, content).await?;

    tracing::info!(
        path = %output_path.display(),
        bytes = content.len(),
        "saved report"
    );

    Ok(output_path)
}
