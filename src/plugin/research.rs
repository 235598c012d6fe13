use super::base::{Plugin, PluginError, PluginOutput, PluginRequest};
use crate::config::KernelConfig;
use crate::research::report::{render_dry_run, save_report};
use crate::research::{
    LlmResearcher, ReportRequest, ResearchArgs, ResearchBackend, ResearchError, ResearchMode,
    ResearchOutcome,
};
use chrono::Local;
use serde_json::{json, Value};
use std::sync::Arc;

/// `research` - write a report for a query and save it under the output dir
///
/// Without an injected backend each live run wires an [`LlmResearcher`] from
/// the request config and the process environment.
#[derive(Default)]
pub struct ResearchPlugin {
    backend: Option<Arc<dyn ResearchBackend>>,
}

impl ResearchPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(backend: Arc<dyn ResearchBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    fn backend_for(&self, config: &KernelConfig) -> Arc<dyn ResearchBackend> {
        match &self.backend {
            Some(backend) => backend.clone(),
            None => Arc::new(LlmResearcher::from_config(config, |key| {
                std::env::var(key).ok()
            })),
        }
    }

    /// Run one research request and return the outcome
    ///
    /// `dry_run` in either the args or the config skips every model call and
    /// accepts any query, including an empty one.
    pub async fn run(
        &self,
        args: &ResearchArgs,
        config: &KernelConfig,
    ) -> Result<ResearchOutcome, ResearchError> {
        if args.dry_run || config.dry_run {
            tracing::info!(query = %args.query, "dry run, no API calls");
            let report = render_dry_run(args, config, Local::now());
            let path = save_report(&config.output_dir, "dry_run_", &report).await?;
            return Ok(ResearchOutcome::new(ResearchMode::DryRun, path, &report, config));
        }

        if args.query.trim().is_empty() {
            return Err(ResearchError::InvalidArgs("query must not be empty".to_string()));
        }

        tracing::info!(
            query = %args.query,
            report_type = %args.report_type,
            tone = %args.tone,
            provider = %config.llm_provider,
            model = %config.llm_model,
            "starting research"
        );

        let report = self
            .backend_for(config)
            .write_report(&ReportRequest::from(args))
            .await?;
        let path = save_report(&config.output_dir, "", &report).await?;

        Ok(ResearchOutcome::new(ResearchMode::Live, path, &report, config))
    }
}

fn failure(e: &ResearchError) -> Value {
    json!({
        "status": "error",
        "error": e.to_string(),
        "message": "Research failed",
        "hint": "Try running with --dry-run to test the setup",
    })
}

#[async_trait::async_trait]
impl Plugin for ResearchPlugin {
    fn name(&self) -> &str {
        "research"
    }

    fn description(&self) -> &str {
        "Conduct research on a query and save a Markdown report"
    }

    async fn execute(&self, request: &PluginRequest) -> Result<PluginOutput, PluginError> {
        let result = match serde_json::from_value::<ResearchArgs>(request.args.clone()) {
            Ok(args) => match self.run(&args, &request.config).await {
                Ok(outcome) => serde_json::to_value(&outcome)
                    .map_err(|e| PluginError::Other(e.into()))?,
                Err(e) => {
                    tracing::error!(error = %e, "research failed");
                    failure(&e)
                }
            },
            Err(e) => failure(&ResearchError::InvalidArgs(e.to_string())),
        };

        Ok(PluginOutput::from_result(&result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingBackend {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ResearchBackend for CountingBackend {
        async fn write_report(&self, request: &ReportRequest) -> Result<String, ResearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("# {}\n", request.query))
        }
    }

    fn config(dir: &TempDir) -> KernelConfig {
        KernelConfig {
            output_dir: dir.path().join("outputs"),
            ..KernelConfig::default()
        }
    }

    #[tokio::test]
    async fn test_config_dry_run_skips_backend() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(CountingBackend {
            calls: AtomicUsize::new(0),
        });
        let plugin = ResearchPlugin::with_backend(backend.clone());
        let config = KernelConfig {
            dry_run: true,
            ..config(&dir)
        };

        let outcome = plugin.run(&ResearchArgs::new("q"), &config).await.unwrap();

        assert_eq!(outcome.mode, ResearchMode::DryRun);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        let name = outcome.output_path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("dry_run_"));
    }

    #[tokio::test]
    async fn test_live_run_saves_backend_report() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(CountingBackend {
            calls: AtomicUsize::new(0),
        });
        let plugin = ResearchPlugin::with_backend(backend.clone());

        let outcome = plugin
            .run(&ResearchArgs::new("rust"), &config(&dir))
            .await
            .unwrap();

        assert_eq!(outcome.mode, ResearchMode::Live);
        assert_eq!(outcome.report_length, "# rust\n".len());
        assert_eq!(std::fs::read_to_string(&outcome.output_path).unwrap(), "# rust\n");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_query_dry_run_still_writes_report() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(CountingBackend {
            calls: AtomicUsize::new(0),
        });
        let plugin = ResearchPlugin::with_backend(backend.clone());
        let request = PluginRequest::new(
            "research",
            json!({"query": "", "dry_run": true}),
            config(&dir),
        );

        let output = plugin.execute(&request).await.unwrap();

        assert_eq!(output.exit_code, 0);
        let body: Value = serde_json::from_str(&output.stdout).unwrap();
        assert_eq!(body["status"], "success");
        assert_eq!(body["mode"], "dry_run");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        let reports: Vec<_> = std::fs::read_dir(dir.path().join("outputs"))
            .unwrap()
            .collect();
        assert_eq!(reports.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected_with_hint() {
        let dir = TempDir::new().unwrap();
        let plugin = ResearchPlugin::new();
        let request = PluginRequest::new("research", json!({"query": " "}), config(&dir));

        let output = plugin.execute(&request).await.unwrap();

        assert_eq!(output.exit_code, 1);
        let body: Value = serde_json::from_str(&output.stdout).unwrap();
        assert_eq!(body["message"], "Research failed");
        assert_eq!(body["hint"], "Try running with --dry-run to test the setup");
    }
}
