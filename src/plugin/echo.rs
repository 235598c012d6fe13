use super::base::{Plugin, PluginError, PluginOutput, PluginRequest};
use serde_json::json;

/// Example plugin - echoes its command, args and effective config
///
/// `GPTR_LLM_PROVIDER` / `GPTR_DATA_SOURCE` seen at startup win over the
/// request config, the way a plugin launched by the kernel sees both.
#[derive(Debug, Clone, Default)]
pub struct EchoPlugin {
    llm_provider: Option<String>,
    data_source: Option<String>,
}

impl EchoPlugin {
    pub fn from_env() -> Self {
        Self {
            llm_provider: std::env::var("GPTR_LLM_PROVIDER").ok(),
            data_source: std::env::var("GPTR_DATA_SOURCE").ok(),
        }
    }
}

#[async_trait::async_trait]
impl Plugin for EchoPlugin {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo the request back; demonstrates the plugin protocol"
    }

    async fn execute(&self, request: &PluginRequest) -> Result<PluginOutput, PluginError> {
        let llm_provider = self
            .llm_provider
            .clone()
            .unwrap_or_else(|| request.config.llm_provider.clone());
        let data_source = self
            .data_source
            .clone()
            .unwrap_or_else(|| request.config.data_source.clone());

        let result = json!({
            "status": "success",
            "command": request.command,
            "message": "Plugin executed successfully",
            "config": {
                "llm_provider": llm_provider,
                "data_source": data_source,
            },
            "args": request.args,
        });

        Ok(PluginOutput::from_result(&result))
    }
}
