use crate::config::KernelConfig;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Message the kernel hands to a plugin: `{command, args, config}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginRequest {
    pub command: String,
    #[serde(default = "empty_object")]
    pub args: Value,
    #[serde(default)]
    pub config: KernelConfig,
}

impl PluginRequest {
    pub fn new(command: impl Into<String>, args: Value, config: KernelConfig) -> Self {
        Self {
            command: command.into(),
            args,
            config,
        }
    }
}

fn empty_object() -> Value {
    json!({})
}

/// What a plugin run produced, in process terms
///
/// Out-of-process plugins fill this verbatim from the child; in-process
/// plugins render their JSON result into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginOutput {
    /// JSON result text
    pub stdout: String,
    /// Diagnostics
    pub stderr: String,
    pub exit_code: i32,
}

impl PluginOutput {
    /// Pretty-print `result` to stdout; exit 0 only for `"status": "success"`
    pub fn from_result(result: &Value) -> Self {
        let success = result.get("status").and_then(Value::as_str) == Some("success");
        Self {
            stdout: to_pretty(result),
            stderr: String::new(),
            exit_code: if success { 0 } else { 1 },
        }
    }

    /// Compact error object on stderr, exit 1
    pub fn failure(error: impl std::fmt::Display) -> Self {
        let body = json!({ "status": "error", "error": error.to_string() });
        Self {
            stdout: String::new(),
            stderr: body.to_string(),
            exit_code: 1,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

fn to_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Plugin execution errors
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("Invalid plugin input: {0}")]
    InvalidInput(String),

    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Plugin I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Base plugin trait - every kernel command is served by one
#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
    /// Command name the plugin answers to (e.g., "research", "config")
    fn name(&self) -> &str;

    /// One-line description for listings
    fn description(&self) -> &str;

    /// Run the plugin for one request
    async fn execute(&self, request: &PluginRequest) -> Result<PluginOutput, PluginError>;
}
