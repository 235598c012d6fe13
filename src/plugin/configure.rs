use super::base::{Plugin, PluginError, PluginOutput, PluginRequest};
use crate::config::{self, KernelConfig};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;

/// `config show|get|set` - inspect and persist kernel settings
pub struct ConfigPlugin {
    settings_path: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Action {
    Show,
    Get,
    Set,
}

#[derive(Debug, Deserialize)]
struct ConfigParams {
    action: Action,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    value: Option<String>,
}

impl ConfigPlugin {
    pub fn new(settings_path: impl Into<PathBuf>) -> Self {
        Self {
            settings_path: settings_path.into(),
        }
    }

    fn show(&self, config: &KernelConfig) -> Value {
        json!({
            "status": "success",
            "message": "Current configuration",
            "config": config,
            "settings_file": self.settings_path.display().to_string(),
        })
    }

    fn get(&self, config: &KernelConfig, key: Option<&str>) -> Value {
        let Some(key) = key else {
            return error("config get requires a key");
        };

        match config.get(key) {
            Ok(value) => json!({ "status": "success", "key": key, "value": value }),
            Err(e) => error(e),
        }
    }

    fn set(&self, config: &KernelConfig, key: Option<&str>, value: Option<&str>) -> Value {
        let (Some(key), Some(value)) = (key, value) else {
            return error("config set requires a key and a value");
        };

        // Validate against a scratch copy before touching the file.
        let mut updated = config.clone();
        if let Err(e) = updated.set(key, value) {
            return error(e);
        }

        if let Err(e) = config::save_setting(&self.settings_path, key, value) {
            return error(format!("{e:#}"));
        }

        tracing::info!(key = %key, file = %self.settings_path.display(), "saved setting");

        json!({
            "status": "success",
            "message": format!("Updated {key}"),
            "key": key,
            "value": updated.get(key).unwrap_or_else(|_| value.to_string()),
            "settings_file": self.settings_path.display().to_string(),
        })
    }
}

fn error(e: impl std::fmt::Display) -> Value {
    json!({ "status": "error", "error": e.to_string() })
}

#[async_trait::async_trait]
impl Plugin for ConfigPlugin {
    fn name(&self) -> &str {
        "config"
    }

    fn description(&self) -> &str {
        "Manage configuration"
    }

    async fn execute(&self, request: &PluginRequest) -> Result<PluginOutput, PluginError> {
        let params: ConfigParams = serde_json::from_value(request.args.clone())
            .map_err(|e| PluginError::InvalidInput(e.to_string()))?;

        let result = match params.action {
            Action::Show => self.show(&request.config),
            Action::Get => self.get(&request.config, params.key.as_deref()),
            Action::Set => self.set(
                &request.config,
                params.key.as_deref(),
                params.value.as_deref(),
            ),
        };

        Ok(PluginOutput::from_result(&result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn request(args: Value) -> PluginRequest {
        PluginRequest::new("config", args, KernelConfig::default())
    }

    fn body(output: &PluginOutput) -> Value {
        serde_json::from_str(&output.stdout).unwrap()
    }

    #[tokio::test]
    async fn test_show_prints_config() {
        let dir = TempDir::new().unwrap();
        let plugin = ConfigPlugin::new(dir.path().join("config.toml"));

        let output = plugin.execute(&request(json!({"action": "show"}))).await.unwrap();

        assert_eq!(output.exit_code, 0);
        assert_eq!(body(&output)["config"]["llm_model"], "gpt-5");
    }

    #[tokio::test]
    async fn test_get_known_and_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let plugin = ConfigPlugin::new(dir.path().join("config.toml"));

        let output = plugin
            .execute(&request(json!({"action": "get", "key": "exporter"})))
            .await
            .unwrap();
        assert_eq!(body(&output)["value"], "markdown");

        let output = plugin
            .execute(&request(json!({"action": "get", "key": "colour"})))
            .await
            .unwrap();
        assert_eq!(output.exit_code, 1);
        assert_eq!(body(&output)["status"], "error");
    }

    #[tokio::test]
    async fn test_set_persists_to_settings_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let plugin = ConfigPlugin::new(&path);

        let output = plugin
            .execute(&request(
                json!({"action": "set", "key": "llm_model", "value": "gpt-5-mini"}),
            ))
            .await
            .unwrap();

        assert_eq!(output.exit_code, 0);
        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains("gpt-5-mini"));
    }

    #[tokio::test]
    async fn test_set_rejects_bad_value_without_writing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let plugin = ConfigPlugin::new(&path);

        let output = plugin
            .execute(&request(
                json!({"action": "set", "key": "dry_run", "value": "sometimes"}),
            ))
            .await
            .unwrap();

        assert_eq!(output.exit_code, 1);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_set_requires_value() {
        let dir = TempDir::new().unwrap();
        let plugin = ConfigPlugin::new(dir.path().join("config.toml"));

        let output = plugin
            .execute(&request(json!({"action": "set", "key": "llm_model"})))
            .await
            .unwrap();
        assert_eq!(output.exit_code, 1);
    }

    #[tokio::test]
    async fn test_unknown_action_is_invalid_input() {
        let dir = TempDir::new().unwrap();
        let plugin = ConfigPlugin::new(dir.path().join("config.toml"));

        let err = plugin
            .execute(&request(json!({"action": "delete"})))
            .await
            .unwrap_err();
        assert!(matches!(err, PluginError::InvalidInput(_)));
    }
}
