use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Keys accepted by `config get` / `config set`, in display order.
pub const KEYS: [&str; 9] = [
    "llm_provider",
    "llm_model",
    "data_source",
    "exporter",
    "output_dir",
    "cache_dir",
    "plugin_registry",
    "log_level",
    "dry_run",
];

/// Kernel configuration handed to every plugin as the `config` field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KernelConfig {
    /// LLM provider name (`gpt5`, `openai`, ...)
    #[serde(default = "default_llm_provider")]
    pub llm_provider: String,

    /// Model identifier
    #[serde(default = "default_llm_model")]
    pub llm_model: String,

    /// Where research material comes from
    #[serde(default = "default_data_source")]
    pub data_source: String,

    /// Report exporter
    #[serde(default = "default_exporter")]
    pub exporter: String,

    /// Directory reports are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// JSON file listing external plugins
    #[serde(default = "default_plugin_registry")]
    pub plugin_registry: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Simulate research without any model calls
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            llm_provider: default_llm_provider(),
            llm_model: default_llm_model(),
            data_source: default_data_source(),
            exporter: default_exporter(),
            output_dir: default_output_dir(),
            cache_dir: default_cache_dir(),
            plugin_registry: default_plugin_registry(),
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown config key '{0}'. Valid keys: {keys}", keys = KEYS.join(", "))]
    UnknownKey(String),

    #[error("Invalid value '{value}' for '{key}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

impl KernelConfig {
    /// Build a config from defaults, an optional settings table and an environment lookup.
    ///
    /// Environment variables (`GPTR_<KEY>`) win over the settings file.
    pub fn from_sources<F>(settings: Option<&toml::Table>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(table) = settings {
            for (key, value) in table {
                let raw = match value {
                    toml::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                if let Err(e) = config.set(key, &raw) {
                    tracing::warn!(key = %key, error = %e, "ignoring settings file entry");
                }
            }
        }

        for key in KEYS {
            let Some(raw) = lookup(&env_var_name(key)) else {
                continue;
            };

            // GPTR_DRY_RUN only switches on for a literal "true".
            if key == "dry_run" {
                config.dry_run = raw.eq_ignore_ascii_case("true");
                continue;
            }

            if let Err(e) = config.set(key, &raw) {
                tracing::warn!(key = %key, error = %e, "ignoring environment override");
            }
        }

        config
    }

    /// Read a single value by key
    pub fn get(&self, key: &str) -> Result<String, ConfigError> {
        let value = match key {
            "llm_provider" => self.llm_provider.clone(),
            "llm_model" => self.llm_model.clone(),
            "data_source" => self.data_source.clone(),
            "exporter" => self.exporter.clone(),
            "output_dir" => self.output_dir.display().to_string(),
            "cache_dir" => self.cache_dir.display().to_string(),
            "plugin_registry" => self.plugin_registry.display().to_string(),
            "log_level" => self.log_level.clone(),
            "dry_run" => self.dry_run.to_string(),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        };
        Ok(value)
    }

    /// Update a single value by key
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "llm_provider" => self.llm_provider = value.to_string(),
            "llm_model" => self.llm_model = value.to_string(),
            "data_source" => self.data_source = value.to_string(),
            "exporter" => self.exporter = value.to_string(),
            "output_dir" => self.output_dir = PathBuf::from(value),
            "cache_dir" => self.cache_dir = PathBuf::from(value),
            "plugin_registry" => self.plugin_registry = PathBuf::from(value),
            "log_level" => self.log_level = value.to_string(),
            "dry_run" => self.dry_run = parse_bool(key, value)?,
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Render the config as `GPTR_*` variables for child plugin processes
    pub fn to_env(&self) -> BTreeMap<String, String> {
        KEYS.iter()
            .filter_map(|key| {
                self.get(key)
                    .ok()
                    .map(|value| (env_var_name(key), value))
            })
            .collect()
    }
}

/// `llm_model` -> `GPTR_LLM_MODEL`
pub fn env_var_name(key: &str) -> String {
    format!("GPTR_{}", key.to_uppercase())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

fn gptr_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".gptr")
}

fn default_llm_provider() -> String {
    "gpt5".to_string()
}

fn default_llm_model() -> String {
    "gpt-5".to_string()
}

fn default_data_source() -> String {
    "web".to_string()
}

fn default_exporter() -> String {
    "markdown".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./outputs")
}

fn default_cache_dir() -> PathBuf {
    gptr_home().join("cache")
}

fn default_plugin_registry() -> PathBuf {
    gptr_home().join("plugins.json")
}

fn default_log_level() -> String {
    "INFO".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = KernelConfig::from_sources(None, lookup(&[]));
        assert_eq!(config.llm_provider, "gpt5");
        assert_eq!(config.llm_model, "gpt-5");
        assert_eq!(config.data_source, "web");
        assert_eq!(config.exporter, "markdown");
        assert_eq!(config.output_dir, PathBuf::from("./outputs"));
        assert_eq!(config.log_level, "INFO");
        assert!(!config.dry_run);
        assert!(config.cache_dir.ends_with(".gptr/cache"));
        assert!(config.plugin_registry.ends_with(".gptr/plugins.json"));
    }

    #[test]
    fn test_environment_overrides_settings_file() {
        let table: toml::Table = toml::from_str(
            r#"
            llm_model = "gpt-4o"
            exporter = "pdf"
            dry_run = true
            "#,
        )
        .unwrap();

        let config = KernelConfig::from_sources(
            Some(&table),
            lookup(&[("GPTR_LLM_MODEL", "gpt-5-mini"), ("GPTR_DRY_RUN", "False")]),
        );

        assert_eq!(config.llm_model, "gpt-5-mini");
        assert_eq!(config.exporter, "pdf");
        assert!(!config.dry_run);
    }

    #[test]
    fn test_dry_run_env_is_case_insensitive() {
        let config = KernelConfig::from_sources(None, lookup(&[("GPTR_DRY_RUN", "TRUE")]));
        assert!(config.dry_run);

        let config = KernelConfig::from_sources(None, lookup(&[("GPTR_DRY_RUN", "1")]));
        assert!(!config.dry_run);
    }

    #[test]
    fn test_get_and_set_round_trip_keys() {
        let mut config = KernelConfig::default();
        config.set("output_dir", "/tmp/reports").unwrap();
        config.set("dry_run", "yes").unwrap();

        assert_eq!(config.get("output_dir").unwrap(), "/tmp/reports");
        assert_eq!(config.get("dry_run").unwrap(), "true");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut config = KernelConfig::default();
        assert!(matches!(
            config.set("nope", "x"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(config.get("nope"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn test_invalid_bool_rejected() {
        let mut config = KernelConfig::default();
        let err = config.set("dry_run", "maybe").unwrap_err();
        assert!(err.to_string().contains("dry_run"));
    }

    #[test]
    fn test_to_env_uses_gptr_prefix() {
        let config = KernelConfig::default();
        let env = config.to_env();
        assert_eq!(env.len(), KEYS.len());
        assert_eq!(env.get("GPTR_LLM_PROVIDER").map(String::as_str), Some("gpt5"));
        assert_eq!(env.get("GPTR_DRY_RUN").map(String::as_str), Some("false"));
    }

    #[test]
    fn test_serializes_as_plugin_config_object() {
        let value = serde_json::to_value(KernelConfig::default()).unwrap();
        assert_eq!(value["llm_provider"], "gpt5");
        assert_eq!(value["dry_run"], false);
        assert_eq!(value["output_dir"], "./outputs");
    }
}
