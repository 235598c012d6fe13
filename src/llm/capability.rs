//! Model families and the request parameters each of them accepts.
//!
//! GPT-5 models reject a custom `temperature`; everything about that restriction
//! is decided here once and carried around as an immutable [`ModelRouting`].

use crate::config::KernelConfig;
use std::collections::BTreeMap;

/// Optional request parameters a model family may or may not accept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    Temperature,
    MaxTokens,
    ResponseFormat,
}

/// Coarse model family used for parameter restrictions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    /// gpt-5, gpt-5-mini, gpt-5-nano, ...
    Gpt5,
    Standard,
}

/// Temperature GPT-5 models always run at
pub const GPT5_TEMPERATURE: f32 = 1.0;

const GPT5_DEFAULT_MODEL: &str = "gpt-5";
const GPT5_FAST_MODEL: &str = "gpt-5-mini";
const GPT5_SUMMARY_MODEL: &str = "gpt-5-nano";

impl ModelFamily {
    /// Classify a model name (`gpt-5` or `gpt5`, any case, anywhere in the name)
    pub fn from_model(model: &str) -> Self {
        let lower = model.to_lowercase();
        if lower.contains("gpt-5") || lower.contains("gpt5") {
            ModelFamily::Gpt5
        } else {
            ModelFamily::Standard
        }
    }

    /// Classify a provider/model pair; the `gpt5` provider implies the family
    pub fn detect(provider: &str, model: &str) -> Self {
        if provider == "gpt5" {
            return ModelFamily::Gpt5;
        }
        Self::from_model(model)
    }

    /// Parameters this family accepts on a chat-completion request
    pub fn allowed_parameters(self) -> &'static [Parameter] {
        match self {
            ModelFamily::Gpt5 => &[Parameter::MaxTokens, Parameter::ResponseFormat],
            ModelFamily::Standard => &[
                Parameter::Temperature,
                Parameter::MaxTokens,
                Parameter::ResponseFormat,
            ],
        }
    }

    pub fn supports(self, parameter: Parameter) -> bool {
        self.allowed_parameters().contains(&parameter)
    }
}

/// Resolved model-routing settings
///
/// Computed once from the kernel config and the model-routing environment
/// variables, then passed to whoever builds LLM requests.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRouting {
    pub provider: String,
    pub family: ModelFamily,
    pub openai_api_model: Option<String>,
    pub smart_llm_model: Option<String>,
    pub fast_llm_model: Option<String>,
    pub summary_llm_model: Option<String>,
    pub temperature: Option<f32>,
    /// False when the family forbids a caller-chosen temperature
    pub custom_temperature: bool,
}

impl ModelRouting {
    /// Resolve routing from config plus `OPENAI_API_MODEL`, `SMART_LLM_MODEL`,
    /// `FAST_LLM_MODEL`, `SUMMARY_LLM_MODEL` and `TEMPERATURE`.
    pub fn resolve<F>(config: &KernelConfig, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let family = ModelFamily::detect(&config.llm_provider, &config.llm_model);

        let temperature = lookup("TEMPERATURE").and_then(|raw| match raw.parse::<f32>() {
            Ok(t) => Some(t),
            Err(_) => {
                tracing::warn!(value = %raw, "ignoring unparsable TEMPERATURE");
                None
            }
        });

        let mut routing = Self {
            provider: config.llm_provider.clone(),
            family,
            openai_api_model: lookup("OPENAI_API_MODEL"),
            smart_llm_model: lookup("SMART_LLM_MODEL"),
            fast_llm_model: lookup("FAST_LLM_MODEL"),
            summary_llm_model: lookup("SUMMARY_LLM_MODEL"),
            temperature,
            custom_temperature: true,
        };

        if family == ModelFamily::Gpt5 {
            tracing::info!(model = %config.llm_model, "detected GPT-5 model");

            routing.temperature = Some(GPT5_TEMPERATURE);
            routing.custom_temperature = false;

            if config.llm_provider == "gpt5" {
                let model = if config.llm_model.is_empty() {
                    GPT5_DEFAULT_MODEL.to_string()
                } else {
                    config.llm_model.clone()
                };
                routing.openai_api_model = Some(model.clone());
                routing.smart_llm_model = Some(model);
                routing.fast_llm_model = Some(GPT5_FAST_MODEL.to_string());
                routing.summary_llm_model = Some(GPT5_SUMMARY_MODEL.to_string());
            }

            tracing::info!(
                temperature = GPT5_TEMPERATURE,
                model = ?routing.openai_api_model,
                "applied GPT-5 settings"
            );
        }

        routing
    }

    /// Model used when a request does not name one
    pub fn default_model(&self, config: &KernelConfig) -> String {
        self.openai_api_model
            .clone()
            .or_else(|| self.smart_llm_model.clone())
            .unwrap_or_else(|| config.llm_model.clone())
    }

    /// Model for long-form writing
    pub fn smart_model(&self, config: &KernelConfig) -> String {
        self.smart_llm_model
            .clone()
            .unwrap_or_else(|| self.default_model(config))
    }

    /// Model for cheap, quick calls (planning, reviewing)
    pub fn fast_model(&self, config: &KernelConfig) -> String {
        self.fast_llm_model
            .clone()
            .unwrap_or_else(|| self.default_model(config))
    }

    /// Temperature a caller should request, if any
    pub fn request_temperature(&self) -> Option<f32> {
        if self.custom_temperature {
            self.temperature
        } else {
            None
        }
    }

    /// Variables a child plugin process needs to see the same routing
    pub fn to_env(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();

        let models = [
            ("OPENAI_API_MODEL", &self.openai_api_model),
            ("SMART_LLM_MODEL", &self.smart_llm_model),
            ("FAST_LLM_MODEL", &self.fast_llm_model),
            ("SUMMARY_LLM_MODEL", &self.summary_llm_model),
        ];
        for (name, value) in models {
            if let Some(value) = value {
                env.insert(name.to_string(), value.clone());
            }
        }

        if let Some(t) = self.temperature {
            env.insert("TEMPERATURE".to_string(), format!("{t:.1}"));
        }

        if !self.custom_temperature {
            env.insert("GPTR_TEMPERATURE".to_string(), format!("{GPT5_TEMPERATURE:.1}"));
            env.insert("GPTR_NO_CUSTOM_TEMPERATURE".to_string(), "true".to_string());
        }

        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: &str, model: &str) -> KernelConfig {
        KernelConfig {
            llm_provider: provider.to_string(),
            llm_model: model.to_string(),
            ..KernelConfig::default()
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_family_matches_both_spellings() {
        assert_eq!(ModelFamily::from_model("gpt-5"), ModelFamily::Gpt5);
        assert_eq!(ModelFamily::from_model("GPT5-turbo"), ModelFamily::Gpt5);
        assert_eq!(ModelFamily::from_model("openai:gpt-5-mini"), ModelFamily::Gpt5);
        assert_eq!(ModelFamily::from_model("gpt-4o"), ModelFamily::Standard);
        assert_eq!(ModelFamily::from_model(""), ModelFamily::Standard);
    }

    #[test]
    fn test_gpt5_provider_implies_family() {
        assert_eq!(ModelFamily::detect("gpt5", "anything"), ModelFamily::Gpt5);
        assert_eq!(ModelFamily::detect("openai", "gpt-4.1"), ModelFamily::Standard);
    }

    #[test]
    fn test_gpt5_disallows_temperature() {
        assert!(!ModelFamily::Gpt5.supports(Parameter::Temperature));
        assert!(ModelFamily::Gpt5.supports(Parameter::MaxTokens));
        assert!(ModelFamily::Standard.supports(Parameter::Temperature));
    }

    #[test]
    fn test_gpt5_provider_routes_models() {
        let routing = ModelRouting::resolve(&config("gpt5", "gpt-5"), no_env);

        assert_eq!(routing.family, ModelFamily::Gpt5);
        assert_eq!(routing.temperature, Some(1.0));
        assert!(!routing.custom_temperature);
        assert_eq!(routing.openai_api_model.as_deref(), Some("gpt-5"));
        assert_eq!(routing.smart_llm_model.as_deref(), Some("gpt-5"));
        assert_eq!(routing.fast_llm_model.as_deref(), Some("gpt-5-mini"));
        assert_eq!(routing.summary_llm_model.as_deref(), Some("gpt-5-nano"));
        assert_eq!(routing.request_temperature(), None);
    }

    #[test]
    fn test_gpt5_overrides_temperature_env() {
        let routing = ModelRouting::resolve(&config("openai", "gpt-5-mini"), |name| {
            (name == "TEMPERATURE").then(|| "0.2".to_string())
        });

        assert_eq!(routing.temperature, Some(1.0));
        // Only the gpt5 provider rewrites model routing.
        assert_eq!(routing.openai_api_model, None);

        let env = routing.to_env();
        assert_eq!(env.get("TEMPERATURE").map(String::as_str), Some("1.0"));
        assert_eq!(env.get("GPTR_TEMPERATURE").map(String::as_str), Some("1.0"));
        assert_eq!(
            env.get("GPTR_NO_CUSTOM_TEMPERATURE").map(String::as_str),
            Some("true")
        );
    }

    #[test]
    fn test_standard_model_keeps_environment() {
        let routing = ModelRouting::resolve(&config("openai", "gpt-4o"), |name| match name {
            "TEMPERATURE" => Some("0.35".to_string()),
            "SMART_LLM_MODEL" => Some("gpt-4.1".to_string()),
            _ => None,
        });

        assert_eq!(routing.family, ModelFamily::Standard);
        assert_eq!(routing.request_temperature(), Some(0.35));
        assert_eq!(routing.smart_llm_model.as_deref(), Some("gpt-4.1"));
        assert!(!routing.to_env().contains_key("GPTR_NO_CUSTOM_TEMPERATURE"));
    }

    #[test]
    fn test_empty_gpt5_model_defaults() {
        let routing = ModelRouting::resolve(&config("gpt5", ""), no_env);
        assert_eq!(routing.openai_api_model.as_deref(), Some("gpt-5"));
    }

    #[test]
    fn test_default_model_falls_back_to_config() {
        let cfg = config("openai", "gpt-4o");
        let routing = ModelRouting::resolve(&cfg, no_env);
        assert_eq!(routing.default_model(&cfg), "gpt-4o");
        assert_eq!(routing.fast_model(&cfg), "gpt-4o");
    }
}
