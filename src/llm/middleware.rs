use super::capability::{ModelFamily, Parameter};
use super::types::ChatRequest;
use super::{ChatCompletion, LlmError};

/// Chat-completion wrapper that drops `temperature` for models that reject it
///
/// The model is the request's own `model`, else `default_model`. Compose it
/// around a client at construction time:
///
/// ```ignore
/// let llm = TemperatureGuard::new(OpenAiClient::new(settings), "gpt-5");
/// ```
pub struct TemperatureGuard<C> {
    inner: C,
    default_model: String,
}

impl<C> TemperatureGuard<C> {
    pub fn new(inner: C, default_model: impl Into<String>) -> Self {
        Self {
            inner,
            default_model: default_model.into(),
        }
    }

    fn resolved_family(&self, request: &ChatRequest) -> (ModelFamily, String) {
        let model = request
            .model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.default_model)
            .to_string();
        (ModelFamily::from_model(&model), model)
    }
}

#[async_trait::async_trait]
impl<C: ChatCompletion> ChatCompletion for TemperatureGuard<C> {
    async fn complete(&self, mut request: ChatRequest) -> Result<String, LlmError> {
        let (family, model) = self.resolved_family(&request);

        if request.temperature.is_some() && !family.supports(Parameter::Temperature) {
            request.temperature = None;
            tracing::debug!(model = %model, "removed temperature parameter");
        }

        self.inner.complete(request).await
    }
}
