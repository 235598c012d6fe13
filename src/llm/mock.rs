//! Canned chat-completion provider for tests.

use super::types::ChatRequest;
use super::{ChatCompletion, LlmError};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Mock LLM provider
///
/// Replies come from, in order: responses queued with [`MockLlm::push_response`]
/// / [`MockLlm::push_error`], then substring routing on the user message, then
/// the default response. Every request is recorded.
pub struct MockLlm {
    default_response: String,
    scripted: Mutex<VecDeque<Result<String, String>>>,
    history: Mutex<Vec<ChatRequest>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self::with_default_response("Mock LLM response")
    }

    pub fn with_default_response(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            scripted: Mutex::new(VecDeque::new()),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Queue a reply for the next unscripted call
    pub fn push_response(&self, response: impl Into<String>) -> &Self {
        self.scripted
            .lock()
            .unwrap()
            .push_back(Ok(response.into()));
        self
    }

    /// Queue a failure for the next unscripted call
    pub fn push_error(&self, message: impl Into<String>) -> &Self {
        self.scripted
            .lock()
            .unwrap()
            .push_back(Err(message.into()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.history.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Option<ChatRequest> {
        self.history.lock().unwrap().last().cloned()
    }

    pub fn calls(&self) -> Vec<ChatRequest> {
        self.history.lock().unwrap().clone()
    }

    pub fn reset_history(&self) {
        self.history.lock().unwrap().clear();
    }

    fn routed_response(&self, request: &ChatRequest) -> String {
        let Some(content) = request.user_content() else {
            return self.default_response.clone();
        };
        let content = content.to_lowercase();

        if content.contains("review") && content.contains("accept") {
            if content.contains("good enough") || content.contains("meets all") {
                return "None".to_string();
            }
            return "Please improve the methodology section".to_string();
        }

        if content.contains("research") {
            return "Research findings: Mock data about the topic".to_string();
        }

        if content.contains("revise") {
            return "Revised content with improvements".to_string();
        }

        self.default_response.clone()
    }
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ChatCompletion for MockLlm {
    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError> {
        self.history.lock().unwrap().push(request.clone());

        if let Some(next) = self.scripted.lock().unwrap().pop_front() {
            return next.map_err(LlmError::Stream);
        }

        Ok(self.routed_response(&request))
    }
}
