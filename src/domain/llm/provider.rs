use async_trait::async_trait;
use std::fmt::Debug;

use super::{LlmRequest, LlmResponse};
use crate::domain::DomainError;

/// Trait for LLM providers (OpenAI, Anthropic, etc.)
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Send a chat completion request
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::domain::llm::{Message, Usage};
    use std::sync::Mutex;

    /// Mock LLM provider that replays queued responses in order.
    ///
    /// When the queue runs out the last response is repeated, so tests
    /// that issue several calls can queue one response per section or a
    /// single shared one.
    #[derive(Debug)]
    pub struct MockLlmProvider {
        name: &'static str,
        responses: Mutex<Vec<LlmResponse>>,
        next: Mutex<usize>,
        error: Option<String>,
    }

    impl MockLlmProvider {
        pub fn new(name: &'static str) -> Self {
            Self {
                name,
                responses: Mutex::new(Vec::new()),
                next: Mutex::new(0),
                error: None,
            }
        }

        pub fn with_response(self, response: LlmResponse) -> Self {
            self.responses.lock().unwrap().push(response);
            self
        }

        /// Queue a plain assistant text reply with token usage.
        pub fn with_text_response(self, content: impl Into<String>) -> Self {
            let response = LlmResponse::new(
                "mock-resp".to_string(),
                "mock-model".to_string(),
                Message::assistant(content),
            )
            .with_usage(Usage::new(100, 50));
            self.with_response(response)
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        /// Number of chat calls received so far.
        pub fn calls(&self) -> usize {
            *self.next.lock().unwrap()
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn chat(
            &self,
            _model: &str,
            _request: LlmRequest,
        ) -> Result<LlmResponse, DomainError> {
            let mut next = self.next.lock().unwrap();
            *next += 1;

            if let Some(ref error) = self.error {
                return Err(DomainError::provider(self.name, error));
            }

            let responses = self.responses.lock().unwrap();
            responses
                .get((*next - 1).min(responses.len().saturating_sub(1)))
                .cloned()
                .ok_or_else(|| DomainError::provider(self.name, "No mock response configured"))
        }

        fn provider_name(&self) -> &'static str {
            self.name
        }
    }
}
