use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::stream;
use serde_json::{json, Value};

use crate::application::{BackendClient, FragmentStream};
use crate::domain::{BackendMethod, DomainError, GenerationRequest, HealthReport};

/// Deterministic in-process backend for tests and offline runs.
pub struct MockBackend {
    response: String,
    fragments: Option<Vec<String>>,
    models: Value,
    stream_failure_after: Option<usize>,
    generate_error: Option<DomainError>,
    last_prompt: Mutex<Option<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            response: "Mock analysis: no strong bias.".to_string(),
            fragments: None,
            models: json!({ "models": [{ "name": "mock-model" }] }),
            stream_failure_after: None,
            generate_error: None,
            last_prompt: Mutex::new(None),
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = response.into();
        self
    }

    /// Fragments yielded by `generate_stream`. Without them the whole
    /// response is streamed as one fragment.
    pub fn with_fragments<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fragments = Some(fragments.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_models(mut self, models: Value) -> Self {
        self.models = models;
        self
    }

    /// Break the stream after `n` fragments have been yielded.
    pub fn failing_stream_after(mut self, n: usize) -> Self {
        self.stream_failure_after = Some(n);
        self
    }

    /// Make `generate`, `list_models`, `pull_model` and `health` fail.
    pub fn with_generate_error(mut self, error: DomainError) -> Self {
        self.generate_error = Some(error);
        self
    }

    /// Prompt text of the most recent generation, streaming or not.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }

    fn record(&self, request: &GenerationRequest) {
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(request.prompt().as_str().to_string());
        }
    }

    fn failure(&self) -> Option<DomainError> {
        self.generate_error.as_ref().map(replay)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn replay(error: &DomainError) -> DomainError {
    match error {
        DomainError::InvalidInput(m) => DomainError::InvalidInput(m.clone()),
        DomainError::BackendUnavailable(m) => DomainError::BackendUnavailable(m.clone()),
        DomainError::BackendTimeout(m) => DomainError::BackendTimeout(m.clone()),
        DomainError::BackendProtocol(m) => DomainError::BackendProtocol(m.clone()),
        other => DomainError::Internal(other.to_string()),
    }
}

#[async_trait]
impl BackendClient for MockBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, DomainError> {
        self.record(request);
        match self.failure() {
            Some(e) => Err(e),
            None => Ok(self.response.clone()),
        }
    }

    fn generate_stream(&self, request: &GenerationRequest) -> FragmentStream {
        self.record(request);

        let fragments = self
            .fragments
            .clone()
            .unwrap_or_else(|| vec![self.response.clone()]);

        let mut items: Vec<Result<String, DomainError>> = match self.stream_failure_after {
            Some(n) => fragments.into_iter().take(n).map(Ok).collect(),
            None => fragments.into_iter().map(Ok).collect(),
        };
        if self.stream_failure_after.is_some() {
            items.push(Err(DomainError::backend_unavailable("mock stream interrupted")));
        }

        Box::pin(stream::iter(items))
    }

    async fn list_models(&self) -> Result<Value, DomainError> {
        match self.failure() {
            Some(e) => Err(e),
            None => Ok(self.models.clone()),
        }
    }

    async fn pull_model(&self, _name: &str) -> Result<(), DomainError> {
        match self.failure() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn health(&self) -> HealthReport {
        match self.failure() {
            Some(e) => HealthReport::unhealthy(self.method(), e.to_string()),
            None => HealthReport::healthy(self.method(), self.models.clone()),
        }
    }

    fn method(&self) -> BackendMethod {
        BackendMethod::HttpApi
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn streams_whole_response_by_default() {
        let backend = MockBackend::new().with_response("one piece");
        let fragments: Vec<_> = backend
            .generate_stream(&GenerationRequest::new("p"))
            .collect()
            .await;

        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].as_ref().unwrap(), "one piece");
    }

    #[tokio::test]
    async fn failure_is_the_last_item() {
        let backend = MockBackend::new()
            .with_fragments(["a", "b", "c"])
            .failing_stream_after(2);
        let fragments: Vec<_> = backend
            .generate_stream(&GenerationRequest::new("p"))
            .collect()
            .await;

        assert_eq!(fragments.len(), 3);
        assert!(fragments[0].is_ok() && fragments[1].is_ok());
        assert!(fragments[2].is_err());
    }
}
