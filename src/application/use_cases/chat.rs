use std::sync::Arc;

use tracing::info;

use crate::application::BackendClient;
use crate::domain::{DomainError, EncodedImage, GenerationRequest};

/// Plain pass-through chat: the user's text goes to the backend as-is.
pub struct ChatUseCase {
    client: Arc<dyn BackendClient>,
}

impl ChatUseCase {
    pub fn new(client: Arc<dyn BackendClient>) -> Self {
        Self { client }
    }

    pub async fn execute(
        &self,
        prompt: &str,
        image: Option<EncodedImage>,
    ) -> Result<String, DomainError> {
        info!(
            "Chat via {} (model={}, image={})",
            self.client.method(),
            self.client.model(),
            image.is_some()
        );
        let request = GenerationRequest::new(prompt).with_image(image);
        self.client.generate(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::MockBackend;

    #[tokio::test]
    async fn sends_prompt_verbatim() {
        let backend = Arc::new(MockBackend::new().with_response("hello"));
        let use_case = ChatUseCase::new(backend.clone());

        let reply = use_case.execute("hi there", None).await.unwrap();
        assert_eq!(reply, "hello");
        assert_eq!(backend.last_prompt().as_deref(), Some("hi there"));
    }

    #[tokio::test]
    async fn propagates_backend_errors() {
        let backend = MockBackend::new()
            .with_generate_error(DomainError::backend_unavailable("connection refused"));
        let use_case = ChatUseCase::new(Arc::new(backend));

        let err = use_case.execute("hi", None).await.unwrap_err();
        assert!(err.is_backend_error());
    }
}
