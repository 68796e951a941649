use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::application::{BackendClient, RelayStream, StreamingRelay};
use crate::domain::{AnalysisRequest, DomainError, GenerationRequest, PromptBuilder};

pub struct AnalyzeChartUseCase {
    client: Arc<dyn BackendClient>,
    prompt_builder: PromptBuilder,
}

impl AnalyzeChartUseCase {
    pub fn new(client: Arc<dyn BackendClient>) -> Self {
        Self {
            client,
            prompt_builder: PromptBuilder::new(),
        }
    }

    pub fn with_prompt_builder(mut self, prompt_builder: PromptBuilder) -> Self {
        self.prompt_builder = prompt_builder;
        self
    }

    /// Build the backend request: prompt text plus the image, if any.
    pub fn prepare(&self, request: &AnalysisRequest) -> GenerationRequest {
        let prompt = self.prompt_builder.build(
            request.question(),
            request.bars(),
            request.image().is_some(),
        );
        GenerationRequest::new(prompt).with_image(request.image().cloned())
    }

    pub async fn execute(&self, request: &AnalysisRequest) -> Result<String, DomainError> {
        info!(
            "Analyzing via {} ({} bars, image={})",
            self.client.method(),
            request.bars().map_or(0, |b| b.len()),
            request.image().is_some(),
        );

        let start_time = Instant::now();
        let analysis = self.client.generate(&self.prepare(request)).await?;

        info!(
            "Analysis finished in {:.2}s ({} chars)",
            start_time.elapsed().as_secs_f64(),
            analysis.len()
        );
        Ok(analysis)
    }

    pub fn stream(&self, request: &AnalysisRequest) -> RelayStream {
        info!(
            "Streaming analysis via {} ({} bars, image={})",
            self.client.method(),
            request.bars().map_or(0, |b| b.len()),
            request.image().is_some(),
        );
        StreamingRelay::new(Arc::clone(&self.client)).relay(self.prepare(request))
    }
}
