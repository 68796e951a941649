use std::sync::Arc;

use clap::ValueEnum;
use tracing::debug;

use crate::application::BackendClient;
use crate::{
    AnalyzeChartUseCase, ChatUseCase, ManageModelsUseCase, OllamaCliClient, OllamaHttpClient,
    PromptBuilder, DEFAULT_BASE_URL, DEFAULT_MAX_BARS, DEFAULT_MODEL, DEFAULT_PROGRAM,
};

/// Transport used to reach the inference backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Ollama HTTP API (`/api/generate`, `/api/tags`, `/api/pull`)
    Http,
    /// `ollama` command-line program as a subprocess
    Cli,
}

/// Process-wide settings. Fixed at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    pub backend: BackendKind,
    pub ollama_url: String,
    pub model: String,
    pub ollama_bin: String,
    /// Number of most recent bars rendered into the analysis prompt.
    pub max_bars: usize,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Http,
            ollama_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            ollama_bin: DEFAULT_PROGRAM.to_string(),
            max_bars: DEFAULT_MAX_BARS,
        }
    }
}

pub struct Container {
    backend: Arc<dyn BackendClient>,
    prompt_builder: PromptBuilder,
    config: ContainerConfig,
}

impl Container {
    pub fn new(config: ContainerConfig) -> Self {
        let backend: Arc<dyn BackendClient> = match config.backend {
            BackendKind::Http => {
                debug!(
                    "Using Ollama HTTP API at {} (model {})",
                    config.ollama_url, config.model
                );
                Arc::new(OllamaHttpClient::new(&config.ollama_url, &config.model))
            }
            BackendKind::Cli => {
                debug!(
                    "Using Ollama CLI `{}` (model {})",
                    config.ollama_bin, config.model
                );
                Arc::new(OllamaCliClient::new(&config.ollama_bin, &config.model))
            }
        };
        Self::with_backend(config, backend)
    }

    /// Build around an already-constructed backend client.
    pub fn with_backend(config: ContainerConfig, backend: Arc<dyn BackendClient>) -> Self {
        let prompt_builder = PromptBuilder::new().with_max_bars(config.max_bars);
        Self {
            backend,
            prompt_builder,
            config,
        }
    }

    pub fn chat_use_case(&self) -> ChatUseCase {
        ChatUseCase::new(self.backend.clone())
    }

    pub fn analyze_use_case(&self) -> AnalyzeChartUseCase {
        AnalyzeChartUseCase::new(self.backend.clone()).with_prompt_builder(self.prompt_builder)
    }

    pub fn models_use_case(&self) -> ManageModelsUseCase {
        ManageModelsUseCase::new(self.backend.clone())
    }

    pub fn backend(&self) -> Arc<dyn BackendClient> {
        self.backend.clone()
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }
}
