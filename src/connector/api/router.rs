use std::path::Path;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::domain::{AnalysisRequest, EncodedImage, PriceBar};
use crate::Commands;

use super::container::Container;

/// Runs one-shot commands against the container and renders their output.
pub struct Router<'a> {
    container: &'a Container,
}

impl<'a> Router<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Streaming analysis writes to stdout as fragments arrive and returns an
    /// empty string.
    pub async fn route(&self, command: Commands) -> Result<String> {
        match command {
            Commands::Chat { prompt, image } => {
                let image = read_image(image.as_deref()).await?;
                Ok(self.container.chat_use_case().execute(&prompt, image).await?)
            }
            Commands::Analyze {
                question,
                ohlc,
                image,
                stream,
            } => {
                let mut request = AnalysisRequest::new(question).with_stream(stream);
                if let Some(path) = ohlc {
                    let raw = tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    request = request.with_bars(PriceBar::parse_series(&raw)?);
                }
                if let Some(image) = read_image(image.as_deref()).await? {
                    request = request.with_image(image);
                }
                self.analyze(request).await
            }
            Commands::Health => {
                let report = self.container.models_use_case().health().await;
                Ok(serde_json::to_string_pretty(&report)?)
            }
            Commands::Models => {
                let models = self.container.models_use_case().list().await?;
                Ok(serde_json::to_string_pretty(&models)?)
            }
            Commands::Pull { model_name } => {
                Ok(self.container.models_use_case().pull(&model_name).await?)
            }
            Commands::Serve { .. } => unreachable!("serve is handled separately in main"),
        }
    }

    async fn analyze(&self, request: AnalysisRequest) -> Result<String> {
        let use_case = self.container.analyze_use_case();
        if !request.is_stream() {
            return Ok(use_case.execute(&request).await?);
        }

        let mut fragments = use_case.stream(&request);
        let mut stdout = tokio::io::stdout();
        while let Some(fragment) = fragments.next().await {
            stdout.write_all(fragment.as_bytes()).await?;
            stdout.flush().await?;
        }
        stdout.write_all(b"\n").await?;
        Ok(String::new())
    }
}

async fn read_image(path: Option<&Path>) -> Result<Option<EncodedImage>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read image {}", path.display()))?;
    Ok(Some(EncodedImage::from_bytes(&bytes)).filter(|image| !image.is_empty()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{ContainerConfig, MockBackend};

    fn container(backend: MockBackend) -> Container {
        Container::with_backend(ContainerConfig::default(), Arc::new(backend))
    }

    #[tokio::test]
    async fn chat_returns_backend_text() {
        let container = container(MockBackend::new().with_response("hi there"));
        let output = Router::new(&container)
            .route(Commands::Chat {
                prompt: "hello".to_string(),
                image: None,
            })
            .await
            .unwrap();
        assert_eq!(output, "hi there");
    }

    #[tokio::test]
    async fn analyze_reads_bars_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bars.json");
        std::fs::write(&path, r#"[{"t":"bar-1","open":1,"high":2,"low":0.5,"close":1.5}]"#)
            .unwrap();

        let backend = Arc::new(MockBackend::new().with_response("range-bound"));
        let container = Container::with_backend(ContainerConfig::default(), backend.clone());
        let output = Router::new(&container)
            .route(Commands::Analyze {
                question: "Where next?".to_string(),
                ohlc: Some(path),
                image: None,
                stream: false,
            })
            .await
            .unwrap();

        assert_eq!(output, "range-bound");
        let prompt = backend.last_prompt().unwrap();
        assert!(prompt.contains("bar-1\t1\t2\t0.5\t1.5\t"));
    }

    #[tokio::test]
    async fn analyze_rejects_bad_bar_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bars.json");
        std::fs::write(&path, "not json").unwrap();

        let container = container(MockBackend::new());
        let err = Router::new(&container)
            .route(Commands::Analyze {
                question: "q".to_string(),
                ohlc: Some(path),
                image: None,
                stream: false,
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid ohlc_json"));
    }

    #[tokio::test]
    async fn pull_reports_success_message() {
        let container = container(MockBackend::new());
        let output = Router::new(&container)
            .route(Commands::Pull {
                model_name: "llava".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(output, "Model llava pulled successfully");
    }

    #[tokio::test]
    async fn health_renders_json_report() {
        let container = container(MockBackend::new());
        let output = Router::new(&container).route(Commands::Health).await.unwrap();
        let report: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(report["status"], "healthy");
        assert_eq!(report["method"], "HTTP API");
    }
}
