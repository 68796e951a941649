use std::time::Duration;

use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::application::{BackendClient, FragmentStream};
use crate::domain::{
    BackendMethod, DomainError, GenerationRequest, HealthReport, SamplingOptions,
};

/// Default target: Ollama running locally on its standard port.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "gemma3:4b";
/// Returned when a non-streaming reply has no `response` field.
pub const NO_RESPONSE_SENTINEL: &str = "No response from Ollama";

const GENERATE_PATH: &str = "/api/generate";
const TAGS_PATH: &str = "/api/tags";
const PULL_PATH: &str = "/api/pull";

/// Longest prefix of an undecodable stream line written to the log.
const LOG_EXCERPT_CHARS: usize = 120;

const GENERATE_TIMEOUT: Duration = Duration::from_secs(120);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
const LIST_TIMEOUT: Duration = Duration::from_secs(10);
const PULL_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: SamplingOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<&'a str>>,
}

/// One `/api/generate` object: the whole reply, or one NDJSON line when streaming.
#[derive(Debug, Deserialize)]
struct ApiChunk {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
struct TagModel {
    #[serde(default)]
    name: String,
}

#[derive(Debug, PartialEq)]
enum StreamLine {
    Blank,
    Malformed,
    Failed(String),
    Chunk { text: Option<String>, done: bool },
}

fn parse_stream_line(line: &[u8]) -> StreamLine {
    let text = String::from_utf8_lossy(line);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return StreamLine::Blank;
    }

    match serde_json::from_str::<ApiChunk>(trimmed) {
        Ok(ApiChunk {
            error: Some(error), ..
        }) => StreamLine::Failed(error),
        Ok(chunk) => StreamLine::Chunk {
            text: chunk.response.filter(|t| !t.is_empty()),
            done: chunk.done,
        },
        Err(e) => {
            warn!(
                "OllamaHttpClient: skipping undecodable stream line ({e}): {}",
                excerpt(trimmed)
            );
            StreamLine::Malformed
        }
    }
}

fn excerpt(line: &str) -> String {
    match line.char_indices().nth(LOG_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}... ({} bytes)", &line[..cut], line.len()),
        None => line.to_string(),
    }
}

fn request_error(context: &str, err: reqwest::Error) -> DomainError {
    if err.is_timeout() {
        DomainError::backend_timeout(format!("{context}: {err}"))
    } else if err.is_decode() {
        DomainError::backend_protocol(format!("{context}: {err}"))
    } else {
        DomainError::backend_unavailable(format!("{context}: {err}"))
    }
}

fn reported(error: &str) -> DomainError {
    DomainError::backend_unavailable(format!("Ollama reported an error: {error}"))
}

async fn ensure_success(
    context: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, DomainError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!("OllamaHttpClient: {context} returned {status}: {body}");
    Err(DomainError::backend_unavailable(format!(
        "{context}: Ollama returned {status}: {body}"
    )))
}

/// [`BackendClient`] speaking the Ollama HTTP API.
///
/// Non-streaming calls use bounded waits (120 s generate, 5 s health, 10 s
/// model list, 300 s pull). Streaming reads the NDJSON body line by line with
/// no timeout beyond the connection's own.
pub struct OllamaHttpClient {
    client: reqwest::Client,
    model: String,
    /// Base URL without trailing slash, e.g. `http://localhost:11434`.
    base_url: String,
}

impl OllamaHttpClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let base: String = base_url.into();
        Self {
            client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(5))
                .build()
                .unwrap_or_default(),
            model: model.into(),
            base_url: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn payload<'a>(&'a self, request: &'a GenerationRequest, stream: bool) -> ApiRequest<'a> {
        ApiRequest {
            model: &self.model,
            prompt: request.prompt().as_str(),
            stream,
            options: request.options(),
            images: request.image().map(|image| vec![image.as_str()]),
        }
    }

    async fn fetch_tags(&self, timeout: Duration) -> Result<Value, DomainError> {
        let response = self
            .client
            .get(self.url(TAGS_PATH))
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| request_error("model list request failed", e))?;
        let response = ensure_success("model list", response).await?;

        response
            .json::<Value>()
            .await
            .map_err(|e| DomainError::backend_protocol(format!("invalid model list: {e}")))
    }
}

#[async_trait]
impl BackendClient for OllamaHttpClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, DomainError> {
        let response = self
            .client
            .post(self.url(GENERATE_PATH))
            .timeout(GENERATE_TIMEOUT)
            .json(&self.payload(request, false))
            .send()
            .await
            .map_err(|e| request_error("HTTP API call failed", e))?;
        let response = ensure_success("HTTP API call failed", response).await?;

        let body = response
            .text()
            .await
            .map_err(|e| request_error("HTTP API call failed", e))?;
        let reply: ApiChunk = serde_json::from_str(&body).map_err(|e| {
            DomainError::backend_protocol(format!("Invalid JSON response from Ollama: {e}"))
        })?;

        if let Some(error) = reply.error {
            return Err(reported(&error));
        }
        Ok(reply
            .response
            .unwrap_or_else(|| NO_RESPONSE_SENTINEL.to_string()))
    }

    fn generate_stream(&self, request: &GenerationRequest) -> FragmentStream {
        let pending = self
            .client
            .post(self.url(GENERATE_PATH))
            .json(&self.payload(request, true));

        Box::pin(try_stream! {
            let response = pending
                .send()
                .await
                .map_err(|e| request_error("streaming request failed", e))?;
            let response = ensure_success("streaming request failed", response).await?;

            let mut body = response.bytes_stream();
            let mut buffer: Vec<u8> = Vec::new();
            let mut skipped = 0usize;
            let mut finished = false;

            'read: while let Some(next) = body.next().await {
                let bytes = next.map_err(|e| request_error("stream read error", e))?;
                buffer.extend_from_slice(&bytes);

                // NDJSON: every object ends with '\n'
                while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    match parse_stream_line(&line) {
                        StreamLine::Blank => {}
                        StreamLine::Malformed => skipped += 1,
                        StreamLine::Failed(error) => {
                            Err::<(), _>(reported(&error))?;
                        }
                        StreamLine::Chunk { text, done } => {
                            if let Some(text) = text {
                                yield text;
                            }
                            if done {
                                finished = true;
                                break 'read;
                            }
                        }
                    }
                }
            }

            // Last object may arrive without a trailing newline
            if !finished {
                match parse_stream_line(&buffer) {
                    StreamLine::Malformed => skipped += 1,
                    StreamLine::Failed(error) => {
                        Err::<(), _>(reported(&error))?;
                    }
                    StreamLine::Chunk { text: Some(text), .. } => {
                        yield text;
                    }
                    _ => {}
                }
            }

            if skipped > 0 {
                debug!("OllamaHttpClient: skipped {skipped} undecodable stream lines");
            }
        })
    }

    async fn list_models(&self) -> Result<Value, DomainError> {
        self.fetch_tags(LIST_TIMEOUT).await
    }

    async fn pull_model(&self, name: &str) -> Result<(), DomainError> {
        let response = self
            .client
            .post(self.url(PULL_PATH))
            .timeout(PULL_TIMEOUT)
            .json(&json!({ "name": name, "stream": false }))
            .send()
            .await
            .map_err(|e| request_error("model pull failed", e))?;
        let response = ensure_success("model pull failed", response).await?;

        // Drain the body so the pull is complete before reporting success
        let body = response
            .text()
            .await
            .map_err(|e| request_error("model pull failed", e))?;
        if let Ok(ApiChunk {
            error: Some(error), ..
        }) = serde_json::from_str::<ApiChunk>(&body)
        {
            return Err(DomainError::backend_unavailable(format!(
                "model pull failed: {error}"
            )));
        }
        Ok(())
    }

    async fn health(&self) -> HealthReport {
        let tags = match self.fetch_tags(HEALTH_TIMEOUT).await {
            Ok(tags) => tags,
            Err(e) => return HealthReport::unhealthy(self.method(), e.to_string()),
        };

        let names: Vec<String> = serde_json::from_value::<TagsResponse>(tags)
            .map(|t| t.models.into_iter().map(|m| m.name).collect())
            .unwrap_or_default();

        HealthReport::healthy(self.method(), json!(names)).with_ollama_url(&self.base_url)
    }

    fn method(&self) -> BackendMethod {
        BackendMethod::HttpApi
    }

    fn model(&self) -> &str {
        &self.model
    }
}
