use std::process::Stdio;
use std::time::Duration;

use async_stream::try_stream;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::application::{error_fragment, BackendClient, FragmentStream};
use crate::domain::{BackendMethod, DomainError, GenerationRequest, HealthReport};

pub const DEFAULT_PROGRAM: &str = "ollama";

const GENERATE_TIMEOUT: Duration = Duration::from_secs(120);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
const LIST_TIMEOUT: Duration = Duration::from_secs(10);
const PULL_TIMEOUT: Duration = Duration::from_secs(300);

/// JSON document written to `ollama run` on stdin.
#[derive(Serialize)]
struct CliPayload<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<&'a str>>,
}

/// [`BackendClient`] that shells out to the `ollama` program.
///
/// Every call spawns one process (`run <model>`, `list`, `pull <name>`).
/// Processes are killed when their handle is dropped, so a caller that hangs
/// up mid-stream does not leave a generation running.
pub struct OllamaCliClient {
    program: String,
    /// Arguments placed before the subcommand, e.g. a script path when
    /// `program` is an interpreter.
    leading_args: Vec<String>,
    model: String,
}

impl OllamaCliClient {
    pub fn new(program: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            model: model.into(),
        }
    }

    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, args: &[&str], with_stdin: bool) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .args(args)
            .stdin(if with_stdin {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn payload(&self, request: &GenerationRequest) -> Result<Vec<u8>, DomainError> {
        let payload = CliPayload {
            model: &self.model,
            prompt: request.prompt().as_str(),
            images: request.image().map(|image| vec![image.as_str()]),
        };
        serde_json::to_vec(&payload)
            .map_err(|e| DomainError::internal(format!("failed to encode CLI payload: {e}")))
    }

    fn launch_error(&self, err: std::io::Error) -> DomainError {
        DomainError::backend_unavailable(format!("failed to launch `{}`: {err}", self.program))
    }

    /// Run a subcommand to completion and return its stdout.
    async fn run(
        &self,
        args: &[&str],
        input: Option<Vec<u8>>,
        timeout: Duration,
    ) -> Result<String, DomainError> {
        debug!("OllamaCliClient: {} {}", self.program, args.join(" "));

        let mut child = self
            .command(args, input.is_some())
            .spawn()
            .map_err(|e| self.launch_error(e))?;

        if let (Some(input), Some(mut stdin)) = (input, child.stdin.take()) {
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&input).await {
                    debug!("OllamaCliClient: stdin closed early: {e}");
                }
                // Dropping stdin closes the pipe and signals end of input
            });
        }

        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                DomainError::backend_timeout(format!(
                    "`{} {}` did not finish within {}s",
                    self.program,
                    args.join(" "),
                    timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                DomainError::backend_unavailable(format!("Subprocess error: {e}"))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("OllamaCliClient: {} exited with {}", args.join(" "), output.status);
            return Err(DomainError::backend_unavailable(format!(
                "Ollama CLI failed: {}",
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl BackendClient for OllamaCliClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, DomainError> {
        let payload = self.payload(request)?;
        self.run(&["run", self.model.as_str()], Some(payload), GENERATE_TIMEOUT)
            .await
    }

    fn generate_stream(&self, request: &GenerationRequest) -> FragmentStream {
        let payload = self.payload(request);
        let mut cmd = self.command(&["run", self.model.as_str()], true);
        let program = self.program.clone();

        Box::pin(try_stream! {
            let payload = payload?;
            let mut child = cmd.spawn().map_err(|e| {
                DomainError::backend_unavailable(format!("failed to launch `{program}`: {e}"))
            })?;

            let stdout = child.stdout.take().ok_or_else(|| {
                DomainError::internal("child stdout was not captured")
            })?;

            if let Some(mut stdin) = child.stdin.take() {
                tokio::spawn(async move {
                    if let Err(e) = stdin.write_all(&payload).await {
                        debug!("OllamaCliClient: stdin closed early: {e}");
                    }
                });
            }

            // Drain stderr concurrently so a chatty process cannot block on a full pipe
            let stderr = child.stderr.take();
            let stderr_task = tokio::spawn(async move {
                let mut captured = String::new();
                if let Some(mut stderr) = stderr {
                    let _ = stderr.read_to_string(&mut captured).await;
                }
                captured
            });

            let mut reader = BufReader::new(stdout);
            let mut line = Vec::new();
            loop {
                line.clear();
                let read = reader.read_until(b'\n', &mut line).await.map_err(|e| {
                    DomainError::backend_unavailable(format!("failed to read CLI output: {e}"))
                })?;
                if read == 0 {
                    break;
                }
                yield String::from_utf8_lossy(&line).into_owned();
            }

            let status = child.wait().await.map_err(|e| {
                DomainError::backend_unavailable(format!("Subprocess error: {e}"))
            })?;
            if !status.success() {
                let stderr = stderr_task.await.unwrap_or_default();
                warn!("OllamaCliClient: streaming run exited with {status}");
                // Keep what was already sent; report the failure inline
                yield error_fragment(stderr.trim_end());
            }
        })
    }

    async fn list_models(&self) -> Result<Value, DomainError> {
        let stdout = self.run(&["list"], None, LIST_TIMEOUT).await?;
        Ok(json!({ "models": stdout.trim() }))
    }

    async fn pull_model(&self, name: &str) -> Result<(), DomainError> {
        self.run(&["pull", name], None, PULL_TIMEOUT).await?;
        Ok(())
    }

    async fn health(&self) -> HealthReport {
        match self.run(&["list"], None, HEALTH_TIMEOUT).await {
            Ok(stdout) => HealthReport::healthy(self.method(), json!(stdout.trim())),
            Err(e) => HealthReport::unhealthy(self.method(), e.to_string()),
        }
    }

    fn method(&self) -> BackendMethod {
        BackendMethod::Cli
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EncodedImage;

    #[test]
    fn payload_carries_model_prompt_and_image() {
        let client = OllamaCliClient::new(DEFAULT_PROGRAM, "gemma3:4b");
        let request =
            GenerationRequest::new("hello").with_image(Some(EncodedImage::from_bytes(b"abc")));

        let payload: Value = serde_json::from_slice(&client.payload(&request).unwrap()).unwrap();
        assert_eq!(
            payload,
            json!({ "model": "gemma3:4b", "prompt": "hello", "images": ["YWJj"] })
        );
    }

    #[test]
    fn payload_has_no_sampling_options() {
        let client = OllamaCliClient::new(DEFAULT_PROGRAM, "gemma3:4b");
        let payload: Value =
            serde_json::from_slice(&client.payload(&GenerationRequest::new("p")).unwrap())
                .unwrap();

        assert!(payload.get("options").is_none());
        assert!(payload.get("images").is_none());
    }

    #[tokio::test]
    async fn missing_program_is_backend_unavailable() {
        let client = OllamaCliClient::new("/nonexistent/ollama-binary", "gemma3:4b");
        let err = client
            .generate(&GenerationRequest::new("p"))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::BackendUnavailable(_)));
        assert!(err.to_string().contains("failed to launch"));
    }

    #[tokio::test]
    async fn missing_program_reports_unhealthy() {
        let client = OllamaCliClient::new("/nonexistent/ollama-binary", "gemma3:4b");
        let report = client.health().await;

        assert!(!report.is_healthy());
        assert_eq!(report.method, BackendMethod::Cli);
    }
}
