//! OllamaCliClient driven by shell scripts standing in for the `ollama` program.
#![cfg(unix)]

use std::path::Path;
use std::sync::Arc;

use futures_util::StreamExt;
use serde_json::{json, Value};
use tempfile::TempDir;

use barsight::{
    BackendClient, BackendMethod, DomainError, EncodedImage, GenerationRequest, OllamaCliClient,
    StreamingRelay, ERROR_MARKER,
};

const ECHO_SCRIPT: &str = r#"
case "$1" in
  run) cat ;;
  list) printf 'NAME\tID\tSIZE\ngemma3:4b\tabc123\t3.3 GB\n' ;;
  pull) echo "pulling $2" ;;
esac
"#;

const STREAM_SCRIPT: &str = r#"
case "$1" in
  run) cat > /dev/null; printf 'Price is\nrising\n' ;;
esac
"#;

const FAILING_SCRIPT: &str = r#"
cat > /dev/null
printf 'partial\n'
echo 'model "nope" not found' >&2
exit 3
"#;

const HANGING_SCRIPT: &str = r#"
case "$1" in
  list) exec sleep 10 ;;
esac
"#;

fn fake_ollama(dir: &TempDir, script: &str) -> OllamaCliClient {
    let path = dir.path().join("ollama.sh");
    std::fs::write(&path, script).unwrap();
    client_for(&path)
}

fn client_for(script: &Path) -> OllamaCliClient {
    OllamaCliClient::new("sh", "gemma3:4b").with_leading_args([script.to_string_lossy()])
}

#[tokio::test]
async fn test_generate_writes_json_payload_to_stdin() {
    let dir = TempDir::new().unwrap();
    let client = fake_ollama(&dir, ECHO_SCRIPT);
    let request =
        GenerationRequest::new("Is this bullish?").with_image(Some(EncodedImage::from_bytes(b"png")));

    let echoed = client.generate(&request).await.unwrap();
    let payload: Value = serde_json::from_str(&echoed).unwrap();

    assert_eq!(
        payload,
        json!({ "model": "gemma3:4b", "prompt": "Is this bullish?", "images": ["cG5n"] })
    );
}

#[tokio::test]
async fn test_generate_fails_on_non_zero_exit() {
    let dir = TempDir::new().unwrap();
    let client = fake_ollama(&dir, FAILING_SCRIPT);

    let err = client.generate(&GenerationRequest::new("q")).await.unwrap_err();
    assert!(matches!(err, DomainError::BackendUnavailable(_)));
    assert!(err.to_string().contains("Ollama CLI failed: model \"nope\" not found"));
}

#[tokio::test]
async fn test_stream_yields_output_lines() {
    let dir = TempDir::new().unwrap();
    let client = fake_ollama(&dir, STREAM_SCRIPT);

    let fragments: Vec<String> = client
        .generate_stream(&GenerationRequest::new("q"))
        .map(Result::unwrap)
        .collect()
        .await;

    assert_eq!(fragments, ["Price is\n", "rising\n"]);
}

#[tokio::test]
async fn test_stream_appends_error_marker_on_failure() {
    let dir = TempDir::new().unwrap();
    let client = fake_ollama(&dir, FAILING_SCRIPT);

    let fragments: Vec<String> = client
        .generate_stream(&GenerationRequest::new("q"))
        .map(Result::unwrap)
        .collect()
        .await;

    assert_eq!(fragments.len(), 2);
    assert_eq!(fragments[0], "partial\n");
    assert_eq!(fragments[1], format!("{ERROR_MARKER}model \"nope\" not found"));
}

#[tokio::test]
async fn test_relay_passes_cli_failure_marker_through() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(fake_ollama(&dir, FAILING_SCRIPT));

    let fragments: Vec<String> = StreamingRelay::new(client)
        .relay(GenerationRequest::new("q"))
        .collect()
        .await;

    // The marker is already part of the stream, so no fallback call is made
    assert_eq!(fragments.len(), 2);
    assert!(fragments[1].starts_with(ERROR_MARKER));
}

#[tokio::test]
async fn test_list_models_wraps_raw_output() {
    let dir = TempDir::new().unwrap();
    let client = fake_ollama(&dir, ECHO_SCRIPT);

    let models = client.list_models().await.unwrap();
    let listing = models["models"].as_str().unwrap();
    assert!(listing.starts_with("NAME"));
    assert!(listing.contains("gemma3:4b"));
}

#[tokio::test]
async fn test_pull_and_health() {
    let dir = TempDir::new().unwrap();
    let client = fake_ollama(&dir, ECHO_SCRIPT);

    client.pull_model("llava:7b").await.unwrap();

    let report = client.health().await;
    assert!(report.is_healthy());
    assert_eq!(report.method, BackendMethod::Cli);
    assert!(report.ollama_url.is_none());
}

#[tokio::test]
async fn test_failing_program_reports_unhealthy() {
    let dir = TempDir::new().unwrap();
    let client = fake_ollama(&dir, FAILING_SCRIPT);

    let report = client.health().await;
    assert!(!report.is_healthy());
    assert!(report.error.unwrap().contains("not found"));
}

#[tokio::test]
async fn test_hanging_program_times_out_as_unhealthy() {
    let dir = TempDir::new().unwrap();
    let client = fake_ollama(&dir, HANGING_SCRIPT);

    let started = std::time::Instant::now();
    let report = client.health().await;

    assert!(!report.is_healthy());
    let error = report.error.unwrap();
    assert!(error.contains("did not finish within 5s"), "{error}");
    assert!(error.starts_with("Backend timed out"), "{error}");
    assert!(started.elapsed() < std::time::Duration::from_secs(9));
}
