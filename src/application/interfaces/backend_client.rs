use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use serde_json::Value;

use crate::domain::{BackendMethod, DomainError, GenerationRequest, HealthReport};

/// Lazy sequence of text fragments produced by a streaming generation.
///
/// An `Err` item means the stream broke; nothing after it is meaningful.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, DomainError>> + Send>>;

/// Capability over the local inference backend.
///
/// Implementors own transport details (HTTP API or CLI subprocess), the fixed
/// model identifier and the bounded waits. Exactly one implementation is
/// selected when the process starts.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Generate the whole response for a prompt.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, DomainError>;

    /// Start a streaming generation. The returned stream owns everything it
    /// needs, so it can outlive `self` and be handed to the response body.
    fn generate_stream(&self, request: &GenerationRequest) -> FragmentStream;

    /// Model list as reported by the backend, passed through untouched.
    async fn list_models(&self) -> Result<Value, DomainError>;

    async fn pull_model(&self, name: &str) -> Result<(), DomainError>;

    /// Probe the backend. Never fails; problems are reported as unhealthy.
    async fn health(&self) -> HealthReport;

    fn method(&self) -> BackendMethod;

    fn model(&self) -> &str;
}
