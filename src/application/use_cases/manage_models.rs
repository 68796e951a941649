use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::application::BackendClient;
use crate::domain::{DomainError, HealthReport};

/// Pass-through access to the backend's own model management.
pub struct ManageModelsUseCase {
    client: Arc<dyn BackendClient>,
}

impl ManageModelsUseCase {
    pub fn new(client: Arc<dyn BackendClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Value, DomainError> {
        self.client.list_models().await
    }

    /// Pull a model and return the confirmation message shown to the caller.
    pub async fn pull(&self, model_name: &str) -> Result<String, DomainError> {
        let model_name = model_name.trim();
        if model_name.is_empty() {
            return Err(DomainError::invalid_input("model_name must not be empty"));
        }

        info!("Pulling model {} via {}", model_name, self.client.method());
        self.client.pull_model(model_name).await?;
        Ok(format!("Model {model_name} pulled successfully"))
    }

    pub async fn health(&self) -> HealthReport {
        self.client.health().await
    }
}
