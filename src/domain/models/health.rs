use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which transport variant serves generation requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendMethod {
    #[serde(rename = "HTTP API")]
    HttpApi,
    #[serde(rename = "CLI")]
    Cli,
}

impl BackendMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendMethod::HttpApi => "HTTP API",
            BackendMethod::Cli => "CLI",
        }
    }
}

impl fmt::Display for BackendMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Result of probing the backend. Serialized as the `/health` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub method: BackendMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ollama_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    pub fn healthy(method: BackendMethod, models: Value) -> Self {
        Self {
            status: HealthStatus::Healthy,
            method,
            ollama_url: None,
            models: Some(models),
            error: None,
        }
    }

    pub fn unhealthy(method: BackendMethod, error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            method,
            ollama_url: None,
            models: None,
            error: Some(error.into()),
        }
    }

    pub fn with_ollama_url(mut self, url: impl Into<String>) -> Self {
        self.ollama_url = Some(url.into());
        self
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}
