use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use super::super::Container;
use crate::domain::HealthReport;

/// `GET /health`: always 200; backend problems show up as `"status": "unhealthy"`.
pub async fn health(State(container): State<Arc<Container>>) -> Json<HealthReport> {
    Json(container.models_use_case().health().await)
}
