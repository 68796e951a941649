use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use super::super::{ApiError, Container, FormFields};

/// `GET /models`: the backend's model list, untouched.
pub async fn list_models(
    State(container): State<Arc<Container>>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(container.models_use_case().list().await?))
}

/// `POST /models/pull`: ask the backend to download `model_name`.
pub async fn pull_model(
    State(container): State<Arc<Container>>,
    form: FormFields,
) -> Result<Json<Value>, ApiError> {
    let model_name = form.require_text("model_name")?;

    let message = container.models_use_case().pull(model_name).await?;
    Ok(Json(json!({ "message": message })))
}
