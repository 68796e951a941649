use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use super::super::{ApiError, Container, FormFields};

/// `POST /chat`: send `prompt` (and optional `image`) straight to the backend.
pub async fn chat(
    State(container): State<Arc<Container>>,
    form: FormFields,
) -> Result<Json<Value>, ApiError> {
    let prompt = form.require_text("prompt")?;
    let image = form.image("image");

    let response = container.chat_use_case().execute(prompt, image).await?;
    Ok(Json(json!({ "response": response })))
}
