use std::collections::HashMap;

use axum::extract::{Form, FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;

use super::ApiError;
use crate::domain::{DomainError, EncodedImage};

const URL_ENCODED: &str = "application/x-www-form-urlencoded";

/// Fields of a submitted form, read eagerly.
///
/// Accepts `multipart/form-data` (needed for image uploads) and
/// `application/x-www-form-urlencoded`. Requests are small (a question, a bar
/// array, one chart image), so the whole form is buffered before any backend
/// call is made.
#[derive(Debug, Default)]
pub struct FormFields {
    fields: HashMap<String, Vec<u8>>,
}

impl<S> FromRequest<S> for FormFields
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let url_encoded = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with(URL_ENCODED));

        if url_encoded {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state).await?;
            return Ok(Self::from_pairs(pairs));
        }

        let multipart = Multipart::from_request(req, state).await?;
        Self::read(multipart).await
    }
}

impl FormFields {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut fields = HashMap::new();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let bytes = field.bytes().await?;
            fields.insert(name, bytes.to_vec());
        }
        Ok(Self { fields })
    }

    /// Later duplicates win, as with repeated multipart fields.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let fields = pairs
            .into_iter()
            .map(|(name, value)| (name, value.into_bytes()))
            .collect();
        Self { fields }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn text(&self, name: &str) -> Result<Option<&str>, DomainError> {
        match self.fields.get(name) {
            None => Ok(None),
            Some(bytes) => std::str::from_utf8(bytes)
                .map(Some)
                .map_err(|_| DomainError::invalid_input(format!("field `{name}` is not valid UTF-8"))),
        }
    }

    pub fn require_text(&self, name: &str) -> Result<&str, DomainError> {
        self.text(name)?
            .ok_or_else(|| DomainError::invalid_input(format!("missing form field `{name}`")))
    }

    /// Uploaded file encoded for the backend. An empty upload counts as no image.
    pub fn image(&self, name: &str) -> Option<EncodedImage> {
        self.fields
            .get(name)
            .filter(|bytes| !bytes.is_empty())
            .map(|bytes| EncodedImage::from_bytes(bytes))
    }

    /// Boolean form flag; absent or empty means `false`.
    pub fn flag(&self, name: &str) -> Result<bool, DomainError> {
        let Some(raw) = self.text(name)? else {
            return Ok(false);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "false" | "0" | "no" | "off" => Ok(false),
            "true" | "1" | "yes" | "on" => Ok(true),
            other => Err(DomainError::invalid_input(format!(
                "field `{name}` must be a boolean, got `{other}`"
            ))),
        }
    }
}
