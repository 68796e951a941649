use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::StreamExt;
use serde_json::json;

use super::super::{ApiError, Container, FormFields};
use crate::domain::{AnalysisRequest, DomainError, PriceBar};

/// `POST /analyze`: price-action analysis of a question, optional bars and chart.
///
/// With `stream` set the body is `text/plain`, written fragment by fragment.
pub async fn analyze(
    State(container): State<Arc<Container>>,
    form: FormFields,
) -> Result<Response, ApiError> {
    let request = analysis_request(&form)?;
    let use_case = container.analyze_use_case();

    if request.is_stream() {
        let fragments = use_case.stream(&request).map(Ok::<_, Infallible>);
        return Ok((
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            Body::from_stream(fragments),
        )
            .into_response());
    }

    let analysis = use_case.execute(&request).await?;
    Ok(Json(json!({ "analysis": analysis })).into_response())
}

fn analysis_request(form: &FormFields) -> Result<AnalysisRequest, DomainError> {
    let mut request = AnalysisRequest::new(form.require_text("question")?)
        .with_stream(form.flag("stream")?);

    if let Some(raw) = form.text("ohlc_json")?.filter(|raw| !raw.trim().is_empty()) {
        request = request.with_bars(PriceBar::parse_series(raw)?);
    }
    if let Some(image) = form.image("image") {
        request = request.with_image(image);
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormFields {
        let mut form = FormFields::default();
        for (name, value) in pairs {
            form.insert(*name, value.as_bytes().to_vec());
        }
        form
    }

    #[test]
    fn builds_request_from_fields() {
        let request = analysis_request(&form(&[
            ("question", "Is this bullish?"),
            ("ohlc_json", r#"[{"t":"a","close":1},{"t":"b","close":2}]"#),
            ("stream", "true"),
        ]))
        .unwrap();

        assert_eq!(request.question(), "Is this bullish?");
        assert_eq!(request.bars().map(|b| b.len()), Some(2));
        assert!(request.is_stream());
        assert!(request.image().is_none());
    }

    #[test]
    fn blank_ohlc_json_means_no_bars() {
        let request = analysis_request(&form(&[("question", "q"), ("ohlc_json", "  ")])).unwrap();
        assert!(request.bars().is_none());
    }

    #[test]
    fn null_ohlc_json_means_no_bars() {
        let request = analysis_request(&form(&[("question", "q"), ("ohlc_json", "null")])).unwrap();
        assert!(request.bars().map_or(true, |bars| bars.is_empty()));
    }

    #[test]
    fn bar_with_duplicate_timestamp_keys_is_accepted() {
        let request = analysis_request(&form(&[
            ("question", "q"),
            ("ohlc_json", r#"[{"t":"2025-01-01","timestamp":"x","open":1}]"#),
        ]))
        .unwrap();
        assert_eq!(request.bars().map(|b| b.len()), Some(1));
    }

    #[test]
    fn malformed_ohlc_json_is_client_error() {
        let err = analysis_request(&form(&[("question", "q"), ("ohlc_json", "[{oops")]))
            .unwrap_err();
        assert!(err.is_client_error());
    }
}
