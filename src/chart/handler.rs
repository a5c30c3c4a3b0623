//! `POST /generate-chart`.

use std::backtrace::Backtrace;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use super::render::{ChartRenderer, RenderError, NATAL_CHART_OPTIONS};
use super::request::{ChartRequest, ValidationError};
use super::response::ChartResponse;
use crate::request::Request;
use crate::response::{IntoResponse, Json, Response};
use crate::status::Status;

/// Failure of one chart request, mapped onto an HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    BadRequest(#[from] ValidationError),

    #[error("Error generating chart: {0}")]
    Render(#[from] RenderError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::BadRequest(e) => {
                warn!(error = %e, "chart request rejected");
                Response::error(Status::BadRequest, self.to_string())
            }
            ApiError::Render(e) => {
                error!(
                    error = %e,
                    backtrace = %Backtrace::force_capture(),
                    "chart generation failed"
                );
                Response::error(Status::InternalServerError, self.to_string())
            }
        }
    }
}

/// Validates chart requests and drives the renderer.
#[derive(Clone, Debug)]
pub struct ChartService {
    renderer: Arc<dyn ChartRenderer>,
}

impl ChartService {
    pub fn new(renderer: Arc<dyn ChartRenderer>) -> Self {
        Self { renderer }
    }

    /// Validates `body`, renders the chart, and shapes the success body.
    /// The renderer is only called once validation has fully passed.
    pub async fn generate(&self, body: &[u8]) -> Result<ChartResponse, ApiError> {
        let request = ChartRequest::from_body(body)?;
        let subject = request.subject();

        let svg = self.renderer.render(&subject, &NATAL_CHART_OPTIONS).await?;
        info!(name = %subject.name, utc = %subject.utc, bytes = svg.len(), "chart generated");

        Ok(ChartResponse::new(svg, request, Utc::now()))
    }

    pub async fn handle(&self, req: Request) -> Response {
        self.generate(req.body()).await.map(Json).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::*;
    use crate::chart::render::{ChartSubject, RenderOptions};

    #[derive(Debug, Default)]
    struct Recorder {
        calls: Mutex<Vec<(ChartSubject, RenderOptions)>>,
        fail_with: Option<String>,
    }

    #[async_trait]
    impl ChartRenderer for Recorder {
        async fn render(
            &self,
            subject: &ChartSubject,
            options: &RenderOptions,
        ) -> Result<String, RenderError> {
            self.calls.lock().unwrap().push((subject.clone(), *options));
            match &self.fail_with {
                Some(msg) => Err(RenderError::Other(msg.clone())),
                None => Ok(format!("<svg>{}</svg>", subject.name)),
            }
        }
    }

    fn service(recorder: &Arc<Recorder>) -> ChartService {
        ChartService::new(Arc::clone(recorder) as Arc<dyn ChartRenderer>)
    }

    fn body(name: Value) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "name": name,
            "dateOfBirth": "1990-01-15",
            "timeOfBirth": "14:30",
            "coordinates": { "lat": "40.7128", "lon": "-74.0060" },
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn renders_with_fixed_options() {
        let recorder = Arc::new(Recorder::default());
        let res = service(&recorder).generate(&body(json!("Ann"))).await.unwrap();

        assert!(res.success);
        assert_eq!(res.svg, "<svg>Ann</svg>");
        assert_eq!(res.metadata.name, json!("Ann"));

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, NATAL_CHART_OPTIONS);
        assert_eq!((calls[0].0.lat, calls[0].0.lon), (40.7128, -74.006));
    }

    #[tokio::test]
    async fn empty_name_uses_fallback_but_echoes_original() {
        let recorder = Arc::new(Recorder::default());
        let res = service(&recorder).generate(&body(json!(""))).await.unwrap();

        assert_eq!(recorder.calls.lock().unwrap()[0].0.name, "Natal Chart");
        assert_eq!(res.metadata.name, json!(""));
    }

    #[tokio::test]
    async fn invalid_request_never_reaches_renderer() {
        let recorder = Arc::new(Recorder::default());
        let err = service(&recorder).generate(b"{}").await.unwrap_err();

        assert!(matches!(err, ApiError::BadRequest(ValidationError::MissingField("name"))));
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn renderer_failure_is_500_with_its_text() {
        let recorder = Arc::new(Recorder {
            fail_with: Some("no ephemeris for 1990".to_owned()),
            ..Recorder::default()
        });
        let res = service(&recorder).handle(Request::for_test("POST", "/generate-chart", &body(json!("Ann")))).await;

        assert_eq!(res.status_code(), 500);
        assert_eq!(res.body(), b"Error generating chart: no ephemeris for 1990");
    }

    #[tokio::test]
    async fn handle_maps_validation_to_400() {
        let recorder = Arc::new(Recorder::default());
        let res = service(&recorder).handle(Request::for_test("POST", "/generate-chart", b"not json")).await;

        assert_eq!(res.status_code(), 400);
        assert_eq!(res.header("content-type"), Some("text/plain; charset=utf-8"));
        assert_eq!(res.body(), b"Invalid JSON");
    }

    #[tokio::test]
    async fn handle_returns_json_on_success() {
        let recorder = Arc::new(Recorder::default());
        let res = service(&recorder).handle(Request::for_test("POST", "/generate-chart", &body(json!("Ann")))).await;

        assert_eq!(res.status_code(), 200);
        assert_eq!(res.header("content-type"), Some("application/json"));
        let parsed: ChartResponse = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(parsed.metadata.date_of_birth, "1990-01-15");
    }
}
