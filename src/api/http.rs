//! HTTP surface: `GET /` and `POST /predict`.
//!
//! Validation failures answer 422 with a list of field errors; any failure
//! inside the inference call answers 500 with `Prediction error: <message>`.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::{error, info, warn};

use crate::common::error::{ErrorCode, PredictorError};
use crate::common::log::elapsed_ms;
use crate::inference::domain::{FieldError, PredictionRequest};
use crate::inference::service;
use crate::model::{Classifier, LoadedModel};

pub const SERVICE_TITLE: &str = "Heart Disease Predictor API";

/// Shared, read-only state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    model: Arc<dyn Classifier>,
}

impl AppState {
    pub fn new(model: Arc<dyn Classifier>) -> Self {
        Self { model }
    }
}

impl From<LoadedModel> for AppState {
    fn from(loaded: LoadedModel) -> Self {
        Self::new(loaded.classifier)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: i64,
}

/// Body of 422 responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationErrorBody {
    pub detail: Vec<FieldError>,
}

/// Body of every other error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Errors a handler can answer with.
#[derive(Debug)]
pub enum ApiError {
    Validation(Vec<FieldError>),
    Prediction(PredictorError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(detail) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ValidationErrorBody { detail }),
            )
                .into_response(),
            ApiError::Prediction(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    detail: format!("Prediction error: {err}"),
                }),
            )
                .into_response(),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    // Credentials forbid a literal `*`, so every CORS dimension is mirrored.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Router::new()
        .route("/", get(root))
        .route("/predict", post(predict))
        .fallback(not_found)
        .layer(cors)
        .with_state(state)
}

async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        message: format!("{SERVICE_TITLE} running"),
    })
}

async fn not_found() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            detail: "Not Found".to_string(),
        }),
    )
}

async fn predict(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PredictResponse>, ApiError> {
    let start = Instant::now();

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap_or_default());
    let request = parse_body(content_type, &body).map_err(|errors| {
        warn!(
            ev = "predict_rejected",
            code = ErrorCode::InvalidInput.raw(),
            errors = errors.len(),
            first = %errors[0].msg,
        );
        ApiError::Validation(errors)
    })?;

    match service::infer(state.model.as_ref(), &request) {
        Ok(prediction) => {
            info!(
                ev = "predict",
                code = ErrorCode::Ok.raw(),
                prediction = prediction.label,
                infer_ms = prediction.latency_ms,
                dur_ms = elapsed_ms(start),
            );
            Ok(Json(PredictResponse {
                prediction: prediction.label,
            }))
        }
        Err(err) => {
            error!(
                ev = "predict_failed",
                code = err.code().raw(),
                dur_ms = elapsed_ms(start),
                error = %err,
            );
            Err(ApiError::Prediction(err))
        }
    }
}

/// Decode and validate a raw request body. Never returns an empty error list.
///
/// A body without a content type is read as JSON; any declared type other
/// than JSON is refused as a non-object body.
fn parse_body(
    content_type: Option<&str>,
    body: &[u8],
) -> Result<PredictionRequest, Vec<FieldError>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(vec![FieldError::body_missing()]);
    }
    if !content_type.map_or(true, is_json_content_type) {
        let raw = Value::String(String::from_utf8_lossy(body).into_owned());
        return Err(vec![FieldError::not_an_object(&raw)]);
    }
    let value: Value =
        serde_json::from_slice(body).map_err(|e| vec![FieldError::json_invalid(e)])?;
    PredictionRequest::from_json(&value)
}

/// `application/json` or any `+json` suffix, parameters and case ignored.
fn is_json_content_type(raw: &str) -> bool {
    let essence = raw
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.split_once('/') {
        Some(("application", "json")) => true,
        Some((_, subtype)) => subtype.ends_with("+json"),
        None => false,
    }
}
