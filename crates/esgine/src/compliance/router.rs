use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde_json::json;

use super::report::{self, ExportFormat};
use super::service::{
    BatchEvaluationRequest, ComplianceService, EvaluationRequest, RuleSetSource, ServiceError,
};
use crate::error::AppError;

/// Router exposing evaluation, batch evaluation, export, and catalog endpoints.
pub fn compliance_router<S>(service: Arc<ComplianceService<S>>) -> Router
where
    S: RuleSetSource + 'static,
{
    Router::new()
        .route(
            "/api/v1/compliance/frameworks",
            get(frameworks_handler::<S>),
        )
        .route("/api/v1/compliance/evaluate", post(evaluate_handler::<S>))
        .route(
            "/api/v1/compliance/evaluate/batch",
            post(batch_handler::<S>),
        )
        .route(
            "/api/v1/compliance/export/:format",
            post(export_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn frameworks_handler<S>(
    State(service): State<Arc<ComplianceService<S>>>,
) -> Response
where
    S: RuleSetSource + 'static,
{
    (StatusCode::OK, Json(service.frameworks())).into_response()
}

pub(crate) async fn evaluate_handler<S>(
    State(service): State<Arc<ComplianceService<S>>>,
    Json(request): Json<EvaluationRequest>,
) -> Response
where
    S: RuleSetSource + 'static,
{
    match service.evaluate(request) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn batch_handler<S>(
    State(service): State<Arc<ComplianceService<S>>>,
    Json(request): Json<BatchEvaluationRequest>,
) -> Response
where
    S: RuleSetSource + 'static,
{
    match service.evaluate_batch(request).await {
        Ok(results) => (StatusCode::OK, Json(json!({ "results": results }))).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn export_handler<S>(
    State(service): State<Arc<ComplianceService<S>>>,
    Path(format): Path<String>,
    Json(request): Json<EvaluationRequest>,
) -> Result<Response, AppError>
where
    S: RuleSetSource + 'static,
{
    let format: ExportFormat = format.parse()?;
    let framework = match request.rules {
        Some(_) => None,
        None => request.framework.as_deref(),
    };
    let title = service.title_for(framework);
    let result = service.evaluate(request)?;
    let body = report::render(format, &result, &title, Local::now().date_naive())?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, format.content_type())],
        body,
    )
        .into_response())
}

pub(crate) fn service_error_status(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::UnknownFramework(_) => StatusCode::NOT_FOUND,
        ServiceError::MissingRules => StatusCode::BAD_REQUEST,
        ServiceError::Evaluation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::RuleSet(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn service_error_response(err: ServiceError) -> Response {
    let status = service_error_status(&err);
    let payload = json!({
        "error": err.to_string(),
    });
    (status, Json(payload)).into_response()
}
